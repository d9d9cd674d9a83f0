//! Session store client and the table-store boundary it runs against.
//!
//! [`TableStore`] is the minimal set of row operations a back end has to
//! provide. [`StoreClient`] turns those into the attendance operations:
//! validation, duration math and invariant checks live here. Ordering and
//! text comparison are part of the [`TableStore`] contract: back ends compare
//! `identity` and `name` by code point (binary collation on MySQL).

pub mod memory;
pub mod mysql;

use std::future::Future;

use chrono::{DateTime, SubsecRound, Utc};
use tracing::{debug, info, warn};

use crate::error::{AttendanceError, AttendanceResult};
use crate::identity::Identity;
use crate::model::attendance::{
    AttendanceSession, CloseSession, NewSession, SessionId, work_minutes,
};
use crate::model::metadata::Metadata;
use crate::model::project::{NewProject, Project};

pub use memory::MemoryTableStore;
pub use mysql::MySqlTableStore;

/// Timestamps are kept at millisecond precision end to end.
const TIMESTAMP_DIGITS: u16 = 3;

/// Filter for [`TableStore::select_sessions`].
#[derive(Debug, Clone, Default)]
pub struct SessionQuery {
    pub identity: Option<Identity>,
    pub limit: Option<u64>,
}

/// Row-level operations on the `attendance_sessions` and `projects` tables.
///
/// Ids are assigned by the store. Each call succeeds or fails as a whole.
pub trait TableStore: Send + Sync {
    fn insert_session(
        &self,
        input: NewSession,
    ) -> impl Future<Output = AttendanceResult<AttendanceSession>> + Send;

    /// `None` when no row has this id.
    fn fetch_checkin(
        &self,
        id: SessionId,
    ) -> impl Future<Output = AttendanceResult<Option<DateTime<Utc>>>> + Send;

    /// Conditional update: only touches the row while its checkout is unset.
    /// Returns `None` when no open row matched.
    fn close_session(
        &self,
        id: SessionId,
        input: CloseSession,
    ) -> impl Future<Output = AttendanceResult<Option<AttendanceSession>>> + Send;

    /// Ordered by `checkin` descending, then `id` descending. The identity
    /// filter is an exact, case-sensitive match.
    fn select_sessions(
        &self,
        query: SessionQuery,
    ) -> impl Future<Output = AttendanceResult<Vec<AttendanceSession>>> + Send;

    fn insert_project(
        &self,
        input: NewProject,
    ) -> impl Future<Output = AttendanceResult<Project>> + Send;

    /// Ordered by `name` ascending by code point, then `id` ascending.
    fn select_projects(&self) -> impl Future<Output = AttendanceResult<Vec<Project>>> + Send;
}

/// The back end picked at start-up.
#[derive(Clone)]
pub enum AnyTableStore {
    MySql(MySqlTableStore),
    Memory(MemoryTableStore),
}

impl TableStore for AnyTableStore {
    async fn insert_session(&self, input: NewSession) -> AttendanceResult<AttendanceSession> {
        match self {
            AnyTableStore::MySql(store) => store.insert_session(input).await,
            AnyTableStore::Memory(store) => store.insert_session(input).await,
        }
    }

    async fn fetch_checkin(&self, id: SessionId) -> AttendanceResult<Option<DateTime<Utc>>> {
        match self {
            AnyTableStore::MySql(store) => store.fetch_checkin(id).await,
            AnyTableStore::Memory(store) => store.fetch_checkin(id).await,
        }
    }

    async fn close_session(
        &self,
        id: SessionId,
        input: CloseSession,
    ) -> AttendanceResult<Option<AttendanceSession>> {
        match self {
            AnyTableStore::MySql(store) => store.close_session(id, input).await,
            AnyTableStore::Memory(store) => store.close_session(id, input).await,
        }
    }

    async fn select_sessions(&self, query: SessionQuery) -> AttendanceResult<Vec<AttendanceSession>> {
        match self {
            AnyTableStore::MySql(store) => store.select_sessions(query).await,
            AnyTableStore::Memory(store) => store.select_sessions(query).await,
        }
    }

    async fn insert_project(&self, input: NewProject) -> AttendanceResult<Project> {
        match self {
            AnyTableStore::MySql(store) => store.insert_project(input).await,
            AnyTableStore::Memory(store) => store.insert_project(input).await,
        }
    }

    async fn select_projects(&self) -> AttendanceResult<Vec<Project>> {
        match self {
            AnyTableStore::MySql(store) => store.select_projects().await,
            AnyTableStore::Memory(store) => store.select_projects().await,
        }
    }
}

pub type AppStore = StoreClient<AnyTableStore>;

#[derive(Clone)]
pub struct StoreClient<T> {
    table: T,
}

impl<T: TableStore> StoreClient<T> {
    pub fn new(table: T) -> Self {
        Self { table }
    }

    /// Inserts a new open session (check-in).
    pub async fn create_session(
        &self,
        identity: &Identity,
        checkin: DateTime<Utc>,
        metadata: Metadata,
        project_id: Option<u64>,
    ) -> AttendanceResult<AttendanceSession> {
        let identity = Identity::parse(identity.as_str())?;
        let session = self
            .table
            .insert_session(NewSession {
                identity: identity.clone(),
                checkin: checkin.trunc_subsecs(TIMESTAMP_DIGITS),
                project_id,
                metadata,
            })
            .await?;

        info!(session_id = session.id, identity = %identity, ?project_id, "Session opened");
        Ok(session)
    }

    /// Closes a session: reads its check-in, floors the span to minutes and
    /// writes checkout, minutes and metadata in one conditional update.
    pub async fn finalize_session(
        &self,
        session_id: SessionId,
        checkout: DateTime<Utc>,
        metadata: Metadata,
    ) -> AttendanceResult<AttendanceSession> {
        let checkin = self
            .table
            .fetch_checkin(session_id)
            .await?
            .ok_or_else(|| AttendanceError::NotFound {
                entity: "session",
                id: session_id.to_string(),
            })?;

        let checkout = checkout.trunc_subsecs(TIMESTAMP_DIGITS);
        let minutes = work_minutes(checkin, checkout);
        debug!(session_id, %checkin, %checkout, minutes, "Computed work minutes");

        let closed = self
            .table
            .close_session(
                session_id,
                CloseSession {
                    checkout,
                    work_minutes: minutes,
                    metadata,
                },
            )
            .await?;

        match closed {
            Some(session) => {
                info!(session_id, minutes, "Session closed");
                Ok(session)
            }
            None => {
                warn!(session_id, "Session was already checked out");
                Err(AttendanceError::SessionClosed(session_id))
            }
        }
    }

    /// Every session, most recent check-in first.
    pub async fn list_sessions(&self) -> AttendanceResult<Vec<AttendanceSession>> {
        self.select_checked(SessionQuery::default()).await
    }

    /// Sessions of one identity, most recent check-in first.
    pub async fn list_sessions_for(
        &self,
        identity: &Identity,
    ) -> AttendanceResult<Vec<AttendanceSession>> {
        self.select_checked(SessionQuery {
            identity: Some(identity.clone()),
            limit: None,
        })
        .await
    }

    pub async fn most_recent_session(
        &self,
        identity: Option<&Identity>,
    ) -> AttendanceResult<Option<AttendanceSession>> {
        let mut sessions = self
            .select_checked(SessionQuery {
                identity: identity.cloned(),
                limit: Some(1),
            })
            .await?;

        Ok(if sessions.is_empty() {
            None
        } else {
            Some(sessions.swap_remove(0))
        })
    }

    pub async fn list_projects(&self) -> AttendanceResult<Vec<Project>> {
        self.table.select_projects().await
    }

    /// Validates before anything reaches the store.
    pub async fn add_project(&self, name: &str, estimated_time: i64) -> AttendanceResult<Project> {
        let input = NewProject::parse(name, estimated_time)?;
        let project = self.table.insert_project(input).await?;

        info!(project_id = project.id, name = %project.name, "Project added");
        Ok(project)
    }

    async fn select_checked(&self, query: SessionQuery) -> AttendanceResult<Vec<AttendanceSession>> {
        let sessions = self.table.select_sessions(query).await?;
        for session in &sessions {
            session.state()?;
        }
        Ok(sessions)
    }
}
