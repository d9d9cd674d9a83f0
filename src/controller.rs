//! Attendance state machine for one identity.
//!
//! The controller keeps a view of the identity's log and the project list.
//! "Checked in" is never stored: it is derived from the log every time the
//! view is reloaded.

use chrono::Utc;
use serde::Serialize;
use strum_macros::{Display, EnumString};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::error::{AttendanceError, AttendanceResult};
use crate::identity::Identity;
use crate::model::attendance::AttendanceSession;
use crate::model::metadata::Metadata;
use crate::model::project::Project;
use crate::store::{StoreClient, TableStore};

/// How many open sessions one identity may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OpenSessionPolicy {
    /// A second check-in is rejected while a session is open.
    #[default]
    Single,
    /// Several open sessions are allowed (multi-device use).
    Concurrent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttendanceState {
    CheckedOut,
    CheckedIn(AttendanceSession),
}

impl AttendanceState {
    pub fn active_session(&self) -> Option<&AttendanceSession> {
        match self {
            AttendanceState::CheckedIn(session) => Some(session),
            AttendanceState::CheckedOut => None,
        }
    }
}

/// First open entry of a log ordered most recent first.
pub fn derive_state(log: &[AttendanceSession]) -> AttendanceState {
    log.iter()
        .find(|s| s.is_open())
        .cloned()
        .map_or(AttendanceState::CheckedOut, AttendanceState::CheckedIn)
}

/// Serializable snapshot of a controller.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttendanceView {
    #[schema(value_type = String, example = "203.0.113.9")]
    pub identity: Identity,
    pub checked_in: bool,
    #[schema(nullable = true)]
    pub active_session: Option<AttendanceSession>,
    pub sessions: Vec<AttendanceSession>,
    pub projects: Vec<Project>,
    #[schema(nullable = true)]
    pub error: Option<String>,
}

pub struct AttendanceController<'a, T> {
    store: &'a StoreClient<T>,
    identity: Identity,
    policy: OpenSessionPolicy,
    state: AttendanceState,
    log: Vec<AttendanceSession>,
    projects: Vec<Project>,
    loading: bool,
    error: Option<String>,
}

impl<'a, T: TableStore> AttendanceController<'a, T> {
    /// Fetches the identity's log and the projects, then derives the state.
    pub async fn load(
        store: &'a StoreClient<T>,
        identity: Identity,
        policy: OpenSessionPolicy,
    ) -> AttendanceResult<Self> {
        let mut controller = Self {
            store,
            identity,
            policy,
            state: AttendanceState::CheckedOut,
            log: Vec::new(),
            projects: Vec::new(),
            loading: false,
            error: None,
        };

        controller.begin();
        let loaded = controller.reload().await;
        controller.settle(loaded)?;

        Ok(controller)
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn state(&self) -> &AttendanceState {
        &self.state
    }

    pub fn is_checked_in(&self) -> bool {
        matches!(self.state, AttendanceState::CheckedIn(_))
    }

    pub fn log(&self) -> &[AttendanceSession] {
        &self.log
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message of the last failed action, cleared by the next success.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn view(&self) -> AttendanceView {
        AttendanceView {
            identity: self.identity.clone(),
            checked_in: self.is_checked_in(),
            active_session: self.state.active_session().cloned(),
            sessions: self.log.clone(),
            projects: self.projects.clone(),
            error: self.error.clone(),
        }
    }

    pub async fn check_in(
        &mut self,
        project_id: Option<u64>,
        metadata: Metadata,
    ) -> AttendanceResult<AttendanceSession> {
        self.begin();
        let result = self.try_check_in(project_id, metadata).await;
        self.settle(result)
    }

    pub async fn check_out(&mut self, metadata: Metadata) -> AttendanceResult<AttendanceSession> {
        self.begin();
        let result = self.try_check_out(metadata).await;
        self.settle(result)
    }

    pub async fn add_project(&mut self, name: &str, estimated_time: i64) -> AttendanceResult<Project> {
        self.begin();
        let result = self.store.add_project(name, estimated_time).await;
        if result.is_ok() {
            match self.store.list_projects().await {
                Ok(projects) => self.projects = projects,
                Err(e) => warn!(error = %e, "Project list refresh failed"),
            }
        }
        self.settle(result)
    }

    async fn try_check_in(
        &mut self,
        project_id: Option<u64>,
        metadata: Metadata,
    ) -> AttendanceResult<AttendanceSession> {
        let project_id = project_id
            .ok_or_else(|| AttendanceError::validation("Select a project before checking in"))?;

        if !self.projects.iter().any(|p| p.id == project_id) {
            return Err(AttendanceError::validation(format!(
                "Project {project_id} does not exist"
            )));
        }

        if self.policy == OpenSessionPolicy::Single {
            if self.is_checked_in() {
                return Err(AttendanceError::AlreadyCheckedIn);
            }

            let latest = self.store.most_recent_session(Some(&self.identity)).await?;
            if latest.is_some_and(|s| s.is_open()) {
                return Err(AttendanceError::AlreadyCheckedIn);
            }
        }

        let session = self
            .store
            .create_session(&self.identity, Utc::now(), metadata, Some(project_id))
            .await?;

        self.apply(session.clone());
        self.refresh_after_mutation().await;

        info!(identity = %self.identity, session_id = session.id, "Checked in");
        Ok(session)
    }

    async fn try_check_out(&mut self, metadata: Metadata) -> AttendanceResult<AttendanceSession> {
        let session_id = match &self.state {
            AttendanceState::CheckedIn(session) => session.id,
            AttendanceState::CheckedOut => return Err(AttendanceError::NoActiveSession),
        };

        let session = self
            .store
            .finalize_session(session_id, Utc::now(), metadata)
            .await?;

        self.apply(session.clone());
        self.refresh_after_mutation().await;

        info!(
            identity = %self.identity,
            session_id,
            work_minutes = ?session.work_minutes,
            "Checked out"
        );
        Ok(session)
    }

    async fn reload(&mut self) -> AttendanceResult<()> {
        let log = self.store.list_sessions_for(&self.identity).await?;
        let projects = self.store.list_projects().await?;

        self.state = derive_state(&log);
        self.log = log;
        self.projects = projects;
        Ok(())
    }

    /// Merges a row the store just returned into the local view.
    fn apply(&mut self, session: AttendanceSession) {
        match self.log.iter_mut().find(|s| s.id == session.id) {
            Some(existing) => *existing = session,
            None => self.log.insert(0, session),
        }
        self.state = derive_state(&self.log);
    }

    /// The mutation is already committed; a failed reload keeps the merged view.
    async fn refresh_after_mutation(&mut self) {
        if let Err(e) = self.reload().await {
            warn!(error = %e, identity = %self.identity, "View reload failed after mutation");
        }
    }

    fn begin(&mut self) {
        self.loading = true;
    }

    fn settle<R>(&mut self, result: AttendanceResult<R>) -> AttendanceResult<R> {
        self.loading = false;
        match &result {
            Ok(_) => self.error = None,
            Err(e) => {
                warn!(error = %e, identity = %self.identity, "Attendance action failed");
                self.error = Some(e.user_message());
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};

    fn session(id: u64, checkin: DateTime<Utc>, open: bool) -> AttendanceSession {
        AttendanceSession {
            id,
            identity: Identity::new("10.0.0.1"),
            checkin,
            checkout: (!open).then(|| checkin + chrono::Duration::minutes(30)),
            project_id: Some(1),
            work_minutes: (!open).then_some(30),
            check_in_metadata: Metadata::default(),
            check_out_metadata: (!open).then(Metadata::default),
        }
    }

    #[test]
    fn empty_log_is_checked_out() {
        assert_eq!(derive_state(&[]), AttendanceState::CheckedOut);
    }

    #[test]
    fn open_latest_entry_is_checked_in() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let log = vec![
            session(2, t + chrono::Duration::hours(2), true),
            session(1, t, false),
        ];

        match derive_state(&log) {
            AttendanceState::CheckedIn(active) => assert_eq!(active.id, 2),
            other => panic!("expected CheckedIn, got {other:?}"),
        }
    }

    #[test]
    fn closed_log_is_checked_out() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let log = vec![session(2, t + chrono::Duration::hours(2), false), session(1, t, false)];
        assert_eq!(derive_state(&log), AttendanceState::CheckedOut);
    }

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!("single".parse::<OpenSessionPolicy>().unwrap(), OpenSessionPolicy::Single);
        assert_eq!(
            "Concurrent".parse::<OpenSessionPolicy>().unwrap(),
            OpenSessionPolicy::Concurrent
        );
        assert!("many".parse::<OpenSessionPolicy>().is_err());
    }
}
