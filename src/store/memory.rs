//! Process-local tables. Backs the test-suite and `STORE_BACKEND=memory`
//! demo runs; nothing survives a restart.

use std::cmp::Reverse;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::error::{AttendanceError, AttendanceResult};
use crate::model::attendance::{AttendanceSession, CloseSession, NewSession, SessionId};
use crate::model::project::{NewProject, Project};
use crate::store::{SessionQuery, TableStore};

#[derive(Default)]
struct Tables {
    sessions: Vec<AttendanceSession>,
    projects: Vec<Project>,
    last_session_id: SessionId,
    last_project_id: u64,
}

#[derive(Clone, Default)]
pub struct MemoryTableStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AttendanceResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| AttendanceError::Store("memory store lock poisoned".to_string()))
    }
}

impl TableStore for MemoryTableStore {
    async fn insert_session(&self, input: NewSession) -> AttendanceResult<AttendanceSession> {
        let mut tables = self.lock()?;
        tables.last_session_id += 1;

        let session = AttendanceSession {
            id: tables.last_session_id,
            identity: input.identity,
            checkin: input.checkin,
            checkout: None,
            project_id: input.project_id,
            work_minutes: None,
            check_in_metadata: input.metadata,
            check_out_metadata: None,
        };
        tables.sessions.push(session.clone());

        Ok(session)
    }

    async fn fetch_checkin(&self, id: SessionId) -> AttendanceResult<Option<DateTime<Utc>>> {
        let tables = self.lock()?;
        Ok(tables
            .sessions
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.checkin))
    }

    async fn close_session(
        &self,
        id: SessionId,
        input: CloseSession,
    ) -> AttendanceResult<Option<AttendanceSession>> {
        let mut tables = self.lock()?;
        let row = tables
            .sessions
            .iter_mut()
            .find(|s| s.id == id && s.checkout.is_none());

        Ok(row.map(|session| {
            session.checkout = Some(input.checkout);
            session.work_minutes = Some(input.work_minutes);
            session.check_out_metadata = Some(input.metadata);
            session.clone()
        }))
    }

    async fn select_sessions(&self, query: SessionQuery) -> AttendanceResult<Vec<AttendanceSession>> {
        let tables = self.lock()?;
        let mut rows: Vec<AttendanceSession> = tables
            .sessions
            .iter()
            .filter(|s| query.identity.as_ref().is_none_or(|i| &s.identity == i))
            .cloned()
            .collect();

        rows.sort_by_key(|s| Reverse((s.checkin, s.id)));

        if let Some(limit) = query.limit {
            rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }

        Ok(rows)
    }

    async fn insert_project(&self, input: NewProject) -> AttendanceResult<Project> {
        let mut tables = self.lock()?;
        tables.last_project_id += 1;

        let project = Project {
            id: tables.last_project_id,
            name: input.name,
            estimated_time: input.estimated_time,
        };
        tables.projects.push(project.clone());

        Ok(project)
    }

    async fn select_projects(&self) -> AttendanceResult<Vec<Project>> {
        let tables = self.lock()?;
        let mut projects = tables.projects.clone();
        projects.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(projects)
    }
}
