use chrono::{DateTime, Utc};
use sqlx::MySqlPool;
use sqlx::types::Json;
use tracing::{debug, error};

use crate::error::{AttendanceError, AttendanceResult};
use crate::identity::Identity;
use crate::model::attendance::{AttendanceSession, CloseSession, NewSession, SessionId};
use crate::model::metadata::Metadata;
use crate::model::project::{NewProject, Project};
use crate::store::{SessionQuery, TableStore};

const SESSION_COLUMNS: &str = "id, identity, checkin, checkout, project_id, work_minutes, \
                               check_in_metadata, check_out_metadata";

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: u64,
    identity: String,
    checkin: DateTime<Utc>,
    checkout: Option<DateTime<Utc>>,
    project_id: Option<u64>,
    work_minutes: Option<i64>,
    check_in_metadata: Json<Metadata>,
    check_out_metadata: Option<Json<Metadata>>,
}

impl From<SessionRow> for AttendanceSession {
    fn from(row: SessionRow) -> Self {
        AttendanceSession {
            id: row.id,
            identity: Identity::new(row.identity),
            checkin: row.checkin,
            checkout: row.checkout,
            project_id: row.project_id,
            work_minutes: row.work_minutes,
            check_in_metadata: row.check_in_metadata.0,
            check_out_metadata: row.check_out_metadata.map(|m| m.0),
        }
    }
}

fn store_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> AttendanceError {
    move |e| {
        error!(error = %e, operation, "Table store operation failed");
        AttendanceError::from(e)
    }
}

#[derive(Clone)]
pub struct MySqlTableStore {
    pool: MySqlPool,
}

impl MySqlTableStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_session(&self, id: SessionId) -> AttendanceResult<AttendanceSession> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM attendance_sessions WHERE id = ?");

        let row = sqlx::query_as::<_, SessionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error("fetch_session"))?;

        row.map(AttendanceSession::from)
            .ok_or_else(|| AttendanceError::NotFound {
                entity: "session",
                id: id.to_string(),
            })
    }
}

impl TableStore for MySqlTableStore {
    async fn insert_session(&self, input: NewSession) -> AttendanceResult<AttendanceSession> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance_sessions (identity, checkin, project_id, check_in_metadata)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(input.identity.as_str())
        .bind(input.checkin)
        .bind(input.project_id)
        .bind(Json(&input.metadata))
        .execute(&self.pool)
        .await
        .map_err(store_error("insert_session"))?;

        self.fetch_session(result.last_insert_id()).await
    }

    async fn fetch_checkin(&self, id: SessionId) -> AttendanceResult<Option<DateTime<Utc>>> {
        sqlx::query_scalar::<_, DateTime<Utc>>(
            "SELECT checkin FROM attendance_sessions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error("fetch_checkin"))
    }

    async fn close_session(
        &self,
        id: SessionId,
        input: CloseSession,
    ) -> AttendanceResult<Option<AttendanceSession>> {
        let result = sqlx::query(
            r#"
            UPDATE attendance_sessions
            SET checkout = ?, work_minutes = ?, check_out_metadata = ?
            WHERE id = ?
            AND checkout IS NULL
            "#,
        )
        .bind(input.checkout)
        .bind(input.work_minutes)
        .bind(Json(&input.metadata))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(store_error("close_session"))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.fetch_session(id).await.map(Some)
    }

    async fn select_sessions(&self, query: SessionQuery) -> AttendanceResult<Vec<AttendanceSession>> {
        let where_clause = if query.identity.is_some() {
            "WHERE identity = ?"
        } else {
            ""
        };
        let limit_clause = if query.limit.is_some() { "LIMIT ?" } else { "" };

        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM attendance_sessions {where_clause} \
             ORDER BY checkin DESC, id DESC {limit_clause}"
        );
        debug!(sql = %sql, identity = ?query.identity, limit = ?query.limit, "Selecting sessions");

        let mut select = sqlx::query_as::<_, SessionRow>(&sql);
        if let Some(identity) = &query.identity {
            select = select.bind(identity.as_str());
        }
        if let Some(limit) = query.limit {
            select = select.bind(limit);
        }

        let rows = select
            .fetch_all(&self.pool)
            .await
            .map_err(store_error("select_sessions"))?;

        Ok(rows.into_iter().map(AttendanceSession::from).collect())
    }

    async fn insert_project(&self, input: NewProject) -> AttendanceResult<Project> {
        let result = sqlx::query("INSERT INTO projects (name, estimated_time) VALUES (?, ?)")
            .bind(&input.name)
            .bind(input.estimated_time)
            .execute(&self.pool)
            .await
            .map_err(store_error("insert_project"))?;

        Ok(Project {
            id: result.last_insert_id(),
            name: input.name,
            estimated_time: input.estimated_time,
        })
    }

    async fn select_projects(&self) -> AttendanceResult<Vec<Project>> {
        sqlx::query_as::<_, Project>(
            "SELECT id, name, estimated_time FROM projects ORDER BY name ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_error("select_projects"))
    }
}
