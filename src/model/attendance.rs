use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AttendanceError, AttendanceResult};
use crate::identity::Identity;
use crate::model::metadata::Metadata;

pub type SessionId = u64;

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Whole minutes between two instants, floored.
pub fn work_minutes(checkin: DateTime<Utc>, checkout: DateTime<Utc>) -> i64 {
    (checkout - checkin)
        .num_milliseconds()
        .div_euclid(MILLIS_PER_MINUTE)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 12,
    "identity": "203.0.113.9",
    "checkin": "2024-01-01T09:00:00Z",
    "checkout": "2024-01-01T17:30:00Z",
    "project_id": 3,
    "work_minutes": 510,
    "check_in_metadata": {"timezone": "UTC"},
    "check_out_metadata": {"timezone": "UTC"}
}))]
pub struct AttendanceSession {
    pub id: SessionId,

    #[schema(value_type = String)]
    pub identity: Identity,

    #[schema(value_type = String, format = DateTime)]
    pub checkin: DateTime<Utc>,

    #[schema(value_type = Option<String>, format = DateTime, nullable = true)]
    pub checkout: Option<DateTime<Utc>>,

    #[schema(nullable = true)]
    pub project_id: Option<u64>,

    /// Minutes worked; present only once checked out.
    #[schema(nullable = true)]
    pub work_minutes: Option<i64>,

    pub check_in_metadata: Metadata,

    #[schema(nullable = true)]
    pub check_out_metadata: Option<Metadata>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closed {
        checkout: DateTime<Utc>,
        work_minutes: i64,
    },
}

impl AttendanceSession {
    /// Fails when exactly one of `checkout` / `work_minutes` is recorded.
    pub fn state(&self) -> AttendanceResult<SessionState> {
        match (self.checkout, self.work_minutes) {
            (None, None) => Ok(SessionState::Open),
            (Some(checkout), Some(work_minutes)) => Ok(SessionState::Closed {
                checkout,
                work_minutes,
            }),
            _ => Err(AttendanceError::Store(format!(
                "session {} is half closed",
                self.id
            ))),
        }
    }

    pub fn is_open(&self) -> bool {
        self.checkout.is_none()
    }
}

/// Row to insert at check-in.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub identity: Identity,
    pub checkin: DateTime<Utc>,
    pub project_id: Option<u64>,
    pub metadata: Metadata,
}

/// Columns written at check-out.
#[derive(Debug, Clone)]
pub struct CloseSession {
    pub checkout: DateTime<Utc>,
    pub work_minutes: i64,
    pub metadata: Metadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn session(checkout: Option<&str>, work_minutes: Option<i64>) -> AttendanceSession {
        AttendanceSession {
            id: 1,
            identity: Identity::new("10.0.0.1"),
            checkin: at("2024-01-01T00:00:00Z"),
            checkout: checkout.map(at),
            project_id: None,
            work_minutes,
            check_in_metadata: Metadata::default(),
            check_out_metadata: None,
        }
    }

    #[test]
    fn minutes_are_floored() {
        let checkin = at("2024-01-01T00:00:00Z");
        assert_eq!(work_minutes(checkin, at("2024-01-01T00:01:30Z")), 1);
        assert_eq!(work_minutes(checkin, at("2024-01-01T00:00:59Z")), 0);
        assert_eq!(work_minutes(checkin, at("2024-01-01T08:00:00Z")), 480);
    }

    #[test]
    fn minutes_across_offsets_use_utc_instants() {
        let checkin = DateTime::parse_from_rfc3339("2024-01-01T09:00:00+06:00")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(work_minutes(checkin, at("2024-01-01T03:45:10Z")), 45);
    }

    #[test]
    fn negative_spans_floor_downwards() {
        let checkin = at("2024-01-01T00:00:30Z");
        assert_eq!(work_minutes(checkin, at("2024-01-01T00:00:00Z")), -1);
    }

    #[test]
    fn open_and_closed_states() {
        assert_eq!(session(None, None).state().unwrap(), SessionState::Open);
        assert!(matches!(
            session(Some("2024-01-01T01:00:00Z"), Some(60)).state().unwrap(),
            SessionState::Closed { work_minutes: 60, .. }
        ));
    }

    #[test]
    fn half_closed_rows_are_rejected() {
        assert!(session(Some("2024-01-01T01:00:00Z"), None).state().is_err());
        assert!(session(None, Some(5)).state().is_err());
    }
}
