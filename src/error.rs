//! Error taxonomy shared by the store client, the controller and the HTTP layer.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::model::attendance::SessionId;

#[derive(Debug, Error)]
pub enum AttendanceError {
    /// The table store rejected or failed the operation.
    #[error("Store error: {0}")]
    Store(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("No active session found")]
    NoActiveSession,

    #[error("Already checked in")]
    AlreadyCheckedIn,

    /// A concurrent check-out closed the session first.
    #[error("Session {0} is already checked out")]
    SessionClosed(SessionId),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type AttendanceResult<T> = Result<T, AttendanceError>;

impl AttendanceError {
    pub fn validation(message: impl Into<String>) -> Self {
        AttendanceError::Validation(message.into())
    }

    /// Message safe to show to the caller. Store details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            AttendanceError::Store(_) => "Something went wrong, Contact with system admin".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<sqlx::Error> for AttendanceError {
    fn from(err: sqlx::Error) -> Self {
        AttendanceError::Store(err.to_string())
    }
}

impl ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AttendanceError::NotFound { .. } => StatusCode::NOT_FOUND,
            AttendanceError::NoActiveSession
            | AttendanceError::AlreadyCheckedIn
            | AttendanceError::SessionClosed(_) => StatusCode::CONFLICT,
            AttendanceError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.user_message()
        }))
    }
}
