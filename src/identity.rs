use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use derive_more::Display;
use futures::future::{Ready, ready};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::{Config, DEFAULT_IDENTITY_HEADER};
use crate::error::{AttendanceError, AttendanceResult};

/// Value used when the caller cannot be distinguished at all.
pub const UNKNOWN_IDENTITY: &str = "Unknown";

/// Width of the `identity` column, in characters.
pub const MAX_IDENTITY_LEN: usize = 255;

/// Caller-distinguishing key every session is recorded against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Trims and checks that the value fits the `identity` column.
    pub fn parse(value: &str) -> AttendanceResult<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(AttendanceError::validation("Identity must not be empty"));
        }

        if value.chars().count() > MAX_IDENTITY_LEN {
            return Err(AttendanceError::validation(format!(
                "Identity must be at most {MAX_IDENTITY_LEN} characters"
            )));
        }

        Ok(Self::new(value))
    }

    pub fn unknown() -> Self {
        Self(UNKNOWN_IDENTITY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == UNKNOWN_IDENTITY
    }

    /// Explicit header first, then the real peer address, then the sentinel.
    /// Only an over-long header value is an error.
    pub fn from_http_request(req: &HttpRequest, header_name: &str) -> AttendanceResult<Self> {
        let from_header = req
            .headers()
            .get(header_name)
            .and_then(|h| h.to_str().ok())
            .filter(|v| !v.trim().is_empty());

        if let Some(value) = from_header {
            return Self::parse(value);
        }

        match req.connection_info().realip_remote_addr() {
            Some(addr) if !addr.trim().is_empty() => Ok(Self::new(addr.trim())),
            _ => {
                tracing::warn!(path = %req.path(), "Caller identity unavailable, using sentinel");
                Ok(Self::unknown())
            }
        }
    }
}

impl FromRequest for Identity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let identity = match req.app_data::<Data<Config>>() {
            Some(config) => Self::from_http_request(req, &config.identity_header),
            None => Self::from_http_request(req, DEFAULT_IDENTITY_HEADER),
        };

        ready(identity.map_err(actix_web::Error::from))
    }
}
