use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::config::Config;
use crate::controller::{AttendanceController, AttendanceView};
use crate::error::AttendanceError;
use crate::identity::Identity;
use crate::model::attendance::AttendanceSession;
use crate::model::metadata::Metadata;
use crate::store::AppStore;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckInRequest {
    #[schema(example = 1)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckOutRequest {
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogScope {
    #[default]
    Mine,
    All,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LogQuery {
    /// `mine` (default) for the caller's sessions, `all` for every identity.
    pub scope: Option<LogScope>,
}

#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    #[schema(example = "Checked in successfully")]
    pub message: String,
    pub session: AttendanceSession,
    pub view: AttendanceView,
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body = CheckInRequest,
    responses(
        (status = 200, description = "Checked in successfully", body = SessionResponse),
        (status = 400, description = "No project selected or unknown project", body = Object, example = json!({
            "message": "Validation error: Select a project before checking in"
        })),
        (status = 409, description = "An open session already exists", body = Object, example = json!({
            "message": "Already checked in"
        })),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("X-Attendance-Identity" = Option<String>, Header, description = "Caller identity; defaults to the peer address")
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    identity: Identity,
    store: web::Data<AppStore>,
    config: web::Data<Config>,
    payload: web::Json<CheckInRequest>,
) -> Result<impl Responder, AttendanceError> {
    let payload = payload.into_inner();
    let mut controller =
        AttendanceController::load(store.get_ref(), identity, config.open_session_policy).await?;

    let session = controller
        .check_in(payload.project_id, payload.metadata)
        .await?;

    Ok(HttpResponse::Ok().json(SessionResponse {
        message: "Checked in successfully".to_string(),
        session,
        view: controller.view(),
    }))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    request_body = CheckOutRequest,
    responses(
        (status = 200, description = "Checked out successfully", body = SessionResponse),
        (status = 409, description = "No active session, or it was already checked out", body = Object, example = json!({
            "message": "No active session found"
        })),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("X-Attendance-Identity" = Option<String>, Header, description = "Caller identity; defaults to the peer address")
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    identity: Identity,
    store: web::Data<AppStore>,
    config: web::Data<Config>,
    payload: web::Json<CheckOutRequest>,
) -> Result<impl Responder, AttendanceError> {
    let mut controller =
        AttendanceController::load(store.get_ref(), identity, config.open_session_policy).await?;

    let session = controller.check_out(payload.into_inner().metadata).await?;

    Ok(HttpResponse::Ok().json(SessionResponse {
        message: "Checked out successfully".to_string(),
        session,
        view: controller.view(),
    }))
}

/// Attendance log with the caller's derived check-in state
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(
        LogQuery,
        ("X-Attendance-Identity" = Option<String>, Header, description = "Caller identity; defaults to the peer address")
    ),
    responses(
        (status = 200, description = "Sessions, most recent check-in first", body = AttendanceView),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn list_sessions(
    identity: Identity,
    store: web::Data<AppStore>,
    config: web::Data<Config>,
    query: web::Query<LogQuery>,
) -> Result<impl Responder, AttendanceError> {
    let controller =
        AttendanceController::load(store.get_ref(), identity, config.open_session_policy).await?;

    let mut view = controller.view();
    if query.scope.unwrap_or_default() == LogScope::All {
        view.sessions = store.list_sessions().await?;
    }

    Ok(HttpResponse::Ok().json(view))
}
