use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::Config;
use crate::controller::AttendanceController;
use crate::error::AttendanceError;
use crate::identity::Identity;
use crate::model::project::Project;
use crate::store::AppStore;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddProjectRequest {
    #[schema(example = "Design Review")]
    pub name: String,
    /// Minutes; must be positive.
    #[schema(example = 45)]
    pub estimated_time: i64,
}

#[derive(Serialize, ToSchema)]
pub struct ProjectListResponse {
    pub data: Vec<Project>,
}

/// List projects
#[utoipa::path(
    get,
    path = "/api/projects",
    responses(
        (status = 200, description = "Projects ordered by name", body = ProjectListResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Project"
)]
pub async fn list_projects(store: web::Data<AppStore>) -> Result<impl Responder, AttendanceError> {
    let data = store.list_projects().await?;
    Ok(HttpResponse::Ok().json(ProjectListResponse { data }))
}

/// Add project
#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = AddProjectRequest,
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 400, description = "Empty or over-long name, or non-positive estimate", body = Object, example = json!({
            "message": "Validation error: Estimated time must be a positive number of minutes"
        })),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("X-Attendance-Identity" = Option<String>, Header, description = "Caller identity; defaults to the peer address")
    ),
    tag = "Project"
)]
pub async fn add_project(
    identity: Identity,
    store: web::Data<AppStore>,
    config: web::Data<Config>,
    payload: web::Json<AddProjectRequest>,
) -> Result<impl Responder, AttendanceError> {
    let mut controller =
        AttendanceController::load(store.get_ref(), identity, config.open_session_policy).await?;

    let project = controller
        .add_project(&payload.name, payload.estimated_time)
        .await?;

    Ok(HttpResponse::Created().json(project))
}
