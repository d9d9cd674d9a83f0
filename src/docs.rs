use crate::api::attendance::{CheckInRequest, CheckOutRequest, LogScope, SessionResponse};
use crate::api::project::{AddProjectRequest, ProjectListResponse};
use crate::controller::AttendanceView;
use crate::model::attendance::AttendanceSession;
use crate::model::metadata::Metadata;
use crate::model::project::Project;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Tracker API",
        version = "0.1.0",
        description = r#"
## Attendance Tracker

Check in and out against a caller identity, pick the project you are working on,
and review past sessions.

### Key Features
- **Attendance**
  - Check in (with a project) and check out; worked minutes are computed on check-out
  - Session log, most recent first, with the caller's current check-in state
- **Projects**
  - Add projects with an estimated time, list them alphabetically

### Identity
Sessions are recorded against the `X-Attendance-Identity` header (name is configurable).
Without it the caller's address is used, and `Unknown` when even that is missing.

### Response Format
- JSON bodies; errors are `{"message": "..."}`

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::list_sessions,

        crate::api::project::list_projects,
        crate::api::project::add_project
    ),
    components(
        schemas(
            AttendanceSession,
            AttendanceView,
            Metadata,
            Project,
            CheckInRequest,
            CheckOutRequest,
            LogScope,
            SessionResponse,
            AddProjectRequest,
            ProjectListResponse
        )
    ),
    tags(
        (name = "Attendance", description = "Check-in, check-out and session log APIs"),
        (name = "Project", description = "Project management APIs"),
    )
)]
pub struct ApiDoc;
