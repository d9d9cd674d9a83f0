use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AttendanceError, AttendanceResult};

/// Width of the `projects.name` column, in characters.
pub const MAX_PROJECT_NAME_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Project {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Design Review")]
    pub name: String,

    /// Estimated effort in minutes.
    #[schema(example = 45)]
    pub estimated_time: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub estimated_time: u32,
}

impl NewProject {
    pub fn parse(name: &str, estimated_time: i64) -> AttendanceResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AttendanceError::validation("Project name must not be empty"));
        }

        if name.chars().count() > MAX_PROJECT_NAME_LEN {
            return Err(AttendanceError::validation(format!(
                "Project name must be at most {MAX_PROJECT_NAME_LEN} characters"
            )));
        }

        if estimated_time <= 0 {
            return Err(AttendanceError::validation(
                "Estimated time must be a positive number of minutes",
            ));
        }

        let estimated_time = u32::try_from(estimated_time)
            .map_err(|_| AttendanceError::validation("Estimated time is too large"))?;

        Ok(Self {
            name: name.to_string(),
            estimated_time,
        })
    }
}
