use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Snapshot of the caller's environment (agent, timezone, screen, locale...).
///
/// Stored verbatim next to a session and never interpreted. Only JSON objects
/// are accepted so that the column always holds a key/value map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object, example = json!({
    "userAgent": "Mozilla/5.0",
    "timezone": "Asia/Dhaka",
    "screenResolution": "1920x1080"
}))]
pub struct Metadata(Map<String, Value>);

impl Metadata {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Metadata {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}
