pub mod attendance;
pub mod metadata;
pub mod project;
