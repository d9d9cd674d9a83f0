pub mod attendance;
pub mod project;
