//! Attendance tracker: check in/out against a caller identity, per-project
//! sessions with worked minutes, served over actix-web.

pub mod api;
pub mod config;
pub mod controller;
pub mod db;
pub mod docs;
pub mod error;
pub mod identity;
pub mod model;
pub mod routes;
pub mod store;
