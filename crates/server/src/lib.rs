//! HTTP host for the attrition scoring service

pub mod api;
pub mod config;

pub use api::{create_router, serve, AppState};
pub use config::ServiceConfig;
