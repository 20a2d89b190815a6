//! dreams-server: REST backend for dreams, contributions and comments
//!
//! Users post dreams (money, services or gifts), others fulfill them and
//! comment on them. Layers, bottom up:
//!
//! - [`models`]: validated input types
//! - [`fulfillment`]: per-category contribution rules, no I/O
//! - [`db`]: SQLite pool, schema bootstrap, repositories
//! - [`auth`]: password hashing and access tokens
//! - [`http`]: axum router, extractors, JSON errors

pub mod auth;
pub mod config;
pub mod db;
pub mod fulfillment;
pub mod http;
pub mod models;

pub use config::AppConfig;
pub use http::{build_router, run_server, ApiError, AppState, ServerConfig, ServerError};
