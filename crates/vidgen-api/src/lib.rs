//! HTTP surface for the video generation pipeline.
//!
//! Three routes: phase A submission (`POST /api/process-video`,
//! multipart), phase B composition (`POST /api/complete-video`, JSON),
//! and a single-poll task status probe for the client to drive the
//! wait between them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
