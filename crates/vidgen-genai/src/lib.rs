//! Client for the asynchronous AI video generation service.
//!
//! The service contract is submit-poll-fetch: a still frame plus a
//! text prompt yields a task id; the task is polled until a terminal
//! state; the resulting file id resolves to a short-lived download
//! URL. All outbound calls go through the retrying network client,
//! which backs off on transient failures and gives up immediately on
//! permanent ones.

pub mod client;
pub mod error;
pub mod retry;

pub use client::{FileId, GenerationClient, GenerationConfig, TaskId, TaskStatus};
pub use error::{GenError, GenResult};
pub use retry::{retry_with_backoff, RetryClass, RetryConfig};
