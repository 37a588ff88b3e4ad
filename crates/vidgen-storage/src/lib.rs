//! Object storage and metadata collaborator.
//!
//! Thin boundary wrappers over the hosted storage REST API: video
//! upload returning a public download URL, best-effort object
//! deletion, arbitrary-URL download, plus a document writer for the
//! public feed collection and the error-log collection. The pipeline
//! reaches these through traits so tests can substitute fakes.

pub mod client;
pub mod error;
pub mod firestore;

pub use client::StorageClient;
pub use error::{StorageError, StorageResult};
pub use firestore::DocumentWriter;
