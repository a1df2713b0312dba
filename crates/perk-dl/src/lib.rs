//! Download plumbing for the perk runtime manager.
//!
//! Provides the shared HTTP agent, a thin fetch wrapper, and the streaming
//! [`Download`] type that computes archive digests incrementally while
//! writing to disk.

pub mod download;
pub mod error;
pub mod http;
pub mod http_client;
pub mod types;

pub use download::{Download, Downloaded};
pub use error::DownloadError;
pub use http::Http;
pub use http_client::{configure_http_client, shared_agent, ClientConfig};
pub use types::{Progress, ShouldCancel};
