//! High-level client for the perk runtime manager.
//!
//! Composes the provider registry, the aggregated catalog, and the local
//! inventory behind one entry point with a merged event stream and
//! cancellable background operations.

pub mod client;
pub mod error;
pub mod handle;

pub use client::Client;
pub use error::ClientError;
pub use handle::OperationHandle;
