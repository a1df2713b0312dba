//! Repository provider contract for the perk runtime manager.
//!
//! Every upstream runtime source implements [`RuntimeProvider`]; the
//! catalog consumes providers through the [`ProviderRegistry`] and drives
//! their live [`Repository`] handles through a uniform update protocol.

pub mod builtin;
pub mod context;
pub mod error;
pub mod provider;
pub mod registry;
pub mod repository;

pub use builtin::{JsonIndexProvider, StaticProvider};
pub use context::ProviderContext;
pub use error::ProviderError;
pub use provider::RuntimeProvider;
pub use registry::ProviderRegistry;
pub use repository::{never_cancel, CancelCheck, FetchProgress, Repository, RuntimeFetcher};
