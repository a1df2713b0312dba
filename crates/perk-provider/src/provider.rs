use perk_events::EventSinkHandle;
use url::Url;

use crate::{context::ProviderContext, error::ProviderError, repository::Repository};

/// Contract every upstream runtime source implements.
///
/// Isolating network and format specifics behind this trait lets the
/// catalog treat every upstream uniformly; new sources plug in without
/// touching aggregation logic.
pub trait RuntimeProvider: Send + Sync {
    /// Stable origin identifier for this provider. Not necessarily
    /// reachable over the network.
    fn uri(&self) -> &Url;

    /// Human-readable short name.
    fn name(&self) -> &str;

    /// Opens a live repository handle for this provider.
    ///
    /// Fails when local cache state cannot be established.
    fn open(
        &self,
        context: &ProviderContext,
        sink: EventSinkHandle,
    ) -> Result<Repository, ProviderError>;
}
