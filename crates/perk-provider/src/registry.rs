use std::sync::{Arc, RwLock};

use perk_events::{EventSinkHandle, PerkEvent};
use tracing::debug;

use crate::provider::RuntimeProvider;

/// Ordered registry of available providers.
///
/// Registration order is significant: the catalog's deduplication gives the
/// first registered repository precedence when two list the same identity.
/// Registration and removal are announced on the event sink so consumers
/// can open or drop repository handles accordingly.
pub struct ProviderRegistry {
    providers: RwLock<Vec<Arc<dyn RuntimeProvider>>>,
    sink: EventSinkHandle,
}

impl ProviderRegistry {
    pub fn new(sink: EventSinkHandle) -> Self {
        Self {
            providers: RwLock::new(Vec::new()),
            sink,
        }
    }

    /// Registers a provider; a provider with the same URI is replaced in place.
    pub fn register(&self, provider: Arc<dyn RuntimeProvider>) {
        let mut providers = self.providers.write().unwrap();

        let uri = provider.uri().to_string();
        let name = provider.name().to_string();

        match providers.iter().position(|p| p.uri() == provider.uri()) {
            Some(index) => providers[index] = provider,
            None => providers.push(provider),
        }

        debug!(uri = %uri, name = %name, "provider registered");
        self.sink.emit(PerkEvent::ProviderRegistered { uri, name });
    }

    /// Removes the provider with the given URI; unknown URIs are a no-op.
    pub fn deregister(&self, uri: &url::Url) {
        let mut providers = self.providers.write().unwrap();
        let before = providers.len();
        providers.retain(|p| p.uri() != uri);

        if providers.len() != before {
            debug!(uri = %uri, "provider deregistered");
            self.sink.emit(PerkEvent::ProviderDeregistered {
                uri: uri.to_string(),
            });
        }
    }

    /// Providers in registration order.
    pub fn providers(&self) -> Vec<Arc<dyn RuntimeProvider>> {
        self.providers.read().unwrap().clone()
    }
}
