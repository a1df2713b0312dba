use std::{
    future::Future,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::Receiver,
        Arc,
    },
};

use perk_catalog::{CancelSignal, Catalog, CatalogEntry, UpdateReport};
use perk_core::SearchCriteria;
use perk_events::{ChannelSink, EventSinkHandle, PerkEvent};
use perk_inventory::{Inventory, InventoryRecord};
use perk_provider::{ProviderContext, ProviderRegistry, RuntimeProvider};
use tokio::sync::oneshot;
use tracing::debug;
use url::Url;

use crate::{error::ClientError, handle::OperationHandle};

/// High-level entry point tying the catalog and the inventory together.
///
/// All components publish into one shared sink, so the receiver returned by
/// [`Client::open`] observes a single merged event stream. Every operation
/// that may touch the network or the filesystem is submitted to a
/// background task and tracked through an [`OperationHandle`]; only pure
/// in-memory lookups are plain synchronous calls.
pub struct Client {
    registry: Arc<ProviderRegistry>,
    catalog: Arc<Catalog>,
    inventory: Arc<Inventory>,
}

impl Client {
    /// Opens a client rooted at `root`, with a channel sink for events.
    ///
    /// The inventory lives under `root` and provider caches under
    /// `root/cache`.
    pub fn open(root: impl Into<PathBuf>) -> Result<(Self, Receiver<PerkEvent>), ClientError> {
        let (sink, receiver) = ChannelSink::new();
        let client = Self::open_with_sink(root, Arc::new(sink))?;
        Ok((client, receiver))
    }

    /// Opens a client publishing events to a caller-provided sink.
    pub fn open_with_sink(
        root: impl Into<PathBuf>,
        sink: EventSinkHandle,
    ) -> Result<Self, ClientError> {
        let root = root.into();
        debug!(root = %root.display(), "opening client");

        let registry = Arc::new(ProviderRegistry::new(sink.clone()));
        let catalog = Arc::new(Catalog::new(
            registry.clone(),
            ProviderContext::new(root.join("cache")),
            sink.clone(),
        ));
        let inventory = Arc::new(Inventory::open(sink, root)?);

        Ok(Self {
            registry,
            catalog,
            inventory,
        })
    }

    /// Registers a runtime provider; same-URI registration replaces in place.
    pub fn register_provider(&self, provider: Arc<dyn RuntimeProvider>) {
        self.registry.register(provider);
    }

    /// Removes a provider; unknown URIs are a no-op.
    pub fn deregister_provider(&self, uri: &Url) {
        self.registry.deregister(uri);
    }

    /// Registered providers as `(uri, name)` pairs, in registration order.
    pub fn repository_list(&self) -> Vec<(Url, String)> {
        self.registry
            .providers()
            .iter()
            .map(|p| (p.uri().clone(), p.name().to_string()))
            .collect()
    }

    /// Updates one repository, or all of them, in the background.
    pub fn repository_update(
        &self,
        repository: Option<Url>,
    ) -> OperationHandle<UpdateReport> {
        let catalog = self.catalog.clone();
        self.submit(move |cancel| async move {
            tokio::task::spawn_blocking(move || {
                let should_cancel = move || cancel.load(Ordering::SeqCst);
                catalog
                    .update(repository.as_ref(), &should_cancel)
                    .map_err(ClientError::from)
            })
            .await
            .map_err(|err| ClientError::Background(err.to_string()))?
        })
    }

    /// Searches the merged catalog view in the background.
    ///
    /// Refreshing the repository set may touch the filesystem, so the
    /// search runs off the calling task like every other operation.
    pub fn catalog_search(&self, criteria: SearchCriteria) -> OperationHandle<Vec<CatalogEntry>> {
        let catalog = self.catalog.clone();
        self.submit(move |_cancel| async move {
            tokio::task::spawn_blocking(move || Ok(catalog.search(&criteria)))
                .await
                .map_err(|err| ClientError::Background(err.to_string()))?
        })
    }

    /// Downloads, verifies, and records a runtime in the background.
    pub fn catalog_download(&self, id: String) -> OperationHandle<PathBuf> {
        let catalog = self.catalog.clone();
        let inventory = self.inventory.clone();
        self.submit(move |cancel| async move {
            let signal: CancelSignal = Arc::new(move || cancel.load(Ordering::SeqCst));
            catalog
                .download(&id, &inventory, signal)
                .await
                .map_err(ClientError::from)
        })
    }

    /// Searches the local inventory.
    pub fn inventory_search(
        &self,
        criteria: SearchCriteria,
    ) -> OperationHandle<Vec<InventoryRecord>> {
        let inventory = self.inventory.clone();
        self.submit(move |_cancel| async move {
            inventory.search(&criteria).await.map_err(ClientError::from)
        })
    }

    /// Archive path of an inventoried runtime.
    pub fn inventory_path(&self, id: &str) -> Result<PathBuf, ClientError> {
        Ok(self.inventory.path_of(id)?)
    }

    /// Deletes a runtime and its artifacts; absent identities are a no-op.
    pub fn inventory_delete(&self, id: String) -> OperationHandle<()> {
        let inventory = self.inventory.clone();
        self.submit(move |_cancel| async move {
            inventory.delete(&id).await.map_err(ClientError::from)
        })
    }

    /// Re-hashes a stored archive against its declared digest.
    pub fn inventory_verify(&self, id: String) -> OperationHandle<()> {
        let inventory = self.inventory.clone();
        self.submit(move |_cancel| async move {
            inventory.verify(&id).await.map_err(ClientError::from)
        })
    }

    /// Extracts a stored archive, verifying it first.
    pub fn inventory_unpack(
        &self,
        id: String,
        target: Option<PathBuf>,
    ) -> OperationHandle<PathBuf> {
        let inventory = self.inventory.clone();
        self.submit(move |cancel| async move {
            let should_cancel = move || cancel.load(Ordering::SeqCst);
            inventory
                .unpack(&id, target, &should_cancel)
                .await
                .map_err(ClientError::from)
        })
    }

    fn submit<T, Fut, F>(&self, make: F) -> OperationHandle<T>
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
        F: FnOnce(Arc<AtomicBool>) -> Fut,
    {
        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = oneshot::channel();
        let fut = make(cancel.clone());
        tokio::spawn(async move {
            let _ = tx.send(fut.await);
        });
        OperationHandle::new(rx, cancel)
    }
}
