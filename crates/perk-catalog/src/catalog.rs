use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, RwLock,
    },
};

use perk_core::{RuntimeDescription, SearchCriteria};
use perk_dl::{Download, Progress};
use perk_events::{EventSinkHandle, OperationId, PerkEvent};
use perk_inventory::Inventory;
use perk_provider::{CancelCheck, ProviderContext, ProviderError, ProviderRegistry, Repository};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::CatalogError;

/// Shared cancellation predicate for downloads.
pub type CancelSignal = Arc<dyn Fn() -> bool + Send + Sync>;

/// One deduplicated entry in the merged catalog view.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub description: RuntimeDescription,
    /// Every repository offering this identity, in registry order. The
    /// description itself comes from the first.
    pub offered_by: Vec<Url>,
}

/// Outcome of a catalog-wide update.
#[derive(Debug, Default)]
pub struct UpdateReport {
    pub updated: usize,
    /// Repositories that failed, as `(uri, cause)` pairs.
    pub failures: Vec<(String, String)>,
}

type SharedOutcome = Result<PathBuf, String>;

/// Aggregated, deduplicated view over all registered repositories.
///
/// The merged view is recomputed on demand from each repository's
/// independently-updating snapshot; it is never itself a locked structure.
/// Reading a repository mid-update is acceptable staleness that resolves on
/// the next update.
pub struct Catalog {
    registry: Arc<ProviderRegistry>,
    context: ProviderContext,
    sink: EventSinkHandle,
    repositories: RwLock<Vec<Arc<Repository>>>,
    in_flight: Mutex<HashMap<String, broadcast::Sender<SharedOutcome>>>,
    next_op_id: AtomicU64,
}

impl Catalog {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        context: ProviderContext,
        sink: EventSinkHandle,
    ) -> Self {
        Self {
            registry,
            context,
            sink,
            repositories: RwLock::new(Vec::new()),
            in_flight: Mutex::new(HashMap::new()),
            next_op_id: AtomicU64::new(1),
        }
    }

    /// Open repository handles, in registry order.
    pub fn repositories(&self) -> Vec<Arc<Repository>> {
        self.repositories.read().unwrap().clone()
    }

    /// Synchronizes open repository handles with the provider registry.
    ///
    /// Newly registered providers are opened, deregistered ones dropped;
    /// handles for providers that stayed registered are reused so their
    /// description sets survive. Open failures are collected, not fatal.
    fn refresh_repositories(&self) -> Vec<(String, ProviderError)> {
        let providers = self.registry.providers();
        let mut repositories = self.repositories.write().unwrap();

        let mut failures = Vec::new();
        let mut next = Vec::with_capacity(providers.len());

        for provider in providers {
            if let Some(existing) = repositories
                .iter()
                .find(|repo| repo.uri() == provider.uri())
            {
                next.push(existing.clone());
                continue;
            }

            match provider.open(&self.context, self.sink.clone()) {
                Ok(repository) => next.push(Arc::new(repository)),
                Err(err) => {
                    warn!(uri = %provider.uri(), error = %err, "failed to open repository");
                    failures.push((provider.uri().to_string(), err));
                }
            }
        }

        *repositories = next;
        failures
    }

    /// Updates one repository, or all of them.
    ///
    /// With a named repository any failure propagates. Updating all
    /// repositories treats individual failures as partial success: the
    /// batch continues and the failures are reported in the returned
    /// report and the completion event.
    pub fn update(
        &self,
        repository: Option<&Url>,
        should_cancel: CancelCheck,
    ) -> Result<UpdateReport, CatalogError> {
        let open_failures = self.refresh_repositories();

        match repository {
            Some(uri) => {
                if let Some((_, err)) = open_failures
                    .into_iter()
                    .find(|(failed, _)| failed == uri.as_str())
                {
                    return Err(err.into());
                }

                let repo = self
                    .repositories()
                    .into_iter()
                    .find(|repo| repo.uri() == uri)
                    .ok_or_else(|| CatalogError::NoRepository(uri.to_string()))?;

                repo.update(should_cancel)?;
                self.sink.emit(PerkEvent::CatalogUpdateCompleted {
                    updated: 1,
                    failed: 0,
                });
                Ok(UpdateReport {
                    updated: 1,
                    failures: Vec::new(),
                })
            }
            None => {
                let mut report = UpdateReport::default();
                for (uri, err) in open_failures {
                    report.failures.push((uri, err.to_string()));
                }

                for repo in self.repositories() {
                    match repo.update(should_cancel) {
                        Ok(_) => report.updated += 1,
                        Err(err) => {
                            report
                                .failures
                                .push((repo.uri().to_string(), err.to_string()));
                        }
                    }
                }

                debug!(
                    updated = report.updated,
                    failed = report.failures.len(),
                    "catalog update finished"
                );
                self.sink.emit(PerkEvent::CatalogUpdateCompleted {
                    updated: report.updated,
                    failed: report.failures.len(),
                });
                Ok(report)
            }
        }
    }

    /// Deduplicated union of all repositories' descriptions.
    ///
    /// When two repositories list the same identity the first in registry
    /// order wins and the entry is annotated with every offering
    /// repository.
    pub fn search(&self, criteria: &SearchCriteria) -> Vec<CatalogEntry> {
        self.refresh_repositories();

        let mut entries: Vec<CatalogEntry> = Vec::new();
        let mut by_id: HashMap<String, usize> = HashMap::new();

        for repo in self.repositories() {
            for description in repo.runtimes().iter() {
                if !criteria.matches(description) {
                    continue;
                }

                match by_id.get(&description.id()) {
                    Some(&index) => {
                        let offered_by = &mut entries[index].offered_by;
                        if !offered_by.contains(repo.uri()) {
                            offered_by.push(repo.uri().clone());
                        }
                    }
                    None => {
                        by_id.insert(description.id(), entries.len());
                        entries.push(CatalogEntry {
                            description: description.clone(),
                            offered_by: vec![repo.uri().clone()],
                        });
                    }
                }
            }
        }

        entries
    }

    /// Looks up one identity in the merged view.
    pub fn find(&self, id: &str) -> Option<RuntimeDescription> {
        for repo in self.repositories() {
            if let Some(description) = repo.runtimes().iter().find(|d| d.id() == id) {
                return Some(description.clone());
            }
        }
        None
    }

    /// Downloads an archive, verifies it in-stream, and records it in the
    /// destination inventory.
    ///
    /// At most one transfer per identity is in flight: a second request for
    /// the same identity attaches to the first transfer's outcome instead
    /// of starting a duplicate.
    pub async fn download(
        &self,
        id: &str,
        inventory: &Inventory,
        should_cancel: CancelSignal,
    ) -> Result<PathBuf, CatalogError> {
        let description = self
            .find(id)
            .ok_or_else(|| CatalogError::UnknownIdentity(id.to_string()))?;

        enum Role {
            Lead(broadcast::Sender<SharedOutcome>),
            Attach(broadcast::Receiver<SharedOutcome>),
        }

        // No await between the map check and the insert: the leader's entry
        // is visible before any other caller can look.
        let role = {
            let mut in_flight = self.in_flight.lock().unwrap();
            match in_flight.get(id) {
                Some(sender) => Role::Attach(sender.subscribe()),
                None => {
                    let (sender, _) = broadcast::channel(1);
                    in_flight.insert(id.to_string(), sender.clone());
                    Role::Lead(sender)
                }
            }
        };

        match role {
            Role::Attach(mut receiver) => {
                debug!(id = %id, "attaching to in-flight download");
                match receiver.recv().await {
                    Ok(Ok(path)) => Ok(path),
                    Ok(Err(cause)) => Err(CatalogError::DownloadFailed {
                        id: id.to_string(),
                        cause,
                    }),
                    Err(_) => Err(CatalogError::DownloadFailed {
                        id: id.to_string(),
                        cause: "download aborted".to_string(),
                    }),
                }
            }
            Role::Lead(sender) => {
                let result = self
                    .perform_download(&description, inventory, should_cancel)
                    .await;

                self.in_flight.lock().unwrap().remove(id);

                let outcome = match &result {
                    Ok(path) => Ok(path.clone()),
                    Err(err) => Err(err.to_string()),
                };
                let _ = sender.send(outcome);

                result
            }
        }
    }

    async fn perform_download(
        &self,
        description: &RuntimeDescription,
        inventory: &Inventory,
        should_cancel: CancelSignal,
    ) -> Result<PathBuf, CatalogError> {
        let id = description.id();
        let op_id: OperationId = self.next_op_id.fetch_add(1, Ordering::SeqCst);

        self.sink.emit(PerkEvent::DownloadStarting {
            op_id,
            id: id.clone(),
            total: description.archive_size,
        });

        let staging = std::env::temp_dir()
            .join("perk-staging")
            .join(format!("{}-{op_id}", description.archive_hash.file_stem()));

        let url = description.archive_uri.to_string();
        let algorithm = description.archive_hash.algorithm.as_str();
        let progress_sink = self.sink.clone();
        let progress_id = id.clone();

        let transfer = tokio::task::spawn_blocking(move || {
            Download::new(url, staging)
                .digest(algorithm)
                .progress(move |progress| {
                    if let Progress::Chunk { current, total } = progress {
                        progress_sink.emit(PerkEvent::DownloadProgress {
                            op_id,
                            id: progress_id.clone(),
                            current,
                            total,
                        });
                    }
                })
                .cancel_when(move || should_cancel())
                .execute()
        })
        .await
        .map_err(|err| CatalogError::Background(err.to_string()))?;

        let downloaded = match transfer {
            Ok(downloaded) => downloaded,
            Err(err) => return Err(self.fail_download(op_id, &id, err.into())),
        };

        let expected = &description.archive_hash.digest;
        // Download always yields a digest when one was requested.
        let actual = downloaded.digest.clone().unwrap_or_default();

        if !actual.eq_ignore_ascii_case(expected) {
            let _ = std::fs::remove_file(&downloaded.path);
            let err = CatalogError::HashMismatch {
                id: id.clone(),
                expected: expected.clone(),
                actual,
            };
            return Err(self.fail_download(op_id, &id, err));
        }

        if let Err(err) = inventory.add(description.clone(), downloaded.path).await {
            return Err(self.fail_download(op_id, &id, err.into()));
        }

        let path = inventory.path_of(&id)?;

        info!(id = %id, size = downloaded.size, "download verified and recorded");
        self.sink.emit(PerkEvent::DownloadCompleted {
            op_id,
            id,
            total: downloaded.size,
        });

        Ok(path)
    }

    fn fail_download(&self, op_id: OperationId, id: &str, err: CatalogError) -> CatalogError {
        warn!(id = %id, error = %err, "download failed");
        self.sink.emit(PerkEvent::DownloadFailed {
            op_id,
            id: id.to_string(),
            cause: err.to_string(),
        });
        err
    }
}
