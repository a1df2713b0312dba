use std::sync::{Arc, RwLock};

use perk_core::RuntimeDescription;
use perk_events::{EventSinkHandle, PerkEvent};
use tracing::{debug, warn};
use url::Url;

use crate::error::ProviderError;

/// Cooperative cancellation predicate for repository updates.
pub type CancelCheck<'a> = &'a (dyn Fn() -> bool + Send + Sync);

/// Progress callback invoked while fetching an index.
pub type FetchProgress<'a> = &'a (dyn Fn(u64, u64) + Send + Sync);

/// Fetches the current description set from an upstream source.
///
/// Implementations are produced by a provider's `open` and carry whatever
/// network or cache state the provider needs. They must consult the
/// cancellation predicate periodically and abort early when it fires.
pub trait RuntimeFetcher: Send + Sync {
    fn fetch(
        &self,
        should_cancel: CancelCheck,
        progress: FetchProgress,
    ) -> Result<Vec<RuntimeDescription>, ProviderError>;
}

/// Live handle to one upstream source.
///
/// Holds the most recently fetched description set. `update` refreshes the
/// set; readers get cheap read-copy-update snapshots, so staleness while an
/// update is in flight resolves on the next read.
pub struct Repository {
    uri: Url,
    name: String,
    fetcher: Box<dyn RuntimeFetcher>,
    runtimes: RwLock<Arc<Vec<RuntimeDescription>>>,
    sink: EventSinkHandle,
}

impl Repository {
    pub fn new(
        uri: Url,
        name: impl Into<String>,
        fetcher: Box<dyn RuntimeFetcher>,
        sink: EventSinkHandle,
    ) -> Self {
        Self {
            uri,
            name: name.into(),
            fetcher,
            runtimes: RwLock::new(Arc::new(Vec::new())),
            sink,
        }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current known descriptions; empty before the first update.
    pub fn runtimes(&self) -> Arc<Vec<RuntimeDescription>> {
        self.runtimes.read().unwrap().clone()
    }

    /// Refreshes the known set by contacting the upstream source.
    ///
    /// Returns the refreshed description count. A fetch failure is absorbed
    /// when a previously-known baseline remains usable: the old set is kept,
    /// an `UpdateFailed` event is emitted, and the call still succeeds. With
    /// no baseline the error propagates.
    pub fn update(&self, should_cancel: CancelCheck) -> Result<usize, ProviderError> {
        let repository = self.uri.to_string();

        self.sink.emit(PerkEvent::RepositoryUpdateStarted {
            repository: repository.clone(),
        });

        let progress_repo = repository.clone();
        let sink = self.sink.clone();
        let progress = move |current: u64, total: u64| {
            sink.emit(PerkEvent::RepositoryUpdateProgress {
                repository: progress_repo.clone(),
                current,
                total,
            });
        };

        match self.fetcher.fetch(should_cancel, &progress) {
            Ok(descriptions) => {
                let count = descriptions.len();
                *self.runtimes.write().unwrap() = Arc::new(descriptions);

                debug!(repository = %repository, count, "repository updated");
                self.sink.emit(PerkEvent::RepositoryUpdateCompleted {
                    repository,
                    count,
                });
                Ok(count)
            }
            Err(err) => {
                self.sink.emit(PerkEvent::RepositoryUpdateFailed {
                    repository: repository.clone(),
                    cause: err.to_string(),
                });

                let baseline = self.runtimes();
                if baseline.is_empty() {
                    Err(err)
                } else {
                    warn!(
                        repository = %repository,
                        error = %err,
                        baseline = baseline.len(),
                        "update failed, keeping previous description set"
                    );
                    Ok(baseline.len())
                }
            }
        }
    }
}

/// A repository update that can never be cancelled.
pub fn never_cancel() -> impl Fn() -> bool + Send + Sync {
    || false
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use perk_core::{ArchiveHash, HashAlgorithm, RuntimeConfiguration, RuntimeVersion};
    use perk_events::CollectorSink;

    use super::*;

    fn description(digest: &str) -> RuntimeDescription {
        RuntimeDescription {
            repository: Url::parse("urn:example:static").unwrap(),
            version: RuntimeVersion::parse("17").unwrap(),
            platform: "linux".to_string(),
            architecture: "x86_64".to_string(),
            vm: "hotspot".to_string(),
            configuration: RuntimeConfiguration::Jdk,
            archive_uri: Url::parse("https://example.com/a.tar.gz").unwrap(),
            archive_size: 10,
            archive_hash: ArchiveHash::new(HashAlgorithm::Sha256, digest),
            tag: None,
        }
    }

    struct FlakyFetcher {
        fail: AtomicBool,
        calls: AtomicUsize,
    }

    impl RuntimeFetcher for FlakyFetcher {
        fn fetch(
            &self,
            _should_cancel: CancelCheck,
            progress: FetchProgress,
        ) -> Result<Vec<RuntimeDescription>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            progress(1, 1);

            if self.fail.load(Ordering::SeqCst) {
                Err(ProviderError::Update {
                    uri: "urn:example:static".to_string(),
                    source: perk_dl::DownloadError::InvalidResponse,
                })
            } else {
                Ok(vec![description("aa"), description("bb")])
            }
        }
    }

    fn repository(sink: Arc<CollectorSink>) -> (Repository, Arc<FlakyFetcher>) {
        let fetcher = Arc::new(FlakyFetcher {
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        });

        struct Shared(Arc<FlakyFetcher>);
        impl RuntimeFetcher for Shared {
            fn fetch(
                &self,
                should_cancel: CancelCheck,
                progress: FetchProgress,
            ) -> Result<Vec<RuntimeDescription>, ProviderError> {
                self.0.fetch(should_cancel, progress)
            }
        }

        let repo = Repository::new(
            Url::parse("urn:example:static").unwrap(),
            "static",
            Box::new(Shared(fetcher.clone())),
            sink,
        );
        (repo, fetcher)
    }

    #[test]
    fn test_runtimes_empty_before_first_update() {
        let (repo, _) = repository(Arc::new(CollectorSink::default()));
        assert!(repo.runtimes().is_empty());
    }

    #[test]
    fn test_update_populates_set_and_emits_events() {
        let sink = Arc::new(CollectorSink::default());
        let (repo, _) = repository(sink.clone());

        let count = repo.update(&never_cancel()).unwrap();
        assert_eq!(count, 2);
        assert_eq!(repo.runtimes().len(), 2);

        let events = sink.events();
        assert!(matches!(&events[0], PerkEvent::RepositoryUpdateStarted { .. }));
        assert!(matches!(
            &events[1],
            PerkEvent::RepositoryUpdateProgress { current: 1, total: 1, .. }
        ));
        assert!(matches!(
            events.last().unwrap(),
            PerkEvent::RepositoryUpdateCompleted { count: 2, .. }
        ));
    }

    #[test]
    fn test_failed_update_with_baseline_keeps_old_set() {
        let sink = Arc::new(CollectorSink::default());
        let (repo, fetcher) = repository(sink.clone());

        repo.update(&never_cancel()).unwrap();
        fetcher.fail.store(true, Ordering::SeqCst);

        let count = repo.update(&never_cancel()).unwrap();
        assert_eq!(count, 2);
        assert_eq!(repo.runtimes().len(), 2);

        assert!(sink
            .events()
            .iter()
            .any(|e| matches!(e, PerkEvent::RepositoryUpdateFailed { .. })));
    }

    #[test]
    fn test_failed_update_without_baseline_propagates() {
        let sink = Arc::new(CollectorSink::default());
        let (repo, fetcher) = repository(sink);
        fetcher.fail.store(true, Ordering::SeqCst);

        let err = repo.update(&never_cancel()).unwrap_err();
        assert!(matches!(err, ProviderError::Update { .. }));
        assert!(repo.runtimes().is_empty());
    }
}
