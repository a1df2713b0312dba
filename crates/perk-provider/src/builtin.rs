//! Built-in providers.
//!
//! `StaticProvider` serves a fixed description list and is the smallest
//! possible provider, used by tests and embedders that already hold
//! descriptions. `JsonIndexProvider` polls a JSON index document listing
//! runtime descriptions, which covers plain HTTP(S) mirrors and `file://`
//! mirrors for air-gapped setups.

use std::fs;

use perk_core::RuntimeDescription;
use perk_dl::Http;
use perk_events::EventSinkHandle;
use url::Url;

use crate::{
    context::ProviderContext,
    error::ProviderError,
    provider::RuntimeProvider,
    repository::{CancelCheck, FetchProgress, Repository, RuntimeFetcher},
};

/// Provider serving a fixed, in-memory description list.
pub struct StaticProvider {
    uri: Url,
    name: String,
    descriptions: Vec<RuntimeDescription>,
}

impl StaticProvider {
    pub fn new(uri: Url, name: impl Into<String>, descriptions: Vec<RuntimeDescription>) -> Self {
        Self {
            uri,
            name: name.into(),
            descriptions,
        }
    }
}

impl RuntimeProvider for StaticProvider {
    fn uri(&self) -> &Url {
        &self.uri
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn open(
        &self,
        context: &ProviderContext,
        sink: EventSinkHandle,
    ) -> Result<Repository, ProviderError> {
        context.cache_dir(self.uri.as_str(), &self.name)?;

        struct StaticFetcher {
            descriptions: Vec<RuntimeDescription>,
        }

        impl RuntimeFetcher for StaticFetcher {
            fn fetch(
                &self,
                _should_cancel: CancelCheck,
                progress: FetchProgress,
            ) -> Result<Vec<RuntimeDescription>, ProviderError> {
                let total = self.descriptions.len() as u64;
                progress(total, total);
                Ok(self.descriptions.clone())
            }
        }

        Ok(Repository::new(
            self.uri.clone(),
            self.name.clone(),
            Box::new(StaticFetcher {
                descriptions: self.descriptions.clone(),
            }),
            sink,
        ))
    }
}

/// Provider polling a JSON index document.
///
/// The index is a JSON array of runtime description records in the built-in
/// record format.
pub struct JsonIndexProvider {
    index_url: Url,
    name: String,
}

impl JsonIndexProvider {
    pub fn new(index_url: Url, name: impl Into<String>) -> Self {
        Self {
            index_url,
            name: name.into(),
        }
    }
}

impl RuntimeProvider for JsonIndexProvider {
    fn uri(&self) -> &Url {
        &self.index_url
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn open(
        &self,
        context: &ProviderContext,
        sink: EventSinkHandle,
    ) -> Result<Repository, ProviderError> {
        context.cache_dir(self.index_url.as_str(), &self.name)?;

        struct IndexFetcher {
            index_url: Url,
        }

        impl RuntimeFetcher for IndexFetcher {
            fn fetch(
                &self,
                should_cancel: CancelCheck,
                progress: FetchProgress,
            ) -> Result<Vec<RuntimeDescription>, ProviderError> {
                let uri = self.index_url.to_string();

                if should_cancel() {
                    return Err(ProviderError::Update {
                        uri,
                        source: perk_dl::DownloadError::Cancelled,
                    });
                }

                let descriptions: Vec<RuntimeDescription> =
                    if self.index_url.scheme() == "file" {
                        let path = self.index_url.path();
                        let bytes = fs::read(path).map_err(|source| ProviderError::Update {
                            uri: uri.clone(),
                            source: perk_dl::DownloadError::Io(source),
                        })?;
                        serde_json::from_slice(&bytes).map_err(|source| {
                            ProviderError::InvalidIndex {
                                uri: uri.clone(),
                                source,
                            }
                        })?
                    } else {
                        Http::json(self.index_url.as_str()).map_err(|source| {
                            ProviderError::Update {
                                uri: uri.clone(),
                                source,
                            }
                        })?
                    };

                if should_cancel() {
                    return Err(ProviderError::Update {
                        uri,
                        source: perk_dl::DownloadError::Cancelled,
                    });
                }

                let total = descriptions.len() as u64;
                progress(total, total);
                Ok(descriptions)
            }
        }

        Ok(Repository::new(
            self.index_url.clone(),
            self.name.clone(),
            Box::new(IndexFetcher {
                index_url: self.index_url.clone(),
            }),
            sink,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use perk_core::{ArchiveHash, HashAlgorithm, RuntimeConfiguration, RuntimeVersion};
    use perk_events::NullSink;
    use tempfile::tempdir;

    use super::*;
    use crate::repository::never_cancel;

    fn description(digest: &str) -> RuntimeDescription {
        RuntimeDescription {
            repository: Url::parse("urn:example:static").unwrap(),
            version: RuntimeVersion::parse("21").unwrap(),
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

    #[test]
    fn test_static_provider_serves_fixed_set() {
        let cache = tempdir().unwrap();
        let ctx = ProviderContext::new(cache.path());

        let provider = StaticProvider::new(
            Url::parse("urn:example:static").unwrap(),
            "static",
            vec![description("aa"), description("bb")],
        );

        let repo = provider.open(&ctx, Arc::new(NullSink)).unwrap();
        assert!(repo.runtimes().is_empty());

        repo.update(&never_cancel()).unwrap();
        assert_eq!(repo.runtimes().len(), 2);
    }

    #[test]
    fn test_json_index_provider_reads_file_index() {
        let cache = tempdir().unwrap();
        let index_dir = tempdir().unwrap();
        let index_path = index_dir.path().join("index.json");

        let listed = vec![description("aa"), description("bb"), description("cc")];
        fs::write(&index_path, serde_json::to_vec(&listed).unwrap()).unwrap();

        let ctx = ProviderContext::new(cache.path());
        let provider = JsonIndexProvider::new(
            Url::parse(&format!("file://{}", index_path.display())).unwrap(),
            "mirror",
        );

        let repo = provider.open(&ctx, Arc::new(NullSink)).unwrap();
        let count = repo.update(&never_cancel()).unwrap();
        assert_eq!(count, 3);
        assert_eq!(repo.runtimes().len(), 3);
    }

    #[test]
    fn test_json_index_provider_invalid_index() {
        let cache = tempdir().unwrap();
        let index_dir = tempdir().unwrap();
        let index_path = index_dir.path().join("index.json");
        fs::write(&index_path, b"{ not json ]").unwrap();

        let ctx = ProviderContext::new(cache.path());
        let provider = JsonIndexProvider::new(
            Url::parse(&format!("file://{}", index_path.display())).unwrap(),
            "mirror",
        );

        let repo = provider.open(&ctx, Arc::new(NullSink)).unwrap();
        let err = repo.update(&never_cancel()).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidIndex { .. }));
    }

    #[test]
    fn test_json_index_provider_cancellation() {
        let cache = tempdir().unwrap();
        let ctx = ProviderContext::new(cache.path());
        let provider = JsonIndexProvider::new(
            Url::parse("file:///nonexistent/index.json").unwrap(),
            "mirror",
        );

        let repo = provider.open(&ctx, Arc::new(NullSink)).unwrap();
        let err = repo.update(&(|| true)).unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Update {
                source: perk_dl::DownloadError::Cancelled,
                ..
            }
        ));
    }
}
