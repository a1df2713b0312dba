use std::path::{Path, PathBuf};

use perk_utils::fs::ensure_dir_exists;

use crate::error::ProviderError;

/// Context handed to a provider when its repository is opened.
///
/// Exposes a per-provider cache directory under a shared cache root.
pub struct ProviderContext {
    cache_root: PathBuf,
}

impl ProviderContext {
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
        }
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// Returns (and creates) the cache directory for the named provider.
    ///
    /// Fails when local cache state cannot be established, which providers
    /// surface as a repository open error.
    pub fn cache_dir(&self, provider_uri: &str, name: &str) -> Result<PathBuf, ProviderError> {
        let dir = self.cache_root.join(sanitize(name));
        ensure_dir_exists(&dir).map_err(|source| ProviderError::Open {
            uri: provider_uri.to_string(),
            source,
        })?;
        Ok(dir)
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
