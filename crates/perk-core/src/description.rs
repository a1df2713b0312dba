use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{error::CoreError, version::RuntimeVersion};

/// Digest algorithms accepted in upstream metadata.
///
/// JVM vendors publish SHA-256 digests; BLAKE3 is the local default when
/// perk re-hashes an archive itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashAlgorithm {
    Sha256,
    Blake3,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha-256",
            HashAlgorithm::Blake3 => "blake3",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            "blake3" => Ok(HashAlgorithm::Blake3),
            _ => Err(CoreError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Declared digest of a runtime archive.
///
/// The string form `<algorithm>:<digest>` is the canonical identity of the
/// runtime build: the deduplication key across repositories and the storage
/// key inside the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArchiveHash {
    pub algorithm: HashAlgorithm,
    pub digest: String,
}

impl ArchiveHash {
    pub fn new(algorithm: HashAlgorithm, digest: impl Into<String>) -> Self {
        Self {
            algorithm,
            digest: digest.into().to_ascii_lowercase(),
        }
    }

    /// Canonical identity string, e.g. `sha-256:19b935...`.
    pub fn identity(&self) -> String {
        format!("{}:{}", self.algorithm, self.digest.to_ascii_lowercase())
    }

    /// Filesystem-safe stem used to name record and archive files.
    pub fn file_stem(&self) -> String {
        format!("{}-{}", self.algorithm, self.digest.to_ascii_lowercase())
    }
}

impl fmt::Display for ArchiveHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identity())
    }
}

/// Whether a build ships the full development kit or just the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeConfiguration {
    Jdk,
    Jre,
}

impl fmt::Display for RuntimeConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeConfiguration::Jdk => f.write_str("jdk"),
            RuntimeConfiguration::Jre => f.write_str("jre"),
        }
    }
}

impl FromStr for RuntimeConfiguration {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jdk" => Ok(RuntimeConfiguration::Jdk),
            "jre" => Ok(RuntimeConfiguration::Jre),
            _ => Err(CoreError::InvalidConfiguration(s.to_string())),
        }
    }
}

/// Immutable description of one acquirable runtime build.
///
/// Constructed by a repository provider from upstream metadata at update
/// time and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeDescription {
    /// Origin URI of the repository that listed this build.
    pub repository: Url,
    pub version: RuntimeVersion,
    /// OS tag, e.g. `linux`.
    pub platform: String,
    /// CPU tag, e.g. `x86_64`.
    pub architecture: String,
    /// Implementation tag, e.g. `hotspot`.
    pub vm: String,
    pub configuration: RuntimeConfiguration,
    pub archive_uri: Url,
    pub archive_size: u64,
    pub archive_hash: ArchiveHash,
    /// Optional display name, e.g. a vendor build tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl RuntimeDescription {
    /// Stable identity used for deduplication and inventory storage.
    pub fn id(&self) -> String {
        self.archive_hash.identity()
    }
}
