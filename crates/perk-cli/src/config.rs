use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::{LazyLock, RwLock},
};

use perk_utils::fs::atomic_write;
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use crate::error::CliError;

pub static CONFIG_PATH: LazyLock<RwLock<PathBuf>> = LazyLock::new(|| {
    RwLock::new(match env::var("PERK_CONFIG") {
        Ok(path) => PathBuf::from(path),
        Err(_) => default_config_path(),
    })
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root directory holding the inventory and provider caches.
    pub root: PathBuf,

    /// Repositories to poll, each serving a JSON index document.
    #[serde(default, rename = "repository")]
    pub repositories: Vec<RepositoryConfig>,

    /// Settings applied to the shared HTTP agent.
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Proxy URI, e.g. `socks5://localhost:9050`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub name: String,
    /// Index document location, `https://` or `file://`.
    pub index: Url,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: default_root(),
            repositories: Vec::new(),
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    pub fn save(&self, path: &Path) -> Result<(), CliError> {
        let serialized = toml::to_string_pretty(self).map_err(|err| CliError::ConfigWrite {
            path: path.to_path_buf(),
            cause: err.to_string(),
        })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| CliError::ConfigRead {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        atomic_write(path, serialized.as_bytes()).map_err(|err| CliError::ConfigWrite {
            path: path.to_path_buf(),
            cause: err.to_string(),
        })
    }
}

/// Loads the configuration, falling back to defaults when no file exists.
pub fn load(path: &Path) -> Result<Config, CliError> {
    match fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).map_err(|source| CliError::ConfigParse {
            path: path.to_path_buf(),
            source,
        }),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(source) => Err(CliError::ConfigRead {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes a default configuration file, refusing to overwrite one.
pub fn generate_default_config() -> Result<(), CliError> {
    let path = CONFIG_PATH.read().unwrap().to_path_buf();
    if path.exists() {
        return Err(CliError::ConfigExists { path });
    }

    Config::default().save(&path)?;
    info!("Default configuration written to {}", path.display());
    Ok(())
}

fn home() -> PathBuf {
    env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_config_path() -> PathBuf {
    env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| home().join(".config"))
        .join("perk")
        .join("config.toml")
}

pub fn default_root() -> PathBuf {
    env::var_os("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| home().join(".local").join("share"))
        .join("perk")
}
