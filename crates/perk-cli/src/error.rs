use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum CliError {
    #[error("Failed to read configuration at {path}")]
    #[diagnostic(code(perk_cli::config_read))]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration at {path}")]
    #[diagnostic(
        code(perk_cli::config_parse),
        help("Run `perk def-config` to generate a valid starting point")
    )]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write configuration at {path}: {cause}")]
    #[diagnostic(code(perk_cli::config_write))]
    ConfigWrite { path: PathBuf, cause: String },

    #[error("Configuration already exists at {path}")]
    #[diagnostic(
        code(perk_cli::config_exists),
        help("Remove the file first if you want to regenerate it")
    )]
    ConfigExists { path: PathBuf },

    #[error("Invalid proxy `{proxy}`: {cause}")]
    #[diagnostic(
        code(perk_cli::invalid_proxy),
        help("Proxy URIs look like `socks5://localhost:9050` or `http://proxy:8080`")
    )]
    InvalidProxy { proxy: String, cause: String },

    #[error("Invalid repository URI `{uri}`")]
    #[diagnostic(code(perk_cli::invalid_uri))]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] perk_core::CoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Client(#[from] perk_client::ClientError),
}
