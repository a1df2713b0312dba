use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ProviderError {
    #[error("Failed to open repository `{uri}`")]
    #[diagnostic(
        code(perk_provider::open),
        help("Check that the provider cache directory is writable")
    )]
    Open {
        uri: String,
        #[source]
        source: perk_utils::error::FileSystemError,
    },

    #[error("Failed to update repository `{uri}`")]
    #[diagnostic(
        code(perk_provider::update),
        help("Check your internet connection and the repository URL")
    )]
    Update {
        uri: String,
        #[source]
        source: perk_dl::DownloadError,
    },

    #[error("Repository `{uri}` returned an invalid index")]
    #[diagnostic(code(perk_provider::invalid_index))]
    InvalidIndex {
        uri: String,
        #[source]
        source: serde_json::Error,
    },
}
