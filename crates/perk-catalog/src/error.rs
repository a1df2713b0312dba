use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum CatalogError {
    #[error("No runtime with identity `{0}` in the catalog")]
    #[diagnostic(
        code(perk_catalog::unknown_identity),
        help("Update the catalog and check the identity string")
    )]
    UnknownIdentity(String),

    #[error("Hash mismatch for `{id}`: expected {expected}, computed {actual}")]
    #[diagnostic(
        code(perk_catalog::hash_mismatch),
        help("The upstream archive does not match its declared digest; the download was discarded")
    )]
    HashMismatch {
        id: String,
        expected: String,
        actual: String,
    },

    #[error("Download of `{id}` failed: {cause}")]
    #[diagnostic(code(perk_catalog::download_failed))]
    DownloadFailed { id: String, cause: String },

    #[error("No repository registered for `{0}`")]
    #[diagnostic(
        code(perk_catalog::no_repository),
        help("List repositories to see the registered URIs")
    )]
    NoRepository(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Provider(#[from] perk_provider::ProviderError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Download(#[from] perk_dl::DownloadError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Inventory(#[from] perk_inventory::InventoryError),

    #[error("Background task failed: {0}")]
    #[diagnostic(code(perk_catalog::background))]
    Background(String),
}
