use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ClientError {
    #[error("Operation timed out after {0:?}")]
    #[diagnostic(
        code(perk_client::timeout),
        help("The operation was asked to cancel and its partial output will be discarded")
    )]
    Timeout(Duration),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Catalog(#[from] perk_catalog::CatalogError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Inventory(#[from] perk_inventory::InventoryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Provider(#[from] perk_provider::ProviderError),

    #[error("Background task failed: {0}")]
    #[diagnostic(code(perk_client::background))]
    Background(String),
}
