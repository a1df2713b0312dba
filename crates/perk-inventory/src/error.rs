use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum InventoryError {
    #[error("Inventory root conflicts with existing file at `{path}`")]
    #[diagnostic(
        code(perk_inventory::layout),
        help("Remove the conflicting file or choose a different root directory")
    )]
    Layout {
        path: PathBuf,
        #[source]
        source: perk_utils::error::FileSystemError,
    },

    #[error("Error while {action}")]
    #[diagnostic(
        code(perk_inventory::io),
        help("Check file permissions and disk space")
    )]
    Io {
        action: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Runtime `{0}` is not in the inventory")]
    #[diagnostic(
        code(perk_inventory::not_found),
        help("Run a catalog search and download the runtime first")
    )]
    NotFound(String),

    #[error("Archive for `{0}` is missing from the archive area")]
    #[diagnostic(
        code(perk_inventory::archive_missing),
        help("Delete the record and download the runtime again")
    )]
    ArchiveMissing(String),

    #[error("Verification failed for `{id}`: expected {expected}, computed {actual}")]
    #[diagnostic(
        code(perk_inventory::verification),
        help("The stored archive is corrupted or was tampered with")
    )]
    Verification {
        id: String,
        expected: String,
        actual: String,
    },

    #[error("Unpack of `{0}` was cancelled")]
    #[diagnostic(code(perk_inventory::cancelled))]
    Cancelled(String),

    #[error("Failed to unpack `{id}`")]
    #[diagnostic(code(perk_inventory::unpack))]
    Unpack {
        id: String,
        #[source]
        source: compak::error::ArchiveError,
    },

    #[error(transparent)]
    #[diagnostic(code(perk_inventory::hash))]
    Hash(#[from] perk_utils::error::HashError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] perk_db::DatabaseError),

    #[error(transparent)]
    #[diagnostic(code(perk_inventory::filesystem))]
    FileSystem(#[from] perk_utils::error::FileSystemError),

    #[error("Background task failed: {0}")]
    #[diagnostic(code(perk_inventory::background))]
    Background(String),
}

/// Trait for adding context to IO errors.
pub trait ErrorContext<T> {
    fn with_context<C>(self, context: C) -> Result<T, InventoryError>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> Result<T, InventoryError>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| InventoryError::Io {
            action: context(),
            source: err,
        })
    }
}
