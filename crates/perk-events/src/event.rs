use crate::OperationId;

/// All event types emitted by perk components.
///
/// The catalog, the repositories it polls, and the inventory all publish
/// into the same sink, so a single subscriber observes the whole pipeline.
#[derive(Debug, Clone)]
pub enum PerkEvent {
    /// A repository update has started.
    RepositoryUpdateStarted { repository: String },
    /// A repository reported progress while fetching its index.
    RepositoryUpdateProgress {
        repository: String,
        current: u64,
        total: u64,
    },
    /// A repository update finished; `count` is the refreshed description count.
    RepositoryUpdateCompleted { repository: String, count: usize },
    /// A repository update failed.
    RepositoryUpdateFailed { repository: String, cause: String },
    /// A provider was registered with the provider registry.
    ProviderRegistered { uri: String, name: String },
    /// A provider was removed from the provider registry.
    ProviderDeregistered { uri: String },
    /// A catalog-wide update batch finished.
    CatalogUpdateCompleted {
        updated: usize,
        failed: usize,
    },
    /// An archive download is starting.
    DownloadStarting {
        op_id: OperationId,
        id: String,
        total: u64,
    },
    /// Download progress update, emitted at chunk boundaries.
    DownloadProgress {
        op_id: OperationId,
        id: String,
        current: u64,
        total: u64,
    },
    /// Download completed and the archive passed hash verification.
    DownloadCompleted {
        op_id: OperationId,
        id: String,
        total: u64,
    },
    /// Download failed or was cancelled; the temporary file was discarded.
    DownloadFailed {
        op_id: OperationId,
        id: String,
        cause: String,
    },
    /// A verified runtime was recorded in the inventory.
    InventoryAdded { id: String },
    /// A runtime and its artifacts were removed from the inventory.
    InventoryDeleted { id: String },
    /// A stored archive was re-hashed and matched its declared digest.
    InventoryVerified { id: String },
    /// A stored archive was extracted.
    InventoryUnpacked { id: String, target: String },
    /// An inventory operation failed.
    InventoryFailed {
        id: String,
        op: InventoryOp,
        cause: String,
    },
}

/// Inventory operations named in failure events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryOp {
    Add,
    Delete,
    Verify,
    Unpack,
}

impl std::fmt::Display for InventoryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InventoryOp::Add => "add",
            InventoryOp::Delete => "delete",
            InventoryOp::Verify => "verify",
            InventoryOp::Unpack => "unpack",
        };
        f.write_str(name)
    }
}
