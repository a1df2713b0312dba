use std::path::PathBuf;

use chrono::{DateTime, Utc};
use perk_core::{RuntimeDescription, RuntimeRecord};

/// One locally held runtime and its current state, as seen by a search.
///
/// The timestamps come from the persisted [`RuntimeRecord`]; whether the
/// archive and unpack directory actually exist is checked against the
/// filesystem when the view is built.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryRecord {
    pub description: RuntimeDescription,
    /// Whether the archive file is present in the archive area.
    pub archive_present: bool,
    /// When the runtime was first recorded.
    pub added_at: DateTime<Utc>,
    /// When the archive last passed verification.
    pub verified_at: Option<DateTime<Utc>>,
    /// Where the archive was unpacked, if the directory still exists.
    pub unpacked_path: Option<PathBuf>,
}

impl InventoryRecord {
    pub(crate) fn new(record: &RuntimeRecord, archive_present: bool) -> Self {
        Self {
            description: record.description.clone(),
            archive_present,
            added_at: record.added_at,
            verified_at: record.verified_at,
            unpacked_path: record
                .unpacked_path
                .clone()
                .filter(|path| path.is_dir()),
        }
    }

    pub fn id(&self) -> String {
        self.description.id()
    }
}
