//! Runtime record database.
//!
//! One file per record in a flat directory, named by the record's archive
//! identity. Writes are atomic (write-then-rename) and corruption is
//! isolated per record: a file that fails to parse is skipped on open, it
//! never fails the store as a whole.

pub mod error;

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use perk_core::{JsonRecordCodec, RecordCodec, RuntimeRecord};
use perk_utils::fs::{atomic_write, ensure_dir_exists, safe_remove};
use tracing::{debug, warn};

pub use error::DatabaseError;

const RECORD_EXTENSION: &str = "json";

/// Read-only snapshot of the database contents, keyed by identity.
pub type Snapshot = Arc<HashMap<String, RuntimeRecord>>;

/// Persisted store of runtime records.
///
/// The in-memory snapshot is read-copy-update: readers hold an `Arc` to an
/// immutable map and never observe a partially-applied mutation.
pub struct RecordDatabase {
    directory: PathBuf,
    codec: Arc<dyn RecordCodec>,
    snapshot: RwLock<Snapshot>,
}

impl RecordDatabase {
    /// Opens the database at `directory` with the built-in JSON codec.
    pub fn open<P: AsRef<Path>>(directory: P) -> Result<Self, DatabaseError> {
        Self::open_with_codec(directory, Arc::new(JsonRecordCodec))
    }

    /// Opens the database with an explicitly negotiated codec.
    ///
    /// Creates `directory` if it does not exist. Every readable record is
    /// loaded; files that fail to read or parse are logged and skipped.
    pub fn open_with_codec<P: AsRef<Path>>(
        directory: P,
        codec: Arc<dyn RecordCodec>,
    ) -> Result<Self, DatabaseError> {
        let directory = directory.as_ref().to_path_buf();
        ensure_dir_exists(&directory)?;

        let mut records = HashMap::new();
        let entries = fs::read_dir(&directory).map_err(|source| DatabaseError::Io {
            path: directory.clone(),
            action: "read directory",
            source,
        })?;

        for entry in entries {
            let entry = entry.map_err(|source| DatabaseError::Io {
                path: directory.clone(),
                action: "read directory entry in",
                source,
            })?;
            let path = entry.path();

            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }

            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable record");
                    continue;
                }
            };

            match codec.parse(&bytes) {
                Ok(record) => {
                    records.insert(record.id(), record);
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping malformed record");
                }
            }
        }

        debug!(
            directory = %directory.display(),
            records = records.len(),
            "opened record database"
        );

        Ok(Self {
            directory,
            codec,
            snapshot: RwLock::new(Arc::new(records)),
        })
    }

    /// Current snapshot mapping identity to record.
    pub fn records(&self) -> Snapshot {
        self.snapshot.read().unwrap().clone()
    }

    pub fn get(&self, id: &str) -> Option<RuntimeRecord> {
        self.snapshot.read().unwrap().get(id).cloned()
    }

    /// Persists a record, replacing any previous one with the same
    /// identity. The file is written atomically.
    pub fn add(&self, record: &RuntimeRecord) -> Result<(), DatabaseError> {
        let bytes = self.codec.serialize(record)?;
        atomic_write(self.record_path(&record.id()), &bytes)?;

        let mut guard = self.snapshot.write().unwrap();
        let mut next = (**guard).clone();
        next.insert(record.id(), record.clone());
        *guard = Arc::new(next);

        Ok(())
    }

    /// Removes the record for `id`.
    ///
    /// The file path is derived from the identity string, so a record whose
    /// file failed to parse (and is therefore absent from the snapshot) is
    /// still purged. Deleting an unknown identity is not an error.
    pub fn delete(&self, id: &str) -> Result<(), DatabaseError> {
        safe_remove(self.record_path(id))?;

        let mut guard = self.snapshot.write().unwrap();
        if guard.contains_key(id) {
            let mut next = (**guard).clone();
            next.remove(id);
            *guard = Arc::new(next);
        }

        Ok(())
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    // `<algorithm>:<digest>` maps to `<algorithm>-<digest>.json`.
    fn record_path(&self, id: &str) -> PathBuf {
        let stem = id.replacen(':', "-", 1);
        self.directory.join(format!("{stem}.{RECORD_EXTENSION}"))
    }
}
