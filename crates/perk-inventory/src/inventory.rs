use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::Utc;
use perk_core::{RuntimeDescription, RuntimeRecord, SearchCriteria};
use perk_db::RecordDatabase;
use perk_events::{EventSinkHandle, InventoryOp, PerkEvent};
use perk_utils::{
    fs::{ensure_dir_exists, safe_remove},
    hash::hash_file,
};
use tracing::{debug, info, warn};

use crate::{
    error::{ErrorContext as _, InventoryError},
    locks::IdentityLocks,
    record::InventoryRecord,
};

const DATABASE_DIR: &str = "inventory";
const ARCHIVE_DIR: &str = "archives";
const UNPACK_DIR: &str = "runtimes";

/// Compound archive suffixes that must be kept whole; anything else falls
/// back to the plain extension.
const COMPOUND_SUFFIXES: &[&str] = &["tar.gz", "tar.xz", "tar.bz2", "tar.zst"];

/// Local persisted store of acquired runtimes.
///
/// Owns a record database at `<root>/inventory`, an archive area at
/// `<root>/archives` and an unpack area at `<root>/runtimes`. Verification
/// and unpack timestamps are persisted with each record, so they survive a
/// reopen. Every mutating operation is serialized per identity; operations
/// on distinct identities run in parallel.
pub struct Inventory {
    root: PathBuf,
    db: RecordDatabase,
    sink: EventSinkHandle,
    locks: IdentityLocks,
}

impl std::fmt::Debug for Inventory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inventory")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl Inventory {
    /// Opens (or initializes) an inventory rooted at `root`.
    ///
    /// Fails when any of the required subdirectories is already occupied by
    /// a plain file; the inventory never silently coexists with a foreign
    /// file layout.
    pub fn open(sink: EventSinkHandle, root: impl Into<PathBuf>) -> Result<Self, InventoryError> {
        let root = root.into();

        for dir in [DATABASE_DIR, ARCHIVE_DIR, UNPACK_DIR] {
            let path = root.join(dir);
            ensure_dir_exists(&path).map_err(|source| InventoryError::Layout {
                path: path.clone(),
                source,
            })?;
        }

        let db = RecordDatabase::open(root.join(DATABASE_DIR))?;

        debug!(
            root = %root.display(),
            records = db.records().len(),
            "opened inventory"
        );

        Ok(Self {
            root,
            db,
            sink,
            locks: IdentityLocks::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Records matching `criteria`; empty criteria matches everything.
    pub async fn search(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<Vec<InventoryRecord>, InventoryError> {
        let snapshot = self.db.records();

        let mut records: Vec<InventoryRecord> = snapshot
            .values()
            .filter(|record| criteria.matches(&record.description))
            .map(|record| {
                let present = self.archive_path(&record.description).is_file();
                InventoryRecord::new(record, present)
            })
            .collect();

        records.sort_by(|a, b| {
            a.description
                .version
                .cmp(&b.description.version)
                .then_with(|| a.description.id().cmp(&b.description.id()))
        });

        Ok(records)
    }

    /// Hashes, verifies, and records a downloaded archive.
    ///
    /// The archive file at `archive` is re-hashed against the description's
    /// declared digest before anything is persisted; on success it is moved
    /// into the archive area and the record is written with its
    /// verification timestamp.
    pub async fn add(
        &self,
        description: RuntimeDescription,
        archive: PathBuf,
    ) -> Result<(), InventoryError> {
        let id = description.id();
        let _guard = self.locks.acquire(&id).await;

        let result = self.add_inner(&description, &archive).await;
        match result {
            Ok(()) => {
                info!(id = %id, "runtime added to inventory");
                self.sink.emit(PerkEvent::InventoryAdded { id });
                Ok(())
            }
            Err(err) => Err(self.fail(&id, InventoryOp::Add, err)),
        }
    }

    async fn add_inner(
        &self,
        description: &RuntimeDescription,
        archive: &Path,
    ) -> Result<(), InventoryError> {
        let actual = self.hash_in_background(description, archive.to_path_buf()).await?;
        let expected = &description.archive_hash.digest;

        if !actual.eq_ignore_ascii_case(expected) {
            return Err(InventoryError::Verification {
                id: description.id(),
                expected: expected.clone(),
                actual,
            });
        }

        let destination = self.archive_path(description);
        move_file(archive, &destination)?;

        let mut record = RuntimeRecord::new(description.clone());
        record.verified_at = Some(Utc::now());
        self.db.add(&record)?;

        Ok(())
    }

    /// Removes a runtime, its archive, and its unpacked directory.
    ///
    /// Deletion is idempotent: an unknown identity succeeds without error.
    /// An identity whose record file is corrupt (and therefore absent from
    /// the snapshot) is still purged, with the artifact paths derived from
    /// the identity itself.
    pub async fn delete(&self, id: &str) -> Result<(), InventoryError> {
        let _guard = self.locks.acquire(id).await;

        let result = self.delete_inner(id);
        match result {
            Ok(()) => {
                self.sink.emit(PerkEvent::InventoryDeleted {
                    id: id.to_string(),
                });
                Ok(())
            }
            Err(err) => Err(self.fail(id, InventoryOp::Delete, err)),
        }
    }

    fn delete_inner(&self, id: &str) -> Result<(), InventoryError> {
        match self.db.get(id) {
            Some(record) => {
                safe_remove(self.archive_path(&record.description))?;
                safe_remove(self.default_unpack_dir(&record.description))?;
                if let Some(path) = record.unpacked_path {
                    safe_remove(path)?;
                }
            }
            None => self.remove_stranded_artifacts(id)?,
        }

        self.db.delete(id)?;
        info!(id = %id, "runtime deleted from inventory");
        Ok(())
    }

    /// Removes artifacts whose record cannot be parsed, matching archive
    /// files by the identity-derived stem.
    fn remove_stranded_artifacts(&self, id: &str) -> Result<(), InventoryError> {
        let stem = id.replacen(':', "-", 1);
        safe_remove(self.root.join(UNPACK_DIR).join(&stem))?;

        let Ok(entries) = fs::read_dir(self.root.join(ARCHIVE_DIR)) else {
            return Ok(());
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let matches = name == stem
                || name
                    .strip_prefix(stem.as_str())
                    .is_some_and(|rest| rest.starts_with('.'));
            if matches {
                safe_remove(entry.path())?;
            }
        }
        Ok(())
    }

    /// Recomputes the stored archive's hash against the declared digest and
    /// persists the new verification timestamp.
    pub async fn verify(&self, id: &str) -> Result<(), InventoryError> {
        let _guard = self.locks.acquire(id).await;

        let result = self.verify_inner(id).await;
        match result {
            Ok(()) => {
                self.sink.emit(PerkEvent::InventoryVerified {
                    id: id.to_string(),
                });
                Ok(())
            }
            Err(err) => Err(self.fail(id, InventoryOp::Verify, err)),
        }
    }

    async fn verify_inner(&self, id: &str) -> Result<(), InventoryError> {
        let mut record = self
            .db
            .get(id)
            .ok_or_else(|| InventoryError::NotFound(id.to_string()))?;

        let archive = self.archive_path(&record.description);
        if !archive.is_file() {
            return Err(InventoryError::ArchiveMissing(id.to_string()));
        }

        let actual = self.hash_in_background(&record.description, archive).await?;
        let expected = &record.description.archive_hash.digest;

        if !actual.eq_ignore_ascii_case(expected) {
            return Err(InventoryError::Verification {
                id: id.to_string(),
                expected: expected.clone(),
                actual,
            });
        }

        record.verified_at = Some(Utc::now());
        self.db.add(&record)?;
        Ok(())
    }

    /// Local archive path for a known identity.
    pub fn path_of(&self, id: &str) -> Result<PathBuf, InventoryError> {
        let record = self
            .db
            .get(id)
            .ok_or_else(|| InventoryError::NotFound(id.to_string()))?;

        let path = self.archive_path(&record.description);
        if path.is_file() {
            Ok(path)
        } else {
            Err(InventoryError::ArchiveMissing(id.to_string()))
        }
    }

    /// Extracts a stored archive.
    ///
    /// The archive is re-hashed just before extraction; a mismatch aborts
    /// the unpack. Cancellation is consulted before the re-hash and again
    /// before extraction starts. With no explicit `target` the default
    /// unpack area `<root>/runtimes/<identity>` is used.
    pub async fn unpack(
        &self,
        id: &str,
        target: Option<PathBuf>,
        should_cancel: &(dyn Fn() -> bool + Send + Sync),
    ) -> Result<PathBuf, InventoryError> {
        let _guard = self.locks.acquire(id).await;

        let result = self.unpack_inner(id, target, should_cancel).await;
        match result {
            Ok(path) => {
                self.sink.emit(PerkEvent::InventoryUnpacked {
                    id: id.to_string(),
                    target: path.display().to_string(),
                });
                Ok(path)
            }
            Err(err) => Err(self.fail(id, InventoryOp::Unpack, err)),
        }
    }

    async fn unpack_inner(
        &self,
        id: &str,
        target: Option<PathBuf>,
        should_cancel: &(dyn Fn() -> bool + Send + Sync),
    ) -> Result<PathBuf, InventoryError> {
        let mut record = self
            .db
            .get(id)
            .ok_or_else(|| InventoryError::NotFound(id.to_string()))?;

        let archive = self.archive_path(&record.description);
        if !archive.is_file() {
            return Err(InventoryError::ArchiveMissing(id.to_string()));
        }

        if should_cancel() {
            return Err(InventoryError::Cancelled(id.to_string()));
        }

        let actual = self
            .hash_in_background(&record.description, archive.clone())
            .await?;
        if !actual.eq_ignore_ascii_case(&record.description.archive_hash.digest) {
            return Err(InventoryError::Verification {
                id: id.to_string(),
                expected: record.description.archive_hash.digest.clone(),
                actual,
            });
        }

        if should_cancel() {
            return Err(InventoryError::Cancelled(id.to_string()));
        }

        let target = target.unwrap_or_else(|| self.default_unpack_dir(&record.description));
        ensure_dir_exists(&target)?;

        let task_id = id.to_string();
        let task_target = target.clone();
        tokio::task::spawn_blocking(move || {
            compak::extract_archive(&archive, &task_target).map_err(|source| {
                InventoryError::Unpack {
                    id: task_id,
                    source,
                }
            })
        })
        .await
        .map_err(|err| InventoryError::Background(err.to_string()))??;

        record.unpacked_path = Some(target.clone());
        self.db.add(&record)?;

        info!(id = %id, target = %target.display(), "runtime unpacked");
        Ok(target)
    }

    async fn hash_in_background(
        &self,
        description: &RuntimeDescription,
        archive: PathBuf,
    ) -> Result<String, InventoryError> {
        let algorithm = description.archive_hash.algorithm.as_str();
        tokio::task::spawn_blocking(move || hash_file(algorithm, &archive))
            .await
            .map_err(|err| InventoryError::Background(err.to_string()))?
            .map_err(InventoryError::from)
    }

    fn fail(&self, id: &str, op: InventoryOp, err: InventoryError) -> InventoryError {
        warn!(id = %id, op = %op, error = %err, "inventory operation failed");
        self.sink.emit(PerkEvent::InventoryFailed {
            id: id.to_string(),
            op,
            cause: err.to_string(),
        });
        err
    }

    fn archive_path(&self, description: &RuntimeDescription) -> PathBuf {
        self.root
            .join(ARCHIVE_DIR)
            .join(archive_file_name(description))
    }

    fn default_unpack_dir(&self, description: &RuntimeDescription) -> PathBuf {
        self.root
            .join(UNPACK_DIR)
            .join(description.archive_hash.file_stem())
    }
}

/// Archive files keep the upstream filename's suffix so format detection
/// during unpack keeps working. Compound suffixes like `.tar.gz` are
/// matched whole; a dotted version in the filename must not bleed into the
/// stored name.
fn archive_file_name(description: &RuntimeDescription) -> String {
    let stem = description.archive_hash.file_stem();
    let name = description
        .archive_uri
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");

    let lowered = name.to_ascii_lowercase();
    for suffix in COMPOUND_SUFFIXES {
        if lowered.len() > suffix.len() + 1 && lowered.ends_with(&format!(".{suffix}")) {
            return format!("{stem}.{suffix}");
        }
    }

    match Path::new(name).extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!("{stem}.{}", ext.to_ascii_lowercase()),
        None => stem,
    }
}

/// Moves a file, falling back to copy-and-remove across filesystems.
fn move_file(from: &Path, to: &Path) -> Result<(), InventoryError> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }

    fs::copy(from, to)
        .with_context(|| format!("copying archive to `{}`", to.display()))?;
    fs::remove_file(from)
        .with_context(|| format!("removing staged archive `{}`", from.display()))
}
