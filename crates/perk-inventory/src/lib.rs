//! Local runtime inventory.
//!
//! The inventory owns a record database plus the archive files and
//! unpacked directories it describes, and emits an event for every
//! mutation. See [`Inventory`].

pub mod error;
mod inventory;
mod locks;
mod record;

pub use error::InventoryError;
pub use inventory::Inventory;
pub use locks::IdentityLocks;
pub use record::InventoryRecord;

#[cfg(test)]
mod tests {
    use std::{fs, path::Path, sync::Arc};

    use perk_core::{
        ArchiveHash, HashAlgorithm, RuntimeConfiguration, RuntimeDescription, RuntimeVersion,
        SearchCriteria,
    };
    use perk_events::{CollectorSink, EventSinkHandle, NullSink, PerkEvent};
    use perk_utils::hash::hash_file;
    use tempfile::tempdir;
    use url::Url;

    use super::*;

    /// Stages an archive file and a description whose digest matches it.
    fn staged_runtime(dir: &Path, name: &str, contents: &[u8]) -> (RuntimeDescription, std::path::PathBuf) {
        let archive = dir.join(format!("{name}.tar.gz"));
        fs::write(&archive, contents).unwrap();
        let digest = hash_file("blake3", &archive).unwrap();

        let description = RuntimeDescription {
            repository: Url::parse("urn:example:test").unwrap(),
            version: RuntimeVersion::parse("17.0.2").unwrap(),
            platform: "linux".to_string(),
            architecture: "x86_64".to_string(),
            vm: "hotspot".to_string(),
            configuration: RuntimeConfiguration::Jdk,
            archive_uri: Url::parse(&format!("https://example.com/{name}.tar.gz")).unwrap(),
            archive_size: contents.len() as u64,
            archive_hash: ArchiveHash::new(HashAlgorithm::Blake3, digest),
            tag: None,
        };

        (description, archive)
    }

    fn open(root: &Path) -> Inventory {
        Inventory::open(Arc::new(NullSink), root).unwrap()
    }

    #[tokio::test]
    async fn test_empty_root_yields_empty_inventory() {
        let root = tempdir().unwrap();
        let inventory = open(root.path());

        let records = inventory.search(&SearchCriteria::any()).await.unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_open_fails_on_file_at_inventory_path() {
        let root = tempdir().unwrap();
        fs::write(root.path().join("inventory"), "occupied").unwrap();

        let err = Inventory::open(Arc::new(NullSink) as EventSinkHandle, root.path()).unwrap_err();
        assert!(matches!(err, InventoryError::Layout { .. }));
    }

    #[tokio::test]
    async fn test_add_records_and_search_finds_runtime() {
        let root = tempdir().unwrap();
        let staging = tempdir().unwrap();
        let inventory = open(root.path());
        let (description, archive) = staged_runtime(staging.path(), "jdk17", b"jdk bytes");

        inventory.add(description.clone(), archive.clone()).await.unwrap();

        // The staged file was moved into the archive area.
        assert!(!archive.exists());

        let records = inventory.search(&SearchCriteria::any()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description, description);
        assert!(records[0].archive_present);
        assert!(records[0].verified_at.is_some());
    }

    #[tokio::test]
    async fn test_add_rejects_mismatched_archive() {
        let root = tempdir().unwrap();
        let staging = tempdir().unwrap();
        let sink = Arc::new(CollectorSink::default());
        let inventory = Inventory::open(sink.clone() as EventSinkHandle, root.path()).unwrap();

        let (mut description, archive) = staged_runtime(staging.path(), "jdk17", b"jdk bytes");
        description.archive_hash = ArchiveHash::new(HashAlgorithm::Blake3, "00ff00ff");

        let err = inventory.add(description, archive).await.unwrap_err();
        assert!(matches!(err, InventoryError::Verification { .. }));

        assert!(inventory.search(&SearchCriteria::any()).await.unwrap().is_empty());
        assert!(sink
            .events()
            .iter()
            .any(|e| matches!(e, PerkEvent::InventoryFailed { .. })));
    }

    #[tokio::test]
    async fn test_verify_fails_after_single_byte_corruption() {
        let root = tempdir().unwrap();
        let staging = tempdir().unwrap();
        let inventory = open(root.path());
        let (description, archive) = staged_runtime(staging.path(), "jdk17", b"pristine bytes");
        let id = description.id();

        inventory.add(description, archive).await.unwrap();
        inventory.verify(&id).await.unwrap();

        // Flip one byte of the stored archive.
        let stored = inventory.path_of(&id).unwrap();
        let mut bytes = fs::read(&stored).unwrap();
        bytes[0] ^= 0x01;
        fs::write(&stored, bytes).unwrap();

        let err = inventory.verify(&id).await.unwrap_err();
        assert!(matches!(err, InventoryError::Verification { .. }));
    }

    #[tokio::test]
    async fn test_verify_unknown_id() {
        let root = tempdir().unwrap();
        let inventory = open(root.path());

        let err = inventory.verify("blake3:unknown").await.unwrap_err();
        assert!(matches!(err, InventoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_verify_missing_archive() {
        let root = tempdir().unwrap();
        let staging = tempdir().unwrap();
        let inventory = open(root.path());
        let (description, archive) = staged_runtime(staging.path(), "jdk17", b"bytes");
        let id = description.id();

        inventory.add(description, archive).await.unwrap();
        fs::remove_file(inventory.path_of(&id).unwrap()).unwrap();

        let err = inventory.verify(&id).await.unwrap_err();
        assert!(matches!(err, InventoryError::ArchiveMissing(_)));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let root = tempdir().unwrap();
        let staging = tempdir().unwrap();
        let inventory = open(root.path());
        let (description, archive) = staged_runtime(staging.path(), "jdk17", b"bytes");

        inventory.add(description, archive).await.unwrap();
        assert_eq!(inventory.search(&SearchCriteria::any()).await.unwrap().len(), 1);

        inventory.delete("blake3:never-existed").await.unwrap();
        assert_eq!(inventory.search(&SearchCriteria::any()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_artifacts() {
        let root = tempdir().unwrap();
        let staging = tempdir().unwrap();
        let inventory = open(root.path());
        let (description, archive) = staged_runtime(staging.path(), "jdk17", b"bytes");
        let id = description.id();

        inventory.add(description, archive).await.unwrap();
        let stored = inventory.path_of(&id).unwrap();

        inventory.delete(&id).await.unwrap();
        assert!(!stored.exists());
        assert!(inventory.search(&SearchCriteria::any()).await.unwrap().is_empty());
        assert!(matches!(
            inventory.path_of(&id),
            Err(InventoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_path_of_unknown_id() {
        let root = tempdir().unwrap();
        let inventory = open(root.path());
        assert!(matches!(
            inventory.path_of("blake3:unknown"),
            Err(InventoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unpack_unknown_id() {
        let root = tempdir().unwrap();
        let inventory = open(root.path());

        let err = inventory
            .unpack("blake3:unknown", None, &|| false)
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unpack_honors_cancellation_before_extraction() {
        let root = tempdir().unwrap();
        let staging = tempdir().unwrap();
        let inventory = open(root.path());
        let (description, archive) = staged_runtime(staging.path(), "jdk17", b"bytes");
        let id = description.id();

        inventory.add(description, archive).await.unwrap();

        let err = inventory.unpack(&id, None, &|| true).await.unwrap_err();
        assert!(matches!(err, InventoryError::Cancelled(_)));

        // Nothing was extracted into the default unpack area.
        let unpack_dir = root.path().join("runtimes").join(id.replacen(':', "-", 1));
        assert!(!unpack_dir.exists());
    }

    #[tokio::test]
    async fn test_unpack_rejects_corrupted_archive_before_extraction() {
        let root = tempdir().unwrap();
        let staging = tempdir().unwrap();
        let inventory = open(root.path());
        let (description, archive) = staged_runtime(staging.path(), "jdk17", b"bytes");
        let id = description.id();

        inventory.add(description, archive).await.unwrap();

        let stored = inventory.path_of(&id).unwrap();
        fs::write(&stored, b"tampered").unwrap();

        let err = inventory.unpack(&id, None, &|| false).await.unwrap_err();
        assert!(matches!(err, InventoryError::Verification { .. }));
    }

    #[tokio::test]
    async fn test_search_filters_by_criteria() {
        let root = tempdir().unwrap();
        let staging = tempdir().unwrap();
        let inventory = open(root.path());

        let (linux, archive) = staged_runtime(staging.path(), "linux-jdk", b"linux build");
        inventory.add(linux, archive).await.unwrap();

        let (mut windows, archive) = staged_runtime(staging.path(), "windows-jdk", b"windows build");
        windows.platform = "windows".to_string();
        inventory.add(windows, archive).await.unwrap();

        let all = inventory.search(&SearchCriteria::any()).await.unwrap();
        assert_eq!(all.len(), 2);

        let linux_only = inventory
            .search(&SearchCriteria::any().platform("linux"))
            .await
            .unwrap();
        assert_eq!(linux_only.len(), 1);
        assert_eq!(linux_only[0].description.platform, "linux");
    }

    #[tokio::test]
    async fn test_reopen_preserves_records() {
        let root = tempdir().unwrap();
        let staging = tempdir().unwrap();
        let (description, archive) = staged_runtime(staging.path(), "jdk17", b"bytes");
        let id = description.id();

        {
            let inventory = open(root.path());
            inventory.add(description.clone(), archive).await.unwrap();
        }

        let inventory = open(root.path());
        let records = inventory.search(&SearchCriteria::any()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description, description);
        assert!(inventory.path_of(&id).is_ok());
    }

    #[tokio::test]
    async fn test_reopen_preserves_verification_state() {
        let root = tempdir().unwrap();
        let staging = tempdir().unwrap();
        let (description, archive) = staged_runtime(staging.path(), "jdk17", b"bytes");
        let id = description.id();

        let (added_at, verified_at) = {
            let inventory = open(root.path());
            inventory.add(description, archive).await.unwrap();
            inventory.verify(&id).await.unwrap();

            let records = inventory.search(&SearchCriteria::any()).await.unwrap();
            (records[0].added_at, records[0].verified_at)
        };
        assert!(verified_at.is_some());

        // The timestamps come back from disk, not from session state.
        let inventory = open(root.path());
        let records = inventory.search(&SearchCriteria::any()).await.unwrap();
        assert_eq!(records[0].added_at, added_at);
        assert_eq!(records[0].verified_at, verified_at);
    }

    #[tokio::test]
    async fn test_delete_purges_artifacts_of_corrupt_record() {
        let root = tempdir().unwrap();
        let staging = tempdir().unwrap();
        let (description, archive) = staged_runtime(staging.path(), "jdk17", b"bytes");
        let id = description.id();
        let stem = id.replacen(':', "-", 1);

        {
            let inventory = open(root.path());
            inventory.add(description, archive).await.unwrap();
        }

        let record_file = root.path().join("inventory").join(format!("{stem}.json"));
        fs::write(&record_file, b"\xff garbage").unwrap();

        // The corrupt record is invisible to search, but delete still
        // purges the file and the archive it strands.
        let inventory = open(root.path());
        assert!(inventory.search(&SearchCriteria::any()).await.unwrap().is_empty());

        inventory.delete(&id).await.unwrap();
        assert!(!record_file.exists());
        assert!(!root
            .path()
            .join("archives")
            .join(format!("{stem}.tar.gz"))
            .exists());
    }

    #[tokio::test]
    async fn test_archive_keeps_compound_suffix() {
        let root = tempdir().unwrap();
        let staging = tempdir().unwrap();
        let inventory = open(root.path());

        // A dotted version in the upstream filename must not bleed into
        // the stored archive name.
        let (description, archive) =
            staged_runtime(staging.path(), "jdk-17.0.2-linux", b"bytes");
        let id = description.id();
        let stem = description.archive_hash.file_stem();

        inventory.add(description, archive).await.unwrap();

        let stored = inventory.path_of(&id).unwrap();
        assert_eq!(
            stored.file_name().and_then(|n| n.to_str()),
            Some(format!("{stem}.tar.gz").as_str())
        );
    }

    #[tokio::test]
    async fn test_operations_on_distinct_ids_do_not_interfere() {
        let root = tempdir().unwrap();
        let staging = tempdir().unwrap();
        let inventory = Arc::new(open(root.path()));

        let (a, archive_a) = staged_runtime(staging.path(), "jdk-a", b"build a");
        let (b, archive_b) = staged_runtime(staging.path(), "jdk-b", b"build b");
        let (id_a, id_b) = (a.id(), b.id());
        assert_ne!(id_a, id_b);

        let add_a = {
            let inventory = inventory.clone();
            tokio::spawn(async move { inventory.add(a, archive_a).await })
        };
        let add_b = {
            let inventory = inventory.clone();
            tokio::spawn(async move { inventory.add(b, archive_b).await })
        };

        add_a.await.unwrap().unwrap();
        add_b.await.unwrap().unwrap();

        let records = inventory.search(&SearchCriteria::any()).await.unwrap();
        assert_eq!(records.len(), 2);
        inventory.verify(&id_a).await.unwrap();
        inventory.verify(&id_b).await.unwrap();
    }

    #[tokio::test]
    async fn test_events_mirror_operation_outcomes() {
        let root = tempdir().unwrap();
        let staging = tempdir().unwrap();
        let sink = Arc::new(CollectorSink::default());
        let inventory = Inventory::open(sink.clone() as EventSinkHandle, root.path()).unwrap();

        let (description, archive) = staged_runtime(staging.path(), "jdk17", b"bytes");
        let id = description.id();

        inventory.add(description, archive).await.unwrap();
        inventory.verify(&id).await.unwrap();
        inventory.delete(&id).await.unwrap();

        let events = sink.events();
        assert!(matches!(&events[0], PerkEvent::InventoryAdded { .. }));
        assert!(matches!(&events[1], PerkEvent::InventoryVerified { .. }));
        assert!(matches!(&events[2], PerkEvent::InventoryDeleted { .. }));
    }
}
