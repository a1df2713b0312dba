mod event;
mod sink;

use std::sync::Arc;

pub use event::*;
pub use sink::*;

/// Unique identifier for a running operation.
pub type OperationId = u64;

/// Shared handle to an event sink.
pub type EventSinkHandle = Arc<dyn EventSink>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sink() {
        let sink = NullSink;
        sink.emit(PerkEvent::InventoryAdded {
            id: "sha256:abc".to_string(),
        });
    }

    #[test]
    fn test_channel_sink_preserves_order() {
        let (sink, rx) = ChannelSink::new();
        sink.emit(PerkEvent::DownloadStarting {
            op_id: 1,
            id: "sha256:abc".to_string(),
            total: 1024,
        });
        sink.emit(PerkEvent::DownloadProgress {
            op_id: 1,
            id: "sha256:abc".to_string(),
            current: 512,
            total: 1024,
        });
        sink.emit(PerkEvent::DownloadCompleted {
            op_id: 1,
            id: "sha256:abc".to_string(),
            total: 1024,
        });

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            &events[0],
            PerkEvent::DownloadStarting {
                total: 1024,
                ..
            }
        ));
        assert!(matches!(
            &events[1],
            PerkEvent::DownloadProgress {
                current: 512,
                ..
            }
        ));
        assert!(matches!(&events[2], PerkEvent::DownloadCompleted { .. }));
    }

    #[test]
    fn test_channel_sink_receiver_dropped() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.emit(PerkEvent::InventoryDeleted {
            id: "sha256:orphan".to_string(),
        });
    }

    #[test]
    fn test_collector_sink() {
        let sink = CollectorSink::default();
        assert!(sink.is_empty());

        sink.emit(PerkEvent::RepositoryUpdateStarted {
            repository: "urn:example:adoptium".to_string(),
        });
        sink.emit(PerkEvent::RepositoryUpdateCompleted {
            repository: "urn:example:adoptium".to_string(),
            count: 100,
        });

        assert_eq!(sink.len(), 2);
        let events = sink.events();
        assert!(matches!(&events[0], PerkEvent::RepositoryUpdateStarted { .. }));
        assert!(matches!(
            &events[1],
            PerkEvent::RepositoryUpdateCompleted {
                count: 100,
                ..
            }
        ));
    }

    #[test]
    fn test_event_sink_handle() {
        let sink: EventSinkHandle = Arc::new(NullSink);
        sink.emit(PerkEvent::CatalogUpdateCompleted {
            updated: 3,
            failed: 1,
        });

        let collector = Arc::new(CollectorSink::default());
        let sink: EventSinkHandle = collector.clone();
        sink.emit(PerkEvent::InventoryVerified {
            id: "sha256:abc".to_string(),
        });
        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn test_event_sink_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NullSink>();
        assert_send_sync::<ChannelSink>();
        assert_send_sync::<CollectorSink>();
    }

    #[test]
    fn test_inventory_op_display() {
        assert_eq!(InventoryOp::Add.to_string(), "add");
        assert_eq!(InventoryOp::Delete.to_string(), "delete");
        assert_eq!(InventoryOp::Verify.to_string(), "verify");
        assert_eq!(InventoryOp::Unpack.to_string(), "unpack");
    }
}
