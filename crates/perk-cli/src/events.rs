use std::{sync::mpsc::Receiver, thread};

use perk_events::PerkEvent;
use perk_utils::bytes::format_bytes;
use tracing::{debug, info, warn};

/// Joins the printer thread once the event channel closes.
pub struct EventGuard {
    handle: Option<thread::JoinHandle<()>>,
}

impl EventGuard {
    pub fn finish(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Spawns a thread that renders the merged event stream as log lines.
///
/// The thread exits when every sink handle is dropped, so callers drop the
/// client before calling [`EventGuard::finish`] to drain remaining events.
pub fn spawn_event_printer(receiver: Receiver<PerkEvent>) -> EventGuard {
    let handle = thread::spawn(move || {
        for event in receiver {
            render(event);
        }
    });

    EventGuard {
        handle: Some(handle),
    }
}

fn render(event: PerkEvent) {
    match event {
        PerkEvent::RepositoryUpdateStarted { repository } => {
            info!("Updating {repository}");
        }
        PerkEvent::RepositoryUpdateProgress { .. } => {}
        PerkEvent::RepositoryUpdateCompleted { repository, count } => {
            info!("Updated {repository}: {count} runtimes");
        }
        PerkEvent::RepositoryUpdateFailed { repository, cause } => {
            warn!("Update of {repository} failed: {cause}");
        }
        PerkEvent::ProviderRegistered { uri, name } => {
            debug!("Registered provider {name} ({uri})");
        }
        PerkEvent::ProviderDeregistered { uri } => {
            debug!("Deregistered provider {uri}");
        }
        PerkEvent::CatalogUpdateCompleted { updated, failed } => {
            if failed > 0 {
                warn!("Catalog update finished: {updated} updated, {failed} failed");
            } else {
                info!("Catalog update finished: {updated} updated");
            }
        }
        PerkEvent::DownloadStarting { id, total, .. } => {
            info!("Downloading {id} ({})", format_bytes(total));
        }
        PerkEvent::DownloadProgress { .. } => {}
        PerkEvent::DownloadCompleted { id, total, .. } => {
            info!("Downloaded {id} ({})", format_bytes(total));
        }
        PerkEvent::DownloadFailed { id, cause, .. } => {
            warn!("Download of {id} failed: {cause}");
        }
        PerkEvent::InventoryAdded { id } => {
            info!("Added {id}");
        }
        PerkEvent::InventoryDeleted { id } => {
            info!("Deleted {id}");
        }
        PerkEvent::InventoryVerified { id } => {
            info!("Verified {id}");
        }
        PerkEvent::InventoryUnpacked { id, target } => {
            info!("Unpacked {id} to {target}");
        }
        PerkEvent::InventoryFailed { id, op, cause } => {
            warn!("{op} of {id} failed: {cause}");
        }
    }
}
