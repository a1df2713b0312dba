use std::time::Duration;

use nu_ansi_term::Color::{Cyan, Green};
use perk_client::Client;
use perk_core::SearchCriteria;
use perk_inventory::InventoryRecord;
use perk_utils::bytes::format_bytes;
use tabled::{builder::Builder, settings::Style};
use tracing::info;

use crate::{
    error::CliError,
    utils::{finish, Colored},
};

pub fn list_repositories(client: &Client) {
    let repositories = client.repository_list();
    for (uri, name) in &repositories {
        info!("{} {}", Colored(Green, name), Colored(Cyan, uri));
    }
    info!("{} repositories configured", repositories.len());
}

pub async fn list_inventory(
    client: &Client,
    criteria: SearchCriteria,
    timeout: Option<Duration>,
) -> Result<(), CliError> {
    let records = finish(client.inventory_search(criteria), timeout).await?;

    if records.is_empty() {
        info!("Inventory is empty");
        return Ok(());
    }

    let mut builder = Builder::default();
    builder.push_record([
        "Identity", "Version", "Platform", "Arch", "VM", "Config", "Size", "State",
    ]);

    for record in &records {
        let description = &record.description;
        builder.push_record([
            description.id(),
            description.version.to_string(),
            description.platform.clone(),
            description.architecture.clone(),
            description.vm.clone(),
            description.configuration.to_string(),
            format_bytes(description.archive_size),
            state_of(record),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::sharp());

    info!("{table}");
    info!("{} runtimes in inventory", records.len());
    Ok(())
}

fn state_of(record: &InventoryRecord) -> String {
    let mut states = Vec::new();
    if record.archive_present {
        states.push("archived");
    }
    if record.verified_at.is_some() {
        states.push("verified");
    }
    if record.unpacked_path.is_some() {
        states.push("unpacked");
    }

    if states.is_empty() {
        "missing".to_string()
    } else {
        states.join(", ")
    }
}
