use std::time::Duration;

use nu_ansi_term::Color::{Blue, Cyan, Green, LightRed, Magenta};
use perk_client::Client;
use perk_core::SearchCriteria;
use perk_utils::bytes::format_bytes;
use tracing::{debug, info};
use url::Url;

use crate::{
    error::CliError,
    utils::{finish, Colored},
};

pub async fn search_catalog(
    client: &Client,
    criteria: SearchCriteria,
    timeout: Option<Duration>,
) -> Result<(), CliError> {
    let entries = finish(client.catalog_search(criteria), timeout).await?;
    debug!(count = entries.len(), "catalog search finished");

    for entry in &entries {
        let description = &entry.description;
        let repositories = entry
            .offered_by
            .iter()
            .map(Url::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        info!(
            id = %description.id(),
            version = %description.version,
            platform = %description.platform,
            architecture = %description.architecture,
            vm = %description.vm,
            configuration = %description.configuration,
            size = description.archive_size,
            "{} | {} {} {}/{} {} ({}) [{}]",
            Colored(Cyan, description.id()),
            Colored(Blue, &description.version),
            Colored(Magenta, &description.configuration),
            description.platform,
            description.architecture,
            Colored(LightRed, &description.vm),
            format_bytes(description.archive_size),
            Colored(Green, repositories),
        );
    }

    info!("{} runtimes found", entries.len());
    Ok(())
}
