use std::time::Duration;

use perk_client::Client;
use tracing::{info, warn};
use url::Url;

use crate::{error::CliError, utils::finish};

pub async fn update_repositories(
    client: &Client,
    repository: Option<String>,
    timeout: Option<Duration>,
) -> Result<(), CliError> {
    let uri = repository
        .map(|uri| {
            Url::parse(&uri).map_err(|source| CliError::InvalidUri {
                uri: uri.clone(),
                source,
            })
        })
        .transpose()?;

    let report = finish(client.repository_update(uri), timeout).await?;

    if report.failures.is_empty() {
        info!("{} repositories updated", report.updated);
    } else {
        for (uri, cause) in &report.failures {
            warn!("{uri}: {cause}");
        }
        warn!(
            "{} repositories updated, {} failed",
            report.updated,
            report.failures.len()
        );
    }

    Ok(())
}
