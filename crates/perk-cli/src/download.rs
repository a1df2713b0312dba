use std::time::Duration;

use perk_client::Client;
use tracing::info;

use crate::{error::CliError, utils::finish};

pub async fn download_runtime(
    client: &Client,
    id: String,
    timeout: Option<Duration>,
) -> Result<(), CliError> {
    let path = finish(client.catalog_download(id), timeout).await?;
    info!("{}", path.display());
    Ok(())
}
