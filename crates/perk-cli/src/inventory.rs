use std::{path::PathBuf, time::Duration};

use perk_client::Client;
use tracing::info;

use crate::{error::CliError, utils::finish};

pub async fn verify_runtime(
    client: &Client,
    id: String,
    timeout: Option<Duration>,
) -> Result<(), CliError> {
    finish(client.inventory_verify(id), timeout).await?;
    Ok(())
}

pub async fn unpack_runtime(
    client: &Client,
    id: String,
    target: Option<PathBuf>,
    timeout: Option<Duration>,
) -> Result<(), CliError> {
    let path = finish(client.inventory_unpack(id, target), timeout).await?;
    info!("{}", path.display());
    Ok(())
}

pub async fn delete_runtime(
    client: &Client,
    id: String,
    timeout: Option<Duration>,
) -> Result<(), CliError> {
    finish(client.inventory_delete(id), timeout).await?;
    Ok(())
}

pub fn runtime_path(client: &Client, id: &str) -> Result<(), CliError> {
    let path = client.inventory_path(id)?;
    info!("{}", path.display());
    Ok(())
}
