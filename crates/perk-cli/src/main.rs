use std::{sync::Arc, time::Duration};

use clap::Parser;
use cli::{Args, Commands};
use download::download_runtime;
use events::spawn_event_printer;
use inventory::{delete_runtime, runtime_path, unpack_runtime, verify_runtime};
use list::{list_inventory, list_repositories};
use logging::setup_logging;
use perk_client::Client;
use perk_dl::{configure_http_client, ClientConfig};
use perk_events::{ChannelSink, EventSinkHandle};
use perk_provider::JsonIndexProvider;
use search::search_catalog;
use update::update_repositories;
use ureq::Proxy;

use crate::error::CliError;

mod cli;
mod config;
mod download;
mod error;
mod events;
mod inventory;
mod list;
mod logging;
mod search;
mod update;
mod utils;

async fn handle_cli() -> Result<(), CliError> {
    let args = Args::parse();

    setup_logging(&args);

    if args.no_color {
        let mut color = utils::COLOR.write().unwrap();
        *color = false;
    }

    if let Some(ref path) = args.config {
        let mut config_path = config::CONFIG_PATH.write().unwrap();
        *config_path = path.clone();
    }

    match args.command {
        Commands::DefConfig => config::generate_default_config()?,
        command => {
            let config_path = config::CONFIG_PATH.read().unwrap().to_path_buf();
            let config = config::load(&config_path)?;
            let root = args.root.clone().unwrap_or_else(|| config.root.clone());
            let timeout = args.timeout.map(Duration::from_secs);

            apply_http_config(&config.http)?;

            let (sink, receiver) = ChannelSink::new();
            let events: EventSinkHandle = Arc::new(sink);
            let client = Client::open_with_sink(&root, events)?;
            let guard = spawn_event_printer(receiver);

            for repository in &config.repositories {
                client.register_provider(Arc::new(JsonIndexProvider::new(
                    repository.index.clone(),
                    repository.name.clone(),
                )));
            }

            let result = match command {
                Commands::Repositories => {
                    list_repositories(&client);
                    Ok(())
                }
                Commands::Update { repository } => {
                    update_repositories(&client, repository, timeout).await
                }
                Commands::Search { filter } => match filter.into_criteria() {
                    Ok(criteria) => search_catalog(&client, criteria, timeout).await,
                    Err(err) => Err(err),
                },
                Commands::Download { id } => download_runtime(&client, id, timeout).await,
                Commands::List { filter } => match filter.into_criteria() {
                    Ok(criteria) => list_inventory(&client, criteria, timeout).await,
                    Err(err) => Err(err),
                },
                Commands::Verify { id } => verify_runtime(&client, id, timeout).await,
                Commands::Unpack { id, target } => {
                    unpack_runtime(&client, id, target, timeout).await
                }
                Commands::Delete { id } => delete_runtime(&client, id, timeout).await,
                Commands::Path { id } => runtime_path(&client, &id),
                Commands::DefConfig => unreachable!(),
            };

            // Drop the client first to close the event channel, then join
            // the printer thread so remaining events are fully drained.
            drop(client);
            guard.finish();

            result?;
        }
    }

    Ok(())
}

fn apply_http_config(http: &config::HttpConfig) -> Result<(), CliError> {
    let mut client = ClientConfig::default();

    if let Some(ref user_agent) = http.user_agent {
        client.user_agent = Some(user_agent.clone());
    }
    if let Some(ref proxy) = http.proxy {
        client.proxy = Some(Proxy::new(proxy).map_err(|err| CliError::InvalidProxy {
            proxy: proxy.clone(),
            cause: err.to_string(),
        })?);
    }
    if let Some(secs) = http.timeout_secs {
        client.timeout = Some(Duration::from_secs(secs));
    }

    configure_http_client(&client);
    Ok(())
}

#[tokio::main]
async fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    if let Err(err) = handle_cli().await {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(1);
    }
}
