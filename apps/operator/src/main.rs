use std::{io, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{MemoryRecordStore, RecordStore, RecordsCoordinator, RestRecordStore, StoreConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

mod commands;
mod config;
mod report;

use commands::Command;
use config::{load_settings, Settings};

#[derive(Parser, Debug)]
#[command(about = "Manage personal detail records")]
struct Cli {
    #[arg(long, default_value = "operator.toml")]
    config: PathBuf,
    #[arg(long)]
    store_url: Option<String>,
    #[arg(long)]
    api_key: Option<String>,
    #[arg(long)]
    table: Option<String>,
    #[command(subcommand)]
    command: Command,
}

fn build_store(settings: &Settings) -> Result<Arc<dyn RecordStore>> {
    if settings.uses_memory_store() {
        return Ok(Arc::new(MemoryRecordStore::new()));
    }

    let base_url = Url::parse(settings.store_url.trim())
        .with_context(|| format!("invalid store url '{}'", settings.store_url))?;
    let mut config = StoreConfig::new(base_url).with_table(settings.table.clone());
    if let Some(key) = &settings.api_key {
        config = config.with_api_key(key.clone());
    }
    if let Some(timeout) = settings.request_timeout {
        config = config.with_request_timeout(timeout);
    }
    Ok(Arc::new(RestRecordStore::new(config)?))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings(&cli.config)?;
    if let Some(v) = cli.store_url {
        settings.store_url = v;
    }
    if let Some(v) = cli.api_key {
        settings.api_key = Some(v);
    }
    if let Some(v) = cli.table {
        settings.table = v;
    }

    if let Some(notice) = settings.persistence_warning() {
        warn!("{notice}");
    }
    let store = build_store(&settings)?;
    info!(store = %settings.store_url, table = %settings.table, "record store ready");

    // Every command fetches the collection itself.
    let coordinator = RecordsCoordinator::new(store, settings.refresh_policy);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    commands::execute(&*coordinator, cli.command, &mut out).await
}
