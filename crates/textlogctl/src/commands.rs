//! Command implementations for textlogctl

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use textlog_common::record::{DEBUG, ERROR};
use textlog_common::{ErrorRecord, LogStore, TextLogConfig};

use crate::Cli;

/// Config file (explicit or discovered) with command line overrides applied
pub fn resolve_config(cli: &Cli) -> Result<TextLogConfig> {
    let mut config = match &cli.config {
        Some(path) => TextLogConfig::load(path)?,
        None => TextLogConfig::discover()?,
    };

    if let Some(folder) = &cli.folder {
        config.store.folder = folder.clone();
    }
    if let Some(db) = &cli.db {
        config = config.with_table(db.clone());
    }
    if cli.no_db {
        config.table.enabled = false;
    }

    Ok(config)
}

fn open_store(config: &TextLogConfig) -> Result<LogStore> {
    LogStore::open(config).with_context(|| {
        format!("Failed to open log store in {}", config.store.folder.display())
    })
}

pub fn log(
    config: &TextLogConfig,
    trace_id: &str,
    name: &str,
    text: &str,
    date: &str,
    user: Option<&str>,
    level: &str,
) -> Result<()> {
    let record = ErrorRecord::new(trace_id, name, text, date)?
        .with_user(user)
        .with_level(level)?;

    let mut store = open_store(config)?;
    store.append(&record)?;
    info!("Logged {} to {}", record.trace_id, store.file_path().display());
    Ok(())
}

pub fn print(config: &TextLogConfig, level: &str) -> Result<()> {
    let mut store = open_store(config)?;
    store.print(level)?;
    Ok(())
}

pub fn export(config: &TextLogConfig, level: &str, destination: &Path) -> Result<()> {
    let mut store = open_store(config)?;
    let written = store
        .export(level, destination)
        .with_context(|| format!("Failed to export to {}", destination.display()))?;

    if written == 0 {
        println!("No logs found for level: {}", level);
    } else {
        println!("Exported {} entries to {}", written, destination.display());
    }
    Ok(())
}

pub fn ids(config: &TextLogConfig) -> Result<()> {
    let store = open_store(config)?;
    let mut ids: Vec<_> = store.existing_ids().into_iter().collect();
    ids.sort();
    for id in ids {
        println!("{}", id);
    }
    Ok(())
}

pub fn clear(config: &TextLogConfig) -> Result<()> {
    let mut store = open_store(config)?;
    store.clear()?;
    println!("Cleared logs in {}", store.folder().display());
    Ok(())
}

/// The sample record used by `demo`
pub fn demo_record() -> Result<ErrorRecord> {
    Ok(ErrorRecord::new(
        "001",
        "NullPointerError",
        "Attempt to dereference null pointer.",
        "2024/02/12 10:15",
    )?
    .with_user(Some("Alice"))
    .with_level(DEBUG)?)
}

pub fn demo(config: &TextLogConfig) -> Result<()> {
    let mut store = open_store(config)?;
    store.append(&demo_record()?)?;
    store.print(ERROR)?;
    Ok(())
}
