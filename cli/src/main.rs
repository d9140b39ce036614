//! LedgerX CLI - binary entry point.
//!
//! ```text
//! main() -> load Settings -> Session::new() -> Session::run(command) -> shutdown
//! ```
//!
//! Every command that talks to the service waits on the readiness gate first,
//! so a sleeping backend shows a waking notice on stderr instead of failing.
//! Logs go to `~/.ledgerx/logs/ledgerx.log`; stdout carries only results.

mod args;
mod commands;
mod format;

use std::{
    fs::{self, OpenOptions},
    path::PathBuf,
    sync::Mutex,
};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use ledgerx_config::{LedgerxConfig, Settings, config_path, parse_base_url};

use crate::args::CliArgs;
use crate::commands::Session;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
    for warning in init_warnings {
        tracing::warn!("{warning}");
    }
}

fn open_log_file() -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new().create(true).append(true).open(&candidate) {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.ledgerx/logs/ledgerx.log
    if let Some(config_path) = config_path()
        && let Some(config_dir) = config_path.parent()
    {
        candidates.push(config_dir.join("logs").join("ledgerx.log"));
    }

    // Fallback: ./.ledgerx/logs/ledgerx.log
    candidates.push(PathBuf::from(".ledgerx").join("logs").join("ledgerx.log"));

    candidates
}

fn load_settings(args: &CliArgs) -> Result<Settings> {
    let config = match &args.config {
        Some(path) => LedgerxConfig::load_from(path)?
            .with_context(|| format!("config file {} does not exist", path.display()))?,
        None => LedgerxConfig::load()?.unwrap_or_default(),
    };

    let mut settings = config.resolve()?;
    if let Some(raw) = &args.base_url {
        settings.base_url = parse_base_url(raw)?;
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing();

    let settings = load_settings(&args)?;
    let mut session = Session::new(settings)?;
    let result = session.run(args.command).await;
    session.shutdown();

    if let Err(err) = &result {
        tracing::warn!(error = %err, "Command failed");
    }
    result
}
