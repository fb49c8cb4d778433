//! drive-to-photos
//!
//! Copies media from a Google Drive folder tree into Google Photos.

mod cli;

use anyhow::{bail, Context, Result};
use bridge_desktop::{LoopbackAuthorizationPrompt, ReqwestHttpClient};
use clap::Parser;
use core_runtime::config::SyncSettings;
use core_runtime::logging::{init_logging, LoggingConfig};
use core_sync::{SyncContext, SyncCoordinator};
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::info;

use crate::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(
        LoggingConfig::default()
            .with_format(cli.log_format)
            .with_level(cli.log_level),
    )?;

    let root_folder = match cli.root_folder.clone() {
        Some(name) => name,
        None => prompt_root_folder()?,
    };

    let mut settings = SyncSettings::builder()
        .credentials_path(&cli.credentials)
        .token_path(&cli.token)
        .max_video_seconds_opt(cli.max_video_seconds);
    if let Some(dir) = &cli.temp_dir {
        settings = settings.temp_dir(dir);
    }
    if let Some(path) = &cli.missed_log {
        settings = settings.missed_log_path(path);
    }
    let settings = settings.build()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(run(settings, &root_folder))
}

async fn run(settings: SyncSettings, root_folder: &str) -> Result<()> {
    let http_client = Arc::new(ReqwestHttpClient::new()?);
    let prompt = Arc::new(LoopbackAuthorizationPrompt::bind().await?);

    let context = SyncContext::google(settings, http_client, prompt)
        .await
        .context("Could not authenticate with Google")?;

    let report = SyncCoordinator::new(context).run(root_folder).await?;
    info!(clean = report.is_clean(), "Done");

    print!("{}", report);
    Ok(())
}

fn prompt_root_folder() -> Result<String> {
    eprint!("Name of the Drive folder to copy: ");
    std::io::stderr().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;

    let name = line.trim();
    if name.is_empty() {
        bail!("No root folder name given");
    }
    Ok(name.to_string())
}
