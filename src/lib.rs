pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod format;
pub mod io_utils;
pub mod normalize;
pub mod pipeline;
pub mod preview;
pub mod reader;
pub mod record;
pub mod store;
pub mod table;

use std::{env, io, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug};

use crate::{cli::Cli, config::ImportConfig, pipeline::ImportRequest};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("roster_import", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = ImportConfig::resolve(&cli).context("Resolving configuration")?;
    let request = ImportRequest {
        path: cli.file.clone(),
        record_type: cli.record_type.clone(),
        mode: cli.mode.clone(),
        database: config.database.clone(),
        read: config.read_options()?,
        missing: config.missing_values(),
        pretty: config.pretty,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let outcome = pipeline::run(&request, &mut out)?;
    debug!("Finished with {outcome:?}");
    Ok(())
}
