//! RABB1TS indexer binary entrypoint.

use anyhow::{anyhow, Result};
use argh::from_env;
use rabbits_common::logging;
use rabbits_config::Config;
use tokio::runtime::{self, Handle};
use tracing::info;

use crate::{args::*, cmd::*, errors::InitError};

mod args;
mod cmd;
mod context;
mod errors;
mod output;

fn main() -> Result<()> {
    let args: Args = from_env();

    let config =
        context::get_config(&args).map_err(|e| anyhow!("failed to load configuration: {e}"))?;

    // Init runtime
    let rt = runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("rabbits-rt")
        .build()
        .map_err(InitError::RuntimeBuild)?;

    init_logging(rt.handle(), &config)?;

    let res = match args.cmd {
        Command::Scan(args) => rt.block_on(scan::scan(args, &config)),
        Command::Balance(args) => balance::get_balances(args, &config),
        Command::Preview(args) => preview::get_preview(args, &config),
        Command::Stats(args) => stats::get_stats(args, &config),
        Command::NiceHashes(args) => nicehashes::get_nice_hashes(args, &config),
        Command::Rollback(args) => rollback::rollback(args, &config),
    };

    info!("exiting rabbits-indexer");
    logging::finalize();
    res
}

fn init_logging(rt: &Handle, config: &Config) -> Result<()> {
    // Need to set the runtime context for async OTLP setup
    let _g = rt.enter();
    logging::init_logging_from_config(logging::LoggingInitConfig {
        service_base_name: "rabbits-indexer",
        service_label: config.logging.service_label.as_deref(),
        otlp_url: config.logging.otlp_url.as_deref(),
        log_dir: config.logging.log_dir.as_deref(),
        log_file_prefix: config.logging.log_file_prefix.as_deref(),
        json_format: config.logging.json_format,
        default_log_prefix: "rabbits",
    })?;
    Ok(())
}
