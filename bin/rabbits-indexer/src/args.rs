//! CLI argument parsing.

use std::path::PathBuf;

use argh::FromArgs;

use crate::{
    cmd::{
        balance::BalanceArgs, nicehashes::NiceHashesArgs, preview::PreviewArgs,
        rollback::RollbackArgs, scan::ScanArgs, stats::StatsArgs,
    },
    errors::*,
};

#[derive(Debug, FromArgs)]
#[argh(description = "RABB1TS reward indexer")]
pub(crate) struct Args {
    #[argh(option, short = 'c', description = "path to configuration")]
    pub config: PathBuf,

    /// Data directory path that will override the path in the config toml.
    #[argh(option, short = 'd', description = "datadir path used for the ledger")]
    pub datadir: Option<PathBuf>,

    /// Other generic overrides to the config toml.
    /// Will be used, for example, as `-o scanner.poll_interval_secs=5 -o protocol.min_zero_count=6`
    #[argh(option, short = 'o', description = "generic config overrides")]
    pub overrides: Vec<String>,

    #[argh(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, PartialEq, FromArgs)]
#[argh(subcommand)]
pub(crate) enum Command {
    Scan(ScanArgs),
    Balance(BalanceArgs),
    Preview(PreviewArgs),
    Stats(StatsArgs),
    NiceHashes(NiceHashesArgs),
    Rollback(RollbackArgs),
}

impl Args {
    /// Get strings of overrides gathered from user and internal attributes.
    pub(crate) fn get_all_overrides(&self) -> Result<Vec<String>, InitError> {
        let mut overrides = self.overrides.clone();
        overrides.extend_from_slice(&self.get_internal_overrides()?);
        Ok(overrides)
    }

    /// Overrides passed directly as args attributes.
    fn get_internal_overrides(&self) -> Result<Vec<String>, InitError> {
        let mut overrides = Vec::new();
        if let Some(datadir) = &self.datadir {
            let dd = datadir
                .to_str()
                .ok_or_else(|| InitError::InvalidDatadirPath(datadir.clone()))?;
            overrides.push(format!("client.datadir={dd}"));
        }

        Ok(overrides)
    }
}
