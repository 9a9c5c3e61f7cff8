//! Error types for initialization and configuration.

use std::{io, path::PathBuf};

use rabbits_ledger::LedgerError;
use rabbits_params::ParamsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum InitError {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("unparsable config: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config: {0}")]
    MalformedConfig(#[from] ConfigError),

    #[error("params: {0}")]
    MalformedParams(#[from] ParamsError),

    #[error("datadir path is not valid utf-8: {0:?}")]
    InvalidDatadirPath(PathBuf),

    #[error("failed to build runtime: {0}")]
    RuntimeBuild(#[source] io::Error),

    #[error("failed to open storage: {0}")]
    StorageCreation(String),

    #[error("failed to create bitcoin client: {0}")]
    BitcoinClientCreation(String),

    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    /// Tried to traverse into a primitive.
    #[error("can't traverse into non-table key '{key}' of '{path}'")]
    TraverseNonTableAt { key: String, path: String },

    /// Invalid override string.
    #[error("invalid override: '{0}'")]
    InvalidOverride(String),
}
