use std::path::PathBuf;

use bitcoin::Network;
use rabbits_params::ParamsOverrides;
use serde::{Deserialize, Serialize};

use crate::retry::RetryConfig;

/// Default value for `datadir` in [`ClientConfig`].
const DEFAULT_DATADIR: &str = "rabbits-data";

/// Default seconds to wait at the tip before polling again.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Default number of blocks fetched ahead of the one being applied.
const DEFAULT_PREFETCH_DEPTH: usize = 8;

/// Default number of blocks that can be rolled back on a reorg.
const DEFAULT_MAX_REORG_DEPTH: u64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// The data directory where database contents reside.
    #[serde(default = "default_datadir")]
    pub datadir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            datadir: default_datadir(),
        }
    }
}

fn default_datadir() -> PathBuf {
    DEFAULT_DATADIR.into()
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_prefetch_depth() -> usize {
    DEFAULT_PREFETCH_DEPTH
}

fn default_max_reorg_depth() -> u64 {
    DEFAULT_MAX_REORG_DEPTH
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitcoindConfig {
    pub rpc_url: String,
    pub rpc_user: String,
    pub rpc_password: String,
    pub network: Network,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_interval: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// First height to scan on an empty ledger. Falls back to the network
    /// parameters when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_height: Option<u64>,

    /// Seconds to wait at the tip before polling for new blocks.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Blocks fetched ahead of the one being applied.
    #[serde(default = "default_prefetch_depth")]
    pub prefetch_depth: usize,

    /// Undo journals are kept this many blocks back.
    #[serde(default = "default_max_reorg_depth")]
    pub max_reorg_depth: u64,

    #[serde(default)]
    pub fetch_retry: RetryConfig,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            start_height: None,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            prefetch_depth: DEFAULT_PREFETCH_DEPTH,
            max_reorg_depth: DEFAULT_MAX_REORG_DEPTH,
            fetch_retry: RetryConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Service label to append to the service name (e.g., "prod", "dev").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_label: Option<String>,

    /// OpenTelemetry OTLP endpoint URL for distributed tracing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otlp_url: Option<String>,

    /// Directory path for file-based logging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    /// Prefix for log file names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file_prefix: Option<String>,

    /// Use JSON format for logs instead of compact format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_format: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
    pub bitcoind: BitcoindConfig,

    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Overrides of the network's protocol parameters.
    #[serde(default)]
    pub protocol: ParamsOverrides,

    /// Logging configuration (optional section in TOML).
    #[serde(default)]
    pub logging: LoggingConfig,
}
