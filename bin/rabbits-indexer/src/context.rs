//! Configuration loading and construction of the ledger and bitcoin client.

use std::{fs, path::Path, sync::Arc};

use bitcoind_async_client::{Auth, Client};
use rabbits_config::{BitcoindConfig, Config};
use rabbits_db_store_sled::{open_sled_database, LedgerDBSled, SLED_NAME};
use rabbits_db_types::LedgerDatabase;
use rabbits_ledger::{Ledger, LedgerError};
use rabbits_params::RewardParams;
use toml::value::{Table, Value};
use tracing::*;

use crate::{args::*, errors::*};

pub(crate) type SledLedger = Ledger<LedgerDBSled>;

pub(crate) fn get_config(args: &Args) -> Result<Config, InitError> {
    let mut config_toml = load_config_from_path(&args.config)?;

    let overrides = args
        .get_all_overrides()?
        .iter()
        .map(|o| parse_override(o))
        .collect::<Result<Vec<_>, ConfigError>>()?;

    let table = config_toml
        .as_table_mut()
        .ok_or(ConfigError::TraverseNonTableAt {
            key: "<root>".to_string(),
            path: "".to_string(),
        })?;

    for (path, val) in overrides {
        apply_override(&path, val, table)?;
    }

    let config = config_toml.try_into::<Config>()?;
    Ok(config)
}

fn load_config_from_path(path: &Path) -> Result<Value, InitError> {
    let config_str = fs::read_to_string(path)?;
    Ok(toml::from_str(&config_str)?)
}

/// Splits `a.b.c=value` into its key path and value. Values that are not valid
/// TOML are taken as plain strings.
pub(crate) fn parse_override(s: &str) -> Result<(String, Value), ConfigError> {
    let (path, raw) = s
        .split_once('=')
        .ok_or_else(|| ConfigError::InvalidOverride(s.to_string()))?;
    let path = path.trim();
    if path.is_empty() || path.split('.').any(str::is_empty) {
        return Err(ConfigError::InvalidOverride(s.to_string()));
    }

    let raw = raw.trim();
    let value = toml::from_str::<Table>(&format!("v = {raw}"))
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| Value::String(raw.to_string()));
    Ok((path.to_string(), value))
}

/// Sets `value` at the dotted `path`, creating intermediate tables.
pub(crate) fn apply_override(path: &str, value: Value, table: &mut Table) -> Result<(), ConfigError> {
    match path.split_once('.') {
        None => {
            table.insert(path.to_string(), value);
            Ok(())
        }
        Some((key, rest)) => {
            let entry = table
                .entry(key.to_string())
                .or_insert_with(|| Value::Table(Table::new()));
            let inner = entry
                .as_table_mut()
                .ok_or_else(|| ConfigError::TraverseNonTableAt {
                    key: key.to_string(),
                    path: path.to_string(),
                })?;
            apply_override(rest, value, inner)
        }
    }
}

/// Network parameters with the `[protocol]` overrides applied.
pub(crate) fn resolve_params(config: &Config) -> Result<RewardParams, InitError> {
    let params = RewardParams::for_network(config.bitcoind.network).with_overrides(&config.protocol)?;
    debug!(?params, network = %config.bitcoind.network, "resolved reward params");
    Ok(params)
}

pub(crate) fn open_ledger(config: &Config) -> Result<Arc<SledLedger>, InitError> {
    let sled = open_sled_database(&config.client.datadir, SLED_NAME)
        .map_err(|e| InitError::StorageCreation(e.to_string()))?;
    let db = LedgerDBSled::new(sled).map_err(|e| InitError::StorageCreation(e.to_string()))?;
    let ledger = Ledger::open(Arc::new(db), config.scanner.max_reorg_depth)?;
    Ok(Arc::new(ledger))
}

/// Flushes and releases the ledger. If another handle is still alive only
/// the flush happens.
pub(crate) fn close_ledger<D: LedgerDatabase>(ledger: Arc<Ledger<D>>) -> Result<(), InitError> {
    match Arc::try_unwrap(ledger) {
        Ok(ledger) => ledger.close()?,
        Err(shared) => {
            warn!("ledger still shared at shutdown, flushing only");
            shared.db().flush().map_err(LedgerError::from)?;
        }
    }
    Ok(())
}

/// Bitcoin client initialization
pub(crate) fn create_bitcoin_rpc_client(config: &BitcoindConfig) -> Result<Arc<Client>, InitError> {
    let auth = Auth::UserPass(config.rpc_user.clone(), config.rpc_password.clone());
    let btc_rpc = Client::new(
        config.rpc_url.clone(),
        auth,
        config.retry_count.map(u16::from),
        config.retry_interval,
        None,
    )
    .map_err(|e| InitError::BitcoinClientCreation(e.to_string()))?;

    Ok(btc_rpc.into())
}
