use std::sync::Arc;

use argh::FromArgs;
use rabbits_config::Config;
use rabbits_scanner::{BitcoindSource, ChainScanner};
use tokio::sync::watch;
use tracing::*;

use crate::context::{close_ledger, create_bitcoin_rpc_client, open_ledger, resolve_params};

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "scan")]
/// Scan the chain and apply rewards and transfers to the ledger
pub(crate) struct ScanArgs {
    /// stop once the chain tip is reached instead of following it
    #[argh(switch)]
    pub(crate) once: bool,
}

pub(crate) async fn scan(args: ScanArgs, config: &Config) -> anyhow::Result<()> {
    let params = resolve_params(config)?;
    let ledger = open_ledger(config)?;
    let client = create_bitcoin_rpc_client(&config.bitcoind)?;
    let source = Arc::new(BitcoindSource::new(client));
    let scanner = ChainScanner::new(source, ledger.clone(), params, config.scanner.clone());

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received interrupt, stopping after the current block");
                let _ = stop_tx.send(true);
            }
            Err(err) => warn!(%err, "failed to listen for interrupt"),
        }
    });

    let res = if args.once {
        scanner.scan_to_tip(&stop_rx).await.map(|report| {
            info!(
                blocks = %report.blocks,
                reverted = %report.reverted,
                issued = %report.issued,
                tip = ?report.tip,
                "scan finished"
            );
        })
    } else {
        scanner.run(stop_rx).await
    };

    drop(scanner);
    close_ledger(ledger)?;

    if let Err(err) = &res {
        error!(%err, "scan halted");
    }
    Ok(res?)
}
