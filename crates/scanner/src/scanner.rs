use std::{future, sync::Arc, time::Duration};

use rabbits_config::ScannerConfig;
use rabbits_db_types::LedgerDatabase;
use rabbits_ledger::Ledger;
use rabbits_params::RewardParams;
use rabbits_primitives::Amount;
use tokio::sync::watch;
use tracing::*;

use crate::{
    errors::{ScanError, ScanResult},
    fetch::{fetch_block, fetch_chain_tip},
    prefetch::Prefetcher,
    processor::apply_block,
    source::ChainSource,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ScannerState {
    Idle,
    /// Waiting for or applying the block at this height.
    Scanning(u64),
}

/// Outcome of one pass towards the chain tip.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ScanReport {
    /// Blocks committed.
    pub blocks: u64,
    /// Blocks rolled back because the chain reorganised under them.
    pub reverted: u64,
    /// Tokens issued by the committed blocks.
    pub issued: Amount,
    /// Ledger watermark at the end of the pass.
    pub tip: Option<u64>,
    /// Whether the pass ended on the stop signal.
    pub stopped: bool,
}

/// Drives the ledger forward from a [`ChainSource`].
///
/// The scanner is the ledger's only writer. Blocks are prefetched in the
/// background but applied strictly one after another, and the stop signal is
/// only honoured between blocks.
#[derive(Debug)]
pub struct ChainScanner<S, D> {
    source: Arc<S>,
    ledger: Arc<Ledger<D>>,
    params: RewardParams,
    config: ScannerConfig,
    state_tx: watch::Sender<ScannerState>,
}

impl<S: ChainSource, D: LedgerDatabase> ChainScanner<S, D> {
    pub fn new(
        source: Arc<S>,
        ledger: Arc<Ledger<D>>,
        params: RewardParams,
        config: ScannerConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(ScannerState::Idle);
        Self {
            source,
            ledger,
            params,
            config,
            state_tx,
        }
    }

    pub fn ledger(&self) -> &Arc<Ledger<D>> {
        &self.ledger
    }

    pub fn params(&self) -> &RewardParams {
        &self.params
    }

    /// First height scanned when the ledger is empty.
    pub fn start_height(&self) -> u64 {
        self.config.start_height.unwrap_or(self.params.start_height)
    }

    pub fn state(&self) -> ScannerState {
        *self.state_tx.borrow()
    }

    fn set_state(&self, state: ScannerState) {
        self.state_tx.send_replace(state);
    }

    fn prefetch(&self, from: u64, to: u64) -> Prefetcher {
        Prefetcher::spawn(
            self.source.clone(),
            from,
            to,
            self.config.prefetch_depth,
            self.config.fetch_retry.clone(),
        )
    }

    /// Applies every block from the ledger watermark up to the current chain
    /// tip, then returns to idle.
    ///
    /// On error the ledger stays at the last fully committed block.
    pub async fn scan_to_tip(&self, stop: &watch::Receiver<bool>) -> ScanResult<ScanReport> {
        let res = self.scan_pass(stop.clone()).await;
        self.set_state(ScannerState::Idle);
        res
    }

    async fn scan_pass(&self, mut stop: watch::Receiver<bool>) -> ScanResult<ScanReport> {
        let mut report = ScanReport::default();
        let start_height = self.start_height();
        let retry = &self.config.fetch_retry;

        let mut next = self.ledger.next_height(start_height)?;
        let chain_tip = fetch_chain_tip(self.source.as_ref(), next, retry).await?;
        let mut reorg_depth = 0;
        if next > chain_tip {
            if !self.tip_replaced(chain_tip).await? {
                trace!(%next, %chain_tip, "ledger is at chain tip");
                report.tip = self.ledger.tip()?.map(|t| t.height);
                return Ok(report);
            }

            self.revert_for_reorg(next - 1, &mut reorg_depth)?;
            report.reverted += 1;
            next = self.ledger.next_height(start_height)?;
        }

        info!(%next, %chain_tip, "scanning to chain tip");
        let mut prefetch = self.prefetch(next, chain_tip);

        loop {
            self.set_state(ScannerState::Scanning(next));

            let item = tokio::select! {
                biased;
                _ = wait_for_stop(&mut stop) => {
                    info!(%next, "stop requested, ending scan");
                    report.stopped = true;
                    break;
                }
                item = prefetch.next() => item,
            };

            // The source ran out of blocks before the tip we started with.
            let Some(item) = item else {
                break;
            };
            let block = item?;

            if let Some(tip) = self.ledger.tip()? {
                if block.prev_block_hash != tip.block_hash() {
                    warn!(
                        height = %block.height,
                        expected = %tip.block_hash(),
                        found = %block.prev_block_hash,
                        "block does not extend ledger tip, reverting"
                    );
                    self.revert_for_reorg(block.height, &mut reorg_depth)?;
                    report.reverted += 1;

                    next = self.ledger.next_height(start_height)?;
                    prefetch = self.prefetch(next, chain_tip);
                    continue;
                }
            }

            let summary = apply_block(&self.ledger, &block, &self.params)?;
            reorg_depth = 0;
            report.blocks += 1;
            report.issued = report
                .issued
                .checked_add(summary.total_reward)
                .ok_or_else(|| ScanError::InvalidAmount("scan issuance overflows".into()))?;
            next = block.height + 1;
        }

        report.tip = self.ledger.tip()?.map(|t| t.height);
        debug!(?report, "scan pass finished");
        Ok(report)
    }

    /// Whether the source now has a different block at the ledger tip height.
    ///
    /// Used once the ledger has caught up with `chain_tip`, where no new block
    /// would reveal the reorg through its parent hash.
    async fn tip_replaced(&self, chain_tip: u64) -> ScanResult<bool> {
        let Some(tip) = self.ledger.tip()? else {
            return Ok(false);
        };
        if tip.height > chain_tip {
            return Ok(false);
        }

        let retry = &self.config.fetch_retry;
        let Some(block) = fetch_block(self.source.as_ref(), tip.height, retry).await? else {
            return Ok(false);
        };
        if block.block_hash == tip.block_hash() {
            return Ok(false);
        }

        warn!(
            height = %tip.height,
            committed = %tip.block_hash(),
            found = %block.block_hash,
            "ledger tip was replaced on the chain, reverting"
        );
        Ok(true)
    }

    /// Reverts the ledger tip while scanning `height`, refusing once
    /// `reorg_depth` consecutive reverts reach the undo window.
    fn revert_for_reorg(&self, height: u64, reorg_depth: &mut u64) -> ScanResult<()> {
        let max_depth = self.ledger.max_reorg_depth();
        if *reorg_depth >= max_depth {
            error!(%height, %max_depth, "reorg exceeds undo window");
            return Err(ScanError::ReorgTooDeep { height, max_depth });
        }

        self.ledger.revert_tip()?;
        *reorg_depth += 1;
        Ok(())
    }

    /// Follows the chain: scans to the tip, waits for the poll interval and
    /// repeats until `stop` is set.
    pub async fn run(&self, mut stop: watch::Receiver<bool>) -> ScanResult<()> {
        let poll_dur = Duration::from_secs(self.config.poll_interval_secs);
        info!(start_height = %self.start_height(), ?poll_dur, "started chain scanner");

        loop {
            let report = self.scan_to_tip(&stop).await?;
            if report.stopped {
                break;
            }
            if report.blocks > 0 || report.reverted > 0 {
                info!(
                    blocks = %report.blocks,
                    reverted = %report.reverted,
                    issued = %report.issued,
                    tip = ?report.tip,
                    "caught up with chain"
                );
            }

            tokio::select! {
                biased;
                _ = wait_for_stop(&mut stop) => break,
                _ = tokio::time::sleep(poll_dur) => {}
            }
        }

        info!("chain scanner stopped");
        Ok(())
    }
}

/// Resolves once the stop flag is set. Never resolves if the sender is gone.
async fn wait_for_stop(stop: &mut watch::Receiver<bool>) {
    let closed = stop.wait_for(|stopped| *stopped).await.is_err();
    if closed {
        future::pending::<()>().await;
    }
}
