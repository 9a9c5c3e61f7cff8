use rabbits_db_types::{types::BlockSummary, LedgerDatabase};
use rabbits_ledger::Ledger;
use rabbits_params::RewardParams;
use rabbits_primitives::ScanBlock;
use rabbits_reward::compute_block_rewards;
use tracing::*;

use crate::errors::{ScanError, ScanResult};

/// Applies one block to the ledger: every transaction in block order first
/// moves the balances of the outpoints it spends, then receives its own reward.
///
/// Either the whole block is committed or nothing is.
pub fn apply_block<D: LedgerDatabase>(
    ledger: &Ledger<D>,
    block: &ScanBlock,
    params: &RewardParams,
) -> ScanResult<BlockSummary> {
    let height = block.height;
    block.validate().map_err(|e| ScanError::MalformedBlock {
        height,
        reason: e.to_string(),
    })?;

    let rewards = compute_block_rewards(block, params)?;
    let mut batch = ledger.begin_block(height, block.block_hash)?;

    for (tx_index, tx) in block.transactions.iter().enumerate() {
        if !tx.is_coinbase {
            batch.transfer_on_spend(&tx.inputs, tx)?;
        }

        if let Some(reward) = rewards.for_tx(tx_index) {
            batch.credit_reward(reward)?;
            if reward.issued() > 0 {
                debug!(
                    %height,
                    txid = %reward.txid,
                    zero_count = %reward.zero_count,
                    reward = %reward.reward,
                    "nice hash"
                );
            }
        }
    }

    let summary = ledger.commit(batch)?;
    info!(
        %height,
        blkid = %block.block_hash,
        zero_count = ?summary.max_zero_count,
        reward = %summary.total_reward,
        credits = %summary.credits,
        "applied block"
    );
    Ok(summary)
}
