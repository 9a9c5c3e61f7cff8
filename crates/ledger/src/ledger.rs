use std::sync::Arc;

use bitcoin::{Address, BlockHash};
use parking_lot::RwLock;
use rabbits_db_types::{
    types::{
        BlockRevert, BlockSummary, BlockWrite, ChainTip, LedgerStats, NiceHash, RewardEntry,
    },
    DbError, LedgerDatabase,
};
use rabbits_primitives::{format_amount, Amount, UtxoId};
use tracing::*;

use crate::{
    address::AddressIndex,
    batch::{BatchParts, LedgerBatch},
    errors::{LedgerError, LedgerResult},
};

/// Token balances per outpoint, advanced one block at a time.
///
/// Only one task may write. Readers take the shared side of `gate`, the writer
/// takes the exclusive side for the duration of a commit or revert, so a read
/// never observes a partially applied block.
#[derive(Debug)]
pub struct Ledger<D> {
    db: Arc<D>,
    gate: RwLock<()>,
    max_reorg_depth: u64,
}

impl<D: LedgerDatabase> Ledger<D> {
    /// Opens a ledger over an existing database, resuming from its tip.
    ///
    /// Undo journals are kept for the last `max_reorg_depth` blocks.
    pub fn open(db: Arc<D>, max_reorg_depth: u64) -> LedgerResult<Self> {
        match db.get_tip()? {
            Some(tip) => {
                info!(height = %tip.height, blkid = %tip.block_hash(), "opened ledger")
            }
            None => info!("opened empty ledger"),
        }

        Ok(Self {
            db,
            gate: RwLock::new(()),
            max_reorg_depth,
        })
    }

    /// Flushes the database and releases the ledger.
    pub fn close(self) -> LedgerResult<()> {
        let _guard = self.gate.write();
        self.db.flush()?;
        info!("closed ledger");
        Ok(())
    }

    pub fn db(&self) -> &Arc<D> {
        &self.db
    }

    pub fn max_reorg_depth(&self) -> u64 {
        self.max_reorg_depth
    }

    /// Processed-height watermark.
    pub fn tip(&self) -> LedgerResult<Option<ChainTip>> {
        let _guard = self.gate.read();
        Ok(self.db.get_tip()?)
    }

    /// Height the next committed block must have. `start_height` applies to
    /// an empty ledger.
    pub fn next_height(&self, start_height: u64) -> LedgerResult<u64> {
        Ok(self.tip()?.map_or(start_height, |tip| tip.height + 1))
    }

    fn check_next(&self, height: u64) -> LedgerResult<()> {
        let Some(tip) = self.db.get_tip()? else {
            return Ok(());
        };
        if height <= tip.height {
            return Err(LedgerError::AlreadyCommitted(height));
        }
        if height != tip.height + 1 {
            return Err(LedgerError::OutOfOrder {
                height,
                expected: tip.height + 1,
            });
        }
        Ok(())
    }

    /// Starts staging the effects of the block at `height`.
    pub fn begin_block(
        &self,
        height: u64,
        block_hash: BlockHash,
    ) -> LedgerResult<LedgerBatch<'_, D>> {
        self.check_next(height)?;
        Ok(LedgerBatch::new(self.db.as_ref(), height, block_hash))
    }

    /// Atomically applies a staged block and advances the watermark.
    pub fn commit(&self, batch: LedgerBatch<'_, D>) -> LedgerResult<BlockSummary> {
        let parts = batch.into_parts();
        let _guard = self.gate.write();
        self.check_next(parts.height)?;

        let prev = match self.db.get_tip()? {
            Some(tip) => self.db.get_stats_at(tip.height)?.unwrap_or_default(),
            None => LedgerStats::default(),
        };
        let stats = next_stats(&prev, &parts)?;

        let summary = BlockSummary {
            height: parts.height,
            blkid: parts.block_hash.into(),
            max_zero_count: parts.max_zero_count,
            nicest_txid: parts.nicest_txid.map(Into::into),
            total_reward: parts.issued,
            rewarded_tx_count: parts.nice_hashes.len() as u32,
            credits: parts.rewards.len() as u32,
            burned: parts.burned,
            unknown_spends: parts.unknown_spends,
        };

        let write = BlockWrite {
            tip: ChainTip::new(parts.height, parts.block_hash),
            summary: summary.clone(),
            stats,
            balances: parts.balances,
            undo: parts.undo,
            rewards: parts.rewards,
            nice_hashes: parts.nice_hashes,
            prune_undo_below: (parts.height + 1)
                .checked_sub(self.max_reorg_depth)
                .filter(|h| *h > 0),
        };
        self.db.put_block(write)?;

        debug!(
            height = %summary.height,
            reward = %summary.total_reward,
            supply = %stats.supply,
            "committed block"
        );
        Ok(summary)
    }

    fn revert_tip_locked(&self, tip: ChainTip) -> LedgerResult<Option<ChainTip>> {
        let undo = self
            .db
            .get_undo(tip.height)?
            .ok_or(DbError::MissingUndo(tip.height))?;

        let new_tip = match tip.height.checked_sub(1) {
            Some(prev) => self
                .db
                .get_block_summary(prev)?
                .map(|s| ChainTip::new(prev, s.blkid.to_block_hash())),
            None => None,
        };

        self.db.revert_block(BlockRevert {
            height: tip.height,
            balances: undo.into_iter().map(|e| (e.utxo, e.previous)).collect(),
            new_tip,
        })?;

        warn!(height = %tip.height, blkid = %tip.block_hash(), "reverted block");
        Ok(new_tip)
    }

    /// Rolls back the most recent block. Returns the new tip.
    pub fn revert_tip(&self) -> LedgerResult<Option<ChainTip>> {
        let _guard = self.gate.write();
        let tip = self.db.get_tip()?.ok_or(DbError::NothingCommitted)?;
        self.revert_tip_locked(tip)
    }

    /// Rolls back every block above `height`. Returns how many were reverted.
    ///
    /// Fails without touching anything if a block in the range is older than
    /// the reorg window.
    pub fn revert_to(&self, height: u64) -> LedgerResult<u64> {
        let _guard = self.gate.write();
        let Some(mut tip) = self.db.get_tip()? else {
            return Ok(0);
        };
        if tip.height <= height {
            return Ok(0);
        }

        for h in (height + 1..=tip.height).rev() {
            if self.db.get_undo(h)?.is_none() {
                return Err(DbError::MissingUndo(h).into());
            }
        }

        let mut reverted = 0;
        while tip.height > height {
            reverted += 1;
            match self.revert_tip_locked(tip)? {
                Some(new_tip) => tip = new_tip,
                None => break,
            }
        }

        info!(%height, %reverted, "rolled back ledger");
        Ok(reverted)
    }

    /// Balance of an outpoint as of the last committed block.
    pub fn balance_of(&self, utxo: &UtxoId) -> LedgerResult<Amount> {
        let _guard = self.gate.read();
        Ok(self.db.get_balance(utxo)?.unwrap_or(0))
    }

    /// Balances of several outpoints from the same committed block.
    pub fn balances_of(&self, utxos: &[UtxoId]) -> LedgerResult<Vec<(UtxoId, Amount)>> {
        let _guard = self.gate.read();
        utxos
            .iter()
            .map(|utxo| Ok((*utxo, self.db.get_balance(utxo)?.unwrap_or(0))))
            .collect()
    }

    /// Nonzero balances held by an address, resolved through `index`.
    pub fn balances_for_address<A: AddressIndex>(
        &self,
        index: &A,
        address: &Address,
    ) -> LedgerResult<Vec<(UtxoId, Amount)>> {
        let utxos = index
            .utxos_for_address(address)
            .map_err(|e| LedgerError::AddressIndex(e.to_string()))?;
        let mut balances = self.balances_of(&utxos)?;
        balances.retain(|(_, amount)| *amount > 0);
        Ok(balances)
    }

    pub fn stats(&self) -> LedgerResult<LedgerStats> {
        let _guard = self.gate.read();
        match self.db.get_tip()? {
            Some(tip) => Ok(self.db.get_stats_at(tip.height)?.unwrap_or_default()),
            None => Ok(LedgerStats::default()),
        }
    }

    /// Most recent rewarded transactions, newest first.
    pub fn latest_nice_hashes(&self, limit: usize) -> LedgerResult<Vec<NiceHash>> {
        let _guard = self.gate.read();
        Ok(self.db.get_latest_nice_hashes(limit)?)
    }

    /// Rewarded transactions of one committed block, in block order.
    pub fn nice_hashes_at(&self, height: u64) -> LedgerResult<Vec<NiceHash>> {
        let _guard = self.gate.read();
        Ok(self.db.get_nice_hashes_at(height)?)
    }

    pub fn block_summary(&self, height: u64) -> LedgerResult<Option<BlockSummary>> {
        let _guard = self.gate.read();
        Ok(self.db.get_block_summary(height)?)
    }

    pub fn reward_entries(&self, height: u64) -> LedgerResult<Vec<RewardEntry>> {
        let _guard = self.gate.read();
        Ok(self.db.get_reward_entries(height)?)
    }
}

fn next_stats(prev: &LedgerStats, parts: &BatchParts) -> LedgerResult<LedgerStats> {
    let mut supply = prev.supply as i128;
    let mut utxo_count = prev.utxo_count as i128;
    for (entry, (_, after)) in parts.undo.iter().zip(&parts.balances) {
        supply += after.unwrap_or(0) as i128 - entry.previous.unwrap_or(0) as i128;
        utxo_count += after.is_some() as i128 - entry.previous.is_some() as i128;
    }

    let expected = prev.supply as i128 + parts.issued as i128 - parts.burned as i128;
    if supply != expected {
        return Err(LedgerError::InvalidAmount(format!(
            "block {} changes supply by {} but issued {} and burned {}",
            parts.height,
            supply - prev.supply as i128,
            format_amount(parts.issued),
            format_amount(parts.burned),
        )));
    }

    let to_u64 = |v: i128, what: &str| {
        u64::try_from(v).map_err(|_| LedgerError::InvalidAmount(format!("{what} out of range")))
    };

    Ok(LedgerStats {
        supply: to_u64(supply, "supply")?,
        utxo_count: to_u64(utxo_count, "utxo count")?,
        nice_hash_count: prev.nice_hash_count + parts.nice_hashes.len() as u64,
        max_zero_count: parts
            .nice_hashes
            .iter()
            .map(|n| n.zero_count)
            .fold(prev.max_zero_count, u8::max),
        burned: prev
            .burned
            .checked_add(parts.burned)
            .ok_or_else(|| LedgerError::InvalidAmount("burned total overflows".into()))?,
        last_height: Some(parts.height),
    })
}
