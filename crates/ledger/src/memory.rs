//! In-memory [`LedgerDatabase`], used by tests and dry runs.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use rabbits_db_types::{
    types::{
        BlockRevert, BlockSummary, BlockWrite, ChainTip, LedgerStats, NiceHash, RewardEntry,
        UndoEntry,
    },
    DbError, DbResult, LedgerDatabase,
};
use rabbits_primitives::{Amount, UtxoId};

#[derive(Debug, Default)]
struct State {
    balances: BTreeMap<UtxoId, Amount>,
    tip: Option<ChainTip>,
    blocks: BTreeMap<u64, BlockSummary>,
    stats: BTreeMap<u64, LedgerStats>,
    undo: BTreeMap<u64, Vec<UndoEntry>>,
    rewards: BTreeMap<u64, Vec<RewardEntry>>,
    nice_hashes: BTreeMap<(u64, u32), NiceHash>,
}

impl State {
    fn apply_balances(&mut self, updates: Vec<(UtxoId, Option<Amount>)>) {
        for (utxo, bal) in updates {
            match bal {
                Some(bal) => self.balances.insert(utxo, bal),
                None => self.balances.remove(&utxo),
            };
        }
    }
}

/// Keeps the whole ledger behind one mutex. Every write is a single critical
/// section, so it is as atomic as the sled store.
#[derive(Debug, Default)]
pub struct MemoryLedgerDb {
    state: Mutex<State>,
}

impl MemoryLedgerDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every nonzero balance, ordered by outpoint.
    pub fn balances(&self) -> BTreeMap<UtxoId, Amount> {
        self.state.lock().balances.clone()
    }
}

impl LedgerDatabase for MemoryLedgerDb {
    fn get_balance(&self, utxo: &UtxoId) -> DbResult<Option<Amount>> {
        Ok(self.state.lock().balances.get(utxo).copied())
    }

    fn get_tip(&self) -> DbResult<Option<ChainTip>> {
        Ok(self.state.lock().tip)
    }

    fn get_block_summary(&self, height: u64) -> DbResult<Option<BlockSummary>> {
        Ok(self.state.lock().blocks.get(&height).cloned())
    }

    fn get_stats_at(&self, height: u64) -> DbResult<Option<LedgerStats>> {
        Ok(self.state.lock().stats.get(&height).copied())
    }

    fn get_undo(&self, height: u64) -> DbResult<Option<Vec<UndoEntry>>> {
        Ok(self.state.lock().undo.get(&height).cloned())
    }

    fn get_reward_entries(&self, height: u64) -> DbResult<Vec<RewardEntry>> {
        Ok(self
            .state
            .lock()
            .rewards
            .get(&height)
            .cloned()
            .unwrap_or_default())
    }

    fn get_latest_nice_hashes(&self, limit: usize) -> DbResult<Vec<NiceHash>> {
        Ok(self
            .state
            .lock()
            .nice_hashes
            .values()
            .rev()
            .take(limit)
            .copied()
            .collect())
    }

    fn get_nice_hashes_at(&self, height: u64) -> DbResult<Vec<NiceHash>> {
        Ok(self
            .state
            .lock()
            .nice_hashes
            .range((height, 0)..=(height, u32::MAX))
            .map(|(_, n)| *n)
            .collect())
    }

    fn put_block(&self, write: BlockWrite) -> DbResult<()> {
        let mut state = self.state.lock();
        let height = write.tip.height;
        if let Some(cur) = state.tip {
            if height != cur.height + 1 {
                return Err(DbError::OooInsert("blocks", height));
            }
        }

        state.apply_balances(write.balances);
        state.blocks.insert(height, write.summary);
        state.stats.insert(height, write.stats);
        state.undo.insert(height, write.undo);
        if !write.rewards.is_empty() {
            state.rewards.insert(height, write.rewards);
        }
        for nice in write.nice_hashes {
            state.nice_hashes.insert((height, nice.tx_index), nice);
        }
        state.tip = Some(write.tip);

        if let Some(below) = write.prune_undo_below {
            state.undo = state.undo.split_off(&below);
        }
        Ok(())
    }

    fn revert_block(&self, revert: BlockRevert) -> DbResult<()> {
        let mut state = self.state.lock();
        let height = revert.height;
        match state.tip {
            None => return Err(DbError::NothingCommitted),
            Some(cur) if cur.height != height => {
                return Err(DbError::RevertNotAtTip(height, cur.height))
            }
            Some(_) => {}
        }

        state.apply_balances(revert.balances);
        state.blocks.remove(&height);
        state.stats.remove(&height);
        state.undo.remove(&height);
        state.rewards.remove(&height);
        state
            .nice_hashes
            .retain(|(nice_height, _), _| *nice_height != height);
        state.tip = revert.new_tip;
        Ok(())
    }

    fn flush(&self) -> DbResult<()> {
        Ok(())
    }
}
