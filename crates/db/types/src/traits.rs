//! Trait definitions for the low level ledger database.

use rabbits_primitives::{Amount, UtxoId};

use crate::{
    types::{
        BlockRevert, BlockSummary, BlockWrite, ChainTip, LedgerStats, NiceHash, RewardEntry,
        UndoEntry,
    },
    DbResult,
};

/// Database interface for the balance ledger.
///
/// Writes are only checked against the current tip. Ledger semantics live in
/// the `Ledger` type that wraps an implementation, so every write should go
/// through it.
pub trait LedgerDatabase: Send + Sync + 'static {
    /// Gets the balance attached to a UTXO, if it has one.
    fn get_balance(&self, utxo: &UtxoId) -> DbResult<Option<Amount>>;

    /// Gets the last committed block.
    fn get_tip(&self) -> DbResult<Option<ChainTip>>;

    fn get_block_summary(&self, height: u64) -> DbResult<Option<BlockSummary>>;

    /// Gets the stats as of `height`, if that block is committed.
    fn get_stats_at(&self, height: u64) -> DbResult<Option<LedgerStats>>;

    /// Gets the undo journal of a block that is still within the reorg window.
    fn get_undo(&self, height: u64) -> DbResult<Option<Vec<UndoEntry>>>;

    /// Gets the reward credits made by a block, in block order.
    fn get_reward_entries(&self, height: u64) -> DbResult<Vec<RewardEntry>>;

    /// Gets up to `limit` rewarded transactions, newest first.
    fn get_latest_nice_hashes(&self, limit: usize) -> DbResult<Vec<NiceHash>>;

    /// Gets the rewarded transactions of one block, in block order.
    fn get_nice_hashes_at(&self, height: u64) -> DbResult<Vec<NiceHash>>;

    /// Atomically applies a block. Fails with [`DbError::OooInsert`] unless
    /// the block extends the current tip.
    ///
    /// [`DbError::OooInsert`]: crate::DbError::OooInsert
    fn put_block(&self, write: BlockWrite) -> DbResult<()>;

    /// Atomically rolls back the tip block.
    fn revert_block(&self, revert: BlockRevert) -> DbResult<()>;

    /// Persists buffered writes.
    fn flush(&self) -> DbResult<()>;
}
