//! Records persisted by the ledger.

use bitcoin::{BlockHash, Txid};
use borsh::{BorshDeserialize, BorshSerialize};
use rabbits_primitives::{Amount, Buf32, UtxoId};

/// Highest block whose effects are fully committed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct ChainTip {
    pub height: u64,
    pub blkid: Buf32,
}

impl ChainTip {
    pub fn new(height: u64, block_hash: BlockHash) -> Self {
        Self {
            height,
            blkid: block_hash.into(),
        }
    }

    pub fn block_hash(&self) -> BlockHash {
        self.blkid.to_block_hash()
    }
}

/// What a committed block did to the ledger.
#[derive(Clone, Debug, Default, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct BlockSummary {
    pub height: u64,
    pub blkid: Buf32,
    /// `None` if no transaction in the block was eligible.
    pub max_zero_count: Option<u8>,
    pub nicest_txid: Option<Buf32>,
    /// Newly issued subunits.
    pub total_reward: Amount,
    pub rewarded_tx_count: u32,
    /// Number of outputs that received a reward.
    pub credits: u32,
    /// Subunits destroyed by spends without a spendable output.
    pub burned: Amount,
    /// Spent outpoints the ledger had no balance for.
    pub unknown_spends: u32,
}

impl BlockSummary {
    pub fn nicest_txid(&self) -> Option<Txid> {
        self.nicest_txid.map(Buf32::to_txid)
    }
}

/// A reward credited to one output.
#[derive(Copy, Clone, Debug, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct RewardEntry {
    pub utxo: UtxoId,
    pub amount: Amount,
    pub height: u64,
    pub zero_count: u8,
}

/// A rewarded transaction.
#[derive(Copy, Clone, Debug, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct NiceHash {
    pub height: u64,
    /// Position within the block.
    pub tx_index: u32,
    pub txid: Buf32,
    pub zero_count: u8,
    pub reward: Amount,
}

impl NiceHash {
    pub fn txid(&self) -> Txid {
        self.txid.to_txid()
    }
}

/// Balance of a UTXO before a block touched it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct UndoEntry {
    pub utxo: UtxoId,
    pub previous: Option<Amount>,
}

/// Aggregate ledger state as of a committed height.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct LedgerStats {
    /// Sum of all balances.
    pub supply: Amount,
    /// UTXOs with a nonzero balance.
    pub utxo_count: u64,
    pub nice_hash_count: u64,
    pub max_zero_count: u8,
    pub burned: Amount,
    pub last_height: Option<u64>,
}

/// A new balance for a UTXO. `None` deletes the entry.
pub type BalanceUpdate = (UtxoId, Option<Amount>);

/// Everything written when a block is committed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BlockWrite {
    pub tip: ChainTip,
    pub summary: BlockSummary,
    /// Stats after the block.
    pub stats: LedgerStats,
    pub balances: Vec<BalanceUpdate>,
    pub undo: Vec<UndoEntry>,
    pub rewards: Vec<RewardEntry>,
    pub nice_hashes: Vec<NiceHash>,
    /// Undo journals below this height may be dropped.
    pub prune_undo_below: Option<u64>,
}

/// Everything written when the tip block is rolled back.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BlockRevert {
    pub height: u64,
    /// Restored balances, taken from the block's undo journal.
    pub balances: Vec<BalanceUpdate>,
    /// `None` once the first committed block is reverted.
    pub new_tip: Option<ChainTip>,
}
