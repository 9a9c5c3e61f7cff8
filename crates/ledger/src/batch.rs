use std::collections::HashMap;

use bitcoin::{BlockHash, Txid};
use rabbits_db_types::{
    types::{NiceHash, RewardEntry, UndoEntry},
    LedgerDatabase,
};
use rabbits_primitives::{Amount, ScanTx, UtxoId};
use rabbits_reward::{distribute, TxReward};
use tracing::*;

use crate::errors::{LedgerError, LedgerResult};

/// Result of moving the balances of spent outpoints onto a transaction.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Transfer {
    /// Sum of the balances taken from the spent outpoints.
    pub moved: Amount,
    /// Part of `moved` destroyed because no output could receive it.
    pub burned: Amount,
    /// Spent outpoints that carried no balance.
    pub unknown_spends: u32,
}

/// Staged effects of one block.
///
/// Nothing is visible to readers of the ledger until the batch is passed to
/// [`Ledger::commit`](crate::Ledger::commit). Dropping a batch discards it.
#[derive(Debug)]
pub struct LedgerBatch<'a, D> {
    db: &'a D,
    height: u64,
    block_hash: BlockHash,

    /// Latest balance of every touched outpoint. `None` is a removal.
    staged: HashMap<UtxoId, Option<Amount>>,
    /// Balance before the block, one entry per touched outpoint.
    undo: Vec<UndoEntry>,

    rewards: Vec<RewardEntry>,
    nice_hashes: Vec<NiceHash>,
    issued: Amount,
    burned: Amount,
    unknown_spends: u32,
    max_zero_count: Option<u8>,
    nicest_txid: Option<Txid>,
}

impl<'a, D: LedgerDatabase> LedgerBatch<'a, D> {
    pub(crate) fn new(db: &'a D, height: u64, block_hash: BlockHash) -> Self {
        Self {
            db,
            height,
            block_hash,
            staged: HashMap::new(),
            undo: Vec::new(),
            rewards: Vec::new(),
            nice_hashes: Vec::new(),
            issued: 0,
            burned: 0,
            unknown_spends: 0,
            max_zero_count: None,
            nicest_txid: None,
        }
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn block_hash(&self) -> BlockHash {
        self.block_hash
    }

    fn current(&self, utxo: &UtxoId) -> LedgerResult<Option<Amount>> {
        match self.staged.get(utxo) {
            Some(staged) => Ok(*staged),
            None => Ok(self.db.get_balance(utxo)?),
        }
    }

    fn set(&mut self, utxo: UtxoId, previous: Option<Amount>, value: Option<Amount>) {
        if !self.staged.contains_key(&utxo) {
            self.undo.push(UndoEntry { utxo, previous });
        }
        self.staged.insert(utxo, value);
    }

    /// Balance as of this batch, zero if the outpoint carries nothing.
    pub fn balance_of(&self, utxo: &UtxoId) -> LedgerResult<Amount> {
        Ok(self.current(utxo)?.unwrap_or(0))
    }

    fn add(&mut self, utxo: UtxoId, amount: Amount) -> LedgerResult<()> {
        if amount == 0 {
            return Ok(());
        }

        let previous = self.current(&utxo)?;
        let balance = previous.unwrap_or(0).checked_add(amount).ok_or_else(|| {
            LedgerError::InvalidAmount(format!("balance of {utxo} overflows"))
        })?;
        self.set(utxo, previous, Some(balance));
        Ok(())
    }

    fn add_issued(&mut self, amount: Amount) -> LedgerResult<()> {
        self.issued = self
            .issued
            .checked_add(amount)
            .ok_or_else(|| LedgerError::InvalidAmount("block issuance overflows".into()))?;
        Ok(())
    }

    /// Issues `amount` new tokens to `utxo`. Crediting zero is a no-op.
    pub fn credit(&mut self, utxo: UtxoId, amount: Amount) -> LedgerResult<()> {
        self.add(utxo, amount)?;
        self.add_issued(amount)
    }

    /// Removes the balances of `spent` and distributes their sum across the
    /// outputs of `spending_tx`.
    ///
    /// Outpoints without a balance contribute nothing. If the transaction has
    /// no spendable output the sum is burned.
    pub fn transfer_on_spend(
        &mut self,
        spent: &[UtxoId],
        spending_tx: &ScanTx,
    ) -> LedgerResult<Transfer> {
        let mut transfer = Transfer::default();

        for utxo in spent {
            match self.current(utxo)? {
                Some(balance) => {
                    transfer.moved = transfer.moved.checked_add(balance).ok_or_else(|| {
                        LedgerError::InvalidAmount(format!(
                            "inputs of {} overflow",
                            spending_tx.txid
                        ))
                    })?;
                    self.set(*utxo, Some(balance), None);
                }
                None => {
                    transfer.unknown_spends += 1;
                    trace!(%utxo, txid = %spending_tx.txid, "spent outpoint has no balance");
                }
            }
        }
        self.unknown_spends += transfer.unknown_spends;

        if transfer.moved == 0 {
            return Ok(transfer);
        }

        let shares = distribute(transfer.moved, &spending_tx.outputs);
        if shares.is_empty() {
            transfer.burned = transfer.moved;
            self.burned = self
                .burned
                .checked_add(transfer.burned)
                .ok_or_else(|| LedgerError::InvalidAmount("burned amount overflows".into()))?;
            debug!(txid = %spending_tx.txid, amount = %transfer.burned, "tokens burned");
            return Ok(transfer);
        }

        let mut credited: Amount = 0;
        for share in shares {
            self.add(spending_tx.utxo(share.vout), share.amount)?;
            credited += share.amount;
        }
        if credited != transfer.moved {
            return Err(LedgerError::InvalidAmount(format!(
                "transfer through {} moved {} but credited {credited}",
                spending_tx.txid, transfer.moved
            )));
        }

        Ok(transfer)
    }

    /// Credits the shares of a reward and records the transaction as a nice
    /// hash if anything was issued.
    pub fn credit_reward(&mut self, reward: &TxReward) -> LedgerResult<()> {
        if self.max_zero_count.map_or(true, |max| reward.zero_count > max) {
            self.max_zero_count = Some(reward.zero_count);
            self.nicest_txid = Some(reward.txid);
        }

        let issued = reward.issued();
        if issued == 0 {
            return Ok(());
        }

        for share in reward.shares.iter().filter(|s| s.amount > 0) {
            let utxo = UtxoId::new(reward.txid, share.vout);
            self.add(utxo, share.amount)?;
            self.rewards.push(RewardEntry {
                utxo,
                amount: share.amount,
                height: self.height,
                zero_count: reward.zero_count,
            });
        }

        self.add_issued(issued)?;
        self.nice_hashes.push(NiceHash {
            height: self.height,
            tx_index: reward.tx_index as u32,
            txid: reward.txid.into(),
            zero_count: reward.zero_count,
            reward: issued,
        });
        Ok(())
    }

    pub(crate) fn into_parts(self) -> BatchParts {
        // Outpoints created and spent within the block never existed outside it.
        let mut undo = Vec::with_capacity(self.undo.len());
        let mut balances = Vec::with_capacity(self.undo.len());
        for entry in self.undo {
            let after = self.staged.get(&entry.utxo).copied().flatten();
            if after != entry.previous {
                balances.push((entry.utxo, after));
                undo.push(entry);
            }
        }

        BatchParts {
            height: self.height,
            block_hash: self.block_hash,
            balances,
            undo,
            rewards: self.rewards,
            nice_hashes: self.nice_hashes,
            issued: self.issued,
            burned: self.burned,
            unknown_spends: self.unknown_spends,
            max_zero_count: self.max_zero_count,
            nicest_txid: self.nicest_txid,
        }
    }
}

#[derive(Debug)]
pub(crate) struct BatchParts {
    pub(crate) height: u64,
    pub(crate) block_hash: BlockHash,
    pub(crate) balances: Vec<(UtxoId, Option<Amount>)>,
    pub(crate) undo: Vec<UndoEntry>,
    pub(crate) rewards: Vec<RewardEntry>,
    pub(crate) nice_hashes: Vec<NiceHash>,
    pub(crate) issued: Amount,
    pub(crate) burned: Amount,
    pub(crate) unknown_spends: u32,
    pub(crate) max_zero_count: Option<u8>,
    pub(crate) nicest_txid: Option<Txid>,
}
