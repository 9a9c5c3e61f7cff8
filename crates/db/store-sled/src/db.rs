use rabbits_db_types::{
    types::{
        BlockRevert, BlockSummary, BlockWrite, ChainTip, LedgerStats, NiceHash, RewardEntry,
        UndoEntry,
    },
    DbError, DbResult, LedgerDatabase,
};
use rabbits_primitives::{Amount, UtxoId};
use sled::{
    transaction::{abort, ConflictableTransactionError, TransactionalTree},
    IVec, Transactional, Tree,
};
use tracing::*;

use crate::{
    schemas::{
        height_key, indexed_key, BALANCES_TREE, BLOCKS_TREE, META_TREE, NICE_HASHES_TREE,
        REWARDS_TREE, STATS_TREE, TIP_KEY, UNDO_TREE,
    },
    utils::{decode, decode_amount, encode, to_db_error, tx_error},
};

/// Sled-backed [`LedgerDatabase`].
#[derive(Debug)]
pub struct LedgerDBSled {
    db: sled::Db,
    balances: Tree,
    meta: Tree,
    blocks: Tree,
    stats: Tree,
    undo: Tree,
    rewards: Tree,
    nice_hashes: Tree,
}

type EncodedKv = (Vec<u8>, Vec<u8>);

fn read_tip(
    meta: &TransactionalTree,
) -> Result<Option<ChainTip>, ConflictableTransactionError<DbError>> {
    match meta.get(TIP_KEY)? {
        Some(raw) => decode(&raw)
            .map(Some)
            .map_err(ConflictableTransactionError::Abort),
        None => Ok(None),
    }
}

fn encode_balances(updates: &[(UtxoId, Option<Amount>)]) -> Vec<([u8; 36], Option<[u8; 8]>)> {
    updates
        .iter()
        .map(|(utxo, bal)| (utxo.to_key_bytes(), bal.map(Amount::to_be_bytes)))
        .collect()
}

impl LedgerDBSled {
    pub fn new(db: sled::Db) -> DbResult<Self> {
        let open = |name: &str| db.open_tree(name).map_err(to_db_error);
        Ok(Self {
            balances: open(BALANCES_TREE)?,
            meta: open(META_TREE)?,
            blocks: open(BLOCKS_TREE)?,
            stats: open(STATS_TREE)?,
            undo: open(UNDO_TREE)?,
            rewards: open(REWARDS_TREE)?,
            nice_hashes: open(NICE_HASHES_TREE)?,
            db,
        })
    }

    fn keys_at(tree: &Tree, height: u64) -> DbResult<Vec<IVec>> {
        tree.scan_prefix(height_key(height))
            .keys()
            .collect::<Result<Vec<_>, _>>()
            .map_err(to_db_error)
    }

    fn values_at<T: borsh::BorshDeserialize>(tree: &Tree, height: u64) -> DbResult<Vec<T>> {
        let mut out = Vec::new();
        for entry in tree.scan_prefix(height_key(height)).values() {
            out.push(decode(&entry.map_err(to_db_error)?)?);
        }
        Ok(out)
    }

    fn prune_undo_below(&self, height: u64) -> DbResult<()> {
        let mut pruned = 0usize;
        for key in self.undo.range(..height_key(height)).keys() {
            self.undo.remove(key.map_err(to_db_error)?).map_err(to_db_error)?;
            pruned += 1;
        }
        if pruned > 0 {
            trace!(%height, %pruned, "pruned undo journals");
        }
        Ok(())
    }
}

impl LedgerDatabase for LedgerDBSled {
    fn get_balance(&self, utxo: &UtxoId) -> DbResult<Option<Amount>> {
        self.balances
            .get(utxo.to_key_bytes())
            .map_err(to_db_error)?
            .map(|raw| decode_amount(&raw))
            .transpose()
    }

    fn get_tip(&self) -> DbResult<Option<ChainTip>> {
        self.meta
            .get(TIP_KEY)
            .map_err(to_db_error)?
            .map(|raw| decode(&raw))
            .transpose()
    }

    fn get_block_summary(&self, height: u64) -> DbResult<Option<BlockSummary>> {
        self.blocks
            .get(height_key(height))
            .map_err(to_db_error)?
            .map(|raw| decode(&raw))
            .transpose()
    }

    fn get_stats_at(&self, height: u64) -> DbResult<Option<LedgerStats>> {
        self.stats
            .get(height_key(height))
            .map_err(to_db_error)?
            .map(|raw| decode(&raw))
            .transpose()
    }

    fn get_undo(&self, height: u64) -> DbResult<Option<Vec<UndoEntry>>> {
        self.undo
            .get(height_key(height))
            .map_err(to_db_error)?
            .map(|raw| decode(&raw))
            .transpose()
    }

    fn get_reward_entries(&self, height: u64) -> DbResult<Vec<RewardEntry>> {
        Self::values_at(&self.rewards, height)
    }

    fn get_latest_nice_hashes(&self, limit: usize) -> DbResult<Vec<NiceHash>> {
        let mut out = Vec::with_capacity(limit.min(64));
        for entry in self.nice_hashes.iter().values().rev().take(limit) {
            out.push(decode(&entry.map_err(to_db_error)?)?);
        }
        Ok(out)
    }

    fn get_nice_hashes_at(&self, height: u64) -> DbResult<Vec<NiceHash>> {
        Self::values_at(&self.nice_hashes, height)
    }

    fn put_block(&self, write: BlockWrite) -> DbResult<()> {
        let height = write.tip.height;
        let hkey = height_key(height);

        let tip = encode(&write.tip)?;
        let summary = encode(&write.summary)?;
        let stats = encode(&write.stats)?;
        let undo = encode(&write.undo)?;
        let balances = encode_balances(&write.balances);
        let rewards = write
            .rewards
            .iter()
            .enumerate()
            .map(|(i, r)| Ok((indexed_key(height, i as u32).to_vec(), encode(r)?)))
            .collect::<DbResult<Vec<EncodedKv>>>()?;
        let nice_hashes = write
            .nice_hashes
            .iter()
            .map(|n| Ok((indexed_key(height, n.tx_index).to_vec(), encode(n)?)))
            .collect::<DbResult<Vec<EncodedKv>>>()?;

        (
            &self.balances,
            &self.meta,
            &self.blocks,
            &self.stats,
            &self.undo,
            &self.rewards,
            &self.nice_hashes,
        )
            .transaction(|(bt, mt, blt, st, ut, rt, nt)| {
                if let Some(cur) = read_tip(mt)? {
                    if height != cur.height + 1 {
                        return abort(DbError::OooInsert("blocks", height));
                    }
                }

                for (key, bal) in &balances {
                    match bal {
                        Some(bal) => bt.insert(&key[..], &bal[..])?,
                        None => bt.remove(&key[..])?,
                    };
                }
                for (key, value) in &rewards {
                    rt.insert(key.as_slice(), value.as_slice())?;
                }
                for (key, value) in &nice_hashes {
                    nt.insert(key.as_slice(), value.as_slice())?;
                }

                blt.insert(&hkey[..], summary.as_slice())?;
                st.insert(&hkey[..], stats.as_slice())?;
                ut.insert(&hkey[..], undo.as_slice())?;
                mt.insert(TIP_KEY, tip.as_slice())?;
                Ok(())
            })
            .map_err(tx_error)?;

        if let Some(below) = write.prune_undo_below {
            self.prune_undo_below(below)?;
        }
        Ok(())
    }

    fn revert_block(&self, revert: BlockRevert) -> DbResult<()> {
        let height = revert.height;
        let hkey = height_key(height);

        let new_tip = revert.new_tip.as_ref().map(encode).transpose()?;
        let balances = encode_balances(&revert.balances);
        let reward_keys = Self::keys_at(&self.rewards, height)?;
        let nice_keys = Self::keys_at(&self.nice_hashes, height)?;

        (
            &self.balances,
            &self.meta,
            &self.blocks,
            &self.stats,
            &self.undo,
            &self.rewards,
            &self.nice_hashes,
        )
            .transaction(|(bt, mt, blt, st, ut, rt, nt)| {
                match read_tip(mt)? {
                    None => return abort(DbError::NothingCommitted),
                    Some(cur) if cur.height != height => {
                        return abort(DbError::RevertNotAtTip(height, cur.height))
                    }
                    Some(_) => {}
                }

                for (key, bal) in &balances {
                    match bal {
                        Some(bal) => bt.insert(&key[..], &bal[..])?,
                        None => bt.remove(&key[..])?,
                    };
                }
                for key in &reward_keys {
                    rt.remove(&key[..])?;
                }
                for key in &nice_keys {
                    nt.remove(&key[..])?;
                }

                blt.remove(&hkey[..])?;
                st.remove(&hkey[..])?;
                ut.remove(&hkey[..])?;
                match &new_tip {
                    Some(tip) => mt.insert(TIP_KEY, tip.as_slice())?,
                    None => mt.remove(TIP_KEY)?,
                };
                Ok(())
            })
            .map_err(tx_error)
    }

    fn flush(&self) -> DbResult<()> {
        let bytes = self.db.flush().map_err(to_db_error)?;
        debug!(%bytes, "flushed ledger database");
        Ok(())
    }
}
