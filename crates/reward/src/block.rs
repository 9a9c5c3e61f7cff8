//! Per-block reward attribution.

use bitcoin::Txid;
use rabbits_params::RewardParams;
use rabbits_primitives::{Amount, ScanBlock, ScanTx};

use crate::{
    calculator::{calculate_reward, max_eligible_zero_count},
    distribution::{distribute, OutputShare},
    errors::RewardError,
    scorer::txid_zero_count,
};

/// Reward attributed to one eligible transaction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TxReward {
    /// Position of the transaction in its block.
    pub tx_index: usize,
    pub txid: Txid,
    pub zero_count: u8,
    /// Nominal reward before distribution.
    pub reward: Amount,
    /// Per-output credits. Empty if the transaction has no spendable output.
    pub shares: Vec<OutputShare>,
}

impl TxReward {
    /// Amount actually credited to outputs.
    pub fn issued(&self) -> Amount {
        if self.shares.is_empty() {
            0
        } else {
            self.reward
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BlockRewards {
    pub height: u64,
    /// `None` when the block had no eligible transaction.
    pub max_zero_count: Option<u8>,
    /// Eligible transactions in block order.
    pub rewards: Vec<TxReward>,
}

impl BlockRewards {
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    pub fn total_issued(&self) -> Result<Amount, RewardError> {
        self.rewards.iter().try_fold(0u64, |acc, r| {
            acc.checked_add(r.issued()).ok_or_else(|| {
                RewardError::InvalidAmount(format!("block {} issuance overflows", self.height))
            })
        })
    }

    /// The best transaction of the block, first in block order on ties.
    pub fn nicest(&self) -> Option<&TxReward> {
        self.rewards
            .iter()
            .rev()
            .max_by_key(|r| r.zero_count)
    }

    pub fn for_tx(&self, tx_index: usize) -> Option<&TxReward> {
        self.rewards
            .binary_search_by_key(&tx_index, |r| r.tx_index)
            .ok()
            .map(|pos| &self.rewards[pos])
    }
}

fn is_candidate(tx: &ScanTx) -> bool {
    !tx.is_coinbase
}

/// Scores every non-coinbase transaction in `block` and attributes rewards
/// relative to the best eligible one.
pub fn compute_block_rewards(
    block: &ScanBlock,
    params: &RewardParams,
) -> Result<BlockRewards, RewardError> {
    let scored: Vec<(usize, &ScanTx, u8)> = block
        .transactions
        .iter()
        .enumerate()
        .filter(|(_, tx)| is_candidate(tx))
        .map(|(idx, tx)| (idx, tx, txid_zero_count(&tx.txid)))
        .filter(|(_, _, zc)| *zc >= params.min_zero_count)
        .collect();

    let Some(max_zero_count) = max_eligible_zero_count(scored.iter().map(|s| s.2), params) else {
        return Ok(BlockRewards {
            height: block.height,
            ..Default::default()
        });
    };

    let mut rewards = Vec::with_capacity(scored.len());
    for (tx_index, tx, zero_count) in scored {
        let reward = calculate_reward(zero_count, max_zero_count, params);
        let shares = distribute(reward, &tx.outputs);

        let credited = shares
            .iter()
            .try_fold(0u64, |acc, s| acc.checked_add(s.amount));
        if !shares.is_empty() && credited != Some(reward) {
            return Err(RewardError::InvalidAmount(format!(
                "shares of {} do not add up to {reward}",
                tx.txid
            )));
        }

        rewards.push(TxReward {
            tx_index,
            txid: tx.txid,
            zero_count,
            reward,
            shares,
        });
    }

    Ok(BlockRewards {
        height: block.height,
        max_zero_count: Some(max_zero_count),
        rewards,
    })
}

#[cfg(test)]
mod tests {
    use bitcoin::{hashes::Hash, BlockHash};
    use proptest::prelude::*;
    use rabbits_primitives::{ScanOutput, UtxoId};

    use super::*;

    /// Builds a txid whose displayed hex starts with exactly `zeros` zeros.
    fn txid_with_zeros(zeros: u8, salt: u8) -> Txid {
        let mut bytes = [0xffu8; 32];
        bytes[0] = salt;
        let full = (zeros / 2) as usize;
        for b in bytes.iter_mut().rev().take(full) {
            *b = 0;
        }
        if zeros % 2 == 1 {
            bytes[31 - full] = 0x0f;
        }
        Txid::from_byte_array(bytes)
    }

    fn spend(txid: Txid, outputs: Vec<ScanOutput>) -> ScanTx {
        ScanTx::new(txid, vec![UtxoId::new(Txid::all_zeros(), 0)], outputs)
    }

    fn block(txs: Vec<ScanTx>) -> ScanBlock {
        let mut transactions = vec![ScanTx::coinbase(
            txid_with_zeros(9, 0xaa),
            vec![ScanOutput::spendable(0, 50)],
        )];
        transactions.extend(txs);
        ScanBlock {
            height: 100,
            block_hash: BlockHash::all_zeros(),
            prev_block_hash: BlockHash::all_zeros(),
            transactions,
        }
    }

    #[test]
    fn test_helper_builds_expected_scores() {
        for zc in 0..=20 {
            assert_eq!(txid_zero_count(&txid_with_zeros(zc, 1)), zc);
        }
    }

    #[test]
    fn test_worked_example() {
        let blk = block(vec![
            spend(txid_with_zeros(7, 1), vec![ScanOutput::spendable(0, 10)]),
            spend(txid_with_zeros(6, 2), vec![ScanOutput::spendable(0, 10)]),
            spend(txid_with_zeros(5, 3), vec![ScanOutput::spendable(0, 10)]),
            spend(txid_with_zeros(4, 4), vec![ScanOutput::spendable(0, 10)]),
        ]);
        let rewards = compute_block_rewards(&blk, &RewardParams::MAINNET).unwrap();

        assert_eq!(rewards.max_zero_count, Some(7));
        let amounts: Vec<_> = rewards.rewards.iter().map(|r| r.reward).collect();
        assert_eq!(amounts, vec![100_000_000, 6_250_000, 390_625]);
        assert_eq!(rewards.total_issued().unwrap(), 106_640_625);
        assert_eq!(rewards.nicest().unwrap().tx_index, 1);
        assert!(rewards.for_tx(4).is_none());
        assert_eq!(rewards.for_tx(3).unwrap().zero_count, 5);
    }

    #[test]
    fn test_coinbase_never_rewarded() {
        // Coinbase scores 9, spending tx scores 5: the max must ignore the coinbase.
        let blk = block(vec![spend(
            txid_with_zeros(5, 1),
            vec![ScanOutput::spendable(0, 10)],
        )]);
        let rewards = compute_block_rewards(&blk, &RewardParams::MAINNET).unwrap();
        assert_eq!(rewards.max_zero_count, Some(5));
        assert_eq!(rewards.rewards.len(), 1);
        assert_eq!(rewards.rewards[0].tx_index, 1);
        assert_eq!(rewards.rewards[0].reward, 100_000_000);
    }

    #[test]
    fn test_no_eligible_transaction() {
        let blk = block(vec![spend(
            txid_with_zeros(4, 1),
            vec![ScanOutput::spendable(0, 10)],
        )]);
        let rewards = compute_block_rewards(&blk, &RewardParams::MAINNET).unwrap();
        assert!(rewards.is_empty());
        assert_eq!(rewards.max_zero_count, None);
        assert_eq!(rewards.total_issued().unwrap(), 0);
        assert!(rewards.nicest().is_none());
    }

    #[test]
    fn test_op_return_only_tx_not_issued() {
        let blk = block(vec![spend(
            txid_with_zeros(6, 1),
            vec![ScanOutput::op_return(0)],
        )]);
        let rewards = compute_block_rewards(&blk, &RewardParams::MAINNET).unwrap();
        assert_eq!(rewards.rewards[0].reward, 100_000_000);
        assert_eq!(rewards.rewards[0].issued(), 0);
        assert_eq!(rewards.total_issued().unwrap(), 0);
    }

    #[test]
    fn test_multi_output_distribution() {
        let outputs = [500, 500, 500, 2000]
            .iter()
            .enumerate()
            .map(|(i, v)| ScanOutput::spendable(i as u32, *v))
            .collect();
        let blk = block(vec![spend(txid_with_zeros(8, 1), outputs)]);
        let rewards = compute_block_rewards(&blk, &RewardParams::MAINNET).unwrap();
        let shares: Vec<_> = rewards.rewards[0].shares.iter().map(|s| s.amount).collect();
        assert_eq!(shares, vec![33_333_334, 33_333_333, 33_333_333]);
    }

    proptest! {
        #[test]
        fn proptest_rewards_independent_of_order(
            scores in prop::collection::vec(0u8..=12, 1..8),
            seed in any::<u64>(),
        ) {
            let txs: Vec<ScanTx> = scores
                .iter()
                .enumerate()
                .map(|(i, zc)| spend(txid_with_zeros(*zc, i as u8), vec![ScanOutput::spendable(0, 1)]))
                .collect();

            let mut shuffled = txs.clone();
            let len = shuffled.len();
            shuffled.rotate_left((seed as usize) % len);

            let by_txid = |blk: &ScanBlock| {
                let mut v: Vec<(Txid, Amount)> = compute_block_rewards(blk, &RewardParams::MAINNET)
                    .unwrap()
                    .rewards
                    .iter()
                    .map(|r| (r.txid, r.reward))
                    .collect();
                v.sort();
                v
            };

            prop_assert_eq!(by_txid(&block(txs)), by_txid(&block(shuffled)));
        }
    }
}
