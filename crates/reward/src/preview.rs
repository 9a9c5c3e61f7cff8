//! Reward table for presentation layers.

use rabbits_params::RewardParams;
use rabbits_primitives::Amount;

use crate::calculator::calculate_reward;

/// One row of the reward table.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RewardTier {
    pub zero_count: u8,
    /// Zeros short of the block best.
    pub deficit: u8,
    pub reward: Amount,
}

/// Rewards for every eligible zero count when the block best scored
/// `max_zero_count`, best tier first.
pub fn reward_preview(params: &RewardParams, max_zero_count: u8) -> Vec<RewardTier> {
    if max_zero_count < params.min_zero_count {
        return Vec::new();
    }

    (params.min_zero_count..=max_zero_count)
        .rev()
        .map(|zero_count| RewardTier {
            zero_count,
            deficit: max_zero_count - zero_count,
            reward: calculate_reward(zero_count, max_zero_count, params),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_rows() {
        let rows = reward_preview(&RewardParams::MAINNET, 7);
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            RewardTier {
                zero_count: 7,
                deficit: 0,
                reward: 100_000_000
            }
        );
        assert_eq!(rows[1].reward, 6_250_000);
        assert_eq!(rows[2].deficit, 2);
        assert_eq!(rows[2].reward, 390_625);
    }

    #[test]
    fn test_preview_below_threshold_is_empty() {
        assert!(reward_preview(&RewardParams::MAINNET, 4).is_empty());
    }
}
