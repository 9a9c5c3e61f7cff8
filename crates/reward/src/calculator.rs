//! Reward tiers relative to the best transaction of a block.

use rabbits_params::RewardParams;
use rabbits_primitives::Amount;

/// Each missing zero relative to the block best divides the reward by this.
pub const DECAY_BASE: u128 = 16;

/// Computes `floor(base_reward / 16^(max_zero_count - zero_count))`.
///
/// Returns 0 below the eligibility threshold. The division happens once, on
/// the full-precision base, so tiers never accumulate rounding error.
pub fn calculate_reward(zero_count: u8, max_zero_count: u8, params: &RewardParams) -> Amount {
    if zero_count < params.min_zero_count {
        return 0;
    }

    let deficit = max_zero_count.saturating_sub(zero_count);
    match DECAY_BASE.checked_pow(deficit as u32) {
        Some(divisor) => (params.base_reward as u128 / divisor) as Amount,
        None => 0,
    }
}

/// Highest zero count among eligible scores, if any score is eligible.
pub fn max_eligible_zero_count(
    scores: impl IntoIterator<Item = u8>,
    params: &RewardParams,
) -> Option<u8> {
    scores
        .into_iter()
        .filter(|zc| *zc >= params.min_zero_count)
        .max()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn params() -> RewardParams {
        RewardParams::MAINNET
    }

    #[test]
    fn test_worked_example_tiers() {
        let p = params();
        assert_eq!(calculate_reward(7, 7, &p), 100_000_000);
        assert_eq!(calculate_reward(6, 7, &p), 6_250_000);
        assert_eq!(calculate_reward(5, 7, &p), 390_625);
    }

    #[test]
    fn test_below_threshold_earns_nothing() {
        assert_eq!(calculate_reward(4, 4, &params()), 0);
        assert_eq!(calculate_reward(0, 9, &params()), 0);
    }

    #[test]
    fn test_truncates_only_once() {
        // 10^8 / 16^3 = 24414.0625
        assert_eq!(calculate_reward(5, 8, &params()), 24_414);
        // 10^8 / 16^7 = 0.37..
        assert_eq!(calculate_reward(5, 12, &params()), 0);
    }

    #[test]
    fn test_huge_deficit_is_zero() {
        assert_eq!(calculate_reward(5, 64, &params()), 0);
    }

    #[test]
    fn test_max_eligible_zero_count() {
        let p = params();
        assert_eq!(max_eligible_zero_count([1, 4, 3], &p), None);
        assert_eq!(max_eligible_zero_count([5, 9, 2], &p), Some(9));
        assert_eq!(max_eligible_zero_count([], &p), None);
    }

    proptest! {
        #[test]
        fn proptest_reward_monotonic_in_zero_count(max in 5u8..=64, a in 5u8..=64, b in 5u8..=64) {
            prop_assume!(a <= max && b <= max);
            let p = params();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(calculate_reward(lo, max, &p) <= calculate_reward(hi, max, &p));
            prop_assert!(calculate_reward(hi, max, &p) <= p.base_reward);
        }
    }
}
