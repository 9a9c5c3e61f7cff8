//! Reward attribution: txid scoring, per-block reward tiers and distribution
//! of a reward across transaction outputs.

pub mod block;
pub mod calculator;
pub mod distribution;
pub mod errors;
pub mod preview;
pub mod scorer;

pub use block::{compute_block_rewards, BlockRewards, TxReward};
pub use calculator::calculate_reward;
pub use distribution::{distribute, OutputShare};
pub use errors::RewardError;
pub use preview::{reward_preview, RewardTier};
pub use scorer::{leading_zero_count, txid_zero_count};
