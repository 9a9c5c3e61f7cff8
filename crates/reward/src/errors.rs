use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RewardError {
    /// Reward or share arithmetic overflowed or failed to conserve value.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}
