use rabbits_ledger::LedgerError;
use rabbits_reward::RewardError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanError {
    /// Block data failed validation. The scan stops before the block.
    #[error("malformed block at height {height}: {reason}")]
    MalformedBlock { height: u64, reason: String },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("chain source unavailable at height {height} after {attempts} attempts: {reason}")]
    ChainSourceUnavailable {
        height: u64,
        attempts: u32,
        reason: String,
    },

    #[error("reorg at height {height} goes deeper than {max_depth} blocks")]
    ReorgTooDeep { height: u64, max_depth: u64 },

    #[error("ledger: {0}")]
    Ledger(LedgerError),
}

impl From<LedgerError> for ScanError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::InvalidAmount(msg) => Self::InvalidAmount(msg),
            other => Self::Ledger(other),
        }
    }
}

impl From<RewardError> for ScanError {
    fn from(value: RewardError) -> Self {
        match value {
            RewardError::InvalidAmount(msg) => Self::InvalidAmount(msg),
        }
    }
}

pub type ScanResult<T> = Result<T, ScanError>;
