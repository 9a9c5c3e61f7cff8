use rabbits_db_types::DbError;
use rabbits_reward::RewardError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("block {height} out of order, next is {expected}")]
    OutOfOrder { height: u64, expected: u64 },

    #[error("block {0} already committed")]
    AlreadyCommitted(u64),

    #[error("address index: {0}")]
    AddressIndex(String),

    #[error("db: {0}")]
    Db(#[from] DbError),
}

impl From<RewardError> for LedgerError {
    fn from(value: RewardError) -> Self {
        match value {
            RewardError::InvalidAmount(msg) => Self::InvalidAmount(msg),
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
