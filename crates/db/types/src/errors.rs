use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DbError {
    #[error("tried to insert into {0} out-of-order index {1}")]
    OooInsert(&'static str, u64),

    #[error("tried to revert block {0} but the tip is at {1}")]
    RevertNotAtTip(u64, u64),

    #[error("nothing committed yet")]
    NothingCommitted,

    #[error("missing undo journal for block {0}")]
    MissingUndo(u64),

    #[error("IO Error: {0}")]
    IoError(String),

    #[error("codec error {0}")]
    CodecError(String),

    #[error("transaction error {0}")]
    TransactionError(String),
}

impl From<borsh::io::Error> for DbError {
    fn from(value: borsh::io::Error) -> Self {
        Self::CodecError(value.to_string())
    }
}
