use borsh::{BorshDeserialize, BorshSerialize};
use rabbits_db_types::{DbError, DbResult};
use rabbits_primitives::Amount;
use sled::transaction::TransactionError;

pub(crate) fn to_db_error(e: sled::Error) -> DbError {
    DbError::IoError(e.to_string())
}

pub(crate) fn tx_error(e: TransactionError<DbError>) -> DbError {
    match e {
        TransactionError::Abort(e) => e,
        TransactionError::Storage(e) => DbError::TransactionError(e.to_string()),
    }
}

pub(crate) fn encode<T: BorshSerialize>(value: &T) -> DbResult<Vec<u8>> {
    Ok(borsh::to_vec(value)?)
}

pub(crate) fn decode<T: BorshDeserialize>(bytes: &[u8]) -> DbResult<T> {
    Ok(borsh::from_slice(bytes)?)
}

pub(crate) fn decode_amount(bytes: &[u8]) -> DbResult<Amount> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| DbError::CodecError(format!("balance of {} bytes", bytes.len())))?;
    Ok(Amount::from_be_bytes(raw))
}
