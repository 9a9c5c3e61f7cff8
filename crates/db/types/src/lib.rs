//! Storage interface of the balance ledger.

pub mod errors;
pub mod traits;
pub mod types;

pub use errors::DbError;
pub use traits::LedgerDatabase;

pub type DbResult<T> = Result<T, DbError>;
