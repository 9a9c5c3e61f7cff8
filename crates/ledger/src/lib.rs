//! Balance ledger: token balances per outpoint, committed block by block.

mod address;
mod batch;
mod errors;
mod ledger;
pub mod memory;

pub use address::AddressIndex;
pub use batch::{LedgerBatch, Transfer};
pub use errors::{LedgerError, LedgerResult};
pub use ledger::Ledger;
pub use memory::MemoryLedgerDb;
