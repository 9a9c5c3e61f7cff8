//! Chain scanner: pulls blocks from a chain source in height order and applies
//! their reward and transfer effects to the ledger, one block at a time.

mod bitcoind;
mod errors;
mod fetch;
mod prefetch;
mod processor;
mod scanner;
mod source;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

#[cfg(test)]
mod tests;

pub use bitcoind::BitcoindSource;
pub use errors::{ScanError, ScanResult};
pub use fetch::{fetch_block, fetch_chain_tip};
pub use processor::apply_block;
pub use scanner::{ChainScanner, ScanReport, ScannerState};
pub use source::{ChainSource, SourceError};
