//! Configuration types for the indexer.

mod config;
mod retry;

pub use config::*;
pub use retry::RetryConfig;
