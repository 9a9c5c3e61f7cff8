//! Process-wide plumbing shared by the indexer binaries.

pub mod logging;
