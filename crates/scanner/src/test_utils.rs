//! In-memory chain source for tests and replaying recorded blocks.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::Mutex;
use rabbits_primitives::ScanBlock;

use crate::source::{ChainSource, SourceError};

#[derive(Debug, Default)]
struct Inner {
    blocks: BTreeMap<u64, ScanBlock>,
    /// Remaining injected failures per height.
    failures: HashMap<u64, u32>,
    /// Heights served as malformed, with the reason reported.
    malformed: HashMap<u64, String>,
    fetches: HashMap<u64, u32>,
    tip_failures: u32,
}

/// A chain held in memory. Blocks can be replaced to simulate a reorg and
/// calls can be made to fail a given number of times.
#[derive(Debug, Default)]
pub struct MemoryChainSource {
    inner: Mutex<Inner>,
}

impl MemoryChainSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blocks(blocks: impl IntoIterator<Item = ScanBlock>) -> Self {
        let source = Self::new();
        source.extend(blocks);
        source
    }

    /// Inserts blocks, replacing any already stored at the same heights.
    pub fn extend(&self, blocks: impl IntoIterator<Item = ScanBlock>) {
        let mut inner = self.inner.lock();
        for block in blocks {
            inner.malformed.remove(&block.height);
            inner.blocks.insert(block.height, block);
        }
    }

    /// Drops every block above `height`.
    pub fn truncate(&self, height: u64) {
        self.inner.lock().blocks.retain(|h, _| *h <= height);
    }

    pub fn block(&self, height: u64) -> Option<ScanBlock> {
        self.inner.lock().blocks.get(&height).cloned()
    }

    /// Makes the next `times` fetches of `height` fail as unavailable.
    pub fn fail_block(&self, height: u64, times: u32) {
        self.inner.lock().failures.insert(height, times);
    }

    /// Serves `height` as malformed until the block is replaced.
    pub fn corrupt_block(&self, height: u64, reason: &str) {
        self.inner.lock().malformed.insert(height, reason.to_owned());
    }

    /// Number of times `height` was requested, failed attempts included.
    pub fn fetch_count(&self, height: u64) -> u32 {
        self.inner.lock().fetches.get(&height).copied().unwrap_or(0)
    }

    /// Makes the next `times` tip queries fail as unavailable.
    pub fn fail_tip(&self, times: u32) {
        self.inner.lock().tip_failures = times;
    }
}

#[async_trait]
impl ChainSource for MemoryChainSource {
    async fn chain_tip(&self) -> Result<u64, SourceError> {
        let mut inner = self.inner.lock();
        if inner.tip_failures > 0 {
            inner.tip_failures -= 1;
            return Err(SourceError::Unavailable("injected tip failure".into()));
        }
        Ok(inner.blocks.keys().next_back().copied().unwrap_or(0))
    }

    async fn get_block(&self, height: u64) -> Result<Option<ScanBlock>, SourceError> {
        let mut inner = self.inner.lock();
        *inner.fetches.entry(height).or_default() += 1;
        if let Some(reason) = inner.malformed.get(&height) {
            return Err(SourceError::Malformed {
                height,
                reason: reason.clone(),
            });
        }
        if let Some(left) = inner.failures.get_mut(&height) {
            if *left > 0 {
                *left -= 1;
                return Err(SourceError::Unavailable(format!(
                    "injected failure at {height}"
                )));
            }
        }
        Ok(inner.blocks.get(&height).cloned())
    }
}
