use async_trait::async_trait;
use rabbits_primitives::ScanBlock;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// Transient failure talking to the source. Worth retrying.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The source returned data that cannot be turned into a block.
    #[error("malformed block at height {height}: {reason}")]
    Malformed { height: u64, reason: String },
}

/// Where blocks come from.
///
/// Implementations must be safe to call from a prefetch task running next to
/// the scanner.
#[async_trait]
pub trait ChainSource: Send + Sync + 'static {
    /// Height of the best block the source knows about.
    async fn chain_tip(&self) -> Result<u64, SourceError>;

    /// Block at `height` on the source's best chain, `None` above its tip.
    async fn get_block(&self, height: u64) -> Result<Option<ScanBlock>, SourceError>;
}
