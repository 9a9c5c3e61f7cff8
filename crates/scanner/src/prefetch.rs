use std::sync::Arc;

use rabbits_config::RetryConfig;
use rabbits_primitives::ScanBlock;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::*;

use crate::{
    errors::{ScanError, ScanResult},
    fetch::fetch_block,
    source::ChainSource,
};

/// Fetches a height range ahead of the scanner.
///
/// Blocks arrive in height order. The first error ends the stream, and so does
/// the source running out of blocks before `to`. Dropping the prefetcher stops
/// the background task.
#[derive(Debug)]
pub(crate) struct Prefetcher {
    rx: mpsc::Receiver<ScanResult<ScanBlock>>,
    handle: JoinHandle<()>,
}

impl Prefetcher {
    pub(crate) fn spawn<S: ChainSource>(
        source: Arc<S>,
        from: u64,
        to: u64,
        depth: usize,
        retry: RetryConfig,
    ) -> Self {
        let (tx, rx) = mpsc::channel(depth.max(1));
        let handle = tokio::spawn(async move {
            for height in from..=to {
                let item = match fetch_block(source.as_ref(), height, &retry).await {
                    Ok(Some(block)) if block.height != height => Err(ScanError::MalformedBlock {
                        height,
                        reason: format!("source returned block for height {}", block.height),
                    }),
                    Ok(Some(block)) => Ok(block),
                    Ok(None) => {
                        debug!(%height, "chain source has no block, ending prefetch");
                        return;
                    }
                    Err(e) => Err(e),
                };

                let failed = item.is_err();
                if tx.send(item).await.is_err() || failed {
                    return;
                }
            }
        });

        Self { rx, handle }
    }

    pub(crate) async fn next(&mut self) -> Option<ScanResult<ScanBlock>> {
        self.rx.recv().await
    }
}

impl Drop for Prefetcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
