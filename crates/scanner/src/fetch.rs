//! Source calls wrapped in the fetch retry policy.

use std::future::Future;

use rabbits_config::RetryConfig;
use rabbits_primitives::ScanBlock;
use tracing::*;

use crate::{
    errors::{ScanError, ScanResult},
    source::{ChainSource, SourceError},
};

async fn with_retry<T, F, Fut>(height: u64, retry: &RetryConfig, mut call: F) -> ScanResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    let mut retries = 0;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(SourceError::Malformed { height, reason }) => {
                return Err(ScanError::MalformedBlock { height, reason });
            }
            Err(SourceError::Unavailable(reason)) => {
                if !retry.should_retry(retries) {
                    error!(%height, attempts = %(retries + 1), %reason, "giving up on chain source");
                    return Err(ScanError::ChainSourceUnavailable {
                        height,
                        attempts: retries + 1,
                        reason,
                    });
                }

                let delay = retry.calculate_delay(retries);
                warn!(%height, %retries, ?delay, %reason, "chain source call failed, retrying");
                tokio::time::sleep(delay).await;
                retries += 1;
            }
        }
    }
}

/// Current tip of the source. `height` is the block the caller is about to
/// scan and is only used for reporting.
pub async fn fetch_chain_tip<S: ChainSource + ?Sized>(
    source: &S,
    height: u64,
    retry: &RetryConfig,
) -> ScanResult<u64> {
    with_retry(height, retry, || source.chain_tip()).await
}

/// Block at `height`, retrying transient failures.
pub async fn fetch_block<S: ChainSource + ?Sized>(
    source: &S,
    height: u64,
    retry: &RetryConfig,
) -> ScanResult<Option<ScanBlock>> {
    with_retry(height, retry, || source.get_block(height)).await
}
