use std::sync::Arc;

use async_trait::async_trait;
use bitcoind_async_client::traits::Reader;
use rabbits_primitives::ScanBlock;
use tracing::*;

use crate::source::{ChainSource, SourceError};

/// Reads blocks from a bitcoind node over RPC.
#[derive(Debug)]
pub struct BitcoindSource<R> {
    client: Arc<R>,
}

impl<R> BitcoindSource<R> {
    pub fn new(client: Arc<R>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<R: Reader + Send + Sync + 'static> ChainSource for BitcoindSource<R> {
    async fn chain_tip(&self) -> Result<u64, SourceError> {
        let info = self
            .client
            .get_blockchain_info()
            .await
            .map_err(|e| SourceError::Unavailable(e.to_string()))?;
        Ok(info.blocks.into())
    }

    async fn get_block(&self, height: u64) -> Result<Option<ScanBlock>, SourceError> {
        if height > self.chain_tip().await? {
            return Ok(None);
        }

        let block = self
            .client
            .get_block_at(height)
            .await
            .map_err(|e| SourceError::Unavailable(e.to_string()))?;
        trace!(%height, blkid = %block.block_hash(), txs = %block.txdata.len(), "fetched block");

        let block = ScanBlock::from_bitcoin(height, &block);
        block.validate().map_err(|e| SourceError::Malformed {
            height,
            reason: e.to_string(),
        })?;
        Ok(Some(block))
    }
}
