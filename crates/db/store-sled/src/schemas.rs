//! Tree layout. Heights are big-endian so that tree order is height order.

/// Outpoint key bytes => big-endian balance.
pub(crate) const BALANCES_TREE: &str = "balances";

/// [`TIP_KEY`] => `ChainTip`.
pub(crate) const META_TREE: &str = "meta";

/// Height => `BlockSummary`.
pub(crate) const BLOCKS_TREE: &str = "blocks";

/// Height => `LedgerStats` as of that block.
pub(crate) const STATS_TREE: &str = "stats";

/// Height => `Vec<UndoEntry>`, only within the reorg window.
pub(crate) const UNDO_TREE: &str = "undo";

/// [`indexed_key`] of height and credit position => `RewardEntry`.
pub(crate) const REWARDS_TREE: &str = "rewards";

/// [`indexed_key`] of height and transaction position => `NiceHash`.
pub(crate) const NICE_HASHES_TREE: &str = "nice_hashes";

pub(crate) const TIP_KEY: &[u8] = b"tip";

pub(crate) fn height_key(height: u64) -> [u8; 8] {
    height.to_be_bytes()
}

/// Height followed by a position within the block.
pub(crate) fn indexed_key(height: u64, idx: u32) -> [u8; 12] {
    let mut key = [0u8; 12];
    key[..8].copy_from_slice(&height.to_be_bytes());
    key[8..].copy_from_slice(&idx.to_be_bytes());
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_sort_by_height_then_index() {
        assert!(height_key(255) < height_key(256));
        assert!(indexed_key(1, u32::MAX) < indexed_key(2, 0));
        assert!(indexed_key(2, 3) < indexed_key(2, 4));
        assert!(indexed_key(7, 0).starts_with(&height_key(7)));
    }
}
