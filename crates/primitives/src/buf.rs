use std::fmt;

use bitcoin::{hashes::Hash, BlockHash, Txid};
use borsh::{BorshDeserialize, BorshSerialize};

/// 32-byte buffer used to persist bitcoin hashes in their internal byte order.
#[derive(
    Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash, BorshSerialize, BorshDeserialize,
)]
pub struct Buf32(pub [u8; 32]);

impl Buf32 {
    pub fn to_txid(self) -> Txid {
        Txid::from_byte_array(self.0)
    }

    pub fn to_block_hash(self) -> BlockHash {
        BlockHash::from_byte_array(self.0)
    }
}

impl From<Txid> for Buf32 {
    fn from(value: Txid) -> Self {
        Self(value.to_byte_array())
    }
}

impl From<BlockHash> for Buf32 {
    fn from(value: BlockHash) -> Self {
        Self(value.to_byte_array())
    }
}

impl fmt::Debug for Buf32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Buf32({})", hex::encode(self.0))
    }
}

impl fmt::Display for Buf32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}
