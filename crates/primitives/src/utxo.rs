//! UTXO identifiers.

use std::{fmt, str::FromStr};

use bitcoin::{hashes::Hash, OutPoint, Txid};
use borsh::{
    io::{Read, Result as IoResult, Write},
    BorshDeserialize, BorshSerialize,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of the persisted key form of a [`UtxoId`].
pub const UTXO_KEY_LEN: usize = 36;

/// Identifies an unspent transaction output by transaction id and output index.
///
/// The persisted key is the 32 txid bytes followed by the big-endian output
/// index, so every outpoint maps to exactly one key.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct UtxoId {
    pub txid: Txid,
    pub vout: u32,
}

impl UtxoId {
    pub fn new(txid: Txid, vout: u32) -> Self {
        Self { txid, vout }
    }

    pub fn to_key_bytes(&self) -> [u8; UTXO_KEY_LEN] {
        let mut key = [0u8; UTXO_KEY_LEN];
        key[..32].copy_from_slice(self.txid.as_byte_array());
        key[32..].copy_from_slice(&self.vout.to_be_bytes());
        key
    }

    /// Decodes a key produced by [`Self::to_key_bytes`].
    pub fn from_key_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != UTXO_KEY_LEN {
            return None;
        }
        let mut txid = [0u8; 32];
        txid.copy_from_slice(&bytes[..32]);
        let mut vout = [0u8; 4];
        vout.copy_from_slice(&bytes[32..]);
        Some(Self {
            txid: Txid::from_byte_array(txid),
            vout: u32::from_be_bytes(vout),
        })
    }
}

impl From<OutPoint> for UtxoId {
    fn from(value: OutPoint) -> Self {
        Self::new(value.txid, value.vout)
    }
}

impl From<UtxoId> for OutPoint {
    fn from(value: UtxoId) -> Self {
        OutPoint::new(value.txid, value.vout)
    }
}

impl fmt::Display for UtxoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseUtxoIdError {
    #[error("expected <txid>:<vout>, got '{0}'")]
    MissingSeparator(String),

    #[error("invalid txid '{0}'")]
    InvalidTxid(String),

    #[error("invalid output index '{0}'")]
    InvalidVout(String),
}

impl FromStr for UtxoId {
    type Err = ParseUtxoIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (txid, vout) = s
            .split_once(':')
            .ok_or_else(|| ParseUtxoIdError::MissingSeparator(s.to_owned()))?;
        let txid =
            Txid::from_str(txid).map_err(|_| ParseUtxoIdError::InvalidTxid(txid.to_owned()))?;
        let vout = vout
            .parse::<u32>()
            .map_err(|_| ParseUtxoIdError::InvalidVout(vout.to_owned()))?;
        Ok(Self::new(txid, vout))
    }
}

impl BorshSerialize for UtxoId {
    fn serialize<W: Write>(&self, writer: &mut W) -> IoResult<()> {
        writer.write_all(&self.to_key_bytes())
    }
}

impl BorshDeserialize for UtxoId {
    fn deserialize_reader<R: Read>(reader: &mut R) -> IoResult<Self> {
        let mut buf = [0u8; UTXO_KEY_LEN];
        reader.read_exact(&mut buf)?;
        Self::from_key_bytes(&buf).ok_or_else(|| {
            borsh::io::Error::new(borsh::io::ErrorKind::InvalidData, "bad utxo key")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TXID: &str = "00000abc12345678000000000000000000000000000000000000000000000000";

    #[test]
    fn test_parse_and_display() {
        let utxo: UtxoId = format!("{TXID}:3").parse().unwrap();
        assert_eq!(utxo.vout, 3);
        assert_eq!(utxo.to_string(), format!("{TXID}:3"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            "nocolon".parse::<UtxoId>(),
            Err(ParseUtxoIdError::MissingSeparator(_))
        ));
        assert!(matches!(
            "zz:1".parse::<UtxoId>(),
            Err(ParseUtxoIdError::InvalidTxid(_))
        ));
        assert!(matches!(
            format!("{TXID}:-1").parse::<UtxoId>(),
            Err(ParseUtxoIdError::InvalidVout(_))
        ));
    }

    #[test]
    fn test_key_bytes_are_unique_per_vout() {
        let txid = Txid::from_str(TXID).unwrap();
        let a = UtxoId::new(txid, 0).to_key_bytes();
        let b = UtxoId::new(txid, 1).to_key_bytes();
        assert_ne!(a, b);
        assert_eq!(UtxoId::from_key_bytes(&b), Some(UtxoId::new(txid, 1)));
        assert_eq!(UtxoId::from_key_bytes(&b[..35]), None);
    }

    #[test]
    fn test_borsh_matches_key_bytes() {
        let utxo = UtxoId::new(Txid::from_str(TXID).unwrap(), 7);
        let encoded = borsh::to_vec(&utxo).unwrap();
        assert_eq!(encoded, utxo.to_key_bytes());
        assert_eq!(borsh::from_slice::<UtxoId>(&encoded).unwrap(), utxo);
    }
}
