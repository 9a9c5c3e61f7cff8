//! Leading-zero scoring of transaction ids.

use bitcoin::{hashes::Hash, Txid};

/// Counts the consecutive `'0'` characters at the start of a hex txid.
///
/// An all-zero id scores its full length; any other first character scores 0.
pub fn leading_zero_count(txid_hex: &str) -> usize {
    txid_hex.bytes().take_while(|c| *c == b'0').count()
}

/// Scores a [`Txid`] as it is displayed, without formatting it.
pub fn txid_zero_count(txid: &Txid) -> u8 {
    let mut count: u8 = 0;

    // Txid bytes are stored little-endian; the displayed hex starts at the
    // last byte.
    for &byte in txid.as_byte_array().iter().rev() {
        if byte == 0 {
            count += 2;
            continue;
        }

        if byte >> 4 == 0 {
            count += 1;
        }
        break;
    }

    count
}
