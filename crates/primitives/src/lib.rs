//! Data types shared by every part of the indexer: token amounts, UTXO
//! identifiers and the reduced block model fed to the scanner.

pub mod amount;
pub mod block;
pub mod buf;
pub mod utxo;

pub use amount::{format_amount, Amount, SUBUNITS_PER_TOKEN};
pub use block::{MalformedBlockError, ScanBlock, ScanOutput, ScanTx, ScriptKind};
pub use buf::Buf32;
pub use utxo::{ParseUtxoIdError, UtxoId};
