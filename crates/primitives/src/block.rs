//! Block data as seen by the scanner.
//!
//! The scanner never touches raw scripts or witnesses. A block is reduced to
//! the handful of fields the reward and ledger logic needs, which also lets an
//! external indexer feed blocks without going through [`bitcoin::Block`].

use std::collections::HashSet;

use bitcoin::{Amount as BtcAmount, Block, BlockHash, Transaction, Txid};
use thiserror::Error;

use crate::{amount::Amount, utxo::UtxoId};

/// Whether an output can ever be spent.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ScriptKind {
    /// Provably unspendable data carrier.
    OpReturn,
    Spendable,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScanOutput {
    /// Position within the transaction.
    pub vout: u32,
    /// Value in satoshis.
    pub value: Amount,
    pub script: ScriptKind,
}

impl ScanOutput {
    pub fn spendable(vout: u32, value: Amount) -> Self {
        Self {
            vout,
            value,
            script: ScriptKind::Spendable,
        }
    }

    pub fn op_return(vout: u32) -> Self {
        Self {
            vout,
            value: 0,
            script: ScriptKind::OpReturn,
        }
    }

    pub fn is_spendable(&self) -> bool {
        self.script == ScriptKind::Spendable
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScanTx {
    pub txid: Txid,
    pub is_coinbase: bool,
    /// Outputs consumed by this transaction. Empty for coinbase.
    pub inputs: Vec<UtxoId>,
    pub outputs: Vec<ScanOutput>,
}

impl ScanTx {
    pub fn new(txid: Txid, inputs: Vec<UtxoId>, outputs: Vec<ScanOutput>) -> Self {
        Self {
            txid,
            is_coinbase: false,
            inputs,
            outputs,
        }
    }

    pub fn coinbase(txid: Txid, outputs: Vec<ScanOutput>) -> Self {
        Self {
            txid,
            is_coinbase: true,
            inputs: Vec::new(),
            outputs,
        }
    }

    pub fn from_bitcoin(tx: &Transaction) -> Self {
        let txid = tx.compute_txid();
        let is_coinbase = tx.is_coinbase();
        let inputs = if is_coinbase {
            Vec::new()
        } else {
            tx.input
                .iter()
                .map(|input| UtxoId::from(input.previous_output))
                .collect()
        };
        let outputs = tx
            .output
            .iter()
            .enumerate()
            .map(|(vout, out)| ScanOutput {
                vout: vout as u32,
                value: out.value.to_sat(),
                script: if out.script_pubkey.is_op_return() {
                    ScriptKind::OpReturn
                } else {
                    ScriptKind::Spendable
                },
            })
            .collect();

        Self {
            txid,
            is_coinbase,
            inputs,
            outputs,
        }
    }

    pub fn utxo(&self, vout: u32) -> UtxoId {
        UtxoId::new(self.txid, vout)
    }

    pub fn spendable_outputs(&self) -> impl Iterator<Item = &ScanOutput> {
        self.outputs.iter().filter(|out| out.is_spendable())
    }
}

/// A block reduced to what reward attribution needs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScanBlock {
    pub height: u64,
    pub block_hash: BlockHash,
    pub prev_block_hash: BlockHash,
    pub transactions: Vec<ScanTx>,
}

impl ScanBlock {
    pub fn from_bitcoin(height: u64, block: &Block) -> Self {
        Self {
            height,
            block_hash: block.block_hash(),
            prev_block_hash: block.header.prev_blockhash,
            transactions: block.txdata.iter().map(ScanTx::from_bitcoin).collect(),
        }
    }

    /// Checks the structural rules the ledger relies on.
    pub fn validate(&self) -> Result<(), MalformedBlockError> {
        let Some(first) = self.transactions.first() else {
            return Err(MalformedBlockError::Empty);
        };
        if !first.is_coinbase {
            return Err(MalformedBlockError::MissingCoinbase);
        }

        let max_money = BtcAmount::MAX_MONEY.to_sat();
        let mut seen = HashSet::with_capacity(self.transactions.len());

        for (idx, tx) in self.transactions.iter().enumerate() {
            if idx > 0 && tx.is_coinbase {
                return Err(MalformedBlockError::MisplacedCoinbase(idx));
            }
            if !seen.insert(tx.txid) {
                return Err(MalformedBlockError::DuplicateTxid(tx.txid));
            }
            if !tx.is_coinbase && tx.inputs.is_empty() {
                return Err(MalformedBlockError::NoInputs(tx.txid));
            }
            if tx.outputs.is_empty() {
                return Err(MalformedBlockError::NoOutputs(tx.txid));
            }
            for (pos, out) in tx.outputs.iter().enumerate() {
                if out.vout as usize != pos {
                    return Err(MalformedBlockError::VoutMismatch {
                        txid: tx.txid,
                        expected: pos as u32,
                        found: out.vout,
                    });
                }
                if out.value > max_money {
                    return Err(MalformedBlockError::ValueOutOfRange {
                        txid: tx.txid,
                        vout: out.vout,
                        value: out.value,
                    });
                }
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MalformedBlockError {
    #[error("block has no transactions")]
    Empty,

    #[error("first transaction is not a coinbase")]
    MissingCoinbase,

    #[error("coinbase transaction at position {0}")]
    MisplacedCoinbase(usize),

    #[error("duplicate txid {0}")]
    DuplicateTxid(Txid),

    #[error("transaction {0} spends nothing")]
    NoInputs(Txid),

    #[error("transaction {0} has no outputs")]
    NoOutputs(Txid),

    #[error("output {txid}:{found} listed at position {expected}")]
    VoutMismatch { txid: Txid, expected: u32, found: u32 },

    #[error("output {txid}:{vout} carries {value} sats, above the money supply")]
    ValueOutOfRange { txid: Txid, vout: u32, value: Amount },
}
