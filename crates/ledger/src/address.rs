use bitcoin::Address;
use rabbits_primitives::UtxoId;

/// Maps addresses to the outpoints they currently control.
///
/// The ledger only knows outpoints, so address queries need an external
/// indexer (a wallet, electrum server or explorer backend) to resolve them.
pub trait AddressIndex {
    type Error: std::error::Error;

    fn utxos_for_address(&self, address: &Address) -> Result<Vec<UtxoId>, Self::Error>;
}
