use argh::FromArgs;
use rabbits_config::Config;
use rabbits_primitives::{format_amount, Amount, UtxoId};
use serde::Serialize;

use crate::{
    context::{close_ledger, open_ledger},
    output::{output, porcelain_field, Formattable, OutputFormat},
};

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "balance")]
/// Show the token balance of outpoints
pub(crate) struct BalanceArgs {
    /// outpoints as <txid>:<vout>
    #[argh(positional)]
    pub(crate) utxos: Vec<UtxoId>,

    /// output format: "porcelain" (default) or "json"
    #[argh(option, default = "OutputFormat::Porcelain")]
    pub(crate) format: OutputFormat,
}

#[derive(Debug, Serialize)]
pub(crate) struct BalanceInfo {
    pub(crate) utxo: String,
    pub(crate) balance: Amount,
    pub(crate) tokens: String,
}

impl Formattable for BalanceInfo {
    fn format_porcelain(&self) -> String {
        porcelain_field(&self.utxo, &self.tokens)
    }
}

pub(crate) fn get_balances(args: BalanceArgs, config: &Config) -> anyhow::Result<()> {
    let ledger = open_ledger(config)?;
    let balances = ledger.balances_of(&args.utxos);
    close_ledger(ledger)?;

    let infos = balances?
        .into_iter()
        .map(|(utxo, balance)| BalanceInfo {
            utxo: utxo.to_string(),
            balance,
            tokens: format_amount(balance),
        })
        .collect::<Vec<_>>();
    output(&infos, args.format)
}
