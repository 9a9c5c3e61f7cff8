use argh::FromArgs;
use rabbits_config::Config;
use rabbits_primitives::{format_amount, Amount};
use serde::Serialize;

use crate::{
    context::{close_ledger, open_ledger},
    output::{output, porcelain_field, Formattable, OutputFormat},
};

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "nicehashes")]
/// List rewarded transactions, newest first or for one block
pub(crate) struct NiceHashesArgs {
    /// how many to show, newest first
    #[argh(option, default = "10")]
    pub(crate) limit: usize,

    /// only list the block at this height, in block order
    #[argh(option)]
    pub(crate) height: Option<u64>,

    /// output format: "porcelain" (default) or "json"
    #[argh(option, default = "OutputFormat::Porcelain")]
    pub(crate) format: OutputFormat,
}

#[derive(Debug, Serialize)]
pub(crate) struct NiceHashInfo {
    pub(crate) height: u64,
    pub(crate) tx_index: u32,
    pub(crate) txid: String,
    pub(crate) zero_count: u8,
    pub(crate) reward: Amount,
}

impl Formattable for NiceHashInfo {
    fn format_porcelain(&self) -> String {
        porcelain_field(
            &self.txid,
            format!(
                "height={} zeros={} reward={}",
                self.height,
                self.zero_count,
                format_amount(self.reward)
            ),
        )
    }
}

pub(crate) fn get_nice_hashes(args: NiceHashesArgs, config: &Config) -> anyhow::Result<()> {
    let ledger = open_ledger(config)?;
    let res = match args.height {
        Some(height) => ledger.nice_hashes_at(height),
        None => ledger.latest_nice_hashes(args.limit),
    };
    close_ledger(ledger)?;

    let infos = res?
        .into_iter()
        .map(|n| NiceHashInfo {
            height: n.height,
            tx_index: n.tx_index,
            txid: n.txid().to_string(),
            zero_count: n.zero_count,
            reward: n.reward,
        })
        .collect::<Vec<_>>();
    output(&infos, args.format)
}
