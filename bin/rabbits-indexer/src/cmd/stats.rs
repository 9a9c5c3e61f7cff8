use argh::FromArgs;
use rabbits_config::Config;
use rabbits_primitives::{format_amount, Amount};
use serde::Serialize;

use crate::{
    context::{close_ledger, open_ledger},
    output::{output, porcelain_field, Formattable, OutputFormat},
};

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "stats")]
/// Show ledger totals as of the last committed block
pub(crate) struct StatsArgs {
    /// output format: "porcelain" (default) or "json"
    #[argh(option, default = "OutputFormat::Porcelain")]
    pub(crate) format: OutputFormat,
}

#[derive(Debug, Serialize)]
pub(crate) struct StatsInfo {
    pub(crate) height: Option<u64>,
    pub(crate) blkid: Option<String>,
    pub(crate) supply: Amount,
    pub(crate) utxo_count: u64,
    pub(crate) nice_hash_count: u64,
    pub(crate) max_zero_count: u8,
    pub(crate) burned: Amount,
}

impl Formattable for StatsInfo {
    fn format_porcelain(&self) -> String {
        let or_none = |v: Option<String>| v.unwrap_or_else(|| "none".to_string());
        [
            porcelain_field("height", or_none(self.height.map(|h| h.to_string()))),
            porcelain_field("blkid", or_none(self.blkid.clone())),
            porcelain_field("supply", format_amount(self.supply)),
            porcelain_field("utxo_count", self.utxo_count),
            porcelain_field("nice_hash_count", self.nice_hash_count),
            porcelain_field("max_zero_count", self.max_zero_count),
            porcelain_field("burned", format_amount(self.burned)),
        ]
        .join("\n")
    }
}

pub(crate) fn get_stats(args: StatsArgs, config: &Config) -> anyhow::Result<()> {
    let ledger = open_ledger(config)?;
    let res = ledger.tip().and_then(|tip| Ok((tip, ledger.stats()?)));
    close_ledger(ledger)?;
    let (tip, stats) = res?;

    let info = StatsInfo {
        height: tip.map(|t| t.height),
        blkid: tip.map(|t| t.block_hash().to_string()),
        supply: stats.supply,
        utxo_count: stats.utxo_count,
        nice_hash_count: stats.nice_hash_count,
        max_zero_count: stats.max_zero_count,
        burned: stats.burned,
    };
    output(&info, args.format)
}
