use argh::FromArgs;
use rabbits_config::Config;
use serde::Serialize;
use tracing::*;

use crate::{
    context::{close_ledger, open_ledger},
    output::{output, porcelain_field, Formattable, OutputFormat},
};

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "rollback")]
/// Revert every block above a height
pub(crate) struct RollbackArgs {
    /// height that becomes the new tip
    #[argh(positional)]
    pub(crate) height: u64,

    /// force execution (without this flag, only a dry run is performed)
    #[argh(switch, short = 'f')]
    pub(crate) force: bool,

    /// output format: "porcelain" (default) or "json"
    #[argh(option, default = "OutputFormat::Porcelain")]
    pub(crate) format: OutputFormat,
}

#[derive(Debug, Serialize)]
pub(crate) struct RollbackInfo {
    pub(crate) tip: Option<u64>,
    pub(crate) target: u64,
    pub(crate) blocks: u64,
    pub(crate) applied: bool,
}

impl Formattable for RollbackInfo {
    fn format_porcelain(&self) -> String {
        [
            porcelain_field(
                "tip",
                self.tip.map_or_else(|| "none".to_string(), |h| h.to_string()),
            ),
            porcelain_field("target", self.target),
            porcelain_field("blocks", self.blocks),
            porcelain_field("applied", self.applied),
        ]
        .join("\n")
    }
}

pub(crate) fn rollback(args: RollbackArgs, config: &Config) -> anyhow::Result<()> {
    let ledger = open_ledger(config)?;
    let res = (|| {
        let tip = ledger.tip()?.map(|t| t.height);
        let blocks = if args.force {
            ledger.revert_to(args.height)?
        } else {
            tip.map_or(0, |h| h.saturating_sub(args.height))
        };
        Ok::<_, anyhow::Error>(RollbackInfo {
            tip,
            target: args.height,
            blocks,
            applied: args.force,
        })
    })();
    close_ledger(ledger)?;
    let info = res?;

    if !args.force {
        info!(blocks = %info.blocks, "dry run, pass --force to revert");
    }
    output(&info, args.format)
}
