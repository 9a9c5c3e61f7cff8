use argh::FromArgs;
use rabbits_config::Config;
use rabbits_params::TXID_HEX_LEN;
use rabbits_primitives::{format_amount, Amount};
use rabbits_reward::reward_preview;
use serde::Serialize;

use crate::{
    context::resolve_params,
    output::{output, porcelain_field, Formattable, OutputFormat},
};

/// Zero counts above the minimum shown when no maximum is given.
const DEFAULT_PREVIEW_SPAN: u8 = 4;

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "preview")]
/// Show the reward of every eligible zero count for a block maximum
pub(crate) struct PreviewArgs {
    /// leading zeros of the best transaction in the block
    #[argh(option)]
    pub(crate) max_zeros: Option<u8>,

    /// output format: "porcelain" (default) or "json"
    #[argh(option, default = "OutputFormat::Porcelain")]
    pub(crate) format: OutputFormat,
}

#[derive(Debug, Serialize)]
pub(crate) struct TierInfo {
    pub(crate) zero_count: u8,
    pub(crate) deficit: u8,
    pub(crate) reward: Amount,
    pub(crate) tokens: String,
}

impl Formattable for TierInfo {
    fn format_porcelain(&self) -> String {
        porcelain_field(&format!("zeros.{}", self.zero_count), &self.tokens)
    }
}

pub(crate) fn get_preview(args: PreviewArgs, config: &Config) -> anyhow::Result<()> {
    let params = resolve_params(config)?;
    let max = args.max_zeros.unwrap_or_else(|| {
        params
            .min_zero_count
            .saturating_add(DEFAULT_PREVIEW_SPAN)
            .min(TXID_HEX_LEN)
    });

    let tiers = reward_preview(&params, max)
        .into_iter()
        .map(|tier| TierInfo {
            zero_count: tier.zero_count,
            deficit: tier.deficit,
            reward: tier.reward,
            tokens: format_amount(tier.reward),
        })
        .collect::<Vec<_>>();
    output(&tiers, args.format)
}
