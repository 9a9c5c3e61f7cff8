//! Protocol parameters for each bitcoin network.

use bitcoin::Network;
use rabbits_primitives::{Amount, SUBUNITS_PER_TOKEN};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of hex digits in a txid, the upper bound for any zero count.
pub const TXID_HEX_LEN: u8 = 64;

/// Static parameters that describe how rewards are issued on a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardParams {
    /// Minimum leading zeros for a transaction to earn anything.
    pub min_zero_count: u8,

    /// Reward for the best transaction of a block, in subunits.
    pub base_reward: Amount,

    /// First height that is scanned when nothing has been committed yet.
    pub start_height: u64,
}

impl RewardParams {
    pub const MAINNET: Self = Self {
        min_zero_count: 5,
        base_reward: SUBUNITS_PER_TOKEN,
        start_height: 69_000,
    };

    pub const TESTNET: Self = Self {
        min_zero_count: 5,
        base_reward: SUBUNITS_PER_TOKEN,
        start_height: 0,
    };

    pub const SIGNET: Self = Self {
        min_zero_count: 5,
        base_reward: SUBUNITS_PER_TOKEN,
        start_height: 0,
    };

    /// Regtest lowers the threshold so locally mined transactions qualify.
    pub const REGTEST: Self = Self {
        min_zero_count: 2,
        base_reward: SUBUNITS_PER_TOKEN,
        start_height: 0,
    };

    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Bitcoin => Self::MAINNET,
            Network::Signet => Self::SIGNET,
            Network::Regtest => Self::REGTEST,
            _ => Self::TESTNET,
        }
    }

    /// Applies optional overrides and validates the result.
    pub fn with_overrides(self, overrides: &ParamsOverrides) -> Result<Self, ParamsError> {
        let params = Self {
            min_zero_count: overrides.min_zero_count.unwrap_or(self.min_zero_count),
            base_reward: overrides.base_reward.unwrap_or(self.base_reward),
            start_height: overrides.start_height.unwrap_or(self.start_height),
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.min_zero_count == 0 || self.min_zero_count > TXID_HEX_LEN {
            return Err(ParamsError::MinZeroCountOutOfRange(self.min_zero_count));
        }
        if self.base_reward == 0 {
            return Err(ParamsError::ZeroBaseReward);
        }
        Ok(())
    }
}

impl Default for RewardParams {
    fn default() -> Self {
        Self::MAINNET
    }
}

impl From<Network> for RewardParams {
    fn from(network: Network) -> Self {
        Self::for_network(network)
    }
}

/// Operator-supplied replacements for individual parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamsOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_zero_count: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_reward: Option<Amount>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_height: Option<u64>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParamsError {
    #[error("min zero count {0} outside 1..={TXID_HEX_LEN}")]
    MinZeroCountOutOfRange(u8),

    #[error("base reward must be nonzero")]
    ZeroBaseReward,
}
