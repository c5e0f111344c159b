//! Configuration for utxo-consensus
//!
//! Operational parameters for block assembly and mining. Consensus rules
//! themselves (the money range, opcode semantics) are constants and are not
//! configurable. Settings can be loaded from JSON, from environment variables,
//! or passed programmatically.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{ConsensusError, Result};
use crate::types::Amount;

/// Environment variable overriding [`ConsensusConfig::block_reward`]
pub const ENV_BLOCK_REWARD: &str = "UTXO_CONSENSUS_BLOCK_REWARD";
/// Environment variable overriding [`ConsensusConfig::pow_leading_zeros`]
pub const ENV_POW_LEADING_ZEROS: &str = "UTXO_CONSENSUS_POW_LEADING_ZEROS";
/// Environment variable overriding [`ConsensusConfig::max_mining_attempts`]
pub const ENV_MAX_MINING_ATTEMPTS: &str = "UTXO_CONSENSUS_MAX_MINING_ATTEMPTS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Value of the coinbase output in newly assembled blocks
    /// Default: 50
    #[serde(default = "default_block_reward")]
    pub block_reward: Amount,

    /// Number of leading '0' hex digits a mined block hash needs
    /// Default: 4
    #[serde(default = "default_pow_leading_zeros")]
    pub pow_leading_zeros: usize,

    /// Nonces tried before the miner gives up
    /// Default: 10,000,000
    #[serde(default = "default_max_mining_attempts")]
    pub max_mining_attempts: u64,
}

fn default_block_reward() -> Amount {
    BLOCK_REWARD
}

fn default_pow_leading_zeros() -> usize {
    DEFAULT_POW_LEADING_ZEROS
}

fn default_max_mining_attempts() -> u64 {
    DEFAULT_MAX_MINING_ATTEMPTS
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            block_reward: BLOCK_REWARD,
            pow_leading_zeros: DEFAULT_POW_LEADING_ZEROS,
            max_mining_attempts: DEFAULT_MAX_MINING_ATTEMPTS,
        }
    }
}

impl ConsensusConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ConsensusError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ConsensusError::Configuration(e.to_string()))
    }

    /// Defaults overridden by `UTXO_CONSENSUS_*` environment variables.
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup` (an environment accessor)
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(reward) = lookup(ENV_BLOCK_REWARD).and_then(|v| v.parse::<Amount>().ok()) {
            self.block_reward = reward;
        }

        if let Some(zeros) = lookup(ENV_POW_LEADING_ZEROS).and_then(|v| v.parse::<usize>().ok()) {
            self.pow_leading_zeros = zeros;
        }

        if let Some(attempts) = lookup(ENV_MAX_MINING_ATTEMPTS).and_then(|v| v.parse::<u64>().ok()) {
            self.max_mining_attempts = attempts;
        }

        self
    }

    /// Reject settings that could never produce a valid block
    pub fn validate(&self) -> Result<()> {
        if !crate::economic::money_range(self.block_reward) {
            return Err(ConsensusError::Configuration(format!(
                "block reward {} outside [0, {}]",
                self.block_reward, MAX_MONEY
            )));
        }
        if self.pow_leading_zeros > 64 {
            return Err(ConsensusError::Configuration(format!(
                "pow_leading_zeros {} exceeds 64",
                self.pow_leading_zeros
            )));
        }
        Ok(())
    }
}
