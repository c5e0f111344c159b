//! Ledger consensus constants

use crate::types::{Amount, Hash};

/// Maximum money supply. Every output value and every running sum must stay within [0, MAX_MONEY].
pub const MAX_MONEY: Amount = 10_000_000;

/// Coinbase reward paid by a newly assembled block
pub const BLOCK_REWARD: Amount = 50;

/// Default proof-of-work predicate: number of leading '0' hex characters in the block hash
pub const DEFAULT_POW_LEADING_ZEROS: usize = 4;

/// Default upper bound on nonces tried by the miner
pub const DEFAULT_MAX_MINING_ATTEMPTS: u64 = 10_000_000;

/// Previous-block hash of a genesis block
pub const NULL_HASH: Hash = [0u8; 32];

/// Stack encoding of boolean true
pub const SCRIPT_TRUE: u8 = 0x01;

/// Stack encoding of boolean false
pub const SCRIPT_FALSE: u8 = 0x00;
