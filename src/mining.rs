//! Block assembly and proof-of-work nonce search
//!
//! These are callers of the validation core: they build candidate blocks and
//! search for a nonce, but the resulting block still goes through
//! [`crate::block::connect_block`] like any other.

use log::info;

use crate::block::block_hash;
use crate::error::{ConsensusError, Result};
use crate::merkle::block_merkle_root;
use crate::script::Script;
use crate::types::*;

/// Mining result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiningResult {
    Success,
    Failure,
}

/// Coinbase paying `reward` to `script_pubkey`
pub fn create_coinbase_transaction(script_pubkey: Script, reward: Amount) -> Transaction {
    Transaction::Coinbase {
        outputs: vec![TransactionOutput {
            value: reward,
            script_pubkey,
        }],
    }
}

/// CreateNewBlock: 𝒮 × ℤ × 𝒯𝒳* × ℍ × ℕ → ℬ
///
/// 1. Prepend a coinbase paying `reward` to `reward_script`
/// 2. Calculate merkle root
/// 3. Build an unmined header (nonce 0)
pub fn create_new_block(
    reward_script: Script,
    reward: Amount,
    transactions: Vec<Transaction>,
    prev_block_hash: Hash,
    timestamp: Natural,
) -> Result<Block> {
    let mut all_transactions = Vec::with_capacity(transactions.len() + 1);
    all_transactions.push(create_coinbase_transaction(reward_script, reward));
    all_transactions.extend(transactions);

    let merkle_root = block_merkle_root(&all_transactions).ok_or_else(|| {
        ConsensusError::BlockValidation("Cannot calculate merkle root for empty transaction list".to_string())
    })?;

    Ok(Block {
        header: BlockHeader {
            prev_block_hash,
            merkle_root,
            timestamp,
            nonce: 0,
        },
        transactions: all_transactions,
    })
}

/// Whether the hex representation of `hash` starts with `leading_zeros` '0' characters
pub fn is_valid_block_hash(hash: &Hash, leading_zeros: usize) -> bool {
    hex::encode(hash)
        .bytes()
        .take_while(|c| *c == b'0')
        .count()
        >= leading_zeros
}

/// MineBlock: ℬ × ℕ × ℕ → ℬ × {success, failure}
///
/// Increment the nonce, starting from the header's current value, until the
/// block hash satisfies the predicate or `max_attempts` nonces were tried.
pub fn mine_block(
    mut block: Block,
    leading_zeros: usize,
    max_attempts: Natural,
) -> Result<(Block, MiningResult)> {
    if leading_zeros > 64 {
        return Err(ConsensusError::InvalidProofOfWork(format!(
            "{} leading zeros exceed the 64 hex digits of a hash",
            leading_zeros
        )));
    }

    for _ in 0..max_attempts {
        let hash = block_hash(&block.header);
        if is_valid_block_hash(&hash, leading_zeros) {
            info!("Mined block {} (nonce {})", hex::encode(hash), block.header.nonce);
            return Ok((block, MiningResult::Success));
        }

        block.header.nonce = match block.header.nonce.checked_add(1) {
            Some(nonce) => nonce,
            None => break,
        };
    }

    Ok((block, MiningResult::Failure))
}
