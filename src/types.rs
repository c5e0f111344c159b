//! Core ledger types for consensus validation

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::RejectReason;
use crate::script::Script;

/// Hash type: 256-bit hash
pub type Hash = [u8; 32];

/// Byte string type
pub type ByteString = Vec<u8>;

/// Natural number type
pub type Natural = u64;

/// Monetary amount. Signed so that negative outputs can be represented and rejected.
pub type Amount = i64;

/// OutPoint: 𝒪 = ℍ × ℕ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub hash: Hash,
    pub index: u32,
}

/// Unlocking data supplied by a spender: signature and public key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptSig {
    pub signature: ByteString,
    pub public_key: ByteString,
}

impl ScriptSig {
    /// The blanked unlocking script used when computing the signature hash.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Transaction Input: ℐ = 𝒪 × 𝕊
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub prevout: OutPoint,
    pub script_sig: ScriptSig,
}

/// Transaction Output: 𝒯 = ℤ × 𝕊
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub value: Amount,
    pub script_pubkey: Script,
}

/// Transaction: either a value-minting coinbase or a normal spend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transaction {
    Coinbase {
        outputs: Vec<TransactionOutput>,
    },
    Normal {
        inputs: Vec<TransactionInput>,
        outputs: Vec<TransactionOutput>,
    },
}

/// Block Header: ℋ = ℍ × ℍ × ℕ × ℕ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub prev_block_hash: Hash,
    pub merkle_root: Hash,
    pub timestamp: Natural,
    pub nonce: Natural,
}

/// Block: ℬ = ℋ × 𝒯𝒳*
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

/// A single transaction output as tracked by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub output: TransactionOutput,
    pub is_coinbase: bool,
    pub spent: bool,
}

/// UTXO Set: 𝒰𝒮 = 𝒪 → Coin
///
/// The canonical, owned ledger. Overlays are layered on top of it in [`crate::coins`].
pub type UtxoSet = HashMap<OutPoint, Coin>;

/// Validation result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(RejectReason),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    /// Reason code of a rejection, `None` when valid.
    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(reason) => Some(*reason),
        }
    }
}
