//! # utxo-consensus
//!
//! Validation core of a UTXO-ledger blockchain node.
//!
//! The crate decides whether a block may be appended to a ledger of unspent
//! coins and, when it may, applies the block's effect atomically: either every
//! transaction in the block is applied or none is.
//!
//! ## Layers
//!
//! - Crypto and serialization (hashes, signatures, canonical byte encodings)
//! - Script interpreter (a small stack machine authorizing each spend)
//! - Coin views (the canonical ledger plus copy-on-write overlays)
//! - Transaction and block validation
//! - Block assembly and nonce search, which sit outside the consensus core
//!
//! ## Usage
//!
//! ```rust
//! use utxo_consensus::Consensus;
//! use utxo_consensus::types::*;
//! use utxo_consensus::constants::NULL_HASH;
//!
//! let consensus = Consensus::new();
//! let mut ledger = UtxoSet::new();
//!
//! let block = consensus
//!     .create_new_block(vec![], vec![], NULL_HASH, 1_700_000_000)
//!     .unwrap();
//! let result = consensus.connect_block(&block, &mut ledger).unwrap();
//! assert_eq!(result, ValidationResult::Valid);
//! assert_eq!(ledger.len(), 1);
//! ```

pub mod types;
pub mod constants;
pub mod error;
pub mod config;
pub mod crypto;
pub mod serialization;
pub mod economic;
pub mod coins;
pub mod script;
pub mod transaction;
pub mod merkle;
pub mod block;
pub mod mining;

// Re-export commonly used types
pub use types::*;
pub use constants::*;
pub use config::ConsensusConfig;
pub use error::{ConsensusError, RejectReason, Result, ScriptError};

use coins::{CoinsView, CoinsViewMut};
use mining::MiningResult;
use script::{Opcode, Script, ScriptOutcome};

/// Entry point bundling the validation functions with their configuration
///
/// # Examples
///
/// ```
/// use utxo_consensus::Consensus;
/// use utxo_consensus::types::*;
///
/// let consensus = Consensus::new();
///
/// let tx = Transaction::Coinbase {
///     outputs: vec![TransactionOutput { value: 50, script_pubkey: vec![] }],
/// };
///
/// let result = consensus.validate_transaction(&tx).unwrap();
/// assert_eq!(result, ValidationResult::Valid);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Consensus {
    config: ConsensusConfig,
}

impl Consensus {
    /// Create an instance with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an instance with explicit settings
    ///
    /// # Examples
    ///
    /// ```
    /// use utxo_consensus::{Consensus, ConsensusConfig};
    ///
    /// let config = ConsensusConfig { pow_leading_zeros: 1, ..ConsensusConfig::default() };
    /// let consensus = Consensus::with_config(config).unwrap();
    /// assert_eq!(consensus.config().pow_leading_zeros, 1);
    /// ```
    pub fn with_config(config: ConsensusConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    /// Structural transaction checks; the ledger is not consulted
    pub fn validate_transaction(&self, tx: &Transaction) -> Result<ValidationResult> {
        transaction::check_transaction(tx)
    }

    /// Check a transaction's inputs against a coin view and compute its fee
    ///
    /// # Examples
    ///
    /// ```
    /// use utxo_consensus::Consensus;
    /// use utxo_consensus::types::*;
    ///
    /// let consensus = Consensus::new();
    /// let mut ledger = UtxoSet::new();
    ///
    /// let prevout = OutPoint { hash: [1; 32], index: 0 };
    /// ledger.insert(prevout, Coin {
    ///     output: TransactionOutput { value: 50, script_pubkey: vec![] },
    ///     is_coinbase: true,
    ///     spent: false,
    /// });
    ///
    /// let tx = Transaction::Normal {
    ///     inputs: vec![TransactionInput { prevout, script_sig: ScriptSig::empty() }],
    ///     outputs: vec![TransactionOutput { value: 45, script_pubkey: vec![] }],
    /// };
    ///
    /// let (result, fee) = consensus.validate_tx_inputs(&tx, &ledger).unwrap();
    /// assert_eq!(result, ValidationResult::Valid);
    /// assert_eq!(fee, 5);
    /// ```
    pub fn validate_tx_inputs<V: CoinsView + ?Sized>(
        &self,
        tx: &Transaction,
        view: &V,
    ) -> Result<(ValidationResult, Amount)> {
        transaction::check_tx_inputs(tx, view)
    }

    /// Input checks plus script authorization of every input
    pub fn verify_transaction<V: CoinsView + ?Sized>(
        &self,
        tx: &Transaction,
        view: &V,
    ) -> Result<ValidationResult> {
        transaction::verify_transaction(tx, view)
    }

    /// Structural block checks
    pub fn check_block(&self, block: &Block) -> Result<ValidationResult> {
        block::check_block(block)
    }

    /// Validate a block against `ledger` and, if it is valid, apply it atomically
    pub fn connect_block<V: CoinsViewMut>(&self, block: &Block, ledger: &mut V) -> Result<ValidationResult> {
        block::connect_block(block, ledger)
    }

    /// Evaluate a script for input `input_index` of `tx`
    ///
    /// # Examples
    ///
    /// ```
    /// use utxo_consensus::Consensus;
    /// use utxo_consensus::script::Opcode;
    /// use utxo_consensus::types::*;
    ///
    /// let consensus = Consensus::new();
    /// let tx = Transaction::Coinbase { outputs: vec![] };
    ///
    /// // push(3) push(5) geq: 5 ≥ 3
    /// let script = vec![Opcode::Push(vec![3]), Opcode::Push(vec![5]), Opcode::Geq];
    /// let outcome = consensus.eval_script(&script, &tx, 0).unwrap();
    /// assert!(outcome.is_accepted());
    /// ```
    pub fn eval_script(&self, script: &[Opcode], tx: &Transaction, input_index: usize) -> Result<ScriptOutcome> {
        Ok(script::eval_script(script, tx, input_index)?)
    }

    /// Merkle root over a transaction list, `None` when empty
    pub fn block_merkle_root(&self, transactions: &[Transaction]) -> Option<Hash> {
        merkle::block_merkle_root(transactions)
    }

    /// Assemble an unmined block paying the configured reward to `reward_script`
    pub fn create_new_block(
        &self,
        reward_script: Script,
        transactions: Vec<Transaction>,
        prev_block_hash: Hash,
        timestamp: Natural,
    ) -> Result<Block> {
        mining::create_new_block(
            reward_script,
            self.config.block_reward,
            transactions,
            prev_block_hash,
            timestamp,
        )
    }

    /// Search nonces with the configured difficulty and attempt limit
    pub fn mine_block(&self, block: Block) -> Result<(Block, MiningResult)> {
        mining::mine_block(block, self.config.pow_leading_zeros, self.config.max_mining_attempts)
    }
}
