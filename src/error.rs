//! Error types for consensus validation

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsensusError {
    #[error("Block validation failed: {0}")]
    BlockValidation(String),

    #[error("Script execution failed: {0}")]
    ScriptExecution(#[from] ScriptError),

    #[error("Invalid proof of work: {0}")]
    InvalidProofOfWork(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, ConsensusError>;

/// Interpreter fault: the script or its environment is malformed.
///
/// Distinct from a completed evaluation that simply fails to authorize a spend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("stack underflow at opcode {position} ({opcode}) of input {input_index}: needs {required} item(s), found {available}")]
    StackUnderflow {
        input_index: usize,
        position: usize,
        opcode: &'static str,
        required: usize,
        available: usize,
    },
}

/// Stable reason codes for rule violations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    #[error("bad-txns-inputs-missingorspent")]
    InputsMissingOrSpent,

    #[error("bad-txns-inputvalues-outofrange")]
    InputValuesOutOfRange,

    #[error("bad-txns-in-belowout")]
    InBelowOut,

    #[error("bad-txns-fee-outofrange")]
    FeeOutOfRange,

    #[error("bad-txns-out-negative")]
    OutputNegative,

    #[error("bad-txns-out-toolarge")]
    OutputTooLarge,

    #[error("bad-txns-txouttotal-toolarge")]
    OutputTotalTooLarge,

    #[error("bad-txns-inputs-empty")]
    InputsEmpty,

    #[error("bad-txns-outputs-empty")]
    OutputsEmpty,

    #[error("bad-txns-inputs-duplicate")]
    InputsDuplicate,

    #[error("bad-cb-missing")]
    CoinbaseMissing,

    #[error("bad-cb-multiple")]
    CoinbaseMultiple,

    #[error("bad-txnmrklroot")]
    BadMerkleRoot,

    #[error("bad-tx")]
    BadTx,
}

impl RejectReason {
    /// The wire-stable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::InputsMissingOrSpent => "bad-txns-inputs-missingorspent",
            RejectReason::InputValuesOutOfRange => "bad-txns-inputvalues-outofrange",
            RejectReason::InBelowOut => "bad-txns-in-belowout",
            RejectReason::FeeOutOfRange => "bad-txns-fee-outofrange",
            RejectReason::OutputNegative => "bad-txns-out-negative",
            RejectReason::OutputTooLarge => "bad-txns-out-toolarge",
            RejectReason::OutputTotalTooLarge => "bad-txns-txouttotal-toolarge",
            RejectReason::InputsEmpty => "bad-txns-inputs-empty",
            RejectReason::OutputsEmpty => "bad-txns-outputs-empty",
            RejectReason::InputsDuplicate => "bad-txns-inputs-duplicate",
            RejectReason::CoinbaseMissing => "bad-cb-missing",
            RejectReason::CoinbaseMultiple => "bad-cb-multiple",
            RejectReason::BadMerkleRoot => "bad-txnmrklroot",
            RejectReason::BadTx => "bad-tx",
        }
    }
}
