//! Transaction model and validation

use std::collections::HashSet;

use log::{debug, warn};
use secp256k1::{PublicKey, SecretKey};

use crate::coins::CoinsView;
use crate::constants::*;
use crate::crypto::{double_sha256, public_key_bytes, sign_hash};
use crate::economic::{add_money, calculate_fee, sum_money};
use crate::error::{RejectReason, Result};
use crate::script::{combine_scripts, eval_script, pay_to_pubkey_hash, script_sig};
use crate::serialization::serialize_transaction;
use crate::types::*;

impl Transaction {
    pub fn outputs(&self) -> &[TransactionOutput] {
        match self {
            Transaction::Coinbase { outputs } => outputs,
            Transaction::Normal { outputs, .. } => outputs,
        }
    }

    /// Inputs of a normal transaction; empty for a coinbase
    pub fn inputs(&self) -> &[TransactionInput] {
        match self {
            Transaction::Coinbase { .. } => &[],
            Transaction::Normal { inputs, .. } => inputs,
        }
    }

    pub fn is_coinbase(&self) -> bool {
        matches!(self, Transaction::Coinbase { .. })
    }

    /// Canonical byte encoding
    pub fn serialize(&self) -> Vec<u8> {
        serialize_transaction(self)
    }

    /// Transaction id: SHA256(SHA256(serialize(tx)))
    pub fn hash(&self) -> Hash {
        double_sha256(&self.serialize())
    }

    /// A copy with every unlocking script blanked. A coinbase is returned unchanged.
    pub fn with_empty_input_scripts(&self) -> Transaction {
        match self {
            Transaction::Coinbase { .. } => self.clone(),
            Transaction::Normal { inputs, outputs } => Transaction::Normal {
                inputs: inputs
                    .iter()
                    .map(|input| TransactionInput {
                        prevout: input.prevout,
                        script_sig: ScriptSig::empty(),
                    })
                    .collect(),
                outputs: outputs.clone(),
            },
        }
    }

    /// Message covered by every spending signature: the hash of the blanked transaction
    pub fn signature_hash(&self) -> Hash {
        self.with_empty_input_scripts().hash()
    }

    /// Sign the signature hash with `secret_key`
    pub fn sign(&self, secret_key: &SecretKey) -> ByteString {
        sign_hash(&self.signature_hash(), secret_key)
    }

    /// Σ output values, `None` if any partial sum leaves the money range
    pub fn value_out(&self) -> Option<Amount> {
        sum_money(self.outputs().iter().map(|output| output.value))
    }
}

/// Build a single-input, single-output pay-to-pubkey-hash spend of `prevout`,
/// signed by `secret_key`.
pub fn create_signed_spend(
    secret_key: &SecretKey,
    recipient: &PublicKey,
    value: Amount,
    prevout: OutPoint,
) -> Transaction {
    let outputs = vec![TransactionOutput {
        value,
        script_pubkey: pay_to_pubkey_hash(&public_key_bytes(recipient)),
    }];
    let unsigned = Transaction::Normal {
        inputs: vec![TransactionInput {
            prevout,
            script_sig: ScriptSig::empty(),
        }],
        outputs: outputs.clone(),
    };
    let signature = unsigned.sign(secret_key);

    let secp = secp256k1::Secp256k1::signing_only();
    let public_key = PublicKey::from_secret_key(&secp, secret_key);

    Transaction::Normal {
        inputs: vec![TransactionInput {
            prevout,
            script_sig: ScriptSig {
                signature,
                public_key: public_key_bytes(&public_key),
            },
        }],
        outputs,
    }
}

/// CheckTransaction: 𝒯𝒳 → {valid, invalid}
///
/// Structural rules only; the ledger is not consulted.
/// 1. normal ⇒ |ins| > 0; |outs| > 0
/// 2. ∀o ∈ outs: 0 ≤ o.value ≤ M_max
/// 3. every running Σ o.value stays within [0, M_max]
/// 4. no prevout is spent twice by the same transaction
pub fn check_transaction(tx: &Transaction) -> Result<ValidationResult> {
    // 1. Check inputs and outputs are not empty
    if let Transaction::Normal { inputs, .. } = tx {
        if inputs.is_empty() {
            return Ok(ValidationResult::Invalid(RejectReason::InputsEmpty));
        }
    }
    if tx.outputs().is_empty() {
        return Ok(ValidationResult::Invalid(RejectReason::OutputsEmpty));
    }

    // 2-3. Check output values and their running total
    let mut value_out: Amount = 0;
    for output in tx.outputs() {
        if output.value < 0 {
            return Ok(ValidationResult::Invalid(RejectReason::OutputNegative));
        }
        if output.value > MAX_MONEY {
            return Ok(ValidationResult::Invalid(RejectReason::OutputTooLarge));
        }
        value_out = match add_money(value_out, output.value) {
            Some(total) => total,
            None => return Ok(ValidationResult::Invalid(RejectReason::OutputTotalTooLarge)),
        };
    }

    // 4. Check for duplicate inputs
    let mut seen = HashSet::with_capacity(tx.inputs().len());
    if !tx.inputs().iter().all(|input| seen.insert(input.prevout)) {
        return Ok(ValidationResult::Invalid(RejectReason::InputsDuplicate));
    }

    Ok(ValidationResult::Valid)
}

/// CheckTxInputs: 𝒯𝒳 × 𝒰𝒮 → {valid, invalid} × ℤ
///
/// For transaction tx against coin view us:
/// 1. If tx is coinbase: return (valid, 0)
/// 2. Every prevout must resolve to an unspent coin
/// 3. Let total_in = Σᵢ us(i.prevout).value, range-checked per addition
/// 4. If total_in < total_out: return (invalid, 0)
/// 5. Return (valid, total_in - total_out) if the fee is in range
pub fn check_tx_inputs<V: CoinsView + ?Sized>(
    tx: &Transaction,
    view: &V,
) -> Result<(ValidationResult, Amount)> {
    if tx.is_coinbase() {
        return Ok((ValidationResult::Valid, 0));
    }

    if !view.has_inputs(tx) {
        return Ok((ValidationResult::Invalid(RejectReason::InputsMissingOrSpent), 0));
    }

    let value_in = match view.value_in(tx) {
        Ok(value) => value,
        Err(reason) => return Ok((ValidationResult::Invalid(reason), 0)),
    };

    let value_out = match tx.value_out() {
        Some(value) => value,
        None => return Ok((ValidationResult::Invalid(RejectReason::OutputTotalTooLarge), 0)),
    };

    match calculate_fee(value_in, value_out) {
        Ok(fee) => Ok((ValidationResult::Valid, fee)),
        Err(reason) => Ok((ValidationResult::Invalid(reason), 0)),
    }
}

/// Authorize every input: run `script_sig ++ coin.script_pubkey` and require acceptance.
///
/// Interpreter faults reject the transaction as `bad-tx`; they never escape.
pub fn verify_scripts<V: CoinsView + ?Sized>(tx: &Transaction, view: &V) -> Result<ValidationResult> {
    for (index, input) in tx.inputs().iter().enumerate() {
        let coin = match view.coin(&input.prevout) {
            Some(coin) => coin,
            None => return Ok(ValidationResult::Invalid(RejectReason::InputsMissingOrSpent)),
        };

        let script = combine_scripts(&script_sig(&input.script_sig), &coin.output.script_pubkey);
        match eval_script(&script, tx, index) {
            Ok(outcome) if outcome.is_accepted() => {}
            Ok(outcome) => {
                debug!(
                    "tx {} input {} not authorized (verify passed: {}, stack depth {})",
                    hex::encode(tx.hash()),
                    index,
                    outcome.valid,
                    outcome.stack.len()
                );
                return Ok(ValidationResult::Invalid(RejectReason::BadTx));
            }
            Err(fault) => {
                warn!("tx {} script fault: {}", hex::encode(tx.hash()), fault);
                return Ok(ValidationResult::Invalid(RejectReason::BadTx));
            }
        }
    }

    Ok(ValidationResult::Valid)
}

/// VerifyTx: CheckTxInputs, then script authorization. A coinbase always passes.
pub fn verify_transaction<V: CoinsView + ?Sized>(tx: &Transaction, view: &V) -> Result<ValidationResult> {
    if tx.is_coinbase() {
        return Ok(ValidationResult::Valid);
    }

    let (result, _fee) = check_tx_inputs(tx, view)?;
    if let ValidationResult::Invalid(reason) = result {
        debug!("tx {} rejected: {}", hex::encode(tx.hash()), reason);
        return Ok(result);
    }

    verify_scripts(tx, view)
}
