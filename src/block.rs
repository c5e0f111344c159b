//! Block validation pipeline
//!
//! Two checkpoints run in order: a structural check that never touches the
//! ledger, then a connect step that validates every transaction against a
//! private overlay and commits only if all of them pass.

use log::{debug, info};

use crate::coins::{update_coins, CoinsOverlay, CoinsViewMut};
use crate::crypto::double_sha256;
use crate::error::{RejectReason, Result};
use crate::merkle::block_merkle_root;
use crate::serialization::serialize_block_header;
use crate::transaction::{check_transaction, verify_transaction};
use crate::types::*;

/// Block hash: SHA256(SHA256(serialize(header)))
pub fn block_hash(header: &BlockHeader) -> Hash {
    double_sha256(&serialize_block_header(header))
}

/// CheckBlock: ℬ → {valid, invalid}
///
/// For block b = (h, txs):
/// 1. |txs| > 0
/// 2. MerkleRoot(txs) = h.merkle_root
/// 3. txs[0] is coinbase, no other tx is
/// 4. ∀tx ∈ txs: CheckTransaction(tx)
pub fn check_block(block: &Block) -> Result<ValidationResult> {
    let computed_root = match block_merkle_root(&block.transactions) {
        Some(root) => root,
        None => {
            debug!("block has no transactions: {}", RejectReason::CoinbaseMissing);
            return Ok(ValidationResult::Invalid(RejectReason::CoinbaseMissing));
        }
    };

    // 2. Verify Merkle hash
    if computed_root != block.header.merkle_root {
        debug!(
            "merkle root mismatch: header {} computed {}",
            hex::encode(block.header.merkle_root),
            hex::encode(computed_root)
        );
        return Ok(ValidationResult::Invalid(RejectReason::BadMerkleRoot));
    }

    // 3. First transaction must be coinbase, the rest must not be
    if !block.transactions[0].is_coinbase() {
        debug!("first transaction is not a coinbase");
        return Ok(ValidationResult::Invalid(RejectReason::CoinbaseMissing));
    }
    if let Some(i) = block.transactions[1..].iter().position(Transaction::is_coinbase) {
        debug!("extra coinbase at index {}", i + 1);
        return Ok(ValidationResult::Invalid(RejectReason::CoinbaseMultiple));
    }

    // 4. Structural transaction checks
    for (i, tx) in block.transactions.iter().enumerate() {
        if let ValidationResult::Invalid(reason) = check_transaction(tx)? {
            debug!("transaction {} failed structural check: {}", i, reason);
            return Ok(ValidationResult::Invalid(reason));
        }
    }

    Ok(ValidationResult::Valid)
}

/// ConnectBlock: ℬ × 𝒰𝒮 → {valid, invalid} × 𝒰𝒮
///
/// For block b = (h, txs) and ledger us:
/// 1. CheckBlock(b), rejecting without touching us
/// 2. Open an overlay us' over us
/// 3. For each tx ∈ txs in order: VerifyTx(tx, us'), then UpdateCoins(tx, us')
/// 4. Commit us' into us
///
/// Any rejection drops the overlay, leaving `ledger` exactly as it was.
pub fn connect_block<V: CoinsViewMut>(block: &Block, ledger: &mut V) -> Result<ValidationResult> {
    // 1. Structural checks
    if let ValidationResult::Invalid(reason) = check_block(block)? {
        return Ok(ValidationResult::Invalid(reason));
    }

    // 2-3. Validate and apply each transaction against a private overlay
    let changes = {
        let mut overlay = CoinsOverlay::new(&*ledger);
        for (i, tx) in block.transactions.iter().enumerate() {
            if let ValidationResult::Invalid(reason) = verify_transaction(tx, &overlay)? {
                debug!(
                    "block {} rejected at transaction {}: {}",
                    hex::encode(block_hash(&block.header)),
                    i,
                    reason
                );
                return Ok(ValidationResult::Invalid(reason));
            }
            update_coins(&mut overlay, tx);
        }
        overlay.into_changes()
    };

    // 4. Commit
    info!(
        "connected block {} ({} transactions, {} coins created, {} spent)",
        hex::encode(block_hash(&block.header)),
        block.transactions.len(),
        changes.added_count(),
        changes.spent_count()
    );
    ledger.apply_changes(changes);

    Ok(ValidationResult::Valid)
}
