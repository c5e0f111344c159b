//! Script execution engine
//!
//! A loop-free stack machine over byte strings. Each opcode runs exactly once,
//! left to right, so evaluation cost is linear in the script length.

use log::trace;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::constants::{SCRIPT_FALSE, SCRIPT_TRUE};
use crate::crypto::{hash160, sha1, sha256, verify_signature};
use crate::error::ScriptError;
use crate::types::*;

/// A single instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    Push(ByteString),
    Dup,
    Sha256,
    Sha1,
    Hash160,
    Geq,
    Eq,
    Verify,
    CheckSig,
    If,
}

/// Script: an ordered, immutable sequence of opcodes
pub type Script = Vec<Opcode>;

impl Opcode {
    pub fn name(&self) -> &'static str {
        match self {
            Opcode::Push(_) => "push",
            Opcode::Dup => "dup",
            Opcode::Sha256 => "sha256",
            Opcode::Sha1 => "sha1",
            Opcode::Hash160 => "hash160",
            Opcode::Geq => "geq",
            Opcode::Eq => "eq",
            Opcode::Verify => "verify",
            Opcode::CheckSig => "checksig",
            Opcode::If => "if",
        }
    }

    /// Byte tag used by the canonical serialization
    pub fn tag(&self) -> u8 {
        match self {
            Opcode::Push(_) => 0x4c,
            Opcode::Dup => 0x76,
            Opcode::Sha256 => 0xa8,
            Opcode::Sha1 => 0xa7,
            Opcode::Hash160 => 0xa9,
            Opcode::Geq => 0xa2,
            Opcode::Eq => 0x87,
            Opcode::Verify => 0x69,
            Opcode::CheckSig => 0xac,
            Opcode::If => 0x63,
        }
    }
}

/// Pay-to-pubkey-hash locking script:
/// `dup hash160 push(hash160(pubkey)) eq verify checksig`
pub fn pay_to_pubkey_hash(public_key: &[u8]) -> Script {
    vec![
        Opcode::Dup,
        Opcode::Hash160,
        Opcode::Push(hash160(public_key).to_vec()),
        Opcode::Eq,
        Opcode::Verify,
        Opcode::CheckSig,
    ]
}

/// Hash-preimage puzzle: spendable by anyone revealing `x` with SHA256(x) = `digest`.
pub fn hash_preimage_lock(digest: &Hash) -> Script {
    vec![Opcode::Sha256, Opcode::Push(digest.to_vec()), Opcode::Eq]
}

/// Unlocking script for a spend: `push(signature) push(public_key)`
pub fn script_sig(sig: &ScriptSig) -> Script {
    vec![
        Opcode::Push(sig.signature.clone()),
        Opcode::Push(sig.public_key.clone()),
    ]
}

/// Concatenate an unlocking script with a locking script
pub fn combine_scripts(first: &[Opcode], second: &[Opcode]) -> Script {
    first.iter().chain(second.iter()).cloned().collect()
}

/// Interpret a byte string as an unsigned big-endian integer
pub fn script_num(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}

fn is_zero(bytes: &[u8]) -> bool {
    script_num(bytes) == BigUint::from(0u8)
}

fn bool_bytes(value: bool) -> ByteString {
    vec![if value { SCRIPT_TRUE } else { SCRIPT_FALSE }]
}

/// The transaction input a script is being evaluated for.
#[derive(Debug, Clone, Copy)]
pub struct ScriptContext<'a> {
    pub tx: &'a Transaction,
    pub input_index: usize,
}

/// Result of a completed evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutcome {
    /// Cleared when a `verify` found a zero on top of the stack
    pub valid: bool,
    /// Final stack, top last
    pub stack: Vec<ByteString>,
}

impl ScriptOutcome {
    pub fn top(&self) -> Option<&ByteString> {
        self.stack.last()
    }

    /// Accepted iff no `verify` failed and the stack top exists and is non-zero.
    pub fn is_accepted(&self) -> bool {
        self.valid && self.top().map_or(false, |top| !is_zero(top))
    }
}

/// EvalScript: 𝒮𝒞 × 𝒯𝒳 × ℕ → outcome | fault
///
/// 1. Initialize stack S = ∅
/// 2. For each opcode op in script: execute op against S
///    - precondition violated: fault
///    - `verify` on zero: halt, outcome invalid
/// 3. Return the outcome with the final stack
pub fn eval_script(
    script: &[Opcode],
    tx: &Transaction,
    input_index: usize,
) -> std::result::Result<ScriptOutcome, ScriptError> {
    let ctx = ScriptContext { tx, input_index };
    let mut stack: Vec<ByteString> = Vec::new();

    for (position, opcode) in script.iter().enumerate() {
        trace!(
            "input {} op {} {} (stack depth {})",
            input_index,
            position,
            opcode.name(),
            stack.len()
        );
        if !execute_opcode(opcode, position, &mut stack, &ctx)? {
            return Ok(ScriptOutcome { valid: false, stack });
        }
    }

    Ok(ScriptOutcome { valid: true, stack })
}

/// VerifyScript: run `script_sig ++ script_pubkey` and report acceptance
pub fn verify_script(
    script_sig: &[Opcode],
    script_pubkey: &[Opcode],
    tx: &Transaction,
    input_index: usize,
) -> std::result::Result<bool, ScriptError> {
    let script = combine_scripts(script_sig, script_pubkey);
    Ok(eval_script(&script, tx, input_index)?.is_accepted())
}

fn require(
    stack: &[ByteString],
    required: usize,
    opcode: &Opcode,
    position: usize,
    ctx: &ScriptContext<'_>,
) -> std::result::Result<(), ScriptError> {
    if stack.len() < required {
        return Err(ScriptError::StackUnderflow {
            input_index: ctx.input_index,
            position,
            opcode: opcode.name(),
            required,
            available: stack.len(),
        });
    }
    Ok(())
}

/// Pop `N` items, top first. Checks the depth before touching the stack.
fn pop_n<const N: usize>(
    stack: &mut Vec<ByteString>,
    opcode: &Opcode,
    position: usize,
    ctx: &ScriptContext<'_>,
) -> std::result::Result<[ByteString; N], ScriptError> {
    require(stack, N, opcode, position, ctx)?;
    let mut items: [ByteString; N] = std::array::from_fn(|_| Vec::new());
    for item in items.iter_mut() {
        *item = stack.pop().unwrap_or_default();
    }
    Ok(items)
}

fn top_mut<'s>(
    stack: &'s mut Vec<ByteString>,
    opcode: &Opcode,
    position: usize,
    ctx: &ScriptContext<'_>,
) -> std::result::Result<&'s mut ByteString, ScriptError> {
    require(stack, 1, opcode, position, ctx)?;
    let last = stack.len() - 1;
    Ok(&mut stack[last])
}

/// Execute a single opcode. Returns `Ok(false)` when evaluation must halt as invalid.
fn execute_opcode(
    opcode: &Opcode,
    position: usize,
    stack: &mut Vec<ByteString>,
    ctx: &ScriptContext<'_>,
) -> std::result::Result<bool, ScriptError> {
    match opcode {
        Opcode::Push(literal) => {
            stack.push(literal.clone());
        }

        Opcode::Dup => {
            let item = top_mut(stack, opcode, position, ctx)?.clone();
            stack.push(item);
        }

        Opcode::Sha256 => {
            let top = top_mut(stack, opcode, position, ctx)?;
            *top = sha256(top).to_vec();
        }

        Opcode::Sha1 => {
            let top = top_mut(stack, opcode, position, ctx)?;
            *top = sha1(top).to_vec();
        }

        // RIPEMD160(SHA256(x))
        Opcode::Hash160 => {
            let top = top_mut(stack, opcode, position, ctx)?;
            *top = hash160(top).to_vec();
        }

        Opcode::Geq => {
            let [x, y] = pop_n::<2>(stack, opcode, position, ctx)?;
            stack.push(bool_bytes(script_num(&x) >= script_num(&y)));
        }

        Opcode::Eq => {
            let [x, y] = pop_n::<2>(stack, opcode, position, ctx)?;
            stack.push(bool_bytes(script_num(&x) == script_num(&y)));
        }

        Opcode::Verify => {
            let [top] = pop_n::<1>(stack, opcode, position, ctx)?;
            if is_zero(&top) {
                return Ok(false);
            }
        }

        Opcode::CheckSig => {
            let [public_key, signature] = pop_n::<2>(stack, opcode, position, ctx)?;
            let sighash = ctx.tx.signature_hash();
            stack.push(bool_bytes(verify_signature(&signature, &public_key, &sighash)));
        }

        // Zero selects the "then" value
        Opcode::If => {
            let [condition, then_value, else_value] = pop_n::<3>(stack, opcode, position, ctx)?;
            stack.push(if is_zero(&condition) { then_value } else { else_value });
        }
    }

    Ok(true)
}
