//! Canonical byte encoding for hashing
//!
//! The encoding is deterministic and self-delimiting: every variable-length
//! field is prefixed with its length, so distinct logical values never share
//! an encoding.

use crate::script::Opcode;
use crate::types::*;

const COINBASE_TAG: u8 = 0x00;
const NORMAL_TAG: u8 = 0x01;

/// Encode a number as a Bitcoin varint
pub fn encode_varint(value: u64) -> Vec<u8> {
    if value < 0xfd {
        vec![value as u8]
    } else if value <= 0xffff {
        let mut result = vec![0xfd];
        result.extend_from_slice(&(value as u16).to_le_bytes());
        result
    } else if value <= 0xffffffff {
        let mut result = vec![0xfe];
        result.extend_from_slice(&(value as u32).to_le_bytes());
        result
    } else {
        let mut result = vec![0xff];
        result.extend_from_slice(&value.to_le_bytes());
        result
    }
}

fn write_bytes(data: &mut Vec<u8>, bytes: &[u8]) {
    data.extend_from_slice(&encode_varint(bytes.len() as u64));
    data.extend_from_slice(bytes);
}

/// Append the encoding of `script` to `data`
pub fn write_script(data: &mut Vec<u8>, script: &[Opcode]) {
    data.extend_from_slice(&encode_varint(script.len() as u64));
    for opcode in script {
        data.push(opcode.tag());
        if let Opcode::Push(literal) = opcode {
            write_bytes(data, literal);
        }
    }
}

/// Serialize a script on its own
pub fn serialize_script(script: &[Opcode]) -> Vec<u8> {
    let mut data = Vec::new();
    write_script(&mut data, script);
    data
}

fn write_outputs(data: &mut Vec<u8>, outputs: &[TransactionOutput]) {
    data.extend_from_slice(&encode_varint(outputs.len() as u64));
    for output in outputs {
        // Value (8 bytes, little-endian)
        data.extend_from_slice(&output.value.to_le_bytes());
        write_script(data, &output.script_pubkey);
    }
}

/// Serialize a transaction: variant tag, inputs (normal only), outputs
pub fn serialize_transaction(tx: &Transaction) -> Vec<u8> {
    let mut data = Vec::new();

    match tx {
        Transaction::Coinbase { outputs } => {
            data.push(COINBASE_TAG);
            write_outputs(&mut data, outputs);
        }
        Transaction::Normal { inputs, outputs } => {
            data.push(NORMAL_TAG);
            data.extend_from_slice(&encode_varint(inputs.len() as u64));
            for input in inputs {
                // Previous output hash (32 bytes)
                data.extend_from_slice(&input.prevout.hash);
                // Previous output index (4 bytes, little-endian)
                data.extend_from_slice(&input.prevout.index.to_le_bytes());
                write_bytes(&mut data, &input.script_sig.signature);
                write_bytes(&mut data, &input.script_sig.public_key);
            }
            write_outputs(&mut data, outputs);
        }
    }

    data
}

/// Serialize a block header (80 bytes, fixed width)
pub fn serialize_block_header(header: &BlockHeader) -> Vec<u8> {
    let mut data = Vec::with_capacity(80);

    // Previous block hash (32 bytes)
    data.extend_from_slice(&header.prev_block_hash);

    // Merkle root (32 bytes)
    data.extend_from_slice(&header.merkle_root);

    // Timestamp (8 bytes, little-endian)
    data.extend_from_slice(&header.timestamp.to_le_bytes());

    // Nonce (8 bytes, little-endian)
    data.extend_from_slice(&header.nonce.to_le_bytes());

    data
}
