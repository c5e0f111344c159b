//! Hash and signature primitives
//!
//! Thin wrappers over the pinned cryptography crates so the rest of the crate
//! only deals in fixed-width digests and byte strings.

use bitcoin_hashes::{sha1 as bitcoin_sha1, sha256d, Hash as BitcoinHash};
use ripemd::Ripemd160;
use secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};
use sha3::Keccak256;

use crate::types::{ByteString, Hash};

/// SHA-256 of `data`
pub fn sha256(data: &[u8]) -> Hash {
    let result = Sha256::digest(data);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// SHA256(SHA256(data))
pub fn double_sha256(data: &[u8]) -> Hash {
    sha256d::Hash::hash(data).into_inner()
}

/// SHA-1 of `data`
pub fn sha1(data: &[u8]) -> [u8; 20] {
    bitcoin_sha1::Hash::hash(data).into_inner()
}

/// RIPEMD-160 of `data`
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    let result = Ripemd160::digest(data);
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&result);
    hash
}

/// RIPEMD160(SHA256(data))
pub fn hash160(data: &[u8]) -> [u8; 20] {
    ripemd160(&sha256(data))
}

/// Keccak-256 (pre-standard SHA-3 padding) of `data`
pub fn keccak256(data: &[u8]) -> Hash {
    let result = Keccak256::digest(data);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Generate a fresh secp256k1 key pair from the thread-local RNG
pub fn generate_keypair() -> (SecretKey, PublicKey) {
    let secp = Secp256k1::new();
    secp.generate_keypair(&mut secp256k1::rand::thread_rng())
}

/// Compressed (33-byte) encoding of a public key
pub fn public_key_bytes(public_key: &PublicKey) -> ByteString {
    public_key.serialize().to_vec()
}

/// Sign a 32-byte message hash, returning the 64-byte compact signature
pub fn sign_hash(message_hash: &Hash, secret_key: &SecretKey) -> ByteString {
    let secp = Secp256k1::signing_only();
    let message = Message::from_digest(*message_hash);
    secp.sign_ecdsa(&message, secret_key)
        .serialize_compact()
        .to_vec()
}

/// Verify a compact ECDSA signature over `message_hash`.
///
/// Malformed keys or signatures verify as `false`.
pub fn verify_signature(signature_bytes: &[u8], pubkey_bytes: &[u8], message_hash: &Hash) -> bool {
    let pubkey = match PublicKey::from_slice(pubkey_bytes) {
        Ok(pk) => pk,
        Err(_) => return false,
    };

    let signature = match Signature::from_compact(signature_bytes) {
        Ok(sig) => sig,
        Err(_) => return false,
    };

    let secp = Secp256k1::verification_only();
    let message = Message::from_digest(*message_hash);
    secp.verify_ecdsa(&message, &signature, &pubkey).is_ok()
}
