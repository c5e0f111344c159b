//! Tests for the public Consensus API

use utxo_consensus::crypto::{generate_keypair, public_key_bytes};
use utxo_consensus::mining::{is_valid_block_hash, MiningResult};
use utxo_consensus::script::{pay_to_pubkey_hash, Opcode};
use utxo_consensus::transaction::create_signed_spend;
use utxo_consensus::*;

fn consensus() -> Consensus {
    Consensus::with_config(ConsensusConfig {
        block_reward: 25,
        pow_leading_zeros: 2,
        max_mining_attempts: 1_000_000,
    })
    .unwrap()
}

#[test]
fn test_consensus_new_uses_defaults() {
    let consensus = Consensus::new();
    assert_eq!(consensus.config().block_reward, BLOCK_REWARD);
    assert_eq!(consensus.config().pow_leading_zeros, DEFAULT_POW_LEADING_ZEROS);
    assert_eq!(consensus.config().max_mining_attempts, DEFAULT_MAX_MINING_ATTEMPTS);
}

#[test]
fn test_create_new_block_uses_configured_reward() {
    let consensus = consensus();
    let block = consensus
        .create_new_block(vec![Opcode::Push(vec![1])], vec![], NULL_HASH, 1_700_000_000)
        .unwrap();

    assert_eq!(block.transactions.len(), 1);
    assert_eq!(block.transactions[0].outputs()[0].value, 25);
    assert_eq!(block.header.prev_block_hash, NULL_HASH);
    assert_eq!(block.header.timestamp, 1_700_000_000);
    assert_eq!(
        consensus.block_merkle_root(&block.transactions),
        Some(block.header.merkle_root)
    );
}

#[test]
fn test_mine_block_meets_configured_difficulty() {
    let consensus = consensus();
    let block = consensus
        .create_new_block(vec![], vec![], NULL_HASH, 1_700_000_000)
        .unwrap();
    let (mined, result) = consensus.mine_block(block.clone()).unwrap();

    assert_eq!(result, MiningResult::Success);
    assert!(is_valid_block_hash(&block::block_hash(&mined.header), 2));
    // Only the nonce moves
    assert_eq!(mined.transactions, block.transactions);
    assert_eq!(mined.header.merkle_root, block.header.merkle_root);
}

#[test]
fn test_mining_gives_up_after_attempt_limit() {
    let consensus = Consensus::with_config(ConsensusConfig {
        pow_leading_zeros: 64,
        max_mining_attempts: 5,
        ..ConsensusConfig::default()
    })
    .unwrap();
    let block = consensus
        .create_new_block(vec![], vec![], NULL_HASH, 1_700_000_000)
        .unwrap();
    let (unmined, result) = consensus.mine_block(block).unwrap();

    assert_eq!(result, MiningResult::Failure);
    assert_eq!(unmined.header.nonce, 5);
}

#[test]
fn test_two_block_chain_through_facade() {
    let consensus = consensus();
    let (sk, pk) = generate_keypair();
    let (_, recipient) = generate_keypair();
    let mut ledger = UtxoSet::new();

    let genesis = consensus
        .create_new_block(pay_to_pubkey_hash(&public_key_bytes(&pk)), vec![], NULL_HASH, 1_700_000_000)
        .unwrap();
    let (genesis, _) = consensus.mine_block(genesis).unwrap();
    assert!(consensus.connect_block(&genesis, &mut ledger).unwrap().is_valid());

    let prevout = OutPoint { hash: genesis.transactions[0].hash(), index: 0 };
    let spend = create_signed_spend(&sk, &recipient, 20, prevout);
    assert_eq!(consensus.validate_transaction(&spend).unwrap(), ValidationResult::Valid);
    assert_eq!(consensus.validate_tx_inputs(&spend, &ledger).unwrap(), (ValidationResult::Valid, 5));
    assert_eq!(consensus.verify_transaction(&spend, &ledger).unwrap(), ValidationResult::Valid);

    let next = consensus
        .create_new_block(
            pay_to_pubkey_hash(&public_key_bytes(&recipient)),
            vec![spend.clone()],
            block::block_hash(&genesis.header),
            1_700_000_600,
        )
        .unwrap();
    assert_eq!(consensus.check_block(&next).unwrap(), ValidationResult::Valid);
    assert!(consensus.connect_block(&next, &mut ledger).unwrap().is_valid());

    assert_eq!(ledger.len(), 2);
    assert!(ledger.contains_key(&OutPoint { hash: spend.hash(), index: 0 }));
    assert!(!ledger.contains_key(&prevout));
}

#[test]
fn test_eval_script_through_facade() {
    let consensus = Consensus::new();
    let tx = Transaction::Coinbase { outputs: vec![] };

    let outcome = consensus
        .eval_script(&[Opcode::Push(vec![0]), Opcode::Verify, Opcode::Push(vec![1])], &tx, 0)
        .unwrap();
    assert!(!outcome.valid);
    assert!(!outcome.is_accepted());

    assert!(consensus.eval_script(&[Opcode::If], &tx, 0).is_err());
}

#[test]
fn test_config_from_env_without_overrides() {
    // Variables are not set in the test environment
    let config = ConsensusConfig::default().with_env_overrides(|_| None);
    assert_eq!(config, ConsensusConfig::default());
}
