//! End-to-end block connection against a ledger

use secp256k1::{PublicKey, SecretKey};
use utxo_consensus::block::{block_hash, connect_block};
use utxo_consensus::coins::CoinsView;
use utxo_consensus::crypto::{generate_keypair, public_key_bytes};
use utxo_consensus::mining::create_new_block;
use utxo_consensus::script::pay_to_pubkey_hash;
use utxo_consensus::transaction::create_signed_spend;
use utxo_consensus::*;

const TIMESTAMP: Natural = 1_700_000_000;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn p2pkh(public_key: &PublicKey) -> script::Script {
    pay_to_pubkey_hash(&public_key_bytes(public_key))
}

fn outpoint(tx: &Transaction, index: u32) -> OutPoint {
    OutPoint { hash: tx.hash(), index }
}

struct Chain {
    ledger: UtxoSet,
    tip: Hash,
    k1: (SecretKey, PublicKey),
    k2: (SecretKey, PublicKey),
    k3: (SecretKey, PublicKey),
}

/// Scenario A: an empty ledger plus a block holding a single coinbase paying 50 to K1
fn scenario_a() -> (Chain, Transaction) {
    let k1 = generate_keypair();
    let k2 = generate_keypair();
    let k3 = generate_keypair();

    let block = create_new_block(p2pkh(&k1.1), BLOCK_REWARD, vec![], NULL_HASH, TIMESTAMP).unwrap();
    let coinbase = block.transactions[0].clone();

    let mut ledger = UtxoSet::new();
    assert_eq!(connect_block(&block, &mut ledger).unwrap(), ValidationResult::Valid);

    let chain = Chain {
        ledger,
        tip: block_hash(&block.header),
        k1,
        k2,
        k3,
    };
    (chain, coinbase)
}

/// T1: coinbase → K2 (50), T2: T1 → K3 (49), T3: T2 → K1 (48)
fn spend_chain(chain: &Chain, coinbase: &Transaction) -> [Transaction; 3] {
    let t1 = create_signed_spend(&chain.k1.0, &chain.k2.1, 50, outpoint(coinbase, 0));
    let t2 = create_signed_spend(&chain.k2.0, &chain.k3.1, 49, outpoint(&t1, 0));
    let t3 = create_signed_spend(&chain.k3.0, &chain.k1.1, 48, outpoint(&t2, 0));
    [t1, t2, t3]
}

#[test]
fn test_scenario_a_single_coinbase() {
    init_logging();
    let (chain, coinbase) = scenario_a();

    assert_eq!(chain.ledger.len(), 1);
    let coin = chain.ledger.coin(&outpoint(&coinbase, 0)).unwrap();
    assert_eq!(coin.value(), 50);
    assert!(coin.is_coinbase);
    assert_eq!(coin.output.script_pubkey, p2pkh(&chain.k1.1));
}

#[test]
fn test_scenario_b_chained_spends_in_one_block() {
    init_logging();
    let (mut chain, coinbase) = scenario_a();
    let [t1, t2, t3] = spend_chain(&chain, &coinbase);

    // The new reward goes to K3 so its outpoint differs from the first coinbase
    let block = create_new_block(
        p2pkh(&chain.k3.1),
        BLOCK_REWARD,
        vec![t1.clone(), t2.clone(), t3.clone()],
        chain.tip,
        TIMESTAMP + 600,
    )
    .unwrap();
    let reward = block.transactions[0].clone();

    assert_eq!(connect_block(&block, &mut chain.ledger).unwrap(), ValidationResult::Valid);

    assert_eq!(chain.ledger.len(), 2);
    assert!(!chain.ledger.has_coin(&outpoint(&coinbase, 0)));
    assert!(!chain.ledger.has_coin(&outpoint(&t1, 0)));
    assert!(!chain.ledger.has_coin(&outpoint(&t2, 0)));

    let coin = chain.ledger.coin(&outpoint(&t3, 0)).unwrap();
    assert_eq!(coin.value(), 48);
    assert!(!coin.is_coinbase);
    assert_eq!(coin.output.script_pubkey, p2pkh(&chain.k1.1));

    let reward_coin = chain.ledger.coin(&outpoint(&reward, 0)).unwrap();
    assert_eq!(reward_coin.value(), BLOCK_REWARD);
    assert!(reward_coin.is_coinbase);
}

#[test]
fn test_scenario_c_wrong_signer_rejects_whole_block() {
    init_logging();
    let (mut chain, coinbase) = scenario_a();
    let [t1, mut t2, t3] = spend_chain(&chain, &coinbase);

    let (intruder, _) = generate_keypair();
    let forged = t2.sign(&intruder);
    if let Transaction::Normal { inputs, .. } = &mut t2 {
        inputs[0].script_sig.signature = forged;
    }

    let block = create_new_block(
        p2pkh(&chain.k3.1),
        BLOCK_REWARD,
        vec![t1, t2, t3],
        chain.tip,
        TIMESTAMP + 600,
    )
    .unwrap();

    let before = chain.ledger.clone();
    assert_eq!(
        connect_block(&block, &mut chain.ledger).unwrap(),
        ValidationResult::Invalid(RejectReason::BadTx)
    );
    assert_eq!(chain.ledger, before);
}

#[test]
fn test_double_spend_within_block() {
    init_logging();
    let (mut chain, coinbase) = scenario_a();

    let first = create_signed_spend(&chain.k1.0, &chain.k2.1, 50, outpoint(&coinbase, 0));
    let second = create_signed_spend(&chain.k1.0, &chain.k3.1, 50, outpoint(&coinbase, 0));

    let block = create_new_block(
        p2pkh(&chain.k3.1),
        BLOCK_REWARD,
        vec![first, second],
        chain.tip,
        TIMESTAMP + 600,
    )
    .unwrap();

    let before = chain.ledger.clone();
    assert_eq!(
        connect_block(&block, &mut chain.ledger).unwrap(),
        ValidationResult::Invalid(RejectReason::InputsMissingOrSpent)
    );
    assert_eq!(chain.ledger, before);
}

#[test]
fn test_spend_from_earlier_block_only_once() {
    init_logging();
    let (mut chain, coinbase) = scenario_a();

    let spend = create_signed_spend(&chain.k1.0, &chain.k2.1, 40, outpoint(&coinbase, 0));
    let block = create_new_block(
        p2pkh(&chain.k2.1),
        BLOCK_REWARD,
        vec![spend.clone()],
        chain.tip,
        TIMESTAMP + 600,
    )
    .unwrap();
    assert!(connect_block(&block, &mut chain.ledger).unwrap().is_valid());

    // Replaying the same spend in a later block finds the coin gone
    let replay = create_new_block(
        p2pkh(&chain.k3.1),
        BLOCK_REWARD,
        vec![spend],
        block_hash(&block.header),
        TIMESTAMP + 1200,
    )
    .unwrap();
    assert_eq!(
        connect_block(&replay, &mut chain.ledger).unwrap(),
        ValidationResult::Invalid(RejectReason::InputsMissingOrSpent)
    );
}

#[test]
fn test_valid_then_invalid_transaction_is_atomic() {
    init_logging();
    let (mut chain, coinbase) = scenario_a();

    let t1 = create_signed_spend(&chain.k1.0, &chain.k2.1, 50, outpoint(&coinbase, 0));
    // Creates value out of nothing
    let t2 = create_signed_spend(&chain.k2.0, &chain.k3.1, 51, outpoint(&t1, 0));

    let block = create_new_block(
        p2pkh(&chain.k3.1),
        BLOCK_REWARD,
        vec![t1.clone(), t2],
        chain.tip,
        TIMESTAMP + 600,
    )
    .unwrap();

    let before = chain.ledger.clone();
    assert_eq!(
        connect_block(&block, &mut chain.ledger).unwrap(),
        ValidationResult::Invalid(RejectReason::InBelowOut)
    );
    assert_eq!(chain.ledger, before);
    assert!(!chain.ledger.has_coin(&outpoint(&t1, 0)));
    assert!(chain.ledger.has_coin(&outpoint(&coinbase, 0)));
}

#[test]
fn test_transaction_before_coinbase_rejected() {
    init_logging();
    let (mut chain, coinbase) = scenario_a();
    let spend = create_signed_spend(&chain.k1.0, &chain.k2.1, 50, outpoint(&coinbase, 0));

    let mut block = create_new_block(
        p2pkh(&chain.k3.1),
        BLOCK_REWARD,
        vec![spend],
        chain.tip,
        TIMESTAMP + 600,
    )
    .unwrap();
    block.transactions.swap(0, 1);
    block.header.merkle_root = merkle::block_merkle_root(&block.transactions).unwrap();

    let before = chain.ledger.clone();
    assert_eq!(
        connect_block(&block, &mut chain.ledger).unwrap(),
        ValidationResult::Invalid(RejectReason::CoinbaseMissing)
    );
    assert_eq!(chain.ledger, before);
}

#[test]
fn test_tampered_output_breaks_merkle_commitment() {
    init_logging();
    let (mut chain, coinbase) = scenario_a();
    let spend = create_signed_spend(&chain.k1.0, &chain.k2.1, 50, outpoint(&coinbase, 0));

    let mut block = create_new_block(
        p2pkh(&chain.k3.1),
        BLOCK_REWARD,
        vec![spend],
        chain.tip,
        TIMESTAMP + 600,
    )
    .unwrap();
    if let Transaction::Normal { outputs, .. } = &mut block.transactions[1] {
        outputs[0].value = 10;
    }

    assert_eq!(
        connect_block(&block, &mut chain.ledger).unwrap(),
        ValidationResult::Invalid(RejectReason::BadMerkleRoot)
    );
}

#[test]
fn test_fee_is_left_unclaimed() {
    init_logging();
    let (mut chain, coinbase) = scenario_a();
    let spend = create_signed_spend(&chain.k1.0, &chain.k2.1, 30, outpoint(&coinbase, 0));

    let (result, fee) = transaction::check_tx_inputs(&spend, &chain.ledger).unwrap();
    assert_eq!(result, ValidationResult::Valid);
    assert_eq!(fee, 20);

    let block = create_new_block(
        p2pkh(&chain.k3.1),
        BLOCK_REWARD,
        vec![spend.clone()],
        chain.tip,
        TIMESTAMP + 600,
    )
    .unwrap();
    assert!(connect_block(&block, &mut chain.ledger).unwrap().is_valid());

    let total: Amount = chain.ledger.values().map(|coin| coin.value()).sum();
    assert_eq!(total, 30 + BLOCK_REWARD);
}
