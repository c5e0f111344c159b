//! Copy-on-write UTXO overlay
//!
//! Provides a layered view over the ledger for block validation. Instead of
//! cloning the whole UTXO set per connect attempt, an overlay records only the
//! coins it adds and the coins it spends.
//!
//! ```text
//! ┌─────────────────┐
//! │  CoinsOverlay   │  ← block-sized changes (added coins, spent tombstones)
//! └────────┬────────┘
//!          │ fallback
//! ┌────────▼────────┐
//! │  parent view    │  ← UtxoSet or another overlay, read-only while borrowed
//! └─────────────────┘
//! ```
//!
//! - Create: O(1)
//! - Lookup: O(1) per layer
//! - Commit: O(changes) via [`CoinsOverlay::into_changes`] + [`CoinsViewMut::apply_changes`]
//!
//! Dropping an overlay without committing discards every speculative write.

use std::collections::HashMap;

use crate::economic::{add_money, money_range};
use crate::error::RejectReason;
use crate::types::*;

impl Coin {
    pub fn new(output: TransactionOutput, is_coinbase: bool) -> Self {
        Self {
            output,
            is_coinbase,
            spent: false,
        }
    }

    pub fn value(&self) -> Amount {
        self.output.value
    }

    pub fn is_spent(&self) -> bool {
        self.spent
    }

    fn spend(&mut self) {
        self.spent = true;
    }
}

/// Read access to a set of coins.
///
/// Implemented by both the canonical [`UtxoSet`] and [`CoinsOverlay`], so
/// validation works against either without duplication.
pub trait CoinsView {
    /// The coin at `outpoint`, iff present and unspent.
    fn coin(&self, outpoint: &OutPoint) -> Option<&Coin>;

    fn has_coin(&self, outpoint: &OutPoint) -> bool {
        self.coin(outpoint).is_some()
    }

    /// Whether every prevout of `tx` is present and unspent. Always true for a coinbase.
    fn has_inputs(&self, tx: &Transaction) -> bool {
        tx.inputs()
            .iter()
            .all(|input| self.has_coin(&input.prevout))
    }

    /// ValueIn: Σ coin values of the transaction's prevouts, range-checked after every addition.
    fn value_in(&self, tx: &Transaction) -> std::result::Result<Amount, RejectReason> {
        let mut total: Amount = 0;
        for input in tx.inputs() {
            let coin = self
                .coin(&input.prevout)
                .ok_or(RejectReason::InputsMissingOrSpent)?;
            if !money_range(coin.value()) {
                return Err(RejectReason::InputValuesOutOfRange);
            }
            total = add_money(total, coin.value()).ok_or(RejectReason::InputValuesOutOfRange)?;
        }
        Ok(total)
    }
}

/// Write access to a set of coins.
pub trait CoinsViewMut: CoinsView {
    /// Insert a coin. Overwriting is permitted but never happens in correct usage.
    fn add_coin(&mut self, outpoint: OutPoint, coin: Coin);

    /// Spend a coin; no-op when it is absent or already spent.
    fn spend_coin(&mut self, outpoint: &OutPoint);

    /// Merge a committed overlay's changes into this view.
    fn apply_changes(&mut self, changes: CoinChanges) {
        for (outpoint, coin) in changes.entries {
            if coin.is_spent() {
                self.spend_coin(&outpoint);
            } else {
                self.add_coin(outpoint, coin);
            }
        }
    }
}

impl CoinsView for UtxoSet {
    #[inline]
    fn coin(&self, outpoint: &OutPoint) -> Option<&Coin> {
        self.get(outpoint).filter(|coin| !coin.is_spent())
    }
}

impl CoinsViewMut for UtxoSet {
    #[inline]
    fn add_coin(&mut self, outpoint: OutPoint, coin: Coin) {
        self.insert(outpoint, coin);
    }

    #[inline]
    fn spend_coin(&mut self, outpoint: &OutPoint) {
        self.remove(outpoint);
    }
}

/// The complete state of an overlay, detached from its parent for commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoinChanges {
    entries: HashMap<OutPoint, Coin>,
}

impl CoinChanges {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn spent_count(&self) -> usize {
        self.entries.values().filter(|coin| coin.is_spent()).count()
    }

    pub fn added_count(&self) -> usize {
        self.len() - self.spent_count()
    }
}

/// Copy-on-write child view of a parent coin set.
#[derive(Debug)]
pub struct CoinsOverlay<'a, V: CoinsView + ?Sized> {
    /// Parent view (read-only)
    base: &'a V,
    /// Coins written in this overlay. Spent coins stay as tombstones so they shadow the parent.
    entries: HashMap<OutPoint, Coin>,
}

impl<'a, V: CoinsView + ?Sized> CoinsOverlay<'a, V> {
    /// Create a new overlay over `base`. No copying of the parent.
    #[inline]
    pub fn new(base: &'a V) -> Self {
        Self {
            base,
            entries: HashMap::new(),
        }
    }

    /// Number of coins added or spent in this overlay.
    #[inline]
    pub fn changes_len(&self) -> usize {
        self.entries.len()
    }

    pub fn base(&self) -> &'a V {
        self.base
    }

    /// Detach this overlay's state so it can be applied to the parent.
    pub fn into_changes(self) -> CoinChanges {
        CoinChanges {
            entries: self.entries,
        }
    }
}

impl<'a, V: CoinsView + ?Sized> CoinsView for CoinsOverlay<'a, V> {
    #[inline]
    fn coin(&self, outpoint: &OutPoint) -> Option<&Coin> {
        match self.entries.get(outpoint) {
            Some(coin) if coin.is_spent() => None,
            Some(coin) => Some(coin),
            None => self.base.coin(outpoint),
        }
    }
}

impl<'a, V: CoinsView + ?Sized> CoinsViewMut for CoinsOverlay<'a, V> {
    #[inline]
    fn add_coin(&mut self, outpoint: OutPoint, coin: Coin) {
        self.entries.insert(outpoint, coin);
    }

    fn spend_coin(&mut self, outpoint: &OutPoint) {
        if let Some(mut coin) = self.coin(outpoint).cloned() {
            coin.spend();
            self.entries.insert(*outpoint, coin);
        }
    }
}

/// Add one coin per output of `tx`, flagged as coinbase iff `tx` is a coinbase.
pub fn add_coins<V: CoinsViewMut + ?Sized>(view: &mut V, tx: &Transaction) {
    let tx_id = tx.hash();
    let is_coinbase = tx.is_coinbase();
    for (i, output) in tx.outputs().iter().enumerate() {
        let outpoint = OutPoint {
            hash: tx_id,
            index: i as u32,
        };
        view.add_coin(outpoint, Coin::new(output.clone(), is_coinbase));
    }
}

/// UpdateCoins: spend every prevout of `tx`, then add its outputs.
pub fn update_coins<V: CoinsViewMut + ?Sized>(view: &mut V, tx: &Transaction) {
    for input in tx.inputs() {
        view.spend_coin(&input.prevout);
    }
    add_coins(view, tx);
}
