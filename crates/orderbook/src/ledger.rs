//! One side of the book: price levels kept in best-first order.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use model::PriceLevel;

/// Map key that encodes a side's sort rule in its `Ord` impl.
///
/// `u64` iterates ascending (asks); `Reverse<u64>` iterates descending (bids).
pub trait LevelKey: Ord + Copy {
    fn from_price(price: u64) -> Self;
    fn price(self) -> u64;
}

impl LevelKey for u64 {
    fn from_price(price: u64) -> Self {
        price
    }

    fn price(self) -> u64 {
        self
    }
}

impl LevelKey for Reverse<u64> {
    fn from_price(price: u64) -> Self {
        Reverse(price)
    }

    fn price(self) -> u64 {
        self.0
    }
}

/// Price → quantity ledger for one side of the book.
///
/// Backed by a `BTreeMap`, so iteration is always in best-first order and
/// no entry ever holds a zero quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceLevelLedger<K: LevelKey> {
    levels: BTreeMap<K, u64>,
}

/// Bid side, highest price first.
pub type BidLedger = PriceLevelLedger<Reverse<u64>>;

/// Ask side, lowest price first.
pub type AskLedger = PriceLevelLedger<u64>;

impl<K: LevelKey> PriceLevelLedger<K> {
    /// Returns an empty ledger.
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    /// Set the quantity at `price`; a zero quantity removes the level.
    pub fn upsert(&mut self, price: u64, quantity: u64) {
        let key = K::from_price(price);
        if quantity == 0 {
            self.levels.remove(&key);
        } else {
            self.levels.insert(key, quantity);
        }
    }

    /// The first `n` levels, best first.
    ///
    /// The iterator borrows the ledger and can be cloned to restart it.
    pub fn top_n(&self, n: usize) -> impl Iterator<Item = PriceLevel> + Clone + '_ {
        self.levels
            .iter()
            .take(n)
            .map(|(key, qty)| PriceLevel::new(key.price(), *qty))
    }

    /// Best level on this side.
    pub fn best(&self) -> Option<PriceLevel> {
        self.top_n(1).next()
    }

    /// Quantity resting at `price`, if the level exists.
    pub fn quantity_at(&self, price: u64) -> Option<u64> {
        self.levels.get(&K::from_price(price)).copied()
    }

    /// Returns the number of levels.
    pub fn size(&self) -> usize {
        self.levels.len()
    }

    /// Returns true if the ledger holds no levels.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Removes every level.
    pub fn clear(&mut self) {
        self.levels.clear();
    }
}
