//! Price levels and the per-side level store.
//!
//! # Invariant
//!
//! A [`LevelStore`] never holds an empty [`PriceLevel`]. Every mutation that
//! could leave a level without entries deletes the level instead.
//!
//! # Performance
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | `upsert` | O(1) amortized |
//! | `remove_entry` | O(k), k = entries at the price |
//! | `remove_level` | O(1) |
//! | `best_key` | O(n), n = levels on the side |

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;

use crate::types::{Price, Quantity, Side};

/// All resting quantity entries at one price on one side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceLevel {
    price: Price,
    side: Side,
    /// Entries in arrival order
    entries: Vec<Quantity>,
}

impl PriceLevel {
    fn new(price: Price, side: Side) -> Self {
        Self {
            price,
            side,
            entries: Vec::new(),
        }
    }

    /// Level price
    pub fn price(&self) -> Price {
        self.price
    }

    /// Level side
    pub fn side(&self) -> Side {
        self.side
    }

    /// Resting entries in arrival order
    pub fn entries(&self) -> &[Quantity] {
        &self.entries
    }

    /// Number of resting entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false` for a level obtained from a [`LevelStore`]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all entries, saturating at `Decimal::MAX`
    pub fn total_quantity(&self) -> Quantity {
        self.entries
            .iter()
            .fold(Decimal::ZERO, |acc, q| acc.saturating_add(*q))
    }
}

/// Result of [`LevelStore::remove_entry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRemoval {
    /// No entry with that quantity rests at that price
    NotFound,
    /// One entry removed; the level still has entries
    Removed,
    /// The last entry was removed and the level deleted
    LevelEmptied,
}

/// Per-side mapping from price to resting entries
///
/// Holds no notion of "best" beyond the linear [`best_key`](Self::best_key)
/// scan; the book pairs it with a
/// [`BestPriceTracker`](super::BestPriceTracker) for fast queries.
#[derive(Debug, Clone)]
pub struct LevelStore {
    side: Side,
    levels: FxHashMap<Price, PriceLevel>,
}

impl LevelStore {
    /// Create an empty store for one side
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: FxHashMap::default(),
        }
    }

    /// Side this store holds
    pub fn side(&self) -> Side {
        self.side
    }

    /// Append a resting entry at `price`
    ///
    /// Returns `true` if this created the level.
    pub fn upsert(&mut self, price: Price, quantity: Quantity) -> bool {
        let side = self.side;
        let mut created = false;
        let level = self.levels.entry(price).or_insert_with(|| {
            created = true;
            PriceLevel::new(price, side)
        });
        level.entries.push(quantity);
        created
    }

    /// Remove the first entry at `price` whose quantity equals `quantity`
    ///
    /// Entries are indistinguishable beyond their quantity, so when several
    /// share it the oldest goes. Missing entries are not an error.
    pub fn remove_entry(&mut self, price: Price, quantity: Quantity) -> EntryRemoval {
        let Some(level) = self.levels.get_mut(&price) else {
            return EntryRemoval::NotFound;
        };
        let Some(position) = level.entries.iter().position(|q| *q == quantity) else {
            return EntryRemoval::NotFound;
        };

        level.entries.remove(position);
        if level.entries.is_empty() {
            self.levels.remove(&price);
            EntryRemoval::LevelEmptied
        } else {
            EntryRemoval::Removed
        }
    }

    /// Delete the whole level at `price`, returning it if it existed
    pub fn remove_level(&mut self, price: Price) -> Option<PriceLevel> {
        self.levels.remove(&price)
    }

    /// Check if a level exists at `price`
    pub fn has_level(&self, price: Price) -> bool {
        self.levels.contains_key(&price)
    }

    /// Get the level at `price`
    pub fn get(&self, price: Price) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    /// Check if the side has no levels
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Number of price levels
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Best price by linear scan (max for bids, min for asks)
    pub fn best_key(&self) -> Option<Price> {
        let keys = self.levels.keys().copied();
        match self.side {
            Side::Bid => keys.max(),
            Side::Ask => keys.min(),
        }
    }

    /// Levels sorted best first
    pub fn sorted_levels(&self) -> Vec<&PriceLevel> {
        let mut levels: Vec<&PriceLevel> = self.levels.values().collect();
        match self.side {
            Side::Bid => levels.sort_unstable_by(|a, b| b.price.cmp(&a.price)),
            Side::Ask => levels.sort_unstable_by(|a, b| a.price.cmp(&b.price)),
        }
        levels
    }

    /// Iterate over levels in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &PriceLevel> + '_ {
        self.levels.values()
    }

    /// Sum of all resting quantity on this side, saturating at `Decimal::MAX`
    pub fn total_quantity(&self) -> Quantity {
        self.levels
            .values()
            .fold(Decimal::ZERO, |acc, level| acc.saturating_add(level.total_quantity()))
    }

    /// Remove every level, returning how many were dropped
    pub fn drain(&mut self) -> usize {
        let dropped = self.levels.len();
        self.levels.clear();
        dropped
    }
}
