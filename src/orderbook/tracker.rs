//! Best-price tracking for one side of the book.
//!
//! The tracker keeps an ordered index of the prices that currently have a
//! level, plus a cached best. Removing the cached best recomputes it from the
//! index, so the next-best price takes over instead of the side reporting no
//! best at all while levels remain.

use std::collections::BTreeSet;

use crate::types::{Price, Side};

/// Ordered index of present price levels with a cached best price
#[derive(Debug, Clone)]
pub struct BestPriceTracker {
    side: Side,
    /// Prices with at least one resting entry, ascending
    index: BTreeSet<Price>,
    best: Option<Price>,
}

impl BestPriceTracker {
    /// Create an empty tracker for one side
    pub fn new(side: Side) -> Self {
        Self {
            side,
            index: BTreeSet::new(),
            best: None,
        }
    }

    /// Record that a level now exists at `price`
    pub fn on_level_added(&mut self, price: Price) {
        if !self.index.insert(price) {
            return;
        }
        match self.best {
            Some(best) if !self.side.improves(price, best) => {}
            _ => self.best = Some(price),
        }
    }

    /// Record that the level at `price` is gone
    pub fn on_level_removed(&mut self, price: Price) {
        if self.index.remove(&price) && self.best == Some(price) {
            self.best = self.recompute();
        }
    }

    /// Best price on this side, `None` only when the side is empty
    pub fn current_best(&self) -> Option<Price> {
        self.best
    }

    /// Number of indexed levels
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if no levels are indexed
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Check if `price` is indexed
    pub fn contains(&self, price: Price) -> bool {
        self.index.contains(&price)
    }

    /// Forget every level
    pub fn clear(&mut self) {
        self.index.clear();
        self.best = None;
    }

    /// Indexed prices, best first
    pub fn prices(&self) -> Box<dyn Iterator<Item = Price> + '_> {
        match self.side {
            Side::Bid => Box::new(self.index.iter().rev().copied()),
            Side::Ask => Box::new(self.index.iter().copied()),
        }
    }

    fn recompute(&self) -> Option<Price> {
        match self.side {
            Side::Bid => self.index.last().copied(),
            Side::Ask => self.index.first().copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_added_levels_update_best() {
        let mut bids = BestPriceTracker::new(Side::Bid);
        bids.on_level_added(dec!(9));
        assert_eq!(bids.current_best(), Some(dec!(9)));
        bids.on_level_added(dec!(10));
        assert_eq!(bids.current_best(), Some(dec!(10)));
        bids.on_level_added(dec!(8));
        assert_eq!(bids.current_best(), Some(dec!(10)));

        let mut asks = BestPriceTracker::new(Side::Ask);
        asks.on_level_added(dec!(9));
        asks.on_level_added(dec!(10));
        asks.on_level_added(dec!(8));
        assert_eq!(asks.current_best(), Some(dec!(8)));
    }

    #[test]
    fn test_removing_best_recomputes_next_best() {
        let mut bids = BestPriceTracker::new(Side::Bid);
        bids.on_level_added(dec!(10));
        bids.on_level_added(dec!(9));

        bids.on_level_removed(dec!(10));
        assert_eq!(bids.current_best(), Some(dec!(9)));

        bids.on_level_removed(dec!(9));
        assert_eq!(bids.current_best(), None);
    }

    #[test]
    fn test_removing_best_ask_recomputes_next_best() {
        let mut asks = BestPriceTracker::new(Side::Ask);
        for price in [dec!(101), dec!(100), dec!(103)] {
            asks.on_level_added(price);
        }

        asks.on_level_removed(dec!(100));
        assert_eq!(asks.current_best(), Some(dec!(101)));
    }

    #[test]
    fn test_removing_non_best_keeps_best() {
        let mut bids = BestPriceTracker::new(Side::Bid);
        bids.on_level_added(dec!(10));
        bids.on_level_added(dec!(9));

        bids.on_level_removed(dec!(9));
        assert_eq!(bids.current_best(), Some(dec!(10)));
        assert_eq!(bids.len(), 1);
    }

    #[test]
    fn test_removing_unknown_price_is_noop() {
        let mut asks = BestPriceTracker::new(Side::Ask);
        asks.on_level_added(dec!(5));
        asks.on_level_removed(dec!(6));
        assert_eq!(asks.current_best(), Some(dec!(5)));
    }

    #[test]
    fn test_duplicate_add_is_idempotent() {
        let mut bids = BestPriceTracker::new(Side::Bid);
        bids.on_level_added(dec!(10));
        bids.on_level_added(dec!(10));
        assert_eq!(bids.len(), 1);

        bids.on_level_removed(dec!(10));
        assert!(bids.is_empty());
        assert_eq!(bids.current_best(), None);
    }

    #[test]
    fn test_prices_best_first() {
        let mut bids = BestPriceTracker::new(Side::Bid);
        for price in [dec!(1), dec!(3), dec!(2)] {
            bids.on_level_added(price);
        }
        let prices: Vec<_> = bids.prices().collect();
        assert_eq!(prices, vec![dec!(3), dec!(2), dec!(1)]);

        bids.clear();
        assert_eq!(bids.current_best(), None);
    }
}
