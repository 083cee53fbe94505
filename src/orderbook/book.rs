//! Order book state machine.
//!
//! Each side pairs a [`LevelStore`] (price -> resting entries) with a
//! [`BestPriceTracker`] (ordered index + cached best). [`OrderBook::apply`]
//! is the only mutation path and dispatches on the event:
//!
//! 1. `remaining == 0` removes the whole level, whatever the reason
//! 2. `Cancel` removes one matching entry
//! 3. `Snapshot` / `Place` append an entry
//! 4. `Trade` / `Unknown` change nothing
//!
//! After every `apply` the best bid is the highest bid level present and the
//! best ask the lowest ask level present.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, trace};

use crate::error::Error;
use crate::types::{Event, Price, Quantity, Reason, Side};

use super::level::{EntryRemoval, LevelStore, PriceLevel};
use super::tracker::BestPriceTracker;

/// What a single [`OrderBook::apply`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A new price level was created
    LevelAdded,
    /// An entry joined an existing level
    EntryAdded,
    /// One entry left a level that still has entries
    EntryRemoved,
    /// A level was deleted
    LevelRemoved {
        /// Entries the level held when it was deleted
        entries: usize,
    },
    /// Nothing matched; the book is unchanged
    Unchanged,
    /// Trade or unknown reason; surfaced but never applied
    Informational,
}

impl Applied {
    /// Whether the book changed
    pub fn mutated(self) -> bool {
        !matches!(self, Applied::Unchanged | Applied::Informational)
    }
}

/// Published view of the book after an update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TopOfBook {
    /// Highest bid price
    pub best_bid: Option<Price>,
    /// Lowest ask price
    pub best_ask: Option<Price>,
    /// Number of bid price levels
    pub bid_level_count: usize,
    /// Number of ask price levels
    pub ask_level_count: usize,
}

impl TopOfBook {
    /// Best ask minus best bid
    pub fn spread(&self) -> Option<Decimal> {
        Some(self.best_ask? - self.best_bid?)
    }
}

impl fmt::Display for TopOfBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |p: Option<Price>| p.map_or_else(|| "-".to_string(), |p| p.to_string());
        write!(
            f,
            "{}\t{}",
            show(self.best_bid),
            show(self.best_ask)
        )
    }
}

#[derive(Debug, Clone)]
struct BookSide {
    levels: LevelStore,
    tracker: BestPriceTracker,
}

impl BookSide {
    fn new(side: Side) -> Self {
        Self {
            levels: LevelStore::new(side),
            tracker: BestPriceTracker::new(side),
        }
    }

    fn apply(&mut self, event: &Event) -> Applied {
        let price = event.price();

        if event.is_level_removal() {
            return match self.levels.remove_level(price) {
                Some(level) => {
                    self.tracker.on_level_removed(price);
                    Applied::LevelRemoved {
                        entries: level.len(),
                    }
                }
                None => Applied::Unchanged,
            };
        }

        match event.reason() {
            Reason::Cancel => match self.levels.remove_entry(price, event.remaining()) {
                EntryRemoval::LevelEmptied => {
                    self.tracker.on_level_removed(price);
                    Applied::LevelRemoved { entries: 1 }
                }
                EntryRemoval::Removed => Applied::EntryRemoved,
                EntryRemoval::NotFound => Applied::Unchanged,
            },
            Reason::Snapshot | Reason::Place => {
                if self.levels.upsert(price, event.remaining()) {
                    self.tracker.on_level_added(price);
                    Applied::LevelAdded
                } else {
                    Applied::EntryAdded
                }
            }
            Reason::Trade | Reason::Unknown => Applied::Informational,
        }
    }

    fn clear(&mut self) -> usize {
        self.tracker.clear();
        self.levels.drain()
    }

    fn verify(&self) -> Result<(), Error> {
        let side = self.levels.side();
        if self.tracker.len() != self.levels.len() {
            return Err(Error::Inconsistent(format!(
                "{side} tracker indexes {} levels, store holds {}",
                self.tracker.len(),
                self.levels.len()
            )));
        }
        if let Some(missing) = self.tracker.prices().find(|p| !self.levels.has_level(*p)) {
            return Err(Error::Inconsistent(format!(
                "{side} tracker indexes {missing} with no level"
            )));
        }
        if let Some(empty) = self.levels.iter().find(|level| level.is_empty()) {
            return Err(Error::Inconsistent(format!(
                "{side} level {} is empty",
                empty.price()
            )));
        }
        let expected = self.levels.best_key();
        if self.tracker.current_best() != expected {
            return Err(Error::Inconsistent(format!(
                "{side} best is {:?}, store says {:?}",
                self.tracker.current_best(),
                expected
            )));
        }
        Ok(())
    }
}

/// Limit order book for a single symbol.
///
/// # Ownership
///
/// The book is not internally synchronized. Exactly one task (the
/// [`Consumer`](crate::pipeline::Consumer)) owns and mutates it; everyone else
/// observes published [`TopOfBook`] copies.
#[derive(Debug, Clone)]
pub struct OrderBook {
    symbol: String,
    bids: BookSide,
    asks: BookSide,
    events_applied: u64,
}

impl OrderBook {
    /// Create a new empty order book for the given symbol
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bids: BookSide::new(Side::Bid),
            asks: BookSide::new(Side::Ask),
            events_applied: 0,
        }
    }

    /// Get the symbol
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Number of events applied since creation or the last reset
    #[must_use]
    pub const fn events_applied(&self) -> u64 {
        self.events_applied
    }

    fn side(&self, side: Side) -> &BookSide {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    /// Apply one event
    ///
    /// Cancels of absent entries and removals of absent levels are no-ops.
    pub fn apply(&mut self, event: &Event) -> Applied {
        let side = match event.side() {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        };
        let applied = side.apply(event);
        self.events_applied += 1;

        match applied {
            Applied::Informational => debug!(
                symbol = %self.symbol,
                side = %event.side(),
                price = %event.price(),
                remaining = %event.remaining(),
                reason = ?event.reason(),
                "informational event"
            ),
            _ => trace!(symbol = %self.symbol, %event, ?applied, "applied"),
        }

        debug_assert!(
            self.verify().is_ok(),
            "order book invariant violated after {event}: {:?}",
            self.verify()
        );

        applied
    }

    /// Clear both sides back to empty
    ///
    /// Called before re-seeding from a fresh snapshot.
    pub fn reset(&mut self) {
        let bids = self.bids.clear();
        let asks = self.asks.clear();
        self.events_applied = 0;
        info!(symbol = %self.symbol, bids, asks, "order book reset");
    }

    /// Reset, then apply every event in order
    pub fn reseed<'a>(&mut self, events: impl IntoIterator<Item = &'a Event>) {
        self.reset();
        for event in events {
            self.apply(event);
        }
    }

    /// Get the best (highest) bid price
    #[must_use]
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.tracker.current_best()
    }

    /// Get the best (lowest) ask price
    #[must_use]
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.tracker.current_best()
    }

    /// Number of price levels on one side
    #[must_use]
    pub fn depth(&self, side: Side) -> usize {
        self.side(side).levels.len()
    }

    /// Snapshot of the top of the book
    #[must_use]
    pub fn top_of_book(&self) -> TopOfBook {
        TopOfBook {
            best_bid: self.best_bid(),
            best_ask: self.best_ask(),
            bid_level_count: self.depth(Side::Bid),
            ask_level_count: self.depth(Side::Ask),
        }
    }

    /// Get the mid price
    ///
    /// Returns the average of best bid and best ask, or `None` if either is missing.
    #[must_use]
    pub fn mid_price(&self) -> Option<Decimal> {
        let (bid, ask) = (self.best_bid()?, self.best_ask()?);
        // Both are positive, so the difference cannot overflow
        bid.checked_add((ask - bid) / Decimal::TWO)
    }

    /// Get the spread (best ask - best bid)
    #[must_use]
    pub fn spread(&self) -> Option<Decimal> {
        Some(self.best_ask()? - self.best_bid()?)
    }

    /// Check if the book is crossed (best bid >= best ask)
    ///
    /// The book never matches orders, so a crossed feed stays crossed here.
    #[must_use]
    pub fn is_crossed(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => bid >= ask,
            _ => false,
        }
    }

    /// Copy of the level at `price`
    #[must_use]
    pub fn level(&self, side: Side, price: Price) -> Option<PriceLevel> {
        self.side(side).levels.get(price.normalize()).cloned()
    }

    /// Copies of all levels on one side, best first
    #[must_use]
    pub fn levels(&self, side: Side) -> Vec<PriceLevel> {
        self.side(side)
            .levels
            .sorted_levels()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Best `n` levels as `(price, total quantity)`
    #[must_use]
    pub fn top_levels(&self, side: Side, n: usize) -> Vec<(Price, Quantity)> {
        let book_side = self.side(side);
        book_side
            .tracker
            .prices()
            .take(n)
            .filter_map(|price| book_side.levels.get(price))
            .map(|level| (level.price(), level.total_quantity()))
            .collect()
    }

    /// Total resting quantity on one side
    #[must_use]
    pub fn total_quantity(&self, side: Side) -> Quantity {
        self.side(side).levels.total_quantity()
    }

    /// Check if the order book is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.levels.is_empty() && self.asks.levels.is_empty()
    }

    /// Check that each tracker agrees with its level store
    ///
    /// # Errors
    ///
    /// Returns [`Error::Inconsistent`] describing the first disagreement.
    pub fn verify(&self) -> Result<(), Error> {
        self.bids.verify()?;
        self.asks.verify()
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new("")
    }
}

impl fmt::Display for OrderBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "============ BOOK STATE ============")?;
        writeln!(f, "Bids: {}", self.depth(Side::Bid))?;
        writeln!(f, "Asks: {}", self.depth(Side::Ask))?;
        write!(f, "{}", self.top_of_book())
    }
}
