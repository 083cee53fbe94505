//! Limit order book built from feed events.
//!
//! This module provides the single-symbol book and its two building blocks:
//!
//! - [`LevelStore`] - price -> resting entries, per side
//! - [`BestPriceTracker`] - ordered price index with a cached best, per side
//! - [`OrderBook`] - the event-application state machine composing both
//!
//! # Example
//!
//! ```rust
//! use gemini_book::orderbook::OrderBook;
//! use gemini_book::types::{Event, Reason, Side};
//! use rust_decimal_macros::dec;
//!
//! let mut book = OrderBook::new("btcusd");
//!
//! book.apply(&Event::new(dec!(10), dec!(5), Side::Bid, Reason::Place).unwrap());
//! book.apply(&Event::new(dec!(9), dec!(8), Side::Ask, Reason::Place).unwrap());
//!
//! assert_eq!(book.best_bid(), Some(dec!(10)));
//! assert_eq!(book.best_ask(), Some(dec!(9)));
//! ```

pub mod book;
pub mod level;
pub mod tracker;

pub use book::{Applied, OrderBook, TopOfBook};
pub use level::{EntryRemoval, LevelStore, PriceLevel};
pub use tracker::BestPriceTracker;
