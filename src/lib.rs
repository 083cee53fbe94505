//! # gemini-book
//!
//! A live limit order book for the [Gemini](https://www.gemini.com) market-data feed.
//!
//! ## Features
//!
//! - **Order Book State Machine** - Price levels per side with O(1) best bid/ask
//! - **Single Writer** - One consumer task owns the book; the feed only enqueues
//! - **WebSocket Feed** - Sequence checking and reconnection with a fresh snapshot
//! - **Exact Prices** - `rust_decimal` throughout, no floating point
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gemini_book::{Config, LiveBook};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), gemini_book::Error> {
//!     let live = LiveBook::start(Config::new("btcusd")).await?;
//!
//!     let mut updates = live.subscribe();
//!     updates.changed().await.ok();
//!     println!("top of book: {}", *updates.borrow());
//!
//!     let report = live.shutdown().await?;
//!     println!("{}", report.book);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! This crate is organized into several modules:
//!
//! - [`types`] - Book events and Gemini wire messages
//! - [`orderbook`] - Level store, best-price tracking and the book itself
//! - [`pipeline`] - Ingestion queue, consumer loop and shutdown signalling
//! - [`feed`] - WebSocket feed and the pump into the queue
//! - [`live`] - Wires a feed and a consumer into a running book
//! - [`config`] - Symbol, environment and pipeline settings
//! - [`error`] - Error types for the crate
//!
//! The book can also be driven directly, without any tasks:
//!
//! ```rust
//! use gemini_book::OrderBook;
//! use gemini_book::types::{Event, Reason, Side};
//! use rust_decimal_macros::dec;
//!
//! let mut book = OrderBook::new("btcusd");
//! let bid = Event::new(dec!(100.5), dec!(2), Side::Bid, Reason::Snapshot)?;
//! book.apply(&bid);
//!
//! assert_eq!(book.best_bid(), Some(dec!(100.5)));
//! assert_eq!(book.best_ask(), None);
//! # Ok::<(), gemini_book::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod feed;
pub mod live;
pub mod orderbook;
pub mod pipeline;
pub mod types;

// Re-export main types at crate root for convenience
pub use config::Config;
pub use error::Error;
pub use live::{LiveBook, LiveReport};
pub use orderbook::{OrderBook, TopOfBook};

/// Result type alias using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;
