//! Core value types and Gemini wire messages.
//!
//! - [`event`] - Validated order-book events (Side, Reason, Event)
//! - [`messages`] - Gemini market-data WebSocket message types

pub mod event;
pub mod messages;

pub use event::{Event, Reason, Side};
pub use messages::MarketDataMessage;

use rust_decimal::Decimal;

/// Price of a level
///
/// Using `Decimal` instead of floating point for:
/// - Exact equality, so one price never splits into two level keys
/// - Exact ordering of bids and asks
///
/// Prices entering the book are normalized (`10.50` and `10.5` are the same
/// key).
pub type Price = Decimal;

/// Resting quantity at a price
pub type Quantity = Decimal;

/// Timestamp in milliseconds since Unix epoch
pub type TimestampMs = u64;
