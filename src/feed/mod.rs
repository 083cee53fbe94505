//! Feed source: receives Gemini market data and feeds the ingestion queue.
//!
//! - [`sequence`] - `socket_sequence` checking and frame decoding
//! - [`websocket`] - WebSocket client with reconnection
//! - [`source`] - pump turning feed messages into [`BookCommand`](crate::pipeline::BookCommand)s
//!
//! Anything implementing [`MarketFeed`] can drive the pipeline, which is how
//! tests replay scripted sessions without a network.

pub mod sequence;
pub mod source;
pub mod websocket;

use std::future::Future;

use crate::error::Error;
use crate::types::MarketDataMessage;

pub use sequence::SequenceTracker;
pub use source::{FeedSource, FeedStats};
pub use websocket::{GeminiFeed, ReconnectConfig, ReconnectingFeed};

/// Item produced by a [`MarketFeed`]
#[derive(Debug, Clone)]
pub enum FeedMessage {
    /// A new connection was established; a full snapshot follows and the
    /// book must be reset first
    Connected,
    /// A message from the exchange
    Market(MarketDataMessage),
}

/// Source of market-data messages
pub trait MarketFeed: Send {
    /// Receive the next message, or `None` once the feed has ended
    fn next(&mut self) -> impl Future<Output = Option<Result<FeedMessage, Error>>> + Send;
}
