//! Error types for the gemini-book crate.
//!
//! This module defines the errors that can occur while receiving the Gemini
//! market-data feed, validating its events and moving them through the
//! ingestion pipeline.

use thiserror::Error;

/// The main error type for this crate
#[derive(Debug, Error)]
pub enum Error {
    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Market-data URL could not be built
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Invalid configuration (missing fields, bad format)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Price is unparseable or not strictly positive
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    /// Quantity is unparseable or negative
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Side is neither `bid` nor `ask`
    #[error("Invalid side: {0}")]
    InvalidSide(String),

    /// WebSocket connection closed unexpectedly
    #[error("WebSocket connection closed")]
    ConnectionClosed,

    /// Feed sequence gap detected (missed messages)
    #[error("Sequence gap: expected {expected}, got {got}")]
    SequenceGap {
        /// Expected socket sequence number
        expected: u64,
        /// Actual socket sequence number received
        got: u64,
    },

    /// A book update could not be decoded; its changes are lost
    #[error("Undecodable update at sequence {sequence}: {source}")]
    CorruptUpdate {
        /// Socket sequence number of the update
        sequence: u64,
        /// Decoder error
        source: serde_json::Error,
    },

    /// The consumer side of the ingestion queue has gone away
    #[error("Ingestion queue closed")]
    QueueClosed,

    /// Level store and best-price tracker disagree
    #[error("Order book invariant violated: {0}")]
    Inconsistent(String),

    /// A pipeline task panicked or was cancelled
    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Operation timed out
    #[error("Operation timed out")]
    Timeout,
}

impl Error {
    /// Check if this error rejects a single malformed event
    ///
    /// Validation errors are reported per event and never stop the pipeline.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidPrice(_) | Error::InvalidQuantity(_) | Error::InvalidSide(_)
        )
    }

    /// Check if this error means the feed can no longer be trusted
    ///
    /// A discontinuity requires a reconnect followed by `reset()` and a fresh
    /// snapshot.
    pub fn is_discontinuity(&self) -> bool {
        matches!(
            self,
            Error::ConnectionClosed
                | Error::SequenceGap { .. }
                | Error::CorruptUpdate { .. }
                | Error::WebSocket(_)
        )
    }
}
