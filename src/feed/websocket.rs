//! WebSocket client for the Gemini v1 market-data feed.
//!
//! This module provides:
//!
//! - [`GeminiFeed`] - one connection, with ping handling and
//!   `socket_sequence` gap detection
//! - [`ReconnectingFeed`] - reconnects with exponential backoff and announces
//!   every new connection so the book can be reset before the fresh snapshot
//!
//! # Example
//!
//! ```rust,no_run
//! use gemini_book::Config;
//! use gemini_book::feed::{FeedMessage, ReconnectingFeed};
//!
//! # async fn example() -> gemini_book::Result<()> {
//! let mut feed = ReconnectingFeed::connect(Config::new("btcusd")).await?;
//!
//! while let Some(message) = feed.next().await {
//!     match message? {
//!         FeedMessage::Connected => println!("fresh snapshot follows"),
//!         FeedMessage::Market(msg) => println!("seq {}", msg.socket_sequence()),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::Error;
use crate::types::MarketDataMessage;

use super::sequence::{decode, SequenceTracker};
use super::{FeedMessage, MarketFeed};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A single market-data WebSocket connection
///
/// The server numbers every message on a connection with `socket_sequence`,
/// starting at 0. A skipped number means messages were lost and the book can
/// no longer be trusted.
pub struct GeminiFeed {
    write: SplitSink<WsStream, Message>,
    read: SplitStream<WsStream>,
    symbol: String,
    sequence: SequenceTracker,
}

impl fmt::Debug for GeminiFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiFeed")
            .field("symbol", &self.symbol)
            .field("next_sequence", &self.sequence.next())
            .finish()
    }
}

impl GeminiFeed {
    /// Connect to the market-data feed for the configured symbol
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the handshake fails, or it
    /// does not complete within [`Config::timeout`].
    pub async fn connect(config: &Config) -> Result<Self, Error> {
        let url = config.market_data_url()?;

        let (ws_stream, _response) = tokio::time::timeout(
            config.timeout(),
            tokio_tungstenite::connect_async(url.as_str()),
        )
        .await
        .map_err(|_| Error::Timeout)??;
        let (write, read) = ws_stream.split();

        info!(symbol = %config.symbol(), %url, "connected to market data");

        Ok(Self {
            write,
            read,
            symbol: config.symbol().to_string(),
            sequence: SequenceTracker::new(),
        })
    }

    /// Sequence number the next message must carry
    pub fn next_sequence(&self) -> u64 {
        self.sequence.next()
    }

    /// Receive the next message from the WebSocket
    ///
    /// # Returns
    ///
    /// The next message, or `None` if the stream ended. A close frame is
    /// reported as [`Error::ConnectionClosed`] and a skipped sequence number
    /// as [`Error::SequenceGap`].
    pub async fn next(&mut self) -> Option<Result<MarketDataMessage, Error>> {
        loop {
            match self.read.next().await? {
                Ok(Message::Text(text)) => return Some(decode(&text, &mut self.sequence)),
                Ok(Message::Ping(data)) => {
                    // Respond to pings automatically
                    if let Err(e) = self.write.send(Message::Pong(data)).await {
                        return Some(Err(e.into()));
                    }
                }
                Ok(Message::Close(frame)) => {
                    info!(symbol = %self.symbol, ?frame, "server closed connection");
                    return Some(Err(Error::ConnectionClosed));
                }
                Ok(_) => {
                    // Ignore other message types (Binary, Pong, Frame)
                    continue;
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }

    /// Close the WebSocket connection
    pub async fn close(&mut self) -> Result<(), Error> {
        self.write.close().await?;
        Ok(())
    }
}

/// Configuration for reconnection behavior
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Maximum number of reconnection attempts (0 = infinite)
    pub max_retries: u32,
    /// Initial delay between reconnection attempts
    pub initial_delay_ms: u64,
    /// Maximum delay between reconnection attempts
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_retries: 10,
            initial_delay_ms: 100,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl ReconnectConfig {
    /// Create a new reconnect config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum retries (0 = infinite)
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set initial delay in milliseconds
    pub fn initial_delay_ms(mut self, ms: u64) -> Self {
        self.initial_delay_ms = ms;
        self
    }

    /// Set maximum delay in milliseconds
    pub fn max_delay_ms(mut self, ms: u64) -> Self {
        self.max_delay_ms = ms;
        self
    }

    /// Set backoff multiplier
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculate delay for a given retry attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        let delay_ms = delay.min(self.max_delay_ms as f64) as u64;
        Duration::from_millis(delay_ms)
    }

    fn exhausted(&self, attempt: u32) -> bool {
        self.max_retries > 0 && attempt >= self.max_retries
    }
}

/// Market-data feed with automatic reconnection.
///
/// Wraps [`GeminiFeed`] and:
/// - reconnects with exponential backoff when the connection drops or a
///   sequence gap is detected
/// - yields [`FeedMessage::Connected`] after every successful connection,
///   including the first, since every connection starts with a full snapshot
pub struct ReconnectingFeed {
    /// The underlying connection
    client: Option<GeminiFeed>,
    /// Configuration for the connection
    config: Config,
    /// Current reconnection attempt
    reconnect_attempt: u32,
    /// A connection was established and not yet announced
    announce: bool,
    /// Successful reconnections so far
    reconnects: u64,
}

impl fmt::Debug for ReconnectingFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconnectingFeed")
            .field("connected", &self.client.is_some())
            .field("symbol", &self.config.symbol())
            .field("reconnect_attempt", &self.reconnect_attempt)
            .field("reconnects", &self.reconnects)
            .finish()
    }
}

impl ReconnectingFeed {
    /// Connect to the market-data feed with reconnection support
    ///
    /// # Errors
    ///
    /// Returns an error if the first connection fails; later failures are
    /// retried per the configured [`ReconnectConfig`].
    pub async fn connect(config: Config) -> Result<Self, Error> {
        let client = GeminiFeed::connect(&config).await?;

        Ok(Self {
            client: Some(client),
            config,
            reconnect_attempt: 0,
            announce: true,
            reconnects: 0,
        })
    }

    /// Number of successful reconnections
    pub fn reconnects(&self) -> u64 {
        self.reconnects
    }

    /// Receive the next message, reconnecting if necessary
    pub async fn next(&mut self) -> Option<Result<FeedMessage, Error>> {
        loop {
            if self.announce {
                self.announce = false;
                return Some(Ok(FeedMessage::Connected));
            }

            if let Some(ref mut client) = self.client {
                match client.next().await {
                    Some(Ok(msg)) => {
                        self.reconnect_attempt = 0; // Reset on successful message
                        return Some(Ok(FeedMessage::Market(msg)));
                    }
                    Some(Err(e)) if e.is_discontinuity() => {
                        warn!(symbol = %self.config.symbol(), error = %e, "feed discontinuity");
                        self.client = None;
                    }
                    None => {
                        warn!(symbol = %self.config.symbol(), "market data stream ended");
                        self.client = None;
                    }
                    Some(Err(e)) => return Some(Err(e)),
                }
            } else if let Err(e) = self.attempt_reconnect().await {
                return Some(Err(e));
            }
        }
    }

    /// Attempt to reconnect with exponential backoff
    async fn attempt_reconnect(&mut self) -> Result<(), Error> {
        loop {
            if self.config.reconnect().exhausted(self.reconnect_attempt) {
                warn!(
                    symbol = %self.config.symbol(),
                    attempts = self.reconnect_attempt,
                    "giving up reconnecting"
                );
                return Err(Error::ConnectionClosed);
            }

            let delay = self.config.reconnect().delay_for_attempt(self.reconnect_attempt);
            tokio::time::sleep(delay).await;

            self.reconnect_attempt += 1;

            match GeminiFeed::connect(&self.config).await {
                Ok(client) => {
                    self.client = Some(client);
                    self.announce = true;
                    self.reconnects += 1;
                    return Ok(());
                }
                Err(e) => {
                    warn!(
                        symbol = %self.config.symbol(),
                        attempt = self.reconnect_attempt,
                        error = %e,
                        "reconnect failed"
                    );
                }
            }
        }
    }

    /// Close the WebSocket connection
    pub async fn close(&mut self) -> Result<(), Error> {
        if let Some(ref mut client) = self.client {
            client.close().await?;
        }
        self.client = None;
        Ok(())
    }
}

impl MarketFeed for ReconnectingFeed {
    async fn next(&mut self) -> Option<Result<FeedMessage, Error>> {
        ReconnectingFeed::next(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconnect_config_default() {
        let config = ReconnectConfig::default();
        assert_eq!(config.max_retries, 10);
        assert_eq!(config.initial_delay_ms, 100);
        assert_eq!(config.max_delay_ms, 30_000);
        assert!((config.backoff_multiplier - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reconnect_config_builder() {
        let config = ReconnectConfig::new()
            .max_retries(5)
            .initial_delay_ms(50)
            .max_delay_ms(10_000)
            .backoff_multiplier(1.5);

        assert_eq!(config.max_retries, 5);
        assert_eq!(config.initial_delay_ms, 50);
        assert_eq!(config.max_delay_ms, 10_000);
        assert!((config.backoff_multiplier - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_delay_calculation() {
        let config = ReconnectConfig::new()
            .initial_delay_ms(100)
            .backoff_multiplier(2.0)
            .max_delay_ms(1000);

        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(800));
        // Should cap at max_delay_ms
        assert_eq!(config.delay_for_attempt(4), Duration::from_millis(1000));
        assert_eq!(config.delay_for_attempt(u32::MAX), Duration::from_millis(1000));
    }

    #[test]
    fn test_retry_exhaustion() {
        let limited = ReconnectConfig::new().max_retries(2);
        assert!(!limited.exhausted(1));
        assert!(limited.exhausted(2));

        let infinite = ReconnectConfig::new().max_retries(0);
        assert!(!infinite.exhausted(u32::MAX));
    }
}
