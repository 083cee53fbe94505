//! Pump from a [`MarketFeed`] into the ingestion queue.
//!
//! This is the ingestion boundary: change events are validated here and only
//! well-formed [`Event`]s are enqueued. Every new connection is forwarded as
//! [`BookCommand::Reset`](crate::pipeline::BookCommand::Reset) ahead of the
//! snapshot it brings.

use tracing::{debug, info, trace, warn};

use crate::error::Error;
use crate::pipeline::{FeedSender, Shutdown};
use crate::types::messages::{UpdateMsg, WireEvent};
use crate::types::{Event, MarketDataMessage};

use super::{FeedMessage, MarketFeed};

/// Counters kept by the feed source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    /// Exchange messages received
    pub messages: u64,
    /// Events enqueued for the book
    pub forwarded: u64,
    /// Malformed events dropped at the boundary
    pub rejected: u64,
    /// Trade events seen
    pub trades: u64,
    /// Heartbeats seen
    pub heartbeats: u64,
    /// Messages that failed to decode
    pub undecodable: u64,
    /// Resets requested (one per connection)
    pub resets: u64,
}

/// Drives a [`MarketFeed`] and forwards its events to the consumer
#[derive(Debug)]
pub struct FeedSource<F> {
    feed: F,
    queue: FeedSender,
    symbol: String,
    stats: FeedStats,
}

impl<F: MarketFeed> FeedSource<F> {
    /// Create a feed source writing into `queue`
    pub fn new(feed: F, queue: FeedSender, symbol: impl Into<String>) -> Self {
        Self {
            feed,
            queue,
            symbol: symbol.into(),
            stats: FeedStats::default(),
        }
    }

    /// Run until the feed ends, the queue closes, or `shutdown` fires
    ///
    /// Dropping out of this function drops the queue sender, which lets the
    /// consumer finish once it has applied what is queued.
    ///
    /// # Errors
    ///
    /// Returns the feed's error if it can no longer deliver messages (e.g.
    /// reconnection gave up).
    pub async fn run(mut self, mut shutdown: Shutdown) -> Result<FeedStats, Error> {
        loop {
            let message = tokio::select! {
                biased;
                _ = shutdown.triggered() => {
                    info!(symbol = %self.symbol, "feed source shutting down");
                    break;
                }
                message = self.feed.next() => message,
            };

            let result = match message {
                Some(Ok(FeedMessage::Connected)) => self.on_connected().await,
                Some(Ok(FeedMessage::Market(msg))) => self.on_market(msg).await,
                Some(Err(e @ Error::Json(_))) => {
                    self.stats.undecodable += 1;
                    warn!(symbol = %self.symbol, error = %e, "undecodable message");
                    Ok(())
                }
                Some(Err(e)) => return Err(e),
                None => {
                    info!(symbol = %self.symbol, "feed ended");
                    break;
                }
            };

            match result {
                Ok(()) => {}
                Err(Error::QueueClosed) => {
                    debug!(symbol = %self.symbol, "consumer stopped, feed source exiting");
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(self.stats)
    }

    async fn on_connected(&mut self) -> Result<(), Error> {
        info!(symbol = %self.symbol, "new connection, resetting book");
        self.stats.resets += 1;
        self.queue.reset().await
    }

    async fn on_market(&mut self, msg: MarketDataMessage) -> Result<(), Error> {
        self.stats.messages += 1;
        match msg {
            MarketDataMessage::Update(update) => self.forward(update).await,
            MarketDataMessage::Heartbeat(heartbeat) => {
                self.stats.heartbeats += 1;
                trace!(symbol = %self.symbol, sequence = heartbeat.socket_sequence, "heartbeat");
                Ok(())
            }
        }
    }

    async fn forward(&mut self, update: UpdateMsg) -> Result<(), Error> {
        for wire in &update.events {
            match wire {
                WireEvent::Change(change) => match Event::try_from(change) {
                    Ok(event) => {
                        self.queue.apply(event).await?;
                        self.stats.forwarded += 1;
                    }
                    Err(e) => {
                        self.stats.rejected += 1;
                        warn!(
                            symbol = %self.symbol,
                            event_id = update.event_id,
                            price = %change.price,
                            remaining = %change.remaining,
                            side = %change.side,
                            error = %e,
                            "rejected malformed event"
                        );
                    }
                },
                WireEvent::Trade(trade) => {
                    self.stats.trades += 1;
                    debug!(
                        symbol = %self.symbol,
                        tid = trade.tid,
                        price = %trade.price,
                        amount = %trade.amount,
                        maker_side = %trade.maker_side,
                        "trade"
                    );
                }
                WireEvent::Malformed { error } => {
                    self.stats.rejected += 1;
                    warn!(
                        symbol = %self.symbol,
                        event_id = update.event_id,
                        %error,
                        "rejected undecodable event"
                    );
                }
                WireEvent::Other => {}
            }
        }
        Ok(())
    }
}
