//! The consumer loop: the only writer of the order book.
//!
//! The consumer pulls commands off the ingestion queue in order, applies them
//! to the book it owns, and publishes a fresh [`TopOfBook`] after each one.
//! Because exactly one consumer exists, `apply` calls are strictly serialized
//! and the book needs no locking.

use tokio::sync::watch;
use tracing::{debug, info};

use crate::orderbook::{Applied, OrderBook, TopOfBook};

use super::queue::{BookCommand, BookReceiver};
use super::shutdown::{Shutdown, ShutdownPolicy};

/// Why the consumer loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Every sender was dropped and the queue ran dry
    QueueClosed,
    /// Shutdown was triggered and queued commands were applied
    Drained,
    /// Shutdown was triggered and queued commands were dropped
    Abandoned,
}

/// Counters kept by the consumer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    /// Events applied, whatever their outcome
    pub events: u64,
    /// New price levels created
    pub levels_added: u64,
    /// Price levels deleted
    pub levels_removed: u64,
    /// Entries joining an existing level
    pub entries_added: u64,
    /// Entries leaving a level that kept other entries
    pub entries_removed: u64,
    /// Cancels or removals that matched nothing
    pub unchanged: u64,
    /// Trade or unknown-reason events
    pub informational: u64,
    /// Book resets
    pub resets: u64,
    /// Commands applied after shutdown was triggered
    pub drained: u64,
}

impl ConsumerStats {
    fn record(&mut self, applied: Applied) {
        self.events += 1;
        match applied {
            Applied::LevelAdded => self.levels_added += 1,
            Applied::EntryAdded => self.entries_added += 1,
            Applied::EntryRemoved => self.entries_removed += 1,
            Applied::LevelRemoved { .. } => self.levels_removed += 1,
            Applied::Unchanged => self.unchanged += 1,
            Applied::Informational => self.informational += 1,
        }
    }
}

/// Everything the consumer hands back when it stops
#[derive(Debug)]
pub struct ConsumerReport {
    /// The book, in its final state
    pub book: OrderBook,
    /// Counters
    pub stats: ConsumerStats,
    /// Why the loop stopped
    pub exit: ExitReason,
}

/// Single-writer consumer loop
#[derive(Debug)]
pub struct Consumer {
    book: OrderBook,
    queue: BookReceiver,
    publisher: watch::Sender<TopOfBook>,
    policy: ShutdownPolicy,
    stats: ConsumerStats,
}

impl Consumer {
    /// Take ownership of `book` and `queue`
    ///
    /// Returns the consumer and a receiver for the published top of book.
    pub fn new(
        book: OrderBook,
        queue: BookReceiver,
        policy: ShutdownPolicy,
    ) -> (Self, watch::Receiver<TopOfBook>) {
        let (publisher, observer) = watch::channel(book.top_of_book());
        let consumer = Self {
            book,
            queue,
            publisher,
            policy,
            stats: ConsumerStats::default(),
        };
        (consumer, observer)
    }

    /// Another receiver for the published top of book
    pub fn subscribe(&self) -> watch::Receiver<TopOfBook> {
        self.publisher.subscribe()
    }

    /// Run until the queue closes or `shutdown` fires
    pub async fn run(mut self, mut shutdown: Shutdown) -> ConsumerReport {
        info!(symbol = %self.book.symbol(), policy = ?self.policy, "consumer started");

        let exit = loop {
            tokio::select! {
                biased;
                _ = shutdown.triggered() => break self.stop().await,
                command = self.queue.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break ExitReason::QueueClosed,
                },
            }
        };

        info!(
            symbol = %self.book.symbol(),
            ?exit,
            events = self.stats.events,
            resets = self.stats.resets,
            "consumer stopped"
        );

        ConsumerReport {
            book: self.book,
            stats: self.stats,
            exit,
        }
    }

    async fn stop(&mut self) -> ExitReason {
        self.queue.close();
        match self.policy {
            ShutdownPolicy::Drain => {
                while let Some(command) = self.queue.recv().await {
                    self.handle(command);
                    self.stats.drained += 1;
                }
                ExitReason::Drained
            }
            ShutdownPolicy::Abandon => ExitReason::Abandoned,
        }
    }

    fn handle(&mut self, command: BookCommand) {
        match command {
            BookCommand::Apply(event) => {
                let applied = self.book.apply(&event);
                self.stats.record(applied);
            }
            BookCommand::Reset => {
                self.book.reset();
                self.stats.resets += 1;
            }
        }
        self.publish();
    }

    fn publish(&self) {
        let top = self.book.top_of_book();
        debug!(symbol = %self.book.symbol(), %top, "top of book");
        self.publisher.send_replace(top);
    }
}
