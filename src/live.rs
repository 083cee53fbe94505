//! Live order book: feed task + consumer task wired through the queue.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::Config;
use crate::error::Error;
use crate::feed::{FeedSource, FeedStats, MarketFeed, ReconnectingFeed};
use crate::orderbook::{OrderBook, TopOfBook};
use crate::pipeline::{
    ingestion_queue, shutdown_channel, Consumer, ConsumerReport, ConsumerStats, ExitReason,
    ShutdownTrigger,
};

/// Final state handed back when a [`LiveBook`] stops
#[derive(Debug)]
pub struct LiveReport {
    /// The book as the consumer left it
    pub book: OrderBook,
    /// Consumer counters
    pub consumer: ConsumerStats,
    /// Why the consumer stopped
    pub exit: ExitReason,
    /// Feed source counters
    pub feed: FeedStats,
}

/// A running order book for one symbol
///
/// Owns two tasks: the feed source (receives and validates events) and the
/// consumer (the only writer of the book). Observers read the published
/// [`TopOfBook`] and never touch the book itself.
///
/// # Example
///
/// ```rust,no_run
/// use gemini_book::{Config, LiveBook};
///
/// # async fn example() -> gemini_book::Result<()> {
/// let live = LiveBook::start(Config::new("btcusd")).await?;
/// let mut updates = live.subscribe();
///
/// for _ in 0..10 {
///     updates.changed().await.ok();
///     println!("{}", *updates.borrow_and_update());
/// }
///
/// let report = live.shutdown().await?;
/// println!("{}", report.book);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct LiveBook {
    symbol: String,
    top_of_book: watch::Receiver<TopOfBook>,
    trigger: ShutdownTrigger,
    feed: JoinHandle<Result<FeedStats, Error>>,
    consumer: JoinHandle<ConsumerReport>,
}

impl LiveBook {
    /// Connect to Gemini and start the pipeline
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the first
    /// connection fails.
    pub async fn start(config: Config) -> Result<Self, Error> {
        config.validate()?;
        let feed = ReconnectingFeed::connect(config.clone()).await?;
        Ok(Self::spawn(feed, &config))
    }

    /// Start the pipeline over any feed
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<F>(feed: F, config: &Config) -> Self
    where
        F: MarketFeed + 'static,
    {
        let symbol = config.symbol().to_string();
        let (sender, receiver) = ingestion_queue(config.queue_capacity());
        let (trigger, shutdown) = shutdown_channel();

        let (consumer, top_of_book) = Consumer::new(
            OrderBook::new(symbol.clone()),
            receiver,
            config.shutdown_policy(),
        );
        let source = FeedSource::new(feed, sender, symbol.clone());

        let consumer = tokio::spawn(consumer.run(trigger.listener()));
        let feed = tokio::spawn(source.run(shutdown));

        info!(
            %symbol,
            capacity = ?config.queue_capacity(),
            policy = ?config.shutdown_policy(),
            "live book started"
        );

        Self {
            symbol,
            top_of_book,
            trigger,
            feed,
            consumer,
        }
    }

    /// Symbol this book tracks
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Latest published top of book
    pub fn top_of_book(&self) -> TopOfBook {
        *self.top_of_book.borrow()
    }

    /// Receiver notified after every applied command
    pub fn subscribe(&self) -> watch::Receiver<TopOfBook> {
        self.top_of_book.clone()
    }

    /// Stop both tasks and return the final book
    ///
    /// The consumer drains or abandons queued events per the configured
    /// [`ShutdownPolicy`](crate::pipeline::ShutdownPolicy).
    pub async fn shutdown(self) -> Result<LiveReport, Error> {
        info!(symbol = %self.symbol, "shutting down live book");
        self.trigger.trigger();
        self.join().await
    }

    /// Wait for the feed to end on its own and the consumer to finish
    pub async fn wait(self) -> Result<LiveReport, Error> {
        self.join().await
    }

    async fn join(self) -> Result<LiveReport, Error> {
        // The feed task owns the queue sender; once it returns the consumer
        // sees the queue close and finishes on its own.
        let feed = self.feed.await?;
        let report = self.consumer.await?;
        let feed = feed?;

        Ok(LiveReport {
            book: report.book,
            consumer: report.stats,
            exit: report.exit,
            feed,
        })
    }
}
