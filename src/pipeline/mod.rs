//! Single-writer update pipeline.
//!
//! ```text
//! feed task --FeedSender--> [ingestion queue] --BookReceiver--> Consumer --watch--> observers
//! ```
//!
//! - [`queue`] - FIFO ingestion queue carrying [`BookCommand`]s
//! - [`consumer`] - the loop that owns and mutates the [`OrderBook`](crate::orderbook::OrderBook)
//! - [`shutdown`] - cooperative shutdown signal

pub mod consumer;
pub mod queue;
pub mod shutdown;

pub use consumer::{Consumer, ConsumerReport, ConsumerStats, ExitReason};
pub use queue::{ingestion_queue, BookCommand, BookReceiver, FeedSender, QueueCapacity};
pub use shutdown::{shutdown_channel, Shutdown, ShutdownPolicy, ShutdownTrigger};
