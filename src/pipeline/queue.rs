//! FIFO ingestion queue between the feed task and the consumer task.
//!
//! The queue is single-producer, single-consumer and strictly ordered. It
//! can be unbounded (the producer never blocks) or bounded (the producer
//! waits while the queue is full).

use std::num::NonZeroUsize;

use tokio::sync::mpsc;

use crate::error::Error;
use crate::types::Event;

/// Command carried by the ingestion queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookCommand {
    /// Apply one event to the book
    Apply(Event),
    /// Clear the book; a fresh snapshot follows
    Reset,
}

/// Queue capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueCapacity {
    /// Accept unlimited backlog
    #[default]
    Unbounded,
    /// Block the producer once this many commands are queued
    Bounded(NonZeroUsize),
}

impl QueueCapacity {
    /// Bounded capacity, or `None` for zero
    pub fn bounded(capacity: usize) -> Option<Self> {
        NonZeroUsize::new(capacity).map(QueueCapacity::Bounded)
    }
}

#[derive(Debug, Clone)]
enum SenderInner {
    Bounded(mpsc::Sender<BookCommand>),
    Unbounded(mpsc::UnboundedSender<BookCommand>),
}

/// Producer half, held by the feed side
#[derive(Debug, Clone)]
pub struct FeedSender {
    inner: SenderInner,
}

impl FeedSender {
    /// Enqueue a command, waiting for room if the queue is bounded
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueueClosed`] once the consumer has stopped.
    pub async fn send(&self, command: BookCommand) -> Result<(), Error> {
        match &self.inner {
            SenderInner::Bounded(tx) => tx.send(command).await.map_err(|_| Error::QueueClosed),
            SenderInner::Unbounded(tx) => tx.send(command).map_err(|_| Error::QueueClosed),
        }
    }

    /// Enqueue an event
    pub async fn apply(&self, event: Event) -> Result<(), Error> {
        self.send(BookCommand::Apply(event)).await
    }

    /// Ask the consumer to reset the book
    pub async fn reset(&self) -> Result<(), Error> {
        self.send(BookCommand::Reset).await
    }

    /// Check if the consumer has stopped receiving
    pub fn is_closed(&self) -> bool {
        match &self.inner {
            SenderInner::Bounded(tx) => tx.is_closed(),
            SenderInner::Unbounded(tx) => tx.is_closed(),
        }
    }
}

#[derive(Debug)]
enum ReceiverInner {
    Bounded(mpsc::Receiver<BookCommand>),
    Unbounded(mpsc::UnboundedReceiver<BookCommand>),
}

/// Consumer half, held by the consumer loop
#[derive(Debug)]
pub struct BookReceiver {
    inner: ReceiverInner,
}

impl BookReceiver {
    /// Wait for the next command; `None` once every sender is gone and the
    /// queue is empty
    pub async fn recv(&mut self) -> Option<BookCommand> {
        match &mut self.inner {
            ReceiverInner::Bounded(rx) => rx.recv().await,
            ReceiverInner::Unbounded(rx) => rx.recv().await,
        }
    }

    /// Take a command without waiting
    pub fn try_recv(&mut self) -> Option<BookCommand> {
        match &mut self.inner {
            ReceiverInner::Bounded(rx) => rx.try_recv().ok(),
            ReceiverInner::Unbounded(rx) => rx.try_recv().ok(),
        }
    }

    /// Stop accepting new commands; already queued ones can still be received
    pub fn close(&mut self) {
        match &mut self.inner {
            ReceiverInner::Bounded(rx) => rx.close(),
            ReceiverInner::Unbounded(rx) => rx.close(),
        }
    }
}

/// Create the ingestion queue
pub fn ingestion_queue(capacity: QueueCapacity) -> (FeedSender, BookReceiver) {
    match capacity {
        QueueCapacity::Unbounded => {
            let (tx, rx) = mpsc::unbounded_channel();
            (
                FeedSender {
                    inner: SenderInner::Unbounded(tx),
                },
                BookReceiver {
                    inner: ReceiverInner::Unbounded(rx),
                },
            )
        }
        QueueCapacity::Bounded(capacity) => {
            let (tx, rx) = mpsc::channel(capacity.get());
            (
                FeedSender {
                    inner: SenderInner::Bounded(tx),
                },
                BookReceiver {
                    inner: ReceiverInner::Bounded(rx),
                },
            )
        }
    }
}
