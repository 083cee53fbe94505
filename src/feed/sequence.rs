//! Per-connection message sequencing.
//!
//! Gemini numbers every message on a connection with `socket_sequence`,
//! starting at 0. [`SequenceTracker`] checks that numbering and [`decode`]
//! applies it to raw frames.

use serde::Deserialize;
use tracing::trace;

use crate::error::Error;
use crate::types::MarketDataMessage;

/// Just enough of a message to keep sequence tracking going when the rest
/// of it does not decode
#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type", default)]
    kind: String,
    socket_sequence: u64,
}

/// Expected `socket_sequence` of the next message on one connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceTracker {
    next: u64,
}

impl SequenceTracker {
    /// Tracker for a fresh connection (expects 0)
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence number the next message must carry
    pub fn next(&self) -> u64 {
        self.next
    }

    /// Accept `got` if it is the expected number
    ///
    /// # Errors
    ///
    /// Returns [`Error::SequenceGap`] and leaves the tracker unchanged if
    /// `got` is not the expected number.
    pub fn observe(&mut self, got: u64) -> Result<(), Error> {
        if got != self.next {
            return Err(Error::SequenceGap {
                expected: self.next,
                got,
            });
        }
        trace!(sequence = got, "message");
        self.next += 1;
        Ok(())
    }
}

/// Decode one text frame and check its sequence number
///
/// A frame that fails to decode still advances the tracker when its
/// sequence number can be read, so one bad frame does not turn into a gap.
///
/// # Errors
///
/// - [`Error::SequenceGap`] if the frame is out of sequence
/// - [`Error::CorruptUpdate`] if an `update` frame does not decode; its
///   changes are lost, so the book must be rebuilt
/// - [`Error::Json`] for any other undecodable frame
pub fn decode(text: &str, sequence: &mut SequenceTracker) -> Result<MarketDataMessage, Error> {
    match serde_json::from_str::<MarketDataMessage>(text) {
        Ok(msg) => {
            sequence.observe(msg.socket_sequence())?;
            Ok(msg)
        }
        Err(e) => {
            let Ok(envelope) = serde_json::from_str::<Envelope>(text) else {
                return Err(e.into());
            };
            sequence.observe(envelope.socket_sequence)?;
            if envelope.kind == "update" {
                Err(Error::CorruptUpdate {
                    sequence: envelope.socket_sequence,
                    source: e,
                })
            } else {
                Err(e.into())
            }
        }
    }
}
