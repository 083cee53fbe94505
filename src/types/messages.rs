//! WebSocket message types.
//!
//! This module contains the messages received from Gemini's v1 market-data
//! WebSocket API. The first `update` on a connection carries the full book as
//! `change` events with reason `initial`; subsequent updates carry places,
//! cancels and trades.
//!
//! Numeric fields arrive as decimal strings and are kept as strings here;
//! converting them into an [`Event`] is where validation happens.
//!
//! Events inside an update are decoded one at a time. An event that does not
//! fit its schema becomes [`WireEvent::Malformed`] instead of failing the
//! whole update, so its siblings still reach the book.

use serde::{Deserialize, Deserializer};

use crate::error::Error;

use super::event::Event;
use super::TimestampMs;

/// Message received from the market-data WebSocket
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketDataMessage {
    /// Batch of book changes and trades
    Update(UpdateMsg),
    /// Keep-alive (only sent when `heartbeat=true`)
    Heartbeat(HeartbeatMsg),
}

impl MarketDataMessage {
    /// Per-connection sequence number (starts at 0)
    pub fn socket_sequence(&self) -> u64 {
        match self {
            MarketDataMessage::Update(update) => update.socket_sequence,
            MarketDataMessage::Heartbeat(heartbeat) => heartbeat.socket_sequence,
        }
    }
}

/// Update message
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMsg {
    /// Exchange event ID
    pub event_id: u64,
    /// Per-connection sequence number (use to detect gaps)
    #[serde(rename = "socket_sequence")]
    pub socket_sequence: u64,
    /// Timestamp (Unix seconds); absent on the initial update
    #[serde(default)]
    pub timestamp: Option<u64>,
    /// Timestamp (Unix ms); absent on the initial update
    #[serde(default, rename = "timestampms")]
    pub timestamp_ms: Option<TimestampMs>,
    /// Events contained in this update
    #[serde(default, deserialize_with = "each_event")]
    pub events: Vec<WireEvent>,
}

/// Heartbeat message
#[derive(Debug, Clone, Deserialize)]
pub struct HeartbeatMsg {
    /// Per-connection sequence number
    pub socket_sequence: u64,
}

/// Event inside an update
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireEvent {
    /// Change to resting quantity at a price
    Change(ChangeEvent),
    /// A trade executed
    Trade(TradeEvent),
    /// An event that did not match its schema
    #[serde(skip_deserializing)]
    Malformed {
        /// Decoder error
        error: String,
    },
    /// Auction and other event types this crate ignores
    #[serde(other)]
    Other,
}

fn each_event<'de, D>(deserializer: D) -> Result<Vec<WireEvent>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|value| {
            serde_json::from_value(value).unwrap_or_else(|e| WireEvent::Malformed {
                error: e.to_string(),
            })
        })
        .collect())
}

/// Change event
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeEvent {
    /// Price level (decimal string)
    pub price: String,
    /// Quantity remaining (decimal string)
    pub remaining: String,
    /// Signed change in quantity (decimal string)
    #[serde(default)]
    pub delta: Option<String>,
    /// `bid` or `ask`
    pub side: String,
    /// `initial`, `place`, `cancel`, `trade`, ...
    pub reason: String,
}

impl TryFrom<&ChangeEvent> for Event {
    type Error = Error;

    fn try_from(change: &ChangeEvent) -> Result<Self, Self::Error> {
        Event::parse(&change.price, &change.remaining, &change.side, &change.reason)
    }
}

/// Trade event
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeEvent {
    /// Trade ID
    pub tid: u64,
    /// Execution price (decimal string)
    pub price: String,
    /// Executed quantity (decimal string)
    pub amount: String,
    /// Side of the resting (maker) order
    pub maker_side: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Reason, Side};
    use rust_decimal_macros::dec;

    #[test]
    fn test_initial_update_deserialization() {
        let json = r#"{
            "type": "update",
            "eventId": 5375461993,
            "socket_sequence": 0,
            "events": [
                {
                    "type": "change",
                    "reason": "initial",
                    "price": "3641.61",
                    "delta": "0.83372051",
                    "remaining": "0.83372051",
                    "side": "bid"
                },
                {
                    "type": "change",
                    "reason": "initial",
                    "price": "3641.62",
                    "delta": "4.072",
                    "remaining": "4.072",
                    "side": "ask"
                }
            ]
        }"#;

        let msg: MarketDataMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.socket_sequence(), 0);
        match msg {
            MarketDataMessage::Update(update) => {
                assert_eq!(update.event_id, 5375461993);
                assert_eq!(update.timestamp_ms, None);
                assert_eq!(update.events.len(), 2);
                match &update.events[1] {
                    WireEvent::Change(change) => {
                        let event = Event::try_from(change).unwrap();
                        assert_eq!(event.side(), Side::Ask);
                        assert_eq!(event.reason(), Reason::Snapshot);
                        assert_eq!(event.price(), dec!(3641.62));
                    }
                    other => panic!("Expected change event, got {:?}", other),
                }
            }
            _ => panic!("Expected Update"),
        }
    }

    #[test]
    fn test_trade_and_auction_events() {
        let json = r#"{
            "type": "update",
            "eventId": 5375547515,
            "timestamp": 1547760288,
            "timestampms": 1547760288001,
            "socket_sequence": 15,
            "events": [
                {
                    "type": "trade",
                    "tid": 5375547515,
                    "price": "3632.54",
                    "amount": "0.1362819142",
                    "makerSide": "ask"
                },
                {
                    "type": "auction_indicative",
                    "eid": 2486,
                    "result": "failure"
                }
            ]
        }"#;

        let msg: MarketDataMessage = serde_json::from_str(json).unwrap();
        match msg {
            MarketDataMessage::Update(update) => {
                assert_eq!(update.timestamp_ms, Some(1547760288001));
                assert!(matches!(
                    &update.events[0],
                    WireEvent::Trade(trade) if trade.maker_side == "ask" && trade.tid == 5375547515
                ));
                assert!(matches!(update.events[1], WireEvent::Other));
            }
            _ => panic!("Expected Update"),
        }
    }

    #[test]
    fn test_heartbeat_deserialization() {
        let json = r#"{"type": "heartbeat", "socket_sequence": 30}"#;
        let msg: MarketDataMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, MarketDataMessage::Heartbeat(_)));
        assert_eq!(msg.socket_sequence(), 30);
    }

    #[test]
    fn test_bad_event_does_not_sink_its_siblings() {
        let json = r#"{
            "type": "update",
            "eventId": 9,
            "socket_sequence": 4,
            "events": [
                {"type": "change", "reason": "place", "price": "10", "remaining": "1", "side": "bid"},
                {"type": "change", "reason": "place", "price": 10, "remaining": "1", "side": "ask"},
                {"type": "change", "reason": "place", "price": "11", "remaining": "2", "side": "ask"}
            ]
        }"#;

        let msg: MarketDataMessage = serde_json::from_str(json).unwrap();
        let MarketDataMessage::Update(update) = msg else {
            panic!("Expected Update");
        };
        assert_eq!(update.events.len(), 3);
        assert!(matches!(&update.events[0], WireEvent::Change(c) if c.price == "10"));
        assert!(matches!(
            &update.events[1],
            WireEvent::Malformed { error } if error.contains("invalid type")
        ));
        assert!(matches!(&update.events[2], WireEvent::Change(c) if c.price == "11"));
    }

    #[test]
    fn test_malformed_change_is_rejected_on_conversion() {
        let change = ChangeEvent {
            price: "100".to_string(),
            remaining: "1".to_string(),
            delta: None,
            side: "sell".to_string(),
            reason: "place".to_string(),
        };
        let err = Event::try_from(&change).unwrap_err();
        assert!(err.is_validation());
    }
}
