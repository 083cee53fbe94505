//! Order-book event types.
//!
//! An [`Event`] is the only input the order book accepts. It can only be
//! built through [`Event::new`] (or from a wire change event), which rejects
//! negative quantities and non-positive prices, so the book never sees
//! malformed input.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::Error;

use super::{Price, Quantity};

/// Book side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Resting buy interest; best price is the highest
    Bid,
    /// Resting sell interest; best price is the lowest
    Ask,
}

impl Side {
    /// Whether `candidate` is a better price than `incumbent` on this side
    pub fn improves(self, candidate: Price, incumbent: Price) -> bool {
        match self {
            Side::Bid => candidate > incumbent,
            Side::Ask => candidate < incumbent,
        }
    }

    /// Wire name (`bid` / `ask`)
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Bid => "bid",
            Side::Ask => "ask",
        }
    }
}

impl FromStr for Side {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bid" => Ok(Side::Bid),
            "ask" => Ok(Side::Ask),
            other => Err(Error::InvalidSide(other.to_string())),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the feed sent an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Reason {
    /// Pre-existing book state sent at connection time (`initial`)
    Snapshot,
    /// A new resting order
    Place,
    /// A resting order was cancelled
    Cancel,
    /// A resting order traded; informational only
    Trade,
    /// Any reason this crate does not understand; informational only
    Unknown,
}

impl Reason {
    /// Map a wire reason string; never fails
    pub fn from_wire(s: &str) -> Self {
        match s {
            "initial" => Reason::Snapshot,
            "place" => Reason::Place,
            "cancel" => Reason::Cancel,
            "trade" => Reason::Trade,
            _ => Reason::Unknown,
        }
    }
}

/// One validated feed update
///
/// Carries no order identifier: `(price, remaining, side)` is all the feed
/// provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Event {
    price: Price,
    remaining: Quantity,
    side: Side,
    reason: Reason,
}

impl Event {
    /// Create a validated event
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPrice`] if `price` is zero or negative and
    /// [`Error::InvalidQuantity`] if `remaining` is negative.
    pub fn new(price: Price, remaining: Quantity, side: Side, reason: Reason) -> Result<Self, Error> {
        if price <= Decimal::ZERO {
            return Err(Error::InvalidPrice(price.to_string()));
        }
        if remaining < Decimal::ZERO {
            return Err(Error::InvalidQuantity(remaining.to_string()));
        }

        Ok(Self {
            price: price.normalize(),
            remaining: remaining.normalize(),
            side,
            reason,
        })
    }

    /// Parse and validate an event from wire strings
    ///
    /// Decimals are parsed exactly; no floating point is involved.
    pub fn parse(price: &str, remaining: &str, side: &str, reason: &str) -> Result<Self, Error> {
        let price = Decimal::from_str(price.trim())
            .map_err(|e| Error::InvalidPrice(format!("{price:?}: {e}")))?;
        let remaining = Decimal::from_str(remaining.trim())
            .map_err(|e| Error::InvalidQuantity(format!("{remaining:?}: {e}")))?;
        let side = side.parse()?;

        Self::new(price, remaining, side, Reason::from_wire(reason))
    }

    /// Level price
    pub fn price(&self) -> Price {
        self.price
    }

    /// Quantity remaining; zero signals the whole level is gone
    pub fn remaining(&self) -> Quantity {
        self.remaining
    }

    /// Book side
    pub fn side(&self) -> Side {
        self.side
    }

    /// Feed reason
    pub fn reason(&self) -> Reason {
        self.reason
    }

    /// Whether this event removes the whole price level
    pub fn is_level_removal(&self) -> bool {
        self.remaining.is_zero()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} x {} ({:?})",
            self.side, self.price, self.remaining, self.reason
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_valid_event() {
        let event = Event::parse("3641.61", "0.83372051", "bid", "initial").unwrap();
        assert_eq!(event.price(), dec!(3641.61));
        assert_eq!(event.remaining(), dec!(0.83372051));
        assert_eq!(event.side(), Side::Bid);
        assert_eq!(event.reason(), Reason::Snapshot);
    }

    #[test]
    fn test_prices_are_normalized() {
        let a = Event::parse("10.500", "1", "ask", "place").unwrap();
        let b = Event::parse("10.5", "1.0", "ask", "place").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.price().to_string(), "10.5");
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let err = Event::parse("10", "-1", "bid", "place").unwrap_err();
        assert!(matches!(err, Error::InvalidQuantity(_)));
    }

    #[test]
    fn test_non_positive_price_rejected() {
        assert!(matches!(
            Event::new(dec!(0), dec!(1), Side::Bid, Reason::Place),
            Err(Error::InvalidPrice(_))
        ));
        assert!(matches!(
            Event::parse("-3", "1", "ask", "place"),
            Err(Error::InvalidPrice(_))
        ));
    }

    #[test]
    fn test_unknown_side_rejected() {
        let err = Event::parse("10", "1", "buy", "place").unwrap_err();
        assert!(matches!(err, Error::InvalidSide(ref s) if s == "buy"));
    }

    #[test]
    fn test_unparseable_decimal_rejected() {
        assert!(Event::parse("12.3.4", "1", "bid", "place").is_err());
        assert!(Event::parse("10", "lots", "bid", "place").is_err());
    }

    #[test]
    fn test_reason_mapping() {
        assert_eq!(Reason::from_wire("initial"), Reason::Snapshot);
        assert_eq!(Reason::from_wire("place"), Reason::Place);
        assert_eq!(Reason::from_wire("cancel"), Reason::Cancel);
        assert_eq!(Reason::from_wire("trade"), Reason::Trade);
        assert_eq!(Reason::from_wire("auction"), Reason::Unknown);
    }

    #[test]
    fn test_zero_remaining_is_level_removal() {
        let event = Event::parse("10", "0", "bid", "cancel").unwrap();
        assert!(event.is_level_removal());
    }

    #[test]
    fn test_side_improves() {
        assert!(Side::Bid.improves(dec!(11), dec!(10)));
        assert!(!Side::Bid.improves(dec!(9), dec!(10)));
        assert!(Side::Ask.improves(dec!(9), dec!(10)));
        assert!(!Side::Ask.improves(dec!(10), dec!(10)));
    }
}
