//! Order Types
//!
//! Caller-facing order values and their mapping to the terminal's wire tags.
//! No validation of volume or price ranges happens here; the connector passes
//! caller-supplied order fields through unchanged.

use std::fmt;
use std::num::NonZeroU64;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Comment attached to orders when the caller does not provide one.
pub const DEFAULT_ORDER_COMMENT: &str = "Revolution X";

// =============================================================================
// Direction
// =============================================================================

/// Logical order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    /// Open or add to a long position.
    Buy,
    /// Open or add to a short position.
    Sell,
}

impl OrderDirection {
    /// Wire-level order type tag for this direction.
    #[must_use]
    pub const fn order_type(self) -> WireOrderType {
        match self {
            Self::Buy => WireOrderType::Buy,
            Self::Sell => WireOrderType::Sell,
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order type tag understood by the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireOrderType {
    /// Market buy.
    #[serde(rename = "ORDER_TYPE_BUY")]
    Buy,
    /// Market sell.
    #[serde(rename = "ORDER_TYPE_SELL")]
    Sell,
}

impl WireOrderType {
    /// The tag as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "ORDER_TYPE_BUY",
            Self::Sell => "ORDER_TYPE_SELL",
        }
    }
}

impl fmt::Display for WireOrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Ticket
// =============================================================================

/// Terminal identifier of an open position. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticket(NonZeroU64);

impl Ticket {
    /// Wrap a raw ticket number; `None` for zero.
    #[must_use]
    pub const fn new(value: u64) -> Option<Self> {
        match NonZeroU64::new(value) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Raw ticket number.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Order Request
// =============================================================================

/// A request to open a market position on the terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Instrument symbol, e.g. `XAUUSD`.
    pub symbol: String,
    /// Buy or sell.
    pub direction: OrderDirection,
    /// Volume in lots.
    pub volume: Decimal,
    /// Stop-loss price.
    #[serde(default)]
    pub stop_loss: Option<Decimal>,
    /// Take-profit price.
    #[serde(default)]
    pub take_profit: Option<Decimal>,
    /// Free-form order comment.
    #[serde(default = "default_comment")]
    pub comment: String,
}

impl OrderRequest {
    /// Create a request without protective levels and with the default comment.
    #[must_use]
    pub fn new(symbol: impl Into<String>, direction: OrderDirection, volume: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            direction,
            volume,
            stop_loss: None,
            take_profit: None,
            comment: default_comment(),
        }
    }

    /// Set the stop-loss price.
    #[must_use]
    pub const fn with_stop_loss(mut self, price: Decimal) -> Self {
        self.stop_loss = Some(price);
        self
    }

    /// Set the take-profit price.
    #[must_use]
    pub const fn with_take_profit(mut self, price: Decimal) -> Self {
        self.take_profit = Some(price);
        self
    }

    /// Set the order comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

fn default_comment() -> String {
    DEFAULT_ORDER_COMMENT.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(OrderDirection::Buy, WireOrderType::Buy, "ORDER_TYPE_BUY" ; "buy")]
    #[test_case(OrderDirection::Sell, WireOrderType::Sell, "ORDER_TYPE_SELL" ; "sell")]
    fn direction_maps_to_wire_tag(direction: OrderDirection, expected: WireOrderType, tag: &str) {
        assert_eq!(direction.order_type(), expected);
        assert_eq!(expected.as_str(), tag);
        assert_eq!(
            serde_json::to_value(expected).unwrap(),
            serde_json::Value::String(tag.to_string())
        );
    }

    #[test]
    fn direction_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&OrderDirection::Buy).unwrap(), "\"buy\"");
        let parsed: OrderDirection = serde_json::from_str("\"sell\"").unwrap();
        assert_eq!(parsed, OrderDirection::Sell);
        assert!(serde_json::from_str::<OrderDirection>("\"hold\"").is_err());
    }

    #[test]
    fn ticket_is_transparent() {
        let ticket = Ticket::new(123_456).unwrap();
        assert_eq!(serde_json::to_string(&ticket).unwrap(), "123456");
        assert_eq!(ticket.to_string(), "123456");
        assert_eq!(ticket.value(), 123_456);
    }

    #[test]
    fn ticket_zero_is_rejected() {
        assert_eq!(Ticket::new(0), None);
        assert!(serde_json::from_str::<Ticket>("0").is_err());
        assert_eq!(serde_json::from_str::<Ticket>("9").unwrap(), Ticket::new(9).unwrap());
    }

    #[test]
    fn order_request_builder() {
        let order = OrderRequest::new("XAUUSD", OrderDirection::Buy, Decimal::ONE)
            .with_stop_loss(Decimal::new(1900, 0))
            .with_take_profit(Decimal::new(2000, 0))
            .with_comment("test");

        assert_eq!(order.symbol, "XAUUSD");
        assert_eq!(order.stop_loss, Some(Decimal::new(1900, 0)));
        assert_eq!(order.take_profit, Some(Decimal::new(2000, 0)));
        assert_eq!(order.comment, "test");
    }

    #[test]
    fn order_request_defaults_when_deserialized() {
        let order: OrderRequest = serde_json::from_str(
            r#"{"symbol":"XAGUSD","direction":"sell","volume":"0.5"}"#,
        )
        .unwrap();

        assert_eq!(order.direction, OrderDirection::Sell);
        assert_eq!(order.volume, Decimal::new(5, 1));
        assert_eq!(order.stop_loss, None);
        assert_eq!(order.comment, DEFAULT_ORDER_COMMENT);
    }
}
