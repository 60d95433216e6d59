//! Terminal Protocol Envelopes
//!
//! Request and reply envelopes exchanged with the trading terminal. Each
//! request is one JSON object carrying an `action` tag plus action-specific
//! fields; each reply is one JSON object carrying (at least) a `data` field.
//!
//! # Wire Format
//!
//! ```json
//! {"action":"place_order","symbol":"XAUUSD","order_type":"ORDER_TYPE_BUY",
//!  "volume":1.0,"stop_loss":1900.0,"take_profit":2000.0,"comment":"test"}
//! ```
//!
//! Replies are opaque: the only structural requirement is that they decode to
//! a JSON object.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::order::{OrderRequest, Ticket, WireOrderType};

// =============================================================================
// Action
// =============================================================================

/// Closed set of actions understood by the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Liveness probe.
    Ping,
    /// Account balance, equity and margin.
    AccountInfo,
    /// Instrument specification.
    SymbolInfo,
    /// Open a market position.
    PlaceOrder,
    /// Close an open position by ticket.
    ClosePosition,
    /// List open positions.
    GetPositions,
}

impl Action {
    /// Wire tag, also used as a metric label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::AccountInfo => "account_info",
            Self::SymbolInfo => "symbol_info",
            Self::PlaceOrder => "place_order",
            Self::ClosePosition => "close_position",
            Self::GetPositions => "get_positions",
        }
    }

    /// Whether the action changes terminal state.
    #[must_use]
    pub const fn is_write(self) -> bool {
        matches!(self, Self::PlaceOrder | Self::ClosePosition)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Command
// =============================================================================

/// Request envelope sent to the terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    /// Liveness probe.
    Ping,
    /// Query account information.
    AccountInfo,
    /// Query a single symbol's specification.
    SymbolInfo {
        /// Instrument symbol.
        symbol: String,
    },
    /// Open a market position.
    PlaceOrder(PlaceOrderCommand),
    /// Close an open position.
    ClosePosition {
        /// Position ticket.
        ticket: Ticket,
    },
    /// List open positions.
    GetPositions,
}

impl Command {
    /// The action tag of this command.
    #[must_use]
    pub const fn action(&self) -> Action {
        match self {
            Self::Ping => Action::Ping,
            Self::AccountInfo => Action::AccountInfo,
            Self::SymbolInfo { .. } => Action::SymbolInfo,
            Self::PlaceOrder(_) => Action::PlaceOrder,
            Self::ClosePosition { .. } => Action::ClosePosition,
            Self::GetPositions => Action::GetPositions,
        }
    }

    /// Symbol-info query.
    #[must_use]
    pub fn symbol_info(symbol: impl Into<String>) -> Self {
        Self::SymbolInfo {
            symbol: symbol.into(),
        }
    }

    /// Order placement built from a caller request.
    #[must_use]
    pub fn place_order(order: &OrderRequest) -> Self {
        Self::PlaceOrder(PlaceOrderCommand::from(order))
    }

    /// Position close.
    #[must_use]
    pub const fn close_position(ticket: Ticket) -> Self {
        Self::ClosePosition { ticket }
    }

    /// Encode as a single JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if a field cannot be represented in JSON.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Fields of a `place_order` request.
///
/// Absent protective levels are sent as JSON `null`; decimals are sent as
/// JSON numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrderCommand {
    /// Instrument symbol.
    pub symbol: String,
    /// Wire order type tag.
    pub order_type: WireOrderType,
    /// Volume in lots.
    #[serde(with = "rust_decimal::serde::float")]
    pub volume: Decimal,
    /// Stop-loss price.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub stop_loss: Option<Decimal>,
    /// Take-profit price.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub take_profit: Option<Decimal>,
    /// Order comment.
    pub comment: String,
}

impl From<&OrderRequest> for PlaceOrderCommand {
    fn from(order: &OrderRequest) -> Self {
        Self {
            symbol: order.symbol.clone(),
            order_type: order.direction.order_type(),
            volume: order.volume,
            stop_loss: order.stop_loss,
            take_profit: order.take_profit,
            comment: order.comment.clone(),
        }
    }
}

// =============================================================================
// Response
// =============================================================================

/// Reply envelope received from the terminal.
///
/// Holds the decoded JSON object exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct TerminalResponse(Map<String, Value>);

impl TerminalResponse {
    /// Wrap an already-decoded JSON object.
    #[must_use]
    pub const fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Decode a single JSON text frame.
    ///
    /// # Errors
    ///
    /// Fails if the frame is not valid JSON or is not a JSON object.
    pub fn from_frame(frame: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(frame)
    }

    /// Borrow the `data` payload.
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.0.get("data")
    }

    /// Take the `data` payload, discarding the rest of the envelope.
    #[must_use]
    pub fn into_data(mut self) -> Option<Value> {
        self.0.remove("data")
    }

    /// Borrow the whole envelope.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<TerminalResponse> for Value {
    fn from(response: TerminalResponse) -> Self {
        Self::Object(response.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderDirection;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn unit_commands_carry_only_the_action() {
        assert_eq!(
            serde_json::to_value(Command::Ping).unwrap(),
            json!({"action": "ping"})
        );
        assert_eq!(
            serde_json::to_value(Command::AccountInfo).unwrap(),
            json!({"action": "account_info"})
        );
        assert_eq!(
            serde_json::to_value(Command::GetPositions).unwrap(),
            json!({"action": "get_positions"})
        );
    }

    #[test]
    fn symbol_info_and_close_position_fields() {
        assert_eq!(
            serde_json::to_value(Command::symbol_info("XAGUSD")).unwrap(),
            json!({"action": "symbol_info", "symbol": "XAGUSD"})
        );
        assert_eq!(
            serde_json::to_value(Command::close_position(Ticket::new(42).unwrap())).unwrap(),
            json!({"action": "close_position", "ticket": 42})
        );
    }

    #[test]
    fn place_order_wire_shape() {
        let order = OrderRequest::new("XAUUSD", OrderDirection::Buy, Decimal::ONE)
            .with_stop_loss(Decimal::new(1900, 0))
            .with_take_profit(Decimal::new(2000, 0))
            .with_comment("test");

        let value: Value = serde_json::from_str(&Command::place_order(&order).to_frame().unwrap())
            .unwrap();

        assert_eq!(value["action"], "place_order");
        assert_eq!(value["symbol"], "XAUUSD");
        assert_eq!(value["order_type"], "ORDER_TYPE_BUY");
        assert_eq!(value["volume"].as_f64(), Some(1.0));
        assert_eq!(value["stop_loss"].as_f64(), Some(1900.0));
        assert_eq!(value["take_profit"].as_f64(), Some(2000.0));
        assert_eq!(value["comment"], "test");
    }

    #[test]
    fn place_order_absent_levels_are_null() {
        let order = OrderRequest::new("XPTUSD", OrderDirection::Sell, Decimal::new(25, 2));
        let value = serde_json::to_value(Command::place_order(&order)).unwrap();

        assert_eq!(value["order_type"], "ORDER_TYPE_SELL");
        assert_eq!(value["volume"].as_f64(), Some(0.25));
        assert!(value["stop_loss"].is_null());
        assert!(value["take_profit"].is_null());
        assert_eq!(value["comment"], "Revolution X");
    }

    #[test]
    fn command_action_matches_tag() {
        let commands = [
            Command::Ping,
            Command::AccountInfo,
            Command::symbol_info("XAUUSD"),
            Command::close_position(Ticket::new(1).unwrap()),
            Command::GetPositions,
        ];
        for command in commands {
            let value = serde_json::to_value(&command).unwrap();
            assert_eq!(value["action"], command.action().as_str());
        }
    }

    #[test]
    fn write_actions() {
        assert!(Action::PlaceOrder.is_write());
        assert!(Action::ClosePosition.is_write());
        assert!(!Action::GetPositions.is_write());
        assert!(!Action::Ping.is_write());
    }

    #[test]
    fn response_requires_object_envelope() {
        assert!(TerminalResponse::from_frame(r#"{"data": 1}"#).is_ok());
        assert!(TerminalResponse::from_frame("[1, 2]").is_err());
        assert!(TerminalResponse::from_frame("\"pong\"").is_err());
        assert!(TerminalResponse::from_frame("not json").is_err());
    }

    #[test]
    fn response_without_data() {
        let response = TerminalResponse::from_frame(r#"{"status": "ok"}"#).unwrap();
        assert!(response.data().is_none());
        assert_eq!(response.fields()["status"], "ok");
        assert!(response.into_data().is_none());
    }

    proptest! {
        #[test]
        fn into_data_returns_exactly_the_data_field(
            balance in any::<i64>(),
            name in "[a-zA-Z0-9 ]{0,16}",
            retcode in any::<u32>(),
            tickets in proptest::collection::vec(any::<u64>(), 0..8),
        ) {
            let data = json!({"balance": balance, "name": name, "tickets": tickets});
            let frame = json!({"data": data.clone(), "retcode": retcode}).to_string();

            let response = TerminalResponse::from_frame(&frame).unwrap();
            prop_assert_eq!(response.data(), Some(&data));
            prop_assert_eq!(response.into_data(), Some(data));
        }
    }
}
