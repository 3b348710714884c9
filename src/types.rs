//! Core data structures for the bar-by-bar simulation kernel.
//!
//! Unlike the teacher's FFI-oriented structs, these carry `Decimal` fields
//! throughout so no monetary value ever round-trips through `f64`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

/// Market order fills against the current bar's mid; limit orders fill only
/// when the bar's range crosses the limit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit { price: Decimal },
}

/// Which side of a position an order opens or closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionType {
    Long,
    Short,
}

/// Closed set of reasons a persisted order can fail for. See `error.rs` for
/// the separate caller-visible error channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    InsufficientBuyPower,
    InsufficientSellPower,
    InvalidQuantity,
    InvalidPrice,
    TakeProfit,
    StopLoss,
    Strategy,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::InsufficientBuyPower => "InsufficientBuyPower",
            FailureReason::InsufficientSellPower => "InsufficientSellPower",
            FailureReason::InvalidQuantity => "InvalidQuantity",
            FailureReason::InvalidPrice => "InvalidPrice",
            FailureReason::TakeProfit => "TakeProfit",
            FailureReason::StopLoss => "StopLoss",
            FailureReason::Strategy => "Strategy",
        }
    }
}

/// Terminal/in-flight status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Filled,
    Failed,
}

/// Attached exit instructions carried alongside an entry order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ExitSpec {
    pub take_profit: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
}

/// A reason/message pair attached to an order at submission time. `message`
/// is informational only and must never affect control flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OrderTag {
    pub reason: Option<String>,
    pub message: Option<String>,
}

/// Order intent submitted by a strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub position_type: PositionType,
    pub strategy_name: String,
    pub tag: OrderTag,
    pub exit: ExitSpec,
}

impl Order {
    pub fn market(symbol: impl Into<String>, side: Side, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            quantity,
            position_type: match side {
                Side::Buy => PositionType::Long,
                Side::Sell => PositionType::Short,
            },
            strategy_name: String::new(),
            tag: OrderTag::default(),
            exit: ExitSpec::default(),
        }
    }

    pub fn limit(symbol: impl Into<String>, side: Side, quantity: Decimal, price: Decimal) -> Self {
        Self {
            order_type: OrderType::Limit { price },
            ..Self::market(symbol, side, quantity)
        }
    }
}

/// Immutable ledger record for an order once the gateway has acted on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutedOrder {
    pub id: Uuid,
    pub order: Order,
    pub status: OrderStatus,
    pub execution_price: Option<Decimal>,
    pub execution_timestamp: Option<i64>,
    pub fee: Decimal,
    pub failure_reason: Option<FailureReason>,
}

/// One-to-one with a filled `ExecutedOrder`; carries the computed PnL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub order_id: Uuid,
    pub symbol: String,
    pub side: Side,
    pub position_type: PositionType,
    pub quantity: Decimal,
    pub price: Decimal,
    pub fee: Decimal,
    pub pnl: Decimal,
    pub timestamp: i64,
    pub strategy_name: String,
    /// The position's `open_timestamp` at the moment of this fill, captured
    /// before the fill is applied. `None` for an opening fill; `Some` for a
    /// closing fill, giving the round trip's holding-time start for stats.
    pub entry_timestamp: Option<i64>,
}

/// One OHLCV step for a single symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketBar {
    pub symbol: String,
    pub time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl MarketBar {
    /// Arithmetic mean of high and low; the kernel's canonical reference
    /// price for market orders.
    pub fn mid(&self) -> Decimal {
        (self.high + self.low) / Decimal::TWO
    }
}
