//! Position engine: per-symbol long/short aggregates and per-fill PnL.
//!
//! Generalizes the average-cost tracking the simulated gateway used to do
//! inline (single net quantity, implicit flip) into explicit long/short
//! aggregates that never go negative, per the split-aggregate position model.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::types::{PositionType, Side};

/// Cumulative in/out aggregates for one side (long or short) of a symbol's position.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SideAggregate {
    pub in_qty: Decimal,
    pub in_amount: Decimal,
    pub in_fee: Decimal,
    pub out_qty: Decimal,
    pub out_amount: Decimal,
    pub out_fee: Decimal,
}

impl SideAggregate {
    pub fn net_qty(&self) -> Decimal {
        self.in_qty - self.out_qty
    }

    /// Weighted-average entry cost including fees. `None` while net_qty is zero.
    pub fn avg_entry(&self) -> Option<Decimal> {
        let net = self.net_qty();
        if net <= Decimal::ZERO {
            None
        } else {
            Some((self.in_amount + self.in_fee) / self.in_qty)
        }
    }
}

/// Per-symbol position state, split long/short per the kernel's aggregate
/// (non-lot-based) accounting model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionState {
    pub long: SideAggregate,
    pub short: SideAggregate,
    pub open_timestamp: Option<i64>,
    pub strategy_name: Option<String>,
}

impl PositionState {
    fn is_flat(&self) -> bool {
        self.long.net_qty() == Decimal::ZERO && self.short.net_qty() == Decimal::ZERO
    }

    /// Apply a filled order's fill to this position, returning the realized
    /// pnl of the fill (zero for entries).
    pub fn apply_fill(
        &mut self,
        position_type: PositionType,
        side: Side,
        quantity: Decimal,
        price: Decimal,
        fee: Decimal,
        timestamp: i64,
        strategy_name: &str,
    ) -> Decimal {
        let amount = quantity * price;
        let pnl = match (position_type, side) {
            (PositionType::Long, Side::Buy) => {
                self.long.in_qty += quantity;
                self.long.in_amount += amount;
                self.long.in_fee += fee;
                Decimal::ZERO
            }
            (PositionType::Long, Side::Sell) => {
                let avg_entry = self.long.avg_entry().unwrap_or(Decimal::ZERO);
                self.long.out_qty += quantity;
                self.long.out_amount += amount;
                self.long.out_fee += fee;
                (price - avg_entry) * quantity - fee
            }
            (PositionType::Short, Side::Sell) => {
                self.short.in_qty += quantity;
                self.short.in_amount += amount;
                self.short.in_fee += fee;
                Decimal::ZERO
            }
            (PositionType::Short, Side::Buy) => {
                let avg_entry = self.short.avg_entry().unwrap_or(Decimal::ZERO);
                self.short.out_qty += quantity;
                self.short.out_amount += amount;
                self.short.out_fee += fee;
                (avg_entry - price) * quantity - fee
            }
        };

        let opening = self.open_timestamp.is_none()
            && matches!(
                (position_type, side),
                (PositionType::Long, Side::Buy) | (PositionType::Short, Side::Sell)
            );
        if opening {
            self.open_timestamp = Some(timestamp);
            self.strategy_name = Some(strategy_name.to_string());
        }
        if self.is_flat() {
            self.open_timestamp = None;
            self.strategy_name = None;
        }

        pnl
    }

    pub fn unrealized_pnl(&self, mark: Decimal) -> Decimal {
        let long_unrealized = self
            .long
            .avg_entry()
            .map(|avg| (mark - avg) * self.long.net_qty())
            .unwrap_or(Decimal::ZERO);
        let short_unrealized = self
            .short
            .avg_entry()
            .map(|avg| (avg - mark) * self.short.net_qty())
            .unwrap_or(Decimal::ZERO);
        long_unrealized + short_unrealized
    }
}

/// Book of all symbols' position state.
#[derive(Debug, Clone, Default)]
pub struct PositionBook {
    positions: HashMap<String, PositionState>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &str) -> Option<&PositionState> {
        self.positions.get(symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &String> {
        self.positions.keys()
    }

    pub fn long_qty(&self, symbol: &str) -> Decimal {
        self.positions
            .get(symbol)
            .map(|p| p.long.net_qty())
            .unwrap_or(Decimal::ZERO)
    }

    pub fn short_qty(&self, symbol: &str) -> Decimal {
        self.positions
            .get(symbol)
            .map(|p| p.short.net_qty())
            .unwrap_or(Decimal::ZERO)
    }

    pub fn apply_fill(
        &mut self,
        symbol: &str,
        position_type: PositionType,
        side: Side,
        quantity: Decimal,
        price: Decimal,
        fee: Decimal,
        timestamp: i64,
        strategy_name: &str,
    ) -> Decimal {
        let state = self.positions.entry(symbol.to_string()).or_default();
        state.apply_fill(position_type, side, quantity, price, fee, timestamp, strategy_name)
    }
}
