//! Trading gateway: order validation, routing, matching, and the pending
//! limit queue. This is the simulator's hard state machine — see the
//! routing rules in module-level docs on each match function.

use std::collections::{HashMap, VecDeque};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::commission::{CommissionConfig, CommissionPolicy};
use crate::error::GatewayError;
use crate::ledger::LedgerStore;
use crate::position::PositionBook;
use crate::precision::round_decimal;
use crate::types::{
    ExecutedOrder, FailureReason, MarketBar, Order, OrderStatus, OrderTag, OrderType,
    PositionType, Side, Trade,
};

/// Every tunable the gateway owns, as a plain struct a driver can deserialize
/// straight out of its own YAML config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub initial_balance: Decimal,
    pub precision: u32,
    pub commission: CommissionConfig,
}

/// Account-level snapshot returned by `account_info()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountInfo {
    pub balance: Decimal,
    pub equity: Decimal,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
    pub total_fees: Decimal,
}

struct PendingOrder {
    id: Uuid,
    order: Order,
    quantity: Decimal,
    /// The OCO sibling leg, if this order is half of an attached take-profit/stop-loss pair.
    sibling: Option<Uuid>,
    /// Reason to record on the sibling if this leg fills first.
    exit_reason: Option<FailureReason>,
}

/// Simulates order acceptance, matching, and the pending-limit-queue state
/// machine against one bar at a time.
pub struct TradingGateway {
    precision: u32,
    commission: Box<dyn CommissionPolicy>,
    balance: Decimal,
    current_bar: Option<MarketBar>,
    last_bar_by_symbol: HashMap<String, MarketBar>,
    pending: Vec<PendingOrder>,
    /// The current bar's pending batch while `process_pending` drains it.
    /// Kept separate from `pending` so `cancel_sibling` can still find a
    /// not-yet-processed sibling that was moved out of `pending` for this
    /// bar but hasn't had its own turn yet.
    in_flight: VecDeque<PendingOrder>,
    positions: PositionBook,
    ledger: LedgerStore,
}

impl TradingGateway {
    pub fn new(initial_balance: Decimal, precision: u32, commission: Box<dyn CommissionPolicy>) -> Self {
        Self {
            precision,
            commission,
            balance: initial_balance,
            current_bar: None,
            last_bar_by_symbol: HashMap::new(),
            pending: Vec::new(),
            in_flight: VecDeque::new(),
            positions: PositionBook::new(),
            ledger: LedgerStore::new(),
        }
    }

    pub fn from_config(config: GatewayConfig) -> Self {
        Self::new(config.initial_balance, config.precision, config.commission.build())
    }

    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    /// Set the reference bar and drain the pending queue against it.
    pub fn update_market(&mut self, bar: MarketBar) {
        self.last_bar_by_symbol.insert(bar.symbol.clone(), bar.clone());
        self.current_bar = Some(bar);
        self.process_pending();
    }

    pub fn update_balance(&mut self, balance: Decimal) {
        self.balance = balance;
    }

    pub fn place_order(&mut self, order: Order) -> Result<Uuid, GatewayError> {
        let id = Uuid::new_v4();

        if order.quantity <= Decimal::ZERO {
            self.persist_failed(id, order, FailureReason::InvalidQuantity);
            return Ok(id);
        }
        if let OrderType::Limit { price } = order.order_type {
            if price <= Decimal::ZERO {
                self.persist_failed(id, order, FailureReason::InvalidPrice);
                return Ok(id);
            }
        }

        let quantity = round_decimal(order.quantity, self.precision);
        if quantity <= Decimal::ZERO {
            return Err(GatewayError::ZeroQuantityAfterRounding);
        }

        match self.current_bar.clone() {
            Some(bar) if bar.symbol == order.symbol => {
                self.try_execute_or_queue(id, order, quantity, &bar, None, None);
            }
            _ => self.pending.push(PendingOrder {
                id,
                order,
                quantity,
                sibling: None,
                exit_reason: None,
            }),
        }
        Ok(id)
    }

    pub fn place_many(&mut self, orders: Vec<Order>) -> Result<Vec<Uuid>, GatewayError> {
        orders.into_iter().map(|o| self.place_order(o)).collect()
    }

    pub fn cancel(&mut self, id: Uuid) {
        self.pending.retain(|p| p.id != id);
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn status(&self, id: Uuid) -> Option<OrderStatus> {
        if let Ok(exec) = self.ledger.get_order(id) {
            return Some(exec.status);
        }
        if self.pending.iter().any(|p| p.id == id) {
            return Some(OrderStatus::Pending);
        }
        None
    }

    pub fn position(&self, symbol: &str) -> Option<&crate::position::PositionState> {
        self.positions.get(symbol)
    }

    pub fn positions(&self) -> &PositionBook {
        &self.positions
    }

    /// Defensive copy of the pending queue.
    pub fn open_orders(&self) -> Vec<Order> {
        self.pending.iter().map(|p| p.order.clone()).collect()
    }

    pub fn max_buy_qty(&self, price: Decimal) -> Result<Decimal, GatewayError> {
        if price <= Decimal::ZERO {
            return Err(GatewayError::NonPositivePrice(price));
        }
        Ok(round_decimal(self.balance / price, self.precision))
    }

    pub fn max_sell_qty(&self, symbol: &str) -> Decimal {
        round_decimal(self.positions.long_qty(symbol), self.precision)
    }

    pub fn account_info(&self) -> AccountInfo {
        let realized_pnl: Decimal = self.ledger.get_all_trades().iter().map(|t| t.pnl).sum();
        let total_fees: Decimal = self.ledger.get_all_trades().iter().map(|t| t.fee).sum();
        let unrealized_pnl: Decimal = self
            .positions
            .symbols()
            .filter_map(|sym| {
                let mark = self.last_bar_by_symbol.get(sym)?.close;
                self.positions.get(sym).map(|p| p.unrealized_pnl(mark))
            })
            .sum();
        AccountInfo {
            balance: self.balance,
            equity: self.balance + unrealized_pnl,
            realized_pnl,
            unrealized_pnl,
            total_fees,
        }
    }

    fn process_pending(&mut self) {
        let bar = match &self.current_bar {
            Some(b) => b.clone(),
            None => return,
        };
        let (matching, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|p| p.order.symbol == bar.symbol);
        self.pending = rest;
        self.in_flight = matching.into();
        while let Some(p) = self.in_flight.pop_front() {
            self.try_execute_or_queue(p.id, p.order, p.quantity, &bar, p.sibling, p.exit_reason);
        }
    }

    fn try_execute_or_queue(
        &mut self,
        id: Uuid,
        order: Order,
        quantity: Decimal,
        bar: &MarketBar,
        sibling: Option<Uuid>,
        exit_reason: Option<FailureReason>,
    ) {
        match order.order_type {
            OrderType::Market => self.match_market(id, order, quantity, bar, sibling, exit_reason),
            OrderType::Limit { price } => {
                self.match_limit(id, order, quantity, price, bar, sibling, exit_reason)
            }
        }
    }

    /// Rules 3-4: market orders always execute at the bar mid, subject to
    /// buying power (long entries) / selling power (long exits) clamps. A
    /// short cover is clamped to the held short quantity instead (never by
    /// cash); a short entry is unconstrained — the kernel models pure cash
    /// buying power, not margin.
    fn match_market(
        &mut self,
        id: Uuid,
        order: Order,
        quantity: Decimal,
        bar: &MarketBar,
        sibling: Option<Uuid>,
        exit_reason: Option<FailureReason>,
    ) {
        let price = bar.mid();
        match order.side {
            Side::Buy => {
                let clamped = self.cover_clamp(&order.symbol, order.position_type, quantity);
                if clamped <= Decimal::ZERO {
                    self.persist_failed(id, order, FailureReason::InsufficientSellPower);
                    return;
                }
                let cost = clamped * price;
                if !self.buy_allowed(order.position_type, cost) {
                    self.persist_failed(id, order, FailureReason::InsufficientBuyPower);
                    return;
                }
                self.fill(id, order, clamped, price, bar.time, exit_reason);
                self.cancel_sibling(sibling);
            }
            Side::Sell => {
                let clamped = self.sell_clamp(&order.symbol, order.position_type, quantity);
                if clamped <= Decimal::ZERO {
                    self.persist_failed(id, order, FailureReason::InsufficientSellPower);
                    return;
                }
                self.fill(id, order, clamped, price, bar.time, exit_reason);
                self.cancel_sibling(sibling);
            }
        }
    }

    /// Rules 5-6: funds/power are checked every bar a limit order is
    /// evaluated, even before it triggers. Only once triggered does it fill,
    /// at min(mid, limit) for buys or exactly the limit for sells.
    fn match_limit(
        &mut self,
        id: Uuid,
        order: Order,
        quantity: Decimal,
        limit_price: Decimal,
        bar: &MarketBar,
        sibling: Option<Uuid>,
        exit_reason: Option<FailureReason>,
    ) {
        match order.side {
            Side::Buy => {
                let clamped = self.cover_clamp(&order.symbol, order.position_type, quantity);
                if clamped <= Decimal::ZERO {
                    self.persist_failed(id, order, FailureReason::InsufficientSellPower);
                    return;
                }
                let cost = clamped * limit_price;
                if !self.buy_allowed(order.position_type, cost) {
                    self.persist_failed(id, order, FailureReason::InsufficientBuyPower);
                    return;
                }
                if bar.low <= limit_price {
                    let price = limit_price.min(bar.mid());
                    self.fill(id, order, clamped, price, bar.time, exit_reason);
                    self.cancel_sibling(sibling);
                } else {
                    self.requeue(id, order, quantity, sibling, exit_reason);
                }
            }
            Side::Sell => {
                let clamped = self.sell_clamp(&order.symbol, order.position_type, quantity);
                if clamped <= Decimal::ZERO {
                    self.persist_failed(id, order, FailureReason::InsufficientSellPower);
                    return;
                }
                if bar.high >= limit_price {
                    self.fill(id, order, clamped, limit_price, bar.time, exit_reason);
                    self.cancel_sibling(sibling);
                } else {
                    self.requeue(id, order, quantity, sibling, exit_reason);
                }
            }
        }
    }

    fn requeue(
        &mut self,
        id: Uuid,
        order: Order,
        quantity: Decimal,
        sibling: Option<Uuid>,
        exit_reason: Option<FailureReason>,
    ) {
        self.pending.push(PendingOrder {
            id,
            order,
            quantity,
            sibling,
            exit_reason,
        });
    }

    /// Buying power gates long entries only; covering a short is treated as
    /// closing a position and is never gated by balance (see DESIGN.md).
    fn buy_allowed(&self, position_type: PositionType, cost: Decimal) -> bool {
        match position_type {
            PositionType::Long => cost <= self.balance,
            PositionType::Short => true,
        }
    }

    /// Selling power gates long exits to the held long quantity; opening or
    /// adding to a short is unconstrained.
    fn sell_clamp(&self, symbol: &str, position_type: PositionType, requested: Decimal) -> Decimal {
        match position_type {
            PositionType::Long => requested.min(self.positions.long_qty(symbol)).max(Decimal::ZERO),
            PositionType::Short => requested,
        }
    }

    /// Covering a short is clamped to the currently held short quantity, the
    /// buy-side mirror of `sell_clamp`; opening or adding to a long is
    /// unconstrained by position size (only by balance, via `buy_allowed`).
    fn cover_clamp(&self, symbol: &str, position_type: PositionType, requested: Decimal) -> Decimal {
        match position_type {
            PositionType::Short => requested.min(self.positions.short_qty(symbol)).max(Decimal::ZERO),
            PositionType::Long => requested,
        }
    }

    /// Balance is never mutated here: it is an externally managed cash
    /// figure the caller replaces via `update_balance`, used only for
    /// buy-power gating and equity. Realized pnl/fees live in the ledger.
    ///
    /// `exit_reason` is `None` for an entry order's own fill (in which case
    /// its attached take-profit/stop-loss legs, if any, are queued here for
    /// the first time) and `Some` when this fill is itself a TP/SL leg.
    fn fill(
        &mut self,
        id: Uuid,
        order: Order,
        quantity: Decimal,
        price: Decimal,
        time: i64,
        exit_reason: Option<FailureReason>,
    ) {
        let fee = self.commission.fee(quantity, price);
        // Only an exit fill (closing or reducing the open side) reports an
        // entry_timestamp; an entry/add fill is itself the start of a
        // holding period, not its end, so it must report `None` (types.rs).
        let entry_timestamp = match (order.position_type, order.side) {
            (PositionType::Long, Side::Sell) | (PositionType::Short, Side::Buy) => {
                self.positions.get(&order.symbol).and_then(|p| p.open_timestamp)
            }
            _ => None,
        };
        let pnl = self.positions.apply_fill(
            &order.symbol,
            order.position_type,
            order.side,
            quantity,
            price,
            fee,
            time,
            &order.strategy_name,
        );
        tracing::debug!(order_id = %id, %price, %quantity, "order filled");
        self.ledger.record_trade(Trade {
            order_id: id,
            symbol: order.symbol.clone(),
            side: order.side,
            position_type: order.position_type,
            quantity,
            price,
            fee,
            pnl,
            timestamp: time,
            strategy_name: order.strategy_name.clone(),
            entry_timestamp,
        });
        if exit_reason.is_none() {
            self.queue_exit_orders(&order);
        }
        self.ledger.record_order(ExecutedOrder {
            id,
            order,
            status: OrderStatus::Filled,
            execution_price: Some(price),
            execution_timestamp: Some(time),
            fee,
            failure_reason: None,
        });
    }

    fn persist_failed(&mut self, id: Uuid, order: Order, reason: FailureReason) {
        tracing::warn!(order_id = %id, reason = reason.as_str(), "order failed");
        self.ledger.record_order(ExecutedOrder {
            id,
            order,
            status: OrderStatus::Failed,
            execution_price: None,
            execution_timestamp: None,
            fee: Decimal::ZERO,
            failure_reason: Some(reason),
        });
    }

    /// Removes and persists-as-failed the other leg of an OCO pair. The
    /// sibling may be sitting in `pending` (a future bar) or still waiting
    /// its own turn in `in_flight` (same bar, not yet reached by the loop in
    /// `process_pending`) — both are checked so a same-bar OCO resolution
    /// can't silently miss its sibling.
    fn cancel_sibling(&mut self, sibling: Option<Uuid>) {
        let Some(sibling_id) = sibling else { return };
        let removed = if let Some(pos) = self.pending.iter().position(|p| p.id == sibling_id) {
            Some(self.pending.remove(pos))
        } else if let Some(pos) = self.in_flight.iter().position(|p| p.id == sibling_id) {
            self.in_flight.remove(pos)
        } else {
            None
        };
        if let Some(removed) = removed {
            let reason = removed.exit_reason.unwrap_or(FailureReason::Strategy);
            self.persist_failed(removed.id, removed.order, reason);
        }
    }

    fn queue_exit_orders(&mut self, order: &Order) {
        let exit_side = match order.side {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        };
        let tp_id = order.exit.take_profit.map(|_| Uuid::new_v4());
        let sl_id = order.exit.stop_loss.map(|_| Uuid::new_v4());

        if let (Some(tp), Some(tp_id)) = (order.exit.take_profit, tp_id) {
            let mut leg = Order::limit(order.symbol.clone(), exit_side, order.quantity, tp);
            leg.position_type = order.position_type;
            leg.strategy_name = order.strategy_name.clone();
            leg.tag = OrderTag {
                reason: Some(FailureReason::TakeProfit.as_str().to_string()),
                message: None,
            };
            self.pending.push(PendingOrder {
                id: tp_id,
                order: leg,
                quantity: round_decimal(order.quantity, self.precision),
                sibling: sl_id,
                exit_reason: Some(FailureReason::TakeProfit),
            });
        }
        if let (Some(sl), Some(sl_id)) = (order.exit.stop_loss, sl_id) {
            let mut leg = Order::limit(order.symbol.clone(), exit_side, order.quantity, sl);
            leg.position_type = order.position_type;
            leg.strategy_name = order.strategy_name.clone();
            leg.tag = OrderTag {
                reason: Some(FailureReason::StopLoss.as_str().to_string()),
                message: None,
            };
            self.pending.push(PendingOrder {
                id: sl_id,
                order: leg,
                quantity: round_decimal(order.quantity, self.precision),
                sibling: tp_id,
                exit_reason: Some(FailureReason::StopLoss),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commission::{PerShareCommission, ZeroCommission};
    use rust_decimal_macros::dec;

    fn bar(symbol: &str, high: Decimal, low: Decimal) -> MarketBar {
        MarketBar {
            symbol: symbol.to_string(),
            time: 1000,
            open: (high + low) / Decimal::TWO,
            high,
            low,
            close: (high + low) / Decimal::TWO,
            volume: dec!(1000),
        }
    }

    fn gw(balance: Decimal) -> TradingGateway {
        TradingGateway::new(balance, 8, Box::new(ZeroCommission))
    }

    #[test]
    fn from_config_round_trips_through_yaml() {
        let config = GatewayConfig {
            initial_balance: dec!(5000),
            precision: 4,
            commission: crate::commission::CommissionConfig::PerShare { rate: dec!(0.01) },
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: GatewayConfig = serde_yaml::from_str(&yaml).unwrap();
        let g = TradingGateway::from_config(parsed);
        assert_eq!(g.account_info().balance, dec!(5000));
    }

    #[test]
    fn market_buy_sufficient_balance_fills_at_mid() {
        let mut g = gw(dec!(10000));
        g.update_market(bar("AAPL", dec!(100), dec!(90)));
        let id = g.place_order(Order::market("AAPL", Side::Buy, dec!(10))).unwrap();
        assert_eq!(g.status(id), Some(OrderStatus::Filled));
        let trades = g.ledger().get_all_trades();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, dec!(95));
    }

    #[test]
    fn market_buy_insufficient_balance_persists_failed() {
        let mut g = gw(dec!(500));
        g.update_market(bar("AAPL", dec!(100), dec!(90)));
        let id = g.place_order(Order::market("AAPL", Side::Buy, dec!(10))).unwrap();
        assert_eq!(g.status(id), Some(OrderStatus::Failed));
        assert_eq!(g.ledger().get_all_trades().len(), 0);
        assert_eq!(
            g.ledger().get_order(id).unwrap().failure_reason,
            Some(FailureReason::InsufficientBuyPower)
        );
    }

    #[test]
    fn limit_buy_below_low_clears_on_later_bar() {
        let mut g = gw(dec!(10000));
        g.update_market(bar("AAPL", dec!(101), dec!(100)));
        let id = g
            .place_order(Order::limit("AAPL", Side::Buy, dec!(10), dec!(95)))
            .unwrap();
        assert_eq!(g.status(id), Some(OrderStatus::Pending));

        g.update_market(bar("AAPL", dec!(100), dec!(94)));
        assert_eq!(g.status(id), Some(OrderStatus::Filled));
        let trades = g.ledger().get_all_trades();
        assert_eq!(trades[0].price, dec!(95));
    }

    #[test]
    fn short_entry_then_cover_matches_reversed_pnl() {
        let mut g = TradingGateway::new(dec!(100000), 8, Box::new(PerShareCommission { rate: dec!(0.01) }));
        g.update_market(bar("AAPL", dec!(100), dec!(100)));
        let short_order = Order::market("AAPL", Side::Sell, dec!(100));
        g.place_order(short_order).unwrap();

        g.update_market(bar("AAPL", dec!(110), dec!(110)));
        let mut cover_order = Order::market("AAPL", Side::Buy, dec!(100));
        cover_order.position_type = PositionType::Short;
        g.place_order(cover_order).unwrap();

        let trades = g.ledger().get_all_trades();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[1].pnl, dec!(-1002));
    }

    #[test]
    fn short_cover_is_clamped_to_held_short_quantity() {
        let mut g = TradingGateway::new(dec!(100000), 8, Box::new(ZeroCommission));
        g.update_market(bar("AAPL", dec!(100), dec!(100)));
        g.place_order(Order::market("AAPL", Side::Sell, dec!(50))).unwrap();

        g.update_market(bar("AAPL", dec!(110), dec!(110)));
        let mut cover = Order::market("AAPL", Side::Buy, dec!(100));
        cover.position_type = PositionType::Short;
        g.place_order(cover).unwrap();

        let trades = g.ledger().get_all_trades();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[1].quantity, dec!(50));
        assert_eq!(g.positions().short_qty("AAPL"), Decimal::ZERO);
    }

    #[test]
    fn cover_with_no_open_short_is_rejected() {
        let mut g = gw(dec!(100000));
        g.update_market(bar("AAPL", dec!(100), dec!(100)));
        let mut cover = Order::market("AAPL", Side::Buy, dec!(10));
        cover.position_type = PositionType::Short;
        let id = g.place_order(cover).unwrap();
        assert_eq!(g.status(id), Some(OrderStatus::Failed));
        assert!(g.ledger().get_all_trades().is_empty());
    }

    #[test]
    fn oco_pair_cancels_the_sibling_leg_when_the_other_fills_same_bar() {
        let mut g = gw(dec!(10000));
        g.update_market(bar("AAPL", dec!(100), dec!(90)));
        let mut order = Order::market("AAPL", Side::Buy, dec!(10));
        order.exit.take_profit = Some(dec!(120));
        order.exit.stop_loss = Some(dec!(80));
        g.place_order(order).unwrap();
        assert_eq!(g.open_orders().len(), 2);

        // Bar whose range crosses both triggers within the same update_market call.
        g.update_market(bar("AAPL", dec!(130), dec!(70)));

        assert_eq!(g.open_orders().len(), 0);
        let exit_orders: Vec<_> = g
            .ledger()
            .get_all_orders()
            .filter(|o| o.order.side == Side::Sell)
            .collect();
        assert_eq!(exit_orders.len(), 2);
        let filled = exit_orders.iter().filter(|o| o.status == OrderStatus::Filled).count();
        let cancelled = exit_orders
            .iter()
            .filter(|o| {
                o.status == OrderStatus::Failed
                    && matches!(
                        o.failure_reason,
                        Some(FailureReason::TakeProfit) | Some(FailureReason::StopLoss)
                    )
            })
            .count();
        assert_eq!(filled, 1);
        assert_eq!(cancelled, 1);
    }

    #[test]
    fn entry_timestamp_is_none_on_an_add_fill_and_set_only_on_the_closing_fill() {
        let mut g = gw(dec!(100000));
        g.update_market(bar("AAPL", dec!(100), dec!(100)));
        g.place_order(Order::market("AAPL", Side::Buy, dec!(10))).unwrap(); // entry
        g.update_market(bar("AAPL", dec!(100), dec!(100)));
        g.place_order(Order::market("AAPL", Side::Buy, dec!(5))).unwrap(); // add
        g.update_market(bar("AAPL", dec!(110), dec!(110)));
        g.place_order(Order::market("AAPL", Side::Sell, dec!(15))).unwrap(); // exit

        let trades = g.ledger().get_all_trades();
        assert_eq!(trades.len(), 3);
        assert_eq!(trades[0].entry_timestamp, None);
        assert_eq!(trades[1].entry_timestamp, None);
        assert_eq!(trades[2].entry_timestamp, Some(1000));
    }

    #[test]
    fn decimal_precision_rounds_quantity() {
        let mut g = TradingGateway::new(dec!(1000000), 8, Box::new(ZeroCommission));
        g.update_market(bar("AAPL", dec!(100), dec!(100)));
        let id = g
            .place_order(Order::market("AAPL", Side::Buy, dec!(0.123456789)))
            .unwrap();
        let trades = g.ledger().get_all_trades();
        assert_eq!(trades[0].quantity, dec!(0.12345678));
        assert_eq!(g.status(id), Some(OrderStatus::Filled));
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut g = gw(dec!(10000));
        g.update_market(bar("AAPL", dec!(101), dec!(100)));
        let id1 = g
            .place_order(Order::limit("AAPL", Side::Buy, dec!(10), dec!(50)))
            .unwrap();
        let id2 = g
            .place_order(Order::limit("AAPL", Side::Buy, dec!(10), dec!(51)))
            .unwrap();
        g.cancel(id1);
        assert_eq!(g.open_orders().len(), 1);
        g.cancel(id1);
        assert_eq!(g.open_orders().len(), 1);
        assert_eq!(g.status(id2), Some(OrderStatus::Pending));
    }

    #[test]
    fn symbol_mismatch_is_quarantined_until_matching_bar() {
        let mut g = gw(dec!(10000));
        g.update_market(bar("SPY", dec!(400), dec!(399)));
        let id = g.place_order(Order::market("AAPL", Side::Buy, dec!(1))).unwrap();
        assert_eq!(g.status(id), Some(OrderStatus::Pending));

        g.update_market(bar("AAPL", dec!(100), dec!(99)));
        assert_eq!(g.status(id), Some(OrderStatus::Filled));
    }

    #[test]
    fn take_profit_leg_only_queues_after_entry_fills() {
        let mut g = gw(dec!(500));
        g.update_market(bar("AAPL", dec!(100), dec!(90)));
        let mut order = Order::market("AAPL", Side::Buy, dec!(10));
        order.exit.take_profit = Some(dec!(120));
        let id = g.place_order(order).unwrap();

        assert_eq!(g.status(id), Some(OrderStatus::Failed));
        assert_eq!(g.open_orders().len(), 0);
    }

    #[test]
    fn take_profit_leg_queues_once_entry_fills() {
        let mut g = gw(dec!(10000));
        g.update_market(bar("AAPL", dec!(100), dec!(90)));
        let mut order = Order::market("AAPL", Side::Buy, dec!(10));
        order.exit.take_profit = Some(dec!(120));
        let id = g.place_order(order).unwrap();

        assert_eq!(g.status(id), Some(OrderStatus::Filled));
        assert_eq!(g.open_orders().len(), 1);
        assert_eq!(g.open_orders()[0].order_type, OrderType::Limit { price: dec!(120) });
    }

    #[test]
    fn max_buy_qty_rejects_non_positive_price() {
        let g = gw(dec!(10000));
        assert!(g.max_buy_qty(Decimal::ZERO).is_err());
        assert_eq!(g.max_buy_qty(dec!(100)).unwrap(), dec!(100));
    }
}
