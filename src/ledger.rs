//! Ledger store: indexed order/trade store with a Parquet snapshot writer.
//!
//! Point-lookup and range-scan live on plain in-process indices (`HashMap`
//! by id, `BTreeMap` ordered by `(symbol, timestamp)`); Polars only enters
//! the picture at `write()`, where the indices are materialized into
//! `DataFrame`s and flushed to `trades.parquet` / `orders.parquet`.

use std::collections::{BTreeMap, HashMap};
use std::fs::{create_dir_all, File};
use std::path::Path;

use polars::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use uuid::Uuid;

use crate::error::LedgerError;
use crate::types::{ExecutedOrder, OrderStatus, Trade};

/// Filter for `filter_trades`.
#[derive(Debug, Clone, Default)]
pub struct TradeFilter {
    pub symbol: Option<String>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Default)]
pub struct LedgerStore {
    orders: HashMap<Uuid, ExecutedOrder>,
    order_index: BTreeMap<(String, i64), Uuid>,
    trades: Vec<Trade>,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a (possibly failed) executed order.
    pub fn record_order(&mut self, exec: ExecutedOrder) {
        let key = (
            exec.order.symbol.clone(),
            exec.execution_timestamp.unwrap_or(0),
        );
        self.order_index.insert(key, exec.id);
        self.orders.insert(exec.id, exec);
    }

    pub fn record_trade(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    pub fn get_order(&self, id: Uuid) -> Result<&ExecutedOrder, LedgerError> {
        self.orders.get(&id).ok_or(LedgerError::UnknownOrderId(id))
    }

    pub fn get_all_orders(&self) -> impl Iterator<Item = &ExecutedOrder> {
        self.orders.values()
    }

    pub fn get_all_trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn filter_trades(&self, filter: &TradeFilter) -> Vec<&Trade> {
        let mut out: Vec<&Trade> = self
            .trades
            .iter()
            .filter(|t| {
                filter.symbol.as_deref().map_or(true, |s| t.symbol == s)
                    && filter.start_time.map_or(true, |s| t.timestamp >= s)
                    && filter.end_time.map_or(true, |e| t.timestamp <= e)
            })
            .collect();
        out.sort_by_key(|t| t.timestamp);
        if let Some(limit) = filter.limit {
            out.truncate(limit);
        }
        out
    }

    /// Truncate all stored orders and trades.
    pub fn cleanup(&mut self) {
        self.orders.clear();
        self.order_index.clear();
        self.trades.clear();
    }

    /// Snapshot the ledger to `<dir>/trades.parquet` and `<dir>/orders.parquet`.
    pub fn write(&self, dir: &Path) -> Result<(), LedgerError> {
        create_dir_all(dir)?;
        self.write_orders(dir)?;
        self.write_trades(dir)?;
        Ok(())
    }

    fn write_orders(&self, dir: &Path) -> Result<(), LedgerError> {
        let mut orders: Vec<&ExecutedOrder> = self.orders.values().collect();
        orders.sort_by_key(|o| o.execution_timestamp.unwrap_or(0));

        let symbol: Vec<&str> = orders.iter().map(|o| o.order.symbol.as_str()).collect();
        let status: Vec<&str> = orders
            .iter()
            .map(|o| match o.status {
                OrderStatus::Pending => "pending",
                OrderStatus::Filled => "filled",
                OrderStatus::Failed => "failed",
            })
            .collect();
        let quantity: Vec<f64> = orders
            .iter()
            .map(|o| o.order.quantity.to_f64().unwrap_or(0.0))
            .collect();
        let price: Vec<Option<f64>> = orders
            .iter()
            .map(|o| o.execution_price.and_then(|p| p.to_f64()))
            .collect();
        let fee: Vec<f64> = orders.iter().map(|o| o.fee.to_f64().unwrap_or(0.0)).collect();
        let timestamp: Vec<Option<i64>> = orders.iter().map(|o| o.execution_timestamp).collect();
        let reason: Vec<Option<&str>> = orders
            .iter()
            .map(|o| o.failure_reason.map(|r| r.as_str()))
            .collect();
        let strategy: Vec<&str> = orders.iter().map(|o| o.order.strategy_name.as_str()).collect();

        let mut df = df!(
            "symbol" => symbol,
            "status" => status,
            "quantity" => quantity,
            "price" => price,
            "fee" => fee,
            "timestamp" => timestamp,
            "reason" => reason,
            "strategy_name" => strategy,
        )?;

        let file = File::create(dir.join("orders.parquet"))?;
        ParquetWriter::new(file).finish(&mut df)?;
        Ok(())
    }

    fn write_trades(&self, dir: &Path) -> Result<(), LedgerError> {
        let symbol: Vec<&str> = self.trades.iter().map(|t| t.symbol.as_str()).collect();
        let quantity: Vec<f64> = self
            .trades
            .iter()
            .map(|t| t.quantity.to_f64().unwrap_or(0.0))
            .collect();
        let price: Vec<f64> = self.trades.iter().map(|t| t.price.to_f64().unwrap_or(0.0)).collect();
        let fee: Vec<f64> = self.trades.iter().map(|t| t.fee.to_f64().unwrap_or(0.0)).collect();
        let pnl: Vec<f64> = self.trades.iter().map(|t| t.pnl.to_f64().unwrap_or(0.0)).collect();
        let timestamp: Vec<i64> = self.trades.iter().map(|t| t.timestamp).collect();
        let strategy: Vec<&str> = self.trades.iter().map(|t| t.strategy_name.as_str()).collect();
        let entry_timestamp: Vec<Option<i64>> = self.trades.iter().map(|t| t.entry_timestamp).collect();

        let mut df = df!(
            "symbol" => symbol,
            "quantity" => quantity,
            "price" => price,
            "fee" => fee,
            "pnl" => pnl,
            "timestamp" => timestamp,
            "strategy_name" => strategy,
            "entry_timestamp" => entry_timestamp,
        )?;

        let file = File::create(dir.join("trades.parquet"))?;
        ParquetWriter::new(file).finish(&mut df)?;
        Ok(())
    }
}
