//! Thin orchestration loop: drive bars from a `Datasource` through a
//! `TradingGateway` and a `Strategy`, then assemble the final report.
//!
//! Owns no configuration parsing, no strategy loading, no bar decoding —
//! those stay external collaborators' jobs (see `strategy.rs`).

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::commission::CommissionPolicy;
use crate::error::EngineResult;
use crate::gateway::TradingGateway;
use crate::stats::{compute_report, Report, SymbolMark};
use crate::strategy::{Datasource, Strategy};
use crate::types::MarketBar;

/// Drives one (symbol, strategy, datasource) run end to end.
pub struct Runner<S: Strategy, D: Datasource> {
    gateway: TradingGateway,
    strategy: S,
    datasource: D,
    symbol: String,
}

impl<S: Strategy, D: Datasource> Runner<S, D> {
    pub fn new(
        symbol: impl Into<String>,
        initial_balance: Decimal,
        precision: u32,
        commission: Box<dyn CommissionPolicy>,
        strategy: S,
        datasource: D,
    ) -> Self {
        Self {
            gateway: TradingGateway::new(initial_balance, precision, commission),
            strategy,
            datasource,
            symbol: symbol.into(),
        }
    }

    /// Run the full bar loop for this runner's symbol, then compute the
    /// final report. Ordering per bar: market update (which also drains the
    /// pending queue), then the strategy observes the bar and may submit
    /// new orders against the same bar.
    pub fn run(&mut self) -> EngineResult<Report> {
        self.strategy.initialize_api(&mut self.gateway)?;

        let mut last_error: Option<crate::error::EngineError> = None;
        let symbol = self.symbol.clone();
        let gateway = &mut self.gateway;
        let strategy = &mut self.strategy;
        self.datasource.read_all(&symbol, &mut |bar: &MarketBar| {
            tracing::debug!(symbol = %bar.symbol, time = bar.time, "processing bar");
            gateway.update_market(bar.clone());
            if let Err(e) = strategy.process_data(bar) {
                tracing::warn!(error = %e, "strategy callback failed, aborting run");
                last_error = Some(e);
                return false;
            }
            true
        })?;
        if let Some(e) = last_error {
            return Err(e);
        }

        let last_bar = self.datasource.read_last(&symbol)?;
        let mut marks = HashMap::new();
        if let Some(bar) = last_bar {
            marks.insert(
                bar.symbol.clone(),
                SymbolMark {
                    close: bar.close,
                    time: bar.time,
                },
            );
        }

        let account = self.gateway.account_info();
        Ok(compute_report(
            self.gateway.ledger(),
            self.gateway.positions(),
            &marks,
            account.balance,
        ))
    }

    pub fn gateway(&self) -> &TradingGateway {
        &self.gateway
    }
}
