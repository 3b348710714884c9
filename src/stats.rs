//! Statistics engine: per-symbol and portfolio KPIs computed from a frozen
//! ledger, serialized to the `stats.yaml` report layout.

use std::collections::HashMap;
use std::fs::File;
use std::io::Write as _;
use std::path::Path;

use rayon::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::ledger::LedgerStore;
use crate::position::PositionBook;
use crate::types::Trade;

/// Min/max/avg holding time in seconds, over closed round trips plus any
/// still-open position (valued to `run_end_time`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HoldingTime {
    pub min: i64,
    pub max: i64,
    pub avg: f64,
}

/// Per-symbol KPI block, see §4.6.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolStats {
    pub symbol: String,
    pub number_of_trades: usize,
    pub number_of_winning_trades: usize,
    pub number_of_losing_trades: usize,
    pub win_rate: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub total_pnl: f64,
    pub maximum_profit: f64,
    pub maximum_loss: f64,
    pub max_drawdown: f64,
    pub total_fees: f64,
    pub holding_time: HoldingTime,
    pub buy_and_hold_pnl: f64,
}

/// Portfolio-level aggregate across all symbols.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioStats {
    pub number_of_trades: usize,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub total_pnl: f64,
    pub total_fees: f64,
    pub equity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub portfolio: PortfolioStats,
    pub symbols: Vec<SymbolStats>,
}

/// Last-bar-per-symbol info the statistics engine needs from the datasource:
/// closing mark and timestamp, for unrealized PnL / still-open holding time.
#[derive(Debug, Clone, Copy)]
pub struct SymbolMark {
    pub close: Decimal,
    pub time: i64,
}

fn to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

fn symbol_stats(
    symbol: &str,
    trades: &[&Trade],
    position: &PositionBook,
    mark: Option<SymbolMark>,
) -> SymbolStats {
    let number_of_trades = trades.len();
    let winning: Vec<&&Trade> = trades.iter().filter(|t| t.pnl > Decimal::ZERO).collect();
    let losing: Vec<&&Trade> = trades.iter().filter(|t| t.pnl < Decimal::ZERO).collect();
    let number_of_winning_trades = winning.len();
    let number_of_losing_trades = losing.len();
    let win_rate = if number_of_trades == 0 {
        0.0
    } else {
        number_of_winning_trades as f64 / number_of_trades as f64
    };

    let realized_pnl: Decimal = trades.iter().map(|t| t.pnl).sum();
    let total_fees: Decimal = trades.iter().map(|t| t.fee).sum();

    let unrealized_pnl = match (position.get(symbol), mark) {
        (Some(state), Some(m)) => state.unrealized_pnl(m.close),
        _ => Decimal::ZERO,
    };
    let total_pnl = realized_pnl + unrealized_pnl;

    let maximum_profit = trades.iter().map(|t| t.pnl).fold(Decimal::ZERO, Decimal::max);
    let maximum_loss = trades.iter().map(|t| t.pnl).fold(Decimal::ZERO, Decimal::min);

    let mut running = Decimal::ZERO;
    let mut peak = Decimal::ZERO;
    let mut max_drawdown = Decimal::ZERO;
    for t in trades {
        running += t.pnl;
        peak = peak.max(running);
        max_drawdown = max_drawdown.min(running - peak);
    }

    let run_end_time = mark.map(|m| m.time);
    let mut holds: Vec<i64> = trades
        .iter()
        .filter_map(|t| t.entry_timestamp.map(|entry| t.timestamp - entry))
        .collect();
    if let Some(state) = position.get(symbol) {
        if let (Some(open_ts), Some(end)) = (state.open_timestamp, run_end_time) {
            holds.push(end - open_ts);
        }
    }
    let holding_time = if holds.is_empty() {
        HoldingTime::default()
    } else {
        let min = *holds.iter().min().unwrap();
        let max = *holds.iter().max().unwrap();
        let avg = holds.iter().sum::<i64>() as f64 / holds.len() as f64;
        HoldingTime { min, max, avg }
    };

    let buy_and_hold_pnl = trades
        .iter()
        .min_by_key(|t| t.timestamp)
        .zip(mark)
        .map(|(first, m)| {
            let sign = match first.position_type {
                crate::types::PositionType::Long => Decimal::ONE,
                crate::types::PositionType::Short => -Decimal::ONE,
            };
            sign * (m.close - first.price) * first.quantity
        })
        .unwrap_or(Decimal::ZERO);

    SymbolStats {
        symbol: symbol.to_string(),
        number_of_trades,
        number_of_winning_trades,
        number_of_losing_trades,
        win_rate,
        realized_pnl: to_f64(realized_pnl),
        unrealized_pnl: to_f64(unrealized_pnl),
        total_pnl: to_f64(total_pnl),
        maximum_profit: to_f64(maximum_profit),
        maximum_loss: to_f64(maximum_loss),
        max_drawdown: to_f64(max_drawdown),
        total_fees: to_f64(total_fees),
        holding_time,
        buy_and_hold_pnl: to_f64(buy_and_hold_pnl),
    }
}

/// Compute the full report from a frozen ledger, position book, and the
/// datasource's last-bar-per-symbol marks, and balance for equity.
pub fn compute_report(
    ledger: &LedgerStore,
    positions: &PositionBook,
    marks: &HashMap<String, SymbolMark>,
    balance: Decimal,
) -> Report {
    let all_trades = ledger.get_all_trades();
    let mut by_symbol: HashMap<&str, Vec<&Trade>> = HashMap::new();
    for t in all_trades {
        by_symbol.entry(t.symbol.as_str()).or_default().push(t);
    }

    let symbols: Vec<SymbolStats> = by_symbol
        .into_par_iter()
        .map(|(symbol, trades)| symbol_stats(symbol, &trades, positions, marks.get(symbol).copied()))
        .collect();

    let mut symbols = symbols;
    symbols.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    let realized_pnl: f64 = symbols.iter().map(|s| s.realized_pnl).sum();
    let unrealized_pnl: f64 = symbols.iter().map(|s| s.unrealized_pnl).sum();
    let portfolio = PortfolioStats {
        number_of_trades: symbols.iter().map(|s| s.number_of_trades).sum(),
        realized_pnl,
        unrealized_pnl,
        total_pnl: realized_pnl + unrealized_pnl,
        total_fees: symbols.iter().map(|s| s.total_fees).sum(),
        equity: to_f64(balance) + unrealized_pnl,
    };

    Report { portfolio, symbols }
}

impl Report {
    /// Write this report to `<dir>/stats.yaml`.
    pub fn write(&self, dir: &Path) -> Result<(), LedgerError> {
        std::fs::create_dir_all(dir)?;
        let yaml = serde_yaml::to_string(self)?;
        let mut file = File::create(dir.join("stats.yaml"))?;
        file.write_all(yaml.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PositionType, Side};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn trade(symbol: &str, pnl: Decimal, timestamp: i64, entry_timestamp: Option<i64>) -> Trade {
        Trade {
            order_id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            side: Side::Sell,
            position_type: PositionType::Long,
            quantity: dec!(10),
            price: dec!(100),
            fee: dec!(1),
            pnl,
            timestamp,
            strategy_name: "s".to_string(),
            entry_timestamp,
        }
    }

    #[test]
    fn win_rate_and_totals_over_closed_trades() {
        let mut ledger = LedgerStore::new();
        ledger.record_trade(trade("AAPL", dec!(100), 2000, Some(1000)));
        ledger.record_trade(trade("AAPL", dec!(-50), 3000, Some(1500)));
        let positions = PositionBook::new();
        let marks = HashMap::new();
        let report = compute_report(&ledger, &positions, &marks, dec!(10000));

        assert_eq!(report.portfolio.number_of_trades, 2);
        let sym = &report.symbols[0];
        assert_eq!(sym.number_of_winning_trades, 1);
        assert_eq!(sym.number_of_losing_trades, 1);
        assert_eq!(sym.win_rate, 0.5);
        assert_eq!(sym.realized_pnl, 50.0);
        assert_eq!(sym.holding_time.min, 1000);
        assert_eq!(sym.holding_time.max, 1500);
    }

    #[test]
    fn max_drawdown_is_non_positive() {
        let mut ledger = LedgerStore::new();
        ledger.record_trade(trade("AAPL", dec!(100), 1000, Some(0)));
        ledger.record_trade(trade("AAPL", dec!(-200), 2000, Some(500)));
        ledger.record_trade(trade("AAPL", dec!(50), 3000, Some(1500)));
        let positions = PositionBook::new();
        let marks = HashMap::new();
        let report = compute_report(&ledger, &positions, &marks, dec!(10000));
        assert!(report.symbols[0].max_drawdown <= 0.0);
        assert_eq!(report.symbols[0].max_drawdown, -200.0);
    }

    #[test]
    fn still_open_position_counts_unrealized_and_open_holding_time() {
        let mut ledger = LedgerStore::new();
        ledger.record_trade(trade("AAPL", Decimal::ZERO, 1000, None));
        let mut positions = PositionBook::new();
        positions.apply_fill("AAPL", PositionType::Long, Side::Buy, dec!(10), dec!(100), dec!(0), 1000, "trend");
        let mut marks = HashMap::new();
        marks.insert("AAPL".to_string(), SymbolMark { close: dec!(120), time: 5000 });

        let report = compute_report(&ledger, &positions, &marks, dec!(10000));
        let sym = &report.symbols[0];
        assert_eq!(sym.unrealized_pnl, 200.0);
        assert_eq!(sym.holding_time.min, 4000);
    }

    #[test]
    fn write_produces_stats_yaml() {
        let report = Report {
            portfolio: PortfolioStats::default(),
            symbols: vec![],
        };
        let dir = tempfile::tempdir().unwrap();
        report.write(dir.path()).unwrap();
        assert!(dir.path().join("stats.yaml").exists());
    }
}
