//! Deterministic bar-by-bar backtesting simulation kernel.
//!
//! Owns order validation/matching/queueing (`gateway`), average-cost
//! position accounting (`position`), an indexed trade/order ledger with a
//! Parquet snapshot writer (`ledger`), and per-symbol/portfolio KPI
//! reporting (`stats`). Strategy and market-data decoding are external
//! collaborators, contracted in `strategy`.

pub mod commission;
pub mod error;
pub mod gateway;
pub mod ledger;
pub mod position;
pub mod precision;
pub mod runner;
pub mod stats;
pub mod strategy;
pub mod types;

pub use commission::{
    CommissionConfig, CommissionPolicy, PercentageCommission, PerShareCommission, ZeroCommission,
};
pub use error::{EngineError, EngineResult, GatewayError, LedgerError};
pub use gateway::{AccountInfo, GatewayConfig, TradingGateway};
pub use ledger::{LedgerStore, TradeFilter};
pub use position::{PositionBook, PositionState, SideAggregate};
pub use runner::Runner;
pub use stats::{compute_report, HoldingTime, PortfolioStats, Report, SymbolMark, SymbolStats};
pub use strategy::{Datasource, Strategy};
pub use types::{
    ExecutedOrder, ExitSpec, FailureReason, MarketBar, Order, OrderStatus, OrderTag, OrderType,
    PositionType, Side, Trade,
};
