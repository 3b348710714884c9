//! Error Handling Module
//!
//! Structured error types for the kernel. Uses `thiserror` for ergonomic
//! error definitions.
//!
//! # Design Principles
//! 1. All errors are typed and descriptive
//! 2. No panics in hot paths - use Result<T, E>
//! 3. Two channels: caller-visible `Result` errors for preconditions/IO, and
//!    persisted failed-order reason codes for domain outcomes (see `types::FailureReason`)

use thiserror::Error;

/// Errors returned by the trading gateway for preconditions that are not
/// domain outcomes (those are persisted as failed orders instead, see
/// `types::FailureReason`).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("order quantity rounds to zero at configured precision")]
    ZeroQuantityAfterRounding,

    #[error("reference price must be positive, got {0}")]
    NonPositivePrice(rust_decimal::Decimal),

    #[error("unknown order id: {0}")]
    UnknownOrderId(uuid::Uuid),

    #[error("no market data has been observed for symbol {0} yet")]
    NoMarketData(String),
}

/// Errors from the ledger store.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("unknown order id: {0}")]
    UnknownOrderId(uuid::Uuid),

    #[error("IO error writing ledger snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_yaml::Error),
}

/// Crate-wide error type composing the component errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
