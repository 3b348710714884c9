//! Commission policy: a pure function from fill quantity/price to fee.
//!
//! The gateway never inspects a policy's internals; it only calls `fee()`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub trait CommissionPolicy: Send + Sync {
    /// Fee charged for a fill of `quantity` at `price`. Must be non-negative.
    fn fee(&self, quantity: Decimal, price: Decimal) -> Decimal;
}

/// No commission at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZeroCommission;

impl CommissionPolicy for ZeroCommission {
    fn fee(&self, _quantity: Decimal, _price: Decimal) -> Decimal {
        Decimal::ZERO
    }
}

/// Flat fee per unit traded, independent of price.
#[derive(Debug, Clone, Copy)]
pub struct PerShareCommission {
    pub rate: Decimal,
}

impl CommissionPolicy for PerShareCommission {
    fn fee(&self, quantity: Decimal, _price: Decimal) -> Decimal {
        (quantity * self.rate).max(Decimal::ZERO)
    }
}

/// Fee proportional to notional value (quantity * price).
#[derive(Debug, Clone, Copy)]
pub struct PercentageCommission {
    pub rate: Decimal,
}

impl CommissionPolicy for PercentageCommission {
    fn fee(&self, quantity: Decimal, price: Decimal) -> Decimal {
        (quantity * price * self.rate).max(Decimal::ZERO)
    }
}

/// Serializable stand-in for a `CommissionPolicy` trait object, so a
/// `GatewayConfig` can come straight out of a driver's YAML file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionConfig {
    Zero,
    PerShare { rate: Decimal },
    Percentage { rate: Decimal },
}

impl CommissionConfig {
    pub fn build(&self) -> Box<dyn CommissionPolicy> {
        match *self {
            CommissionConfig::Zero => Box::new(ZeroCommission),
            CommissionConfig::PerShare { rate } => Box::new(PerShareCommission { rate }),
            CommissionConfig::Percentage { rate } => Box::new(PercentageCommission { rate }),
        }
    }
}
