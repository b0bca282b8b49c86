use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::UCO_DECIMALS;
use crate::error::ConfigError;

/// Exchange rate in UCO per USD derived from the oracle, constant during
/// one fee computation. Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct FeePrice(Decimal);

impl FeePrice {
    pub fn new(price: Decimal) -> Result<Self, ConfigError> {
        if price <= Decimal::ZERO {
            return Err(ConfigError::InvalidFeeInputs(format!(
                "UCO price must be positive, got {price}"
            )));
        }
        Ok(FeePrice(price))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for FeePrice {
    type Error = ConfigError;

    fn try_from(price: Decimal) -> Result<Self, Self::Error> {
        FeePrice::new(price)
    }
}

impl From<FeePrice> for Decimal {
    fn from(price: FeePrice) -> Self {
        price.0
    }
}

/// Fee in the smallest UCO unit (10^-8 UCO).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeeAmount(pub u64);

impl FeeAmount {
    pub const ZERO: FeeAmount = FeeAmount(0);

    pub fn units(&self) -> u64 {
        self.0
    }

    /// Amount expressed in UCO.
    pub fn to_uco(&self) -> Decimal {
        Decimal::from_i128_with_scale(self.0 as i128, UCO_DECIMALS)
    }
}

impl fmt::Display for FeeAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} UCO", self.to_uco())
    }
}
