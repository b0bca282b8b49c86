use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::inputs::{FeeInputs, TokenMint};
use super::log10::log10;
use super::types::{FeeAmount, FeePrice};
use crate::domain::UCO_DECIMALS;
use crate::error::ConfigError;

/// Fee rates, in USD, converted to UCO through the oracle price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Floor paid by every non-exempt transaction
    pub minimum_usd: Decimal,
    /// Cost of storing one byte on one replica
    pub storage_usd_per_byte: Decimal,
    /// Cost of each recipient after the first
    pub recipient_usd: Decimal,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        FeeSchedule {
            minimum_usd: Decimal::new(1, 2),
            storage_usd_per_byte: Decimal::new(1, 8),
            recipient_usd: Decimal::new(1, 1),
        }
    }
}

/// Each term of a fee, in UCO before rounding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeeBreakdown {
    pub minimum: Decimal,
    pub storage: Decimal,
    pub complexity: Decimal,
    pub recipients: Decimal,
    pub mint: Decimal,
    /// Sum of the terms rounded to the smallest UCO unit
    pub total: FeeAmount,
}

impl FeeBreakdown {
    fn exempt() -> Self {
        FeeBreakdown {
            minimum: Decimal::ZERO,
            storage: Decimal::ZERO,
            complexity: Decimal::ZERO,
            recipients: Decimal::ZERO,
            mint: Decimal::ZERO,
            total: FeeAmount::ZERO,
        }
    }
}

fn overflow(term: &str) -> ConfigError {
    ConfigError::InvalidFeeInputs(format!("{term} fee overflows"))
}

impl FeeSchedule {
    /// Price a transaction.
    ///
    /// Network and keychain transactions are free. Every other fee is the
    /// sum of the minimum, storage, recipient and mint terms, rounded half
    /// up once at the end.
    pub fn compute(&self, inputs: &FeeInputs, price: FeePrice) -> Result<FeeBreakdown, ConfigError> {
        if inputs.tx_type.is_network() || inputs.tx_type.is_keychain() {
            return Ok(FeeBreakdown::exempt());
        }
        if inputs.replica_count == 0 {
            return Err(ConfigError::InvalidFeeInputs(
                "replica count must be at least 1".to_string(),
            ));
        }

        let price = price.value();

        let minimum = self
            .minimum_usd
            .checked_mul(price)
            .ok_or_else(|| overflow("minimum"))?;

        let stored_bytes = Decimal::from(inputs.byte_size)
            .checked_mul(Decimal::from(inputs.replica_count))
            .ok_or_else(|| overflow("storage"))?;
        let storage = stored_bytes
            .checked_mul(self.storage_usd_per_byte)
            .and_then(|d| d.checked_mul(price))
            .ok_or_else(|| overflow("storage"))?;

        let recipients = if inputs.recipient_count <= 1 {
            Decimal::ZERO
        } else {
            Decimal::from(inputs.recipient_count - 1)
                .checked_mul(self.recipient_usd)
                .and_then(|d| d.checked_mul(price))
                .ok_or_else(|| overflow("recipient"))?
        };

        // fungible tokens pay the minimum fee alone
        let mint = match inputs.token {
            Some(TokenMint::NonFungible { utxo_count }) => mint_fee(utxo_count, minimum)?,
            Some(TokenMint::Fungible) | None => Decimal::ZERO,
        };

        // no complexity term is charged
        let complexity = Decimal::ZERO;

        let sum = [storage, complexity, recipients, mint]
            .into_iter()
            .try_fold(minimum, |acc, term| acc.checked_add(term))
            .ok_or_else(|| overflow("total"))?;
        let total = to_units(sum)?;

        debug!(
            tx_type = %inputs.tx_type,
            byte_size = inputs.byte_size,
            replicas = inputs.replica_count,
            recipients = inputs.recipient_count,
            fee = %total,
            "Fee computed"
        );

        Ok(FeeBreakdown {
            minimum,
            storage,
            complexity,
            recipients,
            mint,
            total,
        })
    }
}

/// `(log10(utxo_count) + 1) * utxo_count * minimum`, zero for no UTXOs.
fn mint_fee(utxo_count: u64, minimum: Decimal) -> Result<Decimal, ConfigError> {
    let Some(log) = log10(utxo_count) else {
        return Ok(Decimal::ZERO);
    };

    (log + Decimal::ONE)
        .checked_mul(Decimal::from(utxo_count))
        .and_then(|d| d.checked_mul(minimum))
        .ok_or_else(|| overflow("mint"))
}

/// Round half up to 10^-8 UCO and express in smallest units.
fn to_units(uco: Decimal) -> Result<FeeAmount, ConfigError> {
    let rounded = uco.round_dp_with_strategy(UCO_DECIMALS, RoundingStrategy::MidpointAwayFromZero);
    let units = rounded
        .checked_mul(Decimal::from(10u64.pow(UCO_DECIMALS)))
        .ok_or_else(|| overflow("total"))?;

    units.to_u64().map(FeeAmount).ok_or_else(|| overflow("total"))
}
