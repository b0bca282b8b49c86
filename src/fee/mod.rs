//! Deterministic transaction fees.
//!
//! Every term is computed in fixed-point decimal and rounded once, so all
//! validating nodes charge the same amount to the last unit.

pub mod inputs;
pub mod log10;
pub mod schedule;
pub mod types;

pub use inputs::{FeeInputs, TokenMint};
pub use schedule::{FeeBreakdown, FeeSchedule};
pub use types::{FeeAmount, FeePrice};

use crate::error::ConfigError;

/// Fee of a transaction under the default schedule.
pub fn compute_fee(inputs: &FeeInputs, price: FeePrice) -> Result<FeeAmount, ConfigError> {
    FeeSchedule::default()
        .compute(inputs, price)
        .map(|breakdown| breakdown.total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransactionType;
    use rust_decimal::Decimal;

    fn price(units: i64) -> FeePrice {
        FeePrice::new(Decimal::from(units)).unwrap()
    }

    fn transfer(byte_size: u64, replicas: u32, recipients: u32) -> FeeInputs {
        FeeInputs {
            byte_size,
            replica_count: replicas,
            recipient_count: recipients,
            tx_type: TransactionType::Transfer,
            token: None,
        }
    }

    fn token(mint: TokenMint) -> FeeInputs {
        FeeInputs {
            tx_type: TransactionType::Token,
            token: Some(mint),
            ..transfer(0, 1, 0)
        }
    }

    fn minimum_units(p: &FeePrice) -> u64 {
        compute_fee(&transfer(0, 1, 0), *p).unwrap().units()
    }

    #[test]
    fn test_minimum_fee() {
        // 0.01 USD at 2 UCO per USD
        let fee = compute_fee(&transfer(0, 1, 1), price(2)).unwrap();
        assert_eq!(fee, FeeAmount(2_000_000));
    }

    #[test]
    fn test_storage_and_recipient_terms() {
        let breakdown = FeeSchedule::default()
            .compute(&transfer(1_000, 10, 3), price(1))
            .unwrap();

        assert_eq!(breakdown.minimum, Decimal::new(1, 2));
        assert_eq!(breakdown.storage, Decimal::new(1, 4));
        assert_eq!(breakdown.recipients, Decimal::new(2, 1));
        assert_eq!(breakdown.total, FeeAmount(21_010_000));
    }

    #[test]
    fn test_exempt_types_are_free() {
        for tx_type in [
            TransactionType::Node,
            TransactionType::Oracle,
            TransactionType::Beacon,
            TransactionType::Keychain,
            TransactionType::KeychainAccess,
        ] {
            let inputs = FeeInputs {
                tx_type,
                ..transfer(10_000, 0, 50)
            };
            assert_eq!(compute_fee(&inputs, price(3)).unwrap(), FeeAmount::ZERO);
        }
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            compute_fee(&transfer(10, 0, 1), price(1)),
            Err(ConfigError::InvalidFeeInputs(_))
        ));
        assert!(FeePrice::new(Decimal::ZERO).is_err());
    }

    #[test]
    fn test_fee_is_monotonic_in_size_and_recipients() {
        let p = price(1);
        let mut last = FeeAmount::ZERO;
        for size in (0..10_000).step_by(500) {
            let fee = compute_fee(&transfer(size, 5, 1), p).unwrap();
            assert!(fee >= last);
            last = fee;
        }

        let mut last = FeeAmount::ZERO;
        for recipients in 0..20 {
            let fee = compute_fee(&transfer(100, 5, recipients), p).unwrap();
            assert!(fee >= last);
            last = fee;
        }

        assert!(
            compute_fee(&transfer(100, 6, 1), p).unwrap()
                > compute_fee(&transfer(100, 5, 1), p).unwrap()
        );
    }

    #[test]
    fn test_mint_fee_strictly_increasing() {
        let p = price(1);
        let mut last = compute_fee(&token(TokenMint::NonFungible { utxo_count: 0 }), p).unwrap();
        for utxo_count in 1..200 {
            let fee = compute_fee(&token(TokenMint::NonFungible { utxo_count }), p).unwrap();
            assert!(fee > last, "mint fee did not grow at {utxo_count} UTXOs");
            last = fee;
        }
    }

    #[test]
    fn test_fungible_token_pays_minimum_only() {
        let p = price(4);
        let breakdown = FeeSchedule::default()
            .compute(&token(TokenMint::Fungible), p)
            .unwrap();

        assert_eq!(breakdown.mint, Decimal::ZERO);
        assert_eq!(breakdown.total.units(), minimum_units(&p));

        // 1000 bytes on 2 replicas add 2000 * 1e-8 * 4 UCO of storage
        let inputs = FeeInputs {
            byte_size: 1000,
            replica_count: 2,
            ..token(TokenMint::Fungible)
        };
        let breakdown = FeeSchedule::default().compute(&inputs, p).unwrap();
        assert_eq!(breakdown.total.units(), minimum_units(&p) + 8_000);
        assert_eq!(breakdown.total, FeeAmount(4_008_000));
    }

    #[test]
    fn test_ten_utxo_nft_costs_twenty_minimums() {
        let p = price(1);
        let breakdown = FeeSchedule::default()
            .compute(&token(TokenMint::NonFungible { utxo_count: 10 }), p)
            .unwrap();

        assert_eq!(breakdown.mint, breakdown.minimum * Decimal::from(20));
        assert_eq!(breakdown.total.units(), 21 * minimum_units(&p));
    }

    #[test]
    fn test_fee_is_pure() {
        let inputs = token(TokenMint::NonFungible { utxo_count: 7 });
        let p = FeePrice::new(Decimal::new(123_456, 4)).unwrap();
        assert_eq!(compute_fee(&inputs, p).unwrap(), compute_fee(&inputs, p).unwrap());
    }
}
