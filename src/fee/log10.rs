//! Integer-only base-10 logarithm.
//!
//! Floating point is avoided so the result is identical on every node.
//! The integer part is the digit count; the fraction is produced one bit at
//! a time by repeated squaring of the mantissa.

use rust_decimal::Decimal;

/// Decimal places of the returned logarithm.
pub const LOG_SCALE: u32 = 18;

const SCALE: u128 = 1_000_000_000_000_000_000;
const FRACTION_BITS: u32 = 60;

/// `log10(n)` with [`LOG_SCALE`] decimal places, `None` for zero.
pub fn log10(n: u64) -> Option<Decimal> {
    if n == 0 {
        return None;
    }

    let mut integer: u32 = 0;
    let mut pow: u128 = 1;
    while pow * 10 <= n as u128 {
        pow *= 10;
        integer += 1;
    }

    // mantissa in [1, 10) at SCALE; n < 2^64 so n * SCALE fits
    let mut y = (n as u128) * SCALE / pow;
    let ten = 10 * SCALE;
    let mut bits: u128 = 0;

    for i in 1..=FRACTION_BITS {
        // y < 10^19, so y^2 < 10^38 < u128::MAX
        y = y * y / SCALE;
        if y >= ten {
            y /= 10;
            bits |= 1 << (FRACTION_BITS - i);
        }
    }

    // bits < 2^60 and SCALE < 2^60: the product fits in 120 bits
    let fraction = (bits * SCALE) >> FRACTION_BITS;
    let mantissa = integer as u128 * SCALE + fraction;

    Some(Decimal::from_i128_with_scale(mantissa as i128, LOG_SCALE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn close(actual: Decimal, expected: &str) -> bool {
        let expected = Decimal::from_str(expected).unwrap();
        (actual - expected).abs() < Decimal::new(1, 15)
    }

    #[test]
    fn test_powers_of_ten_are_exact() {
        assert_eq!(log10(1), Some(Decimal::ZERO));
        assert_eq!(log10(10), Some(Decimal::ONE));
        assert_eq!(log10(1_000_000), Some(Decimal::from(6)));
    }

    #[test]
    fn test_fractional_values() {
        assert!(close(log10(2).unwrap(), "0.301029995663981195"));
        assert!(close(log10(5).unwrap(), "0.698970004336018804"));
        assert!(close(log10(99).unwrap(), "1.995635194597248595"));
        assert!(close(log10(u64::MAX).unwrap(), "19.265919722494796493"));
    }

    #[test]
    fn test_zero() {
        assert_eq!(log10(0), None);
    }

    #[test]
    fn test_monotonic() {
        let mut last = Decimal::ZERO;
        for n in 1..2_000u64 {
            let value = log10(n).unwrap();
            assert!(value >= last, "log10({n}) decreased");
            last = value;
        }
    }
}
