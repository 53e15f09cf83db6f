//! Fixed-point codec for prices and quantities.
//!
//! The wire and the mirror carry `u64` values scaled by 10^7. The HTTP
//! endpoints carry decimal strings; this module converts between the two.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Number of fractional digits carried by scaled values.
pub const SCALE_DIGITS: u32 = 7;

/// Multiplier between a decimal value and its scaled integer.
pub const SCALE: u64 = 10_000_000;

/// Errors converting a decimal into a scaled integer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FixedPointError {
    #[error("invalid decimal: {0:?}")]
    Invalid(String),

    #[error("negative value: {0}")]
    Negative(String),

    #[error("value out of range: {0}")]
    Overflow(String),
}

/// Scale a decimal by 10^7, rounding half away from zero.
pub fn scale_decimal(value: Decimal) -> Result<u64, FixedPointError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(FixedPointError::Negative(value.to_string()));
    }

    value
        .checked_mul(Decimal::from(SCALE))
        .map(|v| v.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|v| v.to_u64())
        .ok_or_else(|| FixedPointError::Overflow(value.to_string()))
}

/// Parse a decimal string such as `"10.25"` or `"1e-07"` into a scaled integer.
pub fn parse_scaled(s: &str) -> Result<u64, FixedPointError> {
    let trimmed = s.trim();
    let value = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| FixedPointError::Invalid(s.to_string()))?;
    scale_decimal(value)
}

/// Render a scaled value with exactly seven fractional digits.
pub fn format_scaled(value: u64) -> String {
    format!(
        "{}.{:0width$}",
        value / SCALE,
        value % SCALE,
        width = SCALE_DIGITS as usize
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_plain_values() {
        assert_eq!(parse_scaled("10.0000000").unwrap(), 100_000_000);
        assert_eq!(parse_scaled("1").unwrap(), SCALE);
        assert_eq!(parse_scaled("0.0000001").unwrap(), 1);
        assert_eq!(parse_scaled("0").unwrap(), 0);
        assert_eq!(parse_scaled(" 2.5 ").unwrap(), 25_000_000);
    }

    #[test]
    fn test_parse_exponent_notation() {
        assert_eq!(parse_scaled("1e-07").unwrap(), 1);
        assert_eq!(parse_scaled("1E-7").unwrap(), 1);
        assert_eq!(parse_scaled("2.5e1").unwrap(), 250_000_000);
        assert_eq!(parse_scaled("1.5e-3").unwrap(), 15_000);
        assert!(matches!(parse_scaled("1e"), Err(FixedPointError::Invalid(_))));
    }

    #[test]
    fn test_excess_digits_round_half_away() {
        assert_eq!(scale_decimal(dec!(0.00000005)).unwrap(), 1);
        assert_eq!(scale_decimal(dec!(0.00000004)).unwrap(), 0);
        assert_eq!(scale_decimal(dec!(1.00000015)).unwrap(), 10_000_002);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(parse_scaled("abc"), Err(FixedPointError::Invalid(_))));
        assert!(matches!(parse_scaled(""), Err(FixedPointError::Invalid(_))));
        assert!(matches!(parse_scaled("-1.5"), Err(FixedPointError::Negative(_))));
        assert!(matches!(
            parse_scaled("99999999999999999999"),
            Err(FixedPointError::Overflow(_))
        ));
    }

    #[test]
    fn test_format_has_seven_fraction_digits() {
        assert_eq!(format_scaled(0), "0.0000000");
        assert_eq!(format_scaled(1), "0.0000001");
        assert_eq!(format_scaled(100_000_000), "10.0000000");
        assert_eq!(format_scaled(123_456_789), "12.3456789");
        assert_eq!(format_scaled(u64::MAX), "1844674407370.9551615");
    }

    #[test]
    fn test_format_parses_back_to_same_value() {
        for value in [0, 1, 9_999_999, SCALE, 123_456_789, 5_000_000_000_001, u64::MAX] {
            let rendered = format_scaled(value);
            let fraction = rendered.split('.').nth(1).unwrap();
            assert_eq!(fraction.len(), 7, "{}", rendered);
            assert_eq!(parse_scaled(&rendered).unwrap(), value, "{}", rendered);
        }
    }
}
