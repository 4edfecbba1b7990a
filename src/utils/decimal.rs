use anyhow::{anyhow, Result};
use bigdecimal::{BigDecimal, Zero};
use std::str::FromStr;

/// Fractional digits kept on every division result and on derived prices.
pub const DECIMAL_SCALE: i64 = 20;

/// LP tokens of every pair use 18 decimals.
pub const LP_TOKEN_DECIMALS: u8 = 18;

/// `10^decimals` as an exact decimal.
pub fn exponent_to_big_decimal(decimals: u8) -> BigDecimal {
    BigDecimal::new(1.into(), -(decimals as i64))
}

/// Parses an on-chain uint (decimal string) into an integer-valued decimal.
pub fn parse_raw_amount(raw: &str) -> Result<BigDecimal> {
    let value = BigDecimal::from_str(raw.trim())
        .map_err(|e| anyhow!("Invalid integer amount '{}': {}", raw, e))?;

    if !value.is_integer() {
        return Err(anyhow!("Amount '{}' is not an integer", raw));
    }
    if value < BigDecimal::zero() {
        return Err(anyhow!("Amount '{}' is negative", raw));
    }

    Ok(value)
}

/// Converts a raw integer amount into token units: `raw / 10^decimals`.
///
/// Shifting the decimal exponent keeps every digit, so the result is exact.
pub fn convert_token_to_decimal(raw: &BigDecimal, decimals: u8) -> BigDecimal {
    if decimals == 0 {
        return raw.clone();
    }
    let (digits, scale) = raw.as_bigint_and_exponent();
    BigDecimal::new(digits, scale + decimals as i64)
}

/// Inverse of [`convert_token_to_decimal`], rounded to a whole raw unit.
pub fn convert_decimal_to_raw(amount: &BigDecimal, decimals: u8) -> BigDecimal {
    let (digits, scale) = amount.as_bigint_and_exponent();
    BigDecimal::new(digits, scale - decimals as i64).round(0)
}

/// `numerator / denominator`, or zero when the denominator is zero.
pub fn safe_div(numerator: &BigDecimal, denominator: &BigDecimal) -> BigDecimal {
    if denominator.is_zero() {
        return BigDecimal::zero();
    }
    (numerator / denominator).round(DECIMAL_SCALE)
}

/// Rounds a derived value (a product of prices) to [`DECIMAL_SCALE`].
pub fn round_price(value: BigDecimal) -> BigDecimal {
    value.round(DECIMAL_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_convert_token_to_decimal() {
        let raw = dec("1500000");
        assert_eq!(convert_token_to_decimal(&raw, 6), dec("1.5"));
        assert_eq!(convert_token_to_decimal(&raw, 0), dec("1500000"));
        assert_eq!(
            convert_token_to_decimal(&dec("1"), 18),
            dec("0.000000000000000001")
        );
    }

    #[test]
    fn test_round_trip_recovers_raw_amount() {
        let raws = [
            "0",
            "1",
            "999",
            "123456789012345678901234567890",
            "115792089237316195423570985008687907853269984665640564039457584007913129639935",
        ];

        for decimals in [0u8, 6, 18] {
            for raw in raws {
                let raw = dec(raw);
                let converted = convert_token_to_decimal(&raw, decimals);
                let back = &converted * exponent_to_big_decimal(decimals);
                assert_eq!(back.round(0), raw, "decimals={}", decimals);
                assert_eq!(convert_decimal_to_raw(&converted, decimals), raw);
            }
        }
    }

    #[test]
    fn test_exponent_to_big_decimal() {
        assert_eq!(exponent_to_big_decimal(0), dec("1"));
        assert_eq!(exponent_to_big_decimal(6), dec("1000000"));
        assert_eq!(exponent_to_big_decimal(18), dec("1000000000000000000"));
    }

    #[test]
    fn test_parse_raw_amount_rejects_non_integers() {
        assert_eq!(parse_raw_amount("42").unwrap(), dec("42"));
        assert!(parse_raw_amount("4.2").is_err());
        assert!(parse_raw_amount("-1").is_err());
        assert!(parse_raw_amount("0xff").is_err());
        assert!(parse_raw_amount("").is_err());
    }

    #[test]
    fn test_safe_div_short_circuits_zero() {
        assert_eq!(safe_div(&dec("10"), &BigDecimal::zero()), BigDecimal::zero());
        assert_eq!(safe_div(&dec("1000"), &dec("2000")), dec("0.5"));
        assert_eq!(
            safe_div(&dec("1"), &dec("3")),
            dec("0.33333333333333333333")
        );
    }
}
