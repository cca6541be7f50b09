//! Human readable token amounts.
//!
//! Raw on-chain amounts are integers in the token's smallest unit. These
//! helpers convert from and to decimal strings such as `"1.5"` for a token
//! with a given number of decimals, and are only meant to be used at the
//! boundary of the SDK.

use {
    crate::conversions::big_int_to_u256,
    alloy::primitives::{I256, Sign, U256},
    anyhow::{Context, Result, ensure},
    bigdecimal::BigDecimal,
    num::{BigInt, One, bigint::Sign as BigSign},
    std::str::FromStr,
};

/// Parses a decimal string into a raw amount with `decimals` decimals.
/// Fails if the value is negative, has more fractional digits than the token
/// supports or does not fit into 256 bits.
pub fn parse_units(value: &str, decimals: u8) -> Result<U256> {
    let decimal = BigDecimal::from_str(value.trim())
        .with_context(|| format!("invalid decimal amount {value:?}"))?;
    ensure!(
        decimal.sign() != BigSign::Minus,
        "negative amount {value:?}"
    );

    let scaled = decimal * BigDecimal::new(BigInt::one(), -i64::from(decimals));
    let (int, exponent) = scaled.normalized().as_bigint_and_exponent();
    ensure!(
        exponent <= 0,
        "amount {value:?} has more than {decimals} decimals"
    );
    // 10^78 no longer fits into 256 bits.
    let zeros = u32::try_from(exponent.unsigned_abs())
        .ok()
        .filter(|zeros| *zeros <= 78)
        .with_context(|| format!("amount {value:?} overflows 256 bits"))?;
    let int = int * BigInt::from(10u8).pow(zeros);
    big_int_to_u256(&int).with_context(|| format!("amount {value:?} overflows 256 bits"))
}

/// Formats a raw amount with `decimals` decimals, trimming trailing zeros.
pub fn format_units(amount: U256, decimals: u8) -> String {
    let unit = U256::from(10u8).pow(U256::from(decimals));
    let (int, fraction) = amount.div_rem(unit);
    if fraction.is_zero() {
        return int.to_string();
    }
    let fraction = format!(
        "{:0>width$}",
        fraction.to_string(),
        width = usize::from(decimals)
    );
    format!("{int}.{}", fraction.trim_end_matches('0'))
}

/// Formats a signed 18 decimal fraction as a percentage, for example
/// `0.0123e18` becomes `"1.23%"`.
pub fn format_percentage(fraction: I256) -> String {
    let (sign, abs) = fraction.into_sign_and_abs();
    let sign = match sign {
        Sign::Negative if !abs.is_zero() => "-",
        _ => "",
    };
    // percent = fraction * 100 / 1e18, which is the fraction with 16 decimals.
    format!("{sign}{}%", format_units(abs, 16))
}
