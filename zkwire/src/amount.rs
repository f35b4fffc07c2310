//! Human-readable token amounts.
//!
//! Messages shown to the L1 signer render amounts in token units with a
//! fixed, locale-independent format: at least one fraction digit, no
//! grouping separators, trailing zeros trimmed. Tokens with more than
//! eighteen decimals cannot be rendered this way and are rejected.

use alloy_primitives::U256;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Largest number of token decimals that can be rendered.
pub const MAX_FRACTION_DIGITS: u8 = 18;

/// Errors from parsing decimal amounts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    /// The input is not a decimal number.
    #[error("invalid amount '{0}'")]
    Invalid(String),
    /// The input is negative.
    #[error("amount '{0}' is negative")]
    Negative(String),
    /// The input has more fraction digits than the token supports.
    #[error("amount '{amount}' has more than {decimals} fraction digits")]
    TooPrecise {
        /// The input.
        amount: String,
        /// Token decimals.
        decimals: u8,
    },
    /// The scaled amount overflowed.
    #[error("amount '{0}' is too large")]
    Overflow(String),
    /// The token has more decimals than messages can render.
    #[error("{0} decimals exceed the supported maximum of 18")]
    UnsupportedDecimals(u8),
}

/// Renders `amount` base units of a token with `decimals` decimals.
///
/// ```
/// use alloy_primitives::U256;
/// use zkwire::amount::format_units;
///
/// assert_eq!(format_units(U256::from(1_500_000u64), 6).unwrap(), "1.5");
/// assert_eq!(format_units(U256::from(1_000_000u64), 6).unwrap(), "1.0");
/// ```
///
/// # Errors
///
/// Returns [`AmountError::UnsupportedDecimals`] above 18 decimals.
pub fn format_units(amount: U256, decimals: u8) -> Result<String, AmountError> {
    if decimals > MAX_FRACTION_DIGITS {
        return Err(AmountError::UnsupportedDecimals(decimals));
    }
    let scale = U256::from(10u8).pow(U256::from(decimals));
    let whole = amount / scale;
    let fraction = amount % scale;

    let mut digits = if decimals == 0 {
        String::new()
    } else {
        let fraction = fraction.to_string();
        format!("{fraction:0>width$}", width = usize::from(decimals))
    };
    let trimmed = digits.trim_end_matches('0');
    let fraction = if trimmed.is_empty() { "0" } else { trimmed };
    Ok(format!("{whole}.{fraction}"))
}

/// Parses a decimal string such as `"1.25"` into base units.
///
/// # Errors
///
/// Returns [`AmountError`] for malformed, negative, overly precise, or
/// overflowing input.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256, AmountError> {
    let value = Decimal::from_str(amount.trim())
        .map_err(|_| AmountError::Invalid(amount.to_string()))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AmountError::Negative(amount.to_string()));
    }
    let value = value.normalize();
    if value.scale() > u32::from(decimals) {
        return Err(AmountError::TooPrecise {
            amount: amount.to_string(),
            decimals,
        });
    }
    let mantissa = u128::try_from(value.mantissa())
        .map_err(|_| AmountError::Negative(amount.to_string()))?;
    U256::from(10u8)
        .checked_pow(U256::from(u32::from(decimals) - value.scale()))
        .and_then(|shift| U256::from(mantissa).checked_mul(shift))
        .ok_or_else(|| AmountError::Overflow(amount.to_string()))
}
