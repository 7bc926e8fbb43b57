//! Amounts
//!
//! Monetary values are authored as decimal strings and held as [`Decimal`].
//! Anything handed back to a caller is rounded to the currency's minor unit.

use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

/// Errors parsing an authored amount.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AmountError {
    /// The input is not a decimal number.
    #[error("not a decimal amount")]
    Invalid,

    /// The input is below zero.
    #[error("amount is negative")]
    Negative,
}

/// Parse a non-negative decimal amount such as `"150000"` or `"12.50"`.
///
/// # Errors
///
/// - [`AmountError::Invalid`]: the string is empty or not a decimal.
/// - [`AmountError::Negative`]: the value is below zero.
pub fn parse_amount(raw: &str) -> Result<Decimal, AmountError> {
    let amount = raw
        .trim()
        .parse::<Decimal>()
        .map_err(|_parse| AmountError::Invalid)?;

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AmountError::Negative);
    }

    Ok(amount.normalize())
}

/// Round to the minor unit of `currency`, halves away from zero.
///
/// Amounts here are never negative, so this is round-half-up.
pub fn round_to_minor(amount: Decimal, currency: &Currency) -> Decimal {
    amount.round_dp_with_strategy(currency.exponent, RoundingStrategy::MidpointAwayFromZero)
}

/// Build a rounded [`Money`] value in `currency`.
pub fn money(amount: Decimal, currency: &Currency) -> Money<'_, Currency> {
    Money::from_decimal(round_to_minor(amount, currency), currency)
}

/// A zero amount in `currency`.
pub fn zero(currency: &Currency) -> Money<'_, Currency> {
    Money::from_decimal(Decimal::ZERO, currency)
}
