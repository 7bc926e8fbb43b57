//! Discounts

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    amounts::money,
    vouchers::{DiscountRule, Voucher},
};

/// Errors specific to discount calculations.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum DiscountError {
    /// Decimal arithmetic went out of range.
    #[error("discount calculation overflowed")]
    Overflow,
}

/// The reduction a voucher grants, and which part of the order it reduces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoucherDiscount<'a> {
    /// Taken off the merchandise subtotal.
    Subtotal(Money<'a, Currency>),

    /// Taken off the shipping fee.
    Shipping(Money<'a, Currency>),
}

impl<'a> VoucherDiscount<'a> {
    /// The discount amount regardless of target.
    pub const fn amount(&self) -> &Money<'a, Currency> {
        match self {
            Self::Subtotal(amount) | Self::Shipping(amount) => amount,
        }
    }
}

/// Calculate the discount `voucher` grants on `subtotal`.
///
/// Callers must already have established eligibility. Percentage discounts
/// are capped first and then rounded half-up to the currency's minor unit.
///
/// # Errors
///
/// Returns [`DiscountError::Overflow`] if the percentage calculation does
/// not fit in a [`Decimal`].
pub fn calculate_discount<'a>(
    voucher: &Voucher,
    subtotal: &Money<'a, Currency>,
) -> Result<VoucherDiscount<'a>, DiscountError> {
    let currency = subtotal.currency();

    match voucher.discount {
        DiscountRule::Percent {
            percent,
            max_discount,
        } => {
            let raw = percent_of(*subtotal.amount(), percent)?;
            let capped = max_discount.map_or(raw, |cap| raw.min(cap));

            Ok(VoucherDiscount::Subtotal(money(capped, currency)))
        }
        DiscountRule::Fixed { amount } => Ok(VoucherDiscount::Subtotal(money(amount, currency))),
        DiscountRule::FreeShipping { amount } => {
            Ok(VoucherDiscount::Shipping(money(amount, currency)))
        }
    }
}

fn percent_of(amount: Decimal, percent: Decimal) -> Result<Decimal, DiscountError> {
    amount
        .checked_mul(percent)
        .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED))
        .map(|raw| raw.max(Decimal::ZERO))
        .ok_or(DiscountError::Overflow)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use rusty_money::iso::{GBP, VND};
    use testresult::TestResult;

    use crate::vouchers::test_support::{fixed, percent, voucher};

    use super::*;

    #[test]
    fn percent_is_capped() -> TestResult {
        let v = voucher("CAP", percent(dec!(10), Some(dec!(100000))));

        let discount = calculate_discount(&v, &Money::from_major(2_000_000, VND))?;

        assert_eq!(discount, VoucherDiscount::Subtotal(Money::from_major(100_000, VND)));

        Ok(())
    }

    #[test]
    fn percent_below_cap_is_uncapped() -> TestResult {
        let v = voucher("CAP", percent(dec!(10), Some(dec!(100000))));

        let discount = calculate_discount(&v, &Money::from_major(600_000, VND))?;

        assert_eq!(discount.amount(), &Money::from_major(60_000, VND));

        Ok(())
    }

    #[test]
    fn percent_rounds_half_up_to_minor_unit() -> TestResult {
        let v = voucher("ODD", percent(dec!(15), None));

        // 15% of 0.10 = 0.015
        let pence = calculate_discount(&v, &Money::from_decimal(dec!(0.10), GBP))?;
        // 15% of 10_001 = 1_500.15
        let dong = calculate_discount(&v, &Money::from_major(10_001, VND))?;
        // 15% of 10_003 = 1_500.45
        let dong_down = calculate_discount(&v, &Money::from_major(10_003, VND))?;
        // 15% of 10_010 = 1_501.5
        let dong_half = calculate_discount(&v, &Money::from_major(10_010, VND))?;

        assert_eq!(pence.amount().amount(), &dec!(0.02));
        assert_eq!(dong.amount().amount(), &dec!(1500));
        assert_eq!(dong_down.amount().amount(), &dec!(1500));
        assert_eq!(dong_half.amount().amount(), &dec!(1502));

        Ok(())
    }

    #[test]
    fn rounding_happens_after_capping() -> TestResult {
        let v = voucher("FRAC", percent(dec!(50), Some(dec!(0.125))));

        let discount = calculate_discount(&v, &Money::from_decimal(dec!(10), GBP))?;

        assert_eq!(discount.amount().amount(), &dec!(0.13));

        Ok(())
    }

    #[test]
    fn fixed_is_flat_and_unclamped() -> TestResult {
        let v = voucher("FLAT", fixed(dec!(50000)));

        let discount = calculate_discount(&v, &Money::from_major(20_000, VND))?;

        assert_eq!(discount, VoucherDiscount::Subtotal(Money::from_major(50_000, VND)));

        Ok(())
    }

    #[test]
    fn free_shipping_targets_shipping() -> TestResult {
        let v = voucher(
            "SHIP",
            DiscountRule::FreeShipping {
                amount: dec!(30000),
            },
        );

        let discount = calculate_discount(&v, &Money::from_major(100_000, VND))?;

        assert_eq!(discount, VoucherDiscount::Shipping(Money::from_major(30_000, VND)));

        Ok(())
    }

    #[test]
    fn overflow_is_reported() {
        let v = voucher("HUGE", percent(dec!(100), None));

        let result = calculate_discount(&v, &Money::from_decimal(Decimal::MAX, VND));

        assert_eq!(result, Err(DiscountError::Overflow));
    }
}
