//! Eligibility

use std::fmt;

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use serde::Serialize;

use crate::{
    status::{VoucherStatus, derive_status},
    vouchers::{Voucher, VoucherUsage},
};

/// Why a voucher cannot be used on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IneligibleReason {
    /// Status is anything but active.
    NotActive,

    /// Subtotal is under the voucher's minimum.
    BelowMinOrder,

    /// The user has used up their personal allowance.
    PerUserLimitReached,
}

impl fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotActive => "voucher is not active",
            Self::BelowMinOrder => "order subtotal is below the voucher minimum",
            Self::PerUserLimitReached => "voucher already used the maximum number of times",
        })
    }
}

/// Outcome of checking a voucher against an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Eligibility {
    /// The voucher may be redeemed.
    Eligible,

    /// The voucher may not be redeemed.
    Ineligible(IneligibleReason),
}

impl Eligibility {
    /// Whether this is [`Eligibility::Eligible`].
    pub const fn is_eligible(self) -> bool {
        matches!(self, Self::Eligible)
    }
}

/// Check whether `voucher` can be used on an order of `subtotal` at `now`.
///
/// `usage` is the requesting user's history with the voucher; `None` counts as
/// no prior uses. The minimum order amount is an inclusive bound.
pub fn evaluate_eligibility(
    voucher: &Voucher,
    now: Timestamp,
    subtotal: &Money<'_, Currency>,
    usage: Option<&VoucherUsage>,
) -> Eligibility {
    if derive_status(voucher, now) != VoucherStatus::Active {
        return Eligibility::Ineligible(IneligibleReason::NotActive);
    }

    if *subtotal.amount() < voucher.min_order_amount {
        return Eligibility::Ineligible(IneligibleReason::BelowMinOrder);
    }

    if usage.is_some_and(|usage| usage.used_count >= voucher.per_user_limit) {
        return Eligibility::Ineligible(IneligibleReason::PerUserLimitReached);
    }

    Eligibility::Eligible
}

#[cfg(test)]
mod tests {
    use jiff::{civil::date, tz::TimeZone};
    use rust_decimal_macros::dec;
    use rusty_money::iso::VND;
    use testresult::TestResult;

    use crate::vouchers::test_support::{fixed, voucher};

    use super::*;

    fn mid_november() -> TestResult<Timestamp> {
        Ok(date(2024, 11, 15).to_zoned(TimeZone::UTC)?.timestamp())
    }

    fn used(count: u32) -> VoucherUsage {
        VoucherUsage {
            used_count: count,
            saved_at: Timestamp::UNIX_EPOCH,
        }
    }

    #[test]
    fn eligible_when_active_and_above_minimum() -> TestResult {
        let mut v = voucher("OK", fixed(dec!(50000)));
        v.min_order_amount = dec!(100000);

        let result =
            evaluate_eligibility(&v, mid_november()?, &Money::from_major(200_000, VND), None);

        assert_eq!(result, Eligibility::Eligible);

        Ok(())
    }

    #[test]
    fn minimum_is_inclusive() -> TestResult {
        let mut v = voucher("MIN", fixed(dec!(5)));
        v.min_order_amount = dec!(100.00);

        let now = mid_november()?;
        let at_min = Money::from_decimal(dec!(100.00), VND);
        let just_below = Money::from_decimal(dec!(99.99), VND);

        assert_eq!(
            evaluate_eligibility(&v, now, &at_min, None),
            Eligibility::Eligible
        );
        assert_eq!(
            evaluate_eligibility(&v, now, &just_below, None),
            Eligibility::Ineligible(IneligibleReason::BelowMinOrder)
        );

        Ok(())
    }

    #[test]
    fn per_user_limit_reached() -> TestResult {
        let mut v = voucher("TWICE", fixed(dec!(50000)));
        v.per_user_limit = 2;

        let now = mid_november()?;
        let subtotal = Money::from_major(100_000, VND);

        assert_eq!(
            evaluate_eligibility(&v, now, &subtotal, Some(&used(1))),
            Eligibility::Eligible
        );
        assert_eq!(
            evaluate_eligibility(&v, now, &subtotal, Some(&used(2))),
            Eligibility::Ineligible(IneligibleReason::PerUserLimitReached)
        );

        Ok(())
    }

    #[test]
    fn status_is_checked_before_order_details() -> TestResult {
        let mut v = voucher("OFF", fixed(dec!(50000)));
        v.is_active = false;
        v.min_order_amount = dec!(1000000);

        let result = evaluate_eligibility(
            &v,
            mid_november()?,
            &Money::from_major(1, VND),
            Some(&used(9)),
        );

        assert_eq!(result, Eligibility::Ineligible(IneligibleReason::NotActive));

        Ok(())
    }

    #[test]
    fn exhausted_voucher_is_not_active_regardless_of_history() -> TestResult {
        let mut v = voucher("GONE", fixed(dec!(50000)));
        v.usage_limit = Some(100);
        v.times_used = 100;

        let result = evaluate_eligibility(
            &v,
            mid_november()?,
            &Money::from_major(100_000, VND),
            None,
        );

        assert_eq!(result, Eligibility::Ineligible(IneligibleReason::NotActive));

        Ok(())
    }
}
