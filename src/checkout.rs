//! Checkout
//!
//! Applying a voucher code to a cart: look the code up, check eligibility,
//! work out the discount and the new order total. Nothing here records a
//! redemption; counters only move when the order is placed.

use std::fmt;

use jiff::Timestamp;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::Serialize;

use crate::{
    codes::VoucherCode,
    discounts::{DiscountError, VoucherDiscount, calculate_discount},
    eligibility::{Eligibility, IneligibleReason, evaluate_eligibility},
    vouchers::{Voucher, VoucherUsage},
};

/// The cart amounts a voucher is applied against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderContext<'a> {
    /// Merchandise subtotal.
    pub subtotal: Money<'a, Currency>,

    /// Shipping fee charged on top of the subtotal.
    pub shipping_fee: Money<'a, Currency>,
}

impl<'a> OrderContext<'a> {
    /// Order total with `discount` taken off the matching component.
    ///
    /// Neither component goes below zero.
    pub fn total_with(&self, discount: Option<&VoucherDiscount<'a>>) -> Money<'a, Currency> {
        let subtotal = *self.subtotal.amount();
        let shipping = *self.shipping_fee.amount();

        let total = match discount {
            None => subtotal + shipping,
            Some(VoucherDiscount::Subtotal(amount)) => {
                (subtotal - *amount.amount()).max(Decimal::ZERO) + shipping
            }
            Some(VoucherDiscount::Shipping(amount)) => {
                subtotal + (shipping - *amount.amount()).max(Decimal::ZERO)
            }
        };

        Money::from_decimal(total, self.subtotal.currency())
    }
}

/// Why an attempt to apply a code was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// No voucher has this code.
    UnknownCode,

    /// The voucher is disabled, not started, expired or exhausted.
    NotActive,

    /// The subtotal is under the voucher's minimum.
    BelowMinOrder,

    /// The user has no uses left.
    PerUserLimitReached,
}

impl From<IneligibleReason> for RejectReason {
    fn from(reason: IneligibleReason) -> Self {
        match reason {
            IneligibleReason::NotActive => Self::NotActive,
            IneligibleReason::BelowMinOrder => Self::BelowMinOrder,
            IneligibleReason::PerUserLimitReached => Self::PerUserLimitReached,
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCode => f.write_str("voucher code not found"),
            Self::NotActive => fmt::Display::fmt(&IneligibleReason::NotActive, f),
            Self::BelowMinOrder => fmt::Display::fmt(&IneligibleReason::BelowMinOrder, f),
            Self::PerUserLimitReached => {
                fmt::Display::fmt(&IneligibleReason::PerUserLimitReached, f)
            }
        }
    }
}

/// A voucher successfully applied to a cart.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedVoucher<'a> {
    /// Code of the applied voucher.
    pub code: VoucherCode,

    /// The reduction granted.
    pub discount: VoucherDiscount<'a>,

    /// Order total after the reduction, shipping included.
    pub new_total: Money<'a, Currency>,
}

/// Terminal state of one attempt to apply a code.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome<'a> {
    /// The voucher applies.
    Applied(AppliedVoucher<'a>),

    /// The voucher does not apply.
    Rejected(RejectReason),
}

/// Run an application attempt for an already looked-up voucher.
///
/// `voucher` is `None` when the code did not resolve.
///
/// # Errors
///
/// Returns [`DiscountError`] if the discount cannot be computed.
pub fn apply_voucher<'a>(
    voucher: Option<&Voucher>,
    usage: Option<&VoucherUsage>,
    order: &OrderContext<'a>,
    now: Timestamp,
) -> Result<ApplyOutcome<'a>, DiscountError> {
    let Some(voucher) = voucher else {
        return Ok(ApplyOutcome::Rejected(RejectReason::UnknownCode));
    };

    if let Eligibility::Ineligible(reason) =
        evaluate_eligibility(voucher, now, &order.subtotal, usage)
    {
        return Ok(ApplyOutcome::Rejected(reason.into()));
    }

    let discount = calculate_discount(voucher, &order.subtotal)?;

    Ok(ApplyOutcome::Applied(AppliedVoucher {
        code: voucher.code.clone(),
        new_total: order.total_with(Some(&discount)),
        discount,
    }))
}

/// The single voucher slot of a cart.
///
/// Vouchers do not stack: a newly applied voucher replaces the previous one.
/// A rejected attempt leaves the slot as it was.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoucherSlot<'a> {
    applied: Option<AppliedVoucher<'a>>,
}

impl<'a> VoucherSlot<'a> {
    /// An empty slot.
    pub const fn empty() -> Self {
        Self { applied: None }
    }

    /// Record the outcome of an attempt, returning the voucher it displaced.
    pub fn record(&mut self, outcome: &ApplyOutcome<'a>) -> Option<AppliedVoucher<'a>> {
        match outcome {
            ApplyOutcome::Applied(applied) => self.applied.replace(applied.clone()),
            ApplyOutcome::Rejected(_) => None,
        }
    }

    /// The currently applied voucher.
    pub const fn applied(&self) -> Option<&AppliedVoucher<'a>> {
        self.applied.as_ref()
    }

    /// Remove the applied voucher.
    pub fn clear(&mut self) -> Option<AppliedVoucher<'a>> {
        self.applied.take()
    }
}
