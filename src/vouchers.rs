//! Vouchers

use std::fmt;

use jiff::{Timestamp, civil::Date};
use rust_decimal::Decimal;
use serde::Serialize;
use smallvec::SmallVec;

use crate::codes::VoucherCode;

/// Who a voucher is offered by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "scope", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum VoucherScope {
    /// Usable across the whole platform.
    Platform,

    /// Offered by a single store.
    Store {
        /// Owning store identifier, when known.
        owner_store_id: Option<String>,

        /// Owning store display name, when known.
        owner_store_name: Option<String>,
    },
}

/// Calculation strategy, without its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscountKind {
    /// Percentage of the order subtotal.
    Percent,

    /// Flat amount off the order subtotal.
    Fixed,

    /// Flat amount off the shipping fee.
    FreeShipping,
}

impl DiscountKind {
    /// Stable identifier used in inputs and storage.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Percent => "percent",
            Self::Fixed => "fixed",
            Self::FreeShipping => "freeship",
        }
    }
}

impl fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discount kind together with the values that only make sense for it.
///
/// A cap can only be attached to a percentage discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "discountKind", rename_all_fields = "camelCase")]
pub enum DiscountRule {
    /// `percent`% of the subtotal, optionally capped at `max_discount`.
    #[serde(rename = "percent")]
    Percent {
        /// Percentage in `(0, 100]`.
        #[serde(rename = "discountValue")]
        percent: Decimal,

        /// Upper bound on the discount amount.
        max_discount: Option<Decimal>,
    },

    /// Flat reduction of the merchandise subtotal.
    #[serde(rename = "fixed")]
    Fixed {
        /// Amount taken off.
        #[serde(rename = "discountValue")]
        amount: Decimal,
    },

    /// Shipping fee waived up to `amount`.
    #[serde(rename = "freeship")]
    FreeShipping {
        /// Largest shipping fee covered.
        #[serde(rename = "discountValue")]
        amount: Decimal,
    },
}

impl DiscountRule {
    /// The kind of this rule.
    pub const fn kind(&self) -> DiscountKind {
        match self {
            Self::Percent { .. } => DiscountKind::Percent,
            Self::Fixed { .. } => DiscountKind::Fixed,
            Self::FreeShipping { .. } => DiscountKind::FreeShipping,
        }
    }

    /// The authored discount value (percentage or amount).
    pub const fn value(&self) -> Decimal {
        match self {
            Self::Percent { percent, .. } => *percent,
            Self::Fixed { amount } | Self::FreeShipping { amount } => *amount,
        }
    }

    /// The percentage cap, if any.
    pub const fn max_discount(&self) -> Option<Decimal> {
        match self {
            Self::Percent { max_discount, .. } => *max_discount,
            Self::Fixed { .. } | Self::FreeShipping { .. } => None,
        }
    }
}

/// Inclusive range of calendar days during which a voucher may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidityWindow {
    valid_from: Date,
    valid_until: Date,
}

impl ValidityWindow {
    /// Create a window, or `None` unless `valid_until` is after `valid_from`.
    pub fn new(valid_from: Date, valid_until: Date) -> Option<Self> {
        (valid_until > valid_from).then_some(Self {
            valid_from,
            valid_until,
        })
    }

    /// First valid day.
    pub const fn valid_from(&self) -> Date {
        self.valid_from
    }

    /// Last valid day.
    pub const fn valid_until(&self) -> Date {
        self.valid_until
    }
}

/// A promotional voucher as authored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Voucher {
    /// Redemption code, unique across the catalog.
    pub code: VoucherCode,

    /// Display label.
    pub name: String,

    /// Free text shown to customers.
    pub description: String,

    /// Platform-wide or store-specific.
    #[serde(flatten)]
    pub scope: VoucherScope,

    /// Calculation strategy and its parameters.
    #[serde(flatten)]
    pub discount: DiscountRule,

    /// Smallest subtotal the voucher applies to.
    pub min_order_amount: Decimal,

    /// Days the voucher can be used on.
    #[serde(flatten)]
    pub validity: ValidityWindow,

    /// Global redemption cap; `None` is unlimited.
    pub usage_limit: Option<u32>,

    /// Redemptions allowed per user.
    pub per_user_limit: u32,

    /// Global redemption counter.
    pub times_used: u32,

    /// Administrative kill switch.
    pub is_active: bool,
}

impl Voucher {
    /// Remaining global redemptions, `None` when unlimited.
    pub fn remaining_uses(&self) -> Option<u32> {
        self.usage_limit
            .map(|limit| limit.saturating_sub(self.times_used))
    }

    /// Whether the global cap has been reached.
    pub fn is_exhausted(&self) -> bool {
        self.usage_limit
            .is_some_and(|limit| self.times_used >= limit)
    }

    /// Invariant breaches on this record.
    ///
    /// Validation prevents these from being authored, so any hit here means
    /// the stored data was corrupted upstream.
    pub fn invariant_violations(&self) -> SmallVec<[InvariantViolation; 2]> {
        let mut violations = SmallVec::new();

        if let Some(usage_limit) = self.usage_limit
            && self.times_used > usage_limit
        {
            violations.push(InvariantViolation::UsageLimitExceeded {
                times_used: self.times_used,
                usage_limit,
            });
        }

        if let DiscountRule::Percent { percent, .. } = self.discount
            && (percent <= Decimal::ZERO || percent > Decimal::ONE_HUNDRED)
        {
            violations.push(InvariantViolation::PercentOutOfRange { percent });
        }

        if self.per_user_limit == 0 {
            violations.push(InvariantViolation::ZeroPerUserLimit);
        }

        violations
    }
}

/// A user's history with one voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherUsage {
    /// Successful redemptions by this user.
    pub used_count: u32,

    /// When the user saved or first used the voucher.
    pub saved_at: Timestamp,
}

impl VoucherUsage {
    /// A freshly saved voucher.
    pub const fn saved(saved_at: Timestamp) -> Self {
        Self {
            used_count: 0,
            saved_at,
        }
    }

    /// Invariant breaches against the voucher's per-user limit.
    pub fn invariant_violation(&self, voucher: &Voucher) -> Option<InvariantViolation> {
        (self.used_count > voucher.per_user_limit).then_some(
            InvariantViolation::PerUserLimitExceeded {
                used_count: self.used_count,
                per_user_limit: voucher.per_user_limit,
            },
        )
    }
}

/// A broken data invariant found at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantViolation {
    /// `times_used` is above `usage_limit`.
    UsageLimitExceeded {
        /// Recorded redemptions.
        times_used: u32,

        /// Configured cap.
        usage_limit: u32,
    },

    /// A user has redeemed more often than allowed.
    PerUserLimitExceeded {
        /// Recorded redemptions for the user.
        used_count: u32,

        /// Configured per-user cap.
        per_user_limit: u32,
    },

    /// A percentage outside `(0, 100]`.
    PercentOutOfRange {
        /// Stored percentage.
        percent: Decimal,
    },

    /// A per-user limit of zero.
    ZeroPerUserLimit,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UsageLimitExceeded {
                times_used,
                usage_limit,
            } => write!(f, "times used {times_used} exceeds usage limit {usage_limit}"),
            Self::PerUserLimitExceeded {
                used_count,
                per_user_limit,
            } => write!(
                f,
                "used count {used_count} exceeds per-user limit {per_user_limit}"
            ),
            Self::PercentOutOfRange { percent } => {
                write!(f, "percentage {percent} is outside (0, 100]")
            }
            Self::ZeroPerUserLimit => f.write_str("per-user limit is zero"),
        }
    }
}


#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use rust_decimal_macros::dec;

    use super::{test_support::*, *};

    #[test]
    fn validity_window_requires_until_after_from() {
        assert!(ValidityWindow::new(date(2024, 11, 1), date(2024, 11, 2)).is_some());
        assert!(ValidityWindow::new(date(2024, 11, 1), date(2024, 11, 1)).is_none());
        assert!(ValidityWindow::new(date(2024, 11, 2), date(2024, 11, 1)).is_none());
    }

    #[test]
    fn rule_accessors_report_kind_value_and_cap() {
        let rule = percent(dec!(15), Some(dec!(50000)));

        assert_eq!(rule.kind(), DiscountKind::Percent);
        assert_eq!(rule.value(), dec!(15));
        assert_eq!(rule.max_discount(), Some(dec!(50000)));

        let rule = DiscountRule::FreeShipping {
            amount: dec!(30000),
        };

        assert_eq!(rule.kind().as_str(), "freeship");
        assert_eq!(rule.max_discount(), None);
    }

    #[test]
    fn remaining_uses_and_exhaustion() {
        let mut v = voucher("LIMITED", fixed(dec!(1000)));

        assert_eq!(v.remaining_uses(), None);
        assert!(!v.is_exhausted());

        v.usage_limit = Some(3);
        v.times_used = 3;

        assert_eq!(v.remaining_uses(), Some(0));
        assert!(v.is_exhausted());
    }

    #[test]
    fn clean_voucher_has_no_violations() {
        assert!(voucher("OK", ten_percent()).invariant_violations().is_empty());
    }

    #[test]
    fn over_redeemed_voucher_is_reported() {
        let mut v = voucher("OVER", fixed(dec!(1000)));

        v.usage_limit = Some(10);
        v.times_used = 11;

        assert_eq!(
            v.invariant_violations().as_slice(),
            &[InvariantViolation::UsageLimitExceeded {
                times_used: 11,
                usage_limit: 10
            }]
        );
    }

    #[test]
    fn usage_above_per_user_limit_is_reported() {
        let v = voucher("ONCE", fixed(dec!(1000)));
        let usage = VoucherUsage {
            used_count: 2,
            saved_at: Timestamp::UNIX_EPOCH,
        };

        assert_eq!(
            usage.invariant_violation(&v),
            Some(InvariantViolation::PerUserLimitExceeded {
                used_count: 2,
                per_user_limit: 1
            })
        );
        assert_eq!(VoucherUsage::saved(Timestamp::UNIX_EPOCH).invariant_violation(&v), None);
    }

    #[test]
    fn voucher_serializes_flat_camel_case() -> testresult::TestResult {
        let v = voucher("SALE", percent(dec!(10), Some(dec!(100000))));
        let yaml = serde_norway::to_string(&v)?;

        assert!(yaml.contains("discountKind: percent"), "{yaml}");
        assert!(yaml.contains("maxDiscount:"), "{yaml}");
        assert!(yaml.contains("scope: platform"), "{yaml}");
        assert!(yaml.contains("validUntil:") && yaml.contains("2024-11-30"), "{yaml}");

        Ok(())
    }
}
