//! Voucher Status

use std::fmt;

use jiff::{Timestamp, civil::Date, tz::TimeZone};
use serde::Serialize;

use crate::vouchers::Voucher;

/// Lifecycle state of a voucher at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VoucherStatus {
    /// Switched off by an administrator.
    Disabled,

    /// Validity window has not started.
    Upcoming,

    /// Validity window has ended.
    Expired,

    /// Global usage limit reached.
    Exhausted,

    /// Usable.
    Active,
}

impl VoucherStatus {
    /// Stable identifier for display and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Upcoming => "upcoming",
            Self::Expired => "expired",
            Self::Exhausted => "exhausted",
            Self::Active => "active",
        }
    }
}

impl fmt::Display for VoucherStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the status of `voucher` at `now`.
///
/// Rules are checked in order and the first match wins: disabled, upcoming,
/// expired, exhausted, otherwise active. Validity days are compared against
/// the UTC calendar date of `now`, both ends inclusive.
pub fn derive_status(voucher: &Voucher, now: Timestamp) -> VoucherStatus {
    let today = utc_date(now);

    if !voucher.is_active {
        VoucherStatus::Disabled
    } else if today < voucher.validity.valid_from() {
        VoucherStatus::Upcoming
    } else if today > voucher.validity.valid_until() {
        VoucherStatus::Expired
    } else if voucher.is_exhausted() {
        VoucherStatus::Exhausted
    } else {
        VoucherStatus::Active
    }
}

fn utc_date(now: Timestamp) -> Date {
    now.to_zoned(TimeZone::UTC).date()
}
