//! Wallet
//!
//! Groups the vouchers a user has saved into the tabs shown on their wallet
//! page. Bucketing is pure; storage lives in the application crate.

use jiff::Timestamp;
use serde::Serialize;

use crate::{
    status::{VoucherStatus, derive_status},
    vouchers::{Voucher, VoucherUsage},
};

/// Wallet tab a saved voucher belongs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletBucket {
    /// Usable right now.
    Available,

    /// Used at least once and not usable any more.
    Used,

    /// Past its window or switched off.
    Expired,
}

/// Anything that pairs a voucher with one user's history for it.
pub trait SavedVoucher {
    /// The saved voucher.
    fn voucher(&self) -> &Voucher;

    /// The user's usage of it.
    fn usage(&self) -> &VoucherUsage;
}

impl SavedVoucher for (Voucher, VoucherUsage) {
    fn voucher(&self) -> &Voucher {
        &self.0
    }

    fn usage(&self) -> &VoucherUsage {
        &self.1
    }
}

/// Work out which wallet tab a saved voucher belongs in.
///
/// Expired wins over Used. Returns `None` for vouchers that fit no tab: those
/// not yet started, and exhausted ones the user never used.
pub fn classify(voucher: &Voucher, usage: &VoucherUsage, now: Timestamp) -> Option<WalletBucket> {
    let status = derive_status(voucher, now);

    if status == VoucherStatus::Expired || !voucher.is_active {
        Some(WalletBucket::Expired)
    } else if status == VoucherStatus::Active && usage.used_count < voucher.per_user_limit {
        Some(WalletBucket::Available)
    } else if usage.used_count > 0 {
        Some(WalletBucket::Used)
    } else {
        None
    }
}

/// A user's saved vouchers split by tab, most recently saved first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Wallet<T> {
    /// Usable vouchers.
    pub available: Vec<T>,

    /// Used-up vouchers.
    pub used: Vec<T>,

    /// Expired or disabled vouchers.
    pub expired: Vec<T>,
}

impl<T> Default for Wallet<T> {
    fn default() -> Self {
        Self {
            available: Vec::new(),
            used: Vec::new(),
            expired: Vec::new(),
        }
    }
}

impl<T: SavedVoucher> Wallet<T> {
    /// Partition `saved` into tabs as of `now`.
    pub fn partition(saved: impl IntoIterator<Item = T>, now: Timestamp) -> Self {
        let mut wallet = Self::default();

        for item in saved {
            match classify(item.voucher(), item.usage(), now) {
                Some(WalletBucket::Available) => wallet.available.push(item),
                Some(WalletBucket::Used) => wallet.used.push(item),
                Some(WalletBucket::Expired) => wallet.expired.push(item),
                None => {}
            }
        }

        for bucket in [&mut wallet.available, &mut wallet.used, &mut wallet.expired] {
            bucket.sort_by(|a, b| b.usage().saved_at.cmp(&a.usage().saved_at));
        }

        wallet
    }
}

impl<T> Wallet<T> {
    /// Map every entry, keeping tab and order.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Wallet<U> {
        Wallet {
            available: self.available.into_iter().map(&mut f).collect(),
            used: self.used.into_iter().map(&mut f).collect(),
            expired: self.expired.into_iter().map(&mut f).collect(),
        }
    }

    /// Total entries across all tabs.
    pub fn len(&self) -> usize {
        self.available.len() + self.used.len() + self.expired.len()
    }

    /// Whether every tab is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use jiff::{SignedDuration, civil::date, tz::TimeZone};
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use crate::vouchers::test_support::{fixed, voucher};

    use super::*;

    fn mid_november() -> TestResult<Timestamp> {
        Ok(date(2024, 11, 15).to_zoned(TimeZone::UTC)?.timestamp())
    }

    fn usage(used_count: u32, saved_at: Timestamp) -> VoucherUsage {
        VoucherUsage {
            used_count,
            saved_at,
        }
    }

    #[test]
    fn unused_active_voucher_is_available() -> TestResult {
        let now = mid_november()?;
        let v = voucher("NEW", fixed(dec!(1000)));

        assert_eq!(
            classify(&v, &usage(0, now), now),
            Some(WalletBucket::Available)
        );

        Ok(())
    }

    #[test]
    fn exhausted_personal_allowance_is_used() -> TestResult {
        let now = mid_november()?;
        let v = voucher("ONCE", fixed(dec!(1000)));

        assert_eq!(classify(&v, &usage(1, now), now), Some(WalletBucket::Used));

        Ok(())
    }

    #[test]
    fn expired_takes_priority_over_used() -> TestResult {
        let now = date(2024, 12, 5).to_zoned(TimeZone::UTC)?.timestamp();
        let v = voucher("OLD", fixed(dec!(1000)));

        assert_eq!(classify(&v, &usage(1, now), now), Some(WalletBucket::Expired));

        Ok(())
    }

    #[test]
    fn disabled_voucher_is_expired() -> TestResult {
        let now = mid_november()?;
        let mut v = voucher("OFF", fixed(dec!(1000)));
        v.is_active = false;

        assert_eq!(classify(&v, &usage(0, now), now), Some(WalletBucket::Expired));

        Ok(())
    }

    #[test]
    fn upcoming_and_unused_exhausted_are_omitted() -> TestResult {
        let now = mid_november()?;
        let early = date(2024, 10, 20).to_zoned(TimeZone::UTC)?.timestamp();

        let upcoming = voucher("SOON", fixed(dec!(1000)));

        let mut exhausted = voucher("GONE", fixed(dec!(1000)));
        exhausted.usage_limit = Some(5);
        exhausted.times_used = 5;

        assert_eq!(classify(&upcoming, &usage(0, early), early), None);
        assert_eq!(classify(&exhausted, &usage(0, now), now), None);
        assert_eq!(
            classify(&exhausted, &usage(1, now), now),
            Some(WalletBucket::Used)
        );

        Ok(())
    }

    #[test]
    fn partition_orders_most_recent_first() -> TestResult {
        let now = mid_november()?;
        let hour = SignedDuration::from_hours(1);

        let saved = vec![
            (voucher("A", fixed(dec!(1))), usage(0, now - hour * 3)),
            (voucher("B", fixed(dec!(1))), usage(0, now - hour)),
            (voucher("C", fixed(dec!(1))), usage(1, now - hour * 2)),
            (voucher("D", fixed(dec!(1))), usage(0, now - hour * 2)),
        ];

        let wallet = Wallet::partition(saved, now).map(|(v, _)| v.code.to_string());

        assert_eq!(wallet.available, vec!["B", "D", "A"]);
        assert_eq!(wallet.used, vec!["C"]);
        assert!(wallet.expired.is_empty());
        assert_eq!(wallet.len(), 4);

        Ok(())
    }
}
