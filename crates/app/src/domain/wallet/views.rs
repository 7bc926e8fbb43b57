//! Wallet Views

use jiff::Timestamp;
use serde::Serialize;
use vouchers::{
    status::{VoucherStatus, derive_status},
    vouchers::Voucher,
    wallet::{WalletBucket, classify},
};

use crate::domain::vouchers::records::{SavedVoucherRecord, VoucherUuid};

/// A saved voucher as shown on the wallet page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherView {
    pub uuid: VoucherUuid,
    #[serde(flatten)]
    pub voucher: Voucher,
    pub status: VoucherStatus,
    pub can_use: bool,
    pub used_count: u32,
    pub saved_at: Timestamp,
}

impl VoucherView {
    /// Project a saved voucher as of `now`.
    pub fn new(saved: SavedVoucherRecord, now: Timestamp) -> Self {
        let SavedVoucherRecord { record, usage } = saved;

        Self {
            uuid: record.uuid,
            status: derive_status(&record.voucher, now),
            can_use: classify(&record.voucher, &usage, now) == Some(WalletBucket::Available),
            used_count: usage.used_count,
            saved_at: usage.saved_at,
            voucher: record.voucher,
        }
    }
}
