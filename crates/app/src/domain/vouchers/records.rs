//! Voucher Records

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use vouchers::{
    status::VoucherStatus,
    vouchers::{Voucher, VoucherUsage},
    wallet::SavedVoucher,
};

use crate::{domain::orders::OrderReceipt, uuids::TypedUuid};

/// Voucher UUID
pub type VoucherUuid = TypedUuid<VoucherRecord>;

/// Identifier of a shopper, as issued by the account system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Voucher Record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherRecord {
    pub uuid: VoucherUuid,
    #[serde(flatten)]
    pub voucher: Voucher,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A voucher record with its status at the time it was listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub record: VoucherRecord,
    pub status: VoucherStatus,
}

/// Redemption Record
///
/// One per user and voucher, created when the voucher is saved or first
/// redeemed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionRecord {
    pub user: UserId,
    pub voucher_uuid: VoucherUuid,
    pub used_count: u32,
    pub saved_at: Timestamp,
}

impl RedemptionRecord {
    pub const fn usage(&self) -> VoucherUsage {
        VoucherUsage {
            used_count: self.used_count,
            saved_at: self.saved_at,
        }
    }
}

/// A voucher joined with one user's redemption row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedVoucherRecord {
    pub record: VoucherRecord,
    pub usage: VoucherUsage,
}

impl SavedVoucher for SavedVoucherRecord {
    fn voucher(&self) -> &Voucher {
        &self.record.voucher
    }

    fn usage(&self) -> &VoucherUsage {
        &self.usage
    }
}

/// Who is redeeming which voucher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedemptionClaim {
    pub voucher: VoucherUuid,
    pub user: UserId,
}

/// Counters after a committed redemption, with the placed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedRedemption {
    pub receipt: OrderReceipt,
    pub times_used: u32,
    pub used_count: u32,
}
