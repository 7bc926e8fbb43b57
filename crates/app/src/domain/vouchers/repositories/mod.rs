//! Voucher Repositories

use std::fmt::Debug;

use async_trait::async_trait;
use jiff::Timestamp;
use vouchers::{codes::VoucherCode, vouchers::Voucher};

use crate::domain::{
    orders::{OrderDraft, OrderPlacer},
    vouchers::{
        errors::RepositoryError,
        records::{
            CommittedRedemption, RedemptionClaim, RedemptionRecord, SavedVoucherRecord, UserId,
            VoucherRecord, VoucherUuid,
        },
    },
};

mod memory;
mod postgres;

pub use memory::InMemoryVoucherRepository;
pub use postgres::PgVoucherRepository;

/// Storage for vouchers and per-user redemption rows.
///
/// Counters only move through [`VoucherRepository::commit_redemption`].
#[async_trait]
pub trait VoucherRepository: Debug + Send + Sync {
    /// All vouchers, newest first.
    async fn list_vouchers(&self) -> Result<Vec<VoucherRecord>, RepositoryError>;

    async fn get_voucher(&self, uuid: VoucherUuid) -> Result<VoucherRecord, RepositoryError>;

    /// Look a voucher up by code, ignoring case.
    async fn find_by_code(
        &self,
        code: &VoucherCode,
    ) -> Result<Option<VoucherRecord>, RepositoryError>;

    /// Insert a voucher. Its `times_used` is stored as given.
    async fn create_voucher(
        &self,
        uuid: VoucherUuid,
        voucher: Voucher,
    ) -> Result<VoucherRecord, RepositoryError>;

    /// Replace a voucher's editable fields, keeping its redemption count.
    async fn update_voucher(
        &self,
        uuid: VoucherUuid,
        voucher: Voucher,
    ) -> Result<VoucherRecord, RepositoryError>;

    /// Flip `is_active`.
    async fn toggle_voucher(&self, uuid: VoucherUuid) -> Result<VoucherRecord, RepositoryError>;

    async fn delete_voucher(&self, uuid: VoucherUuid) -> Result<(), RepositoryError>;

    async fn get_redemption(
        &self,
        user: &UserId,
        voucher: VoucherUuid,
    ) -> Result<Option<RedemptionRecord>, RepositoryError>;

    /// Add a voucher to a user's wallet. Saving again returns the existing row.
    async fn save_voucher(
        &self,
        user: &UserId,
        voucher: VoucherUuid,
        saved_at: Timestamp,
    ) -> Result<RedemptionRecord, RepositoryError>;

    /// A user's saved vouchers, most recently saved first.
    async fn list_saved(&self, user: &UserId) -> Result<Vec<SavedVoucherRecord>, RepositoryError>;

    /// Redeem a voucher and place the order as one unit.
    ///
    /// Both counters are checked against their limits and incremented in the
    /// same critical section as `orders.place_order`. If any step fails
    /// nothing is recorded.
    async fn commit_redemption(
        &self,
        claim: &RedemptionClaim,
        orders: &dyn OrderPlacer,
        draft: &OrderDraft,
    ) -> Result<CommittedRedemption, RepositoryError>;
}
