//! In-memory Voucher Repository

use async_trait::async_trait;
use jiff::Timestamp;
use rustc_hash::FxHashMap;
use tokio::sync::Mutex;
use vouchers::{
    codes::VoucherCode,
    fixtures::{CatalogFixture, FixtureError},
    vouchers::Voucher,
};

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

use super::VoucherRepository;

#[derive(Debug, Default)]
struct State {
    vouchers: FxHashMap<VoucherUuid, VoucherRecord>,
    redemptions: FxHashMap<(UserId, VoucherUuid), RedemptionRecord>,
}

impl State {
    fn code_taken(&self, code: &VoucherCode, except: Option<VoucherUuid>) -> bool {
        self.vouchers
            .values()
            .any(|record| record.voucher.code == *code && Some(record.uuid) != except)
    }
}

/// Process-local storage guarded by a single async mutex.
#[derive(Debug, Default)]
pub struct InMemoryVoucherRepository {
    state: Mutex<State>,
}

impl InMemoryVoucherRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository holding the vouchers and saved entries of `fixture`.
    ///
    /// # Errors
    ///
    /// Returns an error if any fixture entry is invalid.
    pub fn from_fixture(fixture: &CatalogFixture) -> Result<Self, FixtureError> {
        let now = Timestamp::now();
        let mut state = State::default();
        let mut keys = FxHashMap::default();

        for (key, voucher) in fixture.vouchers()? {
            let uuid = VoucherUuid::new();

            keys.insert(key, uuid);
            state.vouchers.insert(
                uuid,
                VoucherRecord {
                    uuid,
                    voucher,
                    created_at: now,
                    updated_at: now,
                },
            );
        }

        for (entry, saved) in fixture.saved()?.into_iter().zip(&fixture.saved) {
            let uuid = *keys
                .get(&saved.voucher)
                .ok_or_else(|| FixtureError::UnknownVoucher(saved.voucher.clone()))?;

            let user = UserId::new(entry.user);

            state.redemptions.insert(
                (user.clone(), uuid),
                RedemptionRecord {
                    user,
                    voucher_uuid: uuid,
                    used_count: entry.usage.used_count,
                    saved_at: entry.usage.saved_at,
                },
            );
        }

        Ok(Self {
            state: Mutex::new(state),
        })
    }
}

#[async_trait]
impl VoucherRepository for InMemoryVoucherRepository {
    async fn list_vouchers(&self) -> Result<Vec<VoucherRecord>, RepositoryError> {
        let state = self.state.lock().await;

        let mut records: Vec<VoucherRecord> = state.vouchers.values().cloned().collect();

        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.voucher.code.cmp(&b.voucher.code))
        });

        Ok(records)
    }

    async fn get_voucher(&self, uuid: VoucherUuid) -> Result<VoucherRecord, RepositoryError> {
        let state = self.state.lock().await;

        state
            .vouchers
            .get(&uuid)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn find_by_code(
        &self,
        code: &VoucherCode,
    ) -> Result<Option<VoucherRecord>, RepositoryError> {
        let state = self.state.lock().await;

        Ok(state
            .vouchers
            .values()
            .find(|record| record.voucher.code.matches(code.as_str()))
            .cloned())
    }

    async fn create_voucher(
        &self,
        uuid: VoucherUuid,
        voucher: Voucher,
    ) -> Result<VoucherRecord, RepositoryError> {
        let mut state = self.state.lock().await;

        if state.vouchers.contains_key(&uuid) || state.code_taken(&voucher.code, None) {
            return Err(RepositoryError::AlreadyExists);
        }

        let now = Timestamp::now();
        let record = VoucherRecord {
            uuid,
            voucher,
            created_at: now,
            updated_at: now,
        };

        state.vouchers.insert(uuid, record.clone());

        Ok(record)
    }

    async fn update_voucher(
        &self,
        uuid: VoucherUuid,
        voucher: Voucher,
    ) -> Result<VoucherRecord, RepositoryError> {
        let mut state = self.state.lock().await;

        if state.code_taken(&voucher.code, Some(uuid)) {
            return Err(RepositoryError::AlreadyExists);
        }

        let used_count = state
            .redemptions
            .values()
            .filter(|redemption| redemption.voucher_uuid == uuid)
            .map(|redemption| redemption.used_count)
            .max()
            .unwrap_or_default();

        let record = state
            .vouchers
            .get_mut(&uuid)
            .ok_or(RepositoryError::NotFound)?;

        let times_used = record.voucher.times_used;

        if let Some(usage_limit) = voucher.usage_limit
            && usage_limit < times_used
        {
            return Err(RepositoryError::UsageLimitBelowTimesUsed {
                usage_limit,
                times_used,
            });
        }

        if voucher.per_user_limit < used_count {
            return Err(RepositoryError::PerUserLimitBelowUsedCount {
                per_user_limit: voucher.per_user_limit,
                used_count,
            });
        }

        record.voucher = Voucher {
            times_used,
            ..voucher
        };
        record.updated_at = Timestamp::now();

        Ok(record.clone())
    }

    async fn toggle_voucher(&self, uuid: VoucherUuid) -> Result<VoucherRecord, RepositoryError> {
        let mut state = self.state.lock().await;

        let record = state
            .vouchers
            .get_mut(&uuid)
            .ok_or(RepositoryError::NotFound)?;

        record.voucher.is_active = !record.voucher.is_active;
        record.updated_at = Timestamp::now();

        Ok(record.clone())
    }

    async fn delete_voucher(&self, uuid: VoucherUuid) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;

        state
            .vouchers
            .remove(&uuid)
            .ok_or(RepositoryError::NotFound)?;

        state
            .redemptions
            .retain(|(_, voucher), _| *voucher != uuid);

        Ok(())
    }

    async fn get_redemption(
        &self,
        user: &UserId,
        voucher: VoucherUuid,
    ) -> Result<Option<RedemptionRecord>, RepositoryError> {
        let state = self.state.lock().await;

        Ok(state.redemptions.get(&(user.clone(), voucher)).cloned())
    }

    async fn save_voucher(
        &self,
        user: &UserId,
        voucher: VoucherUuid,
        saved_at: Timestamp,
    ) -> Result<RedemptionRecord, RepositoryError> {
        let mut state = self.state.lock().await;

        if !state.vouchers.contains_key(&voucher) {
            return Err(RepositoryError::InvalidReference);
        }

        let redemption = state
            .redemptions
            .entry((user.clone(), voucher))
            .or_insert_with(|| RedemptionRecord {
                user: user.clone(),
                voucher_uuid: voucher,
                used_count: 0,
                saved_at,
            });

        Ok(redemption.clone())
    }

    async fn list_saved(&self, user: &UserId) -> Result<Vec<SavedVoucherRecord>, RepositoryError> {
        let state = self.state.lock().await;

        let mut saved: Vec<SavedVoucherRecord> = state
            .redemptions
            .values()
            .filter(|redemption| redemption.user == *user)
            .filter_map(|redemption| {
                state
                    .vouchers
                    .get(&redemption.voucher_uuid)
                    .map(|record| SavedVoucherRecord {
                        record: record.clone(),
                        usage: redemption.usage(),
                    })
            })
            .collect();

        saved.sort_by(|a, b| b.usage.saved_at.cmp(&a.usage.saved_at));

        Ok(saved)
    }

    async fn commit_redemption(
        &self,
        claim: &RedemptionClaim,
        orders: &dyn OrderPlacer,
        draft: &OrderDraft,
    ) -> Result<CommittedRedemption, RepositoryError> {
        let mut state = self.state.lock().await;

        let key = (claim.user.clone(), claim.voucher);

        let record = state
            .vouchers
            .get(&claim.voucher)
            .ok_or(RepositoryError::NotFound)?;

        if record.voucher.is_exhausted() {
            return Err(RepositoryError::UsageLimitReached);
        }

        let used_count = state
            .redemptions
            .get(&key)
            .map_or(0, |redemption| redemption.used_count);

        if used_count >= record.voucher.per_user_limit {
            return Err(RepositoryError::PerUserLimitReached);
        }

        // The lock stays held while the order is placed, so no other
        // redemption can slip in between the checks and the increments.
        let receipt = orders.place_order(draft).await?;

        let now = Timestamp::now();

        let record = state
            .vouchers
            .get_mut(&claim.voucher)
            .ok_or(RepositoryError::NotFound)?;

        record.voucher.times_used += 1;
        record.updated_at = now;

        let times_used = record.voucher.times_used;

        let redemption = state
            .redemptions
            .entry(key)
            .or_insert_with(|| RedemptionRecord {
                user: claim.user.clone(),
                voucher_uuid: claim.voucher,
                used_count: 0,
                saved_at: now,
            });

        redemption.used_count += 1;

        Ok(CommittedRedemption {
            receipt,
            times_used,
            used_count: redemption.used_count,
        })
    }
}
