//! Wallet Service

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::{error, info};
use vouchers::{
    codes::VoucherCode,
    status::{VoucherStatus, derive_status},
    wallet::Wallet,
};

use crate::domain::{
    vouchers::{
        records::{SavedVoucherRecord, UserId},
        repositories::VoucherRepository,
        service::audit_record,
    },
    wallet::{WalletServiceError, views::VoucherView},
};

#[derive(Debug, Clone)]
pub struct VoucherWalletService {
    repository: Arc<dyn VoucherRepository>,
}

impl VoucherWalletService {
    #[must_use]
    pub fn new(repository: Arc<dyn VoucherRepository>) -> Self {
        Self { repository }
    }
}

fn audit_saved(user: &UserId, saved: &SavedVoucherRecord) {
    audit_record(&saved.record);

    if let Some(violation) = saved.usage.invariant_violation(&saved.record.voucher) {
        error!(
            user_id = %user,
            voucher_uuid = %saved.record.uuid,
            %violation,
            "redemption invariant violated"
        );
    }
}

#[async_trait]
impl WalletService for VoucherWalletService {
    #[tracing::instrument(
        name = "vouchers.service.get_wallet",
        skip(self),
        fields(user_id = %user),
        err
    )]
    async fn get_wallet(
        &self,
        user: UserId,
        now: Timestamp,
    ) -> Result<Wallet<VoucherView>, WalletServiceError> {
        let saved = self.repository.list_saved(&user).await?;

        for entry in &saved {
            audit_saved(&user, entry);
        }

        Ok(Wallet::partition(saved, now).map(|entry| VoucherView::new(entry, now)))
    }

    #[tracing::instrument(
        name = "vouchers.service.save_voucher",
        skip(self),
        fields(user_id = %user),
        err
    )]
    async fn save_voucher(
        &self,
        user: UserId,
        code: String,
        now: Timestamp,
    ) -> Result<VoucherView, WalletServiceError> {
        let code = VoucherCode::parse(&code).map_err(WalletServiceError::InvalidCode)?;

        let record = self
            .repository
            .find_by_code(&code)
            .await?
            .ok_or(WalletServiceError::UnknownCode)?;

        let status = derive_status(&record.voucher, now);

        if !matches!(status, VoucherStatus::Active | VoucherStatus::Upcoming) {
            return Err(WalletServiceError::NotSaveable(status));
        }

        let redemption = self
            .repository
            .save_voucher(&user, record.uuid, now)
            .await?;

        info!(
            user_id = %user,
            voucher_uuid = %record.uuid,
            voucher_code = %record.voucher.code,
            "saved voucher"
        );

        Ok(VoucherView::new(
            SavedVoucherRecord {
                usage: redemption.usage(),
                record,
            },
            now,
        ))
    }
}

#[automock]
#[async_trait]
pub trait WalletService: Send + Sync {
    /// The user's saved vouchers split into tabs as of `now`.
    async fn get_wallet(
        &self,
        user: UserId,
        now: Timestamp,
    ) -> Result<Wallet<VoucherView>, WalletServiceError>;

    /// Save the voucher with `code` to the user's wallet.
    ///
    /// Only active and upcoming vouchers can be saved. Saving a voucher that
    /// is already in the wallet returns it unchanged.
    async fn save_voucher(
        &self,
        user: UserId,
        code: String,
        now: Timestamp,
    ) -> Result<VoucherView, WalletServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;
    use vouchers::fixtures::CatalogFixture;

    use crate::domain::vouchers::repositories::InMemoryVoucherRepository;

    use super::*;

    const DEMO_FIXTURE: &str = concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../fixtures/vouchers/demo.yml"
    );

    fn service() -> TestResult<VoucherWalletService> {
        let fixture = CatalogFixture::from_path(DEMO_FIXTURE)?;
        let repository = InMemoryVoucherRepository::from_fixture(&fixture)?;

        Ok(VoucherWalletService::new(Arc::new(repository)))
    }

    fn codes(views: &[VoucherView]) -> Vec<&str> {
        views.iter().map(|view| view.voucher.code.as_str()).collect()
    }

    fn nov_20() -> TestResult<Timestamp> {
        Ok("2024-11-20T10:00:00Z".parse()?)
    }

    #[tokio::test]
    async fn wallet_is_split_into_tabs() -> TestResult {
        let wallet = service()?.get_wallet(UserId::new("alice"), nov_20()?).await?;

        assert_eq!(codes(&wallet.available), vec!["FREESHIP", "WELCOME10"]);
        assert_eq!(codes(&wallet.used), vec!["STORE50K"]);
        assert_eq!(codes(&wallet.expired), vec!["OCTOBER"]);
        assert!(wallet.available.iter().all(|view| view.can_use));
        assert!(wallet.used.iter().all(|view| !view.can_use));

        Ok(())
    }

    #[tokio::test]
    async fn disabled_vouchers_land_in_expired() -> TestResult {
        let wallet = service()?.get_wallet(UserId::new("bob"), nov_20()?).await?;

        assert!(wallet.available.is_empty());
        assert_eq!(codes(&wallet.used), vec!["WELCOME10"]);
        assert_eq!(codes(&wallet.expired), vec!["RETIRED"]);

        Ok(())
    }

    #[tokio::test]
    async fn unknown_user_has_an_empty_wallet() -> TestResult {
        let wallet = service()?.get_wallet(UserId::new("nobody"), nov_20()?).await?;

        assert!(wallet.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn saving_adds_to_available() -> TestResult {
        let wallet = service()?;
        let carol = UserId::new("carol");

        let view = wallet
            .save_voucher(carol.clone(), " welcome10 ".to_string(), nov_20()?)
            .await?;

        assert_eq!(view.voucher.code.as_str(), "WELCOME10");
        assert_eq!(view.used_count, 0);
        assert!(view.can_use);

        let tabs = wallet.get_wallet(carol, nov_20()?).await?;

        assert_eq!(codes(&tabs.available), vec!["WELCOME10"]);

        Ok(())
    }

    #[tokio::test]
    async fn saving_twice_keeps_the_first_save() -> TestResult {
        let wallet = service()?;
        let alice = UserId::new("alice");

        let view = wallet
            .save_voucher(alice, "XMAS24".to_string(), nov_20()?)
            .await?;

        assert_eq!(view.status, VoucherStatus::Upcoming);
        assert_eq!(view.saved_at, "2024-11-18T07:00:00Z".parse::<Timestamp>()?);

        Ok(())
    }

    #[tokio::test]
    async fn expired_and_unknown_codes_cannot_be_saved() -> TestResult {
        let wallet = service()?;
        let carol = UserId::new("carol");

        assert!(matches!(
            wallet
                .save_voucher(carol.clone(), "OCTOBER".to_string(), nov_20()?)
                .await,
            Err(WalletServiceError::NotSaveable(VoucherStatus::Expired))
        ));
        assert!(matches!(
            wallet
                .save_voucher(carol.clone(), "NOPE".to_string(), nov_20()?)
                .await,
            Err(WalletServiceError::UnknownCode)
        ));
        assert!(matches!(
            wallet.save_voucher(carol, "  ".to_string(), nov_20()?).await,
            Err(WalletServiceError::InvalidCode(_))
        ));

        Ok(())
    }
}
