//! Catalog Service

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::{Span, error, info};
use vouchers::{
    codes::VoucherCode, status::derive_status, validation::VoucherInput,
};

use crate::domain::vouchers::{
    CatalogServiceError,
    codes::random_code,
    records::{CatalogEntry, VoucherRecord, VoucherUuid},
    repositories::VoucherRepository,
};

/// Attempts made to find an unused generated code.
const MAX_CODE_ATTEMPTS: usize = 16;

#[derive(Debug, Clone)]
pub struct VoucherCatalogService {
    repository: Arc<dyn VoucherRepository>,
}

impl VoucherCatalogService {
    #[must_use]
    pub fn new(repository: Arc<dyn VoucherRepository>) -> Self {
        Self { repository }
    }
}

/// Log broken invariants on a stored record. Values are reported as stored.
pub(crate) fn audit_record(record: &VoucherRecord) {
    for violation in record.voucher.invariant_violations() {
        error!(
            voucher_uuid = %record.uuid,
            voucher_code = %record.voucher.code,
            %violation,
            "voucher invariant violated"
        );
    }
}

#[async_trait]
impl CatalogService for VoucherCatalogService {
    #[tracing::instrument(
        name = "vouchers.service.list_vouchers",
        skip(self),
        fields(voucher_count = tracing::field::Empty),
        err
    )]
    async fn list_vouchers(
        &self,
        now: Timestamp,
    ) -> Result<Vec<CatalogEntry>, CatalogServiceError> {
        let records = self.repository.list_vouchers().await?;

        Span::current().record("voucher_count", records.len());

        Ok(records
            .into_iter()
            .map(|record| {
                audit_record(&record);

                CatalogEntry {
                    status: derive_status(&record.voucher, now),
                    record,
                }
            })
            .collect())
    }

    async fn get_voucher(&self, uuid: VoucherUuid) -> Result<VoucherRecord, CatalogServiceError> {
        let record = self.repository.get_voucher(uuid).await?;

        audit_record(&record);

        Ok(record)
    }

    #[tracing::instrument(
        name = "vouchers.service.create_voucher",
        skip(self, input),
        fields(
            voucher_uuid = tracing::field::Empty,
            voucher_code = tracing::field::Empty,
            discount_kind = tracing::field::Empty
        ),
        err
    )]
    async fn create_voucher(
        &self,
        input: VoucherInput,
    ) -> Result<VoucherRecord, CatalogServiceError> {
        let voucher = input.validate()?;
        let uuid = VoucherUuid::new();

        let span = Span::current();

        span.record("voucher_uuid", tracing::field::display(uuid));
        span.record("voucher_code", tracing::field::display(&voucher.code));
        span.record(
            "discount_kind",
            tracing::field::display(voucher.discount.kind()),
        );

        let record = self.repository.create_voucher(uuid, voucher).await?;

        info!(voucher_uuid = %record.uuid, "created voucher");

        Ok(record)
    }

    #[tracing::instrument(
        name = "vouchers.service.update_voucher",
        skip(self, input),
        fields(voucher_uuid = %uuid),
        err
    )]
    async fn update_voucher(
        &self,
        uuid: VoucherUuid,
        input: VoucherInput,
    ) -> Result<VoucherRecord, CatalogServiceError> {
        let voucher = input.validate()?;

        let record = self.repository.update_voucher(uuid, voucher).await?;

        info!(voucher_uuid = %uuid, voucher_code = %record.voucher.code, "updated voucher");

        Ok(record)
    }

    #[tracing::instrument(
        name = "vouchers.service.toggle_voucher",
        skip(self),
        fields(voucher_uuid = %uuid),
        err
    )]
    async fn toggle_voucher(&self, uuid: VoucherUuid) -> Result<VoucherRecord, CatalogServiceError> {
        let record = self.repository.toggle_voucher(uuid).await?;

        info!(
            voucher_uuid = %uuid,
            is_active = record.voucher.is_active,
            "toggled voucher"
        );

        Ok(record)
    }

    #[tracing::instrument(
        name = "vouchers.service.delete_voucher",
        skip(self),
        fields(voucher_uuid = %uuid),
        err
    )]
    async fn delete_voucher(&self, uuid: VoucherUuid) -> Result<(), CatalogServiceError> {
        self.repository.delete_voucher(uuid).await?;

        info!(voucher_uuid = %uuid, "deleted voucher");

        Ok(())
    }

    #[tracing::instrument(name = "vouchers.service.generate_code", skip(self), err)]
    async fn generate_code(
        &self,
        prefix: Option<String>,
    ) -> Result<VoucherCode, CatalogServiceError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let candidate = random_code(&mut rand::thread_rng(), prefix.as_deref())?;

            if self.repository.find_by_code(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        }

        Err(CatalogServiceError::CodeSpaceExhausted)
    }
}

#[automock]
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Every voucher with its status at `now`, newest first.
    async fn list_vouchers(&self, now: Timestamp)
    -> Result<Vec<CatalogEntry>, CatalogServiceError>;

    async fn get_voucher(&self, uuid: VoucherUuid) -> Result<VoucherRecord, CatalogServiceError>;

    /// Validate `input` and store it as a new voucher with no redemptions.
    async fn create_voucher(&self, input: VoucherInput)
    -> Result<VoucherRecord, CatalogServiceError>;

    /// Validate `input` and replace the voucher's editable fields.
    async fn update_voucher(
        &self,
        uuid: VoucherUuid,
        input: VoucherInput,
    ) -> Result<VoucherRecord, CatalogServiceError>;

    /// Flip the administrative kill switch.
    async fn toggle_voucher(&self, uuid: VoucherUuid) -> Result<VoucherRecord, CatalogServiceError>;

    async fn delete_voucher(&self, uuid: VoucherUuid) -> Result<(), CatalogServiceError>;

    /// Propose a random code not used by any voucher.
    async fn generate_code(&self, prefix: Option<String>)
    -> Result<VoucherCode, CatalogServiceError>;
}
