//! App Context

use std::sync::Arc;

use rusty_money::{Findable, iso::Currency};
use sqlx::migrate::MigrateError;
use thiserror::Error;
use tracing::{info, warn};
use vouchers::fixtures::{CatalogFixture, FixtureError};

use crate::{
    config::StorageConfig,
    database::{self, Db},
    domain::{
        checkout::{CheckoutService, VoucherCheckoutService},
        orders::{LoggingOrderPlacer, OrderPlacer},
        vouchers::{
            CatalogService, VoucherCatalogService,
            repositories::{InMemoryVoucherRepository, PgVoucherRepository, VoucherRepository},
        },
        wallet::{VoucherWalletService, WalletService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to apply database migrations")]
    Migration(#[source] MigrateError),

    #[error("failed to load voucher seed")]
    Fixture(#[from] FixtureError),

    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),

    #[error("seed currency {fixture} does not match configured currency {configured}")]
    CurrencyMismatch {
        configured: &'static str,
        fixture: &'static str,
    },
}

#[derive(Clone)]
pub struct AppContext {
    pub catalog: Arc<dyn CatalogService>,
    pub wallet: Arc<dyn WalletService>,
    pub checkout: Arc<dyn CheckoutService>,
    pub repository: Arc<dyn VoucherRepository>,
    pub currency: &'static Currency,
}

impl AppContext {
    /// Wire the services over one repository.
    pub fn new(
        repository: Arc<dyn VoucherRepository>,
        orders: Arc<dyn OrderPlacer>,
        currency: &'static Currency,
    ) -> Self {
        Self {
            catalog: Arc::new(VoucherCatalogService::new(Arc::clone(&repository))),
            wallet: Arc::new(VoucherWalletService::new(Arc::clone(&repository))),
            checkout: Arc::new(VoucherCheckoutService::new(
                Arc::clone(&repository),
                orders,
                currency,
            )),
            repository,
            currency,
        }
    }

    /// Build application context from storage settings.
    ///
    /// A database URL selects `PostgreSQL`, with migrations applied on
    /// start. Otherwise vouchers live in memory, seeded from the configured
    /// fixture when one is set.
    ///
    /// # Errors
    ///
    /// Returns an error when the currency is unknown, the database cannot be
    /// reached or migrated, or the seed fixture is invalid.
    pub async fn from_config(config: &StorageConfig) -> Result<Self, AppInitError> {
        let currency = Currency::find(config.currency.trim())
            .ok_or_else(|| AppInitError::UnknownCurrency(config.currency.clone()))?;

        let Some(url) = &config.database_url else {
            let fixture = config
                .seed
                .as_ref()
                .map(|path| CatalogFixture::from_path(path))
                .transpose()?;

            return Self::in_memory(fixture.as_ref(), currency);
        };

        if config.seed.is_some() {
            warn!("ignoring voucher seed, a database is configured");
        }

        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        database::migrate(&pool)
            .await
            .map_err(AppInitError::Migration)?;

        info!(currency = currency.iso_alpha_code, "using postgres storage");

        Ok(Self::new(
            Arc::new(PgVoucherRepository::new(Db::new(pool))),
            Arc::new(LoggingOrderPlacer),
            currency,
        ))
    }

    /// Build application context over in-memory storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the fixture is invalid or priced in another currency.
    pub fn in_memory(
        fixture: Option<&CatalogFixture>,
        currency: &'static Currency,
    ) -> Result<Self, AppInitError> {
        let repository = match fixture {
            Some(fixture) => {
                let fixture_currency = fixture.currency()?;

                if fixture_currency != currency {
                    return Err(AppInitError::CurrencyMismatch {
                        configured: currency.iso_alpha_code,
                        fixture: fixture_currency.iso_alpha_code,
                    });
                }

                InMemoryVoucherRepository::from_fixture(fixture)?
            }
            None => InMemoryVoucherRepository::new(),
        };

        info!(
            currency = currency.iso_alpha_code,
            seeded = fixture.is_some(),
            "using in-memory storage"
        );

        Ok(Self::new(
            Arc::new(repository),
            Arc::new(LoggingOrderPlacer),
            currency,
        ))
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{USD, VND};
    use testresult::TestResult;

    use crate::test::TestContext;

    use super::*;

    #[tokio::test]
    async fn seeded_context_serves_the_catalog() -> TestResult {
        let ctx = TestContext::demo();

        let entries = ctx.app.catalog.list_vouchers(ctx.now).await?;

        assert_eq!(entries.len(), 6);

        Ok(())
    }

    #[test]
    fn seed_in_another_currency_is_refused() -> TestResult {
        let fixture = CatalogFixture::from_path(TestContext::DEMO_FIXTURE)?;

        let result = AppContext::in_memory(Some(&fixture), USD);

        assert!(matches!(
            result,
            Err(AppInitError::CurrencyMismatch {
                configured: "USD",
                fixture: "VND"
            })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn unknown_currency_is_refused() {
        let config = StorageConfig {
            currency: "XYZ".to_string(),
            ..StorageConfig::default()
        };

        assert!(matches!(
            AppContext::from_config(&config).await,
            Err(AppInitError::UnknownCurrency(code)) if code == "XYZ"
        ));
    }

    #[tokio::test]
    async fn config_without_database_uses_memory() -> TestResult {
        let config = StorageConfig {
            seed: Some(TestContext::DEMO_FIXTURE.into()),
            ..StorageConfig::default()
        };

        let app = AppContext::from_config(&config).await?;

        assert_eq!(app.currency, VND);
        assert_eq!(app.repository.list_vouchers().await?.len(), 6);

        Ok(())
    }
}
