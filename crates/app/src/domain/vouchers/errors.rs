//! Voucher storage and catalog errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;
use vouchers::validation::ValidationError;

use crate::domain::orders::OrderError;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("voucher not found")]
    NotFound,

    #[error("voucher code already exists")]
    AlreadyExists,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("usage limit {usage_limit} is below the {times_used} redemptions already recorded")]
    UsageLimitBelowTimesUsed { usage_limit: u32, times_used: u32 },

    #[error("per-user limit {per_user_limit} is below a user's {used_count} redemptions")]
    PerUserLimitBelowUsedCount { per_user_limit: u32, used_count: u32 },

    #[error("voucher usage limit reached")]
    UsageLimitReached,

    #[error("per-user limit reached")]
    PerUserLimitReached,

    #[error("order placement failed")]
    Order(#[source] OrderError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for RepositoryError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}

impl From<OrderError> for RepositoryError {
    fn from(error: OrderError) -> Self {
        Self::Order(error)
    }
}

#[derive(Debug, Error)]
pub enum CatalogServiceError {
    #[error("invalid voucher: {0}")]
    Validation(#[from] ValidationError),

    #[error("voucher code already exists")]
    DuplicateCode,

    #[error("voucher not found")]
    NotFound,

    #[error("usage limit {usage_limit} is below the {times_used} redemptions already recorded")]
    UsageLimitBelowTimesUsed { usage_limit: u32, times_used: u32 },

    #[error("per-user limit {per_user_limit} is below a user's {used_count} redemptions")]
    PerUserLimitBelowUsedCount { per_user_limit: u32, used_count: u32 },

    #[error("could not find an unused voucher code")]
    CodeSpaceExhausted,

    #[error("storage error")]
    Storage(#[source] RepositoryError),
}

impl From<RepositoryError> for CatalogServiceError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::AlreadyExists => Self::DuplicateCode,
            RepositoryError::UsageLimitBelowTimesUsed {
                usage_limit,
                times_used,
            } => Self::UsageLimitBelowTimesUsed {
                usage_limit,
                times_used,
            },
            RepositoryError::PerUserLimitBelowUsedCount {
                per_user_limit,
                used_count,
            } => Self::PerUserLimitBelowUsedCount {
                per_user_limit,
                used_count,
            },
            other => Self::Storage(other),
        }
    }
}
