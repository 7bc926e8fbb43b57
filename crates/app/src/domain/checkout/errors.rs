//! Checkout service errors.

use thiserror::Error;
use vouchers::{checkout::RejectReason, discounts::DiscountError};

use crate::domain::{orders::OrderError, vouchers::RepositoryError};

#[derive(Debug, Error)]
pub enum CheckoutServiceError {
    #[error("cart totals must not be negative")]
    InvalidTotals,

    #[error("voucher rejected: {0}")]
    VoucherRejected(RejectReason),

    #[error("discount calculation failed")]
    Discount(#[from] DiscountError),

    #[error("order placement failed")]
    Order(#[source] OrderError),

    #[error("storage error")]
    Storage(#[source] RepositoryError),
}

impl From<RepositoryError> for CheckoutServiceError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => Self::VoucherRejected(RejectReason::UnknownCode),
            RepositoryError::UsageLimitReached => Self::VoucherRejected(RejectReason::NotActive),
            RepositoryError::PerUserLimitReached => {
                Self::VoucherRejected(RejectReason::PerUserLimitReached)
            }
            RepositoryError::Order(error) => Self::Order(error),
            other => Self::Storage(other),
        }
    }
}

impl From<OrderError> for CheckoutServiceError {
    fn from(error: OrderError) -> Self {
        Self::Order(error)
    }
}
