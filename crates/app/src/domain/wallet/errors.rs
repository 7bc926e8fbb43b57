//! Wallet service errors.

use thiserror::Error;
use vouchers::{status::VoucherStatus, validation::ValidationError};

use crate::domain::vouchers::RepositoryError;

#[derive(Debug, Error)]
pub enum WalletServiceError {
    #[error("invalid voucher code")]
    InvalidCode(#[source] ValidationError),

    #[error("voucher code not found")]
    UnknownCode,

    #[error("voucher is {0} and cannot be saved")]
    NotSaveable(VoucherStatus),

    #[error("storage error")]
    Storage(#[from] RepositoryError),
}
