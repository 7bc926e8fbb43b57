//! Vouchers

pub mod codes;
mod errors;
pub mod records;
pub mod repositories;
pub mod responses;
pub mod service;

pub use errors::{CatalogServiceError, RepositoryError};
pub use service::{CatalogService, VoucherCatalogService};
