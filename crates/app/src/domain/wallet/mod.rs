//! Wallet
//!
//! Vouchers a shopper has saved, grouped into available, used and expired tabs.

mod errors;
pub mod service;
pub mod views;

pub use errors::WalletServiceError;
pub use service::{VoucherWalletService, WalletService};
pub use views::VoucherView;
