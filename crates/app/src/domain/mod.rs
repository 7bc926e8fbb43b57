//! Voucher Domain Concerns

pub mod checkout;
pub mod orders;
pub mod vouchers;
pub mod wallet;
