//! Vouchers
//!
//! Voucher & discount engine: decides whether a promotional voucher is usable
//! right now and how much it takes off an order.

pub mod amounts;
pub mod checkout;
pub mod codes;
pub mod discounts;
pub mod eligibility;
pub mod fixtures;
pub mod prelude;
pub mod status;
pub mod validation;
pub mod vouchers;
pub mod wallet;
