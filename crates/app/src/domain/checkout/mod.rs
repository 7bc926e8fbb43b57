//! Checkout
//!
//! Applying a voucher code to a cart, and redeeming it when the order is placed.

mod errors;
pub mod models;
pub mod service;

pub use errors::CheckoutServiceError;
pub use models::{ApplyResponse, Cart, CartTotals, CartUuid, CheckoutReceipt, DiscountTarget};
pub use service::{CheckoutService, VoucherCheckoutService};
