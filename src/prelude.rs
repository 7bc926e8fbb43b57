//! Vouchers prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    amounts::{AmountError, parse_amount, round_to_minor},
    checkout::{AppliedVoucher, ApplyOutcome, OrderContext, RejectReason, VoucherSlot, apply_voucher},
    codes::VoucherCode,
    discounts::{DiscountError, VoucherDiscount, calculate_discount},
    eligibility::{Eligibility, IneligibleReason, evaluate_eligibility},
    fixtures::{CatalogFixture, FixtureError, SavedVoucherFixture},
    status::{VoucherStatus, derive_status},
    validation::{ScopeKind, ValidationError, VoucherInput},
    vouchers::{
        DiscountKind, DiscountRule, InvariantViolation, ValidityWindow, Voucher, VoucherScope,
        VoucherUsage,
    },
    wallet::{SavedVoucher, Wallet, WalletBucket, classify},
};
