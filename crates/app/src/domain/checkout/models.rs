//! Checkout Models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use vouchers::{
    checkout::{ApplyOutcome, RejectReason},
    codes::VoucherCode,
    discounts::VoucherDiscount,
};

use crate::{domain::orders::OrderReceipt, uuids::TypedUuid};

/// A shopper's cart. Only its identity is known to the voucher engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cart;

/// Cart UUID
pub type CartUuid = TypedUuid<Cart>;

/// Cart amounts supplied by the cart service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub subtotal: Decimal,
    #[serde(default)]
    pub shipping_fee: Decimal,
}

impl CartTotals {
    pub fn is_valid(&self) -> bool {
        !self.subtotal.is_sign_negative() && !self.shipping_fee.is_sign_negative()
    }
}

/// Which part of the order a discount reduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountTarget {
    Subtotal,
    Shipping,
}

/// Result of applying a code, as returned to the cart page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(
    tag = "status",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ApplyResponse {
    Applied {
        code: VoucherCode,
        discount_amount: Decimal,
        discount_target: DiscountTarget,
        new_total: Decimal,
    },
    Rejected {
        reason: RejectReason,
        message: String,
    },
}

impl From<&ApplyOutcome<'_>> for ApplyResponse {
    fn from(outcome: &ApplyOutcome<'_>) -> Self {
        match outcome {
            ApplyOutcome::Applied(applied) => {
                let (discount_amount, discount_target) = match applied.discount {
                    VoucherDiscount::Subtotal(amount) => {
                        (*amount.amount(), DiscountTarget::Subtotal)
                    }
                    VoucherDiscount::Shipping(amount) => {
                        (*amount.amount(), DiscountTarget::Shipping)
                    }
                };

                Self::Applied {
                    code: applied.code.clone(),
                    discount_amount,
                    discount_target,
                    new_total: *applied.new_total.amount(),
                }
            }
            ApplyOutcome::Rejected(reason) => Self::Rejected {
                reason: *reason,
                message: reason.to_string(),
            },
        }
    }
}

/// A completed checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub order: OrderReceipt,
    pub voucher_code: Option<VoucherCode>,
    pub discount: Decimal,
    pub total: Decimal,
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use rusty_money::{Money, iso::VND};
    use serde_json::json;
    use testresult::TestResult;
    use vouchers::checkout::AppliedVoucher;

    use super::*;

    #[test]
    fn applied_response_is_tagged() -> TestResult {
        let outcome = ApplyOutcome::Applied(AppliedVoucher {
            code: VoucherCode::parse("FREESHIP")?,
            discount: VoucherDiscount::Shipping(Money::from_decimal(dec!(30000), VND)),
            new_total: Money::from_decimal(dec!(200000), VND),
        });

        assert_eq!(
            serde_json::to_value(ApplyResponse::from(&outcome))?,
            json!({
                "status": "applied",
                "code": "FREESHIP",
                "discountAmount": "30000",
                "discountTarget": "shipping",
                "newTotal": "200000",
            })
        );

        Ok(())
    }

    #[test]
    fn rejected_response_carries_reason() -> TestResult {
        let outcome = ApplyOutcome::Rejected(RejectReason::BelowMinOrder);

        let value = serde_json::to_value(ApplyResponse::from(&outcome))?;

        assert_eq!(value["status"], "rejected");
        assert_eq!(value["reason"], "below_min_order");

        Ok(())
    }

    #[test]
    fn negative_totals_are_invalid() {
        assert!(
            CartTotals {
                subtotal: dec!(100),
                shipping_fee: dec!(0)
            }
            .is_valid()
        );
        assert!(
            !CartTotals {
                subtotal: dec!(-1),
                shipping_fee: dec!(0)
            }
            .is_valid()
        );
    }
}
