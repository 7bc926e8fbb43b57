//! Orders
//!
//! The seam to the order system. Checkout hands it a priced draft; a voucher
//! redemption only counts if the order is placed.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use vouchers::codes::VoucherCode;

use crate::{
    domain::{checkout::CartUuid, vouchers::records::UserId},
    uuids::TypedUuid,
};

/// Order UUID
pub type OrderUuid = TypedUuid<OrderReceipt>;

/// A priced order ready to be placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub cart: CartUuid,
    pub user: UserId,
    pub voucher_code: Option<VoucherCode>,
    pub currency: String,
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

/// Confirmation of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt {
    pub order: OrderUuid,
    pub total: Decimal,
    pub placed_at: Timestamp,
}

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("order rejected: {0}")]
    Rejected(String),

    #[error("order system unavailable: {0}")]
    Unavailable(String),
}

#[automock]
#[async_trait]
pub trait OrderPlacer: Send + Sync {
    /// Place `draft`, returning the receipt.
    async fn place_order(&self, draft: &OrderDraft) -> Result<OrderReceipt, OrderError>;
}

/// Accepts every order and logs it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingOrderPlacer;

#[async_trait]
impl OrderPlacer for LoggingOrderPlacer {
    async fn place_order(&self, draft: &OrderDraft) -> Result<OrderReceipt, OrderError> {
        let receipt = OrderReceipt {
            order: OrderUuid::new(),
            total: draft.total,
            placed_at: Timestamp::now(),
        };

        info!(
            order_uuid = %receipt.order,
            cart_uuid = %draft.cart,
            user_id = %draft.user,
            voucher_code = draft.voucher_code.as_ref().map(VoucherCode::as_str),
            total = %draft.total,
            currency = %draft.currency,
            "placed order"
        );

        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn logging_placer_echoes_total() -> TestResult {
        let draft = OrderDraft {
            cart: CartUuid::new(),
            user: UserId::new("alice"),
            voucher_code: None,
            currency: "VND".to_string(),
            subtotal: dec!(100000),
            shipping_fee: dec!(20000),
            discount: dec!(0),
            total: dec!(120000),
        };

        let receipt = LoggingOrderPlacer.place_order(&draft).await?;

        assert_eq!(receipt.total, dec!(120000));

        Ok(())
    }
}
