//! Checkout Service

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use tokio::sync::Mutex;
use tracing::{Span, info, warn};
use vouchers::{
    checkout::{ApplyOutcome, OrderContext, RejectReason, VoucherSlot, apply_voucher},
    codes::VoucherCode,
};

use crate::domain::{
    checkout::{
        CheckoutServiceError,
        models::{ApplyResponse, CartTotals, CartUuid, CheckoutReceipt},
    },
    orders::{OrderDraft, OrderPlacer},
    vouchers::{
        records::{RedemptionClaim, UserId, VoucherRecord},
        repositories::VoucherRepository,
    },
};

pub struct VoucherCheckoutService {
    repository: Arc<dyn VoucherRepository>,
    orders: Arc<dyn OrderPlacer>,
    currency: &'static Currency,
    carts: Mutex<FxHashMap<CartUuid, VoucherSlot<'static>>>,
}

impl std::fmt::Debug for VoucherCheckoutService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoucherCheckoutService")
            .field("repository", &self.repository)
            .field("currency", &self.currency.iso_alpha_code)
            .finish_non_exhaustive()
    }
}

impl VoucherCheckoutService {
    #[must_use]
    pub fn new(
        repository: Arc<dyn VoucherRepository>,
        orders: Arc<dyn OrderPlacer>,
        currency: &'static Currency,
    ) -> Self {
        Self {
            repository,
            orders,
            currency,
            carts: Mutex::new(FxHashMap::default()),
        }
    }

    /// Cart amounts as entered. Only the discount is rounded, so the
    /// min-order check sees the exact subtotal.
    fn order_context(&self, totals: CartTotals) -> OrderContext<'static> {
        OrderContext {
            subtotal: Money::from_decimal(totals.subtotal, self.currency),
            shipping_fee: Money::from_decimal(totals.shipping_fee, self.currency),
        }
    }

    /// Look `code` up and run it against `totals` for `user`.
    async fn evaluate(
        &self,
        user: &UserId,
        code: Option<VoucherCode>,
        totals: CartTotals,
        now: Timestamp,
    ) -> Result<(Option<VoucherRecord>, ApplyOutcome<'static>), CheckoutServiceError> {
        let record = match code {
            Some(code) => self.repository.find_by_code(&code).await?,
            None => None,
        };

        let usage = match &record {
            Some(record) => self
                .repository
                .get_redemption(user, record.uuid)
                .await?
                .map(|redemption| redemption.usage()),
            None => None,
        };

        let outcome = apply_voucher(
            record.as_ref().map(|record| &record.voucher),
            usage.as_ref(),
            &self.order_context(totals),
            now,
        )?;

        Ok((record, outcome))
    }

    fn draft(
        &self,
        cart: CartUuid,
        user: UserId,
        totals: CartTotals,
        voucher_code: Option<VoucherCode>,
        discount: Decimal,
        total: Decimal,
    ) -> OrderDraft {
        OrderDraft {
            cart,
            user,
            voucher_code,
            currency: self.currency.iso_alpha_code.to_string(),
            subtotal: totals.subtotal,
            shipping_fee: totals.shipping_fee,
            discount,
            total,
        }
    }
}

#[async_trait]
impl CheckoutService for VoucherCheckoutService {
    #[tracing::instrument(
        name = "vouchers.service.apply_code",
        skip(self, totals),
        fields(cart_uuid = %cart, user_id = %user, outcome = tracing::field::Empty),
        err
    )]
    async fn apply_code(
        &self,
        cart: CartUuid,
        user: UserId,
        code: String,
        totals: CartTotals,
        now: Timestamp,
    ) -> Result<ApplyResponse, CheckoutServiceError> {
        if !totals.is_valid() {
            return Err(CheckoutServiceError::InvalidTotals);
        }

        // A blank or oversized code cannot name a voucher.
        let (_, outcome) = self
            .evaluate(&user, VoucherCode::parse(&code).ok(), totals, now)
            .await?;

        let replaced = match &outcome {
            ApplyOutcome::Applied(_) => self
                .carts
                .lock()
                .await
                .entry(cart)
                .or_default()
                .record(&outcome),
            ApplyOutcome::Rejected(_) => None,
        };

        match &outcome {
            ApplyOutcome::Applied(applied) => {
                Span::current().record("outcome", "applied");

                info!(
                    voucher_code = %applied.code,
                    discount = %applied.discount.amount().amount(),
                    new_total = %applied.new_total.amount(),
                    replaced = replaced.as_ref().map(|previous| previous.code.as_str()),
                    "applied voucher"
                );
            }
            ApplyOutcome::Rejected(reason) => {
                Span::current().record("outcome", "rejected");

                warn!(%code, %reason, "rejected voucher");
            }
        }

        Ok(ApplyResponse::from(&outcome))
    }

    #[tracing::instrument(
        name = "vouchers.service.remove_code",
        skip(self),
        fields(cart_uuid = %cart)
    )]
    async fn remove_code(&self, cart: CartUuid) -> Option<VoucherCode> {
        let removed = self
            .carts
            .lock()
            .await
            .remove(&cart)
            .and_then(|mut slot| slot.clear())
            .map(|applied| applied.code);

        if let Some(code) = &removed {
            info!(voucher_code = %code, "removed voucher");
        }

        removed
    }

    #[tracing::instrument(
        name = "vouchers.service.complete_checkout",
        skip(self, totals),
        fields(
            cart_uuid = %cart,
            user_id = %user,
            voucher_code = tracing::field::Empty,
            order_uuid = tracing::field::Empty
        ),
        err
    )]
    async fn complete_checkout(
        &self,
        cart: CartUuid,
        user: UserId,
        totals: CartTotals,
        now: Timestamp,
    ) -> Result<CheckoutReceipt, CheckoutServiceError> {
        if !totals.is_valid() {
            return Err(CheckoutServiceError::InvalidTotals);
        }

        let span = Span::current();

        let applied_code = self
            .carts
            .lock()
            .await
            .get(&cart)
            .and_then(VoucherSlot::applied)
            .map(|applied| applied.code.clone());

        let Some(code) = applied_code else {
            let total = *self.order_context(totals).total_with(None).amount();
            let draft = self.draft(cart, user, totals, None, Decimal::ZERO, total);

            let order = self.orders.place_order(&draft).await?;

            span.record("order_uuid", tracing::field::display(order.order));

            info!(total = %total, "completed checkout");

            return Ok(CheckoutReceipt {
                order,
                voucher_code: None,
                discount: Decimal::ZERO,
                total,
            });
        };

        span.record("voucher_code", tracing::field::display(&code));

        // Totals or counters may have moved since the code was applied.
        let (record, outcome) = self
            .evaluate(&user, Some(code.clone()), totals, now)
            .await?;

        let (record, applied) = match (record, outcome) {
            (Some(record), ApplyOutcome::Applied(applied)) => (record, applied),
            (_, ApplyOutcome::Rejected(reason)) => {
                warn!(%reason, "applied voucher no longer qualifies");

                return Err(CheckoutServiceError::VoucherRejected(reason));
            }
            (None, ApplyOutcome::Applied(_)) => {
                return Err(CheckoutServiceError::VoucherRejected(
                    RejectReason::UnknownCode,
                ));
            }
        };

        let discount = *applied.discount.amount().amount();
        let total = *applied.new_total.amount();

        let draft = self.draft(cart, user.clone(), totals, Some(code.clone()), discount, total);

        let committed = self
            .repository
            .commit_redemption(
                &RedemptionClaim {
                    voucher: record.uuid,
                    user,
                },
                self.orders.as_ref(),
                &draft,
            )
            .await?;

        self.carts.lock().await.remove(&cart);

        span.record("order_uuid", tracing::field::display(committed.receipt.order));

        info!(
            voucher_uuid = %record.uuid,
            times_used = committed.times_used,
            used_count = committed.used_count,
            discount = %discount,
            total = %total,
            "completed checkout with voucher"
        );

        Ok(CheckoutReceipt {
            order: committed.receipt,
            voucher_code: Some(code),
            discount,
            total,
        })
    }
}

#[automock]
#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Apply `code` to the cart, replacing any voucher already applied.
    ///
    /// Nothing is redeemed until [`CheckoutService::complete_checkout`].
    async fn apply_code(
        &self,
        cart: CartUuid,
        user: UserId,
        code: String,
        totals: CartTotals,
        now: Timestamp,
    ) -> Result<ApplyResponse, CheckoutServiceError>;

    /// Remove the applied voucher, returning its code.
    async fn remove_code(&self, cart: CartUuid) -> Option<VoucherCode>;

    /// Place the order, redeeming the applied voucher with it.
    async fn complete_checkout(
        &self,
        cart: CartUuid,
        user: UserId,
        totals: CartTotals,
        now: Timestamp,
    ) -> Result<CheckoutReceipt, CheckoutServiceError>;
}
