//! Property-based tests for status, eligibility and discount invariants

use jiff::{Timestamp, civil::date, tz::TimeZone};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::VND};

use vouchers::{prelude::*, validation::DiscountKindInput};

fn percent_voucher(percent: u32, cap: Option<u64>, min_order: u64) -> Voucher {
    let input = VoucherInput {
        code: "PROP".to_string(),
        name: "Property voucher".to_string(),
        scope: ScopeKind::Platform,
        owner_store_id: None,
        owner_store_name: None,
        discount_kind: DiscountKindInput::Percent,
        discount_value: percent.to_string(),
        description: None,
        min_order_amount: min_order.to_string(),
        max_discount: cap.map(|cap| cap.to_string()),
        valid_from: date(2024, 11, 1),
        valid_until: date(2024, 11, 30),
        usage_limit: Some(100),
        per_user_limit: 2,
        is_active: true,
    };

    match input.validate() {
        Ok(voucher) => voucher,
        Err(err) => panic!("generated input should validate: {err}"),
    }
}

fn timestamp_strategy() -> impl Strategy<Value = Timestamp> {
    // 2024-09-01 .. 2025-01-31
    (1_725_148_800i64..1_738_281_600).prop_map(|secs| {
        Timestamp::from_second(secs).unwrap_or(Timestamp::UNIX_EPOCH)
    })
}

fn voucher_strategy() -> impl Strategy<Value = Voucher> {
    (
        1u32..=100,
        prop::option::of(1u64..500_000),
        0u64..1_000_000,
        0u32..=100,
        any::<bool>(),
    )
        .prop_map(|(percent, cap, min_order, times_used, is_active)| {
            let mut voucher = percent_voucher(percent, cap, min_order);
            voucher.times_used = times_used;
            voucher.is_active = is_active;
            voucher
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn status_is_deterministic(voucher in voucher_strategy(), now in timestamp_strategy()) {
        prop_assert_eq!(derive_status(&voucher, now), derive_status(&voucher, now));
    }

    #[test]
    fn eligible_implies_active(
        voucher in voucher_strategy(),
        now in timestamp_strategy(),
        subtotal in 0i64..5_000_000,
        used_count in 0u32..3,
    ) {
        let usage = VoucherUsage { used_count, saved_at: now };
        let subtotal = Money::from_major(subtotal, VND);

        if evaluate_eligibility(&voucher, now, &subtotal, Some(&usage)).is_eligible() {
            prop_assert_eq!(derive_status(&voucher, now), VoucherStatus::Active);
            prop_assert!(used_count < voucher.per_user_limit);
            prop_assert!(*subtotal.amount() >= voucher.min_order_amount);
        }
    }

    #[test]
    fn percent_discount_never_exceeds_cap_or_subtotal(
        percent in 1u32..=100,
        cap in prop::option::of(1u64..500_000),
        subtotal in 0i64..10_000_000,
    ) {
        let voucher = percent_voucher(percent, cap, 0);
        let subtotal = Money::from_major(subtotal, VND);

        let discount = calculate_discount(&voucher, &subtotal)
            .map_err(|err| TestCaseError::fail(err.to_string()))?;
        let amount = *discount.amount().amount();

        prop_assert!(amount >= Decimal::ZERO);
        prop_assert!(amount <= *subtotal.amount());

        if let Some(cap) = cap {
            prop_assert!(amount <= Decimal::from(cap));
        }
    }

    #[test]
    fn applying_twice_gives_the_same_outcome(
        voucher in voucher_strategy(),
        now in timestamp_strategy(),
        subtotal in 0i64..5_000_000,
        shipping in 0i64..50_000,
    ) {
        let order = OrderContext {
            subtotal: Money::from_major(subtotal, VND),
            shipping_fee: Money::from_major(shipping, VND),
        };

        let first = apply_voucher(Some(&voucher), None, &order, now)
            .map_err(|err| TestCaseError::fail(err.to_string()))?;
        let second = apply_voucher(Some(&voucher), None, &order, now)
            .map_err(|err| TestCaseError::fail(err.to_string()))?;

        prop_assert_eq!(first, second);
    }

    #[test]
    fn new_total_is_never_negative(
        amount in 1u64..10_000_000,
        subtotal in 0i64..5_000_000,
        shipping in 0i64..50_000,
    ) {
        let voucher = match (VoucherInput {
            code: "FLAT".to_string(),
            name: "Flat".to_string(),
            scope: ScopeKind::Platform,
            owner_store_id: None,
            owner_store_name: None,
            discount_kind: DiscountKindInput::Fixed,
            discount_value: amount.to_string(),
            description: None,
            min_order_amount: "0".to_string(),
            max_discount: None,
            valid_from: date(2024, 11, 1),
            valid_until: date(2024, 11, 30),
            usage_limit: None,
            per_user_limit: 1,
            is_active: true,
        })
        .validate()
        {
            Ok(voucher) => voucher,
            Err(err) => return Err(TestCaseError::fail(err.to_string())),
        };

        let now = date(2024, 11, 15)
            .to_zoned(TimeZone::UTC)
            .map_err(|err| TestCaseError::fail(err.to_string()))?
            .timestamp();

        let order = OrderContext {
            subtotal: Money::from_major(subtotal, VND),
            shipping_fee: Money::from_major(shipping, VND),
        };

        let outcome = apply_voucher(Some(&voucher), None, &order, now)
            .map_err(|err| TestCaseError::fail(err.to_string()))?;

        if let ApplyOutcome::Applied(applied) = outcome {
            prop_assert!(*applied.new_total.amount() >= *order.shipping_fee.amount());
        } else {
            prop_assert!(false, "fixed voucher with no minimum should apply");
        }
    }
}
