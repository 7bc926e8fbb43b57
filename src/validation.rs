//! Voucher Input Validation
//!
//! Admin forms send loosely typed payloads: amounts as decimal strings, an
//! optional cap regardless of discount kind. [`VoucherInput::validate`] turns
//! one into a [`Voucher`] or reports the first rule it breaks, before anything
//! is persisted.

use jiff::civil::Date;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    amounts::{AmountError, parse_amount},
    codes::VoucherCode,
    vouchers::{DiscountKind, DiscountRule, ValidityWindow, Voucher, VoucherScope},
};

/// Longest accepted voucher name.
pub const MAX_NAME_LEN: usize = 50;

/// Longest accepted description.
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// Reasons a voucher input is refused.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is blank or absent.
    #[error("missing required field `{0}`")]
    MissingRequiredField(&'static str),

    /// A text field is too long.
    #[error("`{field}` must be at most {max} characters")]
    FieldTooLong {
        /// Offending field.
        field: &'static str,

        /// Character limit.
        max: usize,
    },

    /// An amount is not a decimal number.
    #[error("`{field}` is not a valid decimal amount")]
    InvalidAmount {
        /// Offending field.
        field: &'static str,
    },

    /// An amount is below zero.
    #[error("`{field}` must not be negative")]
    NegativeAmount {
        /// Offending field.
        field: &'static str,
    },

    /// The discount value is zero or negative.
    #[error("discount value must be greater than zero")]
    InvalidDiscountValue,

    /// A percentage above 100.
    #[error("percentage discount must not exceed 100")]
    PercentOutOfRange,

    /// `validUntil` is not after `validFrom`.
    #[error("valid until must be after valid from")]
    InvalidDateRange,

    /// A cap was supplied for a non-percentage discount.
    #[error("max discount only applies to percentage vouchers")]
    MaxDiscountNotApplicable,

    /// A usage limit of zero.
    #[error("`{field}` must be a positive integer")]
    InvalidLimit {
        /// Offending field.
        field: &'static str,
    },
}

/// Scope selector as sent by the admin form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    /// Platform-wide.
    #[default]
    Platform,

    /// Single store.
    Store,
}

/// Discount kind as sent by the admin form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscountKindInput {
    /// Percentage of subtotal.
    #[serde(rename = "percent")]
    Percent,

    /// Flat amount.
    #[serde(rename = "fixed")]
    Fixed,

    /// Shipping waiver.
    #[serde(rename = "freeship", alias = "free_shipping")]
    FreeShipping,
}

impl From<DiscountKindInput> for DiscountKind {
    fn from(value: DiscountKindInput) -> Self {
        match value {
            DiscountKindInput::Percent => Self::Percent,
            DiscountKindInput::Fixed => Self::Fixed,
            DiscountKindInput::FreeShipping => Self::FreeShipping,
        }
    }
}

/// Create/update payload for a voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherInput {
    /// Redemption code.
    #[serde(default)]
    pub code: String,

    /// Display label.
    #[serde(default)]
    pub name: String,

    /// Platform or store.
    #[serde(default)]
    pub scope: ScopeKind,

    /// Owning store id for store vouchers.
    #[serde(default)]
    pub owner_store_id: Option<String>,

    /// Owning store name for store vouchers.
    #[serde(default)]
    pub owner_store_name: Option<String>,

    /// Calculation strategy.
    pub discount_kind: DiscountKindInput,

    /// Percentage or amount, as a decimal string.
    pub discount_value: String,

    /// Free text.
    #[serde(default)]
    pub description: Option<String>,

    /// Minimum subtotal, as a decimal string.
    #[serde(default = "default_min_order_amount")]
    pub min_order_amount: String,

    /// Percentage cap, as a decimal string.
    #[serde(default)]
    pub max_discount: Option<String>,

    /// First valid day.
    pub valid_from: Date,

    /// Last valid day.
    pub valid_until: Date,

    /// Global redemption cap.
    #[serde(default)]
    pub usage_limit: Option<u32>,

    /// Redemptions allowed per user.
    #[serde(default = "default_per_user_limit")]
    pub per_user_limit: u32,

    /// Administrative kill switch.
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

fn default_min_order_amount() -> String {
    "0".to_string()
}

const fn default_per_user_limit() -> u32 {
    1
}

const fn default_is_active() -> bool {
    true
}

impl VoucherInput {
    /// Validate the payload into a voucher with no recorded redemptions.
    ///
    /// Checks run in a fixed order and the first failure is returned.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] the payload breaks.
    pub fn validate(&self) -> Result<Voucher, ValidationError> {
        if self.code.trim().is_empty() {
            return Err(ValidationError::MissingRequiredField("code"));
        }

        let name = self.name.trim();

        if name.is_empty() {
            return Err(ValidationError::MissingRequiredField("name"));
        }

        let code = VoucherCode::parse(&self.code)?;

        check_length("name", name, MAX_NAME_LEN)?;

        let description = self.description.as_deref().map(str::trim).unwrap_or_default();

        check_length("description", description, MAX_DESCRIPTION_LEN)?;

        let value = match parse_amount(&self.discount_value) {
            Ok(value) if value > Decimal::ZERO => value,
            Ok(_) | Err(AmountError::Negative) => {
                return Err(ValidationError::InvalidDiscountValue);
            }
            Err(AmountError::Invalid) => {
                return Err(ValidationError::InvalidAmount {
                    field: "discountValue",
                });
            }
        };

        let kind = DiscountKind::from(self.discount_kind);

        if kind == DiscountKind::Percent && value > Decimal::ONE_HUNDRED {
            return Err(ValidationError::PercentOutOfRange);
        }

        let validity = ValidityWindow::new(self.valid_from, self.valid_until)
            .ok_or(ValidationError::InvalidDateRange)?;

        let max_discount = self
            .max_discount
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty());

        let discount = match (kind, max_discount) {
            (DiscountKind::Percent, cap) => DiscountRule::Percent {
                percent: value,
                max_discount: cap
                    .map(|raw| amount_field("maxDiscount", raw))
                    .transpose()?,
            },
            (DiscountKind::Fixed | DiscountKind::FreeShipping, Some(_)) => {
                return Err(ValidationError::MaxDiscountNotApplicable);
            }
            (DiscountKind::Fixed, None) => DiscountRule::Fixed { amount: value },
            (DiscountKind::FreeShipping, None) => DiscountRule::FreeShipping { amount: value },
        };

        let min_order_amount = if self.min_order_amount.trim().is_empty() {
            Decimal::ZERO
        } else {
            amount_field("minOrderAmount", &self.min_order_amount)?
        };

        if self.usage_limit == Some(0) {
            return Err(ValidationError::InvalidLimit {
                field: "usageLimit",
            });
        }

        if self.per_user_limit == 0 {
            return Err(ValidationError::InvalidLimit {
                field: "perUserLimit",
            });
        }

        Ok(Voucher {
            code,
            name: name.to_string(),
            description: description.to_string(),
            scope: self.voucher_scope(),
            discount,
            min_order_amount,
            validity,
            usage_limit: self.usage_limit,
            per_user_limit: self.per_user_limit,
            times_used: 0,
            is_active: self.is_active,
        })
    }

    fn voucher_scope(&self) -> VoucherScope {
        match self.scope {
            ScopeKind::Platform => VoucherScope::Platform,
            ScopeKind::Store => VoucherScope::Store {
                owner_store_id: non_blank(self.owner_store_id.as_deref()),
                owner_store_name: non_blank(self.owner_store_name.as_deref()),
            },
        }
    }
}

impl From<&Voucher> for VoucherInput {
    fn from(voucher: &Voucher) -> Self {
        let (scope, owner_store_id, owner_store_name) = match &voucher.scope {
            VoucherScope::Platform => (ScopeKind::Platform, None, None),
            VoucherScope::Store {
                owner_store_id,
                owner_store_name,
            } => (
                ScopeKind::Store,
                owner_store_id.clone(),
                owner_store_name.clone(),
            ),
        };

        let discount_kind = match voucher.discount.kind() {
            DiscountKind::Percent => DiscountKindInput::Percent,
            DiscountKind::Fixed => DiscountKindInput::Fixed,
            DiscountKind::FreeShipping => DiscountKindInput::FreeShipping,
        };

        Self {
            code: voucher.code.to_string(),
            name: voucher.name.clone(),
            scope,
            owner_store_id,
            owner_store_name,
            discount_kind,
            discount_value: voucher.discount.value().to_string(),
            description: (!voucher.description.is_empty()).then(|| voucher.description.clone()),
            min_order_amount: voucher.min_order_amount.to_string(),
            max_discount: voucher.discount.max_discount().map(|cap| cap.to_string()),
            valid_from: voucher.validity.valid_from(),
            valid_until: voucher.validity.valid_until(),
            usage_limit: voucher.usage_limit,
            per_user_limit: voucher.per_user_limit,
            is_active: voucher.is_active,
        }
    }
}

fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        Err(ValidationError::FieldTooLong { field, max })
    } else {
        Ok(())
    }
}

fn amount_field(field: &'static str, raw: &str) -> Result<Decimal, ValidationError> {
    parse_amount(raw).map_err(|error| match error {
        AmountError::Invalid => ValidationError::InvalidAmount { field },
        AmountError::Negative => ValidationError::NegativeAmount { field },
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
