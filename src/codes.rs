//! Voucher Codes

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::validation::ValidationError;

/// A redeemable voucher code.
///
/// Codes are trimmed and uppercased when parsed, so two codes that differ only
/// in case are the same code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VoucherCode(String);

impl VoucherCode {
    /// Longest accepted code, in characters.
    pub const MAX_LEN: usize = 50;

    /// Parse and normalise a code.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::MissingRequiredField`]: the code is blank.
    /// - [`ValidationError::FieldTooLong`]: the code exceeds [`Self::MAX_LEN`] characters.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::MissingRequiredField("code"));
        }

        if trimmed.chars().count() > Self::MAX_LEN {
            return Err(ValidationError::FieldTooLong {
                field: "code",
                max: Self::MAX_LEN,
            });
        }

        Ok(Self(trimmed.to_uppercase()))
    }

    /// The normalised code.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against user input.
    pub fn matches(&self, raw: &str) -> bool {
        self.0 == raw.trim().to_uppercase()
    }
}

impl fmt::Display for VoucherCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for VoucherCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VoucherCode> for String {
    fn from(value: VoucherCode) -> Self {
        value.0
    }
}
