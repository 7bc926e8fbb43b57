//! Fixtures
//!
//! YAML catalogs used to seed in-memory storage and drive tests.
//!
//! ```yaml
//! currency: VND
//! vouchers:
//!   welcome:
//!     code: WELCOME10
//!     name: Welcome 10%
//!     discountKind: percent
//!     discountValue: "10"
//!     maxDiscount: "100000"
//!     validFrom: 2024-11-01
//!     validUntil: 2024-11-30
//!     timesUsed: 3
//! saved:
//!   - user: alice
//!     voucher: welcome
//!     savedAt: 2024-11-02T08:00:00Z
//! ```

use std::{fs, path::Path};

use jiff::Timestamp;
use rustc_hash::FxHashMap;
use rusty_money::{Findable, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    validation::{ValidationError, VoucherInput},
    vouchers::{InvariantViolation, Voucher, VoucherUsage},
};

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// A voucher entry failed validation
    #[error("Invalid voucher '{key}': {source}")]
    Validation {
        /// Fixture key of the voucher
        key: String,

        /// Validation failure
        source: ValidationError,
    },

    /// A voucher or saved entry breaks a counter invariant
    #[error("Invalid counters for '{key}': {violation}")]
    Invariant {
        /// Fixture key of the voucher
        key: String,

        /// The broken invariant
        violation: InvariantViolation,
    },

    /// A saved entry references a voucher key that is not defined
    #[error("Voucher not found: {0}")]
    UnknownVoucher(String),
}

/// A voucher as authored in a fixture: admin input plus its redemption count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherFixture {
    /// Fields as entered on the admin form.
    #[serde(flatten)]
    pub input: VoucherInput,

    /// Redemptions already recorded.
    #[serde(default)]
    pub times_used: u32,
}

/// One user's saved voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedVoucherFixture {
    /// User identifier.
    pub user: String,

    /// Key of the voucher under `vouchers`.
    pub voucher: String,

    /// Times this user redeemed it.
    #[serde(default)]
    pub used_count: u32,

    /// When the user saved it.
    pub saved_at: Timestamp,
}

/// A catalog fixture file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFixture {
    /// ISO 4217 currency code for every amount in the file.
    pub currency: String,

    /// Vouchers keyed by fixture key.
    #[serde(default)]
    pub vouchers: FxHashMap<String, VoucherFixture>,

    /// Saved vouchers across users.
    #[serde(default)]
    pub saved: Vec<SavedVoucherFixture>,
}

/// A validated saved entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedEntry {
    /// User identifier.
    pub user: String,

    /// The saved voucher.
    pub voucher: Voucher,

    /// The user's usage.
    pub usage: VoucherUsage,
}

impl CatalogFixture {
    /// Load a fixture from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml(&contents)
    }

    /// Parse a fixture from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML does not describe a catalog.
    pub fn from_yaml(contents: &str) -> Result<Self, FixtureError> {
        Ok(serde_norway::from_str(contents)?)
    }

    /// Resolve the fixture currency.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::UnknownCurrency`] for codes outside ISO 4217.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        Currency::find(self.currency.trim())
            .ok_or_else(|| FixtureError::UnknownCurrency(self.currency.clone()))
    }

    /// Validate every voucher, ordered by fixture key.
    ///
    /// # Errors
    ///
    /// Returns the first entry that fails validation or whose redemption
    /// count is over its usage limit.
    pub fn vouchers(&self) -> Result<Vec<(String, Voucher)>, FixtureError> {
        let mut keys: Vec<&String> = self.vouchers.keys().collect();
        keys.sort();

        keys.into_iter()
            .map(|key| Ok((key.clone(), self.voucher(key)?)))
            .collect()
    }

    /// Validate a single voucher by fixture key.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::UnknownVoucher`] if the key is not defined,
    /// or the validation or counter failure for the entry.
    pub fn voucher(&self, key: &str) -> Result<Voucher, FixtureError> {
        let fixture = self
            .vouchers
            .get(key)
            .ok_or_else(|| FixtureError::UnknownVoucher(key.to_string()))?;

        let mut voucher = fixture
            .input
            .validate()
            .map_err(|source| FixtureError::Validation {
                key: key.to_string(),
                source,
            })?;

        voucher.times_used = fixture.times_used;

        if let Some(violation) = voucher.invariant_violations().into_iter().next() {
            return Err(FixtureError::Invariant {
                key: key.to_string(),
                violation,
            });
        }

        Ok(voucher)
    }

    /// Validate every saved entry against the vouchers it references.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown voucher keys, invalid vouchers, or usage
    /// counts over the per-user limit.
    pub fn saved(&self) -> Result<Vec<SavedEntry>, FixtureError> {
        self.saved
            .iter()
            .map(|saved| {
                let voucher = self.voucher(&saved.voucher)?;
                let usage = VoucherUsage {
                    used_count: saved.used_count,
                    saved_at: saved.saved_at,
                };

                if let Some(violation) = usage.invariant_violation(&voucher) {
                    return Err(FixtureError::Invariant {
                        key: saved.voucher.clone(),
                        violation,
                    });
                }

                Ok(SavedEntry {
                    user: saved.user.clone(),
                    voucher,
                    usage,
                })
            })
            .collect()
    }

    /// Saved entries belonging to `user`.
    ///
    /// # Errors
    ///
    /// Same as [`CatalogFixture::saved`].
    pub fn saved_for(&self, user: &str) -> Result<Vec<SavedEntry>, FixtureError> {
        Ok(self
            .saved()?
            .into_iter()
            .filter(|entry| entry.user == user)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rust_decimal_macros::dec;
    use rusty_money::iso;
    use testresult::TestResult;

    use crate::vouchers::DiscountRule;

    use super::*;

    const CATALOG: &str = r#"
currency: VND
vouchers:
  welcome:
    code: welcome10
    name: Welcome 10%
    discountKind: percent
    discountValue: "10"
    maxDiscount: "100000"
    minOrderAmount: "500000"
    validFrom: 2024-11-01
    validUntil: 2024-11-30
    usageLimit: 100
    timesUsed: 12
  ship:
    code: FREESHIP
    name: Free shipping
    discountKind: freeship
    discountValue: "30000"
    validFrom: 2024-11-01
    validUntil: 2024-12-31
    perUserLimit: 3
saved:
  - user: alice
    voucher: welcome
    savedAt: 2024-11-02T08:00:00Z
  - user: alice
    voucher: ship
    usedCount: 2
    savedAt: 2024-11-05T08:00:00Z
  - user: bob
    voucher: ship
    savedAt: 2024-11-06T08:00:00Z
"#;

    #[test]
    fn loads_catalog() -> TestResult {
        let fixture = CatalogFixture::from_yaml(CATALOG)?;

        assert_eq!(fixture.currency()?, iso::VND);

        let vouchers = fixture.vouchers()?;

        assert_eq!(vouchers.len(), 2);

        let (key, ship) = &vouchers[0];

        assert_eq!(key, "ship");
        assert_eq!(
            ship.discount,
            DiscountRule::FreeShipping {
                amount: dec!(30000)
            }
        );

        let welcome = fixture.voucher("welcome")?;

        assert_eq!(welcome.code.as_str(), "WELCOME10");
        assert_eq!(welcome.times_used, 12);
        assert_eq!(welcome.min_order_amount, dec!(500000));

        Ok(())
    }

    #[test]
    fn filters_saved_by_user() -> TestResult {
        let fixture = CatalogFixture::from_yaml(CATALOG)?;

        let alice = fixture.saved_for("alice")?;

        assert_eq!(alice.len(), 2);
        assert_eq!(alice[1].usage.used_count, 2);
        assert_eq!(fixture.saved_for("bob")?.len(), 1);
        assert!(fixture.saved_for("carol")?.is_empty());

        Ok(())
    }

    #[test]
    fn reads_from_disk() -> TestResult {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(CATALOG.as_bytes())?;

        let fixture = CatalogFixture::from_path(file.path())?;

        assert_eq!(fixture.vouchers.len(), 2);

        Ok(())
    }

    #[test]
    fn unknown_currency_is_reported() -> TestResult {
        let fixture = CatalogFixture::from_yaml("currency: XYZ\n")?;

        assert!(matches!(
            fixture.currency(),
            Err(FixtureError::UnknownCurrency(code)) if code == "XYZ"
        ));

        Ok(())
    }

    #[test]
    fn unknown_saved_voucher_is_reported() -> TestResult {
        let fixture = CatalogFixture::from_yaml(
            "currency: VND\nsaved:\n  - user: alice\n    voucher: missing\n    savedAt: 2024-11-02T08:00:00Z\n",
        )?;

        assert!(matches!(
            fixture.saved(),
            Err(FixtureError::UnknownVoucher(key)) if key == "missing"
        ));

        Ok(())
    }

    #[test]
    fn invalid_voucher_names_its_key() -> TestResult {
        let fixture = CatalogFixture::from_yaml(
            r#"
currency: VND
vouchers:
  broken:
    code: BROKEN
    name: Broken
    discountKind: percent
    discountValue: "150"
    validFrom: 2024-11-01
    validUntil: 2024-11-30
"#,
        )?;

        assert!(matches!(
            fixture.vouchers(),
            Err(FixtureError::Validation {
                key,
                source: ValidationError::PercentOutOfRange,
            }) if key == "broken"
        ));

        Ok(())
    }

    #[test]
    fn over_used_saved_entry_is_rejected() -> TestResult {
        let fixture = CatalogFixture::from_yaml(
            r#"
currency: VND
vouchers:
  once:
    code: ONCE
    name: Once
    discountKind: fixed
    discountValue: "1000"
    validFrom: 2024-11-01
    validUntil: 2024-11-30
saved:
  - user: alice
    voucher: once
    usedCount: 2
    savedAt: 2024-11-02T08:00:00Z
"#,
        )?;

        assert!(matches!(
            fixture.saved(),
            Err(FixtureError::Invariant { key, .. }) if key == "once"
        ));

        Ok(())
    }
}
