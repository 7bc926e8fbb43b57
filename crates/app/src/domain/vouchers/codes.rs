//! Code Generation

use rand::{Rng, seq::SliceRandom};
use vouchers::{codes::VoucherCode, validation::ValidationError};

/// Characters used in generated codes. `0`, `1`, `I` and `O` are left out.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Random characters appended after the prefix.
pub const RANDOM_PART_LEN: usize = 8;

/// Propose a code made of `prefix` followed by [`RANDOM_PART_LEN`] random characters.
///
/// # Errors
///
/// Returns [`ValidationError::FieldTooLong`] when the prefix leaves no room
/// for the random part.
pub fn random_code<R>(rng: &mut R, prefix: Option<&str>) -> Result<VoucherCode, ValidationError>
where
    R: Rng + ?Sized,
{
    let mut code = prefix.map(str::trim).unwrap_or_default().to_uppercase();

    code.extend(
        (0..RANDOM_PART_LEN)
            .filter_map(|_| CODE_ALPHABET.choose(rng))
            .map(|&byte| char::from(byte)),
    );

    VoucherCode::parse(&code)
}
