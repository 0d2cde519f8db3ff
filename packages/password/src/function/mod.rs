//! Hashing strategies and their self-describing encodings
//!
//! Each strategy is an immutable parameter tuple. `Display` renders that
//! tuple canonically; the finder uses it as cache key and [`crate::Hash`]
//! uses it for equality.

use std::fmt;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use subtle::ConstantTimeEq;

use crate::random::SaltGenerator;
use crate::secure_string::SecureString;
use crate::{PasswordError, Result};

pub mod argon2;
pub mod bcrypt;
pub mod compressed_pbkdf2;
pub mod message_digest;
pub mod pbkdf2;
pub mod scrypt;

pub use self::argon2::{Argon2Function, Argon2Type};
pub use self::bcrypt::{BcryptFunction, BcryptVersion};
pub use self::compressed_pbkdf2::CompressedPbkdf2Function;
pub use self::message_digest::{DigestAlgorithm, MessageDigestFunction, SaltOption};
pub use self::pbkdf2::{Hmac, Pbkdf2Function};
pub use self::scrypt::ScryptFunction;

/// Algorithm family of a hashing function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// PBKDF2 with the salt tracked outside the result
    Pbkdf2,
    /// PBKDF2 with parameters and salt embedded in the result
    CompressedPbkdf2,
    /// Bcrypt modular crypt format
    Bcrypt,
    /// Scrypt with a packed parameter word
    Scrypt,
    /// Argon2 PHC string
    Argon2,
    /// Plain message digest, hex encoded
    MessageDigest,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pbkdf2 => "PBKDF2",
            Self::CompressedPbkdf2 => "CompressedPBKDF2",
            Self::Bcrypt => "Bcrypt",
            Self::Scrypt => "Scrypt",
            Self::Argon2 => "Argon2",
            Self::MessageDigest => "MessageDigest",
        };
        f.write_str(name)
    }
}

/// What a function hands back after hashing: the encoded result and the
/// salt actually used (generated or supplied).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashOutput {
    /// Encoded hash string
    pub result: String,
    /// Salt bytes that went into the derivation
    pub salt: Option<Vec<u8>>,
}

/// A password hashing strategy
///
/// `secret` is the already composed input (pepper + password, and for
/// message digests the salt is folded in by the function itself).
pub trait HashingFunction: fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Algorithm family
    fn algorithm(&self) -> Algorithm;

    /// Hash `secret`. Functions that need a salt draw one from `salts` when
    /// none is supplied.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the salt is unusable for this function
    /// or the underlying primitive rejects the input.
    fn hash(
        &self,
        secret: &SecureString,
        salt: Option<&[u8]>,
        salts: &mut SaltGenerator,
    ) -> Result<HashOutput>;

    /// Verify `secret` against `encoded`. Self-describing formats are parsed
    /// first and re-derived with the embedded parameters, whatever `self`
    /// is configured with.
    ///
    /// # Errors
    ///
    /// Returns `MalformedHash` when `encoded` cannot be parsed and
    /// `InvalidArgument` when a required salt is missing.
    fn check(&self, secret: &SecureString, encoded: &str, salt: Option<&[u8]>) -> Result<bool>;
}

/// Constant-time byte comparison
#[must_use]
#[inline]
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Standard alphabet, padded on output, lenient on input
pub(crate) const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Standard alphabet, unpadded on output, lenient on input
pub(crate) const STANDARD_NO_PAD_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

pub(crate) fn decode_base64(engine: &GeneralPurpose, text: &str, what: &str) -> Result<Vec<u8>> {
    engine
        .decode(text)
        .map_err(|e| PasswordError::malformed_hash(format!("Invalid base64 {what}: {e}")))
}

/// Split `$a$b$c` into `["", "a", "b", "c"]`, refusing strings that do not
/// start with the delimiter.
pub(crate) fn dollar_parts(encoded: &str) -> Option<Vec<&str>> {
    if !encoded.starts_with('$') {
        return None;
    }
    Some(encoded.split('$').collect())
}

pub(crate) fn positive(value: u32, what: &str) -> Result<u32> {
    if value == 0 {
        return Err(PasswordError::invalid_argument(format!("{what} must be positive")));
    }
    Ok(value)
}
