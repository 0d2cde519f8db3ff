//! Fluent hashing, verification and migration API
//!
//! Usage: `Password::hash(&finder, "secret")?.add_random_salt().with_argon2()?`

pub mod hash_builder;
pub mod hash_checker;
pub mod hash_updater;

use secrecy::ExposeSecret;
use zeroize::Zeroizing;

pub use hash_builder::HashBuilder;
pub use hash_checker::{CheckTarget, HashChecker};
pub use hash_updater::HashUpdater;

use crate::finder::AlgorithmFinder;
use crate::hash::Hash;
use crate::secure_string::SecureString;
use crate::{PasswordError, Result};

/// Main entry point
pub struct Password;

impl Password {
    /// Start hashing `password`
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when `password` is empty.
    pub fn hash(finder: &AlgorithmFinder, password: impl Into<SecureString>) -> Result<HashBuilder<'_>> {
        let password = password.into();
        if password.is_empty() {
            return Err(PasswordError::invalid_argument("Password cannot be empty"));
        }
        Ok(HashBuilder::new(finder, password))
    }

    /// Start verifying `password` against an encoded string or a [`Hash`].
    /// A `Hash` target pre-loads its salt and pepper.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the target has an empty result.
    pub fn check(
        finder: &AlgorithmFinder,
        password: impl Into<SecureString>,
        target: impl Into<CheckTarget>,
    ) -> Result<HashChecker<'_>> {
        HashChecker::new(finder, password.into(), target.into())
    }

    /// Verify `password` against `hash` with the function, salt and pepper
    /// recorded on it
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the hash has an empty result and
    /// propagates `MalformedHash` from the function.
    pub fn check_hash(password: impl Into<SecureString>, hash: &Hash) -> Result<bool> {
        if hash.result().is_empty() {
            return Err(PasswordError::invalid_argument("Hash result cannot be empty"));
        }
        let secret = compose(&password.into(), hash.pepper());
        hash.function().check(&secret, hash.result(), hash.salt())
    }
}

/// Pepper followed by password
pub(crate) fn compose(password: &SecureString, pepper: Option<&str>) -> SecureString {
    match pepper {
        Some(pepper) => SecureString::concat(pepper.as_bytes(), password.expose_secret()),
        None => password.clone(),
    }
}

pub(crate) fn owned_pepper(pepper: Option<&str>) -> Option<Zeroizing<String>> {
    pepper.map(|pepper| Zeroizing::new(pepper.to_owned()))
}
