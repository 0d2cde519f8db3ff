//! Builder for verifying a password against a stored hash

use std::fmt;
use std::sync::Arc;

use tracing::trace;
use zeroize::Zeroizing;

use super::{compose, owned_pepper, HashUpdater};
use crate::finder::AlgorithmFinder;
use crate::function::HashingFunction;
use crate::hash::Hash;
use crate::secure_string::SecureString;
use crate::{PasswordError, Result};

/// What a password is checked against
#[derive(Debug, Clone)]
pub enum CheckTarget {
    /// Encoded hash string
    Encoded(String),
    /// Full hash record, salt and pepper included
    Hash(Hash),
}

impl From<&str> for CheckTarget {
    fn from(encoded: &str) -> Self {
        Self::Encoded(encoded.to_owned())
    }
}

impl From<String> for CheckTarget {
    fn from(encoded: String) -> Self {
        Self::Encoded(encoded)
    }
}

impl From<&String> for CheckTarget {
    fn from(encoded: &String) -> Self {
        Self::Encoded(encoded.clone())
    }
}

impl From<Hash> for CheckTarget {
    fn from(hash: Hash) -> Self {
        Self::Hash(hash)
    }
}

impl From<&Hash> for CheckTarget {
    fn from(hash: &Hash) -> Self {
        Self::Hash(hash.clone())
    }
}

/// Accumulates salt and pepper, then verifies
#[must_use]
pub struct HashChecker<'f> {
    pub(super) finder: &'f AlgorithmFinder,
    pub(super) password: SecureString,
    pub(super) encoded: String,
    pub(super) origin: Option<Arc<dyn HashingFunction>>,
    pub(super) salt: Option<Vec<u8>>,
    pub(super) pepper: Option<Zeroizing<String>>,
}

impl fmt::Debug for HashChecker<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashChecker")
            .field("password", &self.password)
            .field("encoded", &self.encoded)
            .field("origin", &self.origin.as_ref().map(|origin| origin.to_string()))
            .field("salt", &self.salt.as_ref().map(hex::encode))
            .field("pepper", &self.pepper.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl<'f> HashChecker<'f> {
    pub(crate) fn new(finder: &'f AlgorithmFinder, password: SecureString, target: CheckTarget) -> Result<Self> {
        let (encoded, origin, salt, pepper) = match target {
            CheckTarget::Encoded(encoded) => (encoded, None, None, None),
            CheckTarget::Hash(hash) => (
                hash.result().to_owned(),
                Some(Arc::clone(hash.function())),
                hash.salt().map(<[u8]>::to_vec),
                owned_pepper(hash.pepper()),
            ),
        };
        if encoded.is_empty() {
            return Err(PasswordError::invalid_argument("Hash to check against cannot be empty"));
        }
        Ok(Self {
            finder,
            password,
            encoded,
            origin,
            salt,
            pepper,
        })
    }

    /// Salt the hash was produced with
    pub fn add_salt(mut self, salt: impl AsRef<[u8]>) -> Self {
        self.salt = Some(salt.as_ref().to_vec());
        self
    }

    /// Pepper the hash was produced with
    pub fn add_pepper(mut self, pepper: impl AsRef<str>) -> Self {
        self.pepper = owned_pepper(Some(pepper.as_ref()));
        self
    }

    /// Configured `global.pepper`, if any
    pub fn add_configured_pepper(mut self) -> Self {
        self.pepper = owned_pepper(self.finder.pepper().as_deref());
        self
    }

    pub(super) fn verify(&self, function: &dyn HashingFunction) -> Result<bool> {
        let secret = compose(&self.password, self.pepper.as_deref().map(String::as_str));
        let verified = function.check(&secret, &self.encoded, self.salt.as_deref())?;
        trace!(function = %function, verified, "Checked password");
        Ok(verified)
    }

    /// Verify with `function`. A mismatch is `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns `MalformedHash` when the stored hash cannot be parsed by
    /// `function` and `InvalidArgument` when a required salt is missing.
    pub fn with(self, function: Arc<dyn HashingFunction>) -> Result<bool> {
        self.verify(function.as_ref())
    }

    /// Verify with the configured PBKDF2
    ///
    /// # Errors
    ///
    /// See [`HashChecker::with`].
    pub fn with_pbkdf2(self) -> Result<bool> {
        let function = self.finder.pbkdf2()?;
        self.with(function)
    }

    /// Verify with compressed PBKDF2; parameters come from the hash
    ///
    /// # Errors
    ///
    /// See [`HashChecker::with`].
    pub fn with_compressed_pbkdf2(self) -> Result<bool> {
        let function = self.finder.compressed_pbkdf2()?;
        self.with(function)
    }

    /// Verify with Bcrypt; parameters come from the hash
    ///
    /// # Errors
    ///
    /// See [`HashChecker::with`].
    pub fn with_bcrypt(self) -> Result<bool> {
        let function = self.finder.bcrypt()?;
        self.with(function)
    }

    /// Verify with Scrypt; parameters come from the hash
    ///
    /// # Errors
    ///
    /// See [`HashChecker::with`].
    pub fn with_scrypt(self) -> Result<bool> {
        let function = self.finder.scrypt()?;
        self.with(function)
    }

    /// Verify with Argon2; parameters come from the hash
    ///
    /// # Errors
    ///
    /// See [`HashChecker::with`].
    pub fn with_argon2(self) -> Result<bool> {
        let function = self.finder.argon2()?;
        self.with(function)
    }

    /// Verify with the configured message digest
    ///
    /// # Errors
    ///
    /// See [`HashChecker::with`].
    pub fn with_message_digest(self) -> Result<bool> {
        let function = self.finder.message_digest()?;
        self.with(function)
    }

    /// Continue into a re-hash that only happens if this check passes
    pub fn and_update(self) -> HashUpdater<'f> {
        HashUpdater::new(self)
    }
}
