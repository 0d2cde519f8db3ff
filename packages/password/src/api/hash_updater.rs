//! Re-hash under new parameters after a successful check

use std::fmt;
use std::sync::Arc;

use tracing::trace;
use zeroize::Zeroizing;

use super::{compose, owned_pepper, HashChecker};
use crate::function::HashingFunction;
use crate::hash::{Hash, HashUpdate};
use crate::Result;

/// Verifies the old hash and, only if it matches, produces a new one
///
/// New salt and pepper default to the ones used for the check.
#[must_use]
pub struct HashUpdater<'f> {
    checker: HashChecker<'f>,
    new_salt: Option<Vec<u8>>,
    new_pepper: Option<Zeroizing<String>>,
}

impl fmt::Debug for HashUpdater<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashUpdater")
            .field("checker", &self.checker)
            .field("new_salt", &self.new_salt.as_ref().map(hex::encode))
            .field("new_pepper", &self.new_pepper.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl<'f> HashUpdater<'f> {
    pub(super) fn new(checker: HashChecker<'f>) -> Self {
        let new_salt = checker.salt.clone();
        let new_pepper = checker.pepper.clone();
        Self {
            checker,
            new_salt,
            new_pepper,
        }
    }

    /// Salt for the new hash
    pub fn add_new_salt(mut self, salt: impl AsRef<[u8]>) -> Self {
        self.new_salt = Some(salt.as_ref().to_vec());
        self
    }

    /// Random salt of the default length for the new hash
    pub fn add_new_random_salt(mut self) -> Self {
        self.new_salt = Some(self.checker.finder.salt_generator().generate_default());
        self
    }

    /// Random salt of `length` bytes for the new hash
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when `length` is negative.
    pub fn add_new_random_salt_of_length(mut self, length: i32) -> Result<Self> {
        self.new_salt = Some(self.checker.finder.salt_generator().generate(length)?);
        Ok(self)
    }

    /// Pepper for the new hash
    pub fn add_new_pepper(mut self, pepper: impl AsRef<str>) -> Self {
        self.new_pepper = owned_pepper(Some(pepper.as_ref()));
        self
    }

    /// Configured `global.pepper` for the new hash
    pub fn add_new_configured_pepper(mut self) -> Self {
        self.new_pepper = owned_pepper(self.checker.finder.pepper().as_deref());
        self
    }

    /// Verify with `old`, then hash with `new`. Nothing is derived under
    /// `new` unless verification succeeds.
    ///
    /// # Errors
    ///
    /// Propagates verification errors (a malformed stored hash) and
    /// hashing errors for the new function.
    pub fn with(self, old: Arc<dyn HashingFunction>, new: Arc<dyn HashingFunction>) -> Result<HashUpdate> {
        if !self.checker.verify(old.as_ref())? {
            trace!(old = %old, "Update skipped, check failed");
            return Ok(HashUpdate::rejected());
        }

        let pepper = self.new_pepper.as_deref().map(String::as_str);
        let secret = compose(&self.checker.password, pepper);
        let mut salts = self.checker.finder.salt_generator();
        let output = new.hash(&secret, self.new_salt.as_deref(), &mut salts)?;
        trace!(old = %old, new = %new, "Password re-hashed");
        Ok(HashUpdate::verified(Hash::new(new, output.result, output.salt, pepper)))
    }

    /// Re-hash with `new`, verifying with the function recorded on the
    /// checked [`Hash`] or detected from the encoded string
    ///
    /// # Errors
    ///
    /// Returns `MalformedHash` when the old function cannot be inferred,
    /// which is the case for plain PBKDF2 and message digest strings.
    pub fn migrate_to(self, new: Arc<dyn HashingFunction>) -> Result<HashUpdate> {
        let old = match &self.checker.origin {
            Some(origin) => Arc::clone(origin),
            None => self.checker.finder.instance_from_hash(&self.checker.encoded)?,
        };
        self.with(old, new)
    }

    /// Verify and re-hash with the configured PBKDF2
    ///
    /// # Errors
    ///
    /// See [`HashUpdater::with`].
    pub fn with_pbkdf2(self) -> Result<HashUpdate> {
        let function = self.checker.finder.pbkdf2()?;
        self.with(function.clone(), function)
    }

    /// Verify and re-hash with the configured compressed PBKDF2
    ///
    /// # Errors
    ///
    /// See [`HashUpdater::with`].
    pub fn with_compressed_pbkdf2(self) -> Result<HashUpdate> {
        let function = self.checker.finder.compressed_pbkdf2()?;
        self.with(function.clone(), function)
    }

    /// Verify and re-hash with the configured Bcrypt
    ///
    /// # Errors
    ///
    /// See [`HashUpdater::with`].
    pub fn with_bcrypt(self) -> Result<HashUpdate> {
        let function = self.checker.finder.bcrypt()?;
        self.with(function.clone(), function)
    }

    /// Verify and re-hash with the configured Scrypt
    ///
    /// # Errors
    ///
    /// See [`HashUpdater::with`].
    pub fn with_scrypt(self) -> Result<HashUpdate> {
        let function = self.checker.finder.scrypt()?;
        self.with(function.clone(), function)
    }

    /// Verify and re-hash with the configured Argon2
    ///
    /// # Errors
    ///
    /// See [`HashUpdater::with`].
    pub fn with_argon2(self) -> Result<HashUpdate> {
        let function = self.checker.finder.argon2()?;
        self.with(function.clone(), function)
    }

    /// Verify and re-hash with the configured message digest
    ///
    /// # Errors
    ///
    /// See [`HashUpdater::with`].
    pub fn with_message_digest(self) -> Result<HashUpdate> {
        let function = self.checker.finder.message_digest()?;
        self.with(function.clone(), function)
    }
}
