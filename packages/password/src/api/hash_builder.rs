//! Builder for new hashes

use std::fmt;
use std::sync::Arc;

use tracing::trace;
use zeroize::Zeroizing;

use super::{compose, owned_pepper};
use crate::finder::AlgorithmFinder;
use crate::function::HashingFunction;
use crate::hash::Hash;
use crate::secure_string::SecureString;
use crate::Result;

/// Accumulates salt and pepper for one password, then hashes it
#[must_use]
pub struct HashBuilder<'f> {
    finder: &'f AlgorithmFinder,
    password: SecureString,
    salt: Option<Vec<u8>>,
    pepper: Option<Zeroizing<String>>,
}

impl fmt::Debug for HashBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashBuilder")
            .field("password", &self.password)
            .field("salt", &self.salt.as_ref().map(hex::encode))
            .field("pepper", &self.pepper.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl<'f> HashBuilder<'f> {
    pub(crate) fn new(finder: &'f AlgorithmFinder, password: SecureString) -> Self {
        Self {
            finder,
            password,
            salt: None,
            pepper: None,
        }
    }

    /// Use `salt` as is
    pub fn add_salt(mut self, salt: impl AsRef<[u8]>) -> Self {
        self.salt = Some(salt.as_ref().to_vec());
        self
    }

    /// Use a random salt of the default length
    pub fn add_random_salt(mut self) -> Self {
        self.salt = Some(self.finder.salt_generator().generate_default());
        self
    }

    /// Use a random salt of `length` bytes
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when `length` is negative.
    pub fn add_random_salt_of_length(mut self, length: i32) -> Result<Self> {
        self.salt = Some(self.finder.salt_generator().generate(length)?);
        Ok(self)
    }

    /// Prefix `pepper` to the password
    pub fn add_pepper(mut self, pepper: impl AsRef<str>) -> Self {
        self.pepper = owned_pepper(Some(pepper.as_ref()));
        self
    }

    /// Prefix the configured `global.pepper`, if any
    pub fn add_configured_pepper(mut self) -> Self {
        self.pepper = owned_pepper(self.finder.pepper().as_deref());
        self
    }

    /// Hash with `function`
    ///
    /// # Errors
    ///
    /// Propagates the function's errors, e.g. an unusable salt.
    pub fn with(self, function: Arc<dyn HashingFunction>) -> Result<Hash> {
        trace!(function = %function, salted = self.salt.is_some(), peppered = self.pepper.is_some(), "Hashing password");
        let pepper = self.pepper.as_deref().map(String::as_str);
        let secret = compose(&self.password, pepper);
        let mut salts = self.finder.salt_generator();
        let output = function.hash(&secret, self.salt.as_deref(), &mut salts)?;
        Ok(Hash::new(function, output.result, output.salt, pepper))
    }

    /// Hash with the configured PBKDF2
    ///
    /// # Errors
    ///
    /// Configuration or hashing errors.
    pub fn with_pbkdf2(self) -> Result<Hash> {
        let function = self.finder.pbkdf2()?;
        self.with(function)
    }

    /// Hash with the configured compressed PBKDF2
    ///
    /// # Errors
    ///
    /// Configuration or hashing errors.
    pub fn with_compressed_pbkdf2(self) -> Result<Hash> {
        let function = self.finder.compressed_pbkdf2()?;
        self.with(function)
    }

    /// Hash with the configured Bcrypt
    ///
    /// # Errors
    ///
    /// Configuration or hashing errors.
    pub fn with_bcrypt(self) -> Result<Hash> {
        let function = self.finder.bcrypt()?;
        self.with(function)
    }

    /// Hash with the configured Scrypt
    ///
    /// # Errors
    ///
    /// Configuration or hashing errors.
    pub fn with_scrypt(self) -> Result<Hash> {
        let function = self.finder.scrypt()?;
        self.with(function)
    }

    /// Hash with the configured Argon2
    ///
    /// # Errors
    ///
    /// Configuration or hashing errors.
    pub fn with_argon2(self) -> Result<Hash> {
        let function = self.finder.argon2()?;
        self.with(function)
    }

    /// Hash with the configured message digest
    ///
    /// # Errors
    ///
    /// Configuration errors.
    pub fn with_message_digest(self) -> Result<Hash> {
        let function = self.finder.message_digest()?;
        self.with(function)
    }
}
