//! Hash value object and update outcome

use std::fmt;
use std::sync::Arc;

use zeroize::Zeroizing;

use crate::function::{Algorithm, HashingFunction};

/// Result of hashing a password
///
/// Holds the encoded result together with the salt and pepper that went into
/// it and the function that produced it, so it can be verified later
/// without outside bookkeeping.
#[derive(Clone)]
pub struct Hash {
    result: String,
    salt: Option<Vec<u8>>,
    pepper: Option<Zeroizing<String>>,
    function: Arc<dyn HashingFunction>,
}

impl Hash {
    /// Assemble a hash record
    #[must_use]
    pub fn new(
        function: Arc<dyn HashingFunction>,
        result: impl Into<String>,
        salt: Option<Vec<u8>>,
        pepper: Option<&str>,
    ) -> Self {
        Self {
            result: result.into(),
            salt,
            pepper: pepper.map(|pepper| Zeroizing::new(pepper.to_owned())),
            function,
        }
    }

    /// Encoded result
    #[must_use]
    pub fn result(&self) -> &str {
        &self.result
    }

    /// Salt used, if any
    #[must_use]
    pub fn salt(&self) -> Option<&[u8]> {
        self.salt.as_deref()
    }

    /// Pepper used, if any
    #[must_use]
    pub fn pepper(&self) -> Option<&str> {
        self.pepper.as_ref().map(|pepper| pepper.as_str())
    }

    /// Function that produced the result
    #[must_use]
    pub fn function(&self) -> &Arc<dyn HashingFunction> {
        &self.function
    }

    /// Algorithm family of the producing function
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.function.algorithm()
    }
}

impl PartialEq for Hash {
    fn eq(&self, other: &Self) -> bool {
        self.result == other.result
            && self.algorithm() == other.algorithm()
            && self.function.to_string() == other.function.to_string()
    }
}

impl Eq for Hash {}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.result)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hash")
            .field("result", &self.result)
            .field("salt", &self.salt.as_ref().map(hex::encode))
            .field("pepper", &self.pepper.as_ref().map(|_| "[REDACTED]"))
            .field("function", &format_args!("{}", self.function))
            .finish()
    }
}

/// Outcome of a check-and-rehash
///
/// A new hash is only present when the old one verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashUpdate {
    verified: bool,
    hash: Option<Hash>,
}

impl HashUpdate {
    pub(crate) fn verified(hash: Hash) -> Self {
        Self {
            verified: true,
            hash: Some(hash),
        }
    }

    pub(crate) fn rejected() -> Self {
        Self {
            verified: false,
            hash: None,
        }
    }

    /// Whether the old hash matched the password
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.verified
    }

    /// New hash when verified
    #[must_use]
    pub fn hash(&self) -> Option<&Hash> {
        self.hash.as_ref()
    }

    /// Take the new hash
    #[must_use]
    pub fn into_hash(self) -> Option<Hash> {
        self.hash
    }
}
