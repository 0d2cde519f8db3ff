//! Key/value configuration consumed by the algorithm finder
//!
//! Property discovery (files, environment) is left to the embedding
//! application; this module only defines the read capability and a shared
//! in-memory implementation that can be toggled at runtime.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Deserialize;
use tracing::warn;

use crate::{PasswordError, Result};

/// Property keys understood by the crate
pub mod keys {
    /// Default pepper used by `add_configured_pepper`
    pub const GLOBAL_PEPPER: &str = "global.pepper";
    /// Request the operating-system generator instead of the default CSPRNG
    pub const GLOBAL_RANDOM_STRONG: &str = "global.random.strong";

    /// HMAC variant for PBKDF2 (`SHA1`, `SHA224`, `SHA256`, `SHA384`, `SHA512`)
    pub const PBKDF2_ALGORITHM: &str = "hash.pbkdf2.algorithm";
    /// PBKDF2 iteration count
    pub const PBKDF2_ITERATIONS: &str = "hash.pbkdf2.iterations";
    /// PBKDF2 derived key length in bits
    pub const PBKDF2_LENGTH: &str = "hash.pbkdf2.length";

    /// Bcrypt minor version (`a`, `b`, `x`, `y`)
    pub const BCRYPT_MINOR: &str = "hash.bcrypt.minor";
    /// Bcrypt cost factor (log2 rounds)
    pub const BCRYPT_ROUNDS: &str = "hash.bcrypt.rounds";

    /// Scrypt CPU/memory cost N
    pub const SCRYPT_WORK_FACTOR: &str = "hash.scrypt.workfactor";
    /// Scrypt block size r
    pub const SCRYPT_RESOURCES: &str = "hash.scrypt.resources";
    /// Scrypt parallelization p
    pub const SCRYPT_PARALLELIZATION: &str = "hash.scrypt.parallelization";
    /// Scrypt derived key length in bytes
    pub const SCRYPT_DERIVED_KEY_LENGTH: &str = "hash.scrypt.derivedKeyLength";

    /// Argon2 memory cost in KiB
    pub const ARGON2_MEMORY: &str = "hash.argon2.memory";
    /// Argon2 passes over memory
    pub const ARGON2_ITERATIONS: &str = "hash.argon2.iterations";
    /// Argon2 output length in bytes
    pub const ARGON2_LENGTH: &str = "hash.argon2.length";
    /// Argon2 lanes
    pub const ARGON2_PARALLELISM: &str = "hash.argon2.parallelism";
    /// Argon2 variant (`d`, `i`, `id`)
    pub const ARGON2_TYPE: &str = "hash.argon2.type";
    /// Argon2 version (16 or 19)
    pub const ARGON2_VERSION: &str = "hash.argon2.version";

    /// Message digest name, e.g. `SHA-512`
    pub const MD_ALGORITHM: &str = "hash.md.algorithm";
    /// Where the salt goes relative to the secret (`prepend`, `append`)
    pub const MD_SALT_OPTION: &str = "hash.md.salt.option";
}

/// Read access to string properties with typed, defaulted accessors
pub trait PropertyReader: Send + Sync {
    /// Raw value stored under `key`, if any
    fn raw(&self, key: &str) -> Option<String>;

    /// String value or `default`
    fn read_string(&self, key: &str, default: Option<&str>) -> Option<String> {
        self.raw(key).or_else(|| default.map(str::to_owned))
    }

    /// Boolean value or `default`; unparseable values fall back with a warning
    fn read_bool(&self, key: &str, default: bool) -> bool {
        match self.raw(key) {
            None => default,
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "true" => true,
                "false" => false,
                _ => {
                    warn!(key, value = %value, default, "Unparseable boolean property, using default");
                    default
                }
            },
        }
    }

    /// Integer value or `default`; unparseable values fall back with a warning
    fn read_int(&self, key: &str, default: i64) -> i64 {
        match self.raw(key) {
            None => default,
            Some(value) => value.trim().parse().unwrap_or_else(|_| {
                warn!(key, value = %value, default, "Unparseable integer property, using default");
                default
            }),
        }
    }
}

/// Value accepted in a flat JSON property document
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Flag(bool),
    Number(serde_json::Number),
    Null,
}

/// Shared, concurrently mutable property map
///
/// Clones share the same storage, so a test (or an admin hook) holding one
/// handle can flip `global.random.strong` and the finder observes it on the
/// next call.
#[derive(Clone, Debug, Default)]
pub struct Properties {
    values: Arc<DashMap<String, String>>,
}

impl Properties {
    /// Empty property set; every read yields its default
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a flat JSON object. Scalars are stored in their textual form.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the input is not a JSON object or holds
    /// nested arrays/objects.
    pub fn from_json(json: &str) -> Result<Self> {
        let object: HashMap<String, Scalar> = serde_json::from_str(json)
            .map_err(|e| PasswordError::invalid_argument(format!("Invalid properties JSON: {e}")))?;

        let properties = Self::new();
        for (key, value) in object {
            let text = match value {
                Scalar::Text(text) => text,
                Scalar::Flag(flag) => flag.to_string(),
                Scalar::Number(number) => number.to_string(),
                Scalar::Null => continue,
            };
            properties.set(key, text);
        }
        Ok(properties)
    }

    /// Insert or replace a property
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Remove a property, returning its previous value
    pub fn remove(&self, key: &str) -> Option<String> {
        self.values.remove(key).map(|(_, value)| value)
    }

    /// Number of stored properties
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no property is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PropertyReader for Properties {
    fn raw(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|entry| entry.value().clone())
    }
}

impl<K, V> FromIterator<(K, V)> for Properties
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let properties = Self::new();
        for (key, value) in iter {
            properties.set(key, value);
        }
        properties
    }
}
