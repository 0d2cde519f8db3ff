//! Scrypt with a packed parameter word
//!
//! Grammar: `$<hex((log2 N << 16) | (r << 8) | p)>$<b64 salt>$<b64 hash>`

use std::fmt;

use ::scrypt::{scrypt, Params};
use base64::Engine as _;
use secrecy::ExposeSecret;
use zeroize::Zeroizing;

use super::{
    constant_time_eq, decode_base64, dollar_parts, positive, Algorithm, HashOutput,
    HashingFunction, STANDARD_LENIENT,
};
use crate::random::SaltGenerator;
use crate::secure_string::SecureString;
use crate::{PasswordError, Result};

/// Largest accepted `log2 N`
pub const MAX_LOG_N: u8 = 30;

/// Scrypt with fixed N, r, p and output length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScryptFunction {
    log_n: u8,
    resources: u32,
    parallelization: u32,
    derived_key_length: u32,
}

impl ScryptFunction {
    /// Create a configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when `work_factor` is not a power of two
    /// between 2 and `2^30`, `resources` or `parallelization` fall outside
    /// `1..=255`, the key length is zero, or the combination is rejected by
    /// the primitive.
    pub fn new(
        work_factor: u64,
        resources: u32,
        parallelization: u32,
        derived_key_length: u32,
    ) -> Result<Self> {
        if work_factor < 2
            || !work_factor.is_power_of_two()
            || work_factor.trailing_zeros() > u32::from(MAX_LOG_N)
        {
            return Err(PasswordError::invalid_argument(format!(
                "Scrypt work factor must be a power of 2 between 2 and 2^{MAX_LOG_N}, got {work_factor}"
            )));
        }
        for (value, what) in [(resources, "resources"), (parallelization, "parallelization")] {
            if !(1..=255).contains(&value) {
                return Err(PasswordError::invalid_argument(format!(
                    "Scrypt {what} must be between 1 and 255, got {value}"
                )));
            }
        }
        positive(derived_key_length, "Scrypt derived key length")?;

        let function = Self {
            log_n: work_factor.trailing_zeros() as u8,
            resources,
            parallelization,
            derived_key_length,
        };
        function.params()?;
        Ok(function)
    }

    /// Reconstruct the configuration that produced `encoded`
    ///
    /// # Errors
    ///
    /// Returns `MalformedHash` when `encoded` does not follow the grammar.
    pub fn from_hash(encoded: &str) -> Result<Self> {
        Ok(Parsed::parse(encoded)?.function)
    }

    /// CPU/memory cost N
    #[must_use]
    pub fn work_factor(&self) -> u64 {
        1u64 << self.log_n
    }

    /// Block size r
    #[must_use]
    pub fn resources(&self) -> u32 {
        self.resources
    }

    /// Parallelization p
    #[must_use]
    pub fn parallelization(&self) -> u32 {
        self.parallelization
    }

    /// Output length in bytes
    #[must_use]
    pub fn derived_key_length(&self) -> u32 {
        self.derived_key_length
    }

    /// Approximate memory needed for one derivation: `128 * N * r * p` bytes
    #[must_use]
    pub fn required_bytes(&self) -> u128 {
        128 * u128::from(self.work_factor())
            * u128::from(self.resources)
            * u128::from(self.parallelization)
    }

    fn params(&self) -> Result<Params> {
        // The length passed here is not consulted by `scrypt()`; the output buffer decides.
        Params::new(
            self.log_n,
            self.resources,
            self.parallelization,
            Params::RECOMMENDED_LEN,
        )
        .map_err(|e| PasswordError::invalid_argument(format!("Invalid scrypt parameters: {e}")))
    }

    fn derive(&self, secret: &[u8], salt: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let mut output = Zeroizing::new(vec![0u8; self.derived_key_length as usize]);
        scrypt(secret, salt, &self.params()?, &mut output)
            .map_err(|e| PasswordError::invalid_argument(format!("Scrypt derivation failed: {e}")))?;
        Ok(output)
    }

    fn parameter_word(&self) -> u64 {
        (u64::from(self.log_n) << 16)
            | (u64::from(self.resources) << 8)
            | u64::from(self.parallelization)
    }

    fn encode(&self, salt: &[u8], derived: &[u8]) -> String {
        format!(
            "${:x}${}${}",
            self.parameter_word(),
            STANDARD_LENIENT.encode(salt),
            STANDARD_LENIENT.encode(derived)
        )
    }
}

struct Parsed {
    function: ScryptFunction,
    salt: Vec<u8>,
    derived: Vec<u8>,
}

impl Parsed {
    fn parse(encoded: &str) -> Result<Self> {
        let malformed = || PasswordError::malformed_hash(format!("`{encoded}` is not a scrypt hash"));
        let parts = dollar_parts(encoded).ok_or_else(malformed)?;
        if parts.len() != 4 {
            return Err(malformed());
        }

        let word = u64::from_str_radix(parts[1], 16).map_err(|_| malformed())?;
        let log_n = (word >> 16) & 0xffff;
        if log_n > u64::from(MAX_LOG_N) {
            return Err(malformed());
        }
        let salt = decode_base64(&STANDARD_LENIENT, parts[2], "salt")?;
        let derived = decode_base64(&STANDARD_LENIENT, parts[3], "hash")?;
        let length = u32::try_from(derived.len()).map_err(|_| malformed())?;

        let function = ScryptFunction::new(
            1u64 << log_n,
            ((word >> 8) & 0xff) as u32,
            (word & 0xff) as u32,
            length,
        )
        .map_err(|e| PasswordError::malformed_hash(e.to_string()))?;
        Ok(Self {
            function,
            salt,
            derived,
        })
    }
}

impl fmt::Display for ScryptFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scrypt[N={}, r={}, p={}, l={}]",
            self.work_factor(),
            self.resources,
            self.parallelization,
            self.derived_key_length
        )
    }
}

impl HashingFunction for ScryptFunction {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Scrypt
    }

    fn hash(
        &self,
        secret: &SecureString,
        salt: Option<&[u8]>,
        salts: &mut SaltGenerator,
    ) -> Result<HashOutput> {
        let salt = match salt {
            Some(salt) => salt.to_vec(),
            None => salts.generate_default(),
        };
        let derived = self.derive(secret.expose_secret(), &salt)?;
        Ok(HashOutput {
            result: self.encode(&salt, &derived),
            salt: Some(salt),
        })
    }

    fn check(&self, secret: &SecureString, encoded: &str, _salt: Option<&[u8]>) -> Result<bool> {
        let parsed = Parsed::parse(encoded)?;
        let derived = parsed.function.derive(secret.expose_secret(), &parsed.salt)?;
        Ok(constant_time_eq(&derived, &parsed.derived))
    }
}
