//! PBKDF2 whose result carries every parameter needed for verification
//!
//! Grammar: `$<hmac code>$<(iterations << 32) | length bits>$<b64 salt>$<b64 hash>`

use std::fmt;

use base64::Engine as _;
use secrecy::ExposeSecret;

use super::pbkdf2::{Hmac, Pbkdf2Function};
use super::{
    constant_time_eq, decode_base64, dollar_parts, Algorithm, HashOutput, HashingFunction,
    STANDARD_LENIENT,
};
use crate::random::SaltGenerator;
use crate::secure_string::SecureString;
use crate::{PasswordError, Result};

/// Self-describing PBKDF2
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedPbkdf2Function {
    inner: Pbkdf2Function,
}

impl CompressedPbkdf2Function {
    /// Create a configuration. `length` is the derived key size in bits.
    ///
    /// # Errors
    ///
    /// Same preconditions as [`Pbkdf2Function::new`].
    pub fn new(hmac: Hmac, iterations: u32, length: u32) -> Result<Self> {
        Ok(Self {
            inner: Pbkdf2Function::new(hmac, iterations, length)?,
        })
    }

    /// Reconstruct the configuration that produced `encoded`
    ///
    /// # Errors
    ///
    /// Returns `MalformedHash` when `encoded` does not follow the grammar or
    /// names an unknown HMAC code.
    pub fn from_hash(encoded: &str) -> Result<Self> {
        Ok(Parsed::parse(encoded)?.function)
    }

    /// HMAC variant
    #[must_use]
    pub fn hmac(&self) -> Hmac {
        self.inner.hmac()
    }

    /// Iteration count
    #[must_use]
    pub fn iterations(&self) -> u32 {
        self.inner.iterations()
    }

    /// Derived key length in bits
    #[must_use]
    pub fn length(&self) -> u32 {
        self.inner.length()
    }

    fn encode(&self, salt: &[u8], derived: &[u8]) -> String {
        let params = (u64::from(self.iterations()) << 32) | u64::from(self.length());
        format!(
            "${}${}${}${}",
            self.hmac().code(),
            params,
            STANDARD_LENIENT.encode(salt),
            STANDARD_LENIENT.encode(derived)
        )
    }
}

struct Parsed {
    function: CompressedPbkdf2Function,
    salt: Vec<u8>,
    derived: Vec<u8>,
}

impl Parsed {
    fn parse(encoded: &str) -> Result<Self> {
        let malformed =
            || PasswordError::malformed_hash(format!("`{encoded}` is not a compressed PBKDF2 hash"));
        let parts = dollar_parts(encoded).ok_or_else(malformed)?;
        if parts.len() != 5 {
            return Err(malformed());
        }

        let code: u32 = parts[1].parse().map_err(|_| malformed())?;
        let hmac = Hmac::from_code(code)
            .ok_or_else(|| PasswordError::malformed_hash(format!("Unknown HMAC code {code}")))?;
        let params: u64 = parts[2].parse().map_err(|_| malformed())?;
        let iterations = (params >> 32) as u32;
        let length = (params & 0xffff_ffff) as u32;

        let function = CompressedPbkdf2Function::new(hmac, iterations, length)
            .map_err(|e| PasswordError::malformed_hash(e.to_string()))?;
        Ok(Self {
            function,
            salt: decode_base64(&STANDARD_LENIENT, parts[3], "salt")?,
            derived: decode_base64(&STANDARD_LENIENT, parts[4], "hash")?,
        })
    }
}

impl fmt::Display for CompressedPbkdf2Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Compressed{}[i={}, l={}]",
            self.hmac(),
            self.iterations(),
            self.length()
        )
    }
}

impl HashingFunction for CompressedPbkdf2Function {
    fn algorithm(&self) -> Algorithm {
        Algorithm::CompressedPbkdf2
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
        let derived = self.inner.derive(secret.expose_secret(), &salt);
        Ok(HashOutput {
            result: self.encode(&salt, &derived),
            salt: Some(salt),
        })
    }

    fn check(&self, secret: &SecureString, encoded: &str, _salt: Option<&[u8]>) -> Result<bool> {
        let parsed = Parsed::parse(encoded)?;
        let derived = parsed.function.inner.derive(secret.expose_secret(), &parsed.salt);
        Ok(constant_time_eq(&derived, &parsed.derived))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SecureRandom;

    #[test]
    fn encoding_round_trips_parameters() -> Result<()> {
        let function = CompressedPbkdf2Function::new(Hmac::Sha256, 1000, 256)?;
        let mut salts = SaltGenerator::new(SecureRandom::default_source());
        let output = function.hash(&SecureString::from("pepperpassword"), Some(b"salt"), &mut salts)?;

        assert!(output.result.starts_with(&format!("$3${}$", (1000u64 << 32) | 256)));
        assert_eq!(CompressedPbkdf2Function::from_hash(&output.result)?, function);
        assert!(function.check(&SecureString::from("pepperpassword"), &output.result, None)?);
        assert!(!function.check(&SecureString::from("pepperpassworD"), &output.result, None)?);
        Ok(())
    }

    #[test]
    fn check_uses_embedded_parameters() -> Result<()> {
        let producer = CompressedPbkdf2Function::new(Hmac::Sha1, 3, 128)?;
        let verifier = CompressedPbkdf2Function::new(Hmac::Sha512, 10, 512)?;
        let mut salts = SaltGenerator::new(SecureRandom::default_source());
        let secret = SecureString::from("password");
        let output = producer.hash(&secret, None, &mut salts)?;
        assert!(verifier.check(&secret, &output.result, None)?);
        Ok(())
    }

    #[test]
    fn malformed_inputs() {
        for bad in ["", "hash", "$3$1$c2FsdA==", "$9$4294967552$c2FsdA==$aGFzaA==", "$3$x$c2FsdA==$aGFzaA==", "$3$256$c2FsdA==$aGFzaA=="] {
            let err = CompressedPbkdf2Function::from_hash(bad).unwrap_err();
            assert!(err.is_malformed_hash(), "{bad}");
        }
    }
}
