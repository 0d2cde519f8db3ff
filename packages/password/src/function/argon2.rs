//! Argon2 in PHC string format
//!
//! Grammar: `$argon2<type>$v=<version>$m=<KiB>,t=<passes>,p=<lanes>$<b64 salt>$<b64 hash>`,
//! base64 without padding. The `v=` segment may be absent, meaning version 16.

use std::fmt;
use std::str::FromStr;

use ::argon2::{Algorithm as Argon2Algorithm, Argon2, Params, Version};
use base64::Engine as _;
use secrecy::ExposeSecret;
use zeroize::Zeroizing;

use super::{
    constant_time_eq, decode_base64, dollar_parts, Algorithm, HashOutput, HashingFunction,
    STANDARD_NO_PAD_LENIENT,
};
use crate::random::SaltGenerator;
use crate::secure_string::SecureString;
use crate::{PasswordError, Result};

/// Version 1.0
pub const VERSION_10: u32 = 16;
/// Version 1.3
pub const VERSION_13: u32 = 19;

/// Argon2 variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Argon2Type {
    /// Data-dependent addressing
    D,
    /// Data-independent addressing
    I,
    /// Hybrid
    #[default]
    ID,
}

impl Argon2Type {
    /// Identifier used in the PHC string, e.g. `argon2id`
    #[must_use]
    pub fn identifier(self) -> &'static str {
        match self {
            Self::D => "argon2d",
            Self::I => "argon2i",
            Self::ID => "argon2id",
        }
    }

    /// Inverse of [`Argon2Type::identifier`]
    #[must_use]
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        match identifier {
            "argon2d" => Some(Self::D),
            "argon2i" => Some(Self::I),
            "argon2id" => Some(Self::ID),
            _ => None,
        }
    }
}

impl From<Argon2Type> for Argon2Algorithm {
    fn from(variant: Argon2Type) -> Self {
        match variant {
            Argon2Type::D => Argon2Algorithm::Argon2d,
            Argon2Type::I => Argon2Algorithm::Argon2i,
            Argon2Type::ID => Argon2Algorithm::Argon2id,
        }
    }
}

impl FromStr for Argon2Type {
    type Err = PasswordError;

    /// Accepts `d`, `i`, `id` or the full identifier, case-insensitively
    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        let identifier = if lowered.starts_with("argon2") {
            lowered
        } else {
            format!("argon2{lowered}")
        };
        Self::from_identifier(&identifier)
            .ok_or_else(|| PasswordError::unsupported(format!("Unknown Argon2 type `{s}`")))
    }
}

impl fmt::Display for Argon2Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// Argon2 with fixed cost parameters, variant and version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argon2Function {
    memory: u32,
    iterations: u32,
    parallelism: u32,
    output_length: u32,
    variant: Argon2Type,
    version: u32,
}

impl Argon2Function {
    /// Create a configuration. `memory` is in KiB, `output_length` in bytes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the primitive rejects the cost
    /// parameters (for example memory below `8 * parallelism`) or `version`
    /// is neither 16 nor 19.
    pub fn new(
        memory: u32,
        iterations: u32,
        parallelism: u32,
        output_length: u32,
        variant: Argon2Type,
        version: u32,
    ) -> Result<Self> {
        let function = Self {
            memory,
            iterations,
            parallelism,
            output_length,
            variant,
            version,
        };
        function.context()?;
        Ok(function)
    }

    /// Reconstruct the configuration that produced `encoded`
    ///
    /// # Errors
    ///
    /// Returns `MalformedHash` when `encoded` is not an Argon2 PHC string.
    pub fn from_hash(encoded: &str) -> Result<Self> {
        Ok(Parsed::parse(encoded)?.function)
    }

    /// Memory cost in KiB
    #[must_use]
    pub fn memory(&self) -> u32 {
        self.memory
    }

    /// Number of passes
    #[must_use]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Number of lanes
    #[must_use]
    pub fn parallelism(&self) -> u32 {
        self.parallelism
    }

    /// Output length in bytes
    #[must_use]
    pub fn output_length(&self) -> u32 {
        self.output_length
    }

    /// Variant
    #[must_use]
    pub fn variant(&self) -> Argon2Type {
        self.variant
    }

    /// Version number (16 or 19)
    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    fn context(&self) -> Result<Argon2<'static>> {
        let version = match self.version {
            VERSION_10 => Version::V0x10,
            VERSION_13 => Version::V0x13,
            other => {
                return Err(PasswordError::invalid_argument(format!(
                    "Argon2 version must be {VERSION_10} or {VERSION_13}, got {other}"
                )))
            }
        };
        let params = Params::new(
            self.memory,
            self.iterations,
            self.parallelism,
            Some(self.output_length as usize),
        )
        .map_err(|e| PasswordError::invalid_argument(format!("Invalid Argon2 parameters: {e}")))?;
        Ok(Argon2::new(self.variant.into(), version, params))
    }

    fn derive(&self, secret: &[u8], salt: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let mut output = Zeroizing::new(vec![0u8; self.output_length as usize]);
        self.context()?
            .hash_password_into(secret, salt, &mut output)
            .map_err(|e| PasswordError::invalid_argument(format!("Argon2 derivation failed: {e}")))?;
        Ok(output)
    }

    fn encode(&self, salt: &[u8], derived: &[u8]) -> String {
        format!(
            "${}$v={}$m={},t={},p={}${}${}",
            self.variant.identifier(),
            self.version,
            self.memory,
            self.iterations,
            self.parallelism,
            STANDARD_NO_PAD_LENIENT.encode(salt),
            STANDARD_NO_PAD_LENIENT.encode(derived)
        )
    }
}

struct Parsed {
    function: Argon2Function,
    salt: Vec<u8>,
    derived: Vec<u8>,
}

impl Parsed {
    fn parse(encoded: &str) -> Result<Self> {
        let malformed = || PasswordError::malformed_hash(format!("`{encoded}` is not an Argon2 hash"));
        let parts = dollar_parts(encoded).ok_or_else(malformed)?;
        let (version, rest) = match parts.len() {
            6 => {
                let version = parts[2]
                    .strip_prefix("v=")
                    .and_then(|v| v.parse::<u32>().ok())
                    .ok_or_else(malformed)?;
                (version, &parts[3..])
            }
            5 => (VERSION_10, &parts[2..]),
            _ => return Err(malformed()),
        };

        let variant = Argon2Type::from_identifier(parts[1]).ok_or_else(malformed)?;
        let (mut memory, mut iterations, mut parallelism) = (None, None, None);
        for pair in rest[0].split(',') {
            let (key, value) = pair.split_once('=').ok_or_else(malformed)?;
            let value: u32 = value.parse().map_err(|_| malformed())?;
            match key {
                "m" => memory = Some(value),
                "t" => iterations = Some(value),
                "p" => parallelism = Some(value),
                _ => return Err(malformed()),
            }
        }
        let (Some(memory), Some(iterations), Some(parallelism)) = (memory, iterations, parallelism)
        else {
            return Err(malformed());
        };

        let salt = decode_base64(&STANDARD_NO_PAD_LENIENT, rest[1], "salt")?;
        let derived = decode_base64(&STANDARD_NO_PAD_LENIENT, rest[2], "hash")?;
        let output_length = u32::try_from(derived.len()).map_err(|_| malformed())?;

        let function = Argon2Function::new(memory, iterations, parallelism, output_length, variant, version)
            .map_err(|e| PasswordError::malformed_hash(e.to_string()))?;
        Ok(Self {
            function,
            salt,
            derived,
        })
    }
}

impl fmt::Display for Argon2Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Argon2[m={}, t={}, p={}, l={}, type={}, v={}]",
            self.memory,
            self.iterations,
            self.parallelism,
            self.output_length,
            self.variant,
            self.version
        )
    }
}

impl HashingFunction for Argon2Function {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Argon2
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SecureRandom;

    const REFERENCE: &str =
        "$argon2i$v=19$m=65536,t=2,p=4$c29tZXNhbHQ$RdescudvJCsgt3ub+b+dWRWJTmaaJObG";

    #[test]
    fn parses_reference_hash() -> Result<()> {
        let function = Argon2Function::from_hash(REFERENCE)?;
        assert_eq!(function, Argon2Function::new(65536, 2, 4, 24, Argon2Type::I, VERSION_13)?);
        assert_eq!(function.to_string(), "Argon2[m=65536, t=2, p=4, l=24, type=argon2i, v=19]");
        Ok(())
    }

    #[test]
    fn verifies_reference_hash() -> Result<()> {
        let function = Argon2Function::new(1024, 1, 1, 32, Argon2Type::ID, VERSION_13)?;
        assert!(function.check(&SecureString::from("password"), REFERENCE, None)?);
        assert!(!function.check(&SecureString::from("passw0rd"), REFERENCE, None)?);
        Ok(())
    }

    #[test]
    fn salt_is_reproducible() -> Result<()> {
        let function = Argon2Function::new(1024, 2, 1, 32, Argon2Type::D, VERSION_10)?;
        let mut salts = SaltGenerator::new(SecureRandom::default_source());
        let secret = SecureString::from("password");
        let first = function.hash(&secret, Some(b"saltsalt"), &mut salts)?;
        let second = function.hash(&secret, Some(b"saltsalt"), &mut salts)?;

        assert_eq!(first.result, second.result);
        assert!(first.result.starts_with("$argon2d$v=16$m=1024,t=2,p=1$c2FsdHNhbHQ$"));
        assert!(function.check(&secret, &first.result, None)?);
        Ok(())
    }

    #[test]
    fn short_salt_is_rejected() -> Result<()> {
        let function = Argon2Function::new(1024, 1, 1, 32, Argon2Type::ID, VERSION_13)?;
        let mut salts = SaltGenerator::new(SecureRandom::default_source());
        let err = function.hash(&SecureString::from("password"), Some(b"salt"), &mut salts).unwrap_err();
        assert!(err.is_invalid_argument());
        Ok(())
    }

    #[test]
    fn missing_version_means_v16() -> Result<()> {
        let function = Argon2Function::from_hash("$argon2id$m=1024,t=1,p=1$c2FsdHNhbHQ$aGFzaGhhc2hoYXNoaGFzaA")?;
        assert_eq!(function.version(), VERSION_10);
        Ok(())
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(Argon2Function::new(1024, 1, 1, 32, Argon2Type::ID, 18).unwrap_err().is_invalid_argument());
        assert!(Argon2Function::new(1024, 0, 1, 32, Argon2Type::ID, VERSION_13).unwrap_err().is_invalid_argument());
        assert!(Argon2Function::new(4, 1, 1, 32, Argon2Type::ID, VERSION_13).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn malformed_inputs() {
        for bad in [
            "",
            "$argon2x$v=19$m=1024,t=1,p=1$c2FsdHNhbHQ$aGFzaA",
            "$argon2id$v=19$m=1024,t=1$c2FsdHNhbHQ$aGFzaA",
            "$argon2id$v=nineteen$m=1024,t=1,p=1$c2FsdHNhbHQ$aGFzaA",
            "$argon2id$v=19$m=1024,t=1,p=1,q=2$c2FsdHNhbHQ$aGFzaA",
        ] {
            assert!(Argon2Function::from_hash(bad).unwrap_err().is_malformed_hash(), "{bad}");
        }
    }

    #[test]
    fn type_names() {
        assert_eq!("id".parse::<Argon2Type>().ok(), Some(Argon2Type::ID));
        assert_eq!("ARGON2D".parse::<Argon2Type>().ok(), Some(Argon2Type::D));
        assert!("x".parse::<Argon2Type>().unwrap_err().is_unsupported());
    }
}
