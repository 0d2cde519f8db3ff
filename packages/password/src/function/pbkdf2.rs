//! PBKDF2 with the salt tracked outside the encoded result

use std::fmt;
use std::str::FromStr;

use ::pbkdf2::pbkdf2_hmac;
use base64::Engine as _;
use secrecy::ExposeSecret;
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};
use zeroize::Zeroizing;

use super::{constant_time_eq, positive, Algorithm, HashOutput, HashingFunction, STANDARD_LENIENT};
use crate::random::SaltGenerator;
use crate::secure_string::SecureString;
use crate::{PasswordError, Result};

/// HMAC pseudo-random function used by PBKDF2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hmac {
    /// HMAC-SHA-1
    Sha1,
    /// HMAC-SHA-224
    Sha224,
    /// HMAC-SHA-256
    Sha256,
    /// HMAC-SHA-384
    Sha384,
    /// HMAC-SHA-512
    Sha512,
}

impl Hmac {
    /// All variants in code order
    pub const ALL: [Hmac; 5] = [Self::Sha1, Self::Sha224, Self::Sha256, Self::Sha384, Self::Sha512];

    /// Numeric code used by the compressed PBKDF2 format
    #[must_use]
    pub fn code(self) -> u32 {
        match self {
            Self::Sha1 => 1,
            Self::Sha224 => 2,
            Self::Sha256 => 3,
            Self::Sha384 => 4,
            Self::Sha512 => 5,
        }
    }

    /// Inverse of [`Hmac::code`]
    #[must_use]
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|hmac| hmac.code() == code)
    }

    /// Natural output size in bits
    #[must_use]
    pub fn bits(self) -> u32 {
        match self {
            Self::Sha1 => 160,
            Self::Sha224 => 224,
            Self::Sha256 => 256,
            Self::Sha384 => 384,
            Self::Sha512 => 512,
        }
    }

    /// Short name, e.g. `SHA512`
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Sha1 => "SHA1",
            Self::Sha224 => "SHA224",
            Self::Sha256 => "SHA256",
            Self::Sha384 => "SHA384",
            Self::Sha512 => "SHA512",
        }
    }

    fn derive(self, secret: &[u8], salt: &[u8], iterations: u32, output: &mut [u8]) {
        match self {
            Self::Sha1 => pbkdf2_hmac::<Sha1>(secret, salt, iterations, output),
            Self::Sha224 => pbkdf2_hmac::<Sha224>(secret, salt, iterations, output),
            Self::Sha256 => pbkdf2_hmac::<Sha256>(secret, salt, iterations, output),
            Self::Sha384 => pbkdf2_hmac::<Sha384>(secret, salt, iterations, output),
            Self::Sha512 => pbkdf2_hmac::<Sha512>(secret, salt, iterations, output),
        }
    }
}

impl fmt::Display for Hmac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PBKDF2WithHmac{}", self.name())
    }
}

impl FromStr for Hmac {
    type Err = PasswordError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "");
        Self::ALL
            .into_iter()
            .find(|hmac| hmac.name() == normalized)
            .ok_or_else(|| PasswordError::unsupported(format!("Unknown PBKDF2 HMAC `{s}`")))
    }
}

/// PBKDF2 whose result is the base64 derived key alone
///
/// The salt is not embedded; callers keep it next to the result (the
/// [`crate::Hash`] records it) and must supply it again to verify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pbkdf2Function {
    hmac: Hmac,
    iterations: u32,
    length: u32,
}

impl Pbkdf2Function {
    /// Create a configuration. `length` is the derived key size in bits.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for zero iterations, a zero length or a
    /// length that is not a whole number of bytes.
    pub fn new(hmac: Hmac, iterations: u32, length: u32) -> Result<Self> {
        positive(iterations, "PBKDF2 iterations")?;
        positive(length, "PBKDF2 key length")?;
        if length % 8 != 0 {
            return Err(PasswordError::invalid_argument(format!(
                "PBKDF2 key length must be a multiple of 8 bits, got {length}"
            )));
        }
        Ok(Self {
            hmac,
            iterations,
            length,
        })
    }

    /// HMAC variant
    #[must_use]
    pub fn hmac(&self) -> Hmac {
        self.hmac
    }

    /// Iteration count
    #[must_use]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Derived key length in bits
    #[must_use]
    pub fn length(&self) -> u32 {
        self.length
    }

    pub(crate) fn derive(&self, secret: &[u8], salt: &[u8]) -> Zeroizing<Vec<u8>> {
        let mut output = Zeroizing::new(vec![0u8; (self.length / 8) as usize]);
        self.hmac.derive(secret, salt, self.iterations, &mut output);
        output
    }

    fn encode_derived(&self, secret: &SecureString, salt: &[u8]) -> String {
        STANDARD_LENIENT.encode(self.derive(secret.expose_secret(), salt).as_slice())
    }
}

impl fmt::Display for Pbkdf2Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[i={}, l={}]", self.hmac, self.iterations, self.length)
    }
}

impl HashingFunction for Pbkdf2Function {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Pbkdf2
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
        Ok(HashOutput {
            result: self.encode_derived(secret, &salt),
            salt: Some(salt),
        })
    }

    fn check(&self, secret: &SecureString, encoded: &str, salt: Option<&[u8]>) -> Result<bool> {
        let salt = salt.ok_or_else(|| {
            PasswordError::invalid_argument("PBKDF2 verification requires the original salt")
        })?;
        let expected = self.encode_derived(secret, salt);
        Ok(constant_time_eq(expected.as_bytes(), encoded.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SecureRandom;

    #[test]
    fn hmac_names_and_codes() {
        for hmac in Hmac::ALL {
            assert_eq!(hmac.to_string(), format!("PBKDF2WithHmac{}", hmac.name()));
            assert_eq!(Hmac::from_code(hmac.code()), Some(hmac));
            assert_eq!(hmac.name().parse::<Hmac>().ok(), Some(hmac));
        }
        assert_eq!("sha-256".parse::<Hmac>().ok(), Some(Hmac::Sha256));
        assert!("MD5".parse::<Hmac>().unwrap_err().is_unsupported());
    }

    #[test]
    fn rfc6070_sha1_vector() -> Result<()> {
        // RFC 6070, test case 2
        let function = Pbkdf2Function::new(Hmac::Sha1, 2, 160)?;
        let derived = function.derive(b"password", b"salt");
        assert_eq!(hex::encode(derived.as_slice()), "ea6c014dc72d6f8ccd1ed92ace1d41f0d8de8957");
        Ok(())
    }

    #[test]
    fn check_requires_salt() -> Result<()> {
        let function = Pbkdf2Function::new(Hmac::Sha256, 10, 256)?;
        let mut salts = SaltGenerator::new(SecureRandom::default_source());
        let secret = SecureString::from("password");
        let output = function.hash(&secret, Some(b"salt"), &mut salts)?;

        assert!(function.check(&secret, &output.result, Some(b"salt"))?);
        assert!(!function.check(&secret, &output.result, Some(b"other"))?);
        assert!(function.check(&secret, &output.result, None).unwrap_err().is_invalid_argument());
        Ok(())
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(Pbkdf2Function::new(Hmac::Sha256, 0, 256).is_err());
        assert!(Pbkdf2Function::new(Hmac::Sha256, 1, 0).is_err());
        assert!(Pbkdf2Function::new(Hmac::Sha256, 1, 12).is_err());
    }
}
