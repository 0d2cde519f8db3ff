//! Plain message digests, hex encoded
//!
//! Not a password KDF. Kept for verifying and migrating legacy hashes.

use std::fmt;
use std::str::FromStr;

use digest::Digest;
use secrecy::ExposeSecret;
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512, Sha512_224, Sha512_256};
use sha3::{Sha3_224, Sha3_256, Sha3_384, Sha3_512};

use super::{constant_time_eq, Algorithm, HashOutput, HashingFunction};
use crate::random::SaltGenerator;
use crate::secure_string::SecureString;
use crate::{PasswordError, Result};

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    /// SHA-1
    Sha1,
    /// SHA-224
    Sha224,
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
    /// SHA-512/224
    Sha512_224,
    /// SHA-512/256
    Sha512_256,
    /// SHA3-224
    Sha3_224,
    /// SHA3-256
    Sha3_256,
    /// SHA3-384
    Sha3_384,
    /// SHA3-512
    Sha3_512,
}

impl DigestAlgorithm {
    /// Every supported algorithm
    pub const ALL: [DigestAlgorithm; 11] = [
        Self::Sha1,
        Self::Sha224,
        Self::Sha256,
        Self::Sha384,
        Self::Sha512,
        Self::Sha512_224,
        Self::Sha512_256,
        Self::Sha3_224,
        Self::Sha3_256,
        Self::Sha3_384,
        Self::Sha3_512,
    ];

    /// Standard name, e.g. `SHA-512/256`
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Sha1 => "SHA-1",
            Self::Sha224 => "SHA-224",
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
            Self::Sha512_224 => "SHA-512/224",
            Self::Sha512_256 => "SHA-512/256",
            Self::Sha3_224 => "SHA3-224",
            Self::Sha3_256 => "SHA3-256",
            Self::Sha3_384 => "SHA3-384",
            Self::Sha3_512 => "SHA3-512",
        }
    }

    /// Digest `input` with this algorithm
    #[must_use]
    pub fn digest(self, input: &[u8]) -> Vec<u8> {
        fn run<D: Digest>(input: &[u8]) -> Vec<u8> {
            D::digest(input).to_vec()
        }

        match self {
            Self::Sha1 => run::<Sha1>(input),
            Self::Sha224 => run::<Sha224>(input),
            Self::Sha256 => run::<Sha256>(input),
            Self::Sha384 => run::<Sha384>(input),
            Self::Sha512 => run::<Sha512>(input),
            Self::Sha512_224 => run::<Sha512_224>(input),
            Self::Sha512_256 => run::<Sha512_256>(input),
            Self::Sha3_224 => run::<Sha3_224>(input),
            Self::Sha3_256 => run::<Sha3_256>(input),
            Self::Sha3_384 => run::<Sha3_384>(input),
            Self::Sha3_512 => run::<Sha3_512>(input),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = PasswordError;

    /// Case-insensitive; `SHA1` and `SHA-1` are both accepted
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|algorithm| {
                algorithm.name() == wanted || algorithm.name().replacen('-', "", 1) == wanted
            })
            .ok_or_else(|| PasswordError::unsupported(format!("Unsupported message digest `{s}`")))
    }
}

/// Position of the salt relative to the secret
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SaltOption {
    /// `salt || secret`
    Prepend,
    /// `secret || salt`
    #[default]
    Append,
}

impl fmt::Display for SaltOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Prepend => "PREPEND",
            Self::Append => "APPEND",
        })
    }
}

impl FromStr for SaltOption {
    type Err = PasswordError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prepend" => Ok(Self::Prepend),
            "append" => Ok(Self::Append),
            _ => Err(PasswordError::unsupported(format!("Unknown salt option `{s}`"))),
        }
    }
}

/// Message digest over the secret with an optional salt folded in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDigestFunction {
    algorithm: DigestAlgorithm,
    salt_option: SaltOption,
}

impl MessageDigestFunction {
    /// Create a configuration
    #[must_use]
    pub fn new(algorithm: DigestAlgorithm, salt_option: SaltOption) -> Self {
        Self {
            algorithm,
            salt_option,
        }
    }

    /// Digest algorithm
    #[must_use]
    pub fn digest_algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Salt placement
    #[must_use]
    pub fn salt_option(&self) -> SaltOption {
        self.salt_option
    }

    fn encode(&self, secret: &SecureString, salt: Option<&[u8]>) -> String {
        let input = match (salt, self.salt_option) {
            (None, _) => secret.clone(),
            (Some(salt), SaltOption::Append) => SecureString::concat(secret.expose_secret(), salt),
            (Some(salt), SaltOption::Prepend) => SecureString::concat(salt, secret.expose_secret()),
        };
        hex::encode(self.algorithm.digest(input.expose_secret()))
    }
}

impl fmt::Display for MessageDigestFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageDigest[{}, {}]", self.algorithm, self.salt_option)
    }
}

impl HashingFunction for MessageDigestFunction {
    fn algorithm(&self) -> Algorithm {
        Algorithm::MessageDigest
    }

    fn hash(
        &self,
        secret: &SecureString,
        salt: Option<&[u8]>,
        _salts: &mut SaltGenerator,
    ) -> Result<HashOutput> {
        Ok(HashOutput {
            result: self.encode(secret, salt),
            salt: salt.map(<[u8]>::to_vec),
        })
    }

    fn check(&self, secret: &SecureString, encoded: &str, salt: Option<&[u8]>) -> Result<bool> {
        let expected = self.encode(secret, salt);
        Ok(constant_time_eq(expected.as_bytes(), encoded.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;
    use crate::random::SecureRandom;

    #[test]
    fn sha256_known_answer() {
        assert_eq!(
            DigestAlgorithm::Sha256.digest(b"abc"),
            hex!("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
    }

    #[test]
    fn salt_placement() -> Result<()> {
        let mut salts = SaltGenerator::new(SecureRandom::default_source());
        let secret = SecureString::from("password");
        let append = MessageDigestFunction::new(DigestAlgorithm::Sha512, SaltOption::Append);
        let prepend = MessageDigestFunction::new(DigestAlgorithm::Sha512, SaltOption::Prepend);

        let appended = append.hash(&secret, Some(b"salt"), &mut salts)?;
        let prepended = prepend.hash(&secret, Some(b"salt"), &mut salts)?;
        assert_eq!(appended.result, hex::encode(DigestAlgorithm::Sha512.digest(b"passwordsalt")));
        assert_eq!(prepended.result, hex::encode(DigestAlgorithm::Sha512.digest(b"saltpassword")));
        assert_eq!(appended.salt.as_deref(), Some(&b"salt"[..]));
        Ok(())
    }

    #[test]
    fn unsalted_hash_is_plain_digest() -> Result<()> {
        let mut salts = SaltGenerator::new(SecureRandom::default_source());
        let function = MessageDigestFunction::new(DigestAlgorithm::Sha1, SaltOption::Append);
        let output = function.hash(&SecureString::from("abc"), None, &mut salts)?;
        assert_eq!(output.result, "a9993e364706816aba3e25717850c26c9cd0d89d");
        assert!(output.salt.is_none());
        assert!(function.check(&SecureString::from("abc"), &output.result, None)?);
        assert!(!function.check(&SecureString::from("abc"), &output.result, Some(b"x"))?);
        Ok(())
    }

    #[test]
    fn names() {
        for algorithm in DigestAlgorithm::ALL {
            assert_eq!(algorithm.name().parse::<DigestAlgorithm>().ok(), Some(algorithm));
        }
        assert_eq!("sha512".parse::<DigestAlgorithm>().ok(), Some(DigestAlgorithm::Sha512));
        assert_eq!("sha3256".parse::<DigestAlgorithm>().ok(), Some(DigestAlgorithm::Sha3_256));
        assert!("MD5".parse::<DigestAlgorithm>().unwrap_err().is_unsupported());
        assert_eq!(DigestAlgorithm::Sha512_256.digest(b"").len(), 32);
    }
}
