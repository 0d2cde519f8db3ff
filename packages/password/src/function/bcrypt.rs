//! Bcrypt in modular crypt format: `$<version>$<cost>$<22-char salt><31-char hash>`

use std::fmt;
use std::str::FromStr;

use ::bcrypt::{hash_with_salt, Version};
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use secrecy::ExposeSecret;

use super::{constant_time_eq, dollar_parts, Algorithm, HashOutput, HashingFunction};
use crate::random::SaltGenerator;
use crate::secure_string::SecureString;
use crate::{PasswordError, Result};

const SALT_BYTES: usize = 16;
const SALT_CHARS: usize = 22;
const HASH_CHARS: usize = 31;

/// Lowest accepted cost factor
pub const MIN_COST: u32 = 4;
/// Highest accepted cost factor
pub const MAX_COST: u32 = 31;

const BCRYPT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::BCRYPT,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone)
        .with_decode_allow_trailing_bits(true),
);

/// Bcrypt minor version tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BcryptVersion {
    /// `$2a$`
    A,
    /// `$2b$`
    #[default]
    B,
    /// `$2x$`
    X,
    /// `$2y$`
    Y,
}

impl BcryptVersion {
    /// Tag as it appears in the encoded hash, e.g. `2b`
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::A => "2a",
            Self::B => "2b",
            Self::X => "2x",
            Self::Y => "2y",
        }
    }

    /// Parse a version from its tag (`2b`)
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "2a" => Some(Self::A),
            "2b" => Some(Self::B),
            "2x" => Some(Self::X),
            "2y" => Some(Self::Y),
            _ => None,
        }
    }
}

impl From<BcryptVersion> for Version {
    fn from(version: BcryptVersion) -> Self {
        match version {
            BcryptVersion::A => Version::TwoA,
            BcryptVersion::B => Version::TwoB,
            BcryptVersion::X => Version::TwoX,
            BcryptVersion::Y => Version::TwoY,
        }
    }
}

impl FromStr for BcryptVersion {
    type Err = PasswordError;

    /// Accepts the minor letter (`b`) or the full tag (`2b`)
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim().to_ascii_lowercase();
        let tag = if trimmed.len() == 1 {
            format!("2{trimmed}")
        } else {
            trimmed
        };
        Self::from_tag(&tag)
            .ok_or_else(|| PasswordError::unsupported(format!("Unknown bcrypt version `{s}`")))
    }
}

/// Bcrypt with a fixed version and cost
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BcryptFunction {
    version: BcryptVersion,
    cost: u32,
}

impl BcryptFunction {
    /// Create a configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when `cost` is outside `4..=31`.
    pub fn new(version: BcryptVersion, cost: u32) -> Result<Self> {
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(PasswordError::invalid_argument(format!(
                "Bcrypt cost must be between {MIN_COST} and {MAX_COST}, got {cost}"
            )));
        }
        Ok(Self { version, cost })
    }

    /// Reconstruct the configuration that produced `encoded`
    ///
    /// # Errors
    ///
    /// Returns `MalformedHash` when `encoded` is not a bcrypt string.
    pub fn from_hash(encoded: &str) -> Result<Self> {
        Ok(Parsed::parse(encoded)?.function)
    }

    /// Minor version
    #[must_use]
    pub fn version(&self) -> BcryptVersion {
        self.version
    }

    /// Cost factor
    #[must_use]
    pub fn cost(&self) -> u32 {
        self.cost
    }

    fn encode(&self, secret: &SecureString, salt: [u8; SALT_BYTES]) -> Result<String> {
        let parts = hash_with_salt(secret.expose_secret(), self.cost, salt)
            .map_err(|e| PasswordError::invalid_argument(format!("Bcrypt hashing failed: {e}")))?;
        Ok(parts.format_for_version(self.version.into()))
    }
}

/// Interpret caller-supplied salt bytes as a bcrypt salt
///
/// Accepts 16 raw bytes, 22 bcrypt-base64 characters, or a modular crypt
/// prefix such as `$2a$07$W3mOfB5auMDG3EitumH0S.`. Any other input longer
/// than 16 bytes contributes its first 16 bytes.
fn salt_from_bytes(salt: &[u8]) -> Result<[u8; SALT_BYTES]> {
    if let Ok(raw) = <[u8; SALT_BYTES]>::try_from(salt) {
        return Ok(raw);
    }

    let invalid = || {
        PasswordError::invalid_argument(format!(
            "Bcrypt salt must be at least {SALT_BYTES} bytes, {SALT_CHARS} bcrypt-base64 characters or a `$2?$NN$` salt string"
        ))
    };
    let text = std::str::from_utf8(salt).ok();
    if let Some(text) = text.filter(|text| text.starts_with('$')) {
        return match dollar_parts(text) {
            Some(parts) if parts.len() == 4 && BcryptVersion::from_tag(parts[1]).is_some() => {
                let encoded = parts[3].get(..SALT_CHARS).ok_or_else(invalid)?;
                decode_salt(encoded).map_err(|_| invalid())
            }
            _ => Err(invalid()),
        };
    }
    if let Some(decoded) = text
        .filter(|text| text.len() == SALT_CHARS)
        .and_then(|text| decode_salt(text).ok())
    {
        return Ok(decoded);
    }
    salt.get(..SALT_BYTES)
        .and_then(|head| <[u8; SALT_BYTES]>::try_from(head).ok())
        .ok_or_else(invalid)
}

fn decode_salt(encoded: &str) -> Result<[u8; SALT_BYTES]> {
    let decoded = BCRYPT_BASE64
        .decode(encoded)
        .map_err(|e| PasswordError::malformed_hash(format!("Invalid bcrypt salt: {e}")))?;
    <[u8; SALT_BYTES]>::try_from(decoded.as_slice())
        .map_err(|_| PasswordError::malformed_hash("Bcrypt salt must decode to 16 bytes"))
}

struct Parsed {
    function: BcryptFunction,
    salt: [u8; SALT_BYTES],
}

impl Parsed {
    fn parse(encoded: &str) -> Result<Self> {
        let malformed = || PasswordError::malformed_hash(format!("`{encoded}` is not a bcrypt hash"));
        let parts = dollar_parts(encoded).ok_or_else(malformed)?;
        if parts.len() != 4
            || parts[2].len() != 2
            || parts[3].len() != SALT_CHARS + HASH_CHARS
            || !parts[3].is_ascii()
        {
            return Err(malformed());
        }

        let version = BcryptVersion::from_tag(parts[1]).ok_or_else(malformed)?;
        let cost: u32 = parts[2].parse().map_err(|_| malformed())?;
        let function =
            BcryptFunction::new(version, cost).map_err(|e| PasswordError::malformed_hash(e.to_string()))?;
        Ok(Self {
            function,
            salt: decode_salt(&parts[3][..SALT_CHARS])?,
        })
    }
}

impl fmt::Display for BcryptFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bcrypt[v={}, c={}]", self.version.tag(), self.cost)
    }
}

impl HashingFunction for BcryptFunction {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Bcrypt
    }

    fn hash(
        &self,
        secret: &SecureString,
        salt: Option<&[u8]>,
        salts: &mut SaltGenerator,
    ) -> Result<HashOutput> {
        let salt = match salt {
            Some(salt) => salt_from_bytes(salt)?,
            None => salt_from_bytes(&salts.fill(SALT_BYTES))?,
        };
        Ok(HashOutput {
            result: self.encode(secret, salt)?,
            salt: Some(salt.to_vec()),
        })
    }

    fn check(&self, secret: &SecureString, encoded: &str, _salt: Option<&[u8]>) -> Result<bool> {
        let parsed = Parsed::parse(encoded)?;
        let expected = parsed.function.encode(secret, parsed.salt)?;
        Ok(constant_time_eq(expected.as_bytes(), encoded.as_bytes()))
    }
}
