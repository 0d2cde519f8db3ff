//! Resolution and caching of configured hashing functions
//!
//! One finder is built at startup around a [`PropertyReader`] and passed to
//! the builders. Function instances are interned by their canonical
//! parameter string, so asking twice for the same configuration yields the
//! same `Arc`.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::config::{keys, PropertyReader};
use crate::function::argon2::VERSION_13;
use crate::function::{
    dollar_parts, Argon2Function, Argon2Type, BcryptFunction, BcryptVersion,
    CompressedPbkdf2Function, DigestAlgorithm, HashingFunction, Hmac, MessageDigestFunction,
    Pbkdf2Function, SaltOption, ScryptFunction,
};
use crate::generator::EntropyBasedPasswordGenerator;
use crate::random::{SaltGenerator, SecureRandom};
use crate::{PasswordError, Result};

const DEFAULT_PBKDF2_ALGORITHM: &str = "SHA512";
const DEFAULT_PBKDF2_ITERATIONS: i64 = 310_000;
const DEFAULT_PBKDF2_LENGTH: i64 = 512;
const DEFAULT_BCRYPT_MINOR: &str = "b";
const DEFAULT_BCRYPT_ROUNDS: i64 = 10;
const DEFAULT_SCRYPT_WORK_FACTOR: i64 = 65_536;
const DEFAULT_SCRYPT_RESOURCES: i64 = 8;
const DEFAULT_SCRYPT_PARALLELIZATION: i64 = 1;
const DEFAULT_SCRYPT_DERIVED_KEY_LENGTH: i64 = 64;
const DEFAULT_ARGON2_MEMORY: i64 = 15_360;
const DEFAULT_ARGON2_ITERATIONS: i64 = 2;
const DEFAULT_ARGON2_LENGTH: i64 = 32;
const DEFAULT_ARGON2_PARALLELISM: i64 = 1;
const DEFAULT_ARGON2_TYPE: &str = "id";
const DEFAULT_ARGON2_VERSION: i64 = VERSION_13 as i64;
const DEFAULT_MD_ALGORITHM: &str = "SHA-512";
const DEFAULT_MD_SALT_OPTION: &str = "append";

/// Registry of hashing functions, random sources and generators
pub struct AlgorithmFinder {
    properties: Arc<dyn PropertyReader>,
    pbkdf2: DashMap<String, Arc<Pbkdf2Function>>,
    compressed_pbkdf2: DashMap<String, Arc<CompressedPbkdf2Function>>,
    bcrypt: DashMap<String, Arc<BcryptFunction>>,
    scrypt: DashMap<String, Arc<ScryptFunction>>,
    argon2: DashMap<String, Arc<Argon2Function>>,
    message_digest: DashMap<String, Arc<MessageDigestFunction>>,
    generators: DashMap<u64, Arc<EntropyBasedPasswordGenerator>>,
}

/// Return the cached instance equal to `function`, inserting it on first use
fn intern<T: HashingFunction>(cache: &DashMap<String, Arc<T>>, function: T) -> Arc<T> {
    let key = function.to_string();
    let entry = cache.entry(key).or_insert_with(|| {
        debug!(function = %function, "Caching hashing function");
        Arc::new(function)
    });
    Arc::clone(entry.value())
}

impl AlgorithmFinder {
    /// Finder reading defaults from `properties`
    #[must_use]
    pub fn new(properties: impl PropertyReader + 'static) -> Self {
        Self::with_shared(Arc::new(properties))
    }

    /// Finder over an already shared reader
    #[must_use]
    pub fn with_shared(properties: Arc<dyn PropertyReader>) -> Self {
        Self {
            properties,
            pbkdf2: DashMap::new(),
            compressed_pbkdf2: DashMap::new(),
            bcrypt: DashMap::new(),
            scrypt: DashMap::new(),
            argon2: DashMap::new(),
            message_digest: DashMap::new(),
            generators: DashMap::new(),
        }
    }

    /// Configuration source
    #[must_use]
    pub fn properties(&self) -> &Arc<dyn PropertyReader> {
        &self.properties
    }

    fn u32_property(&self, key: &str, default: i64) -> Result<u32> {
        let value = self.properties.read_int(key, default);
        u32::try_from(value).map_err(|_| {
            PasswordError::invalid_argument(format!("Property `{key}` is out of range: {value}"))
        })
    }

    fn string_property(&self, key: &str, default: &str) -> String {
        self.properties
            .read_string(key, Some(default))
            .unwrap_or_else(|| default.to_owned())
    }

    /// PBKDF2 from `hash.pbkdf2.*`
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedConfiguration` for an unknown HMAC name and
    /// `InvalidArgument` for out-of-range parameters.
    pub fn pbkdf2(&self) -> Result<Arc<Pbkdf2Function>> {
        let hmac: Hmac = self.string_property(keys::PBKDF2_ALGORITHM, DEFAULT_PBKDF2_ALGORITHM).parse()?;
        let iterations = self.u32_property(keys::PBKDF2_ITERATIONS, DEFAULT_PBKDF2_ITERATIONS)?;
        let length = self.u32_property(keys::PBKDF2_LENGTH, DEFAULT_PBKDF2_LENGTH)?;
        self.pbkdf2_instance(hmac, iterations, length)
    }

    /// PBKDF2 with explicit parameters
    ///
    /// # Errors
    ///
    /// See [`Pbkdf2Function::new`].
    pub fn pbkdf2_instance(&self, hmac: Hmac, iterations: u32, length: u32) -> Result<Arc<Pbkdf2Function>> {
        Ok(intern(&self.pbkdf2, Pbkdf2Function::new(hmac, iterations, length)?))
    }

    /// Compressed PBKDF2 from `hash.pbkdf2.*`
    ///
    /// # Errors
    ///
    /// Same as [`AlgorithmFinder::pbkdf2`].
    pub fn compressed_pbkdf2(&self) -> Result<Arc<CompressedPbkdf2Function>> {
        let hmac: Hmac = self.string_property(keys::PBKDF2_ALGORITHM, DEFAULT_PBKDF2_ALGORITHM).parse()?;
        let iterations = self.u32_property(keys::PBKDF2_ITERATIONS, DEFAULT_PBKDF2_ITERATIONS)?;
        let length = self.u32_property(keys::PBKDF2_LENGTH, DEFAULT_PBKDF2_LENGTH)?;
        self.compressed_pbkdf2_instance(hmac, iterations, length)
    }

    /// Compressed PBKDF2 with explicit parameters
    ///
    /// # Errors
    ///
    /// See [`CompressedPbkdf2Function::new`].
    pub fn compressed_pbkdf2_instance(
        &self,
        hmac: Hmac,
        iterations: u32,
        length: u32,
    ) -> Result<Arc<CompressedPbkdf2Function>> {
        Ok(intern(
            &self.compressed_pbkdf2,
            CompressedPbkdf2Function::new(hmac, iterations, length)?,
        ))
    }

    /// Bcrypt from `hash.bcrypt.*`
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedConfiguration` for an unknown minor version and
    /// `InvalidArgument` for a cost outside `4..=31`.
    pub fn bcrypt(&self) -> Result<Arc<BcryptFunction>> {
        let version: BcryptVersion = self.string_property(keys::BCRYPT_MINOR, DEFAULT_BCRYPT_MINOR).parse()?;
        let cost = self.u32_property(keys::BCRYPT_ROUNDS, DEFAULT_BCRYPT_ROUNDS)?;
        self.bcrypt_instance(version, cost)
    }

    /// Bcrypt with explicit parameters
    ///
    /// # Errors
    ///
    /// See [`BcryptFunction::new`].
    pub fn bcrypt_instance(&self, version: BcryptVersion, cost: u32) -> Result<Arc<BcryptFunction>> {
        Ok(intern(&self.bcrypt, BcryptFunction::new(version, cost)?))
    }

    /// Scrypt from `hash.scrypt.*`
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for out-of-range parameters.
    pub fn scrypt(&self) -> Result<Arc<ScryptFunction>> {
        let work_factor = self.properties.read_int(keys::SCRYPT_WORK_FACTOR, DEFAULT_SCRYPT_WORK_FACTOR);
        let work_factor = u64::try_from(work_factor).map_err(|_| {
            PasswordError::invalid_argument(format!(
                "Property `{}` is out of range: {work_factor}",
                keys::SCRYPT_WORK_FACTOR
            ))
        })?;
        let resources = self.u32_property(keys::SCRYPT_RESOURCES, DEFAULT_SCRYPT_RESOURCES)?;
        let parallelization = self.u32_property(keys::SCRYPT_PARALLELIZATION, DEFAULT_SCRYPT_PARALLELIZATION)?;
        let length = self.u32_property(keys::SCRYPT_DERIVED_KEY_LENGTH, DEFAULT_SCRYPT_DERIVED_KEY_LENGTH)?;
        self.scrypt_instance(work_factor, resources, parallelization, length)
    }

    /// Scrypt with explicit parameters
    ///
    /// # Errors
    ///
    /// See [`ScryptFunction::new`].
    pub fn scrypt_instance(
        &self,
        work_factor: u64,
        resources: u32,
        parallelization: u32,
        derived_key_length: u32,
    ) -> Result<Arc<ScryptFunction>> {
        Ok(intern(
            &self.scrypt,
            ScryptFunction::new(work_factor, resources, parallelization, derived_key_length)?,
        ))
    }

    /// Argon2 from `hash.argon2.*`
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedConfiguration` for an unknown variant and
    /// `InvalidArgument` for parameters the primitive rejects.
    pub fn argon2(&self) -> Result<Arc<Argon2Function>> {
        let memory = self.u32_property(keys::ARGON2_MEMORY, DEFAULT_ARGON2_MEMORY)?;
        let iterations = self.u32_property(keys::ARGON2_ITERATIONS, DEFAULT_ARGON2_ITERATIONS)?;
        let length = self.u32_property(keys::ARGON2_LENGTH, DEFAULT_ARGON2_LENGTH)?;
        let parallelism = self.u32_property(keys::ARGON2_PARALLELISM, DEFAULT_ARGON2_PARALLELISM)?;
        let variant: Argon2Type = self.string_property(keys::ARGON2_TYPE, DEFAULT_ARGON2_TYPE).parse()?;
        let version = self.u32_property(keys::ARGON2_VERSION, DEFAULT_ARGON2_VERSION)?;
        self.argon2_instance(memory, iterations, parallelism, length, variant, version)
    }

    /// Argon2 with explicit parameters
    ///
    /// # Errors
    ///
    /// See [`Argon2Function::new`].
    pub fn argon2_instance(
        &self,
        memory: u32,
        iterations: u32,
        parallelism: u32,
        output_length: u32,
        variant: Argon2Type,
        version: u32,
    ) -> Result<Arc<Argon2Function>> {
        Ok(intern(
            &self.argon2,
            Argon2Function::new(memory, iterations, parallelism, output_length, variant, version)?,
        ))
    }

    /// Message digest from `hash.md.*`
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedConfiguration` for an unknown digest or salt option.
    pub fn message_digest(&self) -> Result<Arc<MessageDigestFunction>> {
        let algorithm: DigestAlgorithm = self.string_property(keys::MD_ALGORITHM, DEFAULT_MD_ALGORITHM).parse()?;
        let salt_option: SaltOption = self.string_property(keys::MD_SALT_OPTION, DEFAULT_MD_SALT_OPTION).parse()?;
        Ok(self.message_digest_instance(algorithm, salt_option))
    }

    /// Message digest with explicit parameters
    #[must_use]
    pub fn message_digest_instance(
        &self,
        algorithm: DigestAlgorithm,
        salt_option: SaltOption,
    ) -> Arc<MessageDigestFunction> {
        intern(&self.message_digest, MessageDigestFunction::new(algorithm, salt_option))
    }

    /// Function that produced `encoded`, detected from its shape
    ///
    /// Recognises Argon2, Bcrypt, compressed PBKDF2 and Scrypt strings. Plain
    /// PBKDF2 and message digest results carry no parameters and cannot be
    /// detected.
    ///
    /// # Errors
    ///
    /// Returns `MalformedHash` when `encoded` matches no known grammar.
    pub fn instance_from_hash(&self, encoded: &str) -> Result<Arc<dyn HashingFunction>> {
        if encoded.starts_with("$argon2") {
            let function: Arc<dyn HashingFunction> =
                intern::<Argon2Function>(&self.argon2, Argon2Function::from_hash(encoded)?);
            return Ok(function);
        }
        let unknown = || PasswordError::malformed_hash(format!("Unrecognised hash format `{encoded}`"));
        let parts = dollar_parts(encoded).ok_or_else(unknown)?;
        let function: Arc<dyn HashingFunction> = match parts.len() {
            4 if BcryptVersion::from_tag(parts[1]).is_some() => {
                intern::<BcryptFunction>(&self.bcrypt, BcryptFunction::from_hash(encoded)?)
            }
            5 if parts[1].parse::<u32>().is_ok() => intern::<CompressedPbkdf2Function>(
                &self.compressed_pbkdf2,
                CompressedPbkdf2Function::from_hash(encoded)?,
            ),
            4 => intern::<ScryptFunction>(&self.scrypt, ScryptFunction::from_hash(encoded)?),
            _ => return Err(unknown()),
        };
        Ok(function)
    }

    /// Random source honouring `global.random.strong`, read on every call
    #[must_use]
    pub fn secure_random(&self) -> SecureRandom {
        SecureRandom::resolve(self.properties.read_bool(keys::GLOBAL_RANDOM_STRONG, false))
    }

    /// Salt generator over [`AlgorithmFinder::secure_random`]
    #[must_use]
    pub fn salt_generator(&self) -> SaltGenerator {
        SaltGenerator::new(self.secure_random())
    }

    /// Shared pepper from `global.pepper`
    #[must_use]
    pub fn pepper(&self) -> Option<String> {
        self.properties.read_string(keys::GLOBAL_PEPPER, None)
    }

    /// Password generator for `minimum_entropy` bits, cached by value
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the threshold is NaN or infinite.
    pub fn entropy_generator(&self, minimum_entropy: f64) -> Result<Arc<EntropyBasedPasswordGenerator>> {
        let key = minimum_entropy.to_bits();
        if let Some(existing) = self.generators.get(&key) {
            return Ok(Arc::clone(existing.value()));
        }
        let generator = EntropyBasedPasswordGenerator::new(minimum_entropy, Arc::clone(&self.properties))?;
        let entry = self.generators.entry(key).or_insert_with(|| {
            debug!(minimum_entropy, "Caching password generator");
            Arc::new(generator)
        });
        Ok(Arc::clone(entry.value()))
    }
}

impl fmt::Debug for AlgorithmFinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlgorithmFinder")
            .field("pbkdf2", &self.pbkdf2.len())
            .field("compressed_pbkdf2", &self.compressed_pbkdf2.len())
            .field("bcrypt", &self.bcrypt.len())
            .field("scrypt", &self.scrypt.len())
            .field("argon2", &self.argon2.len())
            .field("message_digest", &self.message_digest.len())
            .field("generators", &self.generators.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Properties;
    use crate::function::Algorithm;

    #[test]
    fn defaults_match_documented_values() -> Result<()> {
        let finder = AlgorithmFinder::new(Properties::new());
        assert_eq!(finder.pbkdf2()?.to_string(), "PBKDF2WithHmacSHA512[i=310000, l=512]");
        assert_eq!(finder.bcrypt()?.to_string(), "Bcrypt[v=2b, c=10]");
        assert_eq!(finder.scrypt()?.to_string(), "Scrypt[N=65536, r=8, p=1, l=64]");
        assert_eq!(finder.argon2()?.to_string(), "Argon2[m=15360, t=2, p=1, l=32, type=argon2id, v=19]");
        assert_eq!(finder.message_digest()?.to_string(), "MessageDigest[SHA-512, APPEND]");
        assert!(finder.pepper().is_none());
        Ok(())
    }

    #[test]
    fn bad_configuration_is_reported() {
        let properties = Properties::new();
        let finder = AlgorithmFinder::new(properties.clone());

        properties.set(keys::MD_ALGORITHM, "MD5");
        assert!(finder.message_digest().unwrap_err().is_unsupported());

        properties.set(keys::BCRYPT_ROUNDS, "-1");
        assert!(finder.bcrypt().unwrap_err().is_invalid_argument());

        properties.set(keys::ARGON2_TYPE, "x");
        assert!(finder.argon2().unwrap_err().is_unsupported());
    }

    #[test]
    fn detects_algorithm_from_hash() -> Result<()> {
        let finder = AlgorithmFinder::new(Properties::new());
        let cases = [
            ("$argon2i$v=19$m=65536,t=2,p=4$c29tZXNhbHQ$RdescudvJCsgt3ub+b+dWRWJTmaaJObG", Algorithm::Argon2),
            ("$2b$12$.z6oEtf4KGlPk9y4uzEsKuF.4MfAv9NQCrqXQevjYy0DMvVXZWcK2", Algorithm::Bcrypt),
            ("$e0801$fl+gNAicpGG4gLMkUTCvLw==$N5wE1IKsr4LPBoetJVW6jLzEH4kTVXuKGafvAA8Z+88=", Algorithm::Scrypt),
            ("$3$4294967552$c2FsdA==$aGFzaA==", Algorithm::CompressedPbkdf2),
        ];
        for (encoded, algorithm) in cases {
            assert_eq!(finder.instance_from_hash(encoded)?.algorithm(), algorithm);
        }
        for bad in ["", "plain", "$a$b", "$1$2$3$4$5$6$7"] {
            assert!(finder.instance_from_hash(bad).unwrap_err().is_malformed_hash(), "{bad}");
        }
        Ok(())
    }
}
