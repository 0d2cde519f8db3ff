//! Random sources for salts and password generation

use rand::rngs::{OsRng, StdRng};
use rand::SeedableRng;
use rand_core::{CryptoRng, RngCore, TryRngCore, UnwrapErr};
use tracing::{debug, warn};

use crate::{PasswordError, Result};

/// Salt length used when the caller does not ask for a specific one
pub const DEFAULT_SALT_LENGTH: usize = 64;

/// Which generator backs a [`SecureRandom`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandomKind {
    /// Operating-system generator, read on every request
    Strong,
    /// User-space CSPRNG seeded from the thread-local generator
    Default,
}

/// Cryptographically secure random source
///
/// Each caller owns its instance; nothing is shared or locked.
pub struct SecureRandom {
    source: Source,
}

enum Source {
    Strong(UnwrapErr<OsRng>),
    Default(Box<StdRng>),
}

impl SecureRandom {
    /// Resolve a source. When `strong` is requested but the operating-system
    /// generator does not answer, the default source is used instead.
    #[must_use]
    pub fn resolve(strong: bool) -> Self {
        if strong {
            let mut probe = OsRng;
            match probe.try_next_u32() {
                Ok(_) => {
                    debug!("Resolved strong random source");
                    return Self {
                        source: Source::Strong(OsRng.unwrap_err()),
                    };
                }
                Err(e) => {
                    warn!(error = %e, "Strong random source unavailable, falling back to default");
                }
            }
        }
        Self::default_source()
    }

    /// Default source regardless of configuration
    #[must_use]
    pub fn default_source() -> Self {
        Self {
            source: Source::Default(Box::new(StdRng::from_rng(&mut rand::rng()))),
        }
    }

    /// Which generator ended up backing this source
    #[must_use]
    pub fn kind(&self) -> RandomKind {
        match self.source {
            Source::Strong(_) => RandomKind::Strong,
            Source::Default(_) => RandomKind::Default,
        }
    }
}

impl RngCore for SecureRandom {
    fn next_u32(&mut self) -> u32 {
        match &mut self.source {
            Source::Strong(rng) => rng.next_u32(),
            Source::Default(rng) => rng.next_u32(),
        }
    }

    fn next_u64(&mut self) -> u64 {
        match &mut self.source {
            Source::Strong(rng) => rng.next_u64(),
            Source::Default(rng) => rng.next_u64(),
        }
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        match &mut self.source {
            Source::Strong(rng) => rng.fill_bytes(dst),
            Source::Default(rng) => rng.fill_bytes(dst),
        }
    }
}

impl CryptoRng for SecureRandom {}

impl std::fmt::Debug for SecureRandom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureRandom").field("kind", &self.kind()).finish()
    }
}

/// Produces random salts
#[derive(Debug)]
pub struct SaltGenerator {
    random: SecureRandom,
}

impl SaltGenerator {
    /// Wrap a random source
    #[must_use]
    pub fn new(random: SecureRandom) -> Self {
        Self { random }
    }

    /// `length` random bytes; zero yields an empty salt
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when `length` is negative.
    pub fn generate(&mut self, length: i32) -> Result<Vec<u8>> {
        let length = usize::try_from(length).map_err(|_| {
            PasswordError::invalid_argument(format!("Salt length cannot be negative, got {length}"))
        })?;
        Ok(self.fill(length))
    }

    /// [`DEFAULT_SALT_LENGTH`] random bytes
    pub fn generate_default(&mut self) -> Vec<u8> {
        self.fill(DEFAULT_SALT_LENGTH)
    }

    pub(crate) fn fill(&mut self, length: usize) -> Vec<u8> {
        let mut salt = vec![0u8; length];
        self.random.fill_bytes(&mut salt);
        salt
    }

    /// Which generator backs this salt source
    #[must_use]
    pub fn random_kind(&self) -> RandomKind {
        self.random.kind()
    }
}
