//! Entropy-constrained password generation

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use super::rule::{GeneratorContext, Rule};
use super::symbols::CharClass;
use crate::config::{keys, PropertyReader};
use crate::random::SecureRandom;
use crate::{PasswordError, Result};

/// Approximate entropy of `candidate` in bits
///
/// The pool is the sum of the sizes of every character class that occurs
/// at least once; the estimate is `log2(pool) * length`. Characters outside
/// the classes count towards the length but not the pool. Zero when no
/// classified character occurs.
#[must_use]
pub fn calculate_entropy(candidate: &str) -> f64 {
    let mut seen = 0u8;
    let mut pool = 0u32;
    for class in candidate.chars().filter_map(CharClass::of) {
        if seen & class.flag() == 0 {
            seen |= class.flag();
            pool += class.pool_size();
        }
    }
    if pool == 0 {
        return 0.0;
    }
    f64::from(pool).log10() * candidate.chars().count() as f64 / 2f64.log10()
}

/// Generates passwords until their estimated entropy reaches a threshold
pub struct EntropyBasedPasswordGenerator {
    minimum_entropy: f64,
    properties: Arc<dyn PropertyReader>,
}

impl EntropyBasedPasswordGenerator {
    /// Generator for `minimum_entropy` bits. The random source is resolved
    /// from `properties` on every generation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the threshold is NaN or infinite.
    pub fn new(minimum_entropy: f64, properties: Arc<dyn PropertyReader>) -> Result<Self> {
        if !minimum_entropy.is_finite() {
            return Err(PasswordError::invalid_argument(format!(
                "Minimum entropy must be finite, got {minimum_entropy}"
            )));
        }
        Ok(Self {
            minimum_entropy,
            properties,
        })
    }

    /// Threshold in bits
    #[must_use]
    pub fn minimum_entropy(&self) -> f64 {
        self.minimum_entropy
    }

    /// Draw characters uniformly from `symbols` until the estimate reaches
    /// the threshold. The result is the shortest prefix that does.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the threshold is positive and
    /// `symbols` holds no classified character.
    pub fn generate(&self, symbols: &str) -> Result<String> {
        let mut context = self.context(symbols.chars().collect())?;
        let mut generated = String::new();
        while calculate_entropy(&generated) < self.minimum_entropy {
            generated.push(context.pick_new_char()?);
        }
        trace!(length = generated.chars().count(), "Generated password");
        Ok(generated)
    }

    /// Like [`Self::generate`] with the alphabet taken from the symbol rules
    /// (every printable character when there are none). Logic rules are
    /// re-applied after each character so the result satisfies them and
    /// the threshold at once.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the alphabet cannot reach the
    /// threshold or cannot satisfy a logic rule.
    pub fn generate_with_rules(&self, rules: &[Rule]) -> Result<String> {
        let mut context = self.context(Rule::working_alphabet(rules))?;
        let mut generated = String::new();
        while calculate_entropy(&generated) < self.minimum_entropy {
            generated.push(context.pick_new_char()?);
            for rule in rules {
                generated = rule.apply(&mut context, &generated)?;
            }
        }
        trace!(length = generated.chars().count(), rules = rules.len(), "Generated password");
        Ok(generated)
    }

    fn context(&self, alphabet: Vec<char>) -> Result<GeneratorContext> {
        if self.minimum_entropy > 0.0 && !alphabet.iter().any(|&c| CharClass::of(c).is_some()) {
            return Err(PasswordError::invalid_argument(
                "Symbols must contain at least one letter, digit or special character",
            ));
        }
        let strong = self.properties.read_bool(keys::GLOBAL_RANDOM_STRONG, false);
        Ok(GeneratorContext::new(alphabet, SecureRandom::resolve(strong)))
    }
}

impl fmt::Debug for EntropyBasedPasswordGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntropyBasedPasswordGenerator")
            .field("minimum_entropy", &self.minimum_entropy)
            .finish_non_exhaustive()
    }
}
