//! Generation rules: alphabet restrictions and post-processing passes

use rand::Rng;

use super::symbols;
use crate::random::SecureRandom;
use crate::{PasswordError, Result};

/// Working state handed to rules while a password is generated
#[derive(Debug)]
pub struct GeneratorContext {
    alphabet: Vec<char>,
    random: SecureRandom,
}

impl GeneratorContext {
    /// Context drawing from `alphabet` with `random`
    #[must_use]
    pub fn new(alphabet: Vec<char>, random: SecureRandom) -> Self {
        Self { alphabet, random }
    }

    /// Full working alphabet
    #[must_use]
    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    /// Uniformly random character from the working alphabet
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the alphabet is empty.
    pub fn pick_new_char(&mut self) -> Result<char> {
        if self.alphabet.is_empty() {
            return Err(PasswordError::invalid_argument("Cannot pick from an empty alphabet"));
        }
        let index = self.random.random_range(0..self.alphabet.len());
        Ok(self.alphabet[index])
    }
}

/// Fixed character set a password may be drawn from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRule {
    alphabet: Vec<char>,
}

impl SymbolRule {
    /// Rule allowing exactly the characters of `symbols`
    #[must_use]
    pub fn new(symbols: &str) -> Self {
        let mut alphabet: Vec<char> = symbols.chars().collect();
        alphabet.sort_unstable();
        alphabet.dedup();
        Self { alphabet }
    }

    /// Allowed characters, sorted and deduplicated
    #[must_use]
    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }
}

/// Post-processing pass that resamples offending characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicRule {
    /// No character equals its predecessor
    NoRepetitions,
    /// No digit is one away from a preceding digit
    NoConsecutives,
}

impl LogicRule {
    fn violates(self, previous: char, current: char) -> bool {
        match self {
            Self::NoRepetitions => previous == current,
            Self::NoConsecutives => match (previous.to_digit(10), current.to_digit(10)) {
                (Some(a), Some(b)) => a.abs_diff(b) == 1,
                _ => false,
            },
        }
    }

    /// Rewrite `generated` so no adjacent pair violates the rule. Offending
    /// characters are redrawn from the context's full alphabet.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when no character of the alphabet can
    /// follow a given predecessor.
    pub fn apply(self, context: &mut GeneratorContext, generated: &str) -> Result<String> {
        let mut result: Vec<char> = generated.chars().collect();
        for i in 1..result.len() {
            let previous = result[i - 1];
            if !self.violates(previous, result[i]) {
                continue;
            }
            if !context.alphabet().iter().any(|&c| !self.violates(previous, c)) {
                return Err(PasswordError::invalid_argument(format!(
                    "{self:?} cannot be satisfied after `{previous}` with the working alphabet"
                )));
            }
            while self.violates(previous, result[i]) {
                result[i] = context.pick_new_char()?;
            }
        }
        Ok(result.into_iter().collect())
    }
}

/// Generation rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Restricts the working alphabet
    Symbols(SymbolRule),
    /// Post-processes generated text
    Logic(LogicRule),
}

impl Rule {
    /// `a` to `z`
    #[must_use]
    pub fn lowercase_letters() -> Self {
        Self::symbols(symbols::LOWERCASE_LETTERS)
    }

    /// `A` to `Z`
    #[must_use]
    pub fn uppercase_letters() -> Self {
        Self::symbols(symbols::UPPERCASE_LETTERS)
    }

    /// Both letter cases
    #[must_use]
    pub fn letters() -> Self {
        Self::symbols(symbols::LETTERS)
    }

    /// `0` to `9`
    #[must_use]
    pub fn digits() -> Self {
        Self::symbols(symbols::DIGITS)
    }

    /// Punctuation and space
    #[must_use]
    pub fn specials() -> Self {
        Self::symbols(symbols::SPECIALS)
    }

    /// Letters and digits
    #[must_use]
    pub fn alphanumeric() -> Self {
        Self::symbols(symbols::ALPHANUMERIC)
    }

    /// Letters, digits and specials
    #[must_use]
    pub fn printable() -> Self {
        Self::symbols(symbols::PRINTABLE)
    }

    /// Custom alphabet
    #[must_use]
    pub fn symbols(symbols: &str) -> Self {
        Self::Symbols(SymbolRule::new(symbols))
    }

    /// See [`LogicRule::NoRepetitions`]
    #[must_use]
    pub const fn no_repetitions() -> Self {
        Self::Logic(LogicRule::NoRepetitions)
    }

    /// See [`LogicRule::NoConsecutives`]
    #[must_use]
    pub const fn no_consecutives() -> Self {
        Self::Logic(LogicRule::NoConsecutives)
    }

    /// Apply the rule to `generated`. Symbol rules only shape the alphabet
    /// and return the input unchanged.
    ///
    /// # Errors
    ///
    /// See [`LogicRule::apply`].
    pub fn apply(&self, context: &mut GeneratorContext, generated: &str) -> Result<String> {
        match self {
            Self::Symbols(_) => Ok(generated.to_owned()),
            Self::Logic(rule) => rule.apply(context, generated),
        }
    }

    /// Union of the symbol rules' alphabets, or every printable character
    /// when no symbol rule is present
    #[must_use]
    pub fn working_alphabet(rules: &[Rule]) -> Vec<char> {
        let mut alphabet: Vec<char> = rules
            .iter()
            .filter_map(|rule| match rule {
                Self::Symbols(symbol_rule) => Some(symbol_rule.alphabet()),
                Self::Logic(_) => None,
            })
            .flatten()
            .copied()
            .collect();
        if alphabet.is_empty() && !rules.iter().any(|rule| matches!(rule, Self::Symbols(_))) {
            alphabet = symbols::PRINTABLE.chars().collect();
        }
        alphabet.sort_unstable();
        alphabet.dedup();
        alphabet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(symbols: &str) -> GeneratorContext {
        GeneratorContext::new(symbols.chars().collect(), SecureRandom::default_source())
    }

    #[test]
    fn no_repetitions_short_inputs_pass_through() -> Result<()> {
        let mut ctx = context("ab");
        assert_eq!(Rule::no_repetitions().apply(&mut ctx, "")?, "");
        assert_eq!(Rule::no_repetitions().apply(&mut ctx, "a")?, "a");
        Ok(())
    }

    #[test]
    fn no_repetitions_resamples_adjacent_duplicates() -> Result<()> {
        let mut ctx = context("abc");
        let output = Rule::no_repetitions().apply(&mut ctx, "aaaabbbbcccc")?;
        let chars: Vec<char> = output.chars().collect();
        assert_eq!(chars.len(), 12);
        assert!(chars.windows(2).all(|pair| pair[0] != pair[1]), "{output}");
        Ok(())
    }

    #[test]
    fn no_consecutives_leaves_non_digits_alone() -> Result<()> {
        let mut ctx = context("0123456789");
        assert_eq!(Rule::no_consecutives().apply(&mut ctx, "a1b2c3")?, "a1b2c3");

        let output = Rule::no_consecutives().apply(&mut ctx, "0123456789")?;
        let digits: Vec<u32> = output.chars().filter_map(|c| c.to_digit(10)).collect();
        assert!(digits.windows(2).all(|pair| pair[0].abs_diff(pair[1]) != 1), "{output}");
        Ok(())
    }

    #[test]
    fn unsatisfiable_alphabet_is_an_error() {
        let mut ctx = context("a");
        let err = Rule::no_repetitions().apply(&mut ctx, "aa").unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn working_alphabet_unions_symbol_rules() {
        let alphabet = Rule::working_alphabet(&[Rule::digits(), Rule::symbols("a9"), Rule::no_repetitions()]);
        assert_eq!(alphabet.iter().collect::<String>(), "0123456789a");
        assert_eq!(Rule::working_alphabet(&[Rule::no_consecutives()]).len(), symbols::PRINTABLE.len());
    }
}
