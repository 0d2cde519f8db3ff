//! Character classes used by the generator and the entropy estimate

/// `a` to `z`
pub const LOWERCASE_LETTERS: &str = "abcdefghijklmnopqrstuvwxyz";

/// `A` to `Z`
pub const UPPERCASE_LETTERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Lowercase followed by uppercase letters
pub const LETTERS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// `0` to `9`
pub const DIGITS: &str = "0123456789";

/// Printable ASCII punctuation and the space, in code point order
pub const SPECIALS: &str = " !\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Letters and digits
pub const ALPHANUMERIC: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Letters, digits and specials
pub const PRINTABLE: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789 !\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Character class recognised by the entropy estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// One of [`LOWERCASE_LETTERS`]
    Lowercase,
    /// One of [`UPPERCASE_LETTERS`]
    Uppercase,
    /// One of [`DIGITS`]
    Digit,
    /// One of [`SPECIALS`]
    Special,
}

impl CharClass {
    /// Class of `c`, if it belongs to one
    #[must_use]
    pub fn of(c: char) -> Option<Self> {
        match c {
            'a'..='z' => Some(Self::Lowercase),
            'A'..='Z' => Some(Self::Uppercase),
            '0'..='9' => Some(Self::Digit),
            _ if SPECIALS.contains(c) => Some(Self::Special),
            _ => None,
        }
    }

    /// Number of characters in the class
    #[must_use]
    pub fn pool_size(self) -> u32 {
        match self {
            Self::Lowercase | Self::Uppercase => 26,
            Self::Digit => 10,
            Self::Special => 33,
        }
    }

    /// Bit used in the seen-classes flag
    #[must_use]
    pub(crate) fn flag(self) -> u8 {
        match self {
            Self::Lowercase => 1,
            Self::Uppercase => 2,
            Self::Digit => 4,
            Self::Special => 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_sizes_match_alphabets() {
        for (alphabet, class) in [
            (LOWERCASE_LETTERS, CharClass::Lowercase),
            (UPPERCASE_LETTERS, CharClass::Uppercase),
            (DIGITS, CharClass::Digit),
            (SPECIALS, CharClass::Special),
        ] {
            assert_eq!(alphabet.chars().count() as u32, class.pool_size());
            assert!(alphabet.chars().all(|c| CharClass::of(c) == Some(class)));
        }
        assert_eq!(PRINTABLE.len(), 26 + 26 + 10 + 33);
        assert_eq!(CharClass::of('é'), None);
    }
}
