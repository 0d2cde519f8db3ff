//! Owned secret buffer that wipes itself on drop

use std::fmt;

use secrecy::ExposeSecret;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Mutable buffer for passwords, peppers and composed secrets
///
/// The bytes are UTF-8 when built from text but arbitrary bytes are
/// accepted. Contents are only reachable through [`ExposeSecret`] and there is
/// no conversion back into a `String`.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecureString {
    bytes: Vec<u8>,
}

impl SecureString {
    /// Empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty buffer with room for `capacity` bytes
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    /// Length in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when the buffer holds no bytes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Append raw bytes
    pub fn push_bytes(&mut self, more: &[u8]) {
        let needed = self.bytes.len() + more.len();
        if needed > self.bytes.capacity() {
            // Reallocation would leave the old copy behind; move it by hand.
            let mut grown = Vec::with_capacity(needed.max(self.bytes.capacity() * 2));
            grown.extend_from_slice(&self.bytes);
            self.bytes.zeroize();
            self.bytes = grown;
        }
        self.bytes.extend_from_slice(more);
    }

    /// Append text
    pub fn push_str(&mut self, more: &str) {
        self.push_bytes(more.as_bytes());
    }

    /// `first` followed by `second` in a single exact-size allocation
    #[must_use]
    pub fn concat(first: &[u8], second: &[u8]) -> Self {
        let mut joined = Self::with_capacity(first.len() + second.len());
        joined.push_bytes(first);
        joined.push_bytes(second);
        joined
    }

    /// Wipe and empty the buffer, keeping the allocation
    pub fn clear(&mut self) {
        self.bytes.zeroize();
    }
}

impl ExposeSecret<[u8]> for SecureString {
    fn expose_secret(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<&str> for SecureString {
    fn from(value: &str) -> Self {
        Self::concat(value.as_bytes(), &[])
    }
}

impl From<String> for SecureString {
    fn from(value: String) -> Self {
        Self {
            bytes: value.into_bytes(),
        }
    }
}

impl From<&String> for SecureString {
    fn from(value: &String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<Vec<u8>> for SecureString {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl From<&[u8]> for SecureString {
    fn from(value: &[u8]) -> Self {
        Self::concat(value, &[])
    }
}

impl PartialEq for SecureString {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.ct_eq(&other.bytes).into()
    }
}

impl Eq for SecureString {}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureString([REDACTED; {}])", self.bytes.len())
    }
}
