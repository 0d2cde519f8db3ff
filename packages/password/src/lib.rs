//! Password hashing, verification, migration and generation
//!
//! ```no_run
//! use cryypt_password::{AlgorithmFinder, Password, Properties};
//!
//! # fn main() -> cryypt_password::Result<()> {
//! let finder = AlgorithmFinder::new(Properties::new());
//! let hash = Password::hash(&finder, "correct horse")?.add_random_salt().with_argon2()?;
//! assert!(Password::check(&finder, "correct horse", hash.result())?.with_argon2()?);
//!
//! let update = Password::check(&finder, "correct horse", &hash)?
//!     .and_update()
//!     .migrate_to(finder.bcrypt()?)?;
//! assert!(update.is_verified());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod error;
pub mod finder;
pub mod function;
pub mod generator;
pub mod hash;
pub mod random;
pub mod secure_string;

pub use api::{CheckTarget, HashBuilder, HashChecker, HashUpdater, Password};
pub use config::{keys, Properties, PropertyReader};
pub use error::{PasswordError, Result};
pub use finder::AlgorithmFinder;
pub use function::{
    Algorithm, Argon2Function, Argon2Type, BcryptFunction, BcryptVersion, CompressedPbkdf2Function,
    DigestAlgorithm, HashOutput, HashingFunction, Hmac, MessageDigestFunction, Pbkdf2Function,
    SaltOption, ScryptFunction,
};
pub use generator::{calculate_entropy, EntropyBasedPasswordGenerator, Rule};
pub use hash::{Hash, HashUpdate};
pub use random::{RandomKind, SaltGenerator, SecureRandom, DEFAULT_SALT_LENGTH};
pub use secure_string::SecureString;
