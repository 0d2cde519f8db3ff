//! Random password generation driven by an entropy estimate

pub mod entropy;
pub mod rule;
pub mod symbols;

pub use self::entropy::{calculate_entropy, EntropyBasedPasswordGenerator};
pub use self::rule::{GeneratorContext, LogicRule, Rule, SymbolRule};
pub use self::symbols::CharClass;
