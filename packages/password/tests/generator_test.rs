//! Entropy-based password generation

use std::sync::Arc;

use cryypt_password::generator::symbols;
use cryypt_password::{calculate_entropy, EntropyBasedPasswordGenerator, Properties, Rule};
use proptest::prelude::*;

fn generator(minimum_entropy: f64) -> EntropyBasedPasswordGenerator {
    EntropyBasedPasswordGenerator::new(minimum_entropy, Arc::new(Properties::new()))
        .expect("finite threshold")
}

fn without_last(password: &str) -> String {
    let mut chars: Vec<char> = password.chars().collect();
    chars.pop();
    chars.into_iter().collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn generated_password_is_the_shortest_reaching_the_threshold(
        minimum_entropy in 1.0f64..160.0,
        symbols in prop::sample::select(vec![
            symbols::DIGITS,
            symbols::LOWERCASE_LETTERS,
            symbols::ALPHANUMERIC,
            symbols::PRINTABLE,
        ]),
    ) {
        let password = generator(minimum_entropy).generate(symbols).expect("generation succeeds");
        prop_assert!(calculate_entropy(&password) >= minimum_entropy);
        prop_assert!(calculate_entropy(&without_last(&password)) < minimum_entropy);
        prop_assert!(password.chars().all(|c| symbols.contains(c)));
    }

    #[test]
    fn rules_keep_the_length_minimal(minimum_entropy in 1.0f64..120.0) {
        let rules = [Rule::alphanumeric(), Rule::no_repetitions()];
        let password = generator(minimum_entropy).generate_with_rules(&rules).expect("generation succeeds");
        prop_assert!(calculate_entropy(&password) >= minimum_entropy);
        prop_assert!(calculate_entropy(&without_last(&password)) < minimum_entropy);
        prop_assert!(password.chars().all(char::is_alphanumeric));
        let chars: Vec<char> = password.chars().collect();
        prop_assert!(chars.windows(2).all(|pair| pair[0] != pair[1]));
    }
}

#[test]
fn test_digit_pin_without_consecutive_digits() {
    let rules = [Rule::digits(), Rule::no_consecutives()];
    for _ in 0..32 {
        let pin = generator(40.0).generate_with_rules(&rules).expect("generation succeeds");
        let digits: Vec<u32> = pin.chars().filter_map(|c| c.to_digit(10)).collect();
        assert_eq!(digits.len(), pin.len());
        assert!(digits.windows(2).all(|pair| pair[0].abs_diff(pair[1]) != 1), "{pin}");
    }
}

#[test]
fn test_custom_symbols_are_respected() {
    let password = generator(64.0)
        .generate_with_rules(&[Rule::symbols("abc123!?"), Rule::no_repetitions()])
        .expect("generation succeeds");
    assert!(password.chars().all(|c| "abc123!?".contains(c)));
    assert!(calculate_entropy(&password) >= 64.0);
}

#[test]
fn test_unusable_inputs() {
    let error = generator(10.0).generate("éàü").unwrap_err();
    assert!(error.is_invalid_argument());

    let error = generator(10.0).generate_with_rules(&[Rule::symbols("x"), Rule::no_repetitions()]).unwrap_err();
    assert!(error.is_invalid_argument());

    assert_eq!(generator(0.0).generate("").expect("nothing to generate"), "");
    assert!(EntropyBasedPasswordGenerator::new(f64::INFINITY, Arc::new(Properties::new())).is_err());
}
