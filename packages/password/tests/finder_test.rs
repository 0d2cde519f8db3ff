//! Caching and configuration behaviour of `AlgorithmFinder`

use std::sync::Arc;

use cryypt_password::{
    keys, AlgorithmFinder, Argon2Type, BcryptVersion, DigestAlgorithm, Hmac, HashingFunction,
    Properties, RandomKind, Result, SaltOption,
};

#[test]
fn test_equal_parameters_share_one_instance() -> Result<()> {
    let finder = AlgorithmFinder::new(Properties::new());

    assert!(Arc::ptr_eq(&finder.bcrypt()?, &finder.bcrypt()?));
    assert!(Arc::ptr_eq(
        &finder.bcrypt_instance(BcryptVersion::B, 10)?,
        &finder.bcrypt()?
    ));
    assert!(!Arc::ptr_eq(
        &finder.bcrypt_instance(BcryptVersion::A, 10)?,
        &finder.bcrypt()?
    ));

    assert!(Arc::ptr_eq(
        &finder.pbkdf2_instance(Hmac::Sha256, 1000, 256)?,
        &finder.pbkdf2_instance(Hmac::Sha256, 1000, 256)?
    ));
    assert!(Arc::ptr_eq(
        &finder.scrypt_instance(1024, 8, 1, 32)?,
        &finder.scrypt_instance(1024, 8, 1, 32)?
    ));
    assert!(Arc::ptr_eq(
        &finder.argon2_instance(1024, 1, 1, 32, Argon2Type::ID, 19)?,
        &finder.argon2_instance(1024, 1, 1, 32, Argon2Type::ID, 19)?
    ));
    assert!(Arc::ptr_eq(
        &finder.message_digest_instance(DigestAlgorithm::Sha256, SaltOption::Prepend),
        &finder.message_digest_instance(DigestAlgorithm::Sha256, SaltOption::Prepend)
    ));
    Ok(())
}

#[test]
fn test_configuration_changes_are_picked_up() -> Result<()> {
    let properties = Properties::new();
    let finder = AlgorithmFinder::new(properties.clone());

    let before = finder.scrypt()?;
    properties.set(keys::SCRYPT_WORK_FACTOR, "2048");
    properties.set(keys::SCRYPT_DERIVED_KEY_LENGTH, "32");
    let after = finder.scrypt()?;

    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(after.work_factor(), 2048);
    assert_eq!(after.derived_key_length(), 32);
    assert_eq!(after.to_string(), "Scrypt[N=2048, r=8, p=1, l=32]");
    Ok(())
}

#[test]
fn test_instance_from_hash_reuses_cache() -> Result<()> {
    let finder = AlgorithmFinder::new(Properties::new());
    let cached = finder.bcrypt_instance(BcryptVersion::B, 12)?;

    let detected = finder.instance_from_hash("$2b$12$.z6oEtf4KGlPk9y4uzEsKuF.4MfAv9NQCrqXQevjYy0DMvVXZWcK2")?;
    assert_eq!(detected.to_string(), cached.to_string());

    let cached: Arc<dyn HashingFunction> = cached;
    assert!(Arc::ptr_eq(&detected, &cached));

    assert!(finder.instance_from_hash("not a hash").unwrap_err().is_malformed_hash());
    assert!(finder.instance_from_hash("$1$2$3$4$5$6$7").unwrap_err().is_malformed_hash());
    Ok(())
}

#[test]
fn test_random_strength_toggle() {
    let properties = Properties::new();
    let finder = AlgorithmFinder::new(properties.clone());
    assert_eq!(finder.salt_generator().random_kind(), RandomKind::Default);

    properties.set(keys::GLOBAL_RANDOM_STRONG, "true");
    assert_eq!(finder.secure_random().kind(), RandomKind::Strong);
    assert_eq!(finder.salt_generator().random_kind(), RandomKind::Strong);

    properties.set(keys::GLOBAL_RANDOM_STRONG, "not a bool");
    assert_eq!(finder.secure_random().kind(), RandomKind::Default);
}

#[test]
fn test_salt_generator_lengths() -> Result<()> {
    let finder = AlgorithmFinder::new(Properties::new());
    let mut salts = finder.salt_generator();

    assert_eq!(salts.generate(23)?.len(), 23);
    assert!(salts.generate(0)?.is_empty());
    assert!(salts.generate(-3).unwrap_err().is_invalid_argument());
    assert_ne!(salts.generate(32)?, salts.generate(32)?);
    Ok(())
}

#[test]
fn test_pepper_and_json_configuration() -> Result<()> {
    let properties = Properties::from_json(
        r#"{
            "global.pepper": "shared-secret",
            "hash.bcrypt.minor": "y",
            "hash.bcrypt.rounds": 5,
            "hash.argon2.type": "i"
        }"#,
    )?;
    let finder = AlgorithmFinder::new(properties);

    assert_eq!(finder.pepper().as_deref(), Some("shared-secret"));
    assert_eq!(finder.bcrypt()?.to_string(), "Bcrypt[v=2y, c=5]");
    assert_eq!(finder.argon2()?.variant(), Argon2Type::I);
    Ok(())
}

#[test]
fn test_entropy_generators_are_cached_by_threshold() -> Result<()> {
    let finder = AlgorithmFinder::new(Properties::new());

    let first = finder.entropy_generator(48.0)?;
    assert!(Arc::ptr_eq(&first, &finder.entropy_generator(48.0)?));
    assert!(!Arc::ptr_eq(&first, &finder.entropy_generator(64.0)?));
    assert_eq!(first.minimum_entropy(), 48.0);

    assert!(finder.entropy_generator(f64::NAN).unwrap_err().is_invalid_argument());
    Ok(())
}
