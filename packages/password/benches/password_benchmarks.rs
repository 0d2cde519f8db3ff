//! Benchmarks for password hashing, verification and generation
//!
//! Work factors are lowered so a run compares the per-call overhead of each
//! algorithm rather than its tuned cost.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use cryypt_password::{AlgorithmFinder, Password, Properties, Rule, keys};

fn cheap_finder() -> AlgorithmFinder {
    let properties = Properties::new();
    properties.set(keys::PBKDF2_ITERATIONS, "1000");
    properties.set(keys::BCRYPT_ROUNDS, "4");
    properties.set(keys::SCRYPT_WORK_FACTOR, "1024");
    properties.set(keys::ARGON2_MEMORY, "1024");
    properties.set(keys::ARGON2_ITERATIONS, "1");
    AlgorithmFinder::new(properties)
}

/// Hash one password with every algorithm
fn benchmark_hash_algorithms(c: &mut Criterion) {
    let finder = cheap_finder();
    let mut group = c.benchmark_group("password_hash");

    group.bench_function("PBKDF2", |b| {
        b.iter(|| {
            let hash = Password::hash(&finder, "password")
                .and_then(|builder| builder.add_salt("salt").with_pbkdf2())
                .expect("PBKDF2 hash should succeed");
            std::hint::black_box(hash);
        });
    });

    group.bench_function("CompressedPBKDF2", |b| {
        b.iter(|| {
            let hash = Password::hash(&finder, "password")
                .and_then(|builder| builder.add_salt("salt").with_compressed_pbkdf2())
                .expect("Compressed PBKDF2 hash should succeed");
            std::hint::black_box(hash);
        });
    });

    group.bench_function("Bcrypt", |b| {
        b.iter(|| {
            let hash = Password::hash(&finder, "password")
                .and_then(|builder| builder.with_bcrypt())
                .expect("Bcrypt hash should succeed");
            std::hint::black_box(hash);
        });
    });

    group.bench_function("Scrypt", |b| {
        b.iter(|| {
            let hash = Password::hash(&finder, "password")
                .and_then(|builder| builder.add_salt("salt").with_scrypt())
                .expect("Scrypt hash should succeed");
            std::hint::black_box(hash);
        });
    });

    group.bench_function("Argon2", |b| {
        b.iter(|| {
            let hash = Password::hash(&finder, "password")
                .and_then(|builder| builder.add_salt("saltsalt").with_argon2())
                .expect("Argon2 hash should succeed");
            std::hint::black_box(hash);
        });
    });

    group.bench_function("MessageDigest", |b| {
        b.iter(|| {
            let hash = Password::hash(&finder, "password")
                .and_then(|builder| builder.add_salt("salt").with_message_digest())
                .expect("Message digest hash should succeed");
            std::hint::black_box(hash);
        });
    });

    group.finish();
}

/// Verify against hashes produced once up front
fn benchmark_check(c: &mut Criterion) {
    let finder = cheap_finder();
    let mut group = c.benchmark_group("password_check");

    let bcrypt = Password::hash(&finder, "password")
        .and_then(|builder| builder.with_bcrypt())
        .expect("Bcrypt hash should succeed");
    let argon2 = Password::hash(&finder, "password")
        .and_then(|builder| builder.with_argon2())
        .expect("Argon2 hash should succeed");

    group.bench_function("Bcrypt", |b| {
        b.iter(|| {
            let verified = Password::check(&finder, "password", bcrypt.result())
                .and_then(|checker| checker.with_bcrypt())
                .expect("Bcrypt check should succeed");
            std::hint::black_box(verified);
        });
    });

    group.bench_function("Argon2", |b| {
        b.iter(|| {
            let verified = Password::check(&finder, "password", &argon2)
                .and_then(|checker| checker.with_argon2())
                .expect("Argon2 check should succeed");
            std::hint::black_box(verified);
        });
    });

    group.bench_function("Detect", |b| {
        b.iter(|| {
            let function = finder
                .instance_from_hash(argon2.result())
                .expect("Argon2 hash should be detected");
            std::hint::black_box(function);
        });
    });

    group.finish();
}

/// Scrypt cost as the work factor grows
fn benchmark_scrypt_work_factor(c: &mut Criterion) {
    let finder = cheap_finder();
    let mut group = c.benchmark_group("scrypt_work_factor");
    group.sample_size(10);

    for work_factor in [1024u64, 4096, 16384] {
        let function = finder
            .scrypt_instance(work_factor, 8, 1, 32)
            .expect("Scrypt parameters should be valid");
        group.throughput(Throughput::Bytes(
            u64::try_from(function.required_bytes()).unwrap_or(u64::MAX),
        ));
        group.bench_with_input(
            BenchmarkId::new("N", work_factor),
            &function,
            |b, function| {
                b.iter(|| {
                    let hash = Password::hash(&finder, "password")
                        .and_then(|builder| builder.add_salt("salt").with(function.clone()))
                        .expect("Scrypt hash should succeed");
                    std::hint::black_box(hash);
                });
            },
        );
    }

    group.finish();
}

/// Password generation for growing entropy targets
fn benchmark_generation(c: &mut Criterion) {
    let finder = cheap_finder();
    let mut group = c.benchmark_group("entropy_generation");

    for bits in [40.0f64, 80.0, 128.0] {
        let generator = finder
            .entropy_generator(bits)
            .expect("Finite thresholds should be accepted");
        group.bench_with_input(BenchmarkId::new("printable", bits), &generator, |b, generator| {
            b.iter(|| {
                let password = generator
                    .generate_with_rules(&[Rule::printable(), Rule::no_repetitions()])
                    .expect("Generation should succeed");
                std::hint::black_box(password);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_hash_algorithms,
    benchmark_check,
    benchmark_scrypt_work_factor,
    benchmark_generation
);
criterion_main!(benches);
