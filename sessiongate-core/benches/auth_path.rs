//! Benchmarks for the per-request authentication path
//!
//! Every protected request pays for one token verification and one
//! registry lookup; these measure both, with the registry at several sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sessiongate_core::auth::*;
use sessiongate_core::*;
use std::sync::Arc;

const REGISTRY_SIZES: &[usize] = &[0, 1_000, 100_000];

fn setup() -> (Arc<TokenCodec>, Arc<RevocationRegistry>) {
    let config = AuthConfig::new("benchmark-signing-key-0123456789", DEFAULT_TOKEN_TTL).unwrap();
    (Arc::new(TokenCodec::new(&config)), Arc::new(RevocationRegistry::new()))
}

fn bench_token_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("token_codec");
    let (codec, _) = setup();
    let subject = UserId::generate();

    group.bench_function("issue", |b| {
        b.iter(|| black_box(codec.issue(&subject, DEFAULT_TOKEN_TTL).unwrap()));
    });

    let issued = codec.issue(&subject, DEFAULT_TOKEN_TTL).unwrap();
    group.bench_function("verify", |b| {
        b.iter(|| black_box(codec.verify(&issued.token).unwrap()));
    });

    group.finish();
}

fn bench_gate_admit(c: &mut Criterion) {
    let mut group = c.benchmark_group("auth_gate");

    for &size in REGISTRY_SIZES {
        let (codec, registry) = setup();
        for i in 0..size {
            registry.revoke(&format!("revoked-token-{}", i), u64::MAX);
        }
        let gate = AuthGate::new(codec.clone(), registry);
        let issued = codec.issue(&UserId::generate(), DEFAULT_TOKEN_TTL).unwrap();
        let header = format!("Bearer {}", issued.token);

        group.bench_with_input(BenchmarkId::new("admit", size), &size, |b, &_size| {
            b.iter(|| black_box(gate.admit(Some(&header)).unwrap()));
        });
    }

    group.finish();
}

fn bench_password_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("password");
    group.sample_size(10);

    let hasher = PasswordHasher::new(PasswordCost::default()).unwrap();
    let hashed = hasher.hash("correct horse battery staple").unwrap();

    group.bench_function("verify_default_cost", |b| {
        b.iter(|| black_box(hasher.verify("correct horse battery staple", &hashed)));
    });

    group.finish();
}

criterion_group!(benches, bench_token_codec, bench_gate_admit, bench_password_verify);
criterion_main!(benches);
