//! # Star Log Ledger Benchmarks
//!
//! | Area | Operation |
//! |------|-----------|
//! | sl-01 Difficulty | pack / unpack, target comparison |
//! | Ledger model | event and block hashing |
//! | sl-03 Validation | context-free block validation |
//!
//! The hash-against-target comparison sits in the nonce search inner loop,
//! so it is the number to watch.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use shared_types::Rules;
use sl_01_difficulty::{pack, unpack, Target, EASIEST_DIFFICULTY};
use sl_03_validation::BlockValidator;
use sl_tests::fixtures::{chain_of, jump_event, miner_a, NOW};

// ============================================================================
// SL-01: Difficulty codec
// ============================================================================

fn bench_difficulty_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("sl-01-difficulty");
    let rules = Rules::for_testing();

    for packed in [EASIEST_DIFFICULTY, 0x1c00_ffff, 0x1b04_86e2] {
        let unpacked = unpack(packed, rules.difficulty_fudge).unwrap();
        group.bench_with_input(BenchmarkId::new("unpack", format!("{packed:#010x}")), &packed, |b, &p| {
            b.iter(|| black_box(unpack(p, rules.difficulty_fudge)))
        });
        group.bench_with_input(BenchmarkId::new("pack", format!("{packed:#010x}")), &unpacked, |b, t| {
            b.iter(|| black_box(pack(t, rules.difficulty_fudge)))
        });
    }

    let target = Target::from_difficulty(0x1c00_ffff, rules.difficulty_fudge).unwrap();
    let hashes: Vec<String> = (0..1_000u32)
        .map(|i| shared_crypto::sha256_hex(&i.to_string()))
        .collect();
    group.throughput(Throughput::Elements(hashes.len() as u64));
    group.bench_function("target_is_met_by_1000", |b| {
        b.iter(|| black_box(hashes.iter().filter(|h| target.is_met_by(h)).count()))
    });

    group.finish();
}

// ============================================================================
// Ledger model hashing
// ============================================================================

fn bench_hashing(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger-hashing");
    let rules = Rules::for_testing();
    let (_, blocks) = chain_of(1, 1, &rules, miner_a());
    let genesis = &blocks[0];
    let event = jump_event(1, &rules, miner_a(), &[genesis.events[0].outputs[0].key.as_str()], "sol");

    group.bench_function("event_compute_hash", |b| b.iter(|| black_box(event.compute_hash())));
    group.bench_function("block_compute_hash", |b| b.iter(|| black_box(genesis.compute_hash())));

    group.finish();
}

// ============================================================================
// SL-03: Validation
// ============================================================================

fn bench_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("sl-03-validation");
    group.measurement_time(Duration::from_secs(10));

    let rules = Rules::for_testing();
    let (_, blocks) = chain_of(1, 1, &rules, miner_a());
    let validator = BlockValidator::new(rules);

    group.bench_function("validate_genesis", |b| {
        b.iter(|| black_box(validator.validate(&blocks[0], NOW).is_ok()))
    });

    group.finish();
}

criterion_group!(benches, bench_difficulty_codec, bench_hashing, bench_validation);
criterion_main!(benches);
