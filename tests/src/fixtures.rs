//! # Shared Test Fixtures
//!
//! RSA key generation dominates test time, so every key is generated once
//! per test binary and shared.

use std::sync::atomic::AtomicBool;
use std::sync::OnceLock;

use shared_crypto::{sha256_hex, FleetKeyPair};
use shared_types::{
    new_ledger_key, Account, Block, Event, EventInput, EventOutput, EventType, FixedTimeSource,
    Fleet, OutputModel, Rules, Vessel,
};
use sl_01_difficulty::Target;
use sl_02_chain_storage::{ChainStorageService, InMemoryLedgerStore, LedgerStore, SharedChainStorage};
use sl_04_block_production::{assemble_candidate, search_nonce, SearchLimits};

/// Fixed "current time" of every scenario.
pub const NOW: u64 = 1_700_000_000;

/// First miner.
pub fn miner_a() -> &'static FleetKeyPair {
    static KEY: OnceLock<FleetKeyPair> = OnceLock::new();
    KEY.get_or_init(|| FleetKeyPair::generate(1024).unwrap())
}

/// Second miner.
pub fn miner_b() -> &'static FleetKeyPair {
    static KEY: OnceLock<FleetKeyPair> = OnceLock::new();
    KEY.get_or_init(|| FleetKeyPair::generate(1024).unwrap())
}

/// Account record for a shared keypair.
pub fn account(name: &str, keypair: &FleetKeyPair) -> Account {
    Account::from_keypair(name, keypair).unwrap()
}

/// Empty in-memory ledger that already adopted `rules`.
pub fn ledger(rules: &Rules) -> SharedChainStorage<InMemoryLedgerStore> {
    let mut storage = ChainStorageService::new(InMemoryLedgerStore::new());
    storage.write_rules(rules.clone()).unwrap();
    storage.shared()
}

/// Signed jump moving the outputs `spent` to `system`.
pub fn jump_event(
    index: u32,
    rules: &Rules,
    keypair: &FleetKeyPair,
    spent: &[&str],
    system: &str,
) -> Event {
    let inputs = spent
        .iter()
        .enumerate()
        .map(|(i, key)| EventInput {
            index: i as u32,
            key: key.to_string(),
        })
        .collect();
    let output = EventOutput {
        index: 0,
        fleet: Fleet::hash_only(keypair.fleet_hash()),
        output_type: EventType::Jump,
        key: new_ledger_key(),
        location: Some(sha256_hex(system)),
        model: OutputModel::Vessel(Vessel::probe(rules.probe_reward)),
    };
    Event::new(
        index,
        new_ledger_key(),
        rules.event_version,
        Fleet::from_keypair(keypair),
        EventType::Jump,
        inputs,
        vec![output],
    )
    .signed(keypair)
    .unwrap()
}

/// Assemble and seal a block on `previous_hash` without caching it.
pub fn mine<S: LedgerStore>(
    storage: &ChainStorageService<S>,
    previous_hash: &str,
    rules: &Rules,
    keypair: &FleetKeyPair,
    time: u64,
) -> Block {
    mine_with(storage, previous_hash, rules, keypair, time, Vec::new())
}

/// [`mine`] with `extra` events after the reward.
pub fn mine_with<S: LedgerStore>(
    storage: &ChainStorageService<S>,
    previous_hash: &str,
    rules: &Rules,
    keypair: &FleetKeyPair,
    time: u64,
    extra: Vec<Event>,
) -> Block {
    let lineage = storage.lineage_for(previous_hash, rules).unwrap();
    let mut candidate =
        assemble_candidate(previous_hash, &lineage, rules, keypair, "fixture", time).unwrap();
    if !extra.is_empty() {
        let mut events = candidate.events;
        events.extend(extra);
        candidate = lineage.apply(Block::candidate(
            previous_hash,
            lineage.height,
            rules.version,
            lineage.difficulty,
            time,
            "fixture",
            events,
        ));
    }
    let target = Target::from_difficulty(candidate.difficulty, rules.difficulty_fudge).unwrap();
    let limits = SearchLimits {
        maximum_nonce: rules.maximum_nonce,
        check_interval: 1_000_000,
        timeout_secs: 60,
    };
    search_nonce(
        candidate,
        &target,
        &limits,
        &FixedTimeSource::new(time),
        &AtomicBool::new(false),
    )
    .unwrap()
    .block
}

/// Mine on `previous_hash` and cache the result.
pub fn mine_and_cache<S: LedgerStore>(
    storage: &SharedChainStorage<S>,
    previous_hash: &str,
    rules: &Rules,
    keypair: &FleetKeyPair,
    time: u64,
) -> Block {
    let block = mine(&*storage.read(), previous_hash, rules, keypair, time);
    storage
        .write()
        .cache_block(block, rules)
        .unwrap()
        .into_block()
}

/// A fresh ledger holding a single chain of `length` blocks, one every
/// `spacing` seconds ending at [`NOW`].
pub fn chain_of(
    length: u64,
    spacing: u64,
    rules: &Rules,
    keypair: &FleetKeyPair,
) -> (SharedChainStorage<InMemoryLedgerStore>, Vec<Block>) {
    let storage = ledger(rules);
    let mut previous = rules.empty_target.clone();
    let mut blocks = Vec::new();
    for i in 0..length {
        let time = NOW - spacing * (length - 1 - i);
        let block = mine_and_cache(&storage, &previous, rules, keypair, time);
        previous = block.hash.clone();
        blocks.push(block);
    }
    (storage, blocks)
}
