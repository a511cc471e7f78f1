//! Candidate Assembly - Pure Domain Logic
//!
//! A candidate is an unsealed block on top of a chosen parent carrying a
//! single signed reward event that credits the miner's fleet with one
//! probe.

use shared_crypto::FleetKeyPair;
use shared_types::{
    new_ledger_key, Block, Event, EventOutput, EventType, Fleet, Rules, Timestamp, MAX_META_BYTES,
};
use sl_02_chain_storage::Lineage;

use crate::error::{MiningError, Result};

/// Which block a probe builds on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ParentSelector {
    /// Start a new chain from the empty target.
    Genesis,
    /// The unique block whose hash starts with this fragment.
    HashPrefix(String),
    /// The tip of a chain.
    Chain(u64),
    /// The tip of the highest chain, genesis when nothing is stored.
    #[default]
    Highest,
}

impl std::fmt::Display for ParentSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParentSelector::Genesis => write!(f, "genesis"),
            ParentSelector::HashPrefix(fragment) => write!(f, "block {fragment}"),
            ParentSelector::Chain(chain) => write!(f, "tip of chain {chain}"),
            ParentSelector::Highest => write!(f, "highest block"),
        }
    }
}

/// The non-spendable reward event of a probe.
pub fn reward_event(rules: &Rules, keypair: &FleetKeyPair) -> Result<Event> {
    let output = EventOutput::reward(0, keypair.fleet_hash(), rules.probe_reward);
    let event = Event::new(
        0,
        new_ledger_key(),
        rules.event_version,
        Fleet::from_keypair(keypair),
        EventType::Reward,
        Vec::new(),
        vec![output],
    );
    Ok(event.signed(keypair)?)
}

/// Unsealed block on top of `previous_hash` at the given lineage.
pub fn assemble_candidate(
    previous_hash: &str,
    lineage: &Lineage,
    rules: &Rules,
    keypair: &FleetKeyPair,
    meta: &str,
    now: Timestamp,
) -> Result<Block> {
    if meta.len() > MAX_META_BYTES {
        return Err(MiningError::MetaTooLong {
            length: meta.len(),
            max: MAX_META_BYTES,
        });
    }

    let event = reward_event(rules, keypair)?;
    let block = Block::candidate(
        previous_hash,
        lineage.height,
        rules.version,
        lineage.difficulty,
        now,
        meta,
        vec![event],
    );
    Ok(lineage.apply(block))
}
