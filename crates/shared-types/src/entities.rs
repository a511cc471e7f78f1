//! # Core Ledger Entities
//!
//! Defines the star log entities and their canonical concatenation rules.
//!
//! ## Clusters
//!
//! - **Chain**: `Block`
//! - **Events**: `Event`, `EventInput`, `EventOutput`, `Fleet`
//! - **Assets**: `OutputModel`, `Vessel`, `Module`, `Resource`
//!
//! ## Canonical Form
//!
//! Inputs, outputs, modules and events are always concatenated in ascending
//! `index` order, regardless of the order they are stored in. Every hash is
//! the lowercase hex SHA-256 of the concatenated string.

use serde::{Deserialize, Serialize};
use shared_crypto::{sha256_hex, verify_signature, FleetKeyPair};
use std::fmt;
use uuid::Uuid;

use crate::errors::ModelError;

/// Reserved all-zero hash. A block whose `previous_hash` equals it is a genesis block.
pub const EMPTY_TARGET: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Maximum size of the free text `meta` field, in bytes.
pub const MAX_META_BYTES: usize = 255;

/// Generate a fresh, globally unique ledger key (hex-64).
pub fn new_ledger_key() -> String {
    sha256_hex(Uuid::new_v4().to_string())
}

/// Entities ordered by an explicit `index` field.
pub trait Indexed {
    /// Position of this entity within its parent.
    fn index(&self) -> u32;
}

/// Borrow `items` sorted by index. Ties keep their stored order.
pub fn sorted_by_index<T: Indexed>(items: &[T]) -> Vec<&T> {
    let mut sorted: Vec<&T> = items.iter().collect();
    sorted.sort_by_key(|item| item.index());
    sorted
}

// =============================================================================
// CLUSTER A: ASSETS
// =============================================================================

/// Fungible contents of a cargo hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resource {
    /// Units of fuel.
    pub fuel: u64,
}

impl Resource {
    /// Fuel, or nothing when empty.
    pub fn concat(&self) -> String {
        if self.fuel == 0 {
            String::new()
        } else {
            self.fuel.to_string()
        }
    }
}

/// Cargo hold module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CargoModule {
    /// Position within the vessel.
    pub index: u32,
    /// Blueprint hash.
    pub blueprint: String,
    /// Toggle state.
    pub delta: bool,
    /// Health, zero means disabled.
    pub health: u32,
    /// Stored resources.
    pub contents: Resource,
    /// Maximum mass the hold accepts.
    pub mass_limit: u64,
}

/// Jump drive module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JumpDriveModule {
    /// Position within the vessel.
    pub index: u32,
    /// Blueprint hash.
    pub blueprint: String,
    /// Toggle state.
    pub delta: bool,
    /// Health, zero means disabled.
    pub health: u32,
}

/// A vessel module, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Module {
    /// Cargo hold.
    Cargo(CargoModule),
    /// Jump drive.
    JumpDrive(JumpDriveModule),
}

impl Module {
    /// Blueprint hash.
    pub fn blueprint(&self) -> &str {
        match self {
            Module::Cargo(m) => &m.blueprint,
            Module::JumpDrive(m) => &m.blueprint,
        }
    }

    /// Whether the module is toggled.
    pub fn delta(&self) -> bool {
        match self {
            Module::Cargo(m) => m.delta,
            Module::JumpDrive(m) => m.delta,
        }
    }

    /// Module health.
    pub fn health(&self) -> u32 {
        match self {
            Module::Cargo(m) => m.health,
            Module::JumpDrive(m) => m.health,
        }
    }

    /// A module with zero health is disabled.
    pub fn is_disabled(&self) -> bool {
        self.health() == 0
    }

    /// `blueprint ∥ delta ∥ health`, cargo modules append their contents.
    ///
    /// The delta flag renders as `True` or `False`, the spelling every
    /// existing ledger hashed.
    pub fn concat(&self) -> String {
        let delta = if self.delta() { "True" } else { "False" };
        let mut out = format!("{}{}{}", self.blueprint(), delta, self.health());
        if let Module::Cargo(cargo) = self {
            out.push_str(&cargo.contents.concat());
        }
        out
    }
}

impl Indexed for Module {
    fn index(&self) -> u32 {
        match self {
            Module::Cargo(m) => m.index,
            Module::JumpDrive(m) => m.index,
        }
    }
}

/// A ship built from a blueprint and a set of modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vessel {
    /// Blueprint hash.
    pub blueprint: String,
    /// Modules, ordered by index when hashed.
    pub modules: Vec<Module>,
}

impl Vessel {
    /// The probe minted by a block reward: one cargo hold carrying `fuel`
    /// and one jump drive.
    pub fn probe(fuel: u64) -> Self {
        Self {
            blueprint: sha256_hex("probe"),
            modules: vec![
                Module::Cargo(CargoModule {
                    index: 0,
                    blueprint: sha256_hex("probe.cargo"),
                    delta: false,
                    health: 100,
                    contents: Resource { fuel },
                    mass_limit: fuel,
                }),
                Module::JumpDrive(JumpDriveModule {
                    index: 1,
                    blueprint: sha256_hex("probe.jump_drive"),
                    delta: false,
                    health: 100,
                }),
            ],
        }
    }

    /// `blueprint ∥ Σ module.concat()` in index order.
    pub fn concat(&self) -> String {
        let mut out = self.blueprint.clone();
        for module in sorted_by_index(&self.modules) {
            out.push_str(&module.concat());
        }
        out
    }

    /// Total fuel held across all cargo modules.
    pub fn fuel(&self) -> u64 {
        self.modules
            .iter()
            .filter_map(|m| match m {
                Module::Cargo(cargo) => Some(cargo.contents.fuel),
                Module::JumpDrive(_) => None,
            })
            .fold(0u64, |acc, fuel| acc.saturating_add(fuel))
    }
}

/// Polymorphic output payload, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputModel {
    /// A vessel.
    Vessel(Vessel),
}

impl OutputModel {
    /// Canonical concatenation of the payload.
    pub fn concat(&self) -> String {
        match self {
            OutputModel::Vessel(vessel) => vessel.concat(),
        }
    }

    /// Units the payload credits to its owner.
    pub fn amount(&self) -> u64 {
        match self {
            OutputModel::Vessel(vessel) => vessel.fuel(),
        }
    }
}

// =============================================================================
// CLUSTER B: EVENTS
// =============================================================================

/// Kind of state transition an event performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Mints new outputs for the block's miner.
    Reward,
    /// Moves vessels between systems.
    Jump,
    /// Resolves combat between vessels.
    Attack,
}

impl EventType {
    /// Wire and concatenation name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Reward => "reward",
            EventType::Jump => "jump",
            EventType::Attack => "attack",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a fleet keypair.
///
/// Events carry the public key so signatures can be checked; outputs only
/// need the hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fleet {
    /// `SHA-256(public_key)`.
    pub hash: String,
    /// Shrunk public key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

impl Fleet {
    /// Full reference derived from a keypair.
    pub fn from_keypair(keypair: &FleetKeyPair) -> Self {
        Self {
            hash: keypair.fleet_hash(),
            public_key: Some(keypair.public_key().to_string()),
        }
    }

    /// Hash-only reference.
    pub fn hash_only(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            public_key: None,
        }
    }
}

/// Consumes a previously created output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInput {
    /// Position within the event.
    pub index: u32,
    /// Key of the consumed output.
    pub key: String,
}

impl EventInput {
    /// An input concatenates to its key.
    pub fn concat(&self) -> String {
        self.key.clone()
    }
}

impl Indexed for EventInput {
    fn index(&self) -> u32 {
        self.index
    }
}

/// Creates a new spendable asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOutput {
    /// Position within the event.
    pub index: u32,
    /// Owning fleet.
    pub fleet: Fleet,
    /// Type of the event that created this output.
    pub output_type: EventType,
    /// Unique key, referenced by later inputs.
    pub key: String,
    /// Star system hash. `None` inherits the block's location.
    #[serde(default)]
    pub location: Option<String>,
    /// Payload.
    pub model: OutputModel,
}

impl EventOutput {
    /// A reward output crediting a probe carrying `fuel` to `fleet_hash`.
    pub fn reward(index: u32, fleet_hash: impl Into<String>, fuel: u64) -> Self {
        Self {
            index,
            fleet: Fleet::hash_only(fleet_hash),
            output_type: EventType::Reward,
            key: new_ledger_key(),
            location: None,
            model: OutputModel::Vessel(Vessel::probe(fuel)),
        }
    }

    /// `output_type ∥ fleet_hash ∥ key ∥ location ∥ model`.
    pub fn concat(&self) -> String {
        format!(
            "{}{}{}{}{}",
            self.output_type,
            self.fleet.hash,
            self.key,
            self.location.as_deref().unwrap_or(""),
            self.model.concat()
        )
    }

    /// Hash of this output alone.
    pub fn hash(&self) -> String {
        sha256_hex(self.concat())
    }

    /// Units credited by this output.
    pub fn amount(&self) -> u64 {
        self.model.amount()
    }
}

impl Indexed for EventOutput {
    fn index(&self) -> u32 {
        self.index
    }
}

/// A signed state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Position within the block.
    pub index: u32,
    /// `SHA-256(concat)`, empty until signed.
    pub hash: String,
    /// Globally unique key.
    pub key: String,
    /// Event format version.
    pub version: u32,
    /// Owning fleet, with public key.
    pub fleet: Fleet,
    /// Kind of transition.
    pub event_type: EventType,
    /// Consumed outputs.
    pub inputs: Vec<EventInput>,
    /// Created outputs.
    pub outputs: Vec<EventOutput>,
    /// Hex RSA-PSS signature of `hash`, empty until signed.
    pub signature: String,
}

impl Event {
    /// Unsigned event. Call [`Event::signed`] before attaching it to a block.
    pub fn new(
        index: u32,
        key: impl Into<String>,
        version: u32,
        fleet: Fleet,
        event_type: EventType,
        inputs: Vec<EventInput>,
        outputs: Vec<EventOutput>,
    ) -> Self {
        Self {
            index,
            hash: String::new(),
            key: key.into(),
            version,
            fleet,
            event_type,
            inputs,
            outputs,
            signature: String::new(),
        }
    }

    /// The fleet public key, required on every event.
    pub fn fleet_public_key(&self) -> Result<&str, ModelError> {
        self.fleet
            .public_key
            .as_deref()
            .ok_or_else(|| ModelError::MissingField {
                field: "fleet.public_key".to_string(),
            })
    }

    /// `version ∥ key ∥ fleet_hash ∥ fleet_public_key ∥ event_type ∥ Σ inputs ∥ Σ output hashes`.
    pub fn concat(&self) -> Result<String, ModelError> {
        let mut out = format!(
            "{}{}{}{}{}",
            self.version,
            self.key,
            self.fleet.hash,
            self.fleet_public_key()?,
            self.event_type
        );
        for input in sorted_by_index(&self.inputs) {
            out.push_str(&input.concat());
        }
        for output in sorted_by_index(&self.outputs) {
            out.push_str(&output.hash());
        }
        Ok(out)
    }

    /// Recompute the event hash from its fields.
    pub fn compute_hash(&self) -> Result<String, ModelError> {
        Ok(sha256_hex(self.concat()?))
    }

    /// Hash and sign the event with the owning fleet's keypair.
    ///
    /// # Errors
    ///
    /// - `FleetMismatch` if the keypair does not own the event's fleet
    /// - `Crypto` if signing fails
    pub fn signed(mut self, keypair: &FleetKeyPair) -> Result<Self, ModelError> {
        let fleet_hash = keypair.fleet_hash();
        if fleet_hash != self.fleet.hash {
            return Err(ModelError::FleetMismatch {
                expected: self.fleet.hash,
                actual: fleet_hash,
            });
        }
        self.fleet.public_key = Some(keypair.public_key().to_string());
        self.hash = self.compute_hash()?;
        self.signature = keypair.sign(&self.hash)?;
        tracing::trace!("Signed event {} of type {}", self.key, self.event_type);
        Ok(self)
    }

    /// Check the signature against the fleet public key.
    pub fn verify_signature(&self) -> Result<(), ModelError> {
        verify_signature(self.fleet_public_key()?, &self.hash, &self.signature)?;
        Ok(())
    }
}

impl Indexed for Event {
    fn index(&self) -> u32 {
        self.index
    }
}

// =============================================================================
// CLUSTER C: THE CHAIN
// =============================================================================

/// One link of the star log.
///
/// Only the header fields (`version`, `previous_hash`, `difficulty`,
/// `events_hash`, `meta_hash`, `time`, `nonce`) are committed by `hash`.
/// `id`, `previous_id`, `interval_id`, `root_id` and `chain` are local
/// bookkeeping assigned by chain storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Local storage id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// `SHA-256(header concat with nonce)`.
    pub hash: String,
    /// Proof-of-work nonce.
    pub nonce: u32,
    /// Parent hash, or [`EMPTY_TARGET`] for genesis.
    pub previous_hash: String,
    /// Local id of the parent.
    #[serde(default)]
    pub previous_id: Option<u64>,
    /// Distance from genesis.
    pub height: u64,
    /// Byte length of the serialized events.
    #[serde(default)]
    pub size: u64,
    /// Block format version.
    pub version: u32,
    /// Packed difficulty.
    pub difficulty: u32,
    /// Unix seconds.
    pub time: u64,
    /// Local id of the block used for the last difficulty recalculation.
    #[serde(default)]
    pub interval_id: Option<u64>,
    /// Local id of the block this fork branched from.
    #[serde(default)]
    pub root_id: Option<u64>,
    /// Local fork identifier.
    #[serde(default)]
    pub chain: Option<u64>,
    /// Events, ordered by index when hashed.
    pub events: Vec<Event>,
    /// `SHA-256(Σ event.hash)`.
    pub events_hash: String,
    /// Free text.
    #[serde(default)]
    pub meta: String,
    /// `SHA-256(meta)`.
    pub meta_hash: String,
}

impl Block {
    /// Unhashed block with its event and meta commitments computed.
    pub fn candidate(
        previous_hash: impl Into<String>,
        height: u64,
        version: u32,
        difficulty: u32,
        time: u64,
        meta: impl Into<String>,
        events: Vec<Event>,
    ) -> Self {
        let meta = meta.into();
        let mut events = events;
        events.sort_by_key(|e| e.index);
        let size = serde_json::to_vec(&events)
            .map(|bytes| bytes.len() as u64)
            .unwrap_or_default();
        Self {
            id: None,
            hash: String::new(),
            nonce: 0,
            previous_hash: previous_hash.into(),
            previous_id: None,
            height,
            size,
            version,
            difficulty,
            time,
            interval_id: None,
            root_id: None,
            chain: None,
            events_hash: Self::compute_events_hash(&events),
            meta_hash: sha256_hex(&meta),
            meta,
            events,
        }
    }

    /// Genesis blocks point at the ledger's empty target.
    pub fn is_genesis(&self, empty_target: &str) -> bool {
        self.previous_hash == empty_target
    }

    /// `SHA-256(Σ event.hash)` in index order.
    pub fn compute_events_hash(events: &[Event]) -> String {
        let concat: String = sorted_by_index(events)
            .into_iter()
            .map(|e| e.hash.as_str())
            .collect();
        sha256_hex(concat)
    }

    /// Header concatenation without the nonce.
    pub fn header_prefix(&self) -> String {
        format!(
            "{}{}{}{}{}{}",
            self.version,
            self.previous_hash,
            self.difficulty,
            self.events_hash,
            sha256_hex(&self.meta),
            self.time
        )
    }

    /// Header concatenation for a given nonce.
    pub fn header_concat(&self, nonce: u32) -> String {
        format!("{}{}", self.header_prefix(), nonce)
    }

    /// Recompute the block hash from the header and the current nonce.
    pub fn compute_hash(&self) -> String {
        sha256_hex(self.header_concat(self.nonce))
    }

    /// Seal the block with a nonce.
    pub fn sealed(mut self, nonce: u32) -> Self {
        self.nonce = nonce;
        self.hash = self.compute_hash();
        self
    }

    /// Same content with a new timestamp. The result is unsealed.
    pub fn retimed(mut self, time: u64) -> Self {
        self.time = time;
        self.nonce = 0;
        self.hash = String::new();
        self
    }

    /// Attach local bookkeeping assigned by chain storage.
    pub fn with_lineage(
        mut self,
        previous_id: Option<u64>,
        chain: u64,
        root_id: Option<u64>,
        interval_id: Option<u64>,
    ) -> Self {
        self.previous_id = previous_id;
        self.chain = Some(chain);
        self.root_id = root_id;
        self.interval_id = interval_id;
        self
    }

    /// Every input key across all events.
    pub fn input_keys(&self) -> impl Iterator<Item = &str> {
        self.events
            .iter()
            .flat_map(|e| e.inputs.iter().map(|i| i.key.as_str()))
    }

    /// Every output across all events.
    pub fn outputs(&self) -> impl Iterator<Item = &EventOutput> {
        self.events.iter().flat_map(|e| e.outputs.iter())
    }
}
