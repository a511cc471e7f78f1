//! # Consensus Rules
//!
//! Network-wide parameters that every honest peer must agree on. A node
//! learns them from the first peer it contacts and compares every later
//! peer against that baseline.

use serde::{Deserialize, Serialize};

use crate::entities::EMPTY_TARGET;

/// Consensus parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rules {
    /// Block format version.
    pub version: u32,
    /// Event format version.
    pub event_version: u32,
    /// Minimum fuel cost of a jump.
    pub jump_cost_min: f64,
    /// Maximum fuel cost of a jump.
    pub jump_cost_max: f64,
    /// Maximum jump distance.
    pub jump_distance_max: f64,
    /// Left rotation applied to unpacked targets, 0 to 8 hex characters.
    pub difficulty_fudge: u8,
    /// Packed difficulty of genesis blocks.
    pub difficulty_start: u32,
    /// Blocks between difficulty recalculations.
    pub difficulty_interval: u64,
    /// Expected seconds per difficulty interval.
    pub difficulty_duration: u64,
    /// Digits of galactic coordinates.
    pub cartesian_digits: u32,
    /// Units a miner may credit itself per block.
    pub probe_reward: u64,
    /// Nonce at which the miner wraps and re-timestamps.
    pub maximum_nonce: u32,
    /// Previous hash of genesis blocks.
    pub empty_target: String,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            version: 0,
            event_version: 0,
            jump_cost_min: 0.1,
            jump_cost_max: 1.0,
            jump_distance_max: 2.0,
            difficulty_fudge: 6,
            difficulty_start: 0x1c00_ffff,
            difficulty_interval: 10,
            difficulty_duration: 600,
            cartesian_digits: 3,
            probe_reward: 10,
            maximum_nonce: 2_147_483_647,
            empty_target: EMPTY_TARGET.to_string(),
        }
    }
}

impl Rules {
    /// Rules with a trivially easy difficulty, for tests.
    ///
    /// With a fudge of 8 and the easiest representable target roughly every
    /// second hash meets the target.
    pub fn for_testing() -> Self {
        Self {
            difficulty_fudge: 8,
            difficulty_start: 0x1c7f_ffff,
            difficulty_interval: 10,
            difficulty_duration: 60,
            ..Self::default()
        }
    }

    /// Names of every field that differs from `other`.
    pub fn mismatched_fields(&self, other: &Rules) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.version != other.version {
            fields.push("version");
        }
        if self.event_version != other.event_version {
            fields.push("event_version");
        }
        if self.jump_cost_min != other.jump_cost_min {
            fields.push("jump_cost_min");
        }
        if self.jump_cost_max != other.jump_cost_max {
            fields.push("jump_cost_max");
        }
        if self.jump_distance_max != other.jump_distance_max {
            fields.push("jump_distance_max");
        }
        if self.difficulty_fudge != other.difficulty_fudge {
            fields.push("difficulty_fudge");
        }
        if self.difficulty_start != other.difficulty_start {
            fields.push("difficulty_start");
        }
        if self.difficulty_interval != other.difficulty_interval {
            fields.push("difficulty_interval");
        }
        if self.difficulty_duration != other.difficulty_duration {
            fields.push("difficulty_duration");
        }
        if self.cartesian_digits != other.cartesian_digits {
            fields.push("cartesian_digits");
        }
        if self.probe_reward != other.probe_reward {
            fields.push("probe_reward");
        }
        if self.maximum_nonce != other.maximum_nonce {
            fields.push("maximum_nonce");
        }
        if self.empty_target != other.empty_target {
            fields.push("empty_target");
        }
        fields
    }

    /// Field-for-field equality.
    pub fn is_match(&self, other: &Rules) -> bool {
        self.mismatched_fields(other).is_empty()
    }
}

impl std::fmt::Display for Rules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "version: {}", self.version)?;
        writeln!(f, "event_version: {}", self.event_version)?;
        writeln!(f, "jump_cost_min: {}", self.jump_cost_min)?;
        writeln!(f, "jump_cost_max: {}", self.jump_cost_max)?;
        writeln!(f, "jump_distance_max: {}", self.jump_distance_max)?;
        writeln!(f, "difficulty_fudge: {}", self.difficulty_fudge)?;
        writeln!(f, "difficulty_start: {:#010x}", self.difficulty_start)?;
        writeln!(f, "difficulty_interval: {}", self.difficulty_interval)?;
        writeln!(f, "difficulty_duration: {}", self.difficulty_duration)?;
        writeln!(f, "cartesian_digits: {}", self.cartesian_digits)?;
        writeln!(f, "probe_reward: {}", self.probe_reward)?;
        writeln!(f, "maximum_nonce: {}", self.maximum_nonce)?;
        write!(f, "empty_target: {}", self.empty_target)
    }
}

/// Per-request limits a peer advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeLimits {
    /// Maximum events per request.
    pub events_limit_max: u32,
    /// Maximum blocks per request.
    pub blocks_limit_max: u32,
}

/// Body of `GET /rules`: the rules flattened together with the limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulesEnvelope {
    /// Consensus rules.
    #[serde(flatten)]
    pub rules: Rules,
    /// Request limits.
    #[serde(flatten)]
    pub limits: NodeLimits,
}
