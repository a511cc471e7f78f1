//! # Validation Errors
//!
//! Every variant names the offending field or rule. Validation failures are
//! always surfaced and never retried.

use shared_types::EventType;
use sl_01_difficulty::DifficultyError;
use thiserror::Error;

/// Result type alias for validation
pub type Result<T> = std::result::Result<T, ValidationError>;

/// A named validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Field is not a lowercase hex SHA-256.
    #[error("Field {field} is not a hash: {value:?}")]
    MalformedHash {
        /// Dotted path of the field.
        field: String,
        /// Offending value.
        value: String,
    },

    /// A required field is absent.
    #[error("Missing field: {field}")]
    MissingField {
        /// Dotted path of the field.
        field: String,
    },

    /// Meta text exceeds the byte limit.
    #[error("Meta is {length} bytes, limit is {max}")]
    MetaTooLong {
        /// Actual byte length.
        length: usize,
        /// Allowed byte length.
        max: usize,
    },

    /// A version field disagrees with the rules.
    #[error("{field} is {actual}, rules require {expected}")]
    VersionMismatch {
        /// Dotted path of the field.
        field: String,
        /// Version the rules require.
        expected: u32,
        /// Version on the entity.
        actual: u32,
    },

    /// A stored hash does not match its recomputation.
    #[error("Sha256 of {field} does not match: expected {expected}, got {actual}")]
    HashMismatch {
        /// Dotted path of the field.
        field: String,
        /// Recomputed hash.
        expected: String,
        /// Claimed hash.
        actual: String,
    },

    /// The block hash does not sort below its target.
    #[error("Hash {hash} is greater than packed target {difficulty:#010x}")]
    DifficultyNotMet {
        /// Block hash.
        hash: String,
        /// Packed difficulty.
        difficulty: u32,
    },

    /// The block claims a difficulty other than its lineage requires.
    #[error("Difficulty {actual:#010x} does not match required {expected:#010x}")]
    DifficultyMismatch {
        /// Difficulty derived from the lineage.
        expected: u32,
        /// Claimed difficulty.
        actual: u32,
    },

    /// Block time is ahead of the local clock.
    #[error("Time {time} is greater than the current time {now}")]
    FutureTimestamp {
        /// Block time.
        time: u64,
        /// Local clock.
        now: u64,
    },

    /// The event signature does not verify.
    #[error("Invalid signature on event {event}: {reason}")]
    InvalidSignature {
        /// Event key.
        event: String,
        /// Verifier diagnostic.
        reason: String,
    },

    /// Two siblings share an index.
    #[error("Duplicate {field} index {index}")]
    DuplicateIndex {
        /// Collection holding the duplicates.
        field: String,
        /// Repeated index.
        index: u32,
    },

    /// A key appears twice across the block.
    #[error("Event {field} key {key} is listed more than once")]
    DuplicateKey {
        /// `input` or `output`.
        field: &'static str,
        /// Repeated key.
        key: String,
    },

    /// An output's type differs from its event's type.
    #[error("{expected} outputs must be of type {expected}, got {actual}")]
    OutputTypeMismatch {
        /// Event type.
        expected: EventType,
        /// Output type.
        actual: EventType,
    },

    /// An event breaks the input/output shape of its type.
    #[error("Invalid {event_type} event: {reason}")]
    InvalidShape {
        /// Event type.
        event_type: EventType,
        /// Broken rule.
        reason: &'static str,
    },

    /// Reward outputs exceed the per-block budget.
    #[error("Rewarded {claimed} units, budget is {budget}")]
    RewardExceeded {
        /// Units claimed so far.
        claimed: u64,
        /// Allowed units per block.
        budget: u64,
    },

    /// Non-genesis block whose parent is unknown.
    #[error("Unknown parent {previous_hash}")]
    UnknownParent {
        /// Missing parent hash.
        previous_hash: String,
    },

    /// Height is not parent height + 1 (or zero for genesis).
    #[error("Invalid height: expected {expected}, got {actual}")]
    InvalidHeight {
        /// Required height.
        expected: u64,
        /// Claimed height.
        actual: u64,
    },

    /// An input references an output the lineage never created.
    #[error("Input {key} references an unknown output")]
    UnknownInput {
        /// Input key.
        key: String,
    },

    /// An input references an output already consumed on this chain.
    #[error("Input {key} is already spent")]
    DoubleSpend {
        /// Input key.
        key: String,
    },

    /// The rules carry an unusable difficulty configuration.
    #[error("Difficulty error: {0}")]
    Difficulty(#[from] DifficultyError),
}
