//! Error types for the difficulty codec

use thiserror::Error;

/// Result type alias for difficulty operations
pub type Result<T> = std::result::Result<T, DifficultyError>;

/// Errors that can occur while packing, unpacking or recalculating a difficulty
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DifficultyError {
    /// The rules carry a rotation the codec cannot apply
    #[error("Difficulty fudge {fudge} is out of range 0..=8")]
    FudgeOutOfRange {
        /// Offending fudge
        fudge: u8,
    },

    /// A target string is not 64 hex characters
    #[error("Malformed target: {reason}")]
    MalformedTarget {
        /// Parser diagnostic
        reason: String,
    },

    /// A zero target can never be met and has no packed form
    #[error("Target is zero")]
    ZeroTarget,

    /// The rules carry a zero difficulty duration
    #[error("Difficulty duration must be non-zero")]
    InvalidDuration,
}
