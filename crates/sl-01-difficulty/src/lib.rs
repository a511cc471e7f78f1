//! # Star Log - Difficulty Codec (Subsystem 01)
//!
//! **Bounded Context:** Proof-of-Work Targets
//!
//! ## Purpose
//!
//! Converts between the packed `u32` difficulty stored in every block and the
//! 64 character hex target a block hash must sort below, and recalculates the
//! difficulty once per interval.
//!
//! ## Module Structure
//!
//! - [`codec`]: compact pack/unpack, fudge rotation, [`Target`] comparison
//! - [`adjustment`]: interval detection and elapsed-time recalculation
//! - [`error`]: [`DifficultyError`]
//!
//! ## Usage Example
//!
//! ```rust
//! use sl_01_difficulty::{unpack_stripped, Target};
//!
//! let target = Target::from_difficulty(0x1c00_ffff, 6).unwrap();
//! assert_eq!(target.stripped(), unpack_stripped(0x1c00_ffff, 6).unwrap());
//! assert!(target.is_met_by(&"0".repeat(64)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adjustment;
pub mod codec;
pub mod error;

pub use adjustment::{is_difficulty_changing, maximum_target, recalculate};
pub use codec::{
    decode_compact, encode_compact, pack, rotate_left, rotate_right, target_from_hex,
    target_to_hex, unpack, unpack_stripped, Target, EASIEST_DIFFICULTY, MAX_FUDGE,
    TARGET_HEX_LEN,
};
pub use error::{DifficultyError, Result};
