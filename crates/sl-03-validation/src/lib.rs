//! # Star Log - Validation (Subsystem 03)
//!
//! Decides whether a block received from a peer or produced locally may
//! enter the chain.
//!
//! ## Layers
//!
//! - **Context-free** ([`BlockValidator::validate`]): formats, hashes,
//!   proof-of-work, signatures, event shapes, key uniqueness and the reward
//!   budget. Needs only the block, the rules and the local time.
//! - **Lineage** ([`BlockValidator::validate_lineage`]): height follows the
//!   parent and the difficulty matches what the parent's lineage requires.
//! - **Spends** ([`BlockValidator::validate_spends`]): every input consumes
//!   an output created and not yet consumed on the same chain.
//!
//! [`BlockValidator::validate_in_context`] runs all three in that order.
//!
//! ## Event Shapes
//!
//! | Type   | Inputs | Outputs                               |
//! |--------|--------|---------------------------------------|
//! | reward | 0      | 1 or more, each with units            |
//! | jump   | ≥ 1    | 1 or 2, two outputs in distinct systems |
//! | attack | ≥ 2    | at most as many as inputs             |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod domain;

pub use config::ValidationConfig;
pub use domain::{
    check_shape, validate_event, BlockContext, BlockValidator, Result, ValidationError,
};
