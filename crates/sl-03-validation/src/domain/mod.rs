//! Domain layer for block validation
//!
//! All checks are pure: no I/O, no clock. The caller supplies the current
//! time and, for contextual checks, the parent and spend index.

mod block_validation;
mod context;
mod errors;
mod event_validation;

pub use block_validation::*;
pub use context::*;
pub use errors::*;
pub use event_validation::{check_shape, validate_event};
