//! # Star Log - Node Runtime
//!
//! Library half of the `starlog` binary, exposed for testing.
//!
//! - [`cli`]: clap command line definition
//! - [`container`]: configuration and subsystem wiring
//! - [`handlers`]: one function per command, returning the text to print

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod container;
pub mod handlers;

pub use cli::{Cli, Command};
pub use container::{LiveContainer, NodeConfig, NodeContainer};
