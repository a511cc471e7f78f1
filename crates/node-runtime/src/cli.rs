//! Command line surface of the `starlog` binary.
//!
//! Each subcommand takes at most one of its flags; without a flag it lists.

use clap::{Args, Parser, Subcommand};
use sl_04_block_production::ParentSelector;
use std::path::PathBuf;

/// Star Log ledger client.
#[derive(Parser, Debug)]
#[command(name = "starlog")]
#[command(about = "Star Log proof-of-work ledger client", version)]
pub struct Cli {
    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding the ledger snapshot (overrides SL_DATA_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Mine a block, store it and broadcast it to peers
    Probe(ProbeArgs),
    /// Run one synchronization round with every peer
    Sync,
    /// List or manage peers
    Nodes(NodesArgs),
    /// Print or reset the consensus rules
    Rules(RulesArgs),
    /// List or manage accounts
    Account(AccountArgs),
    /// List vessels owned by the active account
    Fleets(FleetsArgs),
    /// List stored blocks
    #[command(disable_help_flag = true)]
    Blocks(BlocksArgs),
}

/// Where to mine.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
#[group(multiple = false)]
pub struct ProbeArgs {
    /// Start a new chain
    #[arg(short, long)]
    pub genesis: bool,

    /// Mine on the block whose hash starts with this fragment
    #[arg(short, long, value_name = "HASH_FRAGMENT")]
    pub parent: Option<String>,

    /// Mine on the tip of this chain
    #[arg(short, long, value_name = "CHAIN")]
    pub chain: Option<u64>,
}

impl ProbeArgs {
    /// Parent selection expressed by the flags.
    pub fn selector(&self) -> ParentSelector {
        if self.genesis {
            ParentSelector::Genesis
        } else if let Some(fragment) = &self.parent {
            ParentSelector::HashPrefix(fragment.clone())
        } else if let Some(chain) = self.chain {
            ParentSelector::Chain(chain)
        } else {
            ParentSelector::Highest
        }
    }
}

/// Peer management.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
#[group(multiple = false)]
pub struct NodesArgs {
    /// Add a peer by url and check its rules
    #[arg(short, long, value_name = "URL")]
    pub add: Option<String>,

    /// Remove a peer
    #[arg(short, long, value_name = "ID")]
    pub remove: Option<u64>,

    /// Whitelist a peer and check its rules again
    #[arg(short, long, value_name = "ID")]
    pub ping: Option<u64>,

    /// Exclude a peer from synchronization
    #[arg(short, long, value_name = "ID")]
    pub blacklist: Option<u64>,

    /// Let a blacklisted peer take part again
    #[arg(short, long, value_name = "ID")]
    pub whitelist: Option<u64>,
}

/// Rules management.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct RulesArgs {
    /// Forget the adopted rules
    #[arg(short, long)]
    pub reset: bool,
}

/// Account management.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
#[group(multiple = false)]
pub struct AccountArgs {
    /// Create an account with a fresh keypair
    #[arg(short, long, value_name = "NAME")]
    pub create: Option<String>,

    /// Make an account the active one
    #[arg(short, long, value_name = "NAME")]
    pub set: Option<String>,
}

/// Fleet listing.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct FleetsArgs {
    /// Only count blocks up to the one whose hash starts with this fragment
    #[arg(short, long, value_name = "HASH_FRAGMENT")]
    pub block: Option<String>,
}

/// Block listing.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct BlocksArgs {
    /// Only blocks at this height
    #[arg(short = 'h', long, value_name = "HEIGHT")]
    pub height: Option<u64>,

    /// Print help
    #[arg(long, action = clap::ArgAction::Help)]
    pub help: Option<bool>,
}
