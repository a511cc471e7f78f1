//! Chain commands: `probe`, `sync`, `blocks` and `fleets`.

use anyhow::{bail, Context, Result};
use shared_types::{Block, EventOutput, OutputModel, Rules};
use sl_01_difficulty::unpack_stripped;
use sl_02_chain_storage::{short_hash, ChainStorageService, LedgerStore};
use sl_05_node_sync::PeerClient;
use std::fmt::Write;

use crate::cli::{BlocksArgs, FleetsArgs, ProbeArgs};
use crate::container::NodeContainer;

/// Blocks listed by `blocks -h`.
const HEIGHT_LIST_LIMIT: usize = 100;

fn or_dash(value: Option<u64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Mine on the selected parent, then store and broadcast the block.
pub async fn probe<S, C>(container: &NodeContainer<S, C>, args: &ProbeArgs) -> Result<String>
where
    S: LedgerStore + 'static,
    C: PeerClient + 'static,
{
    let selector = args.selector();
    let report = container
        .probe
        .probe(selector.clone())
        .await
        .with_context(|| format!("probe on {selector} failed"))?;

    let block = &report.block;
    let mut out = format!("Probed block {}\n", block.hash);
    writeln!(
        out,
        "  height {}, chain {}, difficulty {:#010x}{}",
        block.height,
        or_dash(block.chain),
        block.difficulty,
        if report.forked { ", new fork" } else { "" }
    )?;
    writeln!(
        out,
        "  {} attempts in {}s, {} retimes",
        report.attempts, report.elapsed_secs, report.retimes
    )?;
    write!(out, "  accepted by {} peer(s)", report.accepted_peers)?;
    Ok(out)
}

/// One reconciliation round.
pub async fn sync<S, C>(container: &NodeContainer<S, C>) -> Result<String>
where
    S: LedgerStore + 'static,
    C: PeerClient + 'static,
{
    let report = container
        .sync
        .sync()
        .await
        .context("synchronization failed")?;

    let mut out = report.to_string();
    if report.rules_adopted {
        out.push_str("\nAdopted rules from the first responding peer");
    }
    Ok(out)
}

fn render_block(block: &Block, rules: &Rules) -> String {
    let target = unpack_stripped(block.difficulty, rules.difficulty_fudge)
        .unwrap_or_else(|_| "?".to_string());
    format!(
        "[{}] {} height {} chain {} difficulty {:#010x} (target {}) events {}",
        or_dash(block.id),
        short_hash(&block.hash),
        block.height,
        or_dash(block.chain),
        block.difficulty,
        target,
        block.events.len()
    )
}

/// List stored blocks, optionally only those at one height.
pub fn blocks<S, C>(container: &NodeContainer<S, C>, args: &BlocksArgs) -> Result<String>
where
    S: LedgerStore + 'static,
    C: PeerClient + 'static,
{
    let storage = container.storage.read();
    let rules = storage.find_rules()?.unwrap_or_default();
    let blocks = match args.height {
        Some(height) => storage.blocks_at_height(height, HEIGHT_LIST_LIMIT)?,
        None => storage.all_blocks()?,
    };

    if blocks.is_empty() {
        return Ok(match args.height {
            Some(height) => format!("No blocks at height {height}"),
            None => "No blocks stored".to_string(),
        });
    }

    let lines: Vec<String> = blocks
        .iter()
        .map(|block| render_block(block, &rules))
        .collect();
    Ok(lines.join("\n"))
}

fn unique_block<S: LedgerStore>(
    storage: &ChainStorageService<S>,
    fragment: &str,
) -> Result<Block> {
    let mut matches = storage.find_blocks_by_hash_prefix(fragment)?;
    match matches.len() {
        0 => bail!("no block hash starts with {fragment}"),
        1 => Ok(matches.remove(0)),
        n => bail!("{fragment} matches {n} blocks, use a longer fragment"),
    }
}

fn render_vessel(output: &EventOutput) -> String {
    let OutputModel::Vessel(vessel) = &output.model;
    format!(
        "{} {} vessel, {} modules, fuel {}, at {}",
        short_hash(&output.key),
        output.output_type,
        vessel.modules.len(),
        output.amount(),
        output.location.as_deref().map_or("origin", short_hash)
    )
}

/// Vessels of the active account still unspent on the chosen lineage.
pub fn fleets<S, C>(container: &NodeContainer<S, C>, args: &FleetsArgs) -> Result<String>
where
    S: LedgerStore + 'static,
    C: PeerClient + 'static,
{
    let storage = container.storage.read();
    let account = storage
        .active_account()?
        .context("no active account, create one with `account -c <name>`")?;

    let head = match &args.block {
        Some(fragment) => unique_block(&storage, fragment)?,
        None => match storage.highest_block()? {
            Some(block) => block,
            None => return Ok("No blocks stored".to_string()),
        },
    };

    let fleet_hash = account.fleet_hash();
    let outputs = storage.unused_outputs(&head.hash, &fleet_hash)?;
    let mut out = format!(
        "Fleet {} of {} at block {} (height {})",
        short_hash(&fleet_hash),
        account.name,
        short_hash(&head.hash),
        head.height
    );
    if outputs.is_empty() {
        out.push_str("\n  no vessels");
    }
    for output in &outputs {
        write!(out, "\n  {}", render_vessel(output))?;
    }
    Ok(out)
}
