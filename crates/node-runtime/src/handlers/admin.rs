//! Local state commands: `nodes`, `rules` and `account`.

use anyhow::{Context, Result};
use shared_crypto::FleetKeyPair;
use shared_types::{Account, Node, Rules};
use sl_02_chain_storage::{short_hash, LedgerStore};
use sl_05_node_sync::{PeerClient, PeerContact, PeerStanding};

use crate::cli::{AccountArgs, NodesArgs, RulesArgs};
use crate::container::NodeContainer;

/// Reason recorded by `nodes -b`.
const MANUAL_BLACKLIST_REASON: &str = "blacklisted by operator";

fn render_node(node: &Node) -> String {
    let mut out = format!("[{}] {}", node.id.unwrap_or_default(), node.url);
    if node.blacklisted {
        out.push_str(&format!(
            "\n    blacklisted: {}",
            node.blacklist_reason.as_deref().unwrap_or("no reason recorded")
        ));
    } else if node.is_active() {
        out.push_str(&format!(
            "\n    active, last response {}, limits {} blocks / {} events",
            node.last_response_datetime, node.blocks_limit_max, node.events_limit_max
        ));
    } else {
        out.push_str("\n    inactive");
    }
    out
}

fn render_contact(contact: &PeerContact) -> String {
    let standing = match &contact.standing {
        PeerStanding::RulesAdopted => "rules adopted".to_string(),
        PeerStanding::RulesMatched => "rules match".to_string(),
        PeerStanding::Blacklisted { reason } => format!("blacklisted, {reason}"),
        PeerStanding::Unreachable { reason } => format!("unreachable, {reason}"),
    };
    format!("{}\n    {}", render_node(&contact.node), standing)
}

/// Peer management; lists peers without a flag.
pub async fn nodes<S, C>(container: &NodeContainer<S, C>, args: &NodesArgs) -> Result<String>
where
    S: LedgerStore + 'static,
    C: PeerClient + 'static,
{
    let sync = &container.sync;

    if let Some(url) = &args.add {
        let contact = sync
            .add_peer(url)
            .await
            .with_context(|| format!("cannot add peer {url}"))?;
        return Ok(format!("Added {}", render_contact(&contact)));
    }
    if let Some(id) = args.remove {
        sync.remove_peer(id)
            .with_context(|| format!("cannot remove peer {id}"))?;
        return Ok(format!("Removed peer {id}"));
    }
    if let Some(id) = args.ping {
        let contact = sync
            .ping_peer(id)
            .await
            .with_context(|| format!("cannot ping peer {id}"))?;
        return Ok(format!("Pinged {}", render_contact(&contact)));
    }
    if let Some(id) = args.blacklist {
        let node = sync
            .blacklist_peer(id, MANUAL_BLACKLIST_REASON)
            .with_context(|| format!("cannot blacklist peer {id}"))?;
        return Ok(format!("Blacklisted {}", render_node(&node)));
    }
    if let Some(id) = args.whitelist {
        let node = sync
            .whitelist_peer(id)
            .with_context(|| format!("cannot whitelist peer {id}"))?;
        return Ok(format!("Whitelisted {}", render_node(&node)));
    }

    let peers = sync.peers()?;
    if peers.is_empty() {
        return Ok("No peers, add one with `nodes -a <url>`".to_string());
    }
    Ok(peers.iter().map(render_node).collect::<Vec<_>>().join("\n"))
}

/// Print the adopted rules, or forget them.
pub fn rules<S, C>(container: &NodeContainer<S, C>, args: &RulesArgs) -> Result<String>
where
    S: LedgerStore + 'static,
    C: PeerClient + 'static,
{
    if args.reset {
        container.storage.write().drop_rules()?;
        return Ok("Rules reset, the next peer contacted will supply them".to_string());
    }

    Ok(match container.storage.read().find_rules()? {
        Some(rules) => rules.to_string(),
        None => format!("No rules adopted yet, local defaults:\n{}", Rules::default()),
    })
}

/// Account management; lists accounts without a flag.
pub async fn account<S, C>(container: &NodeContainer<S, C>, args: &AccountArgs) -> Result<String>
where
    S: LedgerStore + 'static,
    C: PeerClient + 'static,
{
    if let Some(name) = &args.create {
        let bits = container.config.key_bits;
        let keypair = tokio::task::spawn_blocking(move || FleetKeyPair::generate(bits))
            .await
            .context("key generation was interrupted")?
            .context("key generation failed")?;
        let account = Account::from_keypair(name.as_str(), &keypair)?;
        let account = container
            .storage
            .write()
            .create_account(account)
            .with_context(|| format!("cannot create account {name}"))?;

        let mut out = format!(
            "Created account {} with fleet {}",
            account.name,
            account.fleet_hash()
        );
        if account.active {
            out.push_str("\nIt is now the active account");
        }
        return Ok(out);
    }

    if let Some(name) = &args.set {
        let account = container
            .storage
            .write()
            .set_active_account(name)
            .with_context(|| format!("cannot activate account {name}"))?;
        return Ok(format!("Active account is now {}", account.name));
    }

    let accounts = container.storage.read().accounts()?;
    if accounts.is_empty() {
        return Ok("No accounts, create one with `account -c <name>`".to_string());
    }
    Ok(accounts
        .iter()
        .map(|account| {
            format!(
                "{} {} {}",
                if account.active { "*" } else { " " },
                account.name,
                short_hash(&account.fleet_hash())
            )
        })
        .collect::<Vec<_>>()
        .join("\n"))
}
