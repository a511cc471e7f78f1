//! Node Synchronization Service
//!
//! One round of reconciliation with every non-blacklisted peer:
//!
//! ```text
//! FetchRules ─► AdoptRules | CompareRules ─► MarkActive | Blacklist
//!            ─► FetchBlocksPaginated ─► Merge
//! ```
//!
//! Requests fan out over a bounded worker pool. Rules decisions are applied
//! in peer order and the merge runs under the storage write lock, because
//! fork detection depends on the chain tips each cache call mutates.

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use shared_types::{Block, Node, Rules, RulesEnvelope, TimeSource};
use sl_02_chain_storage::{
    short_hash, ChainStorageService, LedgerStore, SharedChainStorage, StorageError,
};
use sl_03_validation::{BlockContext, BlockValidator, ValidationConfig};
use sl_04_block_production::BlockBroadcaster;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::ports::{BlocksQuery, PeerClient};

/// How a peer stands after its rules were checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerStanding {
    /// No local rules existed; the peer's were adopted.
    RulesAdopted,
    /// The peer's rules equal the local ones.
    RulesMatched,
    /// The peer's rules differ; it is excluded from synchronization.
    Blacklisted {
        /// Recorded reason, naming the differing fields.
        reason: String,
    },
    /// The peer could not be reached or answered garbage.
    Unreachable {
        /// Transport or parse diagnostic.
        reason: String,
    },
}

impl PeerStanding {
    /// Whether blocks may be requested from the peer this round.
    pub fn is_eligible(&self) -> bool {
        matches!(self, PeerStanding::RulesAdopted | PeerStanding::RulesMatched)
    }
}

/// A peer record after contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerContact {
    /// Updated and persisted peer record.
    pub node: Node,
    /// Outcome of the rules check.
    pub standing: PeerStanding,
}

/// Summary of one synchronization round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Peers asked for their rules.
    pub peers_contacted: usize,
    /// Peers blacklisted for mismatching rules.
    pub peers_blacklisted: usize,
    /// Peers skipped after a network or parse failure.
    pub peers_failed: usize,
    /// Whether this round adopted a peer's rules.
    pub rules_adopted: bool,
    /// Blocks returned by peers, duplicates included.
    pub blocks_received: usize,
    /// Blocks newly cached.
    pub blocks_merged: usize,
    /// Blocks that failed validation or had no known parent.
    pub blocks_rejected: usize,
}

impl std::fmt::Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Contacted {} peers ({} blacklisted, {} failed); received {} blocks, merged {}, rejected {}",
            self.peers_contacted,
            self.peers_blacklisted,
            self.peers_failed,
            self.blocks_received,
            self.blocks_merged,
            self.blocks_rejected
        )
    }
}

/// Node synchronization service
pub struct NodeSyncService<S: LedgerStore, C: PeerClient> {
    storage: SharedChainStorage<S>,
    client: Arc<C>,
    clock: Arc<dyn TimeSource>,
    config: SyncConfig,
}

impl<S: LedgerStore, C: PeerClient> NodeSyncService<S, C> {
    /// Create a synchronization service
    pub fn new(
        storage: SharedChainStorage<S>,
        client: Arc<C>,
        clock: Arc<dyn TimeSource>,
        config: SyncConfig,
    ) -> Self {
        Self {
            storage,
            client,
            clock,
            config,
        }
    }

    /// Synchronization configuration
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    // =========================================================================
    // RULES RECONCILIATION
    // =========================================================================

    /// Adopt, compare or record the failure of a `GET /rules` response and
    /// persist the peer record.
    fn apply_rules_response(
        &self,
        node: Node,
        response: Result<RulesEnvelope>,
    ) -> Result<PeerContact> {
        let now = self.clock.now();
        let node = node.requested_at(now);

        let envelope = match response {
            Ok(envelope) => envelope,
            Err(e) if e.is_recoverable() => {
                warn!("[sl-05] Skipping {}: {}", node.url, e);
                let node = self.storage.write().write_peer(node)?;
                return Ok(PeerContact {
                    node,
                    standing: PeerStanding::Unreachable {
                        reason: e.to_string(),
                    },
                });
            }
            Err(e) => return Err(e),
        };

        let mut storage = self.storage.write();
        let node = node.responded_at(now, envelope.limits);
        let (node, standing) = match storage.find_rules()? {
            None => {
                storage.write_rules(envelope.rules)?;
                info!("[sl-05] 📜 Adopted rules from {}", node.url);
                (node, PeerStanding::RulesAdopted)
            }
            Some(local) => {
                let mismatched = local.mismatched_fields(&envelope.rules);
                if mismatched.is_empty() {
                    (node, PeerStanding::RulesMatched)
                } else {
                    let reason = format!("rules mismatch: {}", mismatched.join(", "));
                    warn!("[sl-05] 🚫 Blacklisting {}: {}", node.url, reason);
                    (
                        node.blacklisted(reason.clone()),
                        PeerStanding::Blacklisted { reason },
                    )
                }
            }
        };
        let node = storage.write_peer(node)?;
        Ok(PeerContact { node, standing })
    }

    /// Fetch a peer's rules and reconcile them.
    #[tracing::instrument(skip(self, node), fields(url = %node.url))]
    pub async fn contact(&self, node: Node) -> Result<PeerContact> {
        let response = self.client.get_rules(&node.url).await;
        self.apply_rules_response(node, response)
    }

    // =========================================================================
    // BLOCK RETRIEVAL
    // =========================================================================

    /// Every block a peer serves, page by page from offset zero.
    ///
    /// Stops at the first page shorter than the page size.
    pub async fn fetch_blocks(&self, node: &Node) -> Result<Vec<Block>> {
        let page_size = if node.blocks_limit_max == 0 {
            self.config.fallback_page_size.max(1)
        } else {
            node.blocks_limit_max
        };

        let mut blocks = Vec::new();
        let mut offset: u32 = 0;
        loop {
            let page = self
                .client
                .get_blocks(&node.url, &BlocksQuery::page(page_size, offset))
                .await?;
            let count = page.len();
            debug!(
                "[sl-05] {} returned {} blocks at offset {}",
                node.url, count, offset
            );
            blocks.extend(page);

            if count != page_size as usize || blocks.len() >= self.config.max_blocks_per_peer {
                break;
            }
            offset = offset.saturating_add(page_size);
        }
        Ok(blocks)
    }

    // =========================================================================
    // MERGE
    // =========================================================================

    /// Lineage context for a received block, `None` when its parent is
    /// unknown.
    fn context_for(
        storage: &ChainStorageService<S>,
        block: &Block,
        rules: &Rules,
    ) -> Result<Option<BlockContext>> {
        let difficulty = match storage.next_difficulty(&block.previous_hash, rules) {
            Ok(difficulty) => difficulty,
            Err(StorageError::OrphanBlock { .. }) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if block.previous_hash == rules.empty_target {
            return Ok(Some(BlockContext::genesis(rules)));
        }
        let parent = storage.find_block_by_hash(&block.previous_hash)?;
        let spends = storage.spend_index(&block.previous_hash, rules)?;
        Ok(Some(BlockContext {
            parent,
            expected_difficulty: difficulty,
            spends,
        }))
    }

    /// Deduplicate, order by height, validate and cache received blocks.
    #[tracing::instrument(skip_all, fields(received = blocks.len()))]
    pub fn merge(&self, blocks: Vec<Block>, report: &mut SyncReport) -> Result<()> {
        report.blocks_received += blocks.len();

        let mut storage = self.storage.write();
        let mut seen = HashSet::new();
        let mut fresh = Vec::new();
        for block in blocks {
            if !seen.insert(block.hash.clone()) {
                continue;
            }
            if storage.find_block_by_hash(&block.hash)?.is_some() {
                continue;
            }
            fresh.push(block);
        }
        fresh.sort_by_key(|block| block.height);

        let rules = storage.find_rules()?.unwrap_or_default();
        let validator = BlockValidator::with_config(
            rules.clone(),
            ValidationConfig {
                max_future_drift_secs: self.config.max_future_drift_secs,
            },
        );
        let now = self.clock.now();

        for block in fresh {
            let Some(context) = Self::context_for(&storage, &block, &rules)? else {
                warn!(
                    "[sl-05] Rejected block {}: unknown parent {}",
                    short_hash(&block.hash),
                    short_hash(&block.previous_hash)
                );
                report.blocks_rejected += 1;
                continue;
            };
            if let Err(e) = validator.validate_in_context(&block, &context, now) {
                warn!("[sl-05] Rejected block {}: {}", short_hash(&block.hash), e);
                report.blocks_rejected += 1;
                continue;
            }
            storage.cache_block(block, &rules)?;
            report.blocks_merged += 1;
        }
        Ok(())
    }

    // =========================================================================
    // ROUND
    // =========================================================================

    /// Reconcile with every non-blacklisted peer.
    #[tracing::instrument(skip(self))]
    pub async fn sync(&self) -> Result<SyncReport> {
        let mut report = SyncReport::default();
        let peers = self.storage.read().find_recent_peers(None)?;
        if peers.is_empty() {
            info!("[sl-05] No peers to synchronize with");
            return Ok(report);
        }

        let responses: Vec<(Node, Result<RulesEnvelope>)> = stream::iter(peers)
            .map(|node| async move {
                let response = self.client.get_rules(&node.url).await;
                (node, response)
            })
            .buffered(self.config.parallelism())
            .collect()
            .await;

        let mut eligible = Vec::new();
        for (node, response) in responses {
            report.peers_contacted += 1;
            let contact = self.apply_rules_response(node, response)?;
            match &contact.standing {
                PeerStanding::RulesAdopted => {
                    report.rules_adopted = true;
                    eligible.push(contact.node);
                }
                PeerStanding::RulesMatched => eligible.push(contact.node),
                PeerStanding::Blacklisted { .. } => report.peers_blacklisted += 1,
                PeerStanding::Unreachable { .. } => report.peers_failed += 1,
            }
        }

        let fetched: Vec<(Node, Result<Vec<Block>>)> = stream::iter(eligible)
            .map(|node| async move {
                let blocks = self.fetch_blocks(&node).await;
                (node, blocks)
            })
            .buffer_unordered(self.config.parallelism())
            .collect()
            .await;

        let mut received = Vec::new();
        for (node, blocks) in fetched {
            match blocks {
                Ok(blocks) => received.extend(blocks),
                Err(e) if e.is_recoverable() => {
                    warn!("[sl-05] Block retrieval from {} failed: {}", node.url, e);
                    report.peers_failed += 1;
                }
                Err(e) => return Err(e),
            }
        }

        self.merge(received, &mut report)?;
        info!("[sl-05] 🔄 {}", report);
        Ok(report)
    }

    // =========================================================================
    // PEER LIFECYCLE
    // =========================================================================

    fn peer(&self, id: u64) -> Result<Node> {
        self.storage
            .read()
            .find_peer_by_id(id)?
            .ok_or(SyncError::PeerNotFound { id })
    }

    /// Register a peer and reconcile its rules immediately.
    pub async fn add_peer(&self, url: &str) -> Result<PeerContact> {
        let node = self.storage.write().add_peer(url)?;
        self.contact(node).await
    }

    /// Clear a peer's blacklist flag and reconcile its rules again.
    pub async fn ping_peer(&self, id: u64) -> Result<PeerContact> {
        let node = self.peer(id)?.whitelisted();
        self.contact(node).await
    }

    /// Exclude a peer from synchronization.
    pub fn blacklist_peer(&self, id: u64, reason: &str) -> Result<Node> {
        let node = self.peer(id)?.blacklisted(reason);
        info!("[sl-05] Blacklisted {}: {}", node.url, reason);
        Ok(self.storage.write().write_peer(node)?)
    }

    /// Let a blacklisted peer take part again.
    pub fn whitelist_peer(&self, id: u64) -> Result<Node> {
        let node = self.peer(id)?.whitelisted();
        info!("[sl-05] Whitelisted {}", node.url);
        Ok(self.storage.write().write_peer(node)?)
    }

    /// Forget a peer.
    pub fn remove_peer(&self, id: u64) -> Result<()> {
        self.peer(id)?;
        Ok(self.storage.write().remove_peer(id)?)
    }

    /// Every known peer.
    pub fn peers(&self) -> Result<Vec<Node>> {
        Ok(self.storage.read().all_peers()?)
    }
}

#[async_trait]
impl<S: LedgerStore, C: PeerClient> BlockBroadcaster for NodeSyncService<S, C> {
    async fn broadcast(&self, block: &Block) -> usize {
        let peers = self.storage.read().find_recent_peers(None);
        let peers = match peers {
            Ok(peers) => peers,
            Err(e) => {
                warn!("[sl-05] Unable to list peers for broadcast: {}", e);
                return 0;
            }
        };

        let accepted = stream::iter(peers)
            .map(|node| async move {
                match self.client.post_block(&node.url, block).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("[sl-05] {} did not accept {}: {}", node.url, short_hash(&block.hash), e);
                        false
                    }
                }
            })
            .buffer_unordered(self.config.parallelism())
            .filter(|accepted| futures_util::future::ready(*accepted))
            .count()
            .await;

        info!(
            "[sl-05] 📡 Block {} accepted by {} peers",
            short_hash(&block.hash),
            accepted
        );
        accepted
    }
}
