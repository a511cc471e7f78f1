//! # Chain Storage Service
//!
//! Fork-aware queries over the stored blocks, plus the peer, rules and
//! account tables.
//!
//! ## Fork Model
//!
//! Every block carries a local `chain` id. A block continues its parent's
//! chain when it lands above that chain's current tip; otherwise it opens a
//! new chain whose `root_id` is the parent. Heights are therefore unique and
//! contiguous within one chain, and a chain's history below its root is the
//! root's chain.
//!
//! The service is shared as [`SharedChainStorage`]. Callers take the lock for
//! one call at a time and never hold it across an `.await`.

use parking_lot::RwLock;
use shared_types::{Account, Block, EventOutput, Node, Rules, SpendIndex};
use sl_01_difficulty::{is_difficulty_changing, recalculate};
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::{CacheOutcome, Lineage, Result, StorageError};
use crate::ports::outbound::{LedgerStore, Repository};

/// Chain storage behind a shared lock.
pub type SharedChainStorage<S> = Arc<RwLock<ChainStorageService<S>>>;

/// Leading characters of a hash, for log lines.
pub fn short_hash(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}

/// Chain storage application service.
pub struct ChainStorageService<S: LedgerStore> {
    store: S,
}

impl<S: LedgerStore> ChainStorageService<S> {
    /// Wrap a persistence adapter.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Move the service behind a shared lock.
    pub fn shared(self) -> SharedChainStorage<S> {
        Arc::new(RwLock::new(self))
    }

    /// Underlying persistence adapter.
    pub fn store(&self) -> &S {
        &self.store
    }

    // =========================================================================
    // BLOCK QUERIES
    // =========================================================================

    fn blocks_where(&self, predicate: &dyn Fn(&Block) -> bool) -> Result<Vec<Block>> {
        Repository::<Block>::find_by(&self.store, predicate)
    }

    /// Block by local id.
    pub fn block(&self, id: u64) -> Result<Block> {
        Repository::<Block>::read(&self.store, id)
    }

    /// Number of stored blocks.
    pub fn block_count(&self) -> Result<usize> {
        Repository::<Block>::count(&self.store)
    }

    /// Every block ordered by height, then time.
    pub fn all_blocks(&self) -> Result<Vec<Block>> {
        let mut blocks = self.blocks_where(&|_| true)?;
        blocks.sort_by(|a, b| {
            a.height
                .cmp(&b.height)
                .then(a.time.cmp(&b.time))
                .then(a.id.cmp(&b.id))
        });
        Ok(blocks)
    }

    /// Global highest block. Ties go to the earliest time.
    pub fn highest_block(&self) -> Result<Option<Block>> {
        Ok(highest(self.blocks_where(&|_| true)?))
    }

    /// Highest block of one chain. Ties go to the earliest time.
    pub fn highest_block_on_chain(&self, chain: u64) -> Result<Option<Block>> {
        Ok(highest(self.blocks_where(&|b| b.chain == Some(chain))?))
    }

    /// Block with exactly this hash.
    pub fn find_block_by_hash(&self, hash: &str) -> Result<Option<Block>> {
        Ok(self.blocks_where(&|b| b.hash == hash)?.into_iter().next())
    }

    /// Blocks whose hash starts with `fragment`.
    pub fn find_blocks_by_hash_prefix(&self, fragment: &str) -> Result<Vec<Block>> {
        if fragment.is_empty() {
            return Ok(Vec::new());
        }
        self.blocks_where(&|b| b.hash.starts_with(fragment))
    }

    /// Up to `limit` blocks at `height` across all chains, earliest first.
    pub fn blocks_at_height(&self, height: u64, limit: usize) -> Result<Vec<Block>> {
        let mut blocks = self.blocks_where(&|b| b.height == height)?;
        blocks.sort_by(|a, b| a.time.cmp(&b.time).then(a.id.cmp(&b.id)));
        blocks.truncate(limit);
        Ok(blocks)
    }

    fn parent_of(&self, block: &Block) -> Result<Option<Block>> {
        if block.height == 0 {
            return Ok(None);
        }
        if let Some(id) = block.previous_id {
            if let Ok(parent) = self.block(id) {
                if parent.hash == block.previous_hash {
                    return Ok(Some(parent));
                }
            }
        }
        self.find_block_by_hash(&block.previous_hash)
    }

    /// The block at `height` on the lineage ending at `head_hash`.
    ///
    /// Walks back from the head when that is the shorter distance, otherwise
    /// follows the chain segments down from genesis. `None` above the head.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the head is not stored
    pub fn block_at_height(&self, head_hash: &str, height: u64) -> Result<Option<Block>> {
        let head = self
            .find_block_by_hash(head_hash)?
            .ok_or_else(|| StorageError::not_found("block", head_hash))?;
        if height > head.height {
            return Ok(None);
        }

        let backward = head.height - height;
        if backward <= height {
            self.walk_back_to(head, height)
        } else {
            self.segment_lookup(head, height)
        }
    }

    fn walk_back_to(&self, head: Block, height: u64) -> Result<Option<Block>> {
        let mut block = head;
        while block.height > height {
            match self.parent_of(&block)? {
                Some(parent) => block = parent,
                None => return Ok(None),
            }
        }
        Ok((block.height == height).then_some(block))
    }

    fn segment_lookup(&self, head: Block, height: u64) -> Result<Option<Block>> {
        let mut chain = head.chain;
        let mut root_id = head.root_id;
        while let Some(id) = root_id {
            let root = self.block(id)?;
            if height > root.height {
                break;
            }
            chain = root.chain;
            root_id = root.root_id;
        }

        match chain {
            Some(chain) => Ok(self
                .blocks_where(&|b| b.chain == Some(chain) && b.height == height)?
                .into_iter()
                .next()),
            None => self.walk_back_to(head, height),
        }
    }

    /// Whether two blocks lie on one lineage.
    ///
    /// Walks back from the higher block and answers `true` only if the lower
    /// block is reached before the walk drops below its height. Unknown
    /// hashes and equal heights with different hashes are `false`.
    pub fn share_chain(&self, hash_a: &str, hash_b: &str) -> Result<bool> {
        if hash_a == hash_b {
            return Ok(self.find_block_by_hash(hash_a)?.is_some());
        }
        let (Some(a), Some(b)) = (self.find_block_by_hash(hash_a)?, self.find_block_by_hash(hash_b)?)
        else {
            return Ok(false);
        };
        if a.height == b.height {
            return Ok(false);
        }

        let (higher, lower) = if a.height > b.height { (a, b) } else { (b, a) };
        let mut cursor = higher;
        while let Some(parent) = self.parent_of(&cursor)? {
            if parent.height < lower.height {
                return Ok(false);
            }
            if parent.hash == lower.hash {
                return Ok(true);
            }
            cursor = parent;
        }
        Ok(false)
    }

    /// Blocks from `head_hash` back to genesis, head first.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the head is not stored
    pub fn ancestry(&self, head_hash: &str) -> Result<Vec<Block>> {
        let head = self
            .find_block_by_hash(head_hash)?
            .ok_or_else(|| StorageError::not_found("block", head_hash))?;
        let limit = self.block_count()?;

        let mut lineage = vec![head];
        while lineage.len() <= limit {
            let Some(last) = lineage.last() else { break };
            match self.parent_of(last)? {
                Some(parent) => lineage.push(parent),
                None => break,
            }
        }
        Ok(lineage)
    }

    // =========================================================================
    // LINEAGE & CACHING
    // =========================================================================

    fn next_chain_id(&self) -> Result<u64> {
        Ok(self
            .blocks_where(&|_| true)?
            .iter()
            .filter_map(|b| b.chain)
            .max()
            .map_or(0, |max| max + 1))
    }

    /// Height, fork bookkeeping and required difficulty for a block on top
    /// of `previous_hash`.
    ///
    /// # Errors
    ///
    /// - `OrphanBlock` if the parent is not stored
    /// - `Difficulty` if the rules cannot recalculate
    pub fn lineage_for(&self, previous_hash: &str, rules: &Rules) -> Result<Lineage> {
        if previous_hash == rules.empty_target {
            return Ok(Lineage {
                height: 0,
                previous_id: None,
                chain: self.next_chain_id()?,
                root_id: None,
                interval_id: None,
                difficulty: rules.difficulty_start,
                forked: false,
            });
        }

        let parent = self
            .find_block_by_hash(previous_hash)?
            .ok_or_else(|| StorageError::OrphanBlock {
                previous_hash: previous_hash.to_string(),
            })?;
        let height = parent.height + 1;

        let tip_height = match parent.chain {
            Some(chain) => self.highest_block_on_chain(chain)?.map(|tip| tip.height),
            None => None,
        };
        let (chain, root_id, forked) = match (parent.chain, tip_height) {
            (Some(chain), Some(tip)) if height > tip => (chain, parent.root_id, false),
            _ => (self.next_chain_id()?, parent.id, true),
        };

        let (difficulty, interval_id) = if is_difficulty_changing(height, rules.difficulty_interval) {
            let anchor_height = height - rules.difficulty_interval;
            let anchor = self
                .block_at_height(&parent.hash, anchor_height)?
                .ok_or_else(|| StorageError::not_found("block", format!("height {anchor_height}")))?;
            let elapsed = parent.time.saturating_sub(anchor.time);
            (recalculate(anchor.difficulty, elapsed, rules)?, anchor.id)
        } else {
            (parent.difficulty, parent.interval_id)
        };

        Ok(Lineage {
            height,
            previous_id: parent.id,
            chain,
            root_id,
            interval_id,
            difficulty,
            forked,
        })
    }

    /// Difficulty a block on top of `previous_hash` must carry.
    pub fn next_difficulty(&self, previous_hash: &str, rules: &Rules) -> Result<u32> {
        Ok(self.lineage_for(previous_hash, rules)?.difficulty)
    }

    /// Fork-check and store a block.
    ///
    /// Idempotent per hash: a block that is already stored is returned as
    /// [`CacheOutcome::Existing`] without touching the table.
    #[tracing::instrument(skip(self, block, rules), fields(hash = %short_hash(&block.hash)))]
    pub fn cache_block(&mut self, block: Block, rules: &Rules) -> Result<CacheOutcome> {
        if let Some(existing) = self.find_block_by_hash(&block.hash)? {
            debug!("[sl-02] Block already cached as id {:?}", existing.id);
            return Ok(CacheOutcome::Existing(existing));
        }

        let lineage = self.lineage_for(&block.previous_hash, rules)?;
        let mut block = lineage.apply(block);
        block.id = None;
        let stored = Repository::<Block>::write(&mut self.store, block)?;

        if lineage.forked {
            info!(
                "[sl-02] 🔀 Block {} opens chain {} at height {} (root {:?})",
                short_hash(&stored.hash),
                lineage.chain,
                lineage.height,
                lineage.root_id
            );
        } else {
            info!(
                "[sl-02] 📦 Cached block {} at height {} on chain {}",
                short_hash(&stored.hash),
                lineage.height,
                lineage.chain
            );
        }
        Ok(CacheOutcome::Inserted(stored))
    }

    // =========================================================================
    // SPENDS
    // =========================================================================

    /// Created and consumed output keys along the lineage ending at
    /// `head_hash`. The ledger's empty target yields an empty index.
    pub fn spend_index(&self, head_hash: &str, rules: &Rules) -> Result<SpendIndex> {
        let mut index = SpendIndex::new();
        if head_hash == rules.empty_target {
            return Ok(index);
        }
        for block in self.ancestry(head_hash)? {
            index.record_block(&block);
        }
        Ok(index)
    }

    /// Outputs owned by `fleet_hash` still unspent on the lineage ending at
    /// `head_hash`, oldest first.
    pub fn unused_outputs(&self, head_hash: &str, fleet_hash: &str) -> Result<Vec<EventOutput>> {
        let lineage = self.ancestry(head_hash)?;
        let mut index = SpendIndex::new();
        for block in &lineage {
            index.record_block(block);
        }

        Ok(lineage
            .iter()
            .rev()
            .flat_map(|block| block.outputs())
            .filter(|output| output.fleet.hash == fleet_hash && !index.is_consumed(&output.key))
            .cloned()
            .collect())
    }

    // =========================================================================
    // PEERS
    // =========================================================================

    fn nodes_where(&self, predicate: &dyn Fn(&Node) -> bool) -> Result<Vec<Node>> {
        Repository::<Node>::find_by(&self.store, predicate)
    }

    /// Register a new peer.
    ///
    /// # Errors
    ///
    /// - `Conflict` if a peer with this url exists
    pub fn add_peer(&mut self, url: &str) -> Result<Node> {
        let url = url.trim_end_matches('/');
        if self.find_peer_by_url(url)?.is_some() {
            return Err(StorageError::conflict("node", url));
        }
        let node = Repository::<Node>::write(&mut self.store, Node::new(url))?;
        info!("[sl-02] Added peer {} as id {:?}", node.url, node.id);
        Ok(node)
    }

    /// Non-blacklisted peers, most recently responsive first.
    pub fn find_recent_peers(&self, limit: Option<usize>) -> Result<Vec<Node>> {
        let mut peers = self.nodes_where(&|n| !n.blacklisted)?;
        peers.sort_by(|a, b| {
            b.last_response_datetime
                .cmp(&a.last_response_datetime)
                .then(a.id.cmp(&b.id))
        });
        if let Some(limit) = limit {
            peers.truncate(limit);
        }
        Ok(peers)
    }

    /// Peer with this url.
    pub fn find_peer_by_url(&self, url: &str) -> Result<Option<Node>> {
        let url = url.trim_end_matches('/');
        Ok(self.nodes_where(&|n| n.url == url)?.into_iter().next())
    }

    /// Peer with this id.
    pub fn find_peer_by_id(&self, id: u64) -> Result<Option<Node>> {
        match Repository::<Node>::read(&self.store, id) {
            Ok(node) => Ok(Some(node)),
            Err(StorageError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Persist an updated peer record.
    pub fn write_peer(&mut self, node: Node) -> Result<Node> {
        Repository::<Node>::write(&mut self.store, node)
    }

    /// Forget a peer.
    pub fn remove_peer(&mut self, id: u64) -> Result<()> {
        Repository::<Node>::remove(&mut self.store, id)?;
        info!("[sl-02] Removed peer {}", id);
        Ok(())
    }

    /// Every peer in id order, blacklisted ones included.
    pub fn all_peers(&self) -> Result<Vec<Node>> {
        self.nodes_where(&|_| true)
    }

    // =========================================================================
    // RULES
    // =========================================================================

    /// Rules adopted so far.
    pub fn find_rules(&self) -> Result<Option<Rules>> {
        self.store.find_rules()
    }

    /// Persist adopted rules.
    pub fn write_rules(&mut self, rules: Rules) -> Result<()> {
        self.store.write_rules(rules)
    }

    /// Forget the adopted rules.
    pub fn drop_rules(&mut self) -> Result<()> {
        self.store.drop_rules()
    }

    // =========================================================================
    // ACCOUNTS
    // =========================================================================

    fn accounts_where(&self, predicate: &dyn Fn(&Account) -> bool) -> Result<Vec<Account>> {
        Repository::<Account>::find_by(&self.store, predicate)
    }

    /// Store a new account. The first account becomes the active one.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the name is taken
    pub fn create_account(&mut self, account: Account) -> Result<Account> {
        if self.find_account(&account.name)?.is_some() {
            return Err(StorageError::conflict("account", &account.name));
        }
        let first = self.active_account()?.is_none();

        let mut account = account;
        account.id = None;
        account.active = first;
        Repository::<Account>::write(&mut self.store, account)
    }

    /// Account by name.
    pub fn find_account(&self, name: &str) -> Result<Option<Account>> {
        Ok(self.accounts_where(&|a| a.name == name)?.into_iter().next())
    }

    /// The account used for mining.
    pub fn active_account(&self) -> Result<Option<Account>> {
        Ok(self.accounts_where(&|a| a.active)?.into_iter().next())
    }

    /// Make `name` the only active account.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no account has this name
    pub fn set_active_account(&mut self, name: &str) -> Result<Account> {
        let mut target = self
            .find_account(name)?
            .ok_or_else(|| StorageError::not_found("account", name))?;

        for mut other in self.accounts_where(&|a| a.active && a.name != name)? {
            other.active = false;
            Repository::<Account>::write(&mut self.store, other)?;
        }
        target.active = true;
        Repository::<Account>::write(&mut self.store, target)
    }

    /// Every account in id order.
    pub fn accounts(&self) -> Result<Vec<Account>> {
        self.accounts_where(&|_| true)
    }
}

fn highest(blocks: Vec<Block>) -> Option<Block> {
    blocks.into_iter().min_by(|a, b| {
        b.height
            .cmp(&a.height)
            .then(a.time.cmp(&b.time))
            .then(a.id.cmp(&b.id))
    })
}
