//! Probe Service
//!
//! Orchestrates one probe: resolve the parent, assemble and sign the
//! candidate, run the nonce search on the blocking pool, cache the result
//! through chain storage and broadcast it.

use shared_types::{Block, Rules, TimeSource};
use sl_01_difficulty::Target;
use sl_02_chain_storage::{short_hash, LedgerStore, SharedChainStorage};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::MinerConfig;
use crate::domain::{assemble_candidate, search_nonce, ParentSelector, SearchLimits};
use crate::error::{MiningError, Result};
use crate::ports::BlockBroadcaster;

/// Outcome of a successful probe.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    /// The block as stored, with its local id and lineage.
    pub block: Block,
    /// Whether the block opened a new chain.
    pub forked: bool,
    /// Hashes tried.
    pub attempts: u64,
    /// Times the nonce space wrapped.
    pub retimes: u32,
    /// Seconds spent searching.
    pub elapsed_secs: u64,
    /// Peers that accepted the broadcast.
    pub accepted_peers: usize,
}

/// Candidate ready for the nonce search.
#[derive(Debug, Clone)]
pub struct PreparedProbe {
    /// Unsealed block.
    pub candidate: Block,
    /// Comparison form of its difficulty.
    pub target: Target,
    /// Rules it was assembled under.
    pub rules: Rules,
    /// Whether it will open a new chain.
    pub forked: bool,
}

/// Block production service
pub struct ProbeService<S: LedgerStore> {
    storage: SharedChainStorage<S>,
    broadcaster: Arc<dyn BlockBroadcaster>,
    clock: Arc<dyn TimeSource>,
    config: MinerConfig,
    cancel: Arc<AtomicBool>,
}

impl<S: LedgerStore> ProbeService<S> {
    /// Create a probe service
    pub fn new(
        storage: SharedChainStorage<S>,
        broadcaster: Arc<dyn BlockBroadcaster>,
        clock: Arc<dyn TimeSource>,
        config: MinerConfig,
    ) -> Self {
        Self {
            storage,
            broadcaster,
            clock,
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Miner configuration
    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    /// Flag that stops the running or upcoming search at its next check
    /// boundary. It is lowered once that search returns.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Rules to mine under: the adopted ones, else the local defaults.
    pub fn rules(&self) -> Result<Rules> {
        Ok(self.storage.read().find_rules()?.unwrap_or_default())
    }

    /// Parent a selector points at, `None` meaning genesis.
    pub fn resolve_parent(&self, selector: &ParentSelector) -> Result<Option<Block>> {
        let storage = self.storage.read();
        match selector {
            ParentSelector::Genesis => Ok(None),
            ParentSelector::HashPrefix(fragment) => {
                let mut matches = storage.find_blocks_by_hash_prefix(fragment)?;
                match matches.len() {
                    0 => Err(MiningError::ParentNotFound {
                        selector: selector.to_string(),
                    }),
                    1 => Ok(matches.pop()),
                    n => Err(MiningError::AmbiguousParent {
                        fragment: fragment.clone(),
                        matches: n,
                    }),
                }
            }
            ParentSelector::Chain(chain) => storage
                .highest_block_on_chain(*chain)?
                .map(Some)
                .ok_or_else(|| MiningError::ParentNotFound {
                    selector: selector.to_string(),
                }),
            ParentSelector::Highest => {
                let highest = storage.highest_block()?;
                if highest.is_none() {
                    info!("[sl-04] No blocks stored, probing a genesis block");
                }
                Ok(highest)
            }
        }
    }

    /// Resolve the parent and assemble a signed candidate.
    pub fn prepare(&self, selector: &ParentSelector) -> Result<PreparedProbe> {
        let rules = self.rules()?;
        let account = self
            .storage
            .read()
            .active_account()?
            .ok_or(MiningError::NoActiveAccount)?;
        let keypair = account.keypair()?;

        let parent = self.resolve_parent(selector)?;
        let previous_hash = parent
            .as_ref()
            .map_or_else(|| rules.empty_target.clone(), |p| p.hash.clone());
        let lineage = self.storage.read().lineage_for(&previous_hash, &rules)?;

        let candidate = assemble_candidate(
            &previous_hash,
            &lineage,
            &rules,
            &keypair,
            &self.config.meta,
            self.clock.now(),
        )?;
        let target = Target::from_difficulty(candidate.difficulty, rules.difficulty_fudge)?;

        Ok(PreparedProbe {
            candidate,
            target,
            rules,
            forked: lineage.forked,
        })
    }

    /// Mine one block on top of `selector`, cache it and broadcast it.
    #[tracing::instrument(skip(self))]
    pub async fn probe(&self, selector: ParentSelector) -> Result<ProbeReport> {
        let prepared = self.prepare(&selector)?;
        info!(
            "[sl-04] Probing height {} on {} (difficulty {:#010x}, target {})",
            prepared.candidate.height,
            selector,
            prepared.candidate.difficulty,
            prepared.target.stripped()
        );

        let limits = SearchLimits {
            maximum_nonce: prepared.rules.maximum_nonce,
            check_interval: self.config.effective_check_interval(),
            timeout_secs: self.config.probe_timeout_secs,
        };
        let clock = Arc::clone(&self.clock);
        let cancel = Arc::clone(&self.cancel);
        let candidate = prepared.candidate;
        let target = prepared.target;

        let searched = tokio::task::spawn_blocking(move || {
            search_nonce(candidate, &target, &limits, clock.as_ref(), &cancel)
        })
        .await;
        // Lowered only here, so a cancel raised while assembling still applies
        self.cancel.store(false, Ordering::Relaxed);
        let mined = searched.map_err(|e| MiningError::Aborted {
            reason: e.to_string(),
        })?;
        let mined = match mined {
            Ok(mined) => mined,
            Err(e) => {
                warn!("[sl-04] Probe stopped: {}", e);
                return Err(e);
            }
        };

        let stored = self
            .storage
            .write()
            .cache_block(mined.block, &prepared.rules)?
            .into_block();
        info!(
            "[sl-04] ✅ Mined block {} at height {} after {} hashes",
            short_hash(&stored.hash),
            stored.height,
            mined.attempts
        );

        let accepted_peers = self.broadcaster.broadcast(&stored).await;

        Ok(ProbeReport {
            block: stored,
            forked: prepared.forked,
            attempts: mined.attempts,
            retimes: mined.retimes,
            elapsed_secs: mined.elapsed_secs,
            accepted_peers,
        })
    }
}
