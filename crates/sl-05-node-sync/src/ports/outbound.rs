//! Outbound ports (driven side - SPI)
//!
//! The peer protocol consumed by this client:
//!
//! | Request       | Body / query                                        | Response                 |
//! |---------------|-----------------------------------------------------|--------------------------|
//! | `GET /rules`  |                                                     | rules + request limits   |
//! | `GET /blocks` | `previous_hash`, `before_time`, `since_time`, `limit`, `offset` | array of blocks |
//! | `POST /blocks`| block JSON                                          | 2xx when accepted        |

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use shared_types::{Block, RulesEnvelope};
use std::collections::HashMap;

use crate::error::{Result, SyncError};

/// Query of `GET /blocks`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlocksQuery {
    /// Only children of this block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_hash: Option<String>,
    /// Only blocks strictly older than this time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_time: Option<u64>,
    /// Only blocks at or after this time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since_time: Option<u64>,
    /// Page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Blocks to skip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl BlocksQuery {
    /// One page of the peer's blocks.
    pub fn page(limit: u32, offset: u32) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
            ..Self::default()
        }
    }

    /// Whether a block passes the filters (limit and offset aside).
    pub fn matches(&self, block: &Block) -> bool {
        self.previous_hash
            .as_ref()
            .map_or(true, |hash| &block.previous_hash == hash)
            && self.before_time.map_or(true, |time| block.time < time)
            && self.since_time.map_or(true, |time| block.time >= time)
    }
}

/// Port: the HTTP protocol spoken by peers
#[async_trait]
pub trait PeerClient: Send + Sync {
    /// `GET {url}/rules`
    async fn get_rules(&self, url: &str) -> Result<RulesEnvelope>;

    /// `GET {url}/blocks`
    async fn get_blocks(&self, url: &str, query: &BlocksQuery) -> Result<Vec<Block>>;

    /// `POST {url}/blocks`
    async fn post_block(&self, url: &str, block: &Block) -> Result<()>;
}

/// A request seen by [`MockPeerNetwork`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerRequest {
    /// `GET /rules`
    GetRules {
        /// Peer url
        url: String,
    },
    /// `GET /blocks`
    GetBlocks {
        /// Peer url
        url: String,
        /// Query sent
        query: BlocksQuery,
    },
    /// `POST /blocks`
    PostBlock {
        /// Peer url
        url: String,
        /// Hash of the posted block
        hash: String,
    },
}

impl PeerRequest {
    /// Url the request went to.
    pub fn url(&self) -> &str {
        match self {
            PeerRequest::GetRules { url }
            | PeerRequest::GetBlocks { url, .. }
            | PeerRequest::PostBlock { url, .. } => url,
        }
    }
}

/// One simulated peer.
#[derive(Debug, Clone)]
pub struct MockPeer {
    /// Served by `GET /rules`; `None` makes the peer unreachable.
    pub envelope: Option<RulesEnvelope>,
    /// Served by `GET /blocks` in order.
    pub blocks: Vec<Block>,
    /// Whether `POST /blocks` succeeds.
    pub accepts_blocks: bool,
}

impl MockPeer {
    /// Reachable peer serving `blocks` under `envelope`.
    pub fn new(envelope: RulesEnvelope, blocks: Vec<Block>) -> Self {
        Self {
            envelope: Some(envelope),
            blocks,
            accepts_blocks: true,
        }
    }

    /// Peer that refuses every connection.
    pub fn unreachable() -> Self {
        Self {
            envelope: None,
            blocks: Vec::new(),
            accepts_blocks: false,
        }
    }
}

/// In-memory peer network that records every request (for testing)
#[derive(Debug, Default)]
pub struct MockPeerNetwork {
    peers: RwLock<HashMap<String, MockPeer>>,
    requests: Mutex<Vec<PeerRequest>>,
}

impl MockPeerNetwork {
    /// Empty network; unknown urls are unreachable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a peer.
    pub fn with_peer(self, url: impl Into<String>, peer: MockPeer) -> Self {
        self.set_peer(url, peer);
        self
    }

    /// Add or replace a peer in place.
    pub fn set_peer(&self, url: impl Into<String>, peer: MockPeer) {
        self.peers.write().insert(url.into(), peer);
    }

    /// Blocks a peer currently holds.
    pub fn blocks_of(&self, url: &str) -> Vec<Block> {
        self.peers
            .read()
            .get(url)
            .map(|peer| peer.blocks.clone())
            .unwrap_or_default()
    }

    /// Every request so far, in arrival order.
    pub fn requests(&self) -> Vec<PeerRequest> {
        self.requests.lock().clone()
    }

    /// Requests sent to one peer.
    pub fn requests_to(&self, url: &str) -> Vec<PeerRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.url() == url)
            .collect()
    }

    fn record(&self, request: PeerRequest) {
        self.requests.lock().push(request);
    }

    fn reachable(&self, url: &str) -> Result<MockPeer> {
        self.peers
            .read()
            .get(url)
            .filter(|peer| peer.envelope.is_some())
            .cloned()
            .ok_or_else(|| SyncError::PeerUnreachable {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            })
    }
}

#[async_trait]
impl PeerClient for MockPeerNetwork {
    async fn get_rules(&self, url: &str) -> Result<RulesEnvelope> {
        self.record(PeerRequest::GetRules {
            url: url.to_string(),
        });
        let peer = self.reachable(url)?;
        peer.envelope.ok_or_else(|| SyncError::Parse {
            url: url.to_string(),
            reason: "empty body".to_string(),
        })
    }

    async fn get_blocks(&self, url: &str, query: &BlocksQuery) -> Result<Vec<Block>> {
        self.record(PeerRequest::GetBlocks {
            url: url.to_string(),
            query: query.clone(),
        });
        let peer = self.reachable(url)?;
        let offset = query.offset.unwrap_or(0) as usize;
        let limit = query.limit.map_or(usize::MAX, |limit| limit as usize);
        Ok(peer
            .blocks
            .into_iter()
            .filter(|block| query.matches(block))
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn post_block(&self, url: &str, block: &Block) -> Result<()> {
        self.record(PeerRequest::PostBlock {
            url: url.to_string(),
            hash: block.hash.clone(),
        });
        let peer = self.reachable(url)?;
        if !peer.accepts_blocks {
            return Err(SyncError::Rejected {
                url: url.to_string(),
                status: 400,
            });
        }
        if let Some(peer) = self.peers.write().get_mut(url) {
            peer.blocks.push(block.clone());
        }
        Ok(())
    }
}
