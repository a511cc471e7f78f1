//! # Peer Records
//!
//! Known peers and their reconciliation state. Only node synchronization
//! mutates these records.

use serde::{Deserialize, Serialize};

use crate::rules::NodeLimits;

/// A known peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Local storage id.
    #[serde(default)]
    pub id: Option<u64>,
    /// Base url of the peer's HTTP interface.
    pub url: String,
    /// Unix seconds of the last request sent.
    pub last_request_datetime: u64,
    /// Unix seconds of the last response received, zero if never.
    pub last_response_datetime: u64,
    /// Maximum events per request.
    pub events_limit_max: u32,
    /// Maximum blocks per request.
    pub blocks_limit_max: u32,
    /// Excluded from synchronization.
    pub blacklisted: bool,
    /// Why the peer was blacklisted.
    pub blacklist_reason: Option<String>,
}

impl Node {
    /// A peer that has never been contacted.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: None,
            url: url.into(),
            last_request_datetime: 0,
            last_response_datetime: 0,
            events_limit_max: 0,
            blocks_limit_max: 0,
            blacklisted: false,
            blacklist_reason: None,
        }
    }

    /// Responded at least once, and not since fallen silent.
    pub fn is_active(&self) -> bool {
        self.last_response_datetime != 0
            && self.last_request_datetime <= self.last_response_datetime
    }

    /// Advertised request limits.
    pub fn limits(&self) -> NodeLimits {
        NodeLimits {
            events_limit_max: self.events_limit_max,
            blocks_limit_max: self.blocks_limit_max,
        }
    }

    /// Record a request.
    pub fn requested_at(mut self, now: u64) -> Self {
        self.last_request_datetime = now;
        self
    }

    /// Record a response and the limits it carried.
    pub fn responded_at(mut self, now: u64, limits: NodeLimits) -> Self {
        self.last_response_datetime = now;
        self.events_limit_max = limits.events_limit_max;
        self.blocks_limit_max = limits.blocks_limit_max;
        self
    }

    /// Exclude from synchronization.
    pub fn blacklisted(mut self, reason: impl Into<String>) -> Self {
        self.blacklisted = true;
        self.blacklist_reason = Some(reason.into());
        self
    }

    /// Clear the blacklist flag.
    pub fn whitelisted(mut self) -> Self {
        self.blacklisted = false;
        self.blacklist_reason = None;
        self
    }
}
