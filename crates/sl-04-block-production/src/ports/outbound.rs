//! Outbound ports (driven side - SPI)

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::Block;

/// Port: announce a freshly mined block to the network
#[async_trait]
pub trait BlockBroadcaster: Send + Sync {
    /// Offer `block` to every reachable peer and return how many accepted it.
    ///
    /// Per-peer failures are logged by the implementation, never returned.
    async fn broadcast(&self, block: &Block) -> usize;
}

/// Broadcaster that records blocks instead of sending them (for testing)
#[derive(Debug, Default)]
pub struct MockBroadcaster {
    accepting_peers: usize,
    sent: Mutex<Vec<Block>>,
}

impl MockBroadcaster {
    /// A network in which `accepting_peers` peers take every block.
    pub fn new(accepting_peers: usize) -> Self {
        Self {
            accepting_peers,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Blocks broadcast so far.
    pub fn sent(&self) -> Vec<Block> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl BlockBroadcaster for MockBroadcaster {
    async fn broadcast(&self, block: &Block) -> usize {
        self.sent.lock().push(block.clone());
        self.accepting_peers
    }
}
