//! Nonce Search - CPU-bound, interruptible only between check intervals
//!
//! Hashes `header_prefix ∥ nonce` for increasing nonces until the hash
//! meets the target. Every `check_interval` hashes the search looks at the
//! cancellation flag and the clock, and logs its hash rate. When the nonce
//! reaches the rules' maximum the block is re-timestamped, which changes
//! the header prefix, and the nonce restarts at zero.

use shared_crypto::sha256_hex;
use shared_types::{Block, TimeSource, Timestamp};
use sl_01_difficulty::Target;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

use crate::error::{MiningError, Result};

/// Bounds of one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Nonce at which the block is re-timestamped.
    pub maximum_nonce: u32,
    /// Hashes between checks, at least one.
    pub check_interval: u64,
    /// Seconds before the search gives up.
    pub timeout_secs: u64,
}

/// A sealed block and what it took to find it.
#[derive(Debug, Clone)]
pub struct MinedBlock {
    /// Block with its winning nonce and hash.
    pub block: Block,
    /// Hashes tried.
    pub attempts: u64,
    /// Times the nonce space wrapped.
    pub retimes: u32,
    /// Seconds spent searching.
    pub elapsed_secs: u64,
}

/// Search nonces until `target` is met, the deadline passes or `cancel`
/// is raised.
#[tracing::instrument(skip_all, fields(height = candidate.height, difficulty = candidate.difficulty))]
pub fn search_nonce(
    candidate: Block,
    target: &Target,
    limits: &SearchLimits,
    clock: &dyn TimeSource,
    cancel: &AtomicBool,
) -> Result<MinedBlock> {
    let check_interval = limits.check_interval.max(1);
    let started: Timestamp = clock.now();
    let mut block = candidate;
    let mut prefix = block.header_prefix();
    let mut nonce: u32 = 0;
    let mut attempts: u64 = 0;
    let mut retimes: u32 = 0;

    loop {
        let hash = sha256_hex(format!("{prefix}{nonce}"));
        attempts += 1;

        if target.is_met_by(&hash) {
            block.nonce = nonce;
            block.hash = hash;
            return Ok(MinedBlock {
                block,
                attempts,
                retimes,
                elapsed_secs: clock.now().saturating_sub(started),
            });
        }

        if attempts % check_interval == 0 {
            if cancel.load(Ordering::Relaxed) {
                return Err(MiningError::Cancelled { attempts });
            }
            let elapsed_secs = clock.now().saturating_sub(started);
            if elapsed_secs > limits.timeout_secs {
                return Err(MiningError::Timeout {
                    elapsed_secs,
                    attempts,
                });
            }
            info!(
                "[sl-04] ⛏️  {} hashes in {}s ({} H/s)",
                attempts,
                elapsed_secs,
                attempts / elapsed_secs.max(1)
            );
        }

        if nonce >= limits.maximum_nonce {
            block = block.retimed(clock.now());
            prefix = block.header_prefix();
            nonce = 0;
            retimes += 1;
        } else {
            nonce += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{FixedTimeSource, Rules, EMPTY_TARGET};
    use std::sync::atomic::AtomicU64;

    /// Clock that ticks one second per reading.
    struct SteppingClock(AtomicU64);

    impl TimeSource for SteppingClock {
        fn now(&self) -> Timestamp {
            self.0.fetch_add(1, Ordering::SeqCst)
        }
    }

    fn candidate(time: Timestamp) -> Block {
        let rules = Rules::for_testing();
        Block::candidate(EMPTY_TARGET, 0, 0, rules.difficulty_start, time, "", Vec::new())
    }

    fn easy_target() -> Target {
        let rules = Rules::for_testing();
        Target::from_difficulty(rules.difficulty_start, rules.difficulty_fudge).unwrap()
    }

    /// Only an all-zero hash would meet it.
    fn impossible_target() -> Target {
        Target::from_difficulty(0x0300_0001, 0).unwrap()
    }

    fn limits(maximum_nonce: u32, check_interval: u64, timeout_secs: u64) -> SearchLimits {
        SearchLimits {
            maximum_nonce,
            check_interval,
            timeout_secs,
        }
    }

    #[test]
    fn test_finds_nonce_meeting_target() {
        let clock = FixedTimeSource::new(100);
        let cancel = AtomicBool::new(false);
        let mined = search_nonce(
            candidate(100),
            &easy_target(),
            &limits(u32::MAX, 1_000, 60),
            &clock,
            &cancel,
        )
        .unwrap();

        assert_eq!(mined.block.hash, mined.block.compute_hash());
        assert!(easy_target().is_met_by(&mined.block.hash));
        assert_eq!(u64::from(mined.block.nonce) + 1, mined.attempts);
        assert_eq!(mined.retimes, 0);
    }

    #[test]
    fn test_cancel_observed_at_check_boundary() {
        let clock = FixedTimeSource::new(100);
        let cancel = AtomicBool::new(true);
        let result = search_nonce(
            candidate(100),
            &impossible_target(),
            &limits(u32::MAX, 250, 60),
            &clock,
            &cancel,
        );

        assert!(matches!(result, Err(MiningError::Cancelled { attempts: 250 })));
    }

    #[test]
    fn test_timeout_after_deadline() {
        let clock = SteppingClock(AtomicU64::new(0));
        let cancel = AtomicBool::new(false);
        let result = search_nonce(
            candidate(0),
            &impossible_target(),
            &limits(u32::MAX, 100, 3),
            &clock,
            &cancel,
        );

        // Each check reads the clock once, so the fourth check sees 4s
        match result {
            Err(MiningError::Timeout {
                elapsed_secs,
                attempts,
            }) => {
                assert_eq!(elapsed_secs, 4);
                assert_eq!(attempts, 400);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_nonce_wrap_retimes_block() {
        let target = easy_target();
        // A start time whose nonce 0 misses, then a clock whose next reading
        // gives a hit at nonce 0
        let start = (0u64..)
            .find(|t| !target.is_met_by(&candidate(*t).sealed(0).hash))
            .unwrap();
        let retime_at = (start + 2..)
            .find(|t| target.is_met_by(&candidate(*t).sealed(0).hash))
            .unwrap();

        let clock = SteppingClock(AtomicU64::new(retime_at - 1));
        let cancel = AtomicBool::new(false);
        let mined = search_nonce(
            candidate(start),
            &target,
            &limits(0, 1_000_000, 60),
            &clock,
            &cancel,
        )
        .unwrap();

        assert_eq!(mined.retimes, 1);
        assert_eq!(mined.block.nonce, 0);
        assert_eq!(mined.block.time, retime_at);
        assert_eq!(mined.block.hash, mined.block.compute_hash());
    }
}
