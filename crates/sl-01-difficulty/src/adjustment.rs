//! Interval Difficulty Adjustment
//!
//! Every `difficulty_interval` blocks the difficulty is recalculated from the
//! time the previous interval took. The elapsed time is clamped to a factor of
//! four either way, so a single recalculation never moves the target more than
//! 4x.
//!
//! REMEMBER: the target is a CEILING. Blocks too fast → LOWER the target.

use primitive_types::U256;
use shared_types::Rules;
use tracing::debug;

use crate::codec::{decode_compact, encode_compact, EASIEST_DIFFICULTY};
use crate::error::{DifficultyError, Result};

const MAX_ADJUSTMENT_FACTOR: u64 = 4;

/// Whether a block at `height` recalculates its difficulty.
///
/// An interval of zero disables recalculation.
pub fn is_difficulty_changing(height: u64, interval: u64) -> bool {
    interval != 0 && height % interval == 0
}

/// Easiest target a recalculation may produce, before rotation.
pub fn maximum_target() -> U256 {
    decode_compact(EASIEST_DIFFICULTY)
}

/// Scale `old_difficulty` by `elapsed / rules.difficulty_duration`.
///
/// # Errors
///
/// - `InvalidDuration` when the rules carry a zero duration
pub fn recalculate(old_difficulty: u32, elapsed: u64, rules: &Rules) -> Result<u32> {
    let duration = rules.difficulty_duration;
    if duration == 0 {
        return Err(DifficultyError::InvalidDuration);
    }

    let min_time = (duration / MAX_ADJUSTMENT_FACTOR).max(1);
    let max_time = duration.saturating_mul(MAX_ADJUSTMENT_FACTOR);
    let clamped = elapsed.clamp(min_time, max_time);

    // new = old * clamped / duration, split to stay inside 256 bits
    let old_target = decode_compact(old_difficulty);
    let quotient = old_target / U256::from(duration);
    let remainder = old_target % U256::from(duration);
    let scaled = quotient
        .saturating_mul(U256::from(clamped))
        .saturating_add(remainder.saturating_mul(U256::from(clamped)) / U256::from(duration));

    let bounded = scaled.min(maximum_target()).max(U256::one());
    let packed = encode_compact(bounded)?;

    debug!(
        "[sl-01] Difficulty {:#010x} -> {:#010x} (elapsed {}s, clamped {}s, expected {}s)",
        old_difficulty, packed, elapsed, clamped, duration
    );
    Ok(packed)
}
