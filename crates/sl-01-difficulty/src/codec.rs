//! Compact Difficulty Codec
//!
//! A difficulty is packed Bitcoin-style into a `u32`: the top byte is the
//! byte length of the target and the low three bytes its most significant
//! digits. Unpacking places those digits into a 56 character field, prefixes
//! four zero bytes and then rotates the 64 character string left by the
//! rules' `difficulty_fudge`.
//!
//! **IMPORTANT**: the target is a CEILING:
//! - HIGHER target = EASIER (more hashes fall below it)
//! - LOWER target = HARDER
//!
//! The first 8 characters of an unrotated target are always zero and the
//! fudge never exceeds 8, so the rotation only ever moves zeros to the end.

use primitive_types::U256;

use crate::error::{DifficultyError, Result};

/// Largest allowed fudge rotation, in hex characters.
pub const MAX_FUDGE: u8 = 8;

/// Hex length of an unpacked target.
pub const TARGET_HEX_LEN: usize = 64;

/// Easiest representable packed difficulty.
pub const EASIEST_DIFFICULTY: u32 = 0x1c7f_ffff;

const MIN_DIGIT_COUNT: u32 = 3;
const MAX_DIGIT_COUNT: u32 = 28;
const MANTISSA_MASK: u32 = 0x00ff_ffff;
const SIGN_BIT: u32 = 0x0080_0000;

fn check_fudge(fudge: u8) -> Result<()> {
    if fudge > MAX_FUDGE {
        return Err(DifficultyError::FudgeOutOfRange { fudge });
    }
    Ok(())
}

/// Numeric target of a packed difficulty, before rotation.
pub fn decode_compact(packed: u32) -> U256 {
    let digit_count = (packed >> 24).clamp(MIN_DIGIT_COUNT, MAX_DIGIT_COUNT);
    let mantissa = U256::from(packed & MANTISSA_MASK);
    mantissa << (8 * (digit_count - MIN_DIGIT_COUNT))
}

/// Pack a numeric target, keeping its three most significant bytes.
///
/// When the mantissa's top bit is set it would read as a sign bit, so the
/// mantissa is shifted down a byte and the exponent bumped.
pub fn encode_compact(target: U256) -> Result<u32> {
    if target.is_zero() {
        return Err(DifficultyError::ZeroTarget);
    }

    let mut bytes = [0u8; 32];
    target.to_big_endian(&mut bytes);
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    let significant = &bytes[first..];

    // Short targets stay right-aligned under the minimum exponent
    let mut exponent = (significant.len() as u32).max(MIN_DIGIT_COUNT);
    let mut mantissa = significant
        .iter()
        .take(3)
        .fold(0u32, |acc, b| (acc << 8) | u32::from(*b));
    if mantissa & SIGN_BIT != 0 {
        mantissa >>= 8;
        exponent += 1;
    }

    Ok((exponent << 24) | mantissa)
}

/// Move the first `n` characters to the end.
pub fn rotate_left(value: &str, n: usize) -> String {
    if value.is_empty() {
        return String::new();
    }
    let n = n % value.len();
    format!("{}{}", &value[n..], &value[..n])
}

/// Move the last `n` characters to the front.
pub fn rotate_right(value: &str, n: usize) -> String {
    if value.is_empty() {
        return String::new();
    }
    let n = n % value.len();
    rotate_left(value, value.len() - n)
}

/// Render a numeric target as 64 lowercase hex characters.
pub fn target_to_hex(target: U256) -> String {
    let mut bytes = [0u8; 32];
    target.to_big_endian(&mut bytes);
    hex::encode(bytes)
}

/// Parse a 64 character hex target.
pub fn target_from_hex(target: &str) -> Result<U256> {
    if target.len() != TARGET_HEX_LEN {
        return Err(DifficultyError::MalformedTarget {
            reason: format!("expected {} characters, got {}", TARGET_HEX_LEN, target.len()),
        });
    }
    let bytes = hex::decode(target).map_err(|e| DifficultyError::MalformedTarget {
        reason: e.to_string(),
    })?;
    Ok(U256::from_big_endian(&bytes))
}

/// Unpack a difficulty into its rotated 64 character target.
pub fn unpack(packed: u32, fudge: u8) -> Result<String> {
    check_fudge(fudge)?;
    Ok(rotate_left(
        &target_to_hex(decode_compact(packed)),
        usize::from(fudge),
    ))
}

/// [`unpack`] with trailing zeros removed, as used for comparisons.
pub fn unpack_stripped(packed: u32, fudge: u8) -> Result<String> {
    Ok(unpack(packed, fudge)?.trim_end_matches('0').to_string())
}

/// Pack a rotated 64 character target.
pub fn pack(target: &str, fudge: u8) -> Result<u32> {
    check_fudge(fudge)?;
    if !target.is_ascii() {
        return Err(DifficultyError::MalformedTarget {
            reason: "target is not ascii hex".to_string(),
        });
    }
    let unrotated = rotate_right(target, usize::from(fudge));
    encode_compact(target_from_hex(&unrotated)?)
}

/// The comparison form of a difficulty.
///
/// A hash meets the target when it has a `0` at every leading zero position
/// of the stripped target and its significant prefix sorts strictly below
/// the stripped target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    stripped: String,
    leading_zeros: usize,
}

impl Target {
    /// Build the comparison target for a packed difficulty.
    pub fn from_difficulty(packed: u32, fudge: u8) -> Result<Self> {
        let stripped = unpack_stripped(packed, fudge)?;
        let leading_zeros = stripped.bytes().take_while(|b| *b == b'0').count();
        Ok(Self {
            stripped,
            leading_zeros,
        })
    }

    /// Stripped rotated target.
    pub fn stripped(&self) -> &str {
        &self.stripped
    }

    /// Number of leading `0` characters a hash must have.
    pub fn leading_zeros(&self) -> usize {
        self.leading_zeros
    }

    /// Whether a lowercase hex hash meets this target.
    pub fn is_met_by(&self, hash: &str) -> bool {
        let significant = self.stripped.len();
        if significant == 0 || hash.len() < significant {
            return false;
        }
        let hash = hash.as_bytes();
        if hash[..self.leading_zeros].iter().any(|b| *b != b'0') {
            return false;
        }
        hash[..significant] < *self.stripped.as_bytes()
    }
}
