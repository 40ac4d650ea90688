//! Difficulty targets and retargeting
//!
//! Targets are 256-bit unsigned integers carried in headers as "compact
//! bits": one size byte followed by a 23-bit mantissa and a sign bit.

use log::debug;
use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};
use thiserror::Error;

use crate::chainparams::ChainParams;
use crate::constants::{DIFFICULTY_ADJUSTMENT_INTERVAL, TARGET_TIMESPAN};
use crate::crypto::Hash;

/// Maximum adjustment factor (4x in either direction per period)
const MAX_ADJUSTMENT_FACTOR: i64 = 4;

/// Compact bits that do not describe a usable target
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompactError {
    #[error("compact target 0x{0:08x} is negative")]
    Negative(u32),
    #[error("compact target 0x{0:08x} overflows 256 bits")]
    Overflow(u32),
}

/// Decode compact bits into a full target
pub fn compact_to_target(bits: u32) -> Result<BigUint, CompactError> {
    let size = bits >> 24;
    let mut word = bits & 0x007f_ffff;

    let target = if size <= 3 {
        word >>= 8 * (3 - size);
        BigUint::from(word)
    } else {
        BigUint::from(word) << (8 * (size - 3)) as usize
    };

    if word != 0 && bits & 0x0080_0000 != 0 {
        return Err(CompactError::Negative(bits));
    }
    if word != 0 && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32)) {
        return Err(CompactError::Overflow(bits));
    }

    Ok(target)
}

/// Encode a target as compact bits (lossy: keeps the top three bytes)
pub fn target_to_compact(target: &BigUint) -> u32 {
    let mut size = ((target.bits() + 7) / 8) as u32;
    let mut compact = if size <= 3 {
        let low = target.to_u32().unwrap_or(0);
        low << (8 * (3 - size))
    } else {
        let top: BigUint = target >> (8 * (size - 3)) as usize;
        top.to_u32().unwrap_or(0)
    };

    // The 0x00800000 bit is the sign; shift it out of the mantissa.
    if compact & 0x0080_0000 != 0 {
        compact >>= 8;
        size += 1;
    }

    compact | (size << 24)
}

/// Interpret a block hash as a 256-bit integer
pub fn hash_to_target(hash: &Hash) -> BigUint {
    BigUint::from_bytes_le(&hash.0)
}

/// Convert a 256-bit integer back to hash byte order
pub fn target_to_hash(target: &BigUint) -> Hash {
    let mut bytes = [0u8; 32];
    let le = target.to_bytes_le();
    let len = le.len().min(32);
    bytes[..len].copy_from_slice(&le[..len]);
    Hash(bytes)
}

/// Expected number of hashes to meet `bits`: 2^256 / (target + 1)
///
/// Unusable bits carry no work.
pub fn block_work(bits: u32) -> BigUint {
    match compact_to_target(bits) {
        Ok(target) if !target.is_zero() => (BigUint::one() << 256usize) / (target + 1u32),
        _ => BigUint::zero(),
    }
}

/// Calculate the compact target for the next adjustment period
///
/// The observed timespan is clamped to a quarter and four times the
/// expected timespan; the result never exceeds the network's pow limit.
/// Unusable `last_bits` are an error, not a reset to the limit.
pub fn calculate_next_difficulty(
    params: &ChainParams,
    last_bits: u32,
    first_block_time: i64,
    last_block_time: i64,
) -> Result<u32, CompactError> {
    let expected = TARGET_TIMESPAN;
    let actual = (last_block_time - first_block_time)
        .clamp(expected / MAX_ADJUSTMENT_FACTOR, expected * MAX_ADJUSTMENT_FACTOR);

    let pow_limit = params.pow_limit_target();
    let current = compact_to_target(last_bits)?;

    let mut next = current * BigUint::from(actual as u64) / BigUint::from(expected as u64);
    if next > pow_limit {
        next = pow_limit;
    }

    let next_bits = target_to_compact(&next);
    debug!(
        "retarget: timespan {}s (expected {}s), 0x{:08x} -> 0x{:08x}",
        actual, expected, last_bits, next_bits
    );
    Ok(next_bits)
}

/// Check if difficulty should be adjusted at this height
pub fn should_adjust_difficulty(height: u64) -> bool {
    height > 0 && height % DIFFICULTY_ADJUSTMENT_INTERVAL == 0
}

/// Get the height of the first block in the current adjustment period
pub fn get_period_start_height(height: u64) -> u64 {
    height.saturating_sub(DIFFICULTY_ADJUSTMENT_INTERVAL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chainparams::{main_params, regtest_params};

    #[test]
    fn test_compact_roundtrip_known_values() {
        for bits in [0x1d00ffffu32, 0x1e0fffff, 0x207fffff, 0x1b0404cb] {
            let target = compact_to_target(bits).unwrap();
            assert_eq!(target_to_compact(&target), bits);
        }
    }

    #[test]
    fn test_small_sizes() {
        assert_eq!(compact_to_target(0x01123456).unwrap(), BigUint::from(0x12u32));
        assert_eq!(compact_to_target(0x02123456).unwrap(), BigUint::from(0x1234u32));
        assert_eq!(compact_to_target(0x03123456).unwrap(), BigUint::from(0x123456u32));
        assert_eq!(target_to_compact(&BigUint::from(0x12u32)), 0x01120000);
        assert_eq!(target_to_compact(&BigUint::zero()), 0);
    }

    #[test]
    fn test_negative_and_overflow() {
        assert_eq!(compact_to_target(0x04923456), Err(CompactError::Negative(0x04923456)));
        assert_eq!(compact_to_target(0xff123456), Err(CompactError::Overflow(0xff123456)));
        // zero mantissa is neither
        assert!(compact_to_target(0x04800000).unwrap().is_zero());
    }

    #[test]
    fn test_pow_limits_match_genesis_bits() {
        assert_eq!(target_to_compact(&main_params().pow_limit_target()), 0x1e0fffff);
        assert_eq!(target_to_compact(&regtest_params().pow_limit_target()), 0x207fffff);
    }

    #[test]
    fn test_should_adjust_difficulty() {
        assert!(!should_adjust_difficulty(0));
        assert!(!should_adjust_difficulty(1));
        assert!(should_adjust_difficulty(DIFFICULTY_ADJUSTMENT_INTERVAL));
        assert!(should_adjust_difficulty(DIFFICULTY_ADJUSTMENT_INTERVAL * 2));
    }

    #[test]
    fn test_get_period_start_height() {
        assert_eq!(get_period_start_height(0), 0);
        assert_eq!(get_period_start_height(DIFFICULTY_ADJUSTMENT_INTERVAL), 0);
        assert_eq!(
            get_period_start_height(DIFFICULTY_ADJUSTMENT_INTERVAL * 2),
            DIFFICULTY_ADJUSTMENT_INTERVAL
        );
    }

    #[test]
    fn test_on_schedule_keeps_difficulty() {
        let params = main_params();
        let bits = 0x1c0fffff;
        assert_eq!(calculate_next_difficulty(params, bits, 0, TARGET_TIMESPAN), Ok(bits));
    }

    #[test]
    fn test_fast_blocks_raise_difficulty() {
        let params = main_params();
        let bits = 0x1c0fffff;
        let next = calculate_next_difficulty(params, bits, 0, TARGET_TIMESPAN / 2).unwrap();
        assert!(compact_to_target(next).unwrap() < compact_to_target(bits).unwrap());
    }

    #[test]
    fn test_adjustment_clamped_to_four_times() {
        let params = main_params();
        let bits = 0x1c0fffff;
        let start = compact_to_target(bits).unwrap();

        // compact encoding truncates, so the harder bound is only approximate
        let instant = compact_to_target(calculate_next_difficulty(params, bits, 0, 0).unwrap()).unwrap();
        assert!(&instant * 4u32 <= start);
        assert!(&instant * 5u32 > start);

        let slow = compact_to_target(calculate_next_difficulty(params, bits, 0, TARGET_TIMESPAN * 100).unwrap()).unwrap();
        assert!(slow <= &start * 4u32);
        assert!(slow > &start * 3u32);
    }

    #[test]
    fn test_retarget_capped_at_pow_limit() {
        let params = main_params();
        let next = calculate_next_difficulty(params, 0x1e0fffff, 0, TARGET_TIMESPAN * 4);
        assert_eq!(next, Ok(0x1e0fffff));
    }

    #[test]
    fn test_retarget_rejects_unusable_bits() {
        let params = main_params();
        assert_eq!(
            calculate_next_difficulty(params, 0x04923456, 0, TARGET_TIMESPAN),
            Err(CompactError::Negative(0x04923456))
        );
        assert_eq!(
            calculate_next_difficulty(params, 0xff123456, 0, TARGET_TIMESPAN),
            Err(CompactError::Overflow(0xff123456))
        );
    }

    #[test]
    fn test_harder_bits_more_work() {
        assert!(block_work(0x1c00ffff) > block_work(0x1d00ffff));
        assert_eq!(block_work(0x04923456), BigUint::zero());
        // 2^256 / 2^224 roughly for the classic limit
        assert_eq!(block_work(0x1d00ffff), BigUint::from(0x1_0001_0001u64));
    }

    #[test]
    fn test_hash_target_conversion() {
        let target = compact_to_target(0x1e0fffff).unwrap();
        assert_eq!(hash_to_target(&target_to_hash(&target)), target);
    }
}
