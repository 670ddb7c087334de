//! Compact target utilities.

use primitive_types::U256;
use thiserror::Error;

/// Proof-of-work limit of the chain in compact form
pub const POW_LIMIT_BITS: u32 = 0x1f00_08ff;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactError {
    #[error("compact target has negative sign bit")]
    Negative,
    #[error("compact target overflows 256-bit range")]
    Overflow,
}

pub fn compact_to_u256(bits: u32) -> Result<U256, CompactError> {
    let size = bits >> 24;
    let mut word = bits & 0x007f_ffff;

    if bits & 0x0080_0000 != 0 {
        return Err(CompactError::Negative);
    }

    let value = if size <= 3 {
        word >>= 8 * (3 - size);
        U256::from(word)
    } else {
        U256::from(word) << (8 * (size - 3))
    };

    if word != 0 {
        let overflow =
            size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32);
        if overflow {
            return Err(CompactError::Overflow);
        }
    }

    Ok(value)
}

/// Ratio of the pow-limit target to the target encoded in `bits`, as a
/// decimal integer string. A zero or undecodable target gives "0".
pub fn difficulty_string(pow_limit_bits: u32, bits: u32) -> String {
    let (Ok(limit), Ok(target)) = (compact_to_u256(pow_limit_bits), compact_to_u256(bits)) else {
        return "0".to_string();
    };
    if target.is_zero() {
        return "0".to_string();
    }
    (limit / target).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_decoding() {
        assert_eq!(compact_to_u256(0x0300_ffff).unwrap(), U256::from(0xffffu32));
        assert_eq!(
            compact_to_u256(0x0401_0000).unwrap(),
            U256::from(0x0100_0000u32)
        );
        assert_eq!(compact_to_u256(0x0180_0000), Err(CompactError::Negative));
        assert_eq!(compact_to_u256(0xff12_3456), Err(CompactError::Overflow));
    }

    #[test]
    fn test_difficulty_at_limit_is_one() {
        assert_eq!(difficulty_string(POW_LIMIT_BITS, POW_LIMIT_BITS), "1");
    }

    #[test]
    fn test_harder_target() {
        // One byte shorter target: 256 times harder
        assert_eq!(difficulty_string(POW_LIMIT_BITS, 0x1e00_08ff), "256");
        assert_eq!(difficulty_string(POW_LIMIT_BITS, 0), "0");
    }
}
