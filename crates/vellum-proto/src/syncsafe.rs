//! Sync-safe integers.
//!
//! ID3v2 stores sizes seven bits per byte with the top bit of every byte
//! cleared, so a size can never look like an MPEG frame sync (`0xFF 0xE0`).
//! Four bytes carry 28 bits; the extended header CRC uses five bytes (35 bits).

use crate::errors::{ProtocolError, Result};

/// Largest value representable in four sync-safe bytes.
pub const MAX_U28: u32 = 0x0FFF_FFFF;

/// Decode a 4- or 5-byte sync-safe integer (most significant byte first).
///
/// # Errors
///
/// Returns [`ProtocolError::BadSync`] if any byte has its top bit set or the
/// slice is not 4 or 5 bytes long.
pub fn decode(bytes: &[u8]) -> Result<u64> {
    if !matches!(bytes.len(), 4 | 5) {
        return Err(ProtocolError::BadSync);
    }

    bytes.iter().try_fold(0u64, |acc, &b| {
        if b & 0x80 != 0 {
            return Err(ProtocolError::BadSync);
        }
        Ok((acc << 7) | u64::from(b))
    })
}

/// Encode `value` into `n` sync-safe bytes (`n` is 4 or 5).
///
/// # Errors
///
/// Returns [`ProtocolError::BadSync`] if `n` is not 4 or 5, or if the value
/// does not fit in `7 * n` bits.
pub fn encode(value: u64, n: usize) -> Result<Vec<u8>> {
    if !matches!(n, 4 | 5) || value >> (7 * n) != 0 {
        return Err(ProtocolError::BadSync);
    }

    Ok((0..n).rev().map(|i| ((value >> (7 * i)) & 0x7F) as u8).collect())
}

/// Decode the common 4-byte form.
///
/// # Errors
///
/// Returns [`ProtocolError::BadSync`] if any byte has its top bit set.
pub fn decode_u28(bytes: [u8; 4]) -> Result<u32> {
    // 28 bits always fit
    decode(&bytes).map(|v| v as u32)
}

/// Encode the common 4-byte form.
///
/// # Errors
///
/// Returns [`ProtocolError::BadSync`] if `value > 0x0FFF_FFFF`.
pub fn encode_u28(value: u32) -> Result<[u8; 4]> {
    if value > MAX_U28 {
        return Err(ProtocolError::BadSync);
    }

    Ok([
        ((value >> 21) & 0x7F) as u8,
        ((value >> 14) & 0x7F) as u8,
        ((value >> 7) & 0x7F) as u8,
        (value & 0x7F) as u8,
    ])
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn known_values() {
        assert_eq!(decode(&[0x00, 0x00, 0x02, 0x01]), Ok(257));
        assert_eq!(decode(&[0x00, 0x00, 0x39, 0x5D]), Ok(7389));
        assert_eq!(decode(&[0x7F, 0x7F, 0x7F, 0x7F]), Ok(u64::from(MAX_U28)));
        assert_eq!(encode_u28(257), Ok([0x00, 0x00, 0x02, 0x01]));
    }

    #[test]
    fn reject_top_bit() {
        assert_eq!(decode(&[0x80, 0x80, 0x80, 0x80]), Err(ProtocolError::BadSync));
        assert_eq!(decode(&[0x00, 0x00, 0xFF, 0x00]), Err(ProtocolError::BadSync));
        assert_eq!(decode_u28([0x00, 0x00, 0x00, 0x80]), Err(ProtocolError::BadSync));
    }

    #[test]
    fn reject_bad_lengths() {
        assert_eq!(decode(&[0x00; 3]), Err(ProtocolError::BadSync));
        assert_eq!(decode(&[0x00; 6]), Err(ProtocolError::BadSync));
        assert_eq!(encode(1, 3), Err(ProtocolError::BadSync));
    }

    #[test]
    fn reject_out_of_range() {
        assert_eq!(encode(u64::from(MAX_U28) + 1, 4), Err(ProtocolError::BadSync));
        assert_eq!(encode_u28(MAX_U28 + 1), Err(ProtocolError::BadSync));
        assert!(encode(u64::from(u32::MAX), 5).is_ok());
    }

    #[test]
    fn five_byte_crc() {
        let bytes = encode(0xDEAD_BEEF, 5).expect("fits in 35 bits");
        assert_eq!(bytes, vec![0x0D, 0x75, 0x36, 0x7D, 0x6F]);
        assert_eq!(decode(&bytes), Ok(0xDEAD_BEEF));
    }

    proptest! {
        #[test]
        fn u28_round_trip(v in 0u32..=MAX_U28) {
            let bytes = encode_u28(v).expect("in range");
            prop_assert!(bytes.iter().all(|b| b & 0x80 == 0));
            prop_assert_eq!(decode_u28(bytes), Ok(v));
            prop_assert_eq!(encode(u64::from(v), 4).expect("in range"), bytes.to_vec());
        }
    }
}
