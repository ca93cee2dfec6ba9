//! Extended tag header.
//!
//! v2.4 layout (the size counts the whole extended header and is sync-safe):
//!
//! ```text
//! size (4) | flag bytes = 1 | flags (1) | [00] [05 crc (5, sync-safe)] [01 restrictions (1)]
//! ```
//!
//! v2.3 layout (the size excludes itself and is plain big-endian):
//!
//! ```text
//! size (4) = 6 | 10 | flags (2) | padding size (4) | [crc (4)]
//! ```
//!
//! CRC and restrictions are recorded, not enforced.

use bytes::BufMut;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    ExtendedFlags, Version,
    errors::{ProtocolError, Result},
    syncsafe,
};

/// v2.3 flags word: CRC present
const V23_CRC: u16 = 0x8000;

/// Tag restrictions byte (v2.4)
///
/// ```text
/// %ppqrrstt
/// pp tag size, q text encoding, rr text field size, s image encoding, tt image size
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Restrictions(pub u8);

impl Restrictions {
    /// Tag size restriction, 0 (128 frames / 1 MB) to 3 (32 frames / 4 KB)
    #[must_use]
    pub const fn tag_size(self) -> u8 {
        self.0 >> 6
    }

    /// Text restricted to Latin-1 and UTF-8
    #[must_use]
    pub const fn text_encoding(self) -> bool {
        self.0 & 0x20 != 0
    }

    /// Text field size restriction, 0 (none) to 3 (30 characters)
    #[must_use]
    pub const fn text_size(self) -> u8 {
        (self.0 >> 3) & 0x03
    }

    /// Images restricted to PNG and JPEG
    #[must_use]
    pub const fn image_encoding(self) -> bool {
        self.0 & 0x04 != 0
    }

    /// Image size restriction, 0 (none) to 3 (exactly 64x64)
    #[must_use]
    pub const fn image_size(self) -> u8 {
        self.0 & 0x03
    }
}

/// Extended header contents, independent of version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtendedHeader {
    /// Tag updates an earlier tag (v2.4)
    pub update: bool,
    /// CRC-32 of the frame data
    pub crc: Option<u32>,
    /// Tag restrictions (v2.4)
    pub restrictions: Option<Restrictions>,
}

impl ExtendedHeader {
    /// Flags announcing the present sub-records
    #[must_use]
    pub fn flags(&self) -> ExtendedFlags {
        let mut flags = ExtendedFlags::empty();
        flags.set(ExtendedFlags::UPDATE, self.update);
        flags.set(ExtendedFlags::CRC, self.crc.is_some());
        flags.set(ExtendedFlags::RESTRICTIONS, self.restrictions.is_some());
        flags
    }

    /// Encoded length in `version`.
    #[must_use]
    pub fn encoded_len(&self, version: Version) -> usize {
        let crc = usize::from(self.crc.is_some());
        match version {
            Version::V23 => 10 + 4 * crc,
            _ => 6 + usize::from(self.update) + 6 * crc + 2 * usize::from(self.restrictions.is_some()),
        }
    }

    /// Parse the extended header at the front of `src`.
    ///
    /// Returns the header and the number of bytes it occupies.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::InvalidHeader`] for a size that disagrees with the
    ///   contents, a flag-byte count other than 1, or a bad sub-record length
    /// - [`ProtocolError::InvalidBits`] for undefined flag bits
    /// - [`ProtocolError::InvalidCrc`] for a CRC wider than 32 bits
    /// - [`ProtocolError::BadSync`] for malformed sync-safe fields
    /// - [`ProtocolError::UnexpectedEof`] if `src` is too short
    pub fn decode(src: &[u8], version: Version) -> Result<(Self, usize)> {
        match version {
            Version::V24 => Self::decode_v24(src),
            Version::V23 => Self::decode_v23(src),
            Version::V22 => Err(ProtocolError::Unimplemented("ID3v2.2 extended header")),
        }
    }

    fn decode_v24(src: &[u8]) -> Result<(Self, usize)> {
        let fixed = need(src, 6)?;
        let size = syncsafe::decode_u28([fixed[0], fixed[1], fixed[2], fixed[3]])? as usize;
        if size < 6 || fixed[4] != 1 {
            return Err(ProtocolError::InvalidHeader);
        }
        let flags =
            ExtendedFlags::from_bits(fixed[5]).ok_or(ProtocolError::InvalidBits(fixed[5].into()))?;

        let mut body = &need(src, size)?[6..];
        let update = record(&mut body, flags.contains(ExtendedFlags::UPDATE), 0)?.is_some();
        let crc = match record(&mut body, flags.contains(ExtendedFlags::CRC), 5)? {
            Some(data) => {
                let value = syncsafe::decode(data)?;
                Some(u32::try_from(value).map_err(|_| ProtocolError::InvalidCrc)?)
            },
            None => None,
        };
        let restrictions = record(&mut body, flags.contains(ExtendedFlags::RESTRICTIONS), 1)?
            .map(|data| Restrictions(data[0]));

        if !body.is_empty() {
            return Err(ProtocolError::InvalidHeader);
        }
        Ok((Self { update, crc, restrictions }, size))
    }

    fn decode_v23(src: &[u8]) -> Result<(Self, usize)> {
        let fixed = need(src, 10)?;
        let size = u32::from_be_bytes([fixed[0], fixed[1], fixed[2], fixed[3]]) as usize;
        let flags = u16::from_be_bytes([fixed[4], fixed[5]]);
        if flags & !V23_CRC != 0 {
            return Err(ProtocolError::InvalidBits(flags));
        }
        let has_crc = flags & V23_CRC != 0;
        let expected = if has_crc { 10 } else { 6 };
        if size != expected {
            return Err(ProtocolError::InvalidHeader);
        }

        let all = need(src, 4 + size)?;
        let declared_padding = u32::from_be_bytes([all[6], all[7], all[8], all[9]]);
        debug!(declared_padding, "v2.3 extended header");
        let crc = has_crc.then(|| u32::from_be_bytes([all[10], all[11], all[12], all[13]]));

        Ok((Self { update: false, crc, restrictions: None }, 4 + size))
    }

    /// Serialize for `version`.
    ///
    /// `padding` fills the v2.3 padding-size field and is ignored for v2.4.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidTag`] if v2.3 is asked to carry an
    /// update flag or restrictions, which it cannot express.
    pub fn encode(&self, version: Version, padding: u32, dst: &mut impl BufMut) -> Result<()> {
        match version {
            Version::V24 => {
                let size =
                    u32::try_from(self.encoded_len(version)).map_err(|_| ProtocolError::BadSync)?;
                dst.put_slice(&syncsafe::encode_u28(size)?);
                dst.put_u8(1);
                dst.put_u8(self.flags().bits());
                if self.update {
                    dst.put_u8(0);
                }
                if let Some(crc) = self.crc {
                    dst.put_u8(5);
                    dst.put_slice(&syncsafe::encode(u64::from(crc), 5)?);
                }
                if let Some(restrictions) = self.restrictions {
                    dst.put_slice(&[1, restrictions.0]);
                }
            },
            Version::V23 => {
                if self.update || self.restrictions.is_some() {
                    return Err(ProtocolError::InvalidTag(
                        "v2.3 extended header has no update flag or restrictions",
                    ));
                }
                dst.put_u32(if self.crc.is_some() { 10 } else { 6 });
                dst.put_u16(if self.crc.is_some() { V23_CRC } else { 0 });
                dst.put_u32(padding);
                if let Some(crc) = self.crc {
                    dst.put_u32(crc);
                }
            },
            Version::V22 => return Err(ProtocolError::Unimplemented("ID3v2.2 extended header")),
        }
        Ok(())
    }
}

/// Take one `length | data` sub-record when `present`.
fn record<'a>(body: &mut &'a [u8], present: bool, len: usize) -> Result<Option<&'a [u8]>> {
    if !present {
        return Ok(None);
    }
    let whole: &'a [u8] = *body;
    match whole {
        [n, rest @ ..] if usize::from(*n) == len && rest.len() >= len => {
            let (data, tail) = rest.split_at(len);
            *body = tail;
            Ok(Some(data))
        },
        _ => Err(ProtocolError::InvalidHeader),
    }
}

fn need(src: &[u8], n: usize) -> Result<&[u8]> {
    src.get(..n).ok_or(ProtocolError::UnexpectedEof { expected: n, actual: src.len() })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(header: &ExtendedHeader, version: Version, padding: u32) -> Vec<u8> {
        let mut wire = Vec::new();
        header.encode(version, padding, &mut wire).expect("should encode");
        wire
    }

    #[test]
    fn v24_minimal() {
        let header = ExtendedHeader::default();
        let wire = encoded(&header, Version::V24, 0);
        assert_eq!(hex::encode(&wire), "000000060100");
        assert_eq!(ExtendedHeader::decode(&wire, Version::V24), Ok((header, 6)));
    }

    #[test]
    fn v24_all_records() {
        let header = ExtendedHeader {
            update: true,
            crc: Some(0xDEAD_BEEF),
            restrictions: Some(Restrictions(0b1010_0101)),
        };
        let wire = encoded(&header, Version::V24, 0);
        assert_eq!(hex::encode(&wire), "0000000f01700005 0d75367d6f 01a5".replace(' ', ""));
        assert_eq!(wire.len(), header.encoded_len(Version::V24));
        assert_eq!(ExtendedHeader::decode(&wire, Version::V24), Ok((header, 15)));
        assert_eq!(header.flags(), ExtendedFlags::all());
    }

    #[test]
    fn v24_rejects_bad_shapes() {
        // flag-byte count must be 1
        let wire = hex::decode("000000060200").expect("valid hex");
        assert_eq!(ExtendedHeader::decode(&wire, Version::V24), Err(ProtocolError::InvalidHeader));

        // undefined flag bit
        let wire = hex::decode("000000060101").expect("valid hex");
        assert_eq!(ExtendedHeader::decode(&wire, Version::V24), Err(ProtocolError::InvalidBits(1)));

        // restrictions record with the wrong length byte
        let wire = hex::decode("00000008011002a5").expect("valid hex");
        assert_eq!(ExtendedHeader::decode(&wire, Version::V24), Err(ProtocolError::InvalidHeader));

        // size larger than the records
        let wire = hex::decode("0000000701000000").expect("valid hex");
        assert_eq!(ExtendedHeader::decode(&wire, Version::V24), Err(ProtocolError::InvalidHeader));
    }

    #[test]
    fn v24_crc_must_fit_32_bits() {
        let wire = hex::decode("0000000c0120051f7f7f7f7f").expect("valid hex");
        assert_eq!(ExtendedHeader::decode(&wire, Version::V24), Err(ProtocolError::InvalidCrc));
    }

    #[test]
    fn v23_layout() {
        let header = ExtendedHeader { crc: Some(0x0102_0304), ..ExtendedHeader::default() };
        let wire = encoded(&header, Version::V23, 256);
        assert_eq!(hex::encode(&wire), "0000000a800000000100 01020304".replace(' ', ""));
        assert_eq!(ExtendedHeader::decode(&wire, Version::V23), Ok((header, 14)));

        let plain = encoded(&ExtendedHeader::default(), Version::V23, 0);
        assert_eq!(plain.len(), 10);
    }

    #[test]
    fn v23_cannot_carry_restrictions() {
        let header = ExtendedHeader { restrictions: Some(Restrictions(0)), ..ExtendedHeader::default() };
        let mut wire = Vec::new();
        assert!(matches!(
            header.encode(Version::V23, 0, &mut wire),
            Err(ProtocolError::InvalidTag(_))
        ));
    }

    #[test]
    fn restriction_fields() {
        let r = Restrictions(0b1110_1110);
        assert_eq!(r.tag_size(), 3);
        assert!(r.text_encoding());
        assert_eq!(r.text_size(), 1);
        assert!(r.image_encoding());
        assert_eq!(r.image_size(), 2);
    }
}
