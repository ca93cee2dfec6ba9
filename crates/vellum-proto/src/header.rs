//! Frame header codec.
//!
//! Every frame starts with a fixed 10-byte header, followed by up to six
//! optional bytes whose presence is driven by the header flags:
//!
//! ```text
//! id (4) | size (4) | flags (2) | [group id (1)] [encryption method (1)] [data length (4)]
//! ```
//!
//! The size is sync-safe in v2.4 and plain big-endian in v2.3. It counts the
//! optional bytes as well as the payload. v2.3 orders the optional bytes
//! differently (decompressed size, encryption method, group id).

use bytes::BufMut;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{
    FrameFlags, Version,
    errors::{ProtocolError, Result},
    syncsafe,
};

/// Four-character frame identifier.
///
/// The first character is an uppercase letter or digit; the rest are ASCII
/// letters or digits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId([u8; 4]);

impl FrameId {
    /// Attached picture
    pub const APIC: Self = Self(*b"APIC");
    /// Comment
    pub const COMM: Self = Self(*b"COMM");
    /// Popularimeter
    pub const POPM: Self = Self(*b"POPM");
    /// Beats per minute
    pub const TBPM: Self = Self(*b"TBPM");
    /// Title
    pub const TIT2: Self = Self(*b"TIT2");
    /// User-defined text
    pub const TXXX: Self = Self(*b"TXXX");
    /// Unique file identifier
    pub const UFID: Self = Self(*b"UFID");
    /// Unsynchronised lyrics
    pub const USLT: Self = Self(*b"USLT");
    /// User-defined URL
    pub const WXXX: Self = Self(*b"WXXX");

    /// Validate raw identifier bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidFrameHeader`] if the first byte is not
    /// in `[A-Z0-9]` or a later byte is not an ASCII letter or digit.
    pub fn from_bytes(bytes: [u8; 4]) -> Result<Self> {
        let first_ok = bytes[0].is_ascii_uppercase() || bytes[0].is_ascii_digit();
        if !first_ok || !bytes[1..].iter().all(u8::is_ascii_alphanumeric) {
            return Err(ProtocolError::InvalidFrameHeader);
        }
        Ok(Self(bytes))
    }

    /// Parse a four-character identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidFrameHeader`] for anything that is not
    /// a valid four-byte identifier.
    pub fn new(id: &str) -> Result<Self> {
        let bytes: [u8; 4] =
            id.as_bytes().try_into().map_err(|_| ProtocolError::InvalidFrameHeader)?;
        Self::from_bytes(bytes)
    }

    /// Raw identifier bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Identifier as text
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Construction guarantees ASCII.
        std::str::from_utf8(&self.0).unwrap_or("????")
    }
}

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Debug for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FrameId({})", self.as_str())
    }
}

impl std::str::FromStr for FrameId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl Serialize for FrameId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FrameId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let id = String::deserialize(deserializer)?;
        Self::new(&id).map_err(serde::de::Error::custom)
    }
}

/// Fixed 10-byte wire header (Big Endian)
#[repr(C)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
struct RawFrameHeader {
    id: [u8; 4],
    size: [u8; 4],
    flags: [u8; 2],
}

/// Decoded frame header, including the flag-driven optional bytes.
///
/// # Invariants
///
/// - `size` counts the optional bytes and the payload as stored on the wire.
/// - `group_id` is present iff [`FrameFlags::GROUP_INFO`] is set,
///   `encryption_method` iff [`FrameFlags::ENCRYPTED`], `data_length` iff
///   [`FrameFlags::DATA_LENGTH`]. Marker bytes are in `[0x80, 0xF0]`.
/// - In v2.4, [`FrameFlags::COMPRESSED`] requires [`FrameFlags::DATA_LENGTH`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameHeader {
    /// Frame identifier
    pub id: FrameId,
    /// Encoded size after the 10-byte header
    pub size: u32,
    /// Status and format flags
    pub flags: FrameFlags,
    /// Group identifier
    pub group_id: Option<u8>,
    /// Encryption method marker
    pub encryption_method: Option<u8>,
    /// Payload length before per-frame transforms
    pub data_length: Option<u32>,
}

impl FrameHeader {
    /// Size of the fixed part of the header
    pub const SIZE: usize = 10;

    /// Valid range for group and encryption marker bytes
    pub const MARKER_RANGE: std::ops::RangeInclusive<u8> = 0x80..=0xF0;

    /// Header with no flags and no payload.
    #[must_use]
    pub const fn new(id: FrameId) -> Self {
        Self { id, size: 0, flags: FrameFlags::empty(), group_id: None, encryption_method: None, data_length: None }
    }

    /// Number of optional bytes the flags call for.
    #[must_use]
    pub fn extra_len(&self) -> usize {
        let mut n = 0;
        if self.flags.contains(FrameFlags::GROUP_INFO) {
            n += 1;
        }
        if self.flags.contains(FrameFlags::ENCRYPTED) {
            n += 1;
        }
        if self.flags.contains(FrameFlags::DATA_LENGTH) {
            n += 4;
        }
        n
    }

    /// Parse a header from the front of `src`.
    ///
    /// Returns `Ok(None)` when `src` starts with padding (four zero bytes, or
    /// fewer than four bytes left). Otherwise returns the header and the
    /// number of bytes it occupies, optional bytes included.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::InvalidFrameHeader`] for a bad identifier, a zero
    ///   size, or a size too small for the optional bytes
    /// - [`ProtocolError::InvalidFrameFlags`] for compression without a data
    ///   length (v2.4), out-of-range markers, or undefined v2.3 bits
    /// - [`ProtocolError::BadSync`] for a malformed v2.4 size
    /// - [`ProtocolError::UnexpectedEof`] if the header is cut short
    /// - [`ProtocolError::Unimplemented`] for v2.2
    pub fn decode(src: &[u8], version: Version) -> Result<Option<(Self, usize)>> {
        if src.len() < 4 || src[..4] == [0; 4] {
            return Ok(None);
        }

        let (raw, rest) = RawFrameHeader::ref_from_prefix(src).map_err(|_| {
            ProtocolError::UnexpectedEof { expected: Self::SIZE, actual: src.len() }
        })?;

        let id = FrameId::from_bytes(raw.id)?;
        let raw_flags = u16::from_be_bytes(raw.flags);
        let (size, flags) = match version {
            Version::V24 => (syncsafe::decode_u28(raw.size)?, FrameFlags::from_v24(raw_flags)),
            Version::V23 => (u32::from_be_bytes(raw.size), FrameFlags::from_v23(raw_flags)?),
            Version::V22 => return Err(ProtocolError::Unimplemented("ID3v2.2 frames")),
        };

        if size == 0 {
            return Err(ProtocolError::InvalidFrameHeader);
        }
        if version == Version::V24
            && flags.contains(FrameFlags::COMPRESSED)
            && !flags.contains(FrameFlags::DATA_LENGTH)
        {
            return Err(ProtocolError::InvalidFrameFlags(raw_flags));
        }

        let mut header = Self { id, size, flags, group_id: None, encryption_method: None, data_length: None };
        let extra = header.extra_len();
        if (size as usize) < extra {
            return Err(ProtocolError::InvalidFrameHeader);
        }
        if rest.len() < extra {
            return Err(ProtocolError::UnexpectedEof { expected: extra, actual: rest.len() });
        }

        let mut opt = &rest[..extra];
        let marker = |b: u8| {
            if Self::MARKER_RANGE.contains(&b) {
                Ok(b)
            } else {
                Err(ProtocolError::InvalidFrameFlags(raw_flags))
            }
        };

        match version {
            Version::V24 => {
                if flags.contains(FrameFlags::GROUP_INFO) {
                    header.group_id = Some(marker(split_off(&mut opt, 1)[0])?);
                }
                if flags.contains(FrameFlags::ENCRYPTED) {
                    header.encryption_method = Some(marker(split_off(&mut opt, 1)[0])?);
                }
                if flags.contains(FrameFlags::DATA_LENGTH) {
                    header.data_length = Some(syncsafe::decode_u28(be4(split_off(&mut opt, 4)))?);
                }
            },
            _ => {
                if flags.contains(FrameFlags::DATA_LENGTH) {
                    header.data_length = Some(u32::from_be_bytes(be4(split_off(&mut opt, 4))));
                }
                if flags.contains(FrameFlags::ENCRYPTED) {
                    header.encryption_method = Some(marker(split_off(&mut opt, 1)[0])?);
                }
                if flags.contains(FrameFlags::GROUP_INFO) {
                    header.group_id = Some(marker(split_off(&mut opt, 1)[0])?);
                }
            },
        }

        Ok(Some((header, Self::SIZE + extra)))
    }

    /// Serialize the header and its optional bytes.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::InvalidFrameFlags`] if a flag's optional value is
    ///   missing or out of range, or the flags cannot be expressed in `version`
    /// - [`ProtocolError::BadSync`] if a v2.4 size exceeds 28 bits
    /// - [`ProtocolError::Unimplemented`] for v2.2
    pub fn encode(&self, version: Version, dst: &mut impl BufMut) -> Result<()> {
        let raw_flags = match version {
            Version::V24 => self.flags.to_v24(),
            Version::V23 => self.flags.to_v23()?,
            Version::V22 => return Err(ProtocolError::Unimplemented("ID3v2.2 frames")),
        };
        let invalid = || ProtocolError::InvalidFrameFlags(self.flags.bits());

        if version == Version::V24
            && self.flags.contains(FrameFlags::COMPRESSED)
            && !self.flags.contains(FrameFlags::DATA_LENGTH)
        {
            return Err(invalid());
        }

        let marker = |flag: FrameFlags, value: Option<u8>| -> Result<Option<u8>> {
            if !self.flags.contains(flag) {
                return Ok(None);
            }
            value.filter(|b| Self::MARKER_RANGE.contains(b)).map(Some).ok_or_else(invalid)
        };
        let group_id = marker(FrameFlags::GROUP_INFO, self.group_id)?;
        let encryption_method = marker(FrameFlags::ENCRYPTED, self.encryption_method)?;
        let data_length = if self.flags.contains(FrameFlags::DATA_LENGTH) {
            Some(self.data_length.ok_or_else(invalid)?)
        } else {
            None
        };

        let size = match version {
            Version::V24 => syncsafe::encode_u28(self.size)?,
            _ => self.size.to_be_bytes(),
        };
        let raw = RawFrameHeader { id: self.id.0, size, flags: raw_flags.to_be_bytes() };
        dst.put_slice(raw.as_bytes());

        match version {
            Version::V24 => {
                group_id.into_iter().for_each(|b| dst.put_u8(b));
                encryption_method.into_iter().for_each(|b| dst.put_u8(b));
                if let Some(len) = data_length {
                    dst.put_slice(&syncsafe::encode_u28(len)?);
                }
            },
            _ => {
                data_length.into_iter().for_each(|len| dst.put_u32(len));
                encryption_method.into_iter().for_each(|b| dst.put_u8(b));
                group_id.into_iter().for_each(|b| dst.put_u8(b));
            },
        }

        Ok(())
    }
}

fn split_off<'a>(src: &mut &'a [u8], n: usize) -> &'a [u8] {
    let whole: &'a [u8] = *src;
    let (head, tail) = whole.split_at(n);
    *src = tail;
    head
}

fn be4(bytes: &[u8]) -> [u8; 4] {
    let mut out = [0u8; 4];
    out.copy_from_slice(bytes);
    out
}
