//! Tag, extended-header and frame flags.
//!
//! Flags are kept in their ID3v2.4 bit positions. ID3v2.3 frames use a
//! different layout for the same meanings; [`FrameFlags::from_v23`] and
//! [`FrameFlags::to_v23`] translate between the two.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::{
    Version,
    errors::{ProtocolError, Result},
};

bitflags! {
    /// Tag header flag byte
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct TagFlags: u8 {
        /// Every byte after the header is unsynchronized
        const UNSYNCHRONIZED = 0b1000_0000;

        /// An extended header follows the tag header
        const EXTENDED_HEADER = 0b0100_0000;

        /// Tag is in an experimental stage
        const EXPERIMENTAL = 0b0010_0000;

        /// A footer follows the frames (v2.4 only)
        const FOOTER = 0b0001_0000;
    }
}

impl TagFlags {
    /// Parse the header flag byte for `version`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidHeaderFlags`] if a bit the version does
    /// not define is set.
    pub fn from_byte(byte: u8, version: Version) -> Result<Self> {
        let flags = Self::from_bits(byte).ok_or(ProtocolError::InvalidHeaderFlags(byte))?;
        if version != Version::V24 && flags.contains(Self::FOOTER) {
            return Err(ProtocolError::InvalidHeaderFlags(byte));
        }
        Ok(flags)
    }

    /// Convert to raw byte value
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        self.bits()
    }
}

impl Default for TagFlags {
    fn default() -> Self {
        Self::empty()
    }
}

bitflags! {
    /// Extended header flags (v2.4 layout)
    ///
    /// Set only by parsing an extended header; each flag announces one
    /// sub-record of the extended header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ExtendedFlags: u8 {
        /// Tag updates an earlier tag
        const UPDATE = 0b0100_0000;

        /// CRC-32 of the frame data is present
        const CRC = 0b0010_0000;

        /// Tag restrictions byte is present
        const RESTRICTIONS = 0b0001_0000;
    }
}

impl Default for ExtendedFlags {
    fn default() -> Self {
        Self::empty()
    }
}

bitflags! {
    /// Frame status and format flags, in v2.4 bit positions
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct FrameFlags: u16 {
        /// Discard the frame if the tag is altered
        const DISCARD_ON_TAG_ALTERATION = 1 << 14;

        /// Discard the frame if the audio is altered
        const DISCARD_ON_FILE_ALTERATION = 1 << 13;

        /// Frame is read only
        const READ_ONLY = 1 << 12;

        /// Group id byte follows the header
        const GROUP_INFO = 1 << 6;

        /// Payload is zlib compressed
        const COMPRESSED = 1 << 3;

        /// Payload is encrypted; method byte follows the header
        const ENCRYPTED = 1 << 2;

        /// Payload is unsynchronized
        const UNSYNCHRONIZED = 1 << 1;

        /// Data-length indicator follows the header
        const DATA_LENGTH = 1 << 0;
    }
}

/// v2.3 flag bit → v2.4 flag
const V23_MAP: [(u16, FrameFlags); 6] = [
    (0x8000, FrameFlags::DISCARD_ON_TAG_ALTERATION),
    (0x4000, FrameFlags::DISCARD_ON_FILE_ALTERATION),
    (0x2000, FrameFlags::READ_ONLY),
    (0x0080, FrameFlags::COMPRESSED),
    (0x0040, FrameFlags::ENCRYPTED),
    (0x0020, FrameFlags::GROUP_INFO),
];

impl FrameFlags {
    /// Create flags from the raw v2.4 flags word.
    ///
    /// Infallible: bits the standard does not define are retained so the
    /// frame re-encodes unchanged.
    #[must_use]
    pub const fn from_v24(raw: u16) -> Self {
        Self::from_bits_retain(raw)
    }

    /// Convert to the raw v2.4 flags word
    #[must_use]
    pub const fn to_v24(self) -> u16 {
        self.bits()
    }

    /// Translate a v2.3 flags word.
    ///
    /// A compressed v2.3 frame always carries its decompressed size, which
    /// maps onto [`FrameFlags::DATA_LENGTH`].
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidFrameFlags`] for undefined bits.
    pub fn from_v23(raw: u16) -> Result<Self> {
        let known = V23_MAP.iter().fold(0u16, |acc, (bit, _)| acc | bit);
        if raw & !known != 0 {
            return Err(ProtocolError::InvalidFrameFlags(raw));
        }

        let mut flags =
            V23_MAP.iter().filter(|(bit, _)| raw & bit != 0).fold(Self::empty(), |acc, (_, f)| acc | *f);
        if flags.contains(Self::COMPRESSED) {
            flags |= Self::DATA_LENGTH;
        }
        Ok(flags)
    }

    /// Translate to a v2.3 flags word.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidFrameFlags`] for flags v2.3 cannot
    /// express (per-frame unsynchronization, a data-length indicator on an
    /// uncompressed frame, undefined bits).
    pub fn to_v23(self) -> Result<u16> {
        let expressible = V23_MAP.iter().fold(Self::empty(), |acc, (_, f)| acc | *f);
        let rest = self.difference(expressible);
        let dli_ok = rest == Self::DATA_LENGTH && self.contains(Self::COMPRESSED);
        if !rest.is_empty() && !dli_ok {
            return Err(ProtocolError::InvalidFrameFlags(self.bits()));
        }

        Ok(V23_MAP.iter().filter(|(_, f)| self.contains(*f)).fold(0, |acc, (bit, _)| acc | bit))
    }
}

impl Default for FrameFlags {
    fn default() -> Self {
        Self::empty()
    }
}
