//! Error types for the ID3v2 codec.
//!
//! All errors are structured, testable, and carry enough context to tell a
//! truncated stream apart from a malformed one.

use std::io;

use thiserror::Error;

/// Codec errors that can occur while decoding or encoding a tag.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    // Tag-level framing
    /// Tag is internally inconsistent and cannot be written
    #[error("invalid tag: {0}")]
    InvalidTag(&'static str),

    /// Tag header is malformed (signature, version, revision, extended header)
    #[error("invalid tag header")]
    InvalidHeader,

    /// Major version outside the supported range
    #[error("invalid ID3v2 version: 2.{0}")]
    InvalidVersion(u8),

    /// Tag header flag byte has bits set that the version does not define
    #[error("invalid tag header flags: {0:#04x}")]
    InvalidHeaderFlags(u8),

    /// Footer does not mirror the header
    #[error("invalid tag footer")]
    InvalidFooter,

    /// Declared tag size exceeds the configured ceiling
    #[error("tag too large: {size} bytes exceeds maximum {max}")]
    TagTooLarge {
        /// Declared size
        size: usize,
        /// Configured ceiling
        max: usize,
    },

    // Integers
    /// Sync-safe integer byte has its top bit set, or value is out of range
    #[error("bad sync-safe integer")]
    BadSync,

    /// CRC does not fit in 32 bits
    #[error("invalid extended header CRC")]
    InvalidCrc,

    /// Extended header flags have undefined bits set
    #[error("invalid extended header flags: {0:#x}")]
    InvalidBits(u16),

    // Frame-level framing
    /// Frame header is malformed (identifier, size)
    #[error("invalid frame header")]
    InvalidFrameHeader,

    /// Frame flags are inconsistent or out of range
    #[error("invalid frame flags: {0:#06x}")]
    InvalidFrameFlags(u16),

    /// Payload field is out of range
    #[error("invalid frame payload")]
    InvalidFrame,

    // Text
    /// Encoded text is malformed
    #[error("malformed text")]
    BadText,

    /// Unknown text encoding byte
    #[error("invalid text encoding: {0}")]
    InvalidEncoding(u8),

    /// String cannot be written as a terminated field
    #[error("string cannot be encoded: contains a null character")]
    InvalidEncodedString,

    /// Fixed-length string has the wrong length or characters
    #[error("invalid fixed-length string")]
    InvalidFixedLenString,

    /// `TBPM` frame is not a decimal number
    #[error("invalid BPM value")]
    InvalidBpm,

    // Stream
    /// Input ended before a field was complete
    #[error("unexpected end of input: needed {expected} bytes, got {actual}")]
    UnexpectedEof {
        /// Bytes the field required
        expected: usize,
        /// Bytes that were available
        actual: usize,
    },

    /// Feature is intentionally not supported
    #[error("unimplemented: {0}")]
    Unimplemented(&'static str),

    /// Underlying stream failure other than end of input
    #[error("i/o error: {0}")]
    Io(String),
}

impl From<io::Error> for ProtocolError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::UnexpectedEof { expected: 0, actual: 0 }
        } else {
            Self::Io(err.to_string())
        }
    }
}

/// Tag-level decode failure.
///
/// Carries the number of bytes pulled from the stream before the failure so a
/// caller can resynchronize on the underlying file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{error} (after {consumed} bytes)")]
pub struct DecodeError {
    /// Bytes consumed from the stream
    pub consumed: usize,
    /// The first error encountered
    #[source]
    pub error: ProtocolError,
}

/// Convenient Result type alias for codec operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
