//! Text encodings and null-terminated strings.
//!
//! Every text-carrying payload starts with an encoding byte that selects one of
//! four encodings for the strings that follow. Single-byte encodings terminate
//! strings with one `0x00`; the UTF-16 encodings use an aligned `0x00 0x00`.

use bytes::BufMut;
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::{ProtocolError, Result};

/// Text encoding selected by a payload's encoding byte.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr,
)]
#[repr(u8)]
pub enum TextEncoding {
    /// ISO-8859-1 (Latin-1)
    #[default]
    Latin1 = 0,
    /// UTF-16 with byte-order mark
    Utf16 = 1,
    /// UTF-16 big-endian without byte-order mark
    Utf16Be = 2,
    /// UTF-8
    Utf8 = 3,
}

impl TextEncoding {
    /// Parse an encoding byte.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidEncoding`] for values above 3.
    pub const fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(Self::Latin1),
            1 => Ok(Self::Utf16),
            2 => Ok(Self::Utf16Be),
            3 => Ok(Self::Utf8),
            other => Err(ProtocolError::InvalidEncoding(other)),
        }
    }

    /// Encoding byte value
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        self as u8
    }

    /// Null terminator for this encoding.
    #[must_use]
    pub const fn terminator(self) -> &'static [u8] {
        match self {
            Self::Latin1 | Self::Utf8 => &[0x00],
            Self::Utf16 | Self::Utf16Be => &[0x00, 0x00],
        }
    }
}

/// Decode one string from the front of `bytes`.
///
/// Reads up to and including the first terminator; a string that runs to the
/// end of the buffer without one is accepted. Returns the text and the number
/// of bytes consumed (terminator included).
///
/// # Errors
///
/// Returns [`ProtocolError::BadText`] for malformed UTF-8, odd-length or
/// ill-formed UTF-16.
pub fn decode(bytes: &[u8], encoding: TextEncoding) -> Result<(String, usize)> {
    match encoding {
        TextEncoding::Latin1 => {
            let (body, consumed) = split_narrow(bytes);
            Ok((body.iter().map(|&b| char::from(b)).collect(), consumed))
        },
        TextEncoding::Utf8 => {
            let (body, consumed) = split_narrow(bytes);
            let text = std::str::from_utf8(body).map_err(|_| ProtocolError::BadText)?;
            Ok((text.to_owned(), consumed))
        },
        TextEncoding::Utf16 => decode_wide(bytes, true),
        TextEncoding::Utf16Be => decode_wide(bytes, false),
    }
}

/// Encode `text` without a terminator.
///
/// Latin-1 is lossy: code points above `U+00FF` become `'.'`.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidEncodedString`] if `text` contains a null
/// character, which would end the string early on the wire.
pub fn encode(text: &str, encoding: TextEncoding, dst: &mut impl BufMut) -> Result<()> {
    if text.contains('\0') {
        return Err(ProtocolError::InvalidEncodedString);
    }

    match encoding {
        TextEncoding::Latin1 => {
            for c in text.chars() {
                dst.put_u8(u8::try_from(u32::from(c)).unwrap_or(b'.'));
            }
        },
        TextEncoding::Utf8 => dst.put_slice(text.as_bytes()),
        TextEncoding::Utf16 => {
            dst.put_slice(&[0xFE, 0xFF]);
            text.encode_utf16().for_each(|unit| dst.put_u16(unit));
        },
        TextEncoding::Utf16Be => text.encode_utf16().for_each(|unit| dst.put_u16(unit)),
    }

    Ok(())
}

/// Split at the first `0x00`; consumed count includes the terminator.
fn split_narrow(bytes: &[u8]) -> (&[u8], usize) {
    match bytes.iter().position(|&b| b == 0) {
        Some(end) => (&bytes[..end], end + 1),
        None => (bytes, bytes.len()),
    }
}

/// UTF-16 body; only encoding 1 carries a byte-order mark, so a leading
/// `FE FF` in encoding 2 is a U+FEFF character rather than a marker.
fn decode_wide(bytes: &[u8], with_bom: bool) -> Result<(String, usize)> {
    let (little_endian, mut pos) = match bytes {
        [0xFE, 0xFF, ..] if with_bom => (false, 2),
        [0xFF, 0xFE, ..] if with_bom => (true, 2),
        _ => (false, 0),
    };

    let mut units = Vec::with_capacity((bytes.len() - pos) / 2);
    let consumed = loop {
        match bytes.len() - pos {
            0 => break pos,
            1 => return Err(ProtocolError::BadText),
            _ => {},
        }

        let pair = [bytes[pos], bytes[pos + 1]];
        pos += 2;
        let unit = if little_endian { u16::from_le_bytes(pair) } else { u16::from_be_bytes(pair) };
        if unit == 0 {
            break pos;
        }
        units.push(unit);
    };

    let text = char::decode_utf16(units)
        .collect::<std::result::Result<String, _>>()
        .map_err(|_| ProtocolError::BadText)?;

    Ok((text, consumed))
}
