//! Frame type combining header and payload.
//!
//! Layout on the wire:
//! `[FrameHeader: 10 bytes + optional bytes] + [payload: size - optional bytes]`
//!
//! In v2.4 a frame may carry its own unsynchronization flag. The transform is
//! applied to the payload buffer only when the tag as a whole is not
//! unsynchronized; under a tag-level flag the bytes are already clean.

use bytes::{BufMut, Bytes};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    FrameFlags, FrameHeader, FrameId, Payload, Version,
    errors::{ProtocolError, Result},
    schema::{self, PayloadKind},
    unsync,
};

/// A decoded frame
///
/// # Invariants
///
/// - **Consistent sizes**: `header.size` and `header.data_length` describe the
///   payload as last decoded. [`Frame::encode`] recomputes both, so editing
///   `payload` never produces a stale header on the wire.
/// - **Schema match**: `payload.kind()` is the kind the identifier selects,
///   or [`PayloadKind::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Frame header
    pub header: FrameHeader,
    /// Typed payload
    pub payload: Payload,
}

impl Frame {
    /// Create a frame with no flags.
    ///
    /// Sizes are filled in when the frame is encoded.
    #[must_use]
    pub const fn new(id: FrameId, payload: Payload) -> Self {
        Self { header: FrameHeader::new(id), payload }
    }

    /// Frame identifier
    #[must_use]
    pub const fn id(&self) -> FrameId {
        self.header.id
    }

    /// Decode one frame from the front of `src`.
    ///
    /// `tag_unsync` is whether the tag-level unsynchronization flag is set.
    /// Returns `Ok(None)` at padding, otherwise the frame and the number of
    /// bytes it occupied.
    ///
    /// # Errors
    ///
    /// - any [`FrameHeader::decode`] error
    /// - [`ProtocolError::UnexpectedEof`] if the payload is cut short
    /// - [`ProtocolError::Unimplemented`] for compressed or encrypted frames
    /// - any [`Payload::decode`] error
    pub fn decode(src: &[u8], version: Version, tag_unsync: bool) -> Result<Option<(Self, usize)>> {
        let Some((header, header_len)) = FrameHeader::decode(src, version)? else {
            return Ok(None);
        };

        let body_len = header.size as usize - header.extra_len();
        let rest = &src[header_len..];
        if rest.len() < body_len {
            return Err(ProtocolError::UnexpectedEof { expected: body_len, actual: rest.len() });
        }
        let raw = &rest[..body_len];
        trace!(id = %header.id, size = header.size, flags = ?header.flags, "frame");

        if header.flags.intersects(FrameFlags::COMPRESSED | FrameFlags::ENCRYPTED) {
            return Err(ProtocolError::Unimplemented("compressed or encrypted frame payload"));
        }

        let payload = if needs_unsync(&header, version, tag_unsync) {
            Payload::decode(header.id, &unsync::decode(raw))?
        } else {
            if header.flags.contains(FrameFlags::UNSYNCHRONIZED) {
                debug!(id = %header.id, "frame unsync flag under tag-level unsync, not re-applied");
            }
            Payload::decode(header.id, raw)?
        };

        Ok(Some((Self { header, payload }, header_len + body_len)))
    }

    /// Encode the frame, recomputing its size and data-length indicator.
    ///
    /// The data-length indicator is the payload length before per-frame
    /// unsynchronization.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::InvalidFrame`] if the payload kind does not fit the
    ///   identifier, or the payload is too large to describe
    /// - [`ProtocolError::Unimplemented`] for compressed or encrypted frames
    /// - any [`Payload::encode`] or [`FrameHeader::encode`] error
    pub fn encode(&self, version: Version, tag_unsync: bool, dst: &mut impl BufMut) -> Result<()> {
        let kind = self.payload.kind();
        if kind != PayloadKind::Unknown && kind != schema::lookup(self.header.id.as_str()).kind {
            return Err(ProtocolError::InvalidFrame);
        }
        if self.header.flags.intersects(FrameFlags::COMPRESSED | FrameFlags::ENCRYPTED) {
            return Err(ProtocolError::Unimplemented("compressed or encrypted frame payload"));
        }

        let mut header = self.header;
        let body = self.payload.encode()?;
        if header.flags.contains(FrameFlags::DATA_LENGTH) {
            header.data_length =
                Some(u32::try_from(body.len()).map_err(|_| ProtocolError::InvalidFrame)?);
        }

        let body = if needs_unsync(&header, version, tag_unsync) {
            Bytes::from(unsync::encode(&body))
        } else {
            body
        };
        header.size =
            u32::try_from(header.extra_len() + body.len()).map_err(|_| ProtocolError::InvalidFrame)?;
        if header.size == 0 {
            // A zero size reads back as an invalid header.
            return Err(ProtocolError::InvalidFrame);
        }

        header.encode(version, dst)?;
        dst.put_slice(&body);
        Ok(())
    }
}

fn needs_unsync(header: &FrameHeader, version: Version, tag_unsync: bool) -> bool {
    version == Version::V24 && header.flags.contains(FrameFlags::UNSYNCHRONIZED) && !tag_unsync
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::{
        payloads::{Text, UserText},
        text::TextEncoding,
    };

    fn encoded(frame: &Frame, version: Version, tag_unsync: bool) -> Vec<u8> {
        let mut wire = Vec::new();
        frame.encode(version, tag_unsync, &mut wire).expect("should encode");
        wire
    }

    fn title(value: &str) -> Frame {
        Frame::new(FrameId::TIT2, Payload::Text(Text::new(TextEncoding::Utf8, value)))
    }

    #[test]
    fn hello_world() {
        let mut wire = hex::decode("544954320000000c0000").expect("valid hex");
        wire.push(0x03);
        wire.extend_from_slice(b"Hello World");
        assert_eq!(wire.len(), 10 + 12);

        let (frame, consumed) = Frame::decode(&wire, Version::V24, false)
            .expect("should decode")
            .expect("not padding");
        assert_eq!(consumed, wire.len());
        assert_eq!(frame.payload, title("Hello World").payload);
        assert_eq!(encoded(&frame, Version::V24, false), wire);
    }

    #[test]
    fn size_is_recomputed() {
        let mut frame = title("a");
        frame.payload = Payload::Text(Text::new(TextEncoding::Latin1, "longer"));
        let wire = encoded(&frame, Version::V24, false);
        assert_eq!(&wire[4..8], &[0, 0, 0, 7]);
    }

    #[test]
    fn padding_ends_loop() {
        assert_eq!(Frame::decode(&[0; 16], Version::V24, false), Ok(None));
    }

    #[test]
    fn truncated_payload() {
        let wire = hex::decode("5449543200000010000003414243").expect("valid hex");
        assert_eq!(
            Frame::decode(&wire, Version::V24, false),
            Err(ProtocolError::UnexpectedEof { expected: 16, actual: 4 })
        );
    }

    #[test]
    fn per_frame_unsync() {
        let mut frame = Frame::new(
            FrameId::TXXX,
            Payload::UserText(UserText {
                encoding: TextEncoding::Latin1,
                description: "\u{ff}".to_string(),
                value: String::new(),
            }),
        );
        frame.header.flags = FrameFlags::UNSYNCHRONIZED | FrameFlags::DATA_LENGTH;

        let wire = encoded(&frame, Version::V24, false);
        // flags, data length (pre-unsync), then 00 FF 00 00
        assert_eq!(hex::encode(&wire), "545858580000000800030000000300ff0000");

        let (decoded, _) =
            Frame::decode(&wire, Version::V24, false).expect("should decode").expect("not padding");
        assert_eq!(decoded.payload, frame.payload);
        assert_eq!(decoded.header.data_length, Some(3));
    }

    #[test]
    fn frame_unsync_skipped_under_tag_unsync() {
        let mut frame = title("\u{ff}");
        frame.payload = Payload::Text(Text::new(TextEncoding::Latin1, "\u{ff}"));
        frame.header.flags = FrameFlags::UNSYNCHRONIZED;
        let wire = encoded(&frame, Version::V24, true);
        assert_eq!(&wire[10..], &[0x00, 0xFF]);
    }

    #[test]
    fn reject_compressed_and_encrypted() {
        let mut frame = title("x");
        frame.header.flags = FrameFlags::ENCRYPTED;
        frame.header.encryption_method = Some(0x80);
        let mut wire = Vec::new();
        assert!(matches!(
            frame.encode(Version::V24, false, &mut wire),
            Err(ProtocolError::Unimplemented(_))
        ));

        let wire = hex::decode("54495432000000060004800003414243").expect("valid hex");
        assert!(matches!(
            Frame::decode(&wire, Version::V24, false),
            Err(ProtocolError::Unimplemented(_))
        ));
    }

    #[test]
    fn reject_payload_for_wrong_id() {
        let frame = Frame::new(
            FrameId::APIC,
            Payload::Text(Text::new(TextEncoding::Latin1, "not a picture")),
        );
        let mut wire = Vec::new();
        assert_eq!(frame.encode(Version::V24, false, &mut wire), Err(ProtocolError::InvalidFrame));
    }

    #[test]
    fn v23_frame() {
        let frame = title("v2.3");
        let wire = encoded(&frame, Version::V23, false);
        assert_eq!(hex::encode(&wire[..10]), "54495432000000050000");
        let (decoded, _) =
            Frame::decode(&wire, Version::V23, false).expect("should decode").expect("not padding");
        assert_eq!(decoded, Frame { header: FrameHeader { size: 5, ..frame.header }, payload: frame.payload });
    }

    proptest! {
        #[test]
        fn text_frame_round_trip(value in "[^\\x00]{1,40}", unsync_flag in any::<bool>()) {
            let mut frame = title(&value);
            if unsync_flag {
                frame.header.flags = FrameFlags::UNSYNCHRONIZED;
            }
            let wire = encoded(&frame, Version::V24, false);
            let (decoded, consumed) = Frame::decode(&wire, Version::V24, false)
                .expect("should decode")
                .expect("not padding");
            prop_assert_eq!(consumed, wire.len());
            prop_assert_eq!(&decoded.payload, &frame.payload);
            prop_assert_eq!(encoded(&decoded, Version::V24, false), wire);
        }
    }
}
