//! Tag header, extended header, footer and the frame loop.
//!
//! Layout on the wire:
//!
//! ```text
//! "ID3" | major (1) | revision (1) = 0 | flags (1) | size (4, sync-safe)
//! [extended header] | frames... | padding | ["3DI" + the same 7 header bytes]
//! ```
//!
//! `size` counts everything between header and footer as stored, so after
//! unsynchronization when the tag flag is set. Frame sizes and padding are
//! counted in the decoded (re-synchronized) domain.

use std::io::{self, Read, Write};

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{
    DecodeOptions, ExtendedHeader, Frame, FrameId, Payload, TagFlags, Version,
    errors::{DecodeError, ProtocolError, Result},
    extended::Restrictions,
    syncsafe,
    unsync::{UnsyncReader, UnsyncWriter},
};

/// Size of the tag header and of the footer
pub const HEADER_SIZE: usize = 10;

const MAGIC: [u8; 3] = *b"ID3";
const FOOTER_MAGIC: [u8; 3] = *b"3DI";

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
struct RawTagHeader {
    magic: [u8; 3],
    major: u8,
    revision: u8,
    flags: u8,
    size: [u8; 4],
}

impl RawTagHeader {
    fn parse(buf: &[u8]) -> Result<(&Self, Version)> {
        let (raw, _) = Self::ref_from_prefix(buf).map_err(|_| ProtocolError::InvalidHeader)?;
        if raw.magic != MAGIC || raw.revision != 0 {
            return Err(ProtocolError::InvalidHeader);
        }
        let version = Version::from_major(raw.major).map_err(|_| ProtocolError::InvalidHeader)?;
        Ok((raw, version))
    }
}

/// Identify a tag from its first bytes.
///
/// Returns the version and the total length of the tag on the wire, header
/// and footer included.
///
/// # Errors
///
/// - [`ProtocolError::InvalidHeader`] for fewer than 10 bytes, a bad
///   signature, an unsupported major version or a nonzero revision
/// - [`ProtocolError::BadSync`] for a malformed size
pub fn peek(buf: &[u8]) -> Result<(Version, usize)> {
    let (raw, version) = RawTagHeader::parse(buf)?;
    let size = syncsafe::decode_u28(raw.size)? as usize;
    let footer = version == Version::V24 && raw.flags & TagFlags::FOOTER.bits() != 0;
    Ok((version, HEADER_SIZE + size + if footer { HEADER_SIZE } else { 0 }))
}

/// A decoded ID3v2 tag
///
/// # Invariants
///
/// - `flags` carries [`TagFlags::EXTENDED_HEADER`] as last decoded; encoding
///   sets it from `extended` instead.
/// - A tag with [`TagFlags::FOOTER`] has no padding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Major version
    pub version: Version,
    /// Header flags
    pub flags: TagFlags,
    /// Extended header, if any
    pub extended: Option<ExtendedHeader>,
    /// Frames in wire order
    pub frames: Vec<Frame>,
    /// Zero bytes after the last frame
    pub padding: usize,
    size: usize,
}

impl Tag {
    /// Empty tag
    #[must_use]
    pub fn new(version: Version) -> Self {
        Self {
            version,
            flags: TagFlags::empty(),
            extended: None,
            frames: Vec::new(),
            padding: 0,
            size: 0,
        }
    }

    /// Declared size from the header, as last decoded.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Decode a tag with default [`DecodeOptions`].
    ///
    /// # Errors
    ///
    /// See [`Tag::decode_with`].
    pub fn decode<R: Read>(reader: R) -> std::result::Result<(Self, usize), DecodeError> {
        Self::decode_with(reader, &DecodeOptions::default())
    }

    /// Decode a tag from the front of `reader`.
    ///
    /// Returns the tag and the number of bytes read. On failure the error
    /// carries the number of bytes read before it.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::InvalidHeader`], [`ProtocolError::BadSync`] or
    ///   [`ProtocolError::InvalidHeaderFlags`] for a bad tag header
    /// - [`ProtocolError::Unimplemented`] for v2.2 tags and compressed or
    ///   encrypted frames
    /// - [`ProtocolError::TagTooLarge`] above `options.max_tag_size`
    /// - [`ProtocolError::UnexpectedEof`] if the stream ends inside the tag
    /// - [`ProtocolError::InvalidFooter`] if the footer does not mirror the
    ///   header
    /// - any extended header, frame header or payload error
    pub fn decode_with<R: Read>(
        reader: R,
        options: &DecodeOptions,
    ) -> std::result::Result<(Self, usize), DecodeError> {
        let mut src = Counted { inner: reader, count: 0 };
        match Self::decode_counted(&mut src, options) {
            Ok(tag) => Ok((tag, src.count)),
            Err(error) => {
                debug!(%error, consumed = src.count, "tag decode failed");
                Err(DecodeError { consumed: src.count, error })
            },
        }
    }

    fn decode_counted<R: Read>(src: &mut Counted<R>, options: &DecodeOptions) -> Result<Self> {
        let mut header = [0u8; HEADER_SIZE];
        src.fill(&mut header)?;

        let (raw, version) = RawTagHeader::parse(&header)?;
        let size = syncsafe::decode_u28(raw.size)? as usize;
        if version == Version::V22 {
            return Err(ProtocolError::Unimplemented("ID3v2.2 tags"));
        }
        let flags = TagFlags::from_byte(raw.flags, version)?;
        if size > options.limit() {
            return Err(ProtocolError::TagTooLarge { size, max: options.limit() });
        }
        debug!(%version, size, ?flags, "tag header");

        let mut stored = vec![0u8; size];
        src.fill(&mut stored)?;

        let tag_unsync = flags.contains(TagFlags::UNSYNCHRONIZED);
        let body = if tag_unsync {
            let mut body = Vec::with_capacity(size);
            UnsyncReader::new(stored.as_slice()).read_to_end(&mut body)?;
            body
        } else {
            stored
        };

        let mut pos = 0;
        let extended = if flags.contains(TagFlags::EXTENDED_HEADER) {
            let (extended, n) = ExtendedHeader::decode(&body, version)?;
            pos += n;
            Some(extended)
        } else {
            None
        };

        let mut frames = Vec::new();
        while let Some((frame, n)) = Frame::decode(&body[pos..], version, tag_unsync)? {
            frames.push(frame);
            pos += n;
        }

        let padding = body.len() - pos;
        if body[pos..].iter().any(|&b| b != 0) {
            trace!(padding, "nonzero bytes in padding");
        }

        if flags.contains(TagFlags::FOOTER) {
            let mut footer = [0u8; HEADER_SIZE];
            src.fill(&mut footer)?;
            if footer[..3] != FOOTER_MAGIC || footer[3..] != header[3..] {
                return Err(ProtocolError::InvalidFooter);
            }
        }

        debug!(frames = frames.len(), padding, "tag decoded");
        Ok(Self { version, flags, extended, frames, padding, size })
    }

    /// Encode the tag to `dst`, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::Unimplemented`] for v2.2
    /// - [`ProtocolError::InvalidHeaderFlags`] for flags the version does not
    ///   define
    /// - [`ProtocolError::InvalidTag`] for a footer combined with padding
    /// - [`ProtocolError::BadSync`] if the tag outgrows a 28-bit size
    /// - any extended header or frame encoding error
    /// - [`ProtocolError::Io`] if `dst` fails
    pub fn encode<W: Write>(&self, mut dst: W) -> Result<usize> {
        let stored = self.encode_body()?;
        let size = u32::try_from(stored.len()).map_err(|_| ProtocolError::BadSync)?;

        let raw = RawTagHeader {
            magic: MAGIC,
            major: self.version.major(),
            revision: 0,
            flags: self.header_flags().bits(),
            size: syncsafe::encode_u28(size)?,
        };
        dst.write_all(raw.as_bytes())?;
        dst.write_all(&stored)?;

        let mut written = HEADER_SIZE + stored.len();
        if self.flags.contains(TagFlags::FOOTER) {
            let footer = RawTagHeader { magic: FOOTER_MAGIC, ..raw };
            dst.write_all(footer.as_bytes())?;
            written += HEADER_SIZE;
        }

        debug!(version = %self.version, frames = self.frames.len(), written, "tag encoded");
        Ok(written)
    }

    /// Encode into a new buffer.
    ///
    /// # Errors
    ///
    /// See [`Tag::encode`].
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut out = BytesMut::new().writer();
        self.encode(&mut out)?;
        Ok(out.into_inner().freeze())
    }

    fn header_flags(&self) -> TagFlags {
        let mut flags = self.flags;
        flags.set(TagFlags::EXTENDED_HEADER, self.extended.is_some());
        flags
    }

    /// Everything between header and footer, as stored.
    fn encode_body(&self) -> Result<Vec<u8>> {
        if self.version == Version::V22 {
            return Err(ProtocolError::Unimplemented("ID3v2.2 tags"));
        }
        let flags = TagFlags::from_byte(self.header_flags().bits(), self.version)?;
        if flags.contains(TagFlags::FOOTER) && self.padding > 0 {
            return Err(ProtocolError::InvalidTag("a tag with a footer cannot have padding"));
        }

        let tag_unsync = flags.contains(TagFlags::UNSYNCHRONIZED);
        let mut body = BytesMut::new();
        if let Some(extended) = &self.extended {
            let padding = u32::try_from(self.padding)
                .map_err(|_| ProtocolError::InvalidTag("padding does not fit the extended header"))?;
            extended.encode(self.version, padding, &mut body)?;
        }
        for frame in &self.frames {
            frame.encode(self.version, tag_unsync, &mut body)?;
        }
        body.put_bytes(0, self.padding);

        if !tag_unsync {
            return Ok(body.to_vec());
        }
        let mut writer = UnsyncWriter::new(Vec::with_capacity(body.len() + body.len() / 8));
        writer.write_all(&body)?;
        Ok(writer.into_inner())
    }

    /// First frame with identifier `id`.
    #[must_use]
    pub fn get(&self, id: FrameId) -> Option<&Frame> {
        self.frames.iter().find(|f| f.id() == id)
    }

    /// All frames with identifier `id`, in order.
    pub fn frames_by_id(&self, id: FrameId) -> impl Iterator<Item = &Frame> {
        self.frames.iter().filter(move |f| f.id() == id)
    }

    /// Remove every frame with identifier `id`, returning how many went.
    pub fn remove_by_id(&mut self, id: FrameId) -> usize {
        let before = self.frames.len();
        self.frames.retain(|f| f.id() != id);
        before - self.frames.len()
    }

    /// Append a frame.
    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Beats per minute from the first `TBPM` frame.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidBpm`] if the frame is not a decimal
    /// number.
    pub fn bpm(&self) -> Result<Option<u32>> {
        let Some(frame) = self.get(FrameId::TBPM) else {
            return Ok(None);
        };
        match &frame.payload {
            Payload::Text(text) => text
                .values
                .first()
                .and_then(|v| v.trim().parse().ok())
                .map(Some)
                .ok_or(ProtocolError::InvalidBpm),
            _ => Err(ProtocolError::InvalidBpm),
        }
    }

    /// Extended header carries the update flag
    #[must_use]
    pub fn is_update(&self) -> bool {
        self.extended.is_some_and(|e| e.update)
    }

    /// Extended header carries a CRC
    #[must_use]
    pub fn has_crc(&self) -> bool {
        self.crc().is_some()
    }

    /// CRC recorded in the extended header
    #[must_use]
    pub fn crc(&self) -> Option<u32> {
        self.extended.and_then(|e| e.crc)
    }

    /// Extended header carries restrictions
    #[must_use]
    pub fn has_restrictions(&self) -> bool {
        self.restrictions().is_some()
    }

    /// Restrictions recorded in the extended header
    #[must_use]
    pub fn restrictions(&self) -> Option<Restrictions> {
        self.extended.and_then(|e| e.restrictions)
    }
}

/// Reader that counts the bytes it hands out.
struct Counted<R> {
    inner: R,
    count: usize,
}

impl<R: Read> Counted<R> {
    /// Fill `buf` completely or fail with how much was available.
    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut got = 0;
        while got < buf.len() {
            match self.inner.read(&mut buf[got..]) {
                Ok(0) => return Err(ProtocolError::UnexpectedEof { expected: buf.len(), actual: got }),
                Ok(n) => {
                    got += n;
                    self.count += n;
                },
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {},
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
