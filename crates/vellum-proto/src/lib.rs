//! # Vellum: ID3v2 Tag Codec
//!
//! This crate reads and writes the ID3v2 metadata block found at the front of
//! MP3 and similar audio files. It understands v2.4 and v2.3; v2.2 tags are
//! recognised by [`peek`] but not decoded.
//!
//! ## Wire Format
//!
//! A tag is a 10-byte header, an optional extended header, a run of frames,
//! zero padding and (v2.4 only) an optional footer. Each frame is a 10-byte
//! header, flag-driven optional bytes and a payload whose layout depends on
//! the frame identifier.
//!
//! ## Implementation Notes
//!
//! - **Zero-Copy Headers**: The fixed tag and frame headers are cast from the
//!   input with [`zerocopy`](https://docs.rs/zerocopy) before any field is
//!   interpreted.
//!
//! - **Declarative Payloads**: Every payload variant is an ordered list of
//!   typed fields in [`schema`]. One walker ([`walker`]) drives those lists in
//!   both directions, so decode and encode cannot drift apart.
//!
//! - **Latching Buffers**: Payload primitives latch the first error and keep
//!   going as no-ops; the walker reports that error once at the end.
//!
//! - **Bounded Allocation**: The only allocation sized by input is the tag
//!   body, capped by [`DecodeOptions::max_tag_size`].
//!
//! ## Example
//!
//! ```
//! use vellum_proto::{Frame, FrameId, Payload, Tag, Version, payloads::Text, text::TextEncoding};
//!
//! let mut tag = Tag::new(Version::V24);
//! tag.push(Frame::new(FrameId::TIT2, Payload::Text(Text::new(TextEncoding::Utf8, "Title"))));
//!
//! let bytes = tag.to_bytes()?;
//! let (decoded, consumed) = Tag::decode(&bytes[..])?;
//! assert_eq!(consumed, bytes.len());
//! assert_eq!(decoded.frames[0].payload, tag.frames[0].payload);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod buffer;
pub mod config;
pub mod errors;
pub mod extended;
pub mod flags;
pub mod frame;
pub mod header;
pub mod payloads;
pub mod schema;
pub mod syncsafe;
pub mod tag;
pub mod text;
pub mod unsync;
pub mod version;
pub mod walker;

pub use config::DecodeOptions;
pub use errors::{DecodeError, ProtocolError, Result};
pub use extended::{ExtendedHeader, Restrictions};
pub use flags::{ExtendedFlags, FrameFlags, TagFlags};
pub use frame::Frame;
pub use header::{FrameHeader, FrameId};
pub use payloads::Payload;
pub use tag::{Tag, peek};
pub use version::Version;
