//! Attached picture frame (`APIC`).

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use super::{Fields, Values};
use crate::{text::TextEncoding, walker::Value};

/// What an attached picture shows.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr,
)]
#[repr(u8)]
pub enum PictureType {
    /// Other
    #[default]
    Other = 0x00,
    /// 32x32 pixels file icon (PNG only)
    FileIcon = 0x01,
    /// Other file icon
    OtherFileIcon = 0x02,
    /// Cover (front)
    CoverFront = 0x03,
    /// Cover (back)
    CoverBack = 0x04,
    /// Leaflet page
    Leaflet = 0x05,
    /// Media (e.g. label side of CD)
    Media = 0x06,
    /// Lead artist/lead performer/soloist
    LeadArtist = 0x07,
    /// Artist/performer
    Artist = 0x08,
    /// Conductor
    Conductor = 0x09,
    /// Band/Orchestra
    Band = 0x0A,
    /// Composer
    Composer = 0x0B,
    /// Lyricist/text writer
    Lyricist = 0x0C,
    /// Recording location
    RecordingLocation = 0x0D,
    /// During recording
    DuringRecording = 0x0E,
    /// During performance
    DuringPerformance = 0x0F,
    /// Movie/video screen capture
    ScreenCapture = 0x10,
    /// A bright coloured fish
    BrightFish = 0x11,
    /// Illustration
    Illustration = 0x12,
    /// Band/artist logotype
    BandLogo = 0x13,
    /// Publisher/Studio logotype
    PublisherLogo = 0x14,
}

impl PictureType {
    /// Every picture type in byte order
    pub const ALL: [Self; 21] = [
        Self::Other,
        Self::FileIcon,
        Self::OtherFileIcon,
        Self::CoverFront,
        Self::CoverBack,
        Self::Leaflet,
        Self::Media,
        Self::LeadArtist,
        Self::Artist,
        Self::Conductor,
        Self::Band,
        Self::Composer,
        Self::Lyricist,
        Self::RecordingLocation,
        Self::DuringRecording,
        Self::DuringPerformance,
        Self::ScreenCapture,
        Self::BrightFish,
        Self::Illustration,
        Self::BandLogo,
        Self::PublisherLogo,
    ];

    /// Map a picture type byte; `None` above `0x14`.
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.get(usize::from(byte)).copied()
    }

    /// Picture type byte
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        self as u8
    }

    /// Human readable name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Other => "Other",
            Self::FileIcon => "File icon",
            Self::OtherFileIcon => "Other file icon",
            Self::CoverFront => "Cover (front)",
            Self::CoverBack => "Cover (back)",
            Self::Leaflet => "Leaflet page",
            Self::Media => "Media",
            Self::LeadArtist => "Lead artist",
            Self::Artist => "Artist",
            Self::Conductor => "Conductor",
            Self::Band => "Band",
            Self::Composer => "Composer",
            Self::Lyricist => "Lyricist",
            Self::RecordingLocation => "Recording location",
            Self::DuringRecording => "During recording",
            Self::DuringPerformance => "During performance",
            Self::ScreenCapture => "Screen capture",
            Self::BrightFish => "A bright coloured fish",
            Self::Illustration => "Illustration",
            Self::BandLogo => "Band logotype",
            Self::PublisherLogo => "Publisher logotype",
        }
    }
}

impl fmt::Display for PictureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Attached picture frame
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Picture {
    /// Encoding of `description`
    pub encoding: TextEncoding,
    /// MIME type of `data` (Latin-1), e.g. `image/jpeg`
    pub mime_type: String,
    /// What the picture shows
    pub picture_type: PictureType,
    /// Short description
    pub description: String,
    /// Image bytes
    pub data: Bytes,
}

impl Fields for Picture {
    fn from_values(v: &mut Values) -> Option<Self> {
        Some(Self {
            encoding: v.encoding()?,
            mime_type: v.text()?,
            picture_type: v.picture_type()?,
            description: v.text()?,
            data: v.bytes()?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Encoding(self.encoding),
            Value::Text(self.mime_type.clone()),
            Value::PictureType(self.picture_type),
            Value::Text(self.description.clone()),
            Value::Bytes(self.data.clone()),
        ]
    }
}
