//! Typed frame payloads.
//!
//! The frame identifier selects a schema (see [`crate::schema`]); the walker
//! turns the payload bytes into field values, and each variant struct takes
//! its fields from those values in schema order. Encoding runs the same path
//! backwards.
//!
//! # Design
//!
//! `Payload` is a closed union. Every variant maps to exactly one
//! [`PayloadKind`] and therefore one schema, so adding a variant is a compile
//! error in [`Payload::kind`] and [`Payload::decode`] until it is wired up.
//! Frames without a schema decode as [`Payload::Unknown`] and keep their raw
//! bytes, so they re-encode unchanged.

pub mod localized;
pub mod meta;
pub mod picture;
pub mod text;
pub mod url;

use bytes::Bytes;
pub use localized::LocalizedText;
pub use meta::{Popularimeter, UniqueFileId};
pub use picture::{Picture, PictureType};
use serde::{Deserialize, Serialize};
pub use text::{Text, UserText};
use tracing::trace;
pub use url::{Url, UserUrl};

use crate::{
    FrameId,
    errors::{ProtocolError, Result},
    schema::{self, PayloadKind},
    text::TextEncoding,
    walker::{self, Value},
};

/// All frame payloads
///
/// # Invariants
///
/// - **Schema per variant**: `Payload::decode(id, b)?.kind()` equals
///   `schema::lookup(id).kind`.
/// - **Round trip**: for bytes produced by [`Payload::encode`], decoding with
///   a matching identifier gives back an equal payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body")]
pub enum Payload {
    /// `T…` text information
    Text(Text),
    /// `TXXX`
    UserText(UserText),
    /// `W…` URL link
    Url(Url),
    /// `WXXX`
    UserUrl(UserUrl),
    /// `APIC`
    Picture(Picture),
    /// `UFID`
    UniqueFileId(UniqueFileId),
    /// `USLT`
    Lyrics(LocalizedText),
    /// `COMM`
    Comment(LocalizedText),
    /// `POPM`
    Popularimeter(Popularimeter),
    /// Any frame without a schema, raw bytes
    Unknown(Bytes),
}

impl Payload {
    /// Schema kind for this variant
    #[must_use]
    pub const fn kind(&self) -> PayloadKind {
        match self {
            Self::Text(_) => PayloadKind::Text,
            Self::UserText(_) => PayloadKind::UserText,
            Self::Url(_) => PayloadKind::Url,
            Self::UserUrl(_) => PayloadKind::UserUrl,
            Self::Picture(_) => PayloadKind::Picture,
            Self::UniqueFileId(_) => PayloadKind::UniqueFileId,
            Self::Lyrics(_) => PayloadKind::Lyrics,
            Self::Comment(_) => PayloadKind::Comment,
            Self::Popularimeter(_) => PayloadKind::Popularimeter,
            Self::Unknown(_) => PayloadKind::Unknown,
        }
    }

    /// Text encoding used by the payload's strings, if it has one.
    #[must_use]
    pub const fn encoding(&self) -> Option<TextEncoding> {
        match self {
            Self::Text(p) => Some(p.encoding),
            Self::UserText(p) => Some(p.encoding),
            Self::UserUrl(p) => Some(p.encoding),
            Self::Picture(p) => Some(p.encoding),
            Self::Lyrics(p) | Self::Comment(p) => Some(p.encoding),
            Self::Url(_) | Self::UniqueFileId(_) | Self::Popularimeter(_) | Self::Unknown(_) => None,
        }
    }

    /// Decode payload bytes for frame `id`.
    ///
    /// # Errors
    ///
    /// Returns the first error the walker latched (see [`walker::decode`]).
    pub fn decode(id: FrameId, bytes: &[u8]) -> Result<Self> {
        let schema = schema::lookup(id.as_str());
        if schema.kind == PayloadKind::Unknown {
            trace!(%id, len = bytes.len(), "no schema, keeping raw payload");
        }

        let mut values = Values::new(walker::decode(schema, bytes)?);
        let payload = match schema.kind {
            PayloadKind::Text => Text::from_values(&mut values).map(Self::Text),
            PayloadKind::UserText => UserText::from_values(&mut values).map(Self::UserText),
            PayloadKind::Url => Url::from_values(&mut values).map(Self::Url),
            PayloadKind::UserUrl => UserUrl::from_values(&mut values).map(Self::UserUrl),
            PayloadKind::Picture => Picture::from_values(&mut values).map(Self::Picture),
            PayloadKind::UniqueFileId => {
                UniqueFileId::from_values(&mut values).map(Self::UniqueFileId)
            },
            PayloadKind::Lyrics => LocalizedText::from_values(&mut values).map(Self::Lyrics),
            PayloadKind::Comment => LocalizedText::from_values(&mut values).map(Self::Comment),
            PayloadKind::Popularimeter => {
                Popularimeter::from_values(&mut values).map(Self::Popularimeter)
            },
            PayloadKind::Unknown => values.bytes().map(Self::Unknown),
        };

        payload.ok_or(ProtocolError::InvalidFrame)
    }

    /// Encode the payload with its variant's schema.
    ///
    /// # Errors
    ///
    /// Returns the first error the walker latched (see [`walker::encode`]).
    pub fn encode(&self) -> Result<Bytes> {
        let values = match self {
            Self::Text(p) => p.to_values(),
            Self::UserText(p) => p.to_values(),
            Self::Url(p) => p.to_values(),
            Self::UserUrl(p) => p.to_values(),
            Self::Picture(p) => p.to_values(),
            Self::UniqueFileId(p) => p.to_values(),
            Self::Lyrics(p) | Self::Comment(p) => p.to_values(),
            Self::Popularimeter(p) => p.to_values(),
            Self::Unknown(data) => vec![Value::Bytes(data.clone())],
        };
        walker::encode(schema::for_kind(self.kind()), &values)
    }
}

/// Conversion between a payload struct and its schema's field values.
pub(crate) trait Fields: Sized {
    /// Take this struct's fields from the front of `v`.
    fn from_values(v: &mut Values) -> Option<Self>;

    /// Field values in schema order.
    fn to_values(&self) -> Vec<Value>;
}

/// Cursor over walker output; each accessor fails on a kind mismatch.
pub(crate) struct Values(std::vec::IntoIter<Value>);

impl Values {
    fn new(values: Vec<Value>) -> Self {
        Self(values.into_iter())
    }

    pub(crate) fn byte(&mut self) -> Option<u8> {
        match self.0.next()? {
            Value::Byte(b) => Some(b),
            _ => None,
        }
    }

    pub(crate) fn encoding(&mut self) -> Option<TextEncoding> {
        match self.0.next()? {
            Value::Encoding(e) => Some(e),
            _ => None,
        }
    }

    pub(crate) fn picture_type(&mut self) -> Option<PictureType> {
        match self.0.next()? {
            Value::PictureType(kind) => Some(kind),
            _ => None,
        }
    }

    pub(crate) fn text(&mut self) -> Option<String> {
        match self.0.next()? {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn list(&mut self) -> Option<Vec<String>> {
        match self.0.next()? {
            Value::TextList(list) => Some(list),
            _ => None,
        }
    }

    pub(crate) fn bytes(&mut self) -> Option<Bytes> {
        match self.0.next()? {
            Value::Bytes(data) => Some(data),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn id(s: &str) -> FrameId {
        FrameId::new(s).expect("valid frame id")
    }

    fn encoding() -> impl Strategy<Value = TextEncoding> {
        prop_oneof![
            Just(TextEncoding::Latin1),
            Just(TextEncoding::Utf16),
            Just(TextEncoding::Utf16Be),
            Just(TextEncoding::Utf8),
        ]
    }

    /// Strings every encoding represents exactly.
    fn latin1_text() -> impl Strategy<Value = String> {
        "[\\x01-\\xff]{0,24}"
    }

    fn bytes() -> impl Strategy<Value = Bytes> {
        prop::collection::vec(any::<u8>(), 0..64).prop_map(Bytes::from)
    }

    fn localized() -> impl Strategy<Value = LocalizedText> {
        (encoding(), "[a-z]{3}", latin1_text(), latin1_text()).prop_map(
            |(encoding, language, description, text)| LocalizedText {
                encoding,
                language,
                description,
                text,
            },
        )
    }

    /// Payloads paired with an identifier that selects their schema.
    fn payload_with_id() -> impl Strategy<Value = (FrameId, Payload)> {
        prop_oneof![
            (encoding(), prop::collection::vec(latin1_text(), 1..4)).prop_map(|(encoding, values)| {
                // A single empty value encodes to no bytes, which decodes as no values.
                let values = if values == [String::new()] { vec!["x".to_string()] } else { values };
                (id("TIT2"), Payload::Text(Text { encoding, values }))
            }),
            (encoding(), latin1_text(), latin1_text()).prop_map(|(encoding, description, value)| {
                (id("TXXX"), Payload::UserText(UserText { encoding, description, value }))
            }),
            latin1_text().prop_map(|url| (id("WOAR"), Payload::Url(Url { url }))),
            (encoding(), latin1_text(), latin1_text()).prop_map(|(encoding, description, url)| {
                (id("WXXX"), Payload::UserUrl(UserUrl { encoding, description, url }))
            }),
            (encoding(), latin1_text(), 0u8..=20, latin1_text(), bytes()).prop_map(
                |(encoding, mime_type, kind, description, data)| {
                    let picture_type = PictureType::from_byte(kind).unwrap_or_default();
                    let picture = Picture { encoding, mime_type, picture_type, description, data };
                    (id("APIC"), Payload::Picture(picture))
                }
            ),
            (latin1_text(), bytes()).prop_map(|(owner, identifier)| {
                (id("UFID"), Payload::UniqueFileId(UniqueFileId { owner, identifier }))
            }),
            localized().prop_map(|p| (id("USLT"), Payload::Lyrics(p))),
            localized().prop_map(|p| (id("COMM"), Payload::Comment(p))),
            (latin1_text(), any::<u8>(), bytes()).prop_map(|(email, rating, counter)| {
                (id("POPM"), Payload::Popularimeter(Popularimeter { email, rating, counter }))
            }),
            bytes().prop_map(|data| (id("PRIV"), Payload::Unknown(data))),
        ]
    }

    proptest! {
        #[test]
        fn payload_round_trip((id, payload) in payload_with_id()) {
            let wire = payload.encode().expect("should encode");
            let decoded = Payload::decode(id, &wire).expect("should decode");
            prop_assert_eq!(decoded, payload);
        }

        #[test]
        fn kind_matches_schema((id, payload) in payload_with_id()) {
            prop_assert_eq!(payload.kind(), schema::lookup(id.as_str()).kind);
        }
    }

    #[test]
    fn hello_world_text() {
        let mut wire = vec![0x03];
        wire.extend_from_slice(b"Hello World");
        let payload = Payload::decode(FrameId::TIT2, &wire).expect("should decode");
        assert_eq!(
            payload,
            Payload::Text(Text {
                encoding: TextEncoding::Utf8,
                values: vec!["Hello World".to_string()],
            })
        );
        assert_eq!(&payload.encode().expect("should encode")[..], &wire[..]);
    }

    #[test]
    fn utf16_text_list() {
        let wire = [
            0x01, 0xFE, 0xFF, 0x00, 0x41, 0x00, 0x00, 0xFE, 0xFF, 0x00, 0x42,
        ];
        let payload = Payload::decode(FrameId::TIT2, &wire).expect("should decode");
        let Payload::Text(text) = &payload else { panic!("expected text, got {payload:?}") };
        assert_eq!(text.values, vec!["A", "B"]);
        assert_eq!(&payload.encode().expect("should encode")[..], &wire[..]);
    }

    #[test]
    fn utf16_list_with_trailing_terminator() {
        let wire = [0x01, 0xFE, 0xFF, 0x00, 0x41, 0x00, 0x00];
        let payload = Payload::decode(FrameId::TIT2, &wire).expect("should decode");
        let Payload::Text(text) = &payload else { panic!("expected text") };
        assert_eq!(text.values, vec!["A", ""]);
        assert_eq!(&payload.encode().expect("should encode")[..], &wire[..]);
    }

    #[test]
    fn unknown_keeps_raw_bytes() {
        let payload = Payload::decode(id("PRIV"), b"\x00\xFFraw").expect("should decode");
        assert_eq!(payload, Payload::Unknown(Bytes::from_static(b"\x00\xFFraw")));
    }

    #[test]
    fn picture_fields() {
        let mut wire = b"\x00image/png\x00\x03cover\x00".to_vec();
        wire.extend_from_slice(&[0x89, b'P', b'N', b'G']);
        let payload = Payload::decode(FrameId::APIC, &wire).expect("should decode");
        let Payload::Picture(picture) = &payload else { panic!("expected picture") };
        assert_eq!(picture.mime_type, "image/png");
        assert_eq!(picture.picture_type, PictureType::CoverFront);
        assert_eq!(picture.description, "cover");
        assert_eq!(&picture.data[..], &[0x89, b'P', b'N', b'G']);
        assert_eq!(&payload.encode().expect("should encode")[..], &wire[..]);
    }

    #[test]
    fn language_must_be_three_latin1_chars() {
        let lyrics = LocalizedText { language: "en".to_string(), ..LocalizedText::default() };
        assert_eq!(Payload::Lyrics(lyrics).encode(), Err(ProtocolError::InvalidFixedLenString));
    }

    #[test]
    fn serde_is_adjacently_tagged() {
        let payload = Payload::Url(Url { url: "https://example.org".to_string() });
        let json = serde_json::to_string(&payload).expect("should serialize");
        assert_eq!(json, r#"{"kind":"Url","body":{"url":"https://example.org"}}"#);
        let back: Payload = serde_json::from_str(&json).expect("should deserialize");
        assert_eq!(back, payload);
    }
}
