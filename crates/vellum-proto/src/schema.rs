//! Payload schema registry.
//!
//! Each payload variant is described by a short, ordered list of typed
//! fields. The list *is* the wire format: the walker in [`crate::walker`]
//! reads and writes exactly these fields in this order. The first field of
//! every schema carries the frame identifier (or identifier family) the schema
//! binds to.
//!
//! # Lookup
//!
//! 1. An exactly registered identifier returns its schema.
//! 2. `T…` other than `TXXX` returns the `"T"` (text) schema.
//! 3. `W…` other than `WXXX` returns the `"W"` (URL) schema.
//! 4. Anything else returns the fallback `"?"` schema.

use std::{collections::HashMap, sync::LazyLock};

use serde::{Deserialize, Serialize};

/// Typed field kinds understood by the walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Single byte validated against an inclusive range
    Byte {
        /// Smallest accepted value
        min: u8,
        /// Largest accepted value
        max: u8,
    },
    /// Text encoding byte; sets the encoding for later string fields
    Encoding,
    /// APIC picture type byte (0..=20)
    PictureType,
    /// Three Latin-1 characters
    Language,
    /// Null-terminated string in the current encoding
    String,
    /// Null-terminated string, always Latin-1
    Latin1String,
    /// Rest of the payload as terminator-separated strings
    StringList,
    /// Rest of the payload as raw bytes
    ByteSlice,
}

/// A named field of a payload schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Field name (diagnostics only)
    pub name: &'static str,
    /// Wire type
    pub kind: FieldKind,
    /// Frame identifier the schema binds to; set on the first field only
    pub binds: Option<&'static str>,
}

impl Field {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, binds: None }
    }

    const fn binding(self, id: &'static str) -> Self {
        Self { binds: Some(id), ..self }
    }
}

/// Payload variant a schema decodes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayloadKind {
    /// `T…` text information
    Text,
    /// `TXXX`
    UserText,
    /// `W…` URL link
    Url,
    /// `WXXX`
    UserUrl,
    /// `APIC`
    Picture,
    /// `UFID`
    UniqueFileId,
    /// `USLT`
    Lyrics,
    /// `COMM`
    Comment,
    /// `POPM`
    Popularimeter,
    /// Anything without a schema
    Unknown,
}

/// Ordered field list for one payload variant.
#[derive(Debug, PartialEq, Eq)]
pub struct Schema {
    /// Variant produced by this schema
    pub kind: PayloadKind,
    /// Fields in wire order
    pub fields: &'static [Field],
}

impl Schema {
    /// Identifier (or family prefix) from the first field's annotation.
    #[must_use]
    pub fn binding(&self) -> Option<&'static str> {
        self.fields.first().and_then(|f| f.binds)
    }
}

use FieldKind as K;

/// Identifier family for text frames
pub const TEXT_FAMILY: &str = "T";
/// Identifier family for URL frames
pub const URL_FAMILY: &str = "W";
/// Binding of the fallback schema
pub const FALLBACK: &str = "?";

/// Every known schema.
pub static SCHEMAS: &[Schema] = &[
    Schema {
        kind: PayloadKind::Text,
        fields: &[
            Field::new("encoding", K::Encoding).binding(TEXT_FAMILY),
            Field::new("values", K::StringList),
        ],
    },
    Schema {
        kind: PayloadKind::UserText,
        fields: &[
            Field::new("encoding", K::Encoding).binding("TXXX"),
            Field::new("description", K::String),
            Field::new("value", K::String),
        ],
    },
    Schema {
        kind: PayloadKind::Url,
        fields: &[Field::new("url", K::Latin1String).binding(URL_FAMILY)],
    },
    Schema {
        kind: PayloadKind::UserUrl,
        fields: &[
            Field::new("encoding", K::Encoding).binding("WXXX"),
            Field::new("description", K::String),
            Field::new("url", K::Latin1String),
        ],
    },
    Schema {
        kind: PayloadKind::Picture,
        fields: &[
            Field::new("encoding", K::Encoding).binding("APIC"),
            Field::new("mime_type", K::Latin1String),
            Field::new("picture_type", K::PictureType),
            Field::new("description", K::String),
            Field::new("data", K::ByteSlice),
        ],
    },
    Schema {
        kind: PayloadKind::UniqueFileId,
        fields: &[
            Field::new("owner", K::Latin1String).binding("UFID"),
            Field::new("identifier", K::ByteSlice),
        ],
    },
    Schema {
        kind: PayloadKind::Lyrics,
        fields: &[
            Field::new("encoding", K::Encoding).binding("USLT"),
            Field::new("language", K::Language),
            Field::new("description", K::String),
            Field::new("text", K::String),
        ],
    },
    Schema {
        kind: PayloadKind::Comment,
        fields: &[
            Field::new("encoding", K::Encoding).binding("COMM"),
            Field::new("language", K::Language),
            Field::new("description", K::String),
            Field::new("text", K::String),
        ],
    },
    Schema {
        kind: PayloadKind::Popularimeter,
        fields: &[
            Field::new("email", K::Latin1String).binding("POPM"),
            Field::new("rating", K::Byte { min: 0, max: 255 }),
            Field::new("counter", K::ByteSlice),
        ],
    },
    Schema {
        kind: PayloadKind::Unknown,
        fields: &[Field::new("data", K::ByteSlice).binding(FALLBACK)],
    },
];

struct Registry {
    by_id: HashMap<&'static str, &'static Schema>,
    by_kind: HashMap<PayloadKind, &'static Schema>,
}

static REGISTRY: LazyLock<Registry> = LazyLock::new(|| {
    let mut by_id = HashMap::new();
    let mut by_kind = HashMap::new();
    for schema in SCHEMAS {
        let id = schema
            .binding()
            .unwrap_or_else(|| unreachable!("schema {:?} has no binding annotation", schema.kind));
        by_id.insert(id, schema);
        by_kind.insert(schema.kind, schema);
    }
    Registry { by_id, by_kind }
});

/// Schema for a frame identifier.
#[must_use]
pub fn lookup(id: &str) -> &'static Schema {
    let registry = &*REGISTRY;
    if let Some(schema) = registry.by_id.get(id).copied() {
        return schema;
    }

    let family = match id.as_bytes().first() {
        Some(b'T') if id != "TXXX" && id != "TXX" => TEXT_FAMILY,
        Some(b'W') if id != "WXXX" && id != "WXX" => URL_FAMILY,
        _ => FALLBACK,
    };
    registry.by_id.get(family).copied().unwrap_or_else(|| unreachable!("family {family} registered"))
}

/// Schema that encodes a payload variant.
#[must_use]
pub fn for_kind(kind: PayloadKind) -> &'static Schema {
    REGISTRY
        .by_kind
        .get(&kind)
        .copied()
        .unwrap_or_else(|| unreachable!("every payload kind has a schema, {kind:?} does not"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn bindings_are_unique_and_on_first_field() {
        let mut seen = HashSet::new();
        for schema in SCHEMAS {
            let id = schema.binding().expect("first field carries binding");
            assert!(seen.insert(id), "duplicate binding {id}");
            assert!(schema.fields[1..].iter().all(|f| f.binds.is_none()));
        }
    }

    #[test]
    fn every_kind_registered_once() {
        let kinds: HashSet<_> = SCHEMAS.iter().map(|s| s.kind).collect();
        assert_eq!(kinds.len(), SCHEMAS.len());
    }

    #[test]
    fn exact_and_family_lookup() {
        assert_eq!(lookup("TIT2").kind, PayloadKind::Text);
        assert_eq!(lookup("TXXX").kind, PayloadKind::UserText);
        assert_eq!(lookup("TXX").kind, PayloadKind::Unknown);
        assert_eq!(lookup("WOAR").kind, PayloadKind::Url);
        assert_eq!(lookup("WXXX").kind, PayloadKind::UserUrl);
        assert_eq!(lookup("APIC").kind, PayloadKind::Picture);
        assert_eq!(lookup("UFID").kind, PayloadKind::UniqueFileId);
        assert_eq!(lookup("USLT").kind, PayloadKind::Lyrics);
        assert_eq!(lookup("PRIV").kind, PayloadKind::Unknown);
        assert_eq!(lookup("").kind, PayloadKind::Unknown);
    }

    #[test]
    fn reverse_lookup_matches() {
        for schema in SCHEMAS {
            assert_eq!(for_kind(schema.kind), schema);
        }
    }

    proptest! {
        #[test]
        fn text_family(rest in "[A-Z0-9]{3}") {
            let id = format!("T{rest}");
            let expected = if id == "TXXX" { PayloadKind::UserText } else { PayloadKind::Text };
            prop_assert_eq!(lookup(&id).kind, expected);
        }

        #[test]
        fn url_family(rest in "[A-Z0-9]{3}") {
            let id = format!("W{rest}");
            let expected = if id == "WXXX" { PayloadKind::UserUrl } else { PayloadKind::Url };
            prop_assert_eq!(lookup(&id).kind, expected);
        }

        #[test]
        fn other_letters_fall_back(first in "[A-SU-VX-Z0-9]", rest in "[A-Z0-9]{3}") {
            let id = format!("{first}{rest}");
            let registered = ["APIC", "UFID", "USLT", "COMM", "POPM"];
            prop_assume!(!registered.contains(&id.as_str()));
            prop_assert_eq!(lookup(&id).kind, PayloadKind::Unknown);
        }
    }
}
