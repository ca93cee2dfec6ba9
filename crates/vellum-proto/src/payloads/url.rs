//! URL link frames (`W…` and `WXXX`).
//!
//! URLs are always Latin-1, whatever the frame's encoding byte says.

use serde::{Deserialize, Serialize};

use super::{Fields, Values};
use crate::{text::TextEncoding, walker::Value};

/// URL link frame
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Url {
    /// The link
    ///
    /// A trailing `'\0'` records a terminator present on the wire.
    pub url: String,
}

impl Fields for Url {
    fn from_values(v: &mut Values) -> Option<Self> {
        Some(Self { url: v.text()? })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![Value::Text(self.url.clone())]
    }
}

/// User-defined URL link frame (`WXXX`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUrl {
    /// Encoding of `description`
    pub encoding: TextEncoding,
    /// What the link points at
    pub description: String,
    /// The link
    ///
    /// A trailing `'\0'` records a terminator present on the wire.
    pub url: String,
}

impl Fields for UserUrl {
    fn from_values(v: &mut Values) -> Option<Self> {
        Some(Self { encoding: v.encoding()?, description: v.text()?, url: v.text()? })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Encoding(self.encoding),
            Value::Text(self.description.clone()),
            Value::Text(self.url.clone()),
        ]
    }
}
