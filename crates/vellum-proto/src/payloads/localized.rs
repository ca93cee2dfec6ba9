//! Language-tagged text frames (`USLT`, `COMM`).

use serde::{Deserialize, Serialize};

use super::{Fields, Values};
use crate::{text::TextEncoding, walker::Value};

/// Text tagged with a language and a short descriptor.
///
/// Unsynchronised lyrics and comments share this layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    /// Encoding of `description` and `text`
    pub encoding: TextEncoding,
    /// ISO-639-2 language code, exactly three characters
    pub language: String,
    /// Content descriptor
    pub description: String,
    /// The text itself
    ///
    /// A trailing `'\0'` records a terminator present on the wire.
    pub text: String,
}

impl Default for LocalizedText {
    fn default() -> Self {
        Self {
            encoding: TextEncoding::default(),
            language: "XXX".to_string(),
            description: String::new(),
            text: String::new(),
        }
    }
}

impl Fields for LocalizedText {
    fn from_values(v: &mut Values) -> Option<Self> {
        Some(Self {
            encoding: v.encoding()?,
            language: v.text()?,
            description: v.text()?,
            text: v.text()?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Encoding(self.encoding),
            Value::Text(self.language.clone()),
            Value::Text(self.description.clone()),
            Value::Text(self.text.clone()),
        ]
    }
}
