//! Text information frames (`T…` and `TXXX`).

use serde::{Deserialize, Serialize};

use super::{Fields, Values};
use crate::{text::TextEncoding, walker::Value};

/// Text information frame
///
/// Holds one or more strings. v2.4 allows several values separated by
/// terminators (for example multiple artists in `TPE1`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    /// Encoding of `values`
    pub encoding: TextEncoding,
    /// String values, in wire order
    pub values: Vec<String>,
}

impl Text {
    /// Single value in the given encoding.
    #[must_use]
    pub fn new(encoding: TextEncoding, value: impl Into<String>) -> Self {
        Self { encoding, values: vec![value.into()] }
    }

    /// Values joined by `sep`, ignoring the empty trailing entry a terminated
    /// list decodes with.
    #[must_use]
    pub fn joined(&self, sep: &str) -> String {
        let values = match self.values.split_last() {
            Some((last, init)) if last.is_empty() => init,
            _ => &self.values[..],
        };
        values.join(sep)
    }
}

impl Fields for Text {
    fn from_values(v: &mut Values) -> Option<Self> {
        Some(Self { encoding: v.encoding()?, values: v.list()? })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![Value::Encoding(self.encoding), Value::TextList(self.values.clone())]
    }
}

/// User-defined text frame (`TXXX`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserText {
    /// Encoding of `description` and `value`
    pub encoding: TextEncoding,
    /// Key describing the value
    pub description: String,
    /// The value
    ///
    /// A trailing `'\0'` records a terminator present on the wire.
    pub value: String,
}

impl Fields for UserText {
    fn from_values(v: &mut Values) -> Option<Self> {
        Some(Self { encoding: v.encoding()?, description: v.text()?, value: v.text()? })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Encoding(self.encoding),
            Value::Text(self.description.clone()),
            Value::Text(self.value.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joined_skips_trailing_empty_value() {
        let text = Text {
            encoding: TextEncoding::Latin1,
            values: vec!["A".to_string(), "B".to_string(), String::new()],
        };
        assert_eq!(text.joined(" - "), "A - B");
        assert_eq!(Text::default().joined(" - "), "");
    }
}
