//! Schema-driven payload walker.
//!
//! One decode driver and one encode driver iterate a [`Schema`]'s fields in
//! order. The only state carried between fields is the current text encoding:
//! it starts as Latin-1 and is replaced whenever an encoding field is read or
//! written. Buffer errors latch, so the drivers check for failure once, at the
//! end.

use bytes::Bytes;

use crate::{
    buffer::{Reader, Writer},
    errors::{ProtocolError, Result},
    payloads::PictureType,
    schema::{FieldKind, Schema},
    text::TextEncoding,
};

/// One decoded field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// `Byte` field
    Byte(u8),
    /// `Encoding` field
    Encoding(TextEncoding),
    /// `PictureType` field
    PictureType(PictureType),
    /// `Language`, `String` or `Latin1String` field
    Text(String),
    /// `StringList` field
    TextList(Vec<String>),
    /// `ByteSlice` field
    Bytes(Bytes),
}

/// Decode `payload` into one value per schema field.
///
/// A terminator ending the last string field is kept as a trailing `'\0'`
/// on that string, so re-encoding reproduces it.
///
/// # Errors
///
/// - [`ProtocolError::InvalidFrame`] for a byte outside its bounds, an
///   encoding byte above 3 or an unknown picture type
/// - [`ProtocolError::BadText`] for malformed strings
/// - [`ProtocolError::UnexpectedEof`] if the payload ends inside a field
pub fn decode(schema: &Schema, payload: &[u8]) -> Result<Vec<Value>> {
    let mut r = Reader::new(payload);
    let mut encoding = TextEncoding::Latin1;
    let mut values = Vec::with_capacity(schema.fields.len());

    let last = schema.fields.len().saturating_sub(1);

    for (i, field) in schema.fields.iter().enumerate() {
        let value = match field.kind {
            FieldKind::Byte { min, max } => {
                let b = r.byte();
                if !(min..=max).contains(&b) {
                    r.fail(ProtocolError::InvalidFrame);
                }
                Value::Byte(b)
            },
            FieldKind::Encoding => {
                match TextEncoding::from_byte(r.byte()) {
                    Ok(e) => encoding = e,
                    Err(_) => r.fail(ProtocolError::InvalidFrame),
                }
                Value::Encoding(encoding)
            },
            FieldKind::PictureType => {
                let b = r.byte();
                let kind = PictureType::from_byte(b).unwrap_or_else(|| {
                    r.fail(ProtocolError::InvalidFrame);
                    PictureType::Other
                });
                Value::PictureType(kind)
            },
            FieldKind::Language => Value::Text(r.fixed_latin1::<3>()),
            FieldKind::String if i == last => Value::Text(r.final_string(encoding)),
            FieldKind::String => Value::Text(r.string(encoding)),
            FieldKind::Latin1String if i == last => {
                Value::Text(r.final_string(TextEncoding::Latin1))
            },
            FieldKind::Latin1String => Value::Text(r.string(TextEncoding::Latin1)),
            FieldKind::StringList => Value::TextList(r.string_list(encoding)),
            FieldKind::ByteSlice => Value::Bytes(Bytes::copy_from_slice(r.rest())),
        };
        values.push(value);
    }

    r.finish()?;
    Ok(values)
}

/// Encode one value per schema field.
///
/// A string field is terminated unless it is the last field of the schema;
/// a last string ending in `'\0'` gets its terminator back.
///
/// # Errors
///
/// - [`ProtocolError::InvalidFrame`] if `values` does not match the schema
///   or a byte is outside its bounds
/// - [`ProtocolError::InvalidEncodedString`] for a string containing a null
/// - [`ProtocolError::InvalidFixedLenString`] for a language that is not
///   exactly three Latin-1 characters
pub fn encode(schema: &Schema, values: &[Value]) -> Result<Bytes> {
    if values.len() != schema.fields.len() {
        return Err(ProtocolError::InvalidFrame);
    }

    let mut w = Writer::new();
    let mut encoding = TextEncoding::Latin1;
    let last = schema.fields.len() - 1;

    for (i, (field, value)) in schema.fields.iter().zip(values).enumerate() {
        let terminate = i != last;
        match (field.kind, value) {
            (FieldKind::Byte { min, max }, Value::Byte(b)) => {
                if !(min..=max).contains(b) {
                    w.fail(ProtocolError::InvalidFrame);
                }
                w.byte(*b);
            },
            (FieldKind::Encoding, Value::Encoding(e)) => {
                encoding = *e;
                w.byte(e.to_byte());
            },
            (FieldKind::PictureType, Value::PictureType(kind)) => w.byte(kind.to_byte()),
            (FieldKind::Language, Value::Text(lang)) => w.fixed_latin1::<3>(lang),
            (FieldKind::String, Value::Text(s)) if terminate => w.string(s, encoding, true),
            (FieldKind::String, Value::Text(s)) => w.final_string(s, encoding),
            (FieldKind::Latin1String, Value::Text(s)) if terminate => {
                w.string(s, TextEncoding::Latin1, true);
            },
            (FieldKind::Latin1String, Value::Text(s)) => w.final_string(s, TextEncoding::Latin1),
            (FieldKind::StringList, Value::TextList(list)) => w.string_list(list, encoding),
            (FieldKind::ByteSlice, Value::Bytes(data)) => w.bytes(data),
            _ => w.fail(ProtocolError::InvalidFrame),
        }
    }

    w.finish()
}
