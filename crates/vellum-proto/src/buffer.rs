//! Error-latching byte buffers.
//!
//! [`Reader`] pulls fields out of a buffered payload and [`Writer`] pushes
//! them into a growing one. Both latch the first error: once set, every later
//! primitive is a no-op (readers hand back zero values), and the error is
//! surfaced once by `finish`. This lets a payload schema be walked field by
//! field without checking a `Result` after each step.

use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    errors::{ProtocolError, Result},
    text::{self, TextEncoding},
};

/// Pull buffer over a payload.
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    error: Option<ProtocolError>,
}

impl<'a> Reader<'a> {
    /// Start reading at the front of `buf`.
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0, error: None }
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Latched error, if any.
    #[must_use]
    pub fn error(&self) -> Option<&ProtocolError> {
        self.error.as_ref()
    }

    /// Latch `err` unless an earlier error is already held.
    pub fn fail(&mut self, err: ProtocolError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    /// Consume one byte (0 after an error).
    pub fn byte(&mut self) -> u8 {
        self.take(1).first().copied().unwrap_or(0)
    }

    /// Consume exactly `n` bytes (empty after an error).
    pub fn take(&mut self, n: usize) -> &'a [u8] {
        if self.error.is_some() {
            return &[];
        }
        if self.remaining() < n {
            self.fail(ProtocolError::UnexpectedEof { expected: n, actual: self.remaining() });
            return &[];
        }
        let buf = self.buf;
        let out = &buf[self.pos..self.pos + n];
        self.pos += n;
        out
    }

    /// Consume a fixed-length Latin-1 string of exactly `N` characters.
    pub fn fixed_latin1<const N: usize>(&mut self) -> String {
        let bytes = self.take(N);
        bytes.iter().map(|&b| char::from(b)).collect()
    }

    /// Consume one null-terminated string in `encoding`.
    pub fn string(&mut self, encoding: TextEncoding) -> String {
        self.terminated(encoding).map(|(text, _)| text).unwrap_or_default()
    }

    /// Consume the last string of a payload.
    ///
    /// A terminator that ends the payload is kept as a trailing `'\0'` so the
    /// string re-encodes to the same bytes.
    pub fn final_string(&mut self, encoding: TextEncoding) -> String {
        match self.terminated(encoding) {
            Some((mut text, true)) if self.remaining() == 0 => {
                text.push('\0');
                text
            },
            Some((text, _)) => text,
            None => String::new(),
        }
    }

    /// Consume the rest of the buffer as terminator-separated strings.
    ///
    /// An empty remainder yields no strings. A trailing terminator yields a
    /// trailing empty string so the list re-encodes to the same bytes.
    pub fn string_list(&mut self, encoding: TextEncoding) -> Vec<String> {
        let mut out = Vec::new();
        while self.error.is_none() && self.remaining() > 0 {
            let Some((text, terminated)) = self.terminated(encoding) else {
                break;
            };
            out.push(text);
            if terminated && self.remaining() == 0 {
                out.push(String::new());
            }
        }
        if self.error.is_some() { Vec::new() } else { out }
    }

    /// Consume everything that is left.
    pub fn rest(&mut self) -> &'a [u8] {
        let n = self.remaining();
        self.take(n)
    }

    /// Surface the latched error.
    ///
    /// # Errors
    ///
    /// Returns the first error any primitive latched.
    pub fn finish(self) -> Result<()> {
        self.error.map_or(Ok(()), Err)
    }

    fn terminated(&mut self, encoding: TextEncoding) -> Option<(String, bool)> {
        if self.error.is_some() {
            return None;
        }
        let buf = self.buf;
        let src = &buf[self.pos..];
        match text::decode(src, encoding) {
            Ok((text, consumed)) => {
                let term = encoding.terminator();
                let terminated =
                    consumed >= term.len() && &src[consumed - term.len()..consumed] == term;
                self.pos += consumed;
                Some((text, terminated))
            },
            Err(err) => {
                self.fail(err);
                None
            },
        }
    }
}

/// Push buffer for a payload.
#[derive(Debug, Default)]
pub struct Writer {
    buf: BytesMut,
    error: Option<ProtocolError>,
}

impl Writer {
    /// Empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch `err` unless an earlier error is already held.
    pub fn fail(&mut self, err: ProtocolError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    /// Append one byte.
    pub fn byte(&mut self, b: u8) {
        if self.error.is_none() {
            self.buf.put_u8(b);
        }
    }

    /// Append raw bytes.
    pub fn bytes(&mut self, src: &[u8]) {
        if self.error.is_none() {
            self.buf.put_slice(src);
        }
    }

    /// Append a fixed-length Latin-1 string of exactly `N` characters.
    pub fn fixed_latin1<const N: usize>(&mut self, value: &str) {
        let encoded: Option<Vec<u8>> =
            value.chars().map(|c| u8::try_from(u32::from(c)).ok()).collect();
        match encoded {
            Some(bytes) if bytes.len() == N => self.bytes(&bytes),
            _ => self.fail(ProtocolError::InvalidFixedLenString),
        }
    }

    /// Append a string, followed by a terminator when `terminate` is set.
    pub fn string(&mut self, value: &str, encoding: TextEncoding, terminate: bool) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = text::encode(value, encoding, &mut self.buf) {
            self.fail(err);
            return;
        }
        if terminate {
            self.buf.put_slice(encoding.terminator());
        }
    }

    /// Append the last string of a payload.
    ///
    /// A trailing `'\0'` is written as a terminator; otherwise the string
    /// runs to the end of the payload.
    pub fn final_string(&mut self, value: &str, encoding: TextEncoding) {
        match value.strip_suffix('\0') {
            Some(body) => self.string(body, encoding, true),
            None => self.string(value, encoding, false),
        }
    }

    /// Append strings separated by single terminators.
    ///
    /// A trailing empty entry after at least one string stands for a
    /// terminator after the last one and writes nothing of its own.
    pub fn string_list(&mut self, values: &[String], encoding: TextEncoding) {
        let (values, terminated) = match values.split_last() {
            Some((last, init)) if last.is_empty() && !init.is_empty() => (init, true),
            _ => (values, false),
        };
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                self.bytes(encoding.terminator());
            }
            self.string(value, encoding, false);
        }
        if terminated {
            self.bytes(encoding.terminator());
        }
    }

    /// Surface the latched error or hand back the bytes.
    ///
    /// # Errors
    ///
    /// Returns the first error any primitive latched.
    pub fn finish(self) -> Result<Bytes> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.buf.freeze()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_latches() {
        let mut r = Reader::new(&[0x01]);
        assert_eq!(r.byte(), 0x01);
        assert_eq!(r.byte(), 0x00);
        assert!(r.error().is_some());

        // Later failures do not replace the first one.
        r.fail(ProtocolError::BadText);
        assert_eq!(r.finish(), Err(ProtocolError::UnexpectedEof { expected: 1, actual: 0 }));
    }

    #[test]
    fn take_after_error_is_empty() {
        let mut r = Reader::new(&[1, 2, 3, 4]);
        r.fail(ProtocolError::InvalidFrame);
        assert!(r.take(2).is_empty());
        assert_eq!(r.remaining(), 4);
    }

    #[test]
    fn string_list_splits_on_terminators() {
        let mut r = Reader::new(b"one\0two");
        assert_eq!(r.string_list(TextEncoding::Latin1), vec!["one", "two"]);
        assert_eq!(r.finish(), Ok(()));
    }

    #[test]
    fn string_list_keeps_trailing_terminator() {
        let mut r = Reader::new(b"one\0");
        assert_eq!(r.string_list(TextEncoding::Latin1), vec!["one", ""]);

        let mut w = Writer::new();
        w.string_list(&["one".to_string(), String::new()], TextEncoding::Latin1);
        assert_eq!(&w.finish().expect("should encode")[..], b"one\0");
    }

    #[test]
    fn utf16_trailing_terminator_has_no_bom() {
        let wire = [0xFE, 0xFF, 0x00, 0x41, 0x00, 0x00];
        let mut r = Reader::new(&wire);
        let values = r.string_list(TextEncoding::Utf16);
        assert_eq!(values, vec!["A", ""]);

        let mut w = Writer::new();
        w.string_list(&values, TextEncoding::Utf16);
        assert_eq!(&w.finish().expect("should encode")[..], &wire[..]);
    }

    #[test]
    fn lone_empty_entry_keeps_its_bom() {
        let mut w = Writer::new();
        w.string_list(&[String::new()], TextEncoding::Utf16);
        assert_eq!(&w.finish().expect("should encode")[..], &[0xFE, 0xFF]);
    }

    #[test]
    fn final_string_keeps_terminator() {
        for (encoding, wire) in [
            (TextEncoding::Latin1, &b"v\0"[..]),
            (TextEncoding::Utf8, &b"v\0"[..]),
            (TextEncoding::Utf16, &[0xFE, 0xFF, 0x00, 0x76, 0x00, 0x00][..]),
        ] {
            let mut r = Reader::new(wire);
            let value = r.final_string(encoding);
            assert_eq!(value, "v\0", "{encoding:?}");

            let mut w = Writer::new();
            w.final_string(&value, encoding);
            assert_eq!(&w.finish().expect("should encode")[..], wire, "{encoding:?}");
        }
    }

    #[test]
    fn final_string_without_terminator() {
        let mut r = Reader::new(b"v");
        assert_eq!(r.final_string(TextEncoding::Latin1), "v");

        let mut r = Reader::new(&[]);
        assert_eq!(r.final_string(TextEncoding::Utf16), "");

        let mut w = Writer::new();
        w.final_string("v", TextEncoding::Latin1);
        assert_eq!(&w.finish().expect("should encode")[..], b"v");
    }

    #[test]
    fn string_list_empty() {
        let mut r = Reader::new(&[]);
        assert!(r.string_list(TextEncoding::Utf8).is_empty());
    }

    #[test]
    fn string_list_utf16_pairs() {
        let wire = [0xFE, 0xFF, 0x00, 0x41, 0x00, 0x00, 0xFE, 0xFF, 0x00, 0x42];
        let mut r = Reader::new(&wire);
        assert_eq!(r.string_list(TextEncoding::Utf16), vec!["A", "B"]);

        let mut w = Writer::new();
        w.string_list(&["A".to_string(), "B".to_string()], TextEncoding::Utf16);
        assert_eq!(&w.finish().expect("should encode")[..], &wire[..]);
    }

    #[test]
    fn fixed_latin1_requires_exact_length() {
        let mut w = Writer::new();
        w.fixed_latin1::<3>("en");
        assert_eq!(w.finish(), Err(ProtocolError::InvalidFixedLenString));

        let mut w = Writer::new();
        w.fixed_latin1::<3>("eng");
        assert_eq!(&w.finish().expect("should encode")[..], b"eng");
    }

    #[test]
    fn writer_skips_after_error() {
        let mut w = Writer::new();
        w.string("a\0", TextEncoding::Latin1, true);
        w.byte(7);
        assert_eq!(w.finish(), Err(ProtocolError::InvalidEncodedString));
    }
}
