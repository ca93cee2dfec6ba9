//! Unsynchronization.
//!
//! A tag or frame marked unsynchronized has a `0x00` inserted after every
//! `0xFF` so that no byte pair inside the tag can be mistaken for an MPEG
//! frame sync. Decoding drops the inserted byte again.
//!
//! [`UnsyncReader`] and [`UnsyncWriter`] are streaming adapters used for the
//! tag-level flag; [`decode`] and [`encode`] work on buffered frame payloads.

use std::io::{self, Read, Write};

/// Single-byte decoder state shared by the reader adapter and the slice helper.
#[derive(Debug, Default, Clone, Copy)]
struct Resync {
    after_ff: bool,
}

impl Resync {
    /// Feed one wire byte; returns the byte to emit, if any.
    #[inline]
    fn push(&mut self, byte: u8) -> Option<u8> {
        if self.after_ff && byte == 0x00 {
            self.after_ff = false;
            return None;
        }
        self.after_ff = byte == 0xFF;
        Some(byte)
    }
}

/// Remove unsynchronization from a buffered payload.
#[must_use]
pub fn decode(src: &[u8]) -> Vec<u8> {
    let mut state = Resync::default();
    src.iter().filter_map(|&b| state.push(b)).collect()
}

/// Apply unsynchronization to a buffered payload.
#[must_use]
pub fn encode(src: &[u8]) -> Vec<u8> {
    let extra = src.iter().filter(|&&b| b == 0xFF).count();
    let mut out = Vec::with_capacity(src.len() + extra);
    for &b in src {
        out.push(b);
        if b == 0xFF {
            out.push(0x00);
        }
    }
    out
}

/// Streaming decoder over an unsynchronized byte source.
///
/// The only state carried between reads is whether the last byte seen was
/// `0xFF`, so a `0xFF` at the end of one read and its `0x00` at the start of
/// the next are handled like any other pair.
#[derive(Debug)]
pub struct UnsyncReader<R> {
    inner: R,
    state: Resync,
}

impl<R: Read> UnsyncReader<R> {
    /// Wrap a reader.
    pub fn new(inner: R) -> Self {
        Self { inner, state: Resync::default() }
    }

    /// Unwrap the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for UnsyncReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            let n = self.inner.read(buf)?;
            if n == 0 {
                return Ok(0);
            }

            let mut out = 0;
            for i in 0..n {
                if let Some(b) = self.state.push(buf[i]) {
                    buf[out] = b;
                    out += 1;
                }
            }

            // A read that was only a dropped 0x00 must not look like EOF.
            if out > 0 {
                return Ok(out);
            }
        }
    }
}

/// Streaming encoder that inserts `0x00` after every `0xFF` written.
#[derive(Debug)]
pub struct UnsyncWriter<W> {
    inner: W,
    written: usize,
}

impl<W: Write> UnsyncWriter<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Bytes emitted to the inner writer so far, including inserted zeros.
    #[must_use]
    pub fn written(&self) -> usize {
        self.written
    }

    /// Unwrap the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for UnsyncWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let chunk = encode(buf);
        self.inner.write_all(&chunk)?;
        self.written += chunk.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    /// Reader that hands out at most `step` bytes per call.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    fn read_all(data: &[u8], step: usize) -> Vec<u8> {
        let mut out = Vec::new();
        UnsyncReader::new(Trickle { data, step })
            .read_to_end(&mut out)
            .expect("in-memory read cannot fail");
        out
    }

    #[test]
    fn inserts_after_every_ff() {
        assert_eq!(encode(&[0xFF, 0xE0, 0x01]), vec![0xFF, 0x00, 0xE0, 0x01]);
        assert_eq!(encode(&[0xFF, 0x00]), vec![0xFF, 0x00, 0x00]);
        assert_eq!(encode(&[0x01, 0xFF]), vec![0x01, 0xFF, 0x00]);
    }

    #[test]
    fn drops_only_one_zero() {
        assert_eq!(decode(&[0xFF, 0x00, 0x00]), vec![0xFF, 0x00]);
        assert_eq!(decode(&[0xFF, 0x00, 0xFF, 0x00]), vec![0xFF, 0xFF]);
        assert_eq!(decode(&[0x00, 0x00]), vec![0x00, 0x00]);
    }

    #[test]
    fn reader_handles_split_pairs() {
        let wire = [0x01, 0xFF, 0x00, 0x02, 0xFF, 0x00, 0xFF, 0x00];
        for step in 1..=wire.len() {
            assert_eq!(read_all(&wire, step), vec![0x01, 0xFF, 0x02, 0xFF, 0xFF], "step {step}");
        }
    }

    #[test]
    fn reader_dropped_byte_starts_a_read() {
        // With step 2 the second read is [0x00, 0x07] and begins with the dropped byte.
        assert_eq!(read_all(&[0x05, 0xFF, 0x00, 0x07], 2), vec![0x05, 0xFF, 0x07]);
        // With step 1 a read returns only the dropped byte; the reader must keep going.
        assert_eq!(read_all(&[0xFF, 0x00, 0x07], 1), vec![0xFF, 0x07]);
    }

    #[test]
    fn writer_counts_inserted_bytes() {
        let mut w = UnsyncWriter::new(Vec::new());
        w.write_all(&[0xFF]).expect("vec write");
        w.write_all(&[0x10, 0xFF]).expect("vec write");
        assert_eq!(w.written(), 5);
        assert_eq!(w.into_inner(), vec![0xFF, 0x00, 0x10, 0xFF, 0x00]);
    }

    proptest! {
        #[test]
        fn round_trip(data in prop::collection::vec(any::<u8>(), 0..512)) {
            prop_assert_eq!(decode(&encode(&data)), data.clone());
        }

        #[test]
        fn identity_without_ff(data in prop::collection::vec(0u8..0xFF, 0..512)) {
            prop_assert_eq!(encode(&data), data.clone());
            prop_assert_eq!(decode(&data), data);
        }

        #[test]
        fn streaming_matches_slice(
            data in prop::collection::vec(any::<u8>(), 0..256),
            step in 1usize..16,
        ) {
            let wire = encode(&data);
            prop_assert_eq!(read_all(&wire, step), data);
        }
    }
}
