//! Octet-level stream primitives.
//!
//! Fast Infoset ist oktett-ausgerichtet: mit Ausnahme der Bitfelder
//! innerhalb von Restricted-Alphabet-Strings (siehe `alphabet`) beginnt
//! jede Struktur auf einer Oktettgrenze. Der Reader ist ein Cursor über
//! einem Slice, der Writer ein wachsender Puffer mit Mark-Mechanik für
//! Terminator-Fixups.

use crate::error::{Error, Result};

/// Cursor over an in-memory fast infoset stream.
#[derive(Debug)]
pub struct OctetReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> OctetReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current read position in octets from the start of the stream.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of octets not yet consumed.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Reads one octet.
    #[inline]
    pub fn read(&mut self) -> Result<u8> {
        let b = *self.data.get(self.pos).ok_or(Error::PrematureEndOfStream)?;
        self.pos += 1;
        Ok(b)
    }

    /// Looks at the next octet without consuming it.
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Reads a bounded window of `n` octets as a borrowed sub-slice.
    ///
    /// Structures with a length prefix (strings, algorithm payloads)
    /// are decoded from such windows, which keeps their parsers from
    /// reading past the announced length.
    #[inline]
    pub fn read_slice(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::PrematureEndOfStream);
        }
        let s = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(s)
    }

    /// Reads two octets as a big-endian u16.
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        let s = self.read_slice(2)?;
        Ok(u16::from_be_bytes([s[0], s[1]]))
    }

    /// Reads four octets as a big-endian u32.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        let s = self.read_slice(4)?;
        Ok(u32::from_be_bytes([s[0], s[1], s[2], s[3]]))
    }

    /// Skips `n` octets.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        if self.remaining() < n {
            return Err(Error::PrematureEndOfStream);
        }
        self.pos += n;
        Ok(())
    }

    /// True if the cursor sits on the given octet sequence.
    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.data[self.pos..].starts_with(prefix)
    }
}

/// Growing output buffer for the encoder.
///
/// `set_mark` pins the buffered tail: `drain_to` flushes only octets
/// before the mark, so a marked octet can still be rewritten later
/// (double-terminator fixups rewrite `F0` to `FF` in place).
#[derive(Debug, Default)]
pub struct OctetWriter {
    buf: Vec<u8>,
    mark: Option<usize>,
    flushed: usize,
}

impl OctetWriter {
    pub fn new() -> Self {
        Self::with_capacity(512)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: Vec::with_capacity(capacity), mark: None, flushed: 0 }
    }

    /// Total number of octets written so far (flushed or buffered).
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Appends one octet.
    #[inline]
    pub fn push(&mut self, octet: u8) {
        self.buf.push(octet);
    }

    /// Appends a run of octets.
    #[inline]
    pub fn extend(&mut self, octets: &[u8]) {
        self.buf.extend_from_slice(octets);
    }

    /// The octet at an absolute position.
    ///
    /// Panics if the position was already drained.
    #[inline]
    pub fn octet_at(&self, pos: usize) -> u8 {
        debug_assert!(pos >= self.flushed, "octet already drained");
        self.buf[pos]
    }

    /// Rewrites a previously written octet in place.
    #[inline]
    pub fn rewrite_octet(&mut self, pos: usize, octet: u8) {
        debug_assert!(pos >= self.flushed, "octet already drained");
        self.buf[pos] = octet;
    }

    /// Pins the current tail: octets at or after the returned position
    /// stay buffered across `drain_to` until `clear_mark` is called.
    pub fn set_mark(&mut self) -> usize {
        let pos = self.buf.len();
        self.mark = Some(pos);
        pos
    }

    pub fn clear_mark(&mut self) {
        self.mark = None;
    }

    /// Flushes everything up to the mark (or everything, without a mark)
    /// into the given sink. Already flushed octets are not re-emitted.
    pub fn drain_to<W: std::io::Write>(&mut self, sink: &mut W) -> Result<()> {
        let limit = self.mark.unwrap_or(self.buf.len());
        if limit > self.flushed {
            sink.write_all(&self.buf[self.flushed..limit])?;
            self.flushed = limit;
        }
        Ok(())
    }

    /// Consumes the writer and returns the complete stream.
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}
