//! Fixed-capacity connection buffers.
//!
//! Both buffers are plain byte arrays with explicit index bookkeeping. They
//! never grow: callers are told when there is no room left and decide what to
//! do about it.

use std::fmt;

/// Capacity of the per-connection read buffer.
pub const READ_BUFFER_SIZE: usize = 2048;

/// Capacity of the per-connection write buffer.
pub const WRITE_BUFFER_SIZE: usize = 1024;

/// A view into the read buffer.
///
/// Spans are only meaningful for the buffer generation they were taken from.
/// Once the buffer is reset or compacted for the next request, resolving an
/// old span yields `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub len: usize,
    generation: u64,
}

impl Span {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Narrows the span to `[offset, offset + len)` relative to its start.
    pub fn sub(&self, offset: usize, len: usize) -> Span {
        debug_assert!(offset + len <= self.len);
        Span {
            start: self.start + offset,
            len,
            generation: self.generation,
        }
    }
}

/// Incoming bytes for one connection.
///
/// `line_start <= scan_pos <= write_pos <= READ_BUFFER_SIZE` holds at all
/// times.
pub struct ReadBuffer {
    data: Box<[u8; READ_BUFFER_SIZE]>,
    /// One past the last byte received.
    write_pos: usize,
    /// One past the last byte consumed by the parser.
    scan_pos: usize,
    /// Start of the line currently being scanned.
    line_start: usize,
    generation: u64,
}

impl ReadBuffer {
    pub fn new() -> Self {
        Self {
            data: Box::new([0u8; READ_BUFFER_SIZE]),
            write_pos: 0,
            scan_pos: 0,
            line_start: 0,
            generation: 0,
        }
    }

    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    pub fn scan_pos(&self) -> usize {
        self.scan_pos
    }

    pub fn line_start(&self) -> usize {
        self.line_start
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_full(&self) -> bool {
        self.write_pos == READ_BUFFER_SIZE
    }

    /// Bytes received but not yet consumed by the parser.
    pub fn unconsumed(&self) -> usize {
        self.write_pos - self.scan_pos
    }

    /// The writable tail of the buffer.
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.write_pos..]
    }

    /// Marks `n` bytes of the spare tail as filled.
    pub fn advance(&mut self, n: usize) {
        assert!(n <= READ_BUFFER_SIZE - self.write_pos, "read buffer overrun");
        self.write_pos += n;
    }

    /// Copies as much of `bytes` as fits and returns how many were taken.
    pub fn push(&mut self, bytes: &[u8]) -> usize {
        let spare = self.spare_mut();
        let n = spare.len().min(bytes.len());
        spare[..n].copy_from_slice(&bytes[..n]);
        self.advance(n);
        n
    }

    pub fn span(&self, start: usize, end: usize) -> Span {
        debug_assert!(start <= end && end <= self.write_pos);
        Span {
            start,
            len: end - start,
            generation: self.generation,
        }
    }

    /// Resolves a span, or `None` if it belongs to an earlier generation.
    pub fn view(&self, span: Span) -> Option<&[u8]> {
        if span.generation != self.generation || span.end() > self.write_pos {
            return None;
        }
        Some(&self.data[span.start..span.end()])
    }

    pub(crate) fn byte(&self, idx: usize) -> u8 {
        self.data[idx]
    }

    pub(crate) fn set_byte(&mut self, idx: usize, value: u8) {
        self.data[idx] = value;
    }

    pub(crate) fn set_scan_pos(&mut self, pos: usize) {
        debug_assert!(pos >= self.line_start && pos <= self.write_pos);
        self.scan_pos = pos;
    }

    /// Starts the next line at the current scan position.
    pub(crate) fn mark_line_start(&mut self) {
        self.line_start = self.scan_pos;
    }

    /// Drops everything the parser consumed and moves the remaining bytes to
    /// the front. Outstanding spans become stale.
    pub fn compact(&mut self) {
        let consumed = self.scan_pos;
        if consumed > 0 {
            self.data.copy_within(consumed..self.write_pos, 0);
        }
        self.write_pos -= consumed;
        self.scan_pos = 0;
        self.line_start = 0;
        self.generation += 1;
    }

    /// Forgets every byte in the buffer.
    pub fn clear(&mut self) {
        self.write_pos = 0;
        self.scan_pos = 0;
        self.line_start = 0;
        self.generation += 1;
    }
}

impl Default for ReadBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Returned when an append does not fit into the write buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overflow;

impl fmt::Display for Overflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "write buffer overflow")
    }
}

impl std::error::Error for Overflow {}

/// Outgoing response head (and inline error bodies).
pub struct WriteBuffer {
    data: Box<[u8; WRITE_BUFFER_SIZE]>,
    len: usize,
}

impl WriteBuffer {
    pub fn new() -> Self {
        Self {
            data: Box::new([0u8; WRITE_BUFFER_SIZE]),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Appends all of `bytes` or nothing.
    pub fn append(&mut self, bytes: &[u8]) -> Result<(), Overflow> {
        let end = self.len.checked_add(bytes.len()).ok_or(Overflow)?;
        if end > WRITE_BUFFER_SIZE {
            return Err(Overflow);
        }
        self.data[self.len..end].copy_from_slice(bytes);
        self.len = end;
        Ok(())
    }

    /// Appends formatted text all-or-nothing.
    pub fn append_fmt(&mut self, args: fmt::Arguments<'_>) -> Result<(), Overflow> {
        let mark = self.len;
        let mut sink = Sink { buf: self };
        if fmt::write(&mut sink, args).is_err() {
            self.len = mark;
            return Err(Overflow);
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl Default for WriteBuffer {
    fn default() -> Self {
        Self::new()
    }
}

struct Sink<'a> {
    buf: &'a mut WriteBuffer,
}

impl fmt::Write for Sink<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.buf.append(s.as_bytes()).map_err(|_| fmt::Error)
    }
}
