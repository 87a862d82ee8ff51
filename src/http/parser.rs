//! Incremental HTTP/1.1 request parsing.
//!
//! The parser is a resumable state machine: it is handed the same
//! [`ReadBuffer`] again every time more bytes arrive and picks up at the
//! stage and scan position it reached last time. Parsed fields are recorded
//! as spans into the buffer, nothing is copied.

use tracing::trace;

use crate::http::buffer::{ReadBuffer, Span};
use crate::http::line::{LineStatus, scan_line};
use crate::http::request::{Method, ParseStage, RequestHead};

/// Outcome of parsing or serving a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    /// More bytes are needed.
    Incomplete,
    /// A full, well-formed request has been parsed.
    Complete,
    /// The request violates the protocol.
    Malformed,
    /// The target does not exist (or is a directory).
    NotFound,
    /// The target exists but may not be served.
    Forbidden,
    /// The target is mapped and ready to be sent.
    FileReady,
    /// The server could not build a response.
    Internal,
    /// The peer went away.
    PeerClosed,
}

/// Drives the request line, header and body parsers over a read buffer.
#[derive(Debug)]
pub struct RequestParser {
    stage: ParseStage,
    head: RequestHead,
}

impl RequestParser {
    pub fn new() -> Self {
        Self {
            stage: ParseStage::RequestLine,
            head: RequestHead::default(),
        }
    }

    pub fn stage(&self) -> ParseStage {
        self.stage
    }

    pub fn head(&self) -> &RequestHead {
        &self.head
    }

    /// Forgets the current request.
    pub fn reset(&mut self) {
        self.stage = ParseStage::RequestLine;
        self.head = RequestHead::default();
    }

    /// Consumes as much of `buf` as possible.
    ///
    /// Returns [`RequestStatus::Incomplete`] as soon as the buffered bytes run
    /// out, [`RequestStatus::Complete`] once the whole request (body included)
    /// has been consumed, or [`RequestStatus::Malformed`].
    pub fn parse(&mut self, buf: &mut ReadBuffer) -> RequestStatus {
        loop {
            let status = match self.stage {
                ParseStage::Content => return self.parse_content(buf),
                ParseStage::RequestLine | ParseStage::Headers => match scan_line(buf) {
                    LineStatus::Open => return RequestStatus::Incomplete,
                    LineStatus::Bad => return RequestStatus::Malformed,
                    LineStatus::Ok(line) => {
                        if self.stage == ParseStage::RequestLine {
                            self.parse_request_line(buf, line)
                        } else {
                            self.parse_header(buf, line)
                        }
                    }
                },
            };

            if status != RequestStatus::Incomplete {
                return status;
            }
        }
    }

    /// Parses `METHOD SP target SP version`.
    ///
    /// Any run of spaces or tabs separates tokens. An absolute-form target
    /// (`http://host/path`) is reduced to its path.
    pub fn parse_request_line(&mut self, buf: &ReadBuffer, line: Span) -> RequestStatus {
        let Some(bytes) = buf.view(line) else {
            return RequestStatus::Malformed;
        };
        if bytes.first().is_some_and(|b| is_ws(*b)) {
            return RequestStatus::Malformed;
        }

        let mut tokens = Tokens { bytes, pos: 0 };
        let (Some(method), Some(target), Some(version), None) =
            (tokens.next(), tokens.next(), tokens.next(), tokens.next())
        else {
            return RequestStatus::Malformed;
        };

        let Some(method) = Method::from_bytes(&bytes[method.0..method.1]) else {
            return RequestStatus::Malformed;
        };
        if !bytes[version.0..version.1].starts_with(b"HTTP/") {
            return RequestStatus::Malformed;
        }

        let (start, end) = normalize_target(bytes, target);
        if start < end && bytes[start] != b'/' {
            return RequestStatus::Malformed;
        }

        self.head.method = Some(method);
        self.head.url = Some(line.sub(start, end - start));
        self.head.version = Some(line.sub(version.0, version.1 - version.0));
        self.stage = ParseStage::Headers;
        RequestStatus::Incomplete
    }

    /// Parses one header line; the empty line ends the header block.
    pub fn parse_header(&mut self, buf: &ReadBuffer, line: Span) -> RequestStatus {
        let Some(bytes) = buf.view(line) else {
            return RequestStatus::Malformed;
        };

        if bytes.is_empty() {
            if self.head.content_length() > 0 {
                self.stage = ParseStage::Content;
                return RequestStatus::Incomplete;
            }
            return RequestStatus::Complete;
        }

        let Some(colon) = bytes.iter().position(|b| *b == b':') else {
            return RequestStatus::Malformed;
        };
        let name = &bytes[..colon];
        let (start, end) = trim(bytes, colon + 1, bytes.len());
        let value = &bytes[start..end];

        if name.eq_ignore_ascii_case(b"Host") {
            self.head.host = Some(line.sub(start, end - start));
        } else if name.eq_ignore_ascii_case(b"Connection") {
            self.head.keep_alive = value.eq_ignore_ascii_case(b"keep-alive");
        } else if name.eq_ignore_ascii_case(b"Content-Length") {
            let Some(length) = parse_length(value) else {
                return RequestStatus::Malformed;
            };
            match self.head.content_length {
                Some(existing) if existing != length => return RequestStatus::Malformed,
                _ => self.head.content_length = Some(length),
            }
        } else {
            trace!(header = %String::from_utf8_lossy(name), "Ignoring header");
        }

        RequestStatus::Incomplete
    }

    /// Waits until the declared body is buffered, then consumes it.
    pub fn parse_content(&mut self, buf: &mut ReadBuffer) -> RequestStatus {
        let length = self.head.content_length();
        if buf.unconsumed() < length {
            return RequestStatus::Incomplete;
        }
        buf.set_scan_pos(buf.scan_pos() + length);
        buf.mark_line_start();
        RequestStatus::Complete
    }
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

fn is_ws(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// Whitespace-separated tokens as `(start, end)` offsets.
struct Tokens<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Iterator for Tokens<'_> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.bytes.len() && is_ws(self.bytes[self.pos]) {
            self.pos += 1;
        }
        if self.pos == self.bytes.len() {
            return None;
        }
        let start = self.pos;
        while self.pos < self.bytes.len() && !is_ws(self.bytes[self.pos]) {
            self.pos += 1;
        }
        Some((start, self.pos))
    }
}

fn normalize_target(bytes: &[u8], (start, end): (usize, usize)) -> (usize, usize) {
    const SCHEME: &[u8] = b"http://";

    let target = &bytes[start..end];
    if target.len() < SCHEME.len() || !target[..SCHEME.len()].eq_ignore_ascii_case(SCHEME) {
        return (start, end);
    }
    let authority = start + SCHEME.len();
    match bytes[authority..end].iter().position(|b| *b == b'/') {
        Some(slash) => (authority + slash, end),
        None => (end, end),
    }
}

fn trim(bytes: &[u8], mut start: usize, mut end: usize) -> (usize, usize) {
    while start < end && is_ws(bytes[start]) {
        start += 1;
    }
    while end > start && is_ws(bytes[end - 1]) {
        end -= 1;
    }
    (start, end)
}

fn parse_length(value: &[u8]) -> Option<usize> {
    if value.is_empty() || !value.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(value).ok()?.parse().ok()
}
