use crate::http::buffer::{ReadBuffer, Span};

/// HTTP request methods.
///
/// Every method is recognized by the parser; the server answers all of them
/// from the filesystem the same way, except that `HEAD` gets no body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    GET,
    POST,
    HEAD,
    PUT,
    DELETE,
    TRACE,
    OPTIONS,
    CONNECT,
    PATCH,
}

impl Method {
    /// Parses an HTTP method token.
    ///
    /// Matching is case-sensitive.
    ///
    /// ```
    /// # use filament::http::request::Method;
    /// assert_eq!(Method::from_bytes(b"GET"), Some(Method::GET));
    /// assert_eq!(Method::from_bytes(b"get"), None);
    /// ```
    pub fn from_bytes(s: &[u8]) -> Option<Self> {
        match s {
            b"GET" => Some(Method::GET),
            b"POST" => Some(Method::POST),
            b"HEAD" => Some(Method::HEAD),
            b"PUT" => Some(Method::PUT),
            b"DELETE" => Some(Method::DELETE),
            b"TRACE" => Some(Method::TRACE),
            b"OPTIONS" => Some(Method::OPTIONS),
            b"CONNECT" => Some(Method::CONNECT),
            b"PATCH" => Some(Method::PATCH),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::HEAD => "HEAD",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::TRACE => "TRACE",
            Method::OPTIONS => "OPTIONS",
            Method::CONNECT => "CONNECT",
            Method::PATCH => "PATCH",
        }
    }
}

/// Which part of the request the parser expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ParseStage {
    RequestLine,
    Headers,
    Content,
}

/// Everything extracted from one request.
///
/// Text fields are spans into the connection's read buffer, so they are only
/// readable through that buffer and only until it is reset for the next
/// request.
#[derive(Debug, Clone, Default)]
pub struct RequestHead {
    pub method: Option<Method>,
    /// Normalized target. An empty span stands for `/`.
    pub url: Option<Span>,
    pub version: Option<Span>,
    pub host: Option<Span>,
    pub content_length: Option<usize>,
    pub keep_alive: bool,
}

impl RequestHead {
    /// The request target, with an empty path reported as `/`.
    pub fn url<'a>(&self, buf: &'a ReadBuffer) -> Option<&'a [u8]> {
        let bytes = buf.view(self.url?)?;
        if bytes.is_empty() {
            return Some(&b"/"[..]);
        }
        Some(bytes)
    }

    pub fn version<'a>(&self, buf: &'a ReadBuffer) -> Option<&'a [u8]> {
        buf.view(self.version?)
    }

    pub fn host<'a>(&self, buf: &'a ReadBuffer) -> Option<&'a [u8]> {
        buf.view(self.host?)
    }

    /// Declared body length, zero when absent.
    pub fn content_length(&self) -> usize {
        self.content_length.unwrap_or(0)
    }
}
