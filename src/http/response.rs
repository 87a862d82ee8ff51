use crate::http::buffer::{Overflow, WriteBuffer};
use crate::http::parser::RequestStatus;

const HTTP_VERSION: &str = "HTTP/1.1";

/// HTTP status codes the server produces.
///
/// - `Ok` (200): the file follows
/// - `BadRequest` (400): malformed or oversized request
/// - `Forbidden` (403): the file may not be served
/// - `NotFound` (404): no such file
/// - `InternalServerError` (500): the server failed to build a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found
    NotFound,
    /// 500 Internal Server Error
    InternalServerError,
}

impl StatusCode {
    /// Maps a terminal request status to the status code that answers it.
    ///
    /// Non-terminal statuses (`Incomplete`, `Complete`) and `PeerClosed` have
    /// no response.
    pub fn for_request(status: RequestStatus) -> Option<Self> {
        match status {
            RequestStatus::FileReady => Some(StatusCode::Ok),
            RequestStatus::Malformed => Some(StatusCode::BadRequest),
            RequestStatus::Forbidden => Some(StatusCode::Forbidden),
            RequestStatus::NotFound => Some(StatusCode::NotFound),
            RequestStatus::Internal => Some(StatusCode::InternalServerError),
            RequestStatus::Incomplete | RequestStatus::Complete | RequestStatus::PeerClosed => None,
        }
    }

    /// Returns the numeric HTTP status code.
    ///
    /// ```
    /// # use filament::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }

    /// The inline body sent with an error status.
    pub fn error_body(&self) -> Option<&'static str> {
        match self {
            StatusCode::Ok => None,
            StatusCode::BadRequest => {
                Some("Your request has bad syntax or cannot be served by this server.\n")
            }
            StatusCode::Forbidden => Some("You do not have permission to get this file.\n"),
            StatusCode::NotFound => Some("The requested file was not found on this server.\n"),
            StatusCode::InternalServerError => {
                Some("There was an unusual problem serving the requested file.\n")
            }
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, StatusCode::Ok)
    }
}

/// Appends response pieces to a connection's write buffer.
///
/// Every method either appends its piece whole or fails with [`Overflow`];
/// a failed build must be abandoned rather than sent.
///
/// # Example
///
/// ```
/// # use filament::http::buffer::WriteBuffer;
/// # use filament::http::response::{ResponseBuilder, StatusCode};
/// let mut buf = WriteBuffer::new();
/// ResponseBuilder::new(&mut buf)
///     .status_line(StatusCode::Ok)?
///     .headers(5, false)?;
/// assert!(buf.as_bytes().starts_with(b"HTTP/1.1 200 OK\r\n"));
/// # Ok::<(), filament::http::buffer::Overflow>(())
/// ```
pub struct ResponseBuilder<'a> {
    buf: &'a mut WriteBuffer,
}

impl<'a> ResponseBuilder<'a> {
    /// Starts a response in an emptied buffer.
    pub fn new(buf: &'a mut WriteBuffer) -> Self {
        buf.clear();
        Self { buf }
    }

    pub fn status_line(&mut self, status: StatusCode) -> Result<&mut Self, Overflow> {
        self.buf.append_fmt(format_args!(
            "{} {} {}\r\n",
            HTTP_VERSION,
            status.as_u16(),
            status.reason_phrase()
        ))?;
        Ok(self)
    }

    /// `Content-Length`, `Connection` and the blank line ending the head.
    pub fn headers(&mut self, content_length: usize, keep_alive: bool) -> Result<&mut Self, Overflow> {
        self.content_length(content_length)?
            .connection(keep_alive)?
            .blank_line()
    }

    pub fn content_length(&mut self, content_length: usize) -> Result<&mut Self, Overflow> {
        self.buf
            .append_fmt(format_args!("Content-Length: {}\r\n", content_length))?;
        Ok(self)
    }

    pub fn connection(&mut self, keep_alive: bool) -> Result<&mut Self, Overflow> {
        let value = if keep_alive { "keep-alive" } else { "close" };
        self.buf
            .append_fmt(format_args!("Connection: {}\r\n", value))?;
        Ok(self)
    }

    pub fn blank_line(&mut self) -> Result<&mut Self, Overflow> {
        self.buf.append(b"\r\n")?;
        Ok(self)
    }

    pub fn content(&mut self, content: &str) -> Result<&mut Self, Overflow> {
        self.buf.append(content.as_bytes())?;
        Ok(self)
    }
}

/// Writes a complete response head for `status` into `buf`.
///
/// Error statuses advertise the length of their inline body, which is
/// appended only when `send_body` is set. For `Ok` the head advertises
/// `body_len` and the body itself is sent from a separate segment.
pub fn write_head(
    buf: &mut WriteBuffer,
    status: StatusCode,
    body_len: usize,
    keep_alive: bool,
    send_body: bool,
) -> Result<(), Overflow> {
    let mut builder = ResponseBuilder::new(buf);
    builder.status_line(status)?;
    match status.error_body() {
        Some(body) => {
            builder.headers(body.len(), keep_alive)?;
            if send_body {
                builder.content(body)?;
            }
        }
        None => {
            builder.headers(body_len, keep_alive)?;
        }
    }
    Ok(())
}
