use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use crate::http::buffer::{Overflow, ReadBuffer, WriteBuffer};
use crate::http::parser::{RequestParser, RequestStatus};
use crate::http::request::{Method, RequestHead};
use crate::http::resolver::{self, Resource};
use crate::http::response::{self, StatusCode};
use crate::http::socket::Socket;
use crate::http::writer::{DrainStatus, ResponseWriter};
use crate::server::context::ServerContext;

/// Result of [`Connection::read`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// New bytes were buffered.
    Received,
    /// The socket had nothing to offer.
    WouldBlock,
    /// The read buffer has no room left.
    Full,
    /// The peer closed its side of the connection.
    PeerClosed,
}

/// What the event loop should do after [`Connection::process`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Wait for the socket to become readable, then `read` and `process`.
    NeedRead,
    /// A response is armed; wait for writability, then `write`.
    ReadyToWrite,
    /// Give up on the connection and `close_conn`.
    Close,
}

/// What the event loop should do after [`Connection::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Part of the response is still pending; wait for writability.
    WouldBlock,
    /// The response is out and the connection is ready for the next request.
    /// Bytes of a pipelined request may already be buffered, so `process`
    /// before waiting for readability.
    KeepAlive,
    /// The response is out and the connection should be closed.
    Close,
}

/// One accepted client socket and everything needed to serve it.
///
/// The connection never blocks: `read` and `write` stop at the first
/// would-block, and `process` only looks at bytes already buffered. The
/// caller waits for readiness between calls.
pub struct Connection<S> {
    socket: Option<S>,
    peer: SocketAddr,
    ctx: Arc<ServerContext>,
    read_buf: ReadBuffer,
    write_buf: WriteBuffer,
    parser: RequestParser,
    resource: Option<Resource>,
    writer: ResponseWriter,
    status: Option<StatusCode>,
    send_body: bool,
    linger: bool,
}

impl<S: Socket> Connection<S> {
    pub fn new(socket: S, peer: SocketAddr, ctx: Arc<ServerContext>) -> Self {
        let users = ctx.connection_opened();
        debug!(peer = %peer, users, "Connection opened");

        Self {
            socket: Some(socket),
            peer,
            ctx,
            read_buf: ReadBuffer::new(),
            write_buf: WriteBuffer::new(),
            parser: RequestParser::new(),
            resource: None,
            writer: ResponseWriter::new(),
            status: None,
            send_body: false,
            linger: false,
        }
    }

    /// Reads everything the socket has ready into the read buffer.
    pub fn read(&mut self) -> io::Result<ReadStatus> {
        let Some(socket) = self.socket.as_ref() else {
            return Ok(ReadStatus::PeerClosed);
        };
        if self.read_buf.is_full() {
            return Ok(ReadStatus::Full);
        }

        let mut received = 0;
        while !self.read_buf.is_full() {
            match socket.try_read(self.read_buf.spare_mut()) {
                Ok(0) => {
                    if received == 0 {
                        debug!(peer = %self.peer, "Peer closed connection");
                        return Ok(ReadStatus::PeerClosed);
                    }
                    break;
                }
                Ok(n) => {
                    self.read_buf.advance(n);
                    received += n;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        trace!(peer = %self.peer, received, buffered = self.read_buf.write_pos(), "Read");
        if received == 0 {
            return Ok(ReadStatus::WouldBlock);
        }
        Ok(ReadStatus::Received)
    }

    /// Parses the buffered bytes and, once a request is complete, builds the
    /// response for it.
    pub fn process(&mut self) -> ProcessOutcome {
        if self.socket.is_none() {
            return ProcessOutcome::Close;
        }
        if self.writer.is_armed() {
            return ProcessOutcome::ReadyToWrite;
        }

        let mut status = self.parser.parse(&mut self.read_buf);
        if status == RequestStatus::Incomplete {
            if !self.read_buf.is_full() {
                return ProcessOutcome::NeedRead;
            }
            warn!(peer = %self.peer, "Request does not fit the read buffer");
            status = RequestStatus::Malformed;
        }
        if status == RequestStatus::Complete {
            status = self.do_request();
        }

        match self.prepare_response(status) {
            Ok(()) => ProcessOutcome::ReadyToWrite,
            Err(e) => {
                warn!(peer = %self.peer, error = %e, "Abandoning response");
                self.resource = None;
                self.writer.reset();
                ProcessOutcome::Close
            }
        }
    }

    /// Sends as much of the armed response as the socket accepts.
    pub fn write(&mut self) -> io::Result<WriteOutcome> {
        let Some(socket) = self.socket.as_ref() else {
            return Ok(WriteOutcome::Close);
        };
        if !self.writer.is_armed() {
            self.init();
            return Ok(WriteOutcome::KeepAlive);
        }

        let body = match (&self.resource, self.send_body) {
            (Some(resource), true) => resource.bytes(),
            _ => &[][..],
        };

        match self.writer.drain(socket, self.write_buf.as_bytes(), body) {
            Ok(DrainStatus::WouldBlock) => {
                trace!(peer = %self.peer, sent = self.writer.bytes_sent(), "Write would block");
                Ok(WriteOutcome::WouldBlock)
            }
            Ok(DrainStatus::Done) => {
                self.resource = None;
                if self.linger {
                    self.init();
                    Ok(WriteOutcome::KeepAlive)
                } else {
                    Ok(WriteOutcome::Close)
                }
            }
            Err(e) => {
                self.resource = None;
                self.writer.reset();
                Err(e)
            }
        }
    }

    pub fn socket(&self) -> Option<&S> {
        self.socket.as_ref()
    }

    /// Request fields parsed so far, readable through [`Self::read_buffer`].
    pub fn request(&self) -> &RequestHead {
        self.parser.head()
    }

    pub fn read_buffer(&self) -> &ReadBuffer {
        &self.read_buf
    }

    pub fn method(&self) -> Option<Method> {
        self.parser.head().method
    }

    pub fn url(&self) -> Option<&[u8]> {
        self.parser.head().url(&self.read_buf)
    }

    pub fn version(&self) -> Option<&[u8]> {
        self.parser.head().version(&self.read_buf)
    }

    pub fn host(&self) -> Option<&[u8]> {
        self.parser.head().host(&self.read_buf)
    }

    pub fn content_length(&self) -> usize {
        self.parser.head().content_length()
    }

    pub fn keep_alive(&self) -> bool {
        self.parser.head().keep_alive
    }

    /// Status of the armed response, if any.
    pub fn response_status(&self) -> Option<StatusCode> {
        self.status
    }

    /// First output segment: status line, headers and any inline body.
    pub fn response_head(&self) -> &[u8] {
        self.write_buf.as_bytes()
    }

    /// Second output segment: the mapped file, empty when not sent.
    pub fn response_body(&self) -> &[u8] {
        match (&self.resource, self.send_body) {
            (Some(resource), true) => resource.bytes(),
            _ => &[],
        }
    }

    fn do_request(&mut self) -> RequestStatus {
        let Some(url) = self.parser.head().url(&self.read_buf) else {
            return RequestStatus::Internal;
        };
        match resolver::resolve(self.ctx.static_files(), url) {
            Ok(resource) => {
                self.resource = Some(resource);
                RequestStatus::FileReady
            }
            Err(status) => status,
        }
    }

    fn prepare_response(&mut self, status: RequestStatus) -> Result<(), Overflow> {
        let code = StatusCode::for_request(status).unwrap_or(StatusCode::InternalServerError);
        let keep_alive = self.parser.head().keep_alive
            && !matches!(code, StatusCode::BadRequest | StatusCode::InternalServerError);
        let body_len = self.resource.as_ref().map_or(0, Resource::len);
        let send_body = self.parser.head().method != Some(Method::HEAD);

        response::write_head(&mut self.write_buf, code, body_len, keep_alive, send_body)?;

        self.send_body = send_body && code == StatusCode::Ok;
        self.linger = keep_alive;
        self.status = Some(code);
        self.writer.arm();

        info!(
            peer = %self.peer,
            method = ?self.parser.head().method,
            url = %String::from_utf8_lossy(self.url().unwrap_or_default()),
            status = code.as_u16(),
            keep_alive,
            "Request handled"
        );
        Ok(())
    }

    /// Prepares for the next request on the same socket, keeping any bytes
    /// that arrived past the end of the current one.
    fn init(&mut self) {
        self.parser.reset();
        self.read_buf.compact();
        self.write_buf.clear();
        self.resource = None;
        self.writer.reset();
        self.status = None;
        self.send_body = false;
        self.linger = false;
    }
}

impl<S> Connection<S> {
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub fn is_closed(&self) -> bool {
        self.socket.is_none()
    }

    /// Releases the mapped file and, when `real_close` is set, the socket.
    ///
    /// The socket and the connection count are released at most once, so
    /// repeated calls are harmless.
    pub fn close_conn(&mut self, real_close: bool) {
        self.resource = None;
        self.writer.reset();
        if !real_close {
            return;
        }
        if let Some(socket) = self.socket.take() {
            drop(socket);
            let users = self.ctx.connection_closed();
            debug!(peer = %self.peer, users, "Connection closed");
        }
    }
}

impl<S> Drop for Connection<S> {
    fn drop(&mut self) {
        self.close_conn(true);
    }
}
