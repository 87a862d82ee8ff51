use std::io::{self, IoSlice};

use crate::http::socket::Socket;

/// Result of one attempt to drain the output segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStatus {
    /// Every byte of both segments has been written.
    Done,
    /// The socket stopped accepting bytes; call again when it is writable.
    WouldBlock,
}

/// Tracks how much of a two-segment response (head + file body) has been
/// written, so that a drain interrupted by a full socket resumes at the
/// right byte.
#[derive(Debug, Default)]
pub struct ResponseWriter {
    sent: usize,
    armed: bool,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepares to send a freshly built response.
    pub fn arm(&mut self) {
        self.sent = 0;
        self.armed = true;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn bytes_sent(&self) -> usize {
        self.sent
    }

    pub fn reset(&mut self) {
        self.sent = 0;
        self.armed = false;
    }

    /// Writes `head` followed by `body` with vectored writes until both are
    /// sent or the socket would block.
    pub fn drain<S: Socket>(
        &mut self,
        socket: &S,
        head: &[u8],
        body: &[u8],
    ) -> io::Result<DrainStatus> {
        let total = head.len() + body.len();

        while self.sent < total {
            let result = if self.sent < head.len() {
                let slices = [IoSlice::new(&head[self.sent..]), IoSlice::new(body)];
                let count = if body.is_empty() { 1 } else { 2 };
                socket.try_write_vectored(&slices[..count])
            } else {
                let slices = [IoSlice::new(&body[self.sent - head.len()..])];
                socket.try_write_vectored(&slices)
            };

            match result {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "connection closed while writing",
                    ));
                }
                Ok(n) => self.sent += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    return Ok(DrainStatus::WouldBlock);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        self.armed = false;
        Ok(DrainStatus::Done)
    }
}
