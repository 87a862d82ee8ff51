use std::io::{self, IoSlice};

use tokio::net::TcpStream;

/// Non-blocking socket operations the connection engine needs.
///
/// Both calls must return [`io::ErrorKind::WouldBlock`] instead of waiting.
/// Readiness is the caller's business.
pub trait Socket {
    fn try_read(&self, buf: &mut [u8]) -> io::Result<usize>;

    fn try_write_vectored(&self, bufs: &[IoSlice<'_>]) -> io::Result<usize>;
}

impl Socket for TcpStream {
    fn try_read(&self, buf: &mut [u8]) -> io::Result<usize> {
        TcpStream::try_read(self, buf)
    }

    fn try_write_vectored(&self, bufs: &[IoSlice<'_>]) -> io::Result<usize> {
        TcpStream::try_write_vectored(self, bufs)
    }
}
