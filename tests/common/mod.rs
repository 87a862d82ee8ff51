//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{self, IoSlice};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use filament::config::StaticFilesConfig;
use filament::http::socket::Socket;
use filament::server::context::ServerContext;

#[derive(Default)]
struct MockState {
    inbound: VecDeque<Vec<u8>>,
    peer_closed: bool,
    outbound: Vec<u8>,
    /// Maximum bytes accepted per write call.
    write_limit: Option<usize>,
    /// Number of upcoming write calls that report would-block.
    blocked_writes: usize,
    write_calls: usize,
}

/// An in-memory non-blocking socket.
///
/// Reads return queued chunks and then would-block; writes append to an
/// outbound buffer. Clones share state so a test can keep a handle after the
/// socket moved into a connection.
#[derive(Clone, Default)]
pub struct MockSocket {
    state: Arc<Mutex<MockState>>,
}

impl MockSocket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues bytes for the next reads.
    pub fn feed(&self, bytes: &[u8]) {
        self.state.lock().unwrap().inbound.push_back(bytes.to_vec());
    }

    /// Makes reads return 0 once the queued bytes are consumed.
    pub fn close_peer(&self) {
        self.state.lock().unwrap().peer_closed = true;
    }

    pub fn set_write_limit(&self, limit: usize) {
        self.state.lock().unwrap().write_limit = Some(limit);
    }

    pub fn block_writes(&self, calls: usize) {
        self.state.lock().unwrap().blocked_writes = calls;
    }

    pub fn written(&self) -> Vec<u8> {
        self.state.lock().unwrap().outbound.clone()
    }

    pub fn take_written(&self) -> Vec<u8> {
        std::mem::take(&mut self.state.lock().unwrap().outbound)
    }

    pub fn write_calls(&self) -> usize {
        self.state.lock().unwrap().write_calls
    }
}

impl Socket for MockSocket {
    fn try_read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap();
        let Some(mut chunk) = state.inbound.pop_front() else {
            if state.peer_closed {
                return Ok(0);
            }
            return Err(io::ErrorKind::WouldBlock.into());
        };

        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            let rest = chunk.split_off(n);
            state.inbound.push_front(rest);
        }
        Ok(n)
    }

    fn try_write_vectored(&self, bufs: &[IoSlice<'_>]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap();
        state.write_calls += 1;
        if state.blocked_writes > 0 {
            state.blocked_writes -= 1;
            return Err(io::ErrorKind::WouldBlock.into());
        }

        let mut budget = state.write_limit.unwrap_or(usize::MAX);
        let mut written = 0;
        for buf in bufs {
            if budget == 0 {
                break;
            }
            let n = buf.len().min(budget);
            state.outbound.extend_from_slice(&buf[..n]);
            budget -= n;
            written += n;
        }
        Ok(written)
    }
}

pub fn peer() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

pub fn context(root: &std::path::Path) -> Arc<ServerContext> {
    Arc::new(ServerContext::new(StaticFilesConfig {
        root: root.to_path_buf(),
        reserved_paths: vec!["/server-status".to_string()],
    }))
}

/// Creates `name` under `dir` with the given contents and mode.
pub fn write_file(dir: &std::path::Path, name: &str, contents: &[u8], mode: u32) {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).unwrap();
}

/// Splits a raw response into its head (through the blank line) and body.
pub fn split_response(bytes: &[u8]) -> (String, Vec<u8>) {
    let end = bytes
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has no blank line")
        + 4;
    (
        String::from_utf8(bytes[..end].to_vec()).unwrap(),
        bytes[end..].to_vec(),
    )
}
