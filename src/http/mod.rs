//! HTTP protocol implementation.
//!
//! This module implements the per-connection engine of a static-file
//! HTTP/1.1 server with support for keep-alive and pipelined requests.
//!
//! # Architecture
//!
//! - **`buffer`**: Fixed-capacity read and write buffers with explicit indices
//! - **`line`**: CRLF line scanning over the read buffer
//! - **`parser`**: Resumable request line, header and body parsing
//! - **`request`**: Methods, parse stages and the parsed request head
//! - **`resolver`**: Maps targets to memory-mapped files under the document root
//! - **`response`**: Status codes and response head assembly
//! - **`writer`**: Vectored writes of the head and file segments
//! - **`socket`**: The non-blocking socket interface the engine runs on
//! - **`connection`**: Ties everything together for one client socket
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← read() until the socket would block
//!        └──────┬──────┘
//!               │ process(): RequestLine → Headers → Content
//!               ▼
//!        ┌──────────────────┐
//!        │   Resolving      │ ← stat + mmap the target
//!        └──────┬───────────┘
//!               │ response head armed
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← writev(head, file) until drained
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ Keep-Alive → Reading (leftover bytes are parsed first)
//!               └─ Close → Closed
//! ```
//!
//! # Example
//!
//! ```ignore
//! use filament::http::connection::{Connection, ProcessOutcome};
//!
//! let mut conn = Connection::new(stream, peer, ctx);
//! conn.read()?;
//! if conn.process() == ProcessOutcome::ReadyToWrite {
//!     conn.write()?;
//! }
//! ```

pub mod buffer;
pub mod connection;
pub mod line;
pub mod parser;
pub mod request;
pub mod resolver;
pub mod response;
pub mod socket;
pub mod writer;

pub use connection::{Connection, ProcessOutcome, ReadStatus, WriteOutcome};
pub use parser::RequestStatus;
