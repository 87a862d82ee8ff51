//! Server plumbing around the connection engine: shared state and the
//! accept/readiness loop.

pub mod context;
pub mod listener;
