//! Filament - Static File Server
//!
//! Core library: the non-blocking HTTP/1.1 connection engine and the server
//! plumbing around it.

pub mod config;
pub mod http;
pub mod server;
