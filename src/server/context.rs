//! State shared by every connection of a running server.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::StaticFilesConfig;

/// Process-wide connection bookkeeping plus read-only file-serving settings.
///
/// One instance is created at startup and handed to every connection as an
/// `Arc<ServerContext>`.
#[derive(Debug)]
pub struct ServerContext {
    static_files: StaticFilesConfig,
    user_count: AtomicUsize,
}

impl ServerContext {
    pub fn new(static_files: StaticFilesConfig) -> Self {
        Self {
            static_files,
            user_count: AtomicUsize::new(0),
        }
    }

    pub fn static_files(&self) -> &StaticFilesConfig {
        &self.static_files
    }

    /// Number of currently open connections.
    pub fn user_count(&self) -> usize {
        self.user_count.load(Ordering::Acquire)
    }

    pub(crate) fn connection_opened(&self) -> usize {
        self.user_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn connection_closed(&self) -> usize {
        let previous = self.user_count.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "connection count underflow");
        previous - 1
    }
}
