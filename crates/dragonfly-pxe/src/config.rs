//! Retrieval configuration
//!
//! Settings applied by [`Schemes`](crate::Schemes) around every fetch it
//! dispatches, eager or lazy.

use std::time::Duration;

/// Fetch settings shared by all schemes in a registry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchConfig {
    /// Upper bound on a single handler fetch
    ///
    /// If None, fetches may take as long as the handler does.
    pub fetch_timeout: Option<Duration>,
}

impl FetchConfig {
    /// Create a config with no timeout
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fetch timeout
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }
}
