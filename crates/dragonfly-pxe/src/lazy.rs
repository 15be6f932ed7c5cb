//! Lazily fetched files
//!
//! A [`LazyFile`] defers the transport fetch until somebody actually reads
//! from it, then remembers the outcome. Boot configs routinely name kernels
//! and initrds that are never loaded (menu entries that aren't picked), so
//! they are opened lazily and only the chosen ones cross the network.

use crate::error::{Cause, Result, UrlError};
use crate::scheme::FileScheme;
use crate::schemes::fetch;
use crate::view::ReadAt;
use async_trait::async_trait;
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::debug;
use url::Url;

/// A file fetched on first read, at most once
///
/// The first read of any kind fetches the file through the scheme handler.
/// The result, success or failure, is kept: later reads are served from the
/// fetched view, or fail with the same [`UrlError`] without retrying.
/// Concurrent first reads share a single fetch.
///
/// The handler is never called twice. If the read driving the fetch is
/// dropped before it completes (e.g. by a caller's timeout), the file settles
/// on [`Cause::Cancelled`] and every later read fails with it.
pub struct LazyFile {
    url: Url,
    handler: Arc<dyn FileScheme>,
    fetch_timeout: Option<Duration>,
    /// Set before the handler is awaited
    attempted: AtomicBool,
    file: OnceCell<Result<Arc<dyn ReadAt>>>,
}

impl LazyFile {
    pub(crate) fn new(
        url: Url,
        handler: Arc<dyn FileScheme>,
        fetch_timeout: Option<Duration>,
    ) -> Self {
        Self {
            url,
            handler,
            fetch_timeout,
            attempted: AtomicBool::new(false),
            file: OnceCell::new(),
        }
    }

    /// URL this file will be fetched from
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns true once a fetch has completed, successfully or not
    pub fn is_fetched(&self) -> bool {
        self.file.initialized()
    }

    /// Fetch the file if that hasn't happened yet and return the outcome
    pub async fn fetch(&self) -> Result<Arc<dyn ReadAt>> {
        self.file
            .get_or_init(|| async {
                // Initializers run one at a time, so a set flag here means an
                // earlier one was dropped mid-fetch
                if self.attempted.swap(true, Ordering::AcqRel) {
                    debug!(url = %self.url, "Earlier fetch was cancelled, not retrying");
                    return Err(UrlError::new(self.url.clone(), Cause::Cancelled));
                }
                debug!(scheme = %self.url.scheme(), url = %self.url, "Fetching lazily opened file");
                fetch(self.handler.as_ref(), &self.url, self.fetch_timeout).await
            })
            .await
            .clone()
    }
}

#[async_trait]
impl ReadAt for LazyFile {
    async fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let file = self.fetch().await.map_err(io::Error::from)?;
        file.read_at(buf, offset).await
    }
}

impl fmt::Debug for LazyFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.file.get() {
            None => "pending",
            Some(Ok(_)) => "fetched",
            Some(Err(_)) => "failed",
        };
        f.debug_struct("LazyFile")
            .field("url", &self.url.as_str())
            .field("state", &state)
            .finish()
    }
}

impl From<LazyFile> for Arc<dyn ReadAt> {
    fn from(file: LazyFile) -> Self {
        Arc::new(file)
    }
}

/// Pull the [`UrlError`] back out of an `io::Error` returned by a read on a
/// [`LazyFile`]
pub fn url_error(err: &io::Error) -> Option<&UrlError> {
    err.get_ref()?.downcast_ref::<UrlError>()
}
