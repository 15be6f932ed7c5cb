//! Scheme registry and retrieval
//!
//! [`Schemes`] maps URL scheme names to the [`FileScheme`] that serves them
//! and dispatches retrievals to the right one, eagerly ([`Schemes::get_file`])
//! or lazily ([`Schemes::lazy_get_file`]).

use crate::config::FetchConfig;
use crate::error::{Cause, Result, UrlError};
use crate::lazy::LazyFile;
use crate::local::LocalScheme;
use crate::scheme::FileScheme;
use crate::view::{read_to_end, ReadAt};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Registry of URL schemes and the transports that serve them
///
/// Registration and lookup take `&self`, so a single registry can be shared
/// (e.g. behind an `Arc`) by every task walking a boot configuration chain.
/// Registering a scheme that already has a handler replaces it.
///
/// # Example
///
/// ```ignore
/// use dragonfly_pxe::{parse_url, Schemes};
///
/// let schemes = Schemes::with_defaults();
/// schemes.register("tftp", TftpScheme::new());
/// schemes.register("http", HttpScheme::new());
///
/// let url = parse_url("pxelinux.cfg/default", &wd)?;
/// let config = schemes.read_file(&url).await?;
/// ```
pub struct Schemes {
    /// Registered handlers by scheme name
    schemes: RwLock<HashMap<String, Arc<dyn FileScheme>>>,

    /// Settings applied to every fetch
    config: FetchConfig,
}

impl Default for Schemes {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Schemes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schemes")
            .field("schemes", &self.scheme_names())
            .field("config", &self.config)
            .finish()
    }
}

impl Schemes {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::with_config(FetchConfig::default())
    }

    /// Create an empty registry with the given fetch settings
    pub fn with_config(config: FetchConfig) -> Self {
        Self {
            schemes: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Create a registry serving `file` URLs from the local filesystem
    pub fn with_defaults() -> Self {
        let schemes = Self::new();
        schemes.register(LocalScheme::SCHEME, LocalScheme::new());
        schemes
    }

    /// Set the timeout applied to every fetch
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.config.fetch_timeout = Some(timeout);
        self
    }

    /// Get the fetch settings
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    // A panic while holding the lock can't leave an entry half-written, so
    // poisoning is ignored.
    fn read_schemes(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<dyn FileScheme>>> {
        self.schemes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_schemes(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<dyn FileScheme>>> {
        self.schemes.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a handler for `scheme`, replacing any previous one
    pub fn register<S: FileScheme + 'static>(&self, scheme: impl Into<String>, handler: S) {
        self.register_arc(scheme, Arc::new(handler));
    }

    /// Register a handler (Arc version for shared ownership)
    pub fn register_arc(&self, scheme: impl Into<String>, handler: Arc<dyn FileScheme>) {
        let scheme = scheme.into();
        debug!(scheme = %scheme, "Registering file scheme");
        self.write_schemes().insert(scheme, handler);
    }

    /// Remove the handler for `scheme`, returning it if there was one
    pub fn unregister(&self, scheme: &str) -> Option<Arc<dyn FileScheme>> {
        self.write_schemes().remove(scheme)
    }

    /// Get the handler for `scheme`
    pub fn lookup(&self, scheme: &str) -> Option<Arc<dyn FileScheme>> {
        self.read_schemes().get(scheme).cloned()
    }

    /// Check if a scheme is registered
    pub fn has_scheme(&self, scheme: &str) -> bool {
        self.read_schemes().contains_key(scheme)
    }

    /// Get all registered scheme names, sorted
    pub fn scheme_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read_schemes().keys().cloned().collect();
        names.sort();
        names
    }

    /// Get the number of registered schemes
    pub fn scheme_count(&self) -> usize {
        self.read_schemes().len()
    }

    fn handler_for(&self, url: &Url) -> Result<Arc<dyn FileScheme>> {
        self.lookup(url.scheme())
            .ok_or_else(|| UrlError::no_such_scheme(url))
    }

    /// Fetch the file at `url` now
    ///
    /// Fails with [`Cause::NoSuchScheme`] if nothing serves `url`'s scheme,
    /// or with the handler's own error, in both cases wrapped with `url`.
    pub async fn get_file(&self, url: &Url) -> Result<Arc<dyn ReadAt>> {
        let handler = self.handler_for(url)?;
        debug!(scheme = %url.scheme(), url = %url, "Fetching file");
        fetch(handler.as_ref(), url, self.config.fetch_timeout).await
    }

    /// Get a handle that fetches the file at `url` on first read
    ///
    /// The scheme is checked immediately: an unregistered scheme fails here
    /// rather than on first read. Transport errors only ever surface from
    /// reads on the returned [`LazyFile`].
    pub fn lazy_get_file(&self, url: &Url) -> Result<LazyFile> {
        let handler = self.handler_for(url)?;
        Ok(LazyFile::new(url.clone(), handler, self.config.fetch_timeout))
    }

    /// Fetch the file at `url` and read all of it
    pub async fn read_file(&self, url: &Url) -> Result<Vec<u8>> {
        let file = self.get_file(url).await?;
        read_to_end(&*file)
            .await
            .map_err(|err| UrlError::new(url.clone(), Cause::Read(Arc::new(err))))
    }
}

/// Run one handler fetch, applying the timeout and wrapping failures with
/// `url`
pub(crate) async fn fetch(
    handler: &dyn FileScheme,
    url: &Url,
    fetch_timeout: Option<Duration>,
) -> Result<Arc<dyn ReadAt>> {
    let fetched = match fetch_timeout {
        Some(limit) => match tokio::time::timeout(limit, handler.get_file(url)).await {
            Ok(fetched) => fetched,
            Err(_) => return Err(UrlError::new(url.clone(), Cause::Timeout(limit))),
        },
        None => handler.get_file(url).await,
    };

    fetched.map_err(|err| UrlError::new(url.clone(), Cause::transport(err)))
}
