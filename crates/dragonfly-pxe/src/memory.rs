//! In-memory file scheme
//!
//! Serves files from a host → path → content map. Useful for embedding boot
//! configs directly in a binary, and for exercising code that walks config
//! chains without a network.

use crate::error::BoxError;
use crate::resolve::clean_path;
use crate::scheme::FileScheme;
use crate::view::ReadAt;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use url::Url;

/// Error type for [`MemoryScheme`] lookups
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemorySchemeError {
    /// URL's scheme isn't the one this handler was created for
    #[error("wrong scheme: {0}")]
    WrongScheme(String),

    /// No files were added for this host
    #[error("no such host exists: {0}")]
    NoSuchHost(String),

    /// Host is known but has no file at this path
    #[error("no such file exists on this host: {0}")]
    NoSuchFile(String),
}

/// File scheme backed by an in-memory map
#[derive(Debug)]
pub struct MemoryScheme {
    scheme: String,
    hosts: HashMap<String, HashMap<String, Bytes>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl MemoryScheme {
    /// Create an empty scheme answering URLs of `scheme`
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            hosts: HashMap::new(),
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Scheme name this handler answers
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Add a file; the path is cleaned before it is stored
    pub fn add(&mut self, host: impl Into<String>, path: &str, content: impl Into<Bytes>) {
        self.hosts
            .entry(host.into())
            .or_default()
            .insert(clean_path(path), content.into());
    }

    /// Number of times `url` has been fetched, whether or not it succeeded
    pub fn num_called(&self, url: &Url) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url.as_str())
            .copied()
            .unwrap_or(0)
    }

    /// Number of fetches across all URLs
    pub fn total_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .sum()
    }

    fn lookup(&self, url: &Url) -> Result<Bytes, MemorySchemeError> {
        if url.scheme() != self.scheme {
            return Err(MemorySchemeError::WrongScheme(url.scheme().to_string()));
        }

        let host = url.host_str().unwrap_or_default();
        let files = self
            .hosts
            .get(host)
            .ok_or_else(|| MemorySchemeError::NoSuchHost(host.to_string()))?;

        let path = clean_path(url.path());
        files
            .get(&path)
            .cloned()
            .ok_or(MemorySchemeError::NoSuchFile(path))
    }
}

#[async_trait]
impl FileScheme for MemoryScheme {
    async fn get_file(&self, url: &Url) -> Result<Arc<dyn ReadAt>, BoxError> {
        *self
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(url.to_string())
            .or_insert(0) += 1;

        let content = self.lookup(url)?;
        Ok(Arc::new(content))
    }
}
