//! Local filesystem scheme
//!
//! Serves `file://` URLs, e.g. boot configs baked into an image or staged
//! on local disk by an earlier provisioning step.

use crate::error::BoxError;
use crate::scheme::FileScheme;
use crate::view::ReadAt;
use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// File scheme reading from the local filesystem
///
/// Errors are the `io::Error`s from opening and reading the file, passed
/// through unchanged.
#[derive(Debug, Clone, Default)]
pub struct LocalScheme {
    /// Directory URL paths are resolved under; None means the filesystem root
    root: Option<PathBuf>,
}

impl LocalScheme {
    /// Scheme name this handler is registered under by default
    pub const SCHEME: &'static str = "file";

    /// Create a scheme serving the whole filesystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scheme serving only files below `root`
    ///
    /// URL paths are taken relative to `root`; `..` can't climb out of it.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// Get the root directory, if any
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Map a URL to the local path it addresses
    pub fn path_for(&self, url: &Url) -> io::Result<PathBuf> {
        let path = url.to_file_path().map_err(|()| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a local file URL: {}", url),
            )
        })?;

        Ok(match &self.root {
            Some(root) => confine(root, &path),
            None => path,
        })
    }
}

/// Join `path`'s normal components onto `root`, never leaving `root`
fn confine(root: &Path, path: &Path) -> PathBuf {
    let mut out = root.to_path_buf();
    let mut depth = 0usize;

    for component in path.components() {
        match component {
            Component::Normal(part) => {
                out.push(part);
                depth += 1;
            }
            Component::ParentDir if depth > 0 => {
                out.pop();
                depth -= 1;
            }
            _ => {}
        }
    }

    out
}

#[async_trait]
impl FileScheme for LocalScheme {
    async fn get_file(&self, url: &Url) -> Result<Arc<dyn ReadAt>, BoxError> {
        let path = self.path_for(url)?;
        debug!(path = %path.display(), "Reading local file");

        let data = tokio::fs::read(&path).await?;
        Ok(Arc::new(Bytes::from(data)))
    }
}
