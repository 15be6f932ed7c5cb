//! FileScheme trait definition
//!
//! A FileScheme is the transport behind one URL scheme (`tftp`, `http`,
//! `file`, ...). It knows how to turn a URL into the bytes it addresses and
//! nothing else: no retries, no caching, no validation of the content.

use crate::error::BoxError;
use crate::view::ReadAt;
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

/// Transport capable of fetching files for one URL scheme
///
/// Errors are returned as-is to callers of
/// [`Schemes::get_file`](crate::Schemes::get_file), wrapped in a
/// [`UrlError`](crate::UrlError) that records the URL. Use a concrete error
/// type so callers can tell "host unreachable" from "no such file" by
/// downcasting.
///
/// # Example
///
/// ```ignore
/// use dragonfly_pxe::{BoxError, FileScheme, ReadAt};
/// use async_trait::async_trait;
/// use std::sync::Arc;
/// use url::Url;
///
/// struct TftpScheme { client: TftpClient }
///
/// #[async_trait]
/// impl FileScheme for TftpScheme {
///     async fn get_file(&self, url: &Url) -> Result<Arc<dyn ReadAt>, BoxError> {
///         let data = self.client.read(url.host_str().unwrap_or_default(), url.path()).await?;
///         Ok(Arc::new(data))
///     }
/// }
/// ```
#[async_trait]
pub trait FileScheme: Send + Sync {
    /// Fetch the file addressed by `url`
    async fn get_file(&self, url: &Url) -> Result<Arc<dyn ReadAt>, BoxError>;
}

#[async_trait]
impl<T: FileScheme + ?Sized> FileScheme for Arc<T> {
    async fn get_file(&self, url: &Url) -> Result<Arc<dyn ReadAt>, BoxError> {
        (**self).get_file(url).await
    }
}
