//! Error types for boot file retrieval
//!
//! Every failure that leaves the retrieval API is a [`UrlError`]: the URL that
//! was being fetched, paired with the [`Cause`]. Transport errors are carried
//! unmodified so callers can downcast them back to the handler's own type.
//! Reference resolution failures are reported separately as [`ResolveError`].

use std::error::Error as StdError;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Error type returned by [`FileScheme`](crate::FileScheme) implementations
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Underlying reason a retrieval failed
#[derive(Debug, Clone, Error)]
pub enum Cause {
    /// No handler is registered for the URL's scheme
    #[error("no such scheme")]
    NoSuchScheme,

    /// The scheme handler failed (unreachable host, missing file, ...)
    #[error("transport error")]
    Transport(#[source] Arc<dyn StdError + Send + Sync + 'static>),

    /// The handler did not finish within the configured fetch timeout
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),

    /// The file was fetched but reading its contents failed
    #[error("read failed")]
    Read(#[source] Arc<io::Error>),

    /// The first fetch of a lazily opened file was dropped before it finished
    #[error("fetch was cancelled before it completed")]
    Cancelled,
}

impl Cause {
    /// Wrap a handler error without altering it
    pub fn transport(err: BoxError) -> Self {
        Cause::Transport(Arc::from(err))
    }
}

/// Error envelope pairing the URL that failed with the cause
#[derive(Debug, Clone, Error)]
#[error("{url}: {cause}")]
pub struct UrlError {
    /// URL whose retrieval failed
    pub url: Url,

    /// What went wrong
    #[source]
    pub cause: Cause,
}

impl UrlError {
    /// Create a new error envelope
    pub fn new(url: Url, cause: Cause) -> Self {
        Self { url, cause }
    }

    /// Envelope for a URL whose scheme has no registered handler
    pub fn no_such_scheme(url: &Url) -> Self {
        Self::new(url.clone(), Cause::NoSuchScheme)
    }

    /// Returns true if no handler was registered for the URL's scheme
    pub fn is_no_such_scheme(&self) -> bool {
        matches!(self.cause, Cause::NoSuchScheme)
    }

    /// Returns true if the configured fetch timeout elapsed
    pub fn is_timeout(&self) -> bool {
        matches!(self.cause, Cause::Timeout(_))
    }

    /// Returns true if a lazy fetch was abandoned part way through
    pub fn is_cancelled(&self) -> bool {
        matches!(self.cause, Cause::Cancelled)
    }

    /// Borrow the handler's original error as a concrete type
    ///
    /// Returns `None` for causes raised by this crate itself
    /// (unknown scheme, timeout, cancellation) or when the type doesn't match.
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        match &self.cause {
            Cause::Transport(err) => err.downcast_ref::<E>(),
            Cause::Read(err) => (&**err as &(dyn StdError + 'static)).downcast_ref::<E>(),
            Cause::NoSuchScheme | Cause::Timeout(_) | Cause::Cancelled => None,
        }
    }

    fn io_kind(&self) -> io::ErrorKind {
        match &self.cause {
            Cause::NoSuchScheme => io::ErrorKind::Unsupported,
            Cause::Timeout(_) => io::ErrorKind::TimedOut,
            Cause::Cancelled => io::ErrorKind::Other,
            Cause::Read(err) => err.kind(),
            Cause::Transport(err) => err
                .downcast_ref::<io::Error>()
                .map(io::Error::kind)
                .unwrap_or(io::ErrorKind::Other),
        }
    }
}

/// Lets a [`UrlError`] travel through [`ReadAt`](crate::ReadAt).
///
/// The envelope stays reachable through [`io::Error::get_ref`].
impl From<UrlError> for io::Error {
    fn from(err: UrlError) -> Self {
        io::Error::new(err.io_kind(), err)
    }
}

/// Error type for resolving a reference against a working directory
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The reference is not a valid URL or path
    #[error("could not parse URL {reference:?}")]
    Parse {
        reference: String,
        #[source]
        source: url::ParseError,
    },

    /// The working directory URL cannot carry a path (e.g. `mailto:`)
    #[error("cannot resolve {reference:?} against {base}: URL has no path")]
    CannotBeABase { reference: String, base: Url },
}

/// Result type for retrieval operations
pub type Result<T> = std::result::Result<T, UrlError>;
