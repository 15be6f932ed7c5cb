//! Dragonfly PXE File Retrieval
//!
//! This crate fetches boot configuration files and boot artifacts addressed
//! by URL, where the URL's scheme decides which transport does the work.
//! Boot configs chain into each other (a `pxelinux.cfg/default` pulling in a
//! per-machine config from an HTTP server, which names a kernel on TFTP), and
//! each reference may be relative to the config that contains it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  parse_url(reference, working directory)             │
//! │      "default" + tftp://10.0.0.1/pxelinux.cfg        │
//! │        → tftp://10.0.0.1/pxelinux.cfg/default        │
//! └──────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌──────────────────────────────────────────────────────┐
//! │                     Schemes                          │
//! │   get_file (eager)  |  lazy_get_file (LazyFile)      │
//! │  ┌────────────────────────────────────────────────┐  │
//! │  │  Scheme Registry                               │  │
//! │  │    file | tftp | http | ...  → FileScheme      │  │
//! │  └────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//!              Arc<dyn ReadAt> or UrlError { url, cause }
//! ```
//!
//! Transports for network schemes live with their protocol clients; this
//! crate ships [`LocalScheme`] (`file`) and [`MemoryScheme`].
//!
//! # Example
//!
//! ```
//! use dragonfly_pxe::{parse_url, read_to_end, MemoryScheme, Schemes};
//! use url::Url;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut tftp = MemoryScheme::new("tftp");
//! tftp.add("192.168.1.1", "/foobar/pxelinux.cfg/default", "default linux");
//!
//! let schemes = Schemes::new();
//! schemes.register("tftp", tftp);
//!
//! let wd = Url::parse("tftp://192.168.1.1/foobar/pxelinux.cfg").unwrap();
//! let url = parse_url("default", &wd).unwrap();
//!
//! // Nothing is fetched until the first read
//! let config = schemes.lazy_get_file(&url).unwrap();
//! assert_eq!(read_to_end(&config).await.unwrap(), b"default linux");
//!
//! let err = schemes
//!     .get_file(&Url::parse("nosuch://192.168.1.1/default").unwrap())
//!     .await
//!     .unwrap_err();
//! assert!(err.is_no_such_scheme());
//! # }
//! ```

pub mod config;
pub mod error;
pub mod lazy;
pub mod local;
pub mod memory;
pub mod resolve;
pub mod scheme;
pub mod schemes;
pub mod view;

pub use config::*;
pub use error::*;
pub use lazy::*;
pub use local::*;
pub use memory::*;
pub use resolve::*;
pub use scheme::*;
pub use schemes::*;
pub use view::*;
