//! Random-access views over fetched files
//!
//! A scheme hands back its file as a [`ReadAt`] so callers can read any part
//! of it (a kernel out of a multi-file image, the header of an initrd, ...)
//! without fetching it again.

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::io;
use std::sync::Arc;

/// Chunk size used by [`read_to_end`]
const READ_CHUNK_SIZE: usize = 32 * 1024;

/// Positional read access to a fetched file
///
/// Reads take `&self`, so one view can serve several readers at once.
/// Views are `Debug` so fetch results can be inspected and unwrapped.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use dragonfly_pxe::ReadAt;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let view = Bytes::from_static(b"kernel initrd");
/// let mut buf = [0u8; 6];
/// let n = view.read_at(&mut buf, 7).await.unwrap();
/// assert_eq!(&buf[..n], b"initrd");
/// # }
/// ```
#[async_trait]
pub trait ReadAt: fmt::Debug + Send + Sync {
    /// Read up to `buf.len()` bytes starting at `offset`
    ///
    /// Returns the number of bytes read. `Ok(0)` for a non-empty buffer means
    /// `offset` is at or past the end of the file. Short reads are allowed.
    async fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize>;
}

fn read_slice(data: &[u8], buf: &mut [u8], offset: u64) -> usize {
    let start = match usize::try_from(offset) {
        Ok(start) if start < data.len() => start,
        _ => return 0,
    };
    let n = buf.len().min(data.len() - start);
    buf[..n].copy_from_slice(&data[start..start + n]);
    n
}

#[async_trait]
impl ReadAt for Bytes {
    async fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        Ok(read_slice(self, buf, offset))
    }
}

#[async_trait]
impl ReadAt for Vec<u8> {
    async fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        Ok(read_slice(self, buf, offset))
    }
}

#[async_trait]
impl ReadAt for String {
    async fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        Ok(read_slice(self.as_bytes(), buf, offset))
    }
}

#[async_trait]
impl ReadAt for &'static [u8] {
    async fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        Ok(read_slice(self, buf, offset))
    }
}

#[async_trait]
impl<T: ReadAt + ?Sized> ReadAt for Arc<T> {
    async fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        (**self).read_at(buf, offset).await
    }
}

/// Read a whole view from offset 0 until it reports end of file
pub async fn read_to_end<R: ReadAt + ?Sized>(reader: &R) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];
    let mut offset = 0u64;

    loop {
        match reader.read_at(&mut chunk, offset).await {
            Ok(0) => break,
            Ok(n) => {
                out.extend_from_slice(&chunk[..n]);
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(out)
}

/// Fill `buf` entirely from `offset`, failing with `UnexpectedEof` if the
/// view ends first
pub async fn read_exact_at<R: ReadAt + ?Sized>(
    reader: &R,
    buf: &mut [u8],
    offset: u64,
) -> io::Result<()> {
    let mut filled = 0;

    while filled < buf.len() {
        match reader.read_at(&mut buf[filled..], offset + filled as u64).await {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("view ended after {} of {} bytes", filled, buf.len()),
                ))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out at most 3 bytes per call
    #[derive(Debug)]
    struct Trickle(Vec<u8>);

    #[async_trait]
    impl ReadAt for Trickle {
        async fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
            let len = buf.len().min(3);
            Ok(read_slice(&self.0, &mut buf[..len], offset))
        }
    }

    #[tokio::test]
    async fn test_bytes_read_at() {
        let view = Bytes::from_static(b"hello world");
        let mut buf = [0u8; 5];

        assert_eq!(view.read_at(&mut buf, 0).await.unwrap(), 5);
        assert_eq!(&buf, b"hello");

        assert_eq!(view.read_at(&mut buf, 8).await.unwrap(), 3);
        assert_eq!(&buf[..3], b"rld");

        assert_eq!(view.read_at(&mut buf, 11).await.unwrap(), 0);
        assert_eq!(view.read_at(&mut buf, u64::MAX).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_read_to_end_spans_chunks() {
        let data: Vec<u8> = (0..READ_CHUNK_SIZE * 2 + 17).map(|i| i as u8).collect();
        let view: Arc<dyn ReadAt> = Arc::new(data.clone());

        let out = read_to_end(&*view).await.unwrap();
        assert_eq!(out, data);
    }

    #[tokio::test]
    async fn test_read_to_end_empty() {
        let out = read_to_end(&String::new()).await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_read_exact_at_with_short_reads() {
        let view = Trickle(b"0123456789".to_vec());
        let mut buf = [0u8; 8];

        read_exact_at(&view, &mut buf, 1).await.unwrap();
        assert_eq!(&buf, b"12345678");
    }

    #[tokio::test]
    async fn test_read_exact_at_unexpected_eof() {
        let view = Bytes::from_static(b"short");
        let mut buf = [0u8; 8];

        let err = read_exact_at(&view, &mut buf, 0).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
