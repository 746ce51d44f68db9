mod http;
mod local;
mod split;

pub use http::HttpRangeReader;
pub use local::LocalFileReader;
pub use split::SplitFileReader;

use crate::error::{ArchiveError, Result};
use async_trait::async_trait;

/// Trait for random access reading from a container
///
/// This is the contract the directory scanners and entry sources rely on:
/// positioned reads plus a known total size. Implementations must support
/// concurrent positioned reads; the archive layer adds no locking of its own.
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer, returning the
    /// number of bytes actually read (may be short near the end)
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the container
    fn size(&self) -> u64;

    /// Read exactly `buf.len()` bytes at `offset` or fail
    async fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let got = self.read_at(offset, buf).await?;
        if got != buf.len() {
            return Err(ArchiveError::ShortRead {
                offset,
                wanted: buf.len(),
                got,
            });
        }
        Ok(())
    }
}
