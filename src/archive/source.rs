use std::io::Read;
use std::sync::Arc;

use flate2::read::DeflateDecoder;

use crate::error::{ArchiveError, Result};
use crate::io::ReadAt;
use crate::zip::structures::CompressionMethod;

use super::entry::ArchiveEntry;

/// A named, streamable handle for one entry.
///
/// The alias is the source's catalog identity: it keys the entry-source
/// map and places the source in the path tree. It defaults to the entry
/// name but can be rebound without touching the underlying entry.
pub trait InputSource {
    fn alias(&self) -> &str;

    /// Original entry name inside the container
    fn name(&self) -> &str;
}

/// Concrete input source backed by a container handle.
///
/// Construction is metadata-only: a source holds a clone of the shared
/// container handle and the entry's cataloged record, nothing is read
/// until [`read_to_memory`](Self::read_to_memory) is called.
pub struct EntrySource<R: ReadAt> {
    reader: Arc<R>,
    entry: ArchiveEntry,
    alias: String,
}

impl<R: ReadAt> EntrySource<R> {
    pub(crate) fn new(reader: Arc<R>, entry: ArchiveEntry) -> Self {
        let alias = entry.name().to_string();
        Self {
            reader,
            entry,
            alias,
        }
    }

    pub fn entry(&self) -> &ArchiveEntry {
        &self.entry
    }

    /// Rebind the alias this source is known by
    pub fn set_alias(&mut self, alias: impl Into<String>) {
        self.alias = alias.into();
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.set_alias(alias);
        self
    }

    /// Read and decode the entry's payload.
    ///
    /// STORED payloads pass through, DEFLATE payloads are inflated; any
    /// other method is refused. Directory entries yield an empty buffer.
    pub async fn read_to_memory(&self) -> Result<Vec<u8>> {
        let mut raw = vec![0u8; self.entry.compressed_size() as usize];
        self.reader
            .read_exact_at(self.entry.data_offset(), &mut raw)
            .await?;

        match self.entry.compression_method() {
            CompressionMethod::Stored => Ok(raw),
            CompressionMethod::Deflate => {
                let mut out = Vec::with_capacity(self.entry.uncompressed_size() as usize);
                DeflateDecoder::new(raw.as_slice()).read_to_end(&mut out)?;
                Ok(out)
            }
            CompressionMethod::Unknown(method) => Err(ArchiveError::UnsupportedMethod(method)),
        }
    }
}

impl<R: ReadAt> InputSource for EntrySource<R> {
    fn alias(&self) -> &str {
        &self.alias
    }

    fn name(&self) -> &str {
        self.entry.name()
    }
}

/// Entry-to-source conversion, supplied per concrete archive variant.
///
/// The conversion is deterministic and performs no I/O; whatever container
/// kind an archive wraps, its sources come from here.
pub trait EntrySourceFactory {
    type Reader: ReadAt;

    fn create_input_source(&self, entry: &ArchiveEntry) -> EntrySource<Self::Reader>;
}
