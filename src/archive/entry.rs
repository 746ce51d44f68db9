use chrono::NaiveDateTime;

use crate::zip::local::ResolvedRecord;
use crate::zip::structures::CompressionMethod;

use super::dos_time;

/// One cataloged record of a loaded archive.
///
/// Created once per directory record during construction and immutable
/// afterwards. Whether an entry is a directory or a file follows from the
/// trailing-slash convention of its name; the two are mutually exclusive
/// and cover the whole catalog.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    name: String,
    compression_method: CompressionMethod,
    compressed_size: u64,
    uncompressed_size: u64,
    crc32: u32,
    dos_datetime: u32,
    header_offset: u64,
    data_offset: u64,
}

impl ArchiveEntry {
    pub(crate) fn from_resolved(resolved: ResolvedRecord) -> Self {
        let record = resolved.record;
        Self {
            name: record.file_name,
            compression_method: record.compression_method,
            compressed_size: record.compressed_size,
            uncompressed_size: record.uncompressed_size,
            crc32: record.crc32,
            dos_datetime: ((record.last_mod_date as u32) << 16) | record.last_mod_time as u32,
            header_offset: record.lfh_offset,
            data_offset: resolved.data_offset,
        }
    }

    /// Full path inside the container, '/'-separated
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_directory(&self) -> bool {
        self.name.ends_with('/')
    }

    pub fn is_file(&self) -> bool {
        !self.is_directory()
    }

    pub fn compression_method(&self) -> CompressionMethod {
        self.compression_method
    }

    pub fn compressed_size(&self) -> u64 {
        self.compressed_size
    }

    pub fn uncompressed_size(&self) -> u64 {
        self.uncompressed_size
    }

    pub fn crc32(&self) -> u32 {
        self.crc32
    }

    /// Raw packed modification stamp as stored in the directory record
    pub fn dos_datetime(&self) -> u32 {
        self.dos_datetime
    }

    /// Modification stamp decoded to a calendar timestamp
    pub fn modified(&self) -> NaiveDateTime {
        dos_time::dos_to_datetime(self.dos_datetime)
    }

    /// Offset of the entry's local header in the container
    pub fn header_offset(&self) -> u64 {
        self.header_offset
    }

    /// Offset where the entry's payload begins, resolved at load time
    pub fn data_offset(&self) -> u64 {
        self.data_offset
    }
}
