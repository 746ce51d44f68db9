//! Local-directory scanner.
//!
//! Second of the two construction-time passes. The central directory is
//! authoritative for names and sizes, but each entry's payload position is
//! only known after its local header is read: the local header repeats the
//! name and extra field with lengths that may differ from the central
//! copy. This pass validates every record against its local header,
//! resolves the payload offset, and recovers the signing block sitting in
//! the gap just below the central directory.

use byteorder::{ByteOrder, LittleEndian};
use tracing::debug;

use crate::error::{ArchiveError, Result};
use crate::io::ReadAt;

use super::parser::CentralDirectory;
use super::signature::SignatureBlock;
use super::structures::{DirectoryRecord, LFH_SIGNATURE, LFH_SIZE};

/// A directory record with its payload position resolved
pub struct ResolvedRecord {
    pub record: DirectoryRecord,
    pub data_offset: u64,
}

/// Result of the local-directory pass: validated records in discovery
/// order plus the optional signing block
pub struct LocalDirectory {
    pub records: Vec<ResolvedRecord>,
    pub signing_block: Option<SignatureBlock>,
}

impl LocalDirectory {
    /// Walk every record's local header and the region below the central
    /// directory.
    ///
    /// # Errors
    ///
    /// Fails when a local header is missing or carries the wrong magic, or
    /// when a signing block is present but structurally inconsistent.
    pub async fn scan<R: ReadAt>(reader: &R, central: &CentralDirectory) -> Result<Self> {
        let mut records = Vec::with_capacity(central.records.len());

        for record in &central.records {
            let data_offset = resolve_data_offset(reader, record).await?;
            records.push(ResolvedRecord {
                record: record.clone(),
                data_offset,
            });
        }

        let signing_block = SignatureBlock::extract(reader, central.offset).await?;

        debug!(
            records = records.len(),
            signed = signing_block.is_some(),
            "local directory scan complete"
        );

        Ok(Self {
            records,
            signing_block,
        })
    }
}

/// Read an entry's local header and compute where its payload begins.
///
/// The local header's own name and extra-field lengths are used; the
/// central directory's copies cannot be trusted for this.
async fn resolve_data_offset<R: ReadAt>(reader: &R, record: &DirectoryRecord) -> Result<u64> {
    let mut lfh_buf = vec![0u8; LFH_SIZE];
    reader.read_exact_at(record.lfh_offset, &mut lfh_buf).await?;

    if &lfh_buf[0..4] != LFH_SIGNATURE {
        return Err(ArchiveError::BadSignature("local file header"));
    }

    // Name and extra-field lengths sit at fixed positions 26 and 28
    let file_name_length = LittleEndian::read_u16(&lfh_buf[26..28]) as u64;
    let extra_field_length = LittleEndian::read_u16(&lfh_buf[28..30]) as u64;

    Ok(record.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
}
