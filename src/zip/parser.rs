//! Central-directory scanner.
//!
//! First of the two construction-time passes: locate the end-of-central-
//! directory record, follow it (through the ZIP64 structures when present)
//! to the central directory, and parse every directory record in order.
//!
//! ## Scanning strategy
//!
//! ZIP-family containers are read from the end:
//! 1. Find the End of Central Directory (EOCD) at the container's tail
//! 2. If ZIP64, read the ZIP64 EOCD for large-container field widths
//! 3. Read the whole central directory region in one positioned read
//! 4. Parse one record per announced entry, preserving directory order
//!
//! The scan also reports the byte region the central directory occupies;
//! the local-directory pass needs the region's start to find the signing
//! block that sits just below it.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use tracing::{debug, trace};

use crate::error::{ArchiveError, Result};
use crate::io::ReadAt;

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// The scanned central directory: every record in discovery order plus
/// the byte region the directory itself occupies.
pub struct CentralDirectory {
    pub records: Vec<DirectoryRecord>,
    pub offset: u64,
    pub size: u64,
}

/// Central-directory scanner over any [`ReadAt`] container.
///
/// Borrows the container for the duration of the scan; nothing is retained
/// afterwards. Runs exactly once per archive construction.
pub struct DirectoryScanner<'a, R: ReadAt> {
    reader: &'a R,
    size: u64,
}

impl<'a, R: ReadAt> DirectoryScanner<'a, R> {
    pub fn new(reader: &'a R) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Handles both the simple case (no trailing comment) and containers
    /// with comments by searching backwards for the signature.
    ///
    /// # Returns
    ///
    /// A tuple of (EOCD record, offset of EOCD in the container).
    ///
    /// # Errors
    ///
    /// Fails when no valid EOCD can be found, meaning the container is not
    /// a ZIP-family structure.
    async fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        // Fast path: no comment, EOCD flush against the end.
        if self.size >= EndOfCentralDirectory::SIZE as u64 {
            let offset = self.size - EndOfCentralDirectory::SIZE as u64;
            let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
            self.reader.read_exact_at(offset, &mut buf).await?;

            if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && &buf[20..22] == b"\x00\x00" {
                let eocd = EndOfCentralDirectory::from_bytes(&buf)?;
                return Ok((eocd, offset));
            }
        }

        // A trailing comment pushes the EOCD up from the end; search
        // backwards over the largest region a comment can occupy.
        let search_size = (MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE as u64).min(self.size);
        let search_start = self.size - search_size;

        let mut buf = vec![0u8; search_size as usize];
        self.reader.read_exact_at(search_start, &mut buf).await?;

        for i in (0..buf.len().saturating_sub(EndOfCentralDirectory::SIZE)).rev() {
            if &buf[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
                // Candidate found; the comment length field must account
                // for every byte that follows the record.
                let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;

                if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                    let eocd =
                        EndOfCentralDirectory::from_bytes(&buf[i..i + EndOfCentralDirectory::SIZE])?;
                    return Ok((eocd, search_start + i as u64));
                }
            }
        }

        Err(ArchiveError::MissingEndOfCentralDirectory)
    }

    /// Read the ZIP64 End of Central Directory record.
    ///
    /// Called when the regular EOCD carries sentinel field values (0xFFFF /
    /// 0xFFFFFFFF) announcing ZIP64 extensions.
    async fn read_zip64_eocd(&self, eocd_offset: u64) -> Result<Zip64Eocd> {
        // The ZIP64 EOCD locator sits immediately before the regular EOCD
        let locator_offset = eocd_offset - Zip64EocdLocator::SIZE as u64;
        let mut locator_buf = vec![0u8; Zip64EocdLocator::SIZE];
        self.reader
            .read_exact_at(locator_offset, &mut locator_buf)
            .await?;

        let locator = Zip64EocdLocator::from_bytes(&locator_buf)?;

        let mut eocd64_buf = vec![0u8; Zip64Eocd::MIN_SIZE];
        self.reader
            .read_exact_at(locator.eocd64_offset, &mut eocd64_buf)
            .await?;

        Zip64Eocd::from_bytes(&eocd64_buf)
    }

    /// Scan the container's central directory.
    ///
    /// Produces every directory record in discovery order along with the
    /// byte region the central directory occupies.
    ///
    /// # Errors
    ///
    /// Fails when the EOCD is missing, the directory region cannot be read
    /// in full, or any record inside it is structurally invalid.
    pub async fn scan(&self) -> Result<CentralDirectory> {
        let (eocd, eocd_offset) = self.find_eocd().await?;

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset).await?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        debug!(cd_offset, cd_size, total_entries, "scanning central directory");

        // One positioned read for the whole directory region; cheap for
        // local containers, a single range request for remote ones.
        let mut cd_data = vec![0u8; cd_size as usize];
        self.reader.read_exact_at(cd_offset, &mut cd_data).await?;

        let mut records = Vec::with_capacity(total_entries as usize);
        let mut cursor = Cursor::new(cd_data.as_slice());

        for parsed in 0..total_entries {
            let record = parse_record(&mut cursor).map_err(|e| match e {
                ArchiveError::Io(ref io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
                    ArchiveError::TruncatedCentralDirectory {
                        expected: total_entries,
                        parsed,
                    }
                }
                other => other,
            })?;
            trace!(name = %record.file_name, "directory record");
            records.push(record);
        }

        Ok(CentralDirectory {
            records,
            offset: cd_offset,
            size: cd_size,
        })
    }
}

/// Parse one Central Directory File Header from the directory region.
///
/// The CDFH holds an entry's name, sizes, checksum, method, packed
/// modification stamp and the offset of its local header. ZIP64 sizes and
/// offsets are pulled from the 0x0001 extra field when the 32-bit fields
/// carry sentinels.
fn parse_record(cursor: &mut Cursor<&[u8]>) -> Result<DirectoryRecord> {
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig)?;
    if sig != CDFH_SIGNATURE {
        return Err(ArchiveError::BadSignature("central directory file header"));
    }

    let _version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let _flags = cursor.read_u16::<LittleEndian>()?;
    let compression_method = cursor.read_u16::<LittleEndian>()?;
    let last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let file_name_length = cursor.read_u16::<LittleEndian>()?;
    let extra_field_length = cursor.read_u16::<LittleEndian>()?;
    let file_comment_length = cursor.read_u16::<LittleEndian>()?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let _external_attrs = cursor.read_u32::<LittleEndian>()?;
    let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

    let mut file_name_bytes = vec![0u8; file_name_length as usize];
    cursor.read_exact(&mut file_name_bytes)?;
    // Lossy conversion keeps non-UTF8 names representable
    let file_name = String::from_utf8_lossy(&file_name_bytes).to_string();

    // ZIP64 extended information lives in extra field 0x0001; a size or
    // offset is present there only when its 32-bit field is saturated.
    let extra_field_end = cursor.position() + extra_field_length as u64;

    while cursor.position() + 4 <= extra_field_end {
        let header_id = cursor.read_u16::<LittleEndian>()?;
        let field_size = cursor.read_u16::<LittleEndian>()?;

        if header_id == 0x0001 {
            if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= extra_field_end {
                uncompressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= extra_field_end {
                compressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if lfh_offset == 0xFFFFFFFF && cursor.position() + 8 <= extra_field_end {
                lfh_offset = cursor.read_u64::<LittleEndian>()?;
            }
            // Remaining ZIP64 fields (disk number start) are not used
            let remaining = extra_field_end.saturating_sub(cursor.position());
            cursor.set_position(cursor.position() + remaining);
        } else {
            cursor.set_position(cursor.position() + field_size as u64);
        }
    }

    cursor.set_position(extra_field_end);

    // File comment is not part of the catalog
    cursor.set_position(cursor.position() + file_comment_length as u64);

    Ok(DirectoryRecord {
        file_name,
        compression_method: CompressionMethod::from_u16(compression_method),
        compressed_size,
        uncompressed_size,
        crc32,
        lfh_offset,
        last_mod_time,
        last_mod_date,
    })
}
