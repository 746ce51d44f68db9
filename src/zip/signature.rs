//! APK signing block.
//!
//! Signed packages carry a signing block wedged between the last entry
//! payload and the central directory, outside the formal directory region:
//!
//! ```text
//! | size (u64) | id-value pairs ... | size (u64) | "APK Sig Block 42" |
//! ```
//!
//! Both size fields hold the same value and count everything after the
//! leading field. Each pair is `length:u64, id:u32, value:[u8]` with the
//! length covering the id and the value.

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use tracing::debug;

use crate::error::{ArchiveError, Result};
use crate::io::ReadAt;

/// Magic trailing the signing block, just below the central directory
pub const SIGNING_BLOCK_MAGIC: &[u8; 16] = b"APK Sig Block 42";

/// Pair ID of the v2 signature scheme
pub const SIGNATURE_SCHEME_V2_ID: u32 = 0x7109871a;
/// Pair ID of the v3 signature scheme
pub const SIGNATURE_SCHEME_V3_ID: u32 = 0xf05368c0;
/// Pair ID of verity padding
pub const VERITY_PADDING_ID: u32 = 0x42726577;

/// Size field + magic, the fixed tail of the block
const BLOCK_TAIL_SIZE: u64 = 8 + 16;

/// One ID-value pair from the signing block
#[derive(Debug, Clone)]
pub struct SignaturePair {
    pub id: u32,
    pub value: Vec<u8>,
}

/// The package signing block recovered from below the central directory
///
/// Held by the archive as an opaque, parsed-but-not-interpreted value:
/// pair IDs and raw pair payloads are exposed, signature verification is
/// someone else's job.
#[derive(Debug, Clone)]
pub struct SignatureBlock {
    offset: u64,
    size: u64,
    pairs: Vec<SignaturePair>,
}

impl SignatureBlock {
    /// Look for a signing block ending at `cd_offset` and parse it.
    ///
    /// Absence is normal (unsigned package) and yields `Ok(None)`. A block
    /// whose magic is present but whose frame is inconsistent is a load
    /// failure, not absence.
    pub(crate) async fn extract<R: ReadAt>(reader: &R, cd_offset: u64) -> Result<Option<Self>> {
        if cd_offset < BLOCK_TAIL_SIZE + 8 {
            return Ok(None);
        }

        let mut tail = [0u8; BLOCK_TAIL_SIZE as usize];
        reader
            .read_exact_at(cd_offset - BLOCK_TAIL_SIZE, &mut tail)
            .await?;

        if &tail[8..] != SIGNING_BLOCK_MAGIC {
            return Ok(None);
        }

        let trailing_size = LittleEndian::read_u64(&tail[..8]);

        // The size fields count everything after the leading field, so the
        // block spans [cd_offset - size - 8, cd_offset).
        if trailing_size < BLOCK_TAIL_SIZE || trailing_size + 8 > cd_offset {
            return Err(ArchiveError::MalformedSigningBlock(
                "size field does not fit below the central directory",
            ));
        }
        let offset = cd_offset - trailing_size - 8;

        let mut leading = [0u8; 8];
        reader.read_exact_at(offset, &mut leading).await?;
        let leading_size = LittleEndian::read_u64(&leading);
        if leading_size != trailing_size {
            return Err(ArchiveError::MalformedSigningBlock(
                "leading and trailing size fields disagree",
            ));
        }

        let pairs_len = (trailing_size - BLOCK_TAIL_SIZE) as usize;
        let mut pairs_data = vec![0u8; pairs_len];
        reader.read_exact_at(offset + 8, &mut pairs_data).await?;
        let pairs = parse_pairs(&pairs_data)?;

        debug!(
            offset,
            size = trailing_size + 8,
            pairs = pairs.len(),
            "signing block found"
        );

        Ok(Some(Self {
            offset,
            size: trailing_size + 8,
            pairs,
        }))
    }

    /// Container offset where the block starts (its leading size field)
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Total block length in bytes, framing included
    pub fn size(&self) -> u64 {
        self.size
    }

    /// All ID-value pairs in block order
    pub fn pairs(&self) -> &[SignaturePair] {
        &self.pairs
    }

    /// Value bytes of the first pair carrying `id`
    pub fn pair(&self, id: u32) -> Option<&[u8]> {
        self.pairs
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.value.as_slice())
    }

    pub fn has_scheme_v2(&self) -> bool {
        self.pair(SIGNATURE_SCHEME_V2_ID).is_some()
    }

    pub fn has_scheme_v3(&self) -> bool {
        self.pair(SIGNATURE_SCHEME_V3_ID).is_some()
    }
}

/// Parse the pair sequence between the two size fields.
fn parse_pairs(data: &[u8]) -> Result<Vec<SignaturePair>> {
    let mut pairs = Vec::new();
    let mut cursor = Cursor::new(data);

    while (cursor.position() as usize) < data.len() {
        if data.len() - (cursor.position() as usize) < 12 {
            return Err(ArchiveError::MalformedSigningBlock(
                "trailing bytes too short for a pair header",
            ));
        }
        let len = cursor.read_u64::<LittleEndian>()?;
        if len < 4 || cursor.position() + len > data.len() as u64 {
            return Err(ArchiveError::MalformedSigningBlock(
                "pair length overruns the block",
            ));
        }
        let id = cursor.read_u32::<LittleEndian>()?;
        let mut value = vec![0u8; (len - 4) as usize];
        cursor.read_exact(&mut value)?;
        pairs.push(SignaturePair { id, value });
    }

    Ok(pairs)
}
