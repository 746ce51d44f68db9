use std::path::Path;

use super::ReadAt;
use crate::error::{ArchiveError, Result};
use async_trait::async_trait;

/// One part file of a split container
struct Part {
    file: std::fs::File,
    start: u64,
    len: u64,
}

/// Multi-part container: an ordered list of part files read as one
/// concatenated byte stream
///
/// Spanned archives store a single ZIP byte image across sequential part
/// files; the directory structures sit in the final part and refer to
/// offsets in the combined stream. Opening the parts in order makes the
/// whole family of positioned reads work unchanged.
pub struct SplitFileReader {
    parts: Vec<Part>,
    size: u64,
}

impl SplitFileReader {
    /// Open the given part files, in container order
    pub fn new<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        if paths.is_empty() {
            return Err(ArchiveError::EmptySplit);
        }
        let mut parts = Vec::with_capacity(paths.len());
        let mut start = 0u64;
        for path in paths {
            let file = std::fs::File::open(path.as_ref())?;
            let len = file.metadata()?.len();
            parts.push(Part { file, start, len });
            start += len;
        }
        Ok(Self { parts, size: start })
    }

    /// Number of part files
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    fn part_at(&self, offset: u64) -> Option<&Part> {
        // Parts are sorted by start offset; find the last one at or below
        let idx = self
            .parts
            .partition_point(|p| p.start <= offset)
            .checked_sub(1)?;
        Some(&self.parts[idx])
    }
}

fn read_part(part: &Part, offset_in_part: u64, buf: &mut [u8]) -> Result<usize> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::FileExt;
        Ok(part.file.read_at(buf, offset_in_part)?)
    }

    #[cfg(windows)]
    {
        use std::os::windows::fs::FileExt;
        Ok(part.file.seek_read(buf, offset_in_part)?)
    }

    #[cfg(not(any(unix, windows)))]
    {
        use std::io::{Read, Seek, SeekFrom};
        let mut file = &part.file;
        file.seek(SeekFrom::Start(offset_in_part))?;
        Ok(file.read(buf)?)
    }
}

#[async_trait]
impl ReadAt for SplitFileReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let mut received = 0usize;

        // A read may span part boundaries; keep filling from consecutive
        // parts until the buffer is full or the stream ends.
        while received < buf.len() {
            let pos = offset + received as u64;
            if pos >= self.size {
                break;
            }
            let part = match self.part_at(pos) {
                Some(p) => p,
                None => break,
            };
            let offset_in_part = pos - part.start;
            let available = (part.len - offset_in_part).min((buf.len() - received) as u64) as usize;
            if available == 0 {
                break;
            }
            let n = read_part(part, offset_in_part, &mut buf[received..received + available])?;
            if n == 0 {
                break;
            }
            received += n;
        }

        Ok(received)
    }

    fn size(&self) -> u64 {
        self.size
    }
}
