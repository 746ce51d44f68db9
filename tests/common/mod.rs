//! Test fixtures: hand-built ZIP byte images and an in-memory container.

use std::io::Write;

use apkcat::{DEFLATED, ReadAt, STORED};
use flate2::{Compression, write::DeflateEncoder};

/// Packed stamp used for fixture entries: 2021-07-15 10:30:44
pub const FIXTURE_STAMP: u32 = {
    let date = (((2021 - 1980) as u32) << 9) | (7 << 5) | 15;
    let time = (10 << 11) | (30 << 5) | (44 / 2);
    (date << 16) | time
};

struct EntrySpec {
    name: String,
    data: Vec<u8>,
    method: u16,
}

/// Builds a ZIP byte image entry by entry: local headers and payloads,
/// an optional signing block, the central directory and the EOCD.
#[derive(Default)]
pub struct ZipImageBuilder {
    entries: Vec<EntrySpec>,
    signing_pairs: Option<Vec<(u32, Vec<u8>)>>,
    comment: Vec<u8>,
}

impl ZipImageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a STORED file entry
    pub fn file(mut self, name: &str, data: &[u8]) -> Self {
        self.entries.push(EntrySpec {
            name: name.to_string(),
            data: data.to_vec(),
            method: STORED,
        });
        self
    }

    /// Add a DEFLATE file entry
    pub fn deflate_file(mut self, name: &str, data: &[u8]) -> Self {
        self.entries.push(EntrySpec {
            name: name.to_string(),
            data: data.to_vec(),
            method: DEFLATED,
        });
        self
    }

    /// Add a directory entry (name must end with '/')
    pub fn dir(mut self, name: &str) -> Self {
        assert!(name.ends_with('/'), "directory names end with '/'");
        self.entries.push(EntrySpec {
            name: name.to_string(),
            data: Vec::new(),
            method: STORED,
        });
        self
    }

    /// Wedge a signing block with the given pairs below the central directory
    pub fn signing_block(mut self, pairs: Vec<(u32, Vec<u8>)>) -> Self {
        self.signing_pairs = Some(pairs);
        self
    }

    /// Append a trailing archive comment after the EOCD
    pub fn comment(mut self, text: &[u8]) -> Self {
        self.comment = text.to_vec();
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let (image, _, _) = self.build_parts();
        image
    }

    /// Build an image whose central directory is cut mid-record while the
    /// EOCD still announces the full directory
    pub fn build_truncated(&self) -> Vec<u8> {
        let (image, cd_offset, cd_size) = self.build_parts();
        let eocd_start = cd_offset + cd_size;
        let cut = cd_offset + cd_size / 2;

        let mut truncated = image[..cut as usize].to_vec();
        truncated.extend_from_slice(&image[eocd_start as usize..]);
        truncated
    }

    fn build_parts(&self) -> (Vec<u8>, u64, u64) {
        let mut image: Vec<u8> = Vec::new();
        let mut central: Vec<u8> = Vec::new();

        for spec in &self.entries {
            let lfh_offset = image.len() as u32;
            let payload = match spec.method {
                STORED => spec.data.clone(),
                DEFLATED => deflate(&spec.data),
                other => panic!("fixture method {other}"),
            };
            let crc = crc32(&spec.data);
            let time = (FIXTURE_STAMP & 0xFFFF) as u16;
            let date = (FIXTURE_STAMP >> 16) as u16;

            // Local file header
            image.extend_from_slice(b"PK\x03\x04");
            image.extend_from_slice(&20u16.to_le_bytes()); // version needed
            image.extend_from_slice(&0u16.to_le_bytes()); // flags
            image.extend_from_slice(&spec.method.to_le_bytes());
            image.extend_from_slice(&time.to_le_bytes());
            image.extend_from_slice(&date.to_le_bytes());
            image.extend_from_slice(&crc.to_le_bytes());
            image.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            image.extend_from_slice(&(spec.data.len() as u32).to_le_bytes());
            image.extend_from_slice(&(spec.name.len() as u16).to_le_bytes());
            image.extend_from_slice(&0u16.to_le_bytes()); // extra len
            image.extend_from_slice(spec.name.as_bytes());
            image.extend_from_slice(&payload);

            // Matching central directory record
            central.extend_from_slice(b"PK\x01\x02");
            central.extend_from_slice(&20u16.to_le_bytes()); // version made by
            central.extend_from_slice(&20u16.to_le_bytes()); // version needed
            central.extend_from_slice(&0u16.to_le_bytes()); // flags
            central.extend_from_slice(&spec.method.to_le_bytes());
            central.extend_from_slice(&time.to_le_bytes());
            central.extend_from_slice(&date.to_le_bytes());
            central.extend_from_slice(&crc.to_le_bytes());
            central.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            central.extend_from_slice(&(spec.data.len() as u32).to_le_bytes());
            central.extend_from_slice(&(spec.name.len() as u16).to_le_bytes());
            central.extend_from_slice(&0u16.to_le_bytes()); // extra len
            central.extend_from_slice(&0u16.to_le_bytes()); // comment len
            central.extend_from_slice(&0u16.to_le_bytes()); // disk number
            central.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
            central.extend_from_slice(&0u32.to_le_bytes()); // external attrs
            central.extend_from_slice(&lfh_offset.to_le_bytes());
            central.extend_from_slice(spec.name.as_bytes());
        }

        if let Some(pairs) = &self.signing_pairs {
            image.extend_from_slice(&signing_block(pairs));
        }

        let cd_offset = image.len() as u64;
        let cd_size = central.len() as u64;
        image.extend_from_slice(&central);

        // End of central directory
        let count = self.entries.len() as u16;
        image.extend_from_slice(b"PK\x05\x06");
        image.extend_from_slice(&0u16.to_le_bytes()); // disk number
        image.extend_from_slice(&0u16.to_le_bytes()); // disk with cd
        image.extend_from_slice(&count.to_le_bytes());
        image.extend_from_slice(&count.to_le_bytes());
        image.extend_from_slice(&(cd_size as u32).to_le_bytes());
        image.extend_from_slice(&(cd_offset as u32).to_le_bytes());
        image.extend_from_slice(&(self.comment.len() as u16).to_le_bytes());
        image.extend_from_slice(&self.comment);

        (image, cd_offset, cd_size)
    }
}

fn signing_block(pairs: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let mut body: Vec<u8> = Vec::new();
    for (id, value) in pairs {
        body.extend_from_slice(&((value.len() + 4) as u64).to_le_bytes());
        body.extend_from_slice(&id.to_le_bytes());
        body.extend_from_slice(value);
    }

    // Size fields count everything after the leading one
    let size = (body.len() + 8 + 16) as u64;
    let mut block = Vec::new();
    block.extend_from_slice(&size.to_le_bytes());
    block.extend_from_slice(&body);
    block.extend_from_slice(&size.to_le_bytes());
    block.extend_from_slice(b"APK Sig Block 42");
    block
}

fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn crc32(data: &[u8]) -> u32 {
    let mut crc = flate2::Crc::new();
    crc.update(data);
    crc.sum()
}

/// In-memory container handle over a built image
#[derive(Debug)]
pub struct MemReader(pub Vec<u8>);

#[async_trait::async_trait]
impl ReadAt for MemReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> apkcat::Result<usize> {
        if offset >= self.0.len() as u64 {
            return Ok(0);
        }
        let start = offset as usize;
        let n = buf.len().min(self.0.len() - start);
        buf[..n].copy_from_slice(&self.0[start..start + n]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.0.len() as u64
    }
}
