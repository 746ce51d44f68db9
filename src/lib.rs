//! # apkcat
//!
//! An in-memory entry index over ZIP-family containers, built for APK
//! packages.
//!
//! Loading a container discovers every entry once (a central-directory
//! scan followed by a local-directory scan) and produces an immutable,
//! order-preserving catalog. Every later operation (named lookup, filtered
//! iteration, the alias-to-source map, the path tree, signing-block
//! access) is answered from that catalog without touching the container's
//! directory structures again. Containers can live on the local
//! filesystem, behind an HTTP server that supports Range requests, or be
//! spread over ordered split parts.
//!
//! ## Features
//!
//! - One-time two-pass indexing; all reads served from the catalog
//! - Local, HTTP Range and multi-part (split) containers
//! - ZIP64 support for containers larger than 4GB
//! - APK signing block recovery and pair access
//! - On-demand entry sources with STORED and DEFLATE payload reading
//! - Path-tree grouping of flat entry names
//!
//! ## Example
//!
//! ```no_run
//! use apkcat::Archive;
//!
//! #[tokio::main]
//! async fn main() -> apkcat::Result<()> {
//!     let archive = Archive::open("app.apk").await?;
//!
//!     println!("{} entries", archive.size());
//!     for entry in archive.files() {
//!         println!("{}", entry.name());
//!     }
//!
//!     if let Some(source) = archive.entry_source("AndroidManifest.xml") {
//!         let bytes = source.read_to_memory().await?;
//!         println!("manifest: {} bytes", bytes.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod error;
pub mod io;
pub mod zip;

pub use archive::dos_time::{DOS_EPOCH_YEAR, datetime_to_dos, dos_to_datetime};
pub use archive::{
    Archive, ArchiveEntry, EntrySource, EntrySourceFactory, InputSource, PathTree,
    build_path_tree,
};
pub use cli::Cli;
pub use error::{ArchiveError, Result};
pub use io::{HttpRangeReader, LocalFileReader, ReadAt, SplitFileReader};
pub use zip::signature::{
    SIGNATURE_SCHEME_V2_ID, SIGNATURE_SCHEME_V3_ID, SignatureBlock, SignaturePair,
    VERITY_PADDING_ID,
};
pub use zip::structures::{CompressionMethod, DEFLATED, STORED};
