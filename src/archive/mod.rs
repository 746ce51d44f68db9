//! The entry catalog and its derived views.
//!
//! An [`Archive`] is built once from a container handle by running the two
//! directory scans, then answers every lookup, iteration and derived-view
//! request from the immutable catalog it produced; the container's
//! directory structures are never re-read.
//!
//! ## Components
//!
//! - [`Archive`]: the orchestrator owning the catalog, the container
//!   handle and the optional signing block
//! - [`ArchiveEntry`]: one cataloged record
//! - [`EntrySource`] / [`InputSource`] / [`EntrySourceFactory`]: on-demand
//!   per-entry sources
//! - [`PathTree`] / [`build_path_tree`]: hierarchical grouping of aliases
//! - [`dos_time`]: the packed date/time codec

pub mod dos_time;
mod entry;
mod path_tree;
mod source;

pub use entry::ArchiveEntry;
pub use path_tree::{PathTree, build_path_tree};
pub use source::{EntrySource, EntrySourceFactory, InputSource};

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::Result;
use crate::io::{HttpRangeReader, LocalFileReader, ReadAt, SplitFileReader};
use crate::zip::local::LocalDirectory;
use crate::zip::parser::DirectoryScanner;
use crate::zip::signature::SignatureBlock;

/// In-memory index over one loaded container.
///
/// Construction runs the central-directory scan and the local-directory
/// scan to completion; afterwards the catalog is fixed for the archive's
/// lifetime. All query operations are pure reads and safe to call
/// concurrently as long as the container handle supports concurrent
/// positioned reads (the handles in this crate do).
#[derive(Debug)]
pub struct Archive<R: ReadAt> {
    reader: Arc<R>,
    entries: Vec<ArchiveEntry>,
    signature_block: Option<SignatureBlock>,
}

impl<R: ReadAt> Archive<R> {
    /// Index the container behind `reader`.
    ///
    /// Performs exactly two passes: the central-directory scan yields the
    /// ordered record list and the directory's byte region, the
    /// local-directory scan validates each record's local header, resolves
    /// payload offsets and recovers the signing block. A structural
    /// failure in either pass aborts construction; the handle passed in is
    /// dropped on that path, so a failed load retains no resource.
    pub async fn load(reader: Arc<R>) -> Result<Self> {
        let central = DirectoryScanner::new(reader.as_ref()).scan().await?;
        let local = LocalDirectory::scan(reader.as_ref(), &central).await?;

        let entries: Vec<ArchiveEntry> = local
            .records
            .into_iter()
            .map(ArchiveEntry::from_resolved)
            .collect();

        debug!(
            entries = entries.len(),
            signed = local.signing_block.is_some(),
            "archive indexed"
        );

        Ok(Self {
            reader,
            entries,
            signature_block: local.signing_block,
        })
    }

    /// Count of all cataloged entries, files and directories alike
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// All entries in discovery order
    pub fn entries(&self) -> impl Iterator<Item = &ArchiveEntry> {
        self.entries.iter()
    }

    /// Entries matching `predicate`, in discovery order.
    ///
    /// Lazy and restartable: every call walks the same immutable catalog
    /// from the start.
    pub fn entries_where<P>(&self, mut predicate: P) -> impl Iterator<Item = &ArchiveEntry>
    where
        P: FnMut(&ArchiveEntry) -> bool,
    {
        self.entries.iter().filter(move |&entry| predicate(entry))
    }

    /// File entries only, in discovery order
    pub fn files(&self) -> impl Iterator<Item = &ArchiveEntry> {
        self.entries_where(ArchiveEntry::is_file)
    }

    /// Source for the file entry named exactly `path`.
    ///
    /// Linear scan over the catalog, skipping directories; the match is
    /// case-sensitive and unnormalized, and the empty path never matches.
    /// Callers doing repeated random lookup should build
    /// [`entry_source_map`](Self::entry_source_map) once instead of
    /// paying this scan per call.
    pub fn entry_source(&self, path: &str) -> Option<EntrySource<R>> {
        if path.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .filter(|entry| entry.is_file())
            .find(|entry| entry.name() == path)
            .map(|entry| self.create_input_source(entry))
    }

    /// Sources for every entry matching `predicate`, in discovery order
    pub fn input_sources<P>(&self, predicate: P) -> Vec<EntrySource<R>>
    where
        P: FnMut(&ArchiveEntry) -> bool,
    {
        self.entries_where(predicate)
            .map(|entry| self.create_input_source(entry))
            .collect()
    }

    /// Sources for every file entry, in discovery order
    pub fn file_sources(&self) -> Vec<EntrySource<R>> {
        self.input_sources(ArchiveEntry::is_file)
    }

    /// Alias-to-source map over the file entries.
    ///
    /// Built fresh on every call; insertion order is file discovery
    /// order. Should two sources ever share an alias, the later one wins.
    pub fn entry_source_map(&self) -> IndexMap<String, EntrySource<R>> {
        let mut map = IndexMap::with_capacity(self.entries.len());
        for entry in self.files() {
            let source = self.create_input_source(entry);
            map.insert(source.alias().to_string(), source);
        }
        map
    }

    /// Hierarchical view of the file sources, grouped by alias path
    pub fn path_tree(&self) -> PathTree<EntrySource<R>> {
        build_path_tree(self.file_sources())
    }

    /// The signing block recovered at load time, if the package carried one
    pub fn signature_block(&self) -> Option<&SignatureBlock> {
        self.signature_block.as_ref()
    }

    /// The underlying container handle
    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }

    /// Release the archive and its hold on the container.
    ///
    /// Dropping the archive is equivalent; this method only makes the
    /// release point explicit. The container itself closes when the last
    /// outstanding [`EntrySource`] clone of the handle is gone, so a
    /// source still being read keeps the container open.
    pub fn close(self) {}
}

impl<R: ReadAt> EntrySourceFactory for Archive<R> {
    type Reader = R;

    fn create_input_source(&self, entry: &ArchiveEntry) -> EntrySource<R> {
        EntrySource::new(Arc::clone(&self.reader), entry.clone())
    }
}

impl Archive<LocalFileReader> {
    /// Open and index a local container file
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::load(Arc::new(LocalFileReader::new(path.as_ref())?)).await
    }
}

impl Archive<HttpRangeReader> {
    /// Index a remote container over HTTP range reads
    pub async fn open_url(url: &str) -> Result<Self> {
        Self::load(Arc::new(HttpRangeReader::new(url.to_string()).await?)).await
    }
}

impl Archive<SplitFileReader> {
    /// Open and index a multi-part container from its part files, in order
    pub async fn open_parts<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        Self::load(Arc::new(SplitFileReader::new(paths)?)).await
    }
}
