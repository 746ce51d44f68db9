//! End-to-end archive tests over hand-built container images.

mod common;

use std::io::Write;
use std::sync::Arc;

use apkcat::{
    Archive, ArchiveError, InputSource, SIGNATURE_SCHEME_V2_ID, SIGNATURE_SCHEME_V3_ID,
    VERITY_PADDING_ID, build_path_tree,
};
use common::{FIXTURE_STAMP, MemReader, ZipImageBuilder};

fn three_entry_image() -> Vec<u8> {
    ZipImageBuilder::new()
        .file("a.txt", b"alpha")
        .dir("dir/")
        .file("dir/b.txt", b"bravo")
        .build()
}

async fn load(image: Vec<u8>) -> Archive<MemReader> {
    Archive::load(Arc::new(MemReader(image))).await.unwrap()
}

#[tokio::test]
async fn catalog_preserves_discovery_order() {
    let archive = load(three_entry_image()).await;

    assert_eq!(archive.size(), 3);
    assert_eq!(archive.entries_where(|_| true).count(), 3);

    let names: Vec<&str> = archive.entries().map(|e| e.name()).collect();
    assert_eq!(names, ["a.txt", "dir/", "dir/b.txt"]);

    let files: Vec<&str> = archive.files().map(|e| e.name()).collect();
    assert_eq!(files, ["a.txt", "dir/b.txt"]);

    for entry in archive.entries() {
        assert_ne!(entry.is_file(), entry.is_directory());
    }
}

#[tokio::test]
async fn iteration_is_restartable() {
    let archive = load(three_entry_image()).await;

    let first: Vec<String> = archive.files().map(|e| e.name().to_string()).collect();
    let second: Vec<String> = archive.files().map(|e| e.name().to_string()).collect();
    assert_eq!(first, second);
}

#[tokio::test]
async fn entry_source_is_exact_match_only() {
    let archive = load(three_entry_image()).await;

    let source = archive.entry_source("dir/b.txt").unwrap();
    assert_eq!(source.alias(), "dir/b.txt");
    assert_eq!(source.read_to_memory().await.unwrap(), b"bravo");

    assert!(archive.entry_source("").is_none());
    assert!(archive.entry_source("A.TXT").is_none());
    assert!(archive.entry_source("a.txt/").is_none());
    assert!(archive.entry_source("dir").is_none());
    // Directory entries are skipped even on a literal name match
    assert!(archive.entry_source("dir/").is_none());
}

#[tokio::test]
async fn entry_source_map_mirrors_files() {
    let archive = load(three_entry_image()).await;

    let map = archive.entry_source_map();
    assert_eq!(map.len(), archive.files().count());

    let keys: Vec<&str> = map.keys().map(String::as_str).collect();
    assert_eq!(keys, ["a.txt", "dir/b.txt"]);
}

#[tokio::test]
async fn duplicate_aliases_last_wins() {
    let image = ZipImageBuilder::new()
        .file("same.txt", b"first")
        .file("same.txt", b"second")
        .build();
    let archive = load(image).await;

    // Both records are cataloged; the map collapses them, keeping the later
    assert_eq!(archive.size(), 2);
    let map = archive.entry_source_map();
    assert_eq!(map.len(), 1);
    let data = map["same.txt"].read_to_memory().await.unwrap();
    assert_eq!(data, b"second");
}

#[tokio::test]
async fn path_tree_groups_file_sources() {
    let archive = load(three_entry_image()).await;
    let tree = build_path_tree(archive.file_sources());

    let leaf = tree.child("a.txt").unwrap();
    assert!(leaf.is_leaf());
    assert_eq!(leaf.value().unwrap().alias(), "a.txt");

    let dir = tree.child("dir").unwrap();
    assert!(dir.value().is_none());
    let nested = dir.child("b.txt").unwrap();
    assert_eq!(nested.value().unwrap().alias(), "dir/b.txt");

    // Convenience accessor builds the same shape
    assert_eq!(archive.path_tree().child_count(), tree.child_count());
}

#[tokio::test]
async fn deflate_payloads_inflate() {
    let body = b"pack my box with five dozen liquor jugs".repeat(20);
    let image = ZipImageBuilder::new()
        .deflate_file("res/big.txt", &body)
        .build();
    let archive = load(image).await;

    let entry = archive.entries().next().unwrap();
    assert!(entry.compressed_size() < entry.uncompressed_size());

    let source = archive.entry_source("res/big.txt").unwrap();
    assert_eq!(source.read_to_memory().await.unwrap(), body);
}

#[tokio::test]
async fn fixture_stamp_decodes_on_entries() {
    let archive = load(three_entry_image()).await;
    let entry = archive.entries().next().unwrap();

    assert_eq!(entry.dos_datetime(), FIXTURE_STAMP);
    assert_eq!(entry.modified().to_string(), "2021-07-15 10:30:44");
}

#[tokio::test]
async fn signing_block_is_recovered() {
    let image = ZipImageBuilder::new()
        .file("a.txt", b"alpha")
        .signing_block(vec![
            (SIGNATURE_SCHEME_V2_ID, b"v2-sig".to_vec()),
            (VERITY_PADDING_ID, vec![0u8; 7]),
        ])
        .build();
    let archive = load(image).await;

    let block = archive.signature_block().unwrap();
    assert_eq!(block.pairs().len(), 2);
    assert!(block.has_scheme_v2());
    assert!(!block.has_scheme_v3());
    assert_eq!(block.pair(SIGNATURE_SCHEME_V2_ID).unwrap(), b"v2-sig");
    assert!(block.pair(SIGNATURE_SCHEME_V3_ID).is_none());

    // The block sits directly below the central directory
    assert!(block.offset() > 0);
    assert!(block.size() > 24);
}

#[tokio::test]
async fn unsigned_archive_has_no_block() {
    let archive = load(three_entry_image()).await;
    assert!(archive.signature_block().is_none());
}

#[tokio::test]
async fn empty_archive_is_valid() {
    let archive = load(ZipImageBuilder::new().build()).await;
    assert_eq!(archive.size(), 0);
    assert_eq!(archive.files().count(), 0);
    assert!(archive.entry_source_map().is_empty());
    assert!(archive.signature_block().is_none());
}

#[tokio::test]
async fn trailing_comment_is_tolerated() {
    let image = ZipImageBuilder::new()
        .file("a.txt", b"alpha")
        .comment(b"built by a test")
        .build();
    let archive = load(image).await;
    assert_eq!(archive.size(), 1);
}

#[tokio::test]
async fn truncated_central_directory_fails_to_load() {
    let image = ZipImageBuilder::new()
        .file("a.txt", b"alpha")
        .file("b.txt", b"bravo")
        .file("c.txt", b"charlie")
        .build_truncated();

    let err = Archive::load(Arc::new(MemReader(image))).await.unwrap_err();
    assert!(matches!(
        err,
        ArchiveError::ShortRead { .. } | ArchiveError::TruncatedCentralDirectory { .. }
    ));
}

#[tokio::test]
async fn garbage_is_not_a_container() {
    let err = Archive::load(Arc::new(MemReader(vec![0x42; 4096])))
        .await
        .unwrap_err();
    assert!(matches!(err, ArchiveError::MissingEndOfCentralDirectory));
}

#[tokio::test]
async fn local_file_archive_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixture.apk");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(&three_entry_image())
        .unwrap();

    let archive = Archive::open(&path).await.unwrap();
    assert_eq!(archive.size(), 3);
    let data = archive
        .entry_source("a.txt")
        .unwrap()
        .read_to_memory()
        .await
        .unwrap();
    assert_eq!(data, b"alpha");
    archive.close();
}

#[tokio::test]
async fn split_container_indexes_like_flat() {
    let image = three_entry_image();

    // Spread the image over three uneven parts
    let dir = tempfile::tempdir().unwrap();
    let cuts = [image.len() / 3, 2 * image.len() / 3, image.len()];
    let mut start = 0usize;
    let mut paths = Vec::new();
    for (i, cut) in cuts.into_iter().enumerate() {
        let path = dir.path().join(format!("fixture.z{:02}", i + 1));
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&image[start..cut])
            .unwrap();
        paths.push(path);
        start = cut;
    }

    let archive = Archive::open_parts(&paths).await.unwrap();
    assert_eq!(archive.size(), 3);

    let names: Vec<&str> = archive.files().map(|e| e.name()).collect();
    assert_eq!(names, ["a.txt", "dir/b.txt"]);

    let data = archive
        .entry_source("dir/b.txt")
        .unwrap()
        .read_to_memory()
        .await
        .unwrap();
    assert_eq!(data, b"bravo");
}
