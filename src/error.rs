//! Error types for container loading and entry access.

use thiserror::Error;

/// Result type for archive operations
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Errors surfaced while scanning a container or reading entry data.
///
/// Construction of an [`Archive`](crate::Archive) fails with one of the
/// structural variants below; once an archive is loaded, catalog reads
/// cannot fail and only entry-data access can produce errors.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// IO error from the underlying container handle
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error from a remote container handle
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote server answered with an unexpected status
    #[error("HTTP request failed with status: {0}")]
    HttpStatus(reqwest::StatusCode),

    /// Remote server cannot serve ranged reads
    #[error("remote server does not support Range requests")]
    RangeUnsupported,

    /// Ran out of retries against a flaky remote container
    #[error("max retries exceeded reading remote container")]
    RetriesExhausted,

    /// No end of central directory record in the container
    #[error("not a ZIP container: end of central directory not found")]
    MissingEndOfCentralDirectory,

    /// A directory structure carried the wrong magic bytes
    #[error("invalid {0} signature")]
    BadSignature(&'static str),

    /// A positioned read came back smaller than the structure needs
    #[error("truncated container: wanted {wanted} bytes at offset {offset:#x}, got {got}")]
    ShortRead {
        offset: u64,
        wanted: usize,
        got: usize,
    },

    /// Central directory ended before the record count announced by the
    /// end-of-central-directory record was reached
    #[error("truncated central directory: expected {expected} records, parsed {parsed}")]
    TruncatedCentralDirectory { expected: u64, parsed: u64 },

    /// Signing block magic found but the frame does not hold together
    #[error("malformed signing block: {0}")]
    MalformedSigningBlock(&'static str),

    /// Entry is compressed with a method this crate does not decode
    #[error("unsupported compression method: {0}")]
    UnsupportedMethod(u16),

    /// Split container opened with no part files
    #[error("split container needs at least one part")]
    EmptySplit,
}
