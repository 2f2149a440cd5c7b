//! Error types for ZIP64 stream parsing.

use thiserror::Error;

/// Errors that can occur while decoding or validating archive records.
///
/// Every structural violation is terminal for the read that produced it.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the underlying stream, including truncated input.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record's leading signature does not match its constant.
    #[error("{record} does not match signature: expected {expected:#010x}, got {actual:#010x}")]
    InvalidHeader {
        record: &'static str,
        expected: u32,
        actual: u32,
    },

    /// A length-governed payload is larger than its length field can describe.
    #[error("{field} exceeds max size: {len} > {max}")]
    FieldOutOfRange {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// A zip64 end of central directory record field failed its constraint.
    #[error("invalid zip64 end of central directory record: {0}")]
    InvalidZip64CentralDirectoryRecord(&'static str),

    /// A zip64 end of central directory locator field failed its constraint.
    #[error("invalid zip64 end of central directory locator: {0}")]
    InvalidZip64CentralDirectoryLocator(&'static str),

    /// An end of central directory record field failed its constraint.
    #[error("invalid end of central directory record: {0}")]
    InvalidEndOfCentralDirectoryRecord(&'static str),

    /// The central directory does not agree with the trailer that anchors it.
    #[error("invalid central directory: {0}")]
    InvalidCentralDirectory(&'static str),

    /// Two central directory entries share a name.
    #[error("duplicate entry in central directory: {0}")]
    DuplicateEntry(String),

    /// No central directory entry has the requested name.
    #[error("entry not found: {0}")]
    EntryNotFound(String),
}

/// Flat classification of [`Error`], without payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Io,
    InvalidHeader,
    FieldOutOfRange,
    InvalidZip64CentralDirectoryRecord,
    InvalidZip64CentralDirectoryLocator,
    InvalidEndOfCentralDirectoryRecord,
    InvalidCentralDirectory,
    DuplicateEntry,
    EntryNotFound,
}

impl Error {
    /// Which structural invariant failed.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::InvalidHeader { .. } => ErrorKind::InvalidHeader,
            Self::FieldOutOfRange { .. } => ErrorKind::FieldOutOfRange,
            Self::InvalidZip64CentralDirectoryRecord(_) => {
                ErrorKind::InvalidZip64CentralDirectoryRecord
            }
            Self::InvalidZip64CentralDirectoryLocator(_) => {
                ErrorKind::InvalidZip64CentralDirectoryLocator
            }
            Self::InvalidEndOfCentralDirectoryRecord(_) => {
                ErrorKind::InvalidEndOfCentralDirectoryRecord
            }
            Self::InvalidCentralDirectory(_) => ErrorKind::InvalidCentralDirectory,
            Self::DuplicateEntry(_) => ErrorKind::DuplicateEntry,
            Self::EntryNotFound(_) => ErrorKind::EntryNotFound,
        }
    }

    /// Returns `true` if the archive was rejected because it is not a
    /// single-disk zip64 archive, as opposed to being corrupt.
    pub fn is_not_zip64(&self) -> bool {
        matches!(self, Self::InvalidEndOfCentralDirectoryRecord(_))
    }
}

/// Result type for ZIP64 stream operations.
pub type Result<T> = std::result::Result<T, Error>;
