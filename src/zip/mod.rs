//! ZIP64 archive trailer parsing.
//!
//! This module decodes and validates the records of a zip64 archive directly
//! from a seekable stream, without reading the whole archive into memory.
//!
//! ## Architecture
//!
//! - [`field`]: Binary slots (2, 4 or 8 byte scalars, variable byte blocks)
//! - [`record`]: The generic record framework records are declared with
//! - [`headers`]: Local file header, data descriptor, central file header
//! - [`trailer`]: EOCD, zip64 locator and zip64 EOCD, with their constraints
//! - [`stream`]: Trailer discovery and the central directory walk
//!
//! ## Supported Features
//!
//! - Single-disk zip64 archives whose EOCD carries the overflow sentinels
//! - ZIP64 extended information extra fields
//!
//! ## Limitations
//!
//! - No multi-disk archives
//! - No classic 32-bit archives
//! - No archive comments or zip64 extensible data
//! - No decompression

pub mod field;
pub mod headers;
pub mod record;
pub mod stream;
mod structures;
pub mod trailer;

pub use field::{Field, Scalar};
pub use headers::{CentralFileHeader, DataDescriptor, LocalFileHeader};
pub use record::{DecodeContext, LengthLink, Record, StructuredObject};
pub use stream::{CentralDirectoryLocation, ZipStream};
pub use structures::*;
pub use trailer::{
    EndCentralDirectoryRecord, Zip64EndOfCentralDirectoryLocator, Zip64EndOfCentralDirectoryRecord,
};
