//! # zipstream
//!
//! Streaming parser for the trailer structures of ZIP64 archives.
//!
//! This library locates and cross-validates the end of central directory
//! record, the zip64 locator and the zip64 end of central directory record
//! by seeking backward from the end of a stream, rejecting truncated,
//! corrupted or deliberately malformed archives before any entry data is
//! touched. Only the records themselves are read; the archive is never
//! loaded into memory.
//!
//! ## Features
//!
//! - Declarative record layouts over a small field framework
//! - Bounded trailer discovery: every offset is checked against what has
//!   already been read
//! - Central directory walk with zip64 extended information
//! - Typed errors distinguishing non-zip64, corrupt and out-of-range input
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use zipstream::{LocalFileReader, ZipStream};
//!
//! fn main() -> zipstream::Result<()> {
//!     let reader = LocalFileReader::open(Path::new("package.appx"))?;
//!     let mut zip = ZipStream::new(reader);
//!
//!     let location = zip.read()?;
//!     println!("central directory at {} ({} bytes)", location.offset, location.size);
//!
//!     zip.read_central_directory()?;
//!     for name in zip.file_names() {
//!         println!("{name}");
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
mod error;
pub mod io;
pub mod zip;

pub use cli::Cli;
pub use error::{Error, ErrorKind, Result};
pub use io::LocalFileReader;
pub use zip::{CentralDirectoryLocation, ZipEntry, ZipStream};
