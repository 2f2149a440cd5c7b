//! Stream sources.
//!
//! The parser works over any [`std::io::Read`] + [`std::io::Seek`] stream;
//! in-memory archives use [`std::io::Cursor`] directly.

mod local;

pub use local::LocalFileReader;
