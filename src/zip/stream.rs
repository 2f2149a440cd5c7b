//! Trailer discovery and central directory walk over a seekable stream.
//!
//! ## Parsing Strategy
//!
//! A zip64 archive ends with a fixed chain of trailer records:
//!
//! ```text
//! [central file header 1 .. n]
//! [zip64 end of central directory record]
//! [zip64 end of central directory locator]
//! [end of central directory record]
//! ```
//!
//! None of their offsets are known up front. [`ZipStream::read`] walks the
//! chain back to front: the EOCD sits at a fixed distance from the end, the
//! locator immediately before it, and the locator names the absolute offset
//! of the zip64 EOCD. Each record's offsets are bounded by the position of
//! the record found before it, so a corrupt trailer can never send the
//! parser past what it has already seen.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::io::{Read, Seek, SeekFrom};

use tracing::debug;

use super::headers::{CentralFileHeader, LocalFileHeader};
use super::record::Record;
use super::structures::ZipEntry;
use super::trailer::{
    EndCentralDirectoryRecord, Zip64EndOfCentralDirectoryLocator, Zip64EndOfCentralDirectoryRecord,
};
use crate::{Error, Result};

/// Validated anchor for the central directory walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CentralDirectoryLocation {
    /// Offset of the first central file header.
    pub offset: u64,
    /// Size of the central directory in bytes.
    pub size: u64,
    /// Number of central file headers.
    pub entries: u64,
    /// Offset of the zip64 end of central directory record.
    pub trailer_offset: u64,
}

/// ZIP64 archive reader over any `Read + Seek` stream.
///
/// The stream cursor is shared mutable state; one `ZipStream` owns its
/// stream and every operation is a blocking seek and read against it.
pub struct ZipStream<R> {
    reader: R,
    location: Option<CentralDirectoryLocation>,
    contained_files: BTreeMap<String, CentralFileHeader>,
}

impl<R: Read + Seek> ZipStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            location: None,
            contained_files: BTreeMap::new(),
        }
    }

    /// Locate and validate the trailer chain.
    ///
    /// Performs exactly three seek-and-read steps (EOCD, zip64 locator,
    /// zip64 EOCD) and either returns the central directory anchor or the
    /// first violation found. On failure nothing is recorded; on success any
    /// previous central directory walk is discarded.
    ///
    /// # Returns
    ///
    /// The validated [`CentralDirectoryLocation`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the stream is too short or cannot be read,
    /// [`Error::InvalidHeader`] on a signature mismatch, and the matching
    /// `Invalid*` variant for the first trailer constraint violated. A
    /// classic (non-zip64) archive yields
    /// [`Error::InvalidEndOfCentralDirectoryRecord`].
    pub fn read(&mut self) -> Result<CentralDirectoryLocation> {
        let mut eocd = EndCentralDirectoryRecord::new();
        self.reader.seek(SeekFrom::End(-(eocd.size() as i64)))?;
        eocd.read(&mut self.reader)?;

        let eocd_offset = self.reader.stream_position()?.saturating_sub(eocd.size());
        debug!(eocd_offset, "found end of central directory record");

        let mut locator = Zip64EndOfCentralDirectoryLocator::new();
        self.reader
            .seek(SeekFrom::End(-((eocd.size() + locator.size()) as i64)))?;
        locator.read(&mut self.reader, eocd_offset)?;

        let locator_offset = self
            .reader
            .stream_position()?
            .saturating_sub(locator.size());
        debug!(
            locator_offset,
            relative_offset = locator.relative_offset(),
            "found zip64 end of central directory locator"
        );

        let mut record = Zip64EndOfCentralDirectoryRecord::new();
        self.reader
            .seek(SeekFrom::Start(locator.relative_offset()))?;
        record.read(&mut self.reader, locator_offset)?;

        let location = CentralDirectoryLocation {
            offset: record.offset_of_central_directory(),
            size: record.size_of_central_directory(),
            entries: record.total_entries(),
            trailer_offset: locator.relative_offset(),
        };
        debug!(?location, "found zip64 end of central directory record");

        self.location = Some(location);
        self.contained_files.clear();
        Ok(location)
    }

    /// The anchor from the last successful [`read`](Self::read).
    pub fn location(&self) -> Option<CentralDirectoryLocation> {
        self.location
    }

    /// Walk the central directory and build the name to entry map.
    ///
    /// Reads the trailer first if that has not happened yet. Exactly
    /// `entries` headers must fill exactly `size` bytes, ending before the
    /// zip64 EOCD; names must be unique.
    ///
    /// # Errors
    ///
    /// Any error from [`read`](Self::read), [`Error::InvalidCentralDirectory`]
    /// if the headers do not fill the directory exactly, and
    /// [`Error::DuplicateEntry`] if two headers share a name. The previous
    /// map is kept when the walk fails.
    pub fn read_central_directory(&mut self) -> Result<()> {
        let location = match self.location {
            Some(location) => location,
            None => self.read()?,
        };

        let end = location
            .offset
            .checked_add(location.size)
            .filter(|&end| end <= location.trailer_offset)
            .ok_or(Error::InvalidCentralDirectory(
                "central directory overlaps the zip64 trailer",
            ))?;

        self.reader.seek(SeekFrom::Start(location.offset))?;

        let mut files = BTreeMap::new();
        for _ in 0..location.entries {
            let mut header = CentralFileHeader::new();
            header.read(&mut self.reader)?;
            if self.reader.stream_position()? > end {
                return Err(Error::InvalidCentralDirectory(
                    "entry overruns central directory",
                ));
            }

            match files.entry(header.file_name()) {
                btree_map::Entry::Vacant(slot) => {
                    debug!(name = %slot.key(), "found central directory entry");
                    slot.insert(header);
                }
                btree_map::Entry::Occupied(slot) => {
                    return Err(Error::DuplicateEntry(slot.key().clone()));
                }
            }
        }

        if self.reader.stream_position()? != end {
            return Err(Error::InvalidCentralDirectory(
                "central directory size does not match its entries",
            ));
        }

        self.contained_files = files;
        Ok(())
    }

    /// Names from the central directory walk, sorted.
    pub fn file_names(&self) -> Vec<&str> {
        self.contained_files.keys().map(String::as_str).collect()
    }

    /// Central file header for `name`.
    pub fn entry(&self, name: &str) -> Option<&CentralFileHeader> {
        self.contained_files.get(name)
    }

    /// All central file headers, sorted by name.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &CentralFileHeader)> {
        self.contained_files
            .iter()
            .map(|(name, header)| (name.as_str(), header))
    }

    /// Read the local file header of `name`.
    ///
    /// The header must start before the central directory and carry the
    /// same name as the central file header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] if `name` is not in the walked
    /// central directory, [`Error::InvalidCentralDirectory`] if the header
    /// offset or name disagrees with the central directory, and any decode
    /// error of the local header itself.
    pub fn local_header(&mut self, name: &str) -> Result<LocalFileHeader> {
        let (entry, cd_offset) = self.resolve(name)?;
        self.read_local_header(&entry, cd_offset)
    }

    /// Offset where the data of `name` begins, just past its local header.
    ///
    /// # Errors
    ///
    /// Everything [`local_header`](Self::local_header) reports, plus
    /// [`Error::InvalidCentralDirectory`] if the compressed data would run
    /// into the central directory.
    pub fn data_offset(&mut self, name: &str) -> Result<u64> {
        let (entry, cd_offset) = self.resolve(name)?;
        let header = self.read_local_header(&entry, cd_offset)?;

        let data_offset = entry.lfh_offset + header.size();
        match data_offset.checked_add(entry.compressed_size) {
            Some(data_end) if data_end <= cd_offset => Ok(data_offset),
            _ => Err(Error::InvalidCentralDirectory(
                "entry data overruns central directory",
            )),
        }
    }

    /// Get a reference to the underlying stream.
    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    fn resolve(&self, name: &str) -> Result<(ZipEntry, u64)> {
        let header = self
            .contained_files
            .get(name)
            .ok_or_else(|| Error::EntryNotFound(name.to_string()))?;
        let cd_offset = self.location.map_or(0, |location| location.offset);
        Ok((header.entry()?, cd_offset))
    }

    fn read_local_header(&mut self, entry: &ZipEntry, cd_offset: u64) -> Result<LocalFileHeader> {
        if entry.lfh_offset >= cd_offset {
            return Err(Error::InvalidCentralDirectory(
                "local header offset inside central directory",
            ));
        }

        self.reader.seek(SeekFrom::Start(entry.lfh_offset))?;
        let mut header = LocalFileHeader::new();
        header.read(&mut self.reader)?;

        if header.file_name() != entry.file_name {
            debug!(
                central = %entry.file_name,
                local = %header.file_name(),
                "local header name mismatch"
            );
            return Err(Error::InvalidCentralDirectory(
                "local header name differs from central directory",
            ));
        }
        Ok(header)
    }
}
