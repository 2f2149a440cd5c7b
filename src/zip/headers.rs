//! Per-entry records: local file header, data descriptor and central
//! directory file header.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read, Write};

use super::field::Field;
use super::record::{LengthLink, Record, StructuredObject, accessors, expect_signature};
use super::structures::{CompressionMethod, ZIP64_EXTRA_FIELD_ID, ZipEntry, signature};
use crate::{Error, Result};

/// Local File Header (LFH) - 30 bytes plus name and extra field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileHeader {
    object: StructuredObject,
}

impl LocalFileHeader {
    const FILE_NAME: usize = 11;
    const EXTRA_FIELD: usize = 12;
    const LINKS: &'static [LengthLink] = &[
        LengthLink::u16(9, Self::FILE_NAME, "file name"),
        LengthLink::u16(10, Self::EXTRA_FIELD, "extra field"),
    ];

    pub fn new() -> Self {
        let object = StructuredObject::new(
            vec![
                Field::U32(signature::LOCAL_FILE_HEADER),
                Field::U16(0), // version needed to extract
                Field::U16(0), // general purpose bit flag
                Field::U16(0), // compression method
                Field::U16(0), // last mod file time
                Field::U16(0), // last mod file date
                Field::U32(0), // crc-32
                Field::U32(0), // compressed size
                Field::U32(0), // uncompressed size
                Field::U16(0), // file name length
                Field::U16(0), // extra field length
                Field::bytes(),
                Field::bytes(),
            ],
            Self::LINKS,
        );
        Self { object }
    }

    /// Decode from the reader's current position.
    pub fn read<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        self.object.read(reader, |ctx| match ctx.index() {
            0 => expect_signature(ctx, Self::NAME, signature::LOCAL_FILE_HEADER),
            _ => Ok(()),
        })
    }

    accessors! {
        1 => version_needed, set_version_needed: u16;
        2 => flags, set_flags: u16;
        3 => compression_method, set_compression_method: u16;
        4 => last_mod_time, set_last_mod_time: u16;
        5 => last_mod_date, set_last_mod_date: u16;
        6 => crc32, set_crc32: u32;
        7 => compressed_size, set_compressed_size: u32;
        8 => uncompressed_size, set_uncompressed_size: u32;
    }

    pub fn file_name_length(&self) -> u16 {
        self.object.get(9)
    }

    pub fn extra_field_length(&self) -> u16 {
        self.object.get(10)
    }

    /// File name, with invalid UTF-8 replaced.
    pub fn file_name(&self) -> String {
        String::from_utf8_lossy(self.object.bytes(Self::FILE_NAME)).into_owned()
    }

    pub fn set_file_name(&mut self, name: &str) -> Result<()> {
        self.object
            .set_payload(Self::FILE_NAME, name.as_bytes().to_vec())
    }

    pub fn extra_field(&self) -> &[u8] {
        self.object.bytes(Self::EXTRA_FIELD)
    }

    pub fn set_extra_field(&mut self, extra: Vec<u8>) -> Result<()> {
        self.object.set_payload(Self::EXTRA_FIELD, extra)
    }
}

impl Default for LocalFileHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl Record for LocalFileHeader {
    const NAME: &'static str = "local file header";

    fn object(&self) -> &StructuredObject {
        &self.object
    }
}

/// Data descriptor trailing an entry's data when bit 3 of its flags is set.
///
/// The descriptor itself has no signature field; [`read_signed`](Self::read_signed)
/// handles the optional leading signature most writers emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDescriptor {
    object: StructuredObject,
}

impl DataDescriptor {
    pub fn new() -> Self {
        let object = StructuredObject::new(
            vec![
                Field::U32(0), // crc-32
                Field::U32(0), // compressed size
                Field::U32(0), // uncompressed size
            ],
            &[],
        );
        Self { object }
    }

    /// Decode an unsigned descriptor from the reader's current position.
    pub fn read<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        self.object.read(reader, |_| Ok(()))
    }

    /// Decode a descriptor preceded by its `0x08074b50` signature.
    pub fn read_signed<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        let actual = reader.read_u32::<LittleEndian>()?;
        if actual != signature::DATA_DESCRIPTOR {
            return Err(Error::InvalidHeader {
                record: Self::NAME,
                expected: signature::DATA_DESCRIPTOR,
                actual,
            });
        }
        self.read(reader)
    }

    /// Encode with the leading signature.
    pub fn write_signed<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LittleEndian>(signature::DATA_DESCRIPTOR)?;
        self.write(writer)
    }

    accessors! {
        0 => crc32, set_crc32: u32;
        1 => compressed_size, set_compressed_size: u32;
        2 => uncompressed_size, set_uncompressed_size: u32;
    }
}

impl Default for DataDescriptor {
    fn default() -> Self {
        Self::new()
    }
}

impl Record for DataDescriptor {
    const NAME: &'static str = "data descriptor";

    fn object(&self) -> &StructuredObject {
        &self.object
    }
}

/// Central Directory File Header (CDFH) - 46 bytes plus name, extra field
/// and comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralFileHeader {
    object: StructuredObject,
}

impl CentralFileHeader {
    const FILE_NAME: usize = 17;
    const EXTRA_FIELD: usize = 18;
    const COMMENT: usize = 19;
    const LINKS: &'static [LengthLink] = &[
        LengthLink::u16(10, Self::FILE_NAME, "file name"),
        LengthLink::u16(11, Self::EXTRA_FIELD, "extra field"),
        LengthLink::u16(12, Self::COMMENT, "file comment"),
    ];

    pub fn new() -> Self {
        let object = StructuredObject::new(
            vec![
                Field::U32(signature::CENTRAL_FILE_HEADER),
                Field::U16(0), // version made by
                Field::U16(0), // version needed to extract
                Field::U16(0), // general purpose bit flag
                Field::U16(0), // compression method
                Field::U16(0), // last mod file time
                Field::U16(0), // last mod file date
                Field::U32(0), // crc-32
                Field::U32(0), // compressed size
                Field::U32(0), // uncompressed size
                Field::U16(0), // file name length
                Field::U16(0), // extra field length
                Field::U16(0), // file comment length
                Field::U16(0), // disk number start
                Field::U16(0), // internal file attributes
                Field::U32(0), // external file attributes
                Field::U32(0), // relative offset of local header
                Field::bytes(),
                Field::bytes(),
                Field::bytes(),
            ],
            Self::LINKS,
        );
        Self { object }
    }

    /// Decode from the reader's current position.
    pub fn read<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        self.object.read(reader, |ctx| match ctx.index() {
            0 => expect_signature(ctx, Self::NAME, signature::CENTRAL_FILE_HEADER),
            _ => Ok(()),
        })
    }

    accessors! {
        0 => signature, set_signature: u32;
        1 => version_made_by, set_version_made_by: u16;
        2 => version_needed, set_version_needed: u16;
        3 => flags, set_flags: u16;
        4 => compression_method, set_compression_method: u16;
        5 => last_mod_time, set_last_mod_time: u16;
        6 => last_mod_date, set_last_mod_date: u16;
        7 => crc32, set_crc32: u32;
        8 => compressed_size, set_compressed_size: u32;
        9 => uncompressed_size, set_uncompressed_size: u32;
        13 => disk_number_start, set_disk_number_start: u16;
        14 => internal_attributes, set_internal_attributes: u16;
        15 => external_attributes, set_external_attributes: u32;
        16 => relative_offset_of_local_header, set_relative_offset_of_local_header: u32;
    }

    pub fn file_name_length(&self) -> u16 {
        self.object.get(10)
    }

    pub fn extra_field_length(&self) -> u16 {
        self.object.get(11)
    }

    pub fn comment_length(&self) -> u16 {
        self.object.get(12)
    }

    /// File name, with invalid UTF-8 replaced.
    pub fn file_name(&self) -> String {
        String::from_utf8_lossy(self.object.bytes(Self::FILE_NAME)).into_owned()
    }

    pub fn set_file_name(&mut self, name: &str) -> Result<()> {
        self.object
            .set_payload(Self::FILE_NAME, name.as_bytes().to_vec())
    }

    pub fn extra_field(&self) -> &[u8] {
        self.object.bytes(Self::EXTRA_FIELD)
    }

    pub fn set_extra_field(&mut self, extra: Vec<u8>) -> Result<()> {
        self.object.set_payload(Self::EXTRA_FIELD, extra)
    }

    pub fn comment(&self) -> &[u8] {
        self.object.bytes(Self::COMMENT)
    }

    pub fn set_comment(&mut self, comment: Vec<u8>) -> Result<()> {
        self.object.set_payload(Self::COMMENT, comment)
    }

    /// Resolve the entry, taking 64-bit sizes and offset from the zip64
    /// extended information extra field wherever the 32-bit field holds
    /// the `0xFFFFFFFF` sentinel.
    pub fn entry(&self) -> Result<ZipEntry> {
        let mut uncompressed_size = Zip64Value::new(self.uncompressed_size());
        let mut compressed_size = Zip64Value::new(self.compressed_size());
        let mut lfh_offset = Zip64Value::new(self.relative_offset_of_local_header());

        let extra = self.extra_field();
        let mut cursor = Cursor::new(extra);
        while cursor.position() + 4 <= extra.len() as u64 {
            let header_id = cursor.read_u16::<LittleEndian>()?;
            let field_size = cursor.read_u16::<LittleEndian>()? as u64;
            let field_end = cursor.position() + field_size;
            if field_end > extra.len() as u64 {
                return Err(Error::InvalidCentralDirectory("truncated extra field"));
            }

            if header_id == ZIP64_EXTRA_FIELD_ID {
                // Values appear in this fixed order, each only if its
                // header field holds the sentinel.
                for value in [&mut uncompressed_size, &mut compressed_size, &mut lfh_offset] {
                    if value.needs_zip64() && cursor.position() + 8 <= field_end {
                        value.resolve(cursor.read_u64::<LittleEndian>()?);
                    }
                }
            }
            cursor.set_position(field_end);
        }

        let file_name = self.file_name();
        Ok(ZipEntry {
            is_directory: file_name.ends_with('/'),
            file_name,
            compression_method: CompressionMethod::from_u16(self.compression_method()),
            compressed_size: compressed_size.get()?,
            uncompressed_size: uncompressed_size.get()?,
            crc32: self.crc32(),
            lfh_offset: lfh_offset.get()?,
            last_mod_time: self.last_mod_time(),
            last_mod_date: self.last_mod_date(),
        })
    }
}

impl Default for CentralFileHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl Record for CentralFileHeader {
    const NAME: &'static str = "central file header";

    fn object(&self) -> &StructuredObject {
        &self.object
    }
}

/// A 32-bit header value that may defer to the zip64 extra field.
struct Zip64Value {
    value: u64,
    pending: bool,
}

impl Zip64Value {
    fn new(value: u32) -> Self {
        Self {
            value: value.into(),
            pending: value == u32::MAX,
        }
    }

    fn needs_zip64(&self) -> bool {
        self.pending
    }

    fn resolve(&mut self, value: u64) {
        self.value = value;
        self.pending = false;
    }

    fn get(&self) -> Result<u64> {
        if self.pending {
            return Err(Error::InvalidCentralDirectory(
                "missing zip64 extended information",
            ));
        }
        Ok(self.value)
    }
}
