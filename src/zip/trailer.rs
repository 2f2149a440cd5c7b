//! Trailer records: end of central directory, zip64 locator and zip64 end
//! of central directory.
//!
//! Only single-disk zip64 archives without comments are accepted, so the
//! classic EOCD must carry the zip64 overflow sentinels in every count,
//! size and offset field.

use std::io::Read;

use super::field::Field;
use super::record::{LengthLink, Record, StructuredObject, expect_signature};
use super::structures::{ZIP64_MINIMUM_VERSION, signature};
use crate::{Error, Result};

/// End of Central Directory (EOCD) - 22 bytes, no comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndCentralDirectoryRecord {
    object: StructuredObject,
}

impl EndCentralDirectoryRecord {
    const LINKS: &'static [LengthLink] = &[LengthLink::u16(7, 8, "archive comment")];

    /// Canonical zip64 EOCD: zero disks, all-ones counts, no comment.
    pub fn new() -> Self {
        let object = StructuredObject::new(
            vec![
                Field::U32(signature::END_OF_CENTRAL_DIRECTORY),
                Field::U16(0),        // number of this disk
                Field::U16(0),        // disk with start of central directory
                Field::U16(u16::MAX), // entries on this disk
                Field::U16(u16::MAX), // total entries
                Field::U32(u32::MAX), // size of central directory
                Field::U32(u32::MAX), // offset of central directory
                Field::U16(0),        // comment length
                Field::bytes(),
            ],
            Self::LINKS,
        );
        Self { object }
    }

    /// Decode and validate from the reader's current position.
    pub fn read<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        let invalid = Error::InvalidEndOfCentralDirectoryRecord;
        self.object.read(reader, |ctx| match ctx.index() {
            0 => expect_signature(ctx, Self::NAME, signature::END_OF_CENTRAL_DIRECTORY),
            1 if ctx.value::<u16>() != 0 => Err(invalid("unsupported disk number")),
            2 if ctx.value::<u16>() != 0 => Err(invalid("unsupported central directory disk")),
            3 if ctx.value::<u16>() != u16::MAX => {
                Err(invalid("unsupported number of entries on this disk"))
            }
            4 if ctx.value::<u16>() != u16::MAX => Err(invalid("unsupported total number of entries")),
            5 if ctx.value::<u32>() != u32::MAX => {
                Err(invalid("unsupported size of central directory"))
            }
            6 if ctx.value::<u32>() != u32::MAX => {
                Err(invalid("unsupported offset of central directory"))
            }
            7 if ctx.value::<u16>() != 0 => Err(invalid("archive comment unsupported")),
            8 if !ctx.bytes().is_empty() => Err(invalid("archive comment unsupported")),
            _ => Ok(()),
        })
    }

    pub fn disk_number(&self) -> u16 {
        self.object.get(1)
    }

    pub fn disk_with_central_directory(&self) -> u16 {
        self.object.get(2)
    }

    pub fn entries_this_disk(&self) -> u16 {
        self.object.get(3)
    }

    pub fn total_entries(&self) -> u16 {
        self.object.get(4)
    }

    pub fn size_of_central_directory(&self) -> u32 {
        self.object.get(5)
    }

    pub fn offset_of_central_directory(&self) -> u32 {
        self.object.get(6)
    }

    pub fn comment_length(&self) -> u16 {
        self.object.get(7)
    }
}

impl Default for EndCentralDirectoryRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl Record for EndCentralDirectoryRecord {
    const NAME: &'static str = "end of central directory record";

    fn object(&self) -> &StructuredObject {
        &self.object
    }
}

/// ZIP64 End of Central Directory Locator - 20 bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zip64EndOfCentralDirectoryLocator {
    object: StructuredObject,
}

impl Zip64EndOfCentralDirectoryLocator {
    pub fn new() -> Self {
        let object = StructuredObject::new(
            vec![
                Field::U32(signature::ZIP64_END_OF_CD_LOCATOR),
                Field::U32(0), // disk with zip64 EOCD
                Field::U64(0), // relative offset of zip64 EOCD
                Field::U32(1), // total number of disks
            ],
            &[],
        );
        Self { object }
    }

    /// Decode and validate from the reader's current position.
    ///
    /// `max_offset` bounds the relative offset: the zip64 EOCD it points
    /// at must start no later than this.
    pub fn read<R: Read>(&mut self, reader: &mut R, max_offset: u64) -> Result<()> {
        let invalid = Error::InvalidZip64CentralDirectoryLocator;
        self.object.read(reader, |ctx| match ctx.index() {
            0 => expect_signature(ctx, Self::NAME, signature::ZIP64_END_OF_CD_LOCATOR),
            1 if ctx.value::<u32>() != 0 => Err(invalid("invalid disk number")),
            2 if ctx.value::<u64>() > max_offset => Err(invalid("invalid relative offset")),
            3 if ctx.value::<u32>() != 1 => Err(invalid("invalid total number of disks")),
            _ => Ok(()),
        })
    }

    pub fn disk_number(&self) -> u32 {
        self.object.get(1)
    }

    /// Absolute offset of the zip64 EOCD from the start of the stream.
    pub fn relative_offset(&self) -> u64 {
        self.object.get(2)
    }

    pub fn set_relative_offset(&mut self, value: u64) {
        self.object.set(2, value)
    }

    pub fn total_disks(&self) -> u32 {
        self.object.get(3)
    }
}

impl Default for Zip64EndOfCentralDirectoryLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Record for Zip64EndOfCentralDirectoryLocator {
    const NAME: &'static str = "zip64 end of central directory locator";

    fn object(&self) -> &StructuredObject {
        &self.object
    }
}

/// ZIP64 End of Central Directory - 56 bytes, no extensible data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zip64EndOfCentralDirectoryRecord {
    object: StructuredObject,
}

impl Zip64EndOfCentralDirectoryRecord {
    /// Bytes not counted by the record size field: signature and the
    /// size field itself.
    const LEADING_BYTES: u64 = 12;

    pub fn new() -> Self {
        let mut object = StructuredObject::new(
            vec![
                Field::U32(signature::ZIP64_END_OF_CD),
                Field::U64(0), // size of this record
                Field::U16(ZIP64_MINIMUM_VERSION),
                Field::U16(ZIP64_MINIMUM_VERSION),
                Field::U32(0), // number of this disk
                Field::U32(0), // disk with start of central directory
                Field::U64(0), // entries on this disk
                Field::U64(0), // total entries
                Field::U64(0), // size of central directory
                Field::U64(0), // offset of central directory
                Field::bytes(),
            ],
            &[],
        );
        let record_size = object.size() - Self::LEADING_BYTES;
        object.set(1, record_size);
        Self { object }
    }

    /// Decode and validate from the reader's current position.
    ///
    /// `max_offset` bounds both the central directory size and offset,
    /// neither of which may reach past the start of the locator.
    pub fn read<R: Read>(&mut self, reader: &mut R, max_offset: u64) -> Result<()> {
        let invalid = Error::InvalidZip64CentralDirectoryRecord;
        self.object.read(reader, |ctx| match ctx.index() {
            0 => expect_signature(ctx, Self::NAME, signature::ZIP64_END_OF_CD),
            1 if ctx.value::<u64>() != ctx.record_size() - Self::LEADING_BYTES => {
                Err(invalid("invalid size of zip64 EOCD"))
            }
            2 if ctx.value::<u16>() != ZIP64_MINIMUM_VERSION => {
                Err(invalid("invalid version made by"))
            }
            3 if ctx.value::<u16>() != ZIP64_MINIMUM_VERSION => {
                Err(invalid("invalid version needed to extract"))
            }
            4 if ctx.value::<u32>() != 0 => Err(invalid("invalid disk number")),
            5 if ctx.value::<u32>() != 0 => Err(invalid("invalid disk index")),
            6 if ctx.value::<u64>() == 0 => Err(invalid("invalid number of entries")),
            7 if ctx.value::<u64>() != ctx.get::<u64>(6) => {
                Err(invalid("invalid total number of entries"))
            }
            8 if !(1..=max_offset).contains(&ctx.value::<u64>()) => {
                Err(invalid("invalid size of central directory"))
            }
            9 if !(1..=max_offset).contains(&ctx.value::<u64>()) => {
                Err(invalid("invalid start of central directory"))
            }
            10 if !ctx.bytes().is_empty() => Err(invalid("unsupported extensible data")),
            _ => Ok(()),
        })
    }

    pub fn record_size(&self) -> u64 {
        self.object.get(1)
    }

    pub fn version_made_by(&self) -> u16 {
        self.object.get(2)
    }

    pub fn version_needed(&self) -> u16 {
        self.object.get(3)
    }

    pub fn total_entries(&self) -> u64 {
        self.object.get(7)
    }

    /// Sets both the per-disk and total entry counts.
    pub fn set_total_entries(&mut self, value: u64) {
        self.object.set(6, value);
        self.object.set(7, value);
    }

    pub fn size_of_central_directory(&self) -> u64 {
        self.object.get(8)
    }

    pub fn set_size_of_central_directory(&mut self, value: u64) {
        self.object.set(8, value)
    }

    pub fn offset_of_central_directory(&self) -> u64 {
        self.object.get(9)
    }

    pub fn set_offset_of_central_directory(&mut self, value: u64) {
        self.object.set(9, value)
    }
}

impl Default for Zip64EndOfCentralDirectoryRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl Record for Zip64EndOfCentralDirectoryRecord {
    const NAME: &'static str = "zip64 end of central directory record";

    fn object(&self) -> &StructuredObject {
        &self.object
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use std::io::Cursor;

    fn encode<T: Record>(record: &T) -> Vec<u8> {
        let mut out = Vec::new();
        record.write(&mut out).unwrap();
        out
    }

    fn zip64_eocd() -> Zip64EndOfCentralDirectoryRecord {
        let mut record = Zip64EndOfCentralDirectoryRecord::new();
        record.set_total_entries(1);
        record.set_size_of_central_directory(51);
        record.set_offset_of_central_directory(40);
        record
    }

    fn read_zip64_eocd(record: &Zip64EndOfCentralDirectoryRecord, max_offset: u64) -> Result<()> {
        Zip64EndOfCentralDirectoryRecord::new().read(&mut Cursor::new(encode(record)), max_offset)
    }

    #[test]
    fn test_eocd_defaults_are_zip64_sentinels() {
        let eocd = EndCentralDirectoryRecord::new();
        let bytes = encode(&eocd);
        assert_eq!(bytes.len(), 22);
        assert_eq!(&bytes[..4], b"PK\x05\x06");
        assert_eq!(&bytes[8..20], &[0xFF; 12]);
        assert_eq!(&bytes[20..], &[0, 0]);

        let mut decoded = EndCentralDirectoryRecord::new();
        decoded.read(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(decoded, eocd);
        assert_eq!(decoded.total_entries(), u16::MAX);
    }

    #[test]
    fn test_eocd_rejects_real_counts() {
        for (index, value) in [(3, 1u64), (4, 1), (5, 51), (6, 40)] {
            let mut eocd = EndCentralDirectoryRecord::new();
            match index {
                3 | 4 => eocd.object.set(index, value as u16),
                _ => eocd.object.set(index, value as u32),
            }
            let err = EndCentralDirectoryRecord::new()
                .read(&mut Cursor::new(encode(&eocd)))
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidEndOfCentralDirectoryRecord);
            assert!(err.is_not_zip64());
        }
    }

    #[test]
    fn test_eocd_rejects_disks_and_comment() {
        let mut eocd = EndCentralDirectoryRecord::new();
        eocd.object.set(1, 1u16);
        let err = EndCentralDirectoryRecord::new()
            .read(&mut Cursor::new(encode(&eocd)))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidEndOfCentralDirectoryRecord);

        let mut eocd = EndCentralDirectoryRecord::new();
        eocd.object.set_payload(8, b"hello".to_vec()).unwrap();
        assert_eq!(eocd.comment_length(), 5);
        let err = EndCentralDirectoryRecord::new()
            .read(&mut Cursor::new(encode(&eocd)))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidEndOfCentralDirectoryRecord);
    }

    #[test]
    fn test_eocd_bad_signature() {
        let mut bytes = encode(&EndCentralDirectoryRecord::new());
        bytes[3] = 0x05;
        let err = EndCentralDirectoryRecord::new()
            .read(&mut Cursor::new(bytes))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidHeader);
    }

    #[test]
    fn test_locator_bounds() {
        let mut locator = Zip64EndOfCentralDirectoryLocator::new();
        locator.set_relative_offset(91);
        let bytes = encode(&locator);
        assert_eq!(bytes.len(), 20);

        let mut decoded = Zip64EndOfCentralDirectoryLocator::new();
        decoded.read(&mut Cursor::new(&bytes), 91).unwrap();
        assert_eq!(decoded, locator);
        assert_eq!(decoded.size(), locator.size());
        assert_eq!(decoded.relative_offset(), 91);
        assert_eq!(decoded.total_disks(), 1);

        let err = Zip64EndOfCentralDirectoryLocator::new()
            .read(&mut Cursor::new(&bytes), 90)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidZip64CentralDirectoryLocator);
    }

    #[test]
    fn test_locator_disk_fields() {
        for (index, value) in [(1, 1u32), (3, 0), (3, 2)] {
            let mut locator = Zip64EndOfCentralDirectoryLocator::new();
            locator.object.set(index, value);
            let err = Zip64EndOfCentralDirectoryLocator::new()
                .read(&mut Cursor::new(encode(&locator)), u64::MAX)
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidZip64CentralDirectoryLocator);
        }
    }

    #[test]
    fn test_locator_bad_signature() {
        let mut locator = Zip64EndOfCentralDirectoryLocator::new();
        locator.object.set(0, signature::ZIP64_END_OF_CD);
        let err = Zip64EndOfCentralDirectoryLocator::new()
            .read(&mut Cursor::new(encode(&locator)), u64::MAX)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidHeader);
    }

    #[test]
    fn test_zip64_eocd_round_trip() {
        let record = zip64_eocd();
        assert_eq!(record.size(), 56);
        assert_eq!(record.record_size(), 44);

        let mut decoded = Zip64EndOfCentralDirectoryRecord::new();
        decoded
            .read(&mut Cursor::new(encode(&record)), 147)
            .unwrap();
        assert_eq!(decoded, record);
        assert_eq!(decoded.version_made_by(), ZIP64_MINIMUM_VERSION);
        assert_eq!(decoded.offset_of_central_directory(), 40);
        assert_eq!(decoded.size(), 56);
    }

    #[test]
    fn test_zip64_eocd_bounds() {
        let record = zip64_eocd();
        assert!(read_zip64_eocd(&record, 51).is_ok());

        // Size of central directory beyond the bound.
        let err = read_zip64_eocd(&record, 50).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidZip64CentralDirectoryRecord);

        let mut record = zip64_eocd();
        record.set_offset_of_central_directory(52);
        let err = read_zip64_eocd(&record, 51).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidZip64CentralDirectoryRecord);

        let mut record = zip64_eocd();
        record.set_size_of_central_directory(0);
        let err = read_zip64_eocd(&record, 147).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidZip64CentralDirectoryRecord);

        let mut record = zip64_eocd();
        record.set_offset_of_central_directory(0);
        let err = read_zip64_eocd(&record, 147).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidZip64CentralDirectoryRecord);
    }

    #[test]
    fn test_zip64_eocd_field_constraints() {
        let cases: [(usize, Field); 7] = [
            (1, Field::U64(56)),
            (2, Field::U16(20)),
            (3, Field::U16(46)),
            (4, Field::U32(1)),
            (5, Field::U32(1)),
            (6, Field::U64(0)),
            (7, Field::U64(2)),
        ];
        for (index, field) in cases {
            let mut record = zip64_eocd();
            match field {
                Field::U16(v) => record.object.set(index, v),
                Field::U32(v) => record.object.set(index, v),
                Field::U64(v) => record.object.set(index, v),
                Field::Bytes(_) => unreachable!(),
            }
            let err = read_zip64_eocd(&record, 147).unwrap_err();
            assert_eq!(
                err.kind(),
                ErrorKind::InvalidZip64CentralDirectoryRecord,
                "field {index}"
            );
        }
    }

    #[test]
    fn test_zip64_eocd_bad_signature() {
        let mut record = zip64_eocd();
        record.object.set(0, signature::ZIP64_END_OF_CD_LOCATOR);
        let err = read_zip64_eocd(&record, 147).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidHeader);
    }
}
