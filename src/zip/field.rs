//! Binary slots that make up an on-disk record.
//!
//! A [`Field`] is one of a closed set of shapes: a little-endian scalar of
//! 2, 4 or 8 bytes, or a variable-length byte block whose width is whatever
//! it currently holds.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// One binary-encoded value of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    U16(u16),
    U32(u32),
    U64(u64),
    Bytes(Vec<u8>),
}

impl Field {
    /// Empty byte block.
    pub const fn bytes() -> Self {
        Field::Bytes(Vec::new())
    }

    /// Current on-stream width in bytes.
    pub fn size(&self) -> usize {
        match self {
            Field::U16(_) => 2,
            Field::U32(_) => 4,
            Field::U64(_) => 8,
            Field::Bytes(data) => data.len(),
        }
    }

    /// Scalar value widened to `u64`, or `None` for byte blocks.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Field::U16(v) => Some(v.into()),
            Field::U32(v) => Some(v.into()),
            Field::U64(v) => Some(v),
            Field::Bytes(_) => None,
        }
    }

    /// Decode from the reader's current position.
    ///
    /// Byte blocks read exactly as many bytes as they currently hold, so
    /// they must be resized before decoding.
    pub fn decode<R: Read>(&mut self, reader: &mut R) -> std::io::Result<()> {
        match self {
            Field::U16(v) => *v = reader.read_u16::<LittleEndian>()?,
            Field::U32(v) => *v = reader.read_u32::<LittleEndian>()?,
            Field::U64(v) => *v = reader.read_u64::<LittleEndian>()?,
            Field::Bytes(data) => reader.read_exact(data)?,
        }
        Ok(())
    }

    /// Encode at the writer's current position.
    pub fn encode<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            Field::U16(v) => writer.write_u16::<LittleEndian>(*v),
            Field::U32(v) => writer.write_u32::<LittleEndian>(*v),
            Field::U64(v) => writer.write_u64::<LittleEndian>(*v),
            Field::Bytes(data) => writer.write_all(data),
        }
    }
}

/// Fixed-width unsigned integers a [`Field`] can hold.
pub trait Scalar: Copy + Into<u64> {
    /// Width on the wire.
    const WIDTH: usize;

    fn from_field(field: &Field) -> Option<Self>;

    fn into_field(self) -> Field;
}

macro_rules! scalar {
    ($ty:ty, $variant:ident, $width:expr) => {
        impl Scalar for $ty {
            const WIDTH: usize = $width;

            fn from_field(field: &Field) -> Option<Self> {
                match *field {
                    Field::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn into_field(self) -> Field {
                Field::$variant(self)
            }
        }
    };
}

scalar!(u16, U16, 2);
scalar!(u32, U32, 4);
scalar!(u64, U64, 8);

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_decode_little_endian() {
        let data = [0x50, 0x4b, 0x05, 0x06, 0xFF, 0xFF];
        let mut cursor = Cursor::new(&data[..]);

        let mut sig = Field::U32(0);
        let mut count = Field::U16(0);
        sig.decode(&mut cursor).unwrap();
        count.decode(&mut cursor).unwrap();

        assert_eq!(sig, Field::U32(0x06054b50));
        assert_eq!(count.as_u64(), Some(0xFFFF));
    }

    #[test]
    fn test_bytes_width_follows_contents() {
        let mut field = Field::bytes();
        assert_eq!(field.size(), 0);

        field = Field::Bytes(vec![0; 5]);
        let mut cursor = Cursor::new(b"hello world".as_slice());
        field.decode(&mut cursor).unwrap();

        assert_eq!(field, Field::Bytes(b"hello".to_vec()));
        assert_eq!(cursor.position(), 5);
        assert_eq!(field.as_u64(), None);
    }

    #[test]
    fn test_encode_u64() {
        let mut out = Vec::new();
        Field::U64(0x0102030405060708).encode(&mut out).unwrap();
        assert_eq!(out, [8, 7, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_short_read_is_eof() {
        let mut field = Field::U64(0);
        let mut cursor = Cursor::new([1u8, 2, 3].as_slice());
        let err = field.decode(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_scalar_rejects_other_widths() {
        assert_eq!(u16::from_field(&Field::U16(7)), Some(7));
        assert_eq!(u32::from_field(&Field::U16(7)), None);
        assert_eq!(u64::from_field(&Field::bytes()), None);
        assert_eq!(42u32.into_field().size(), u32::WIDTH);
    }
}
