//! Generic record framework.
//!
//! A [`StructuredObject`] is an ordered list of [`Field`]s plus a static table
//! of [`LengthLink`]s saying which scalar field carries the byte length of
//! which later byte block. Decoding walks the fields strictly in order: after
//! each field is read, any links it governs resize their payload, then the
//! record's validation callback sees the field through a [`DecodeContext`].

use std::io::{Read, Write};

use tracing::trace;

use super::field::{Field, Scalar};
use crate::{Error, Result};

/// Field `length` holds the byte count of the later field `payload`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthLink {
    pub length: usize,
    pub payload: usize,
    /// Payload name used in diagnostics.
    pub name: &'static str,
    /// Largest payload the length field may describe.
    pub max: usize,
}

impl LengthLink {
    /// Link governed by a 2-byte length field.
    pub const fn u16(length: usize, payload: usize, name: &'static str) -> Self {
        Self {
            length,
            payload,
            name,
            max: u16::MAX as usize,
        }
    }
}

/// An ordered, exclusively-owned sequence of fields forming one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredObject {
    fields: Vec<Field>,
    links: &'static [LengthLink],
}

impl StructuredObject {
    pub fn new(fields: Vec<Field>, links: &'static [LengthLink]) -> Self {
        Self { fields, links }
    }

    /// Sum of the fields' current widths. Recomputed on every call since
    /// byte blocks change width as they are resized.
    pub fn size(&self) -> u64 {
        self.fields.iter().map(|f| f.size() as u64).sum()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Typed view of a scalar field.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not hold a `T`; layouts are static, so this
    /// only fires on a layout definition bug.
    pub fn get<T: Scalar>(&self, index: usize) -> T {
        scalar(&self.fields, index)
    }

    /// Assign a scalar field.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not hold a `T`.
    pub fn set<T: Scalar>(&mut self, index: usize, value: T) {
        assert!(
            T::from_field(&self.fields[index]).is_some(),
            "field {index} is not {} bytes wide",
            T::WIDTH
        );
        self.fields[index] = value.into_field();
    }

    /// Contents of a byte-block field; empty for scalars.
    pub fn bytes(&self, index: usize) -> &[u8] {
        match &self.fields[index] {
            Field::Bytes(data) => data,
            _ => &[],
        }
    }

    /// Replace a byte-block field and update the length field linked to it.
    ///
    /// Payloads longer than the link allows are rejected with
    /// [`Error::FieldOutOfRange`] and leave the record untouched.
    pub fn set_payload(&mut self, payload: usize, data: Vec<u8>) -> Result<()> {
        if let Some(link) = self.links.iter().find(|l| l.payload == payload) {
            if data.len() > link.max {
                return Err(Error::FieldOutOfRange {
                    field: link.name,
                    len: data.len(),
                    max: link.max,
                });
            }
            store_length(&mut self.fields[link.length], data.len());
        }
        self.fields[payload] = Field::Bytes(data);
        Ok(())
    }

    /// Decode every field in declaration order from the reader's position.
    ///
    /// `check` runs after each field (and after any payload it governs has
    /// been resized); an error from it aborts the read immediately.
    pub fn read<R, F>(&mut self, reader: &mut R, mut check: F) -> Result<()>
    where
        R: Read,
        F: FnMut(&mut DecodeContext<'_>) -> Result<()>,
    {
        let links = self.links;
        for index in 0..self.fields.len() {
            self.fields[index].decode(reader)?;
            trace!(index, field = ?self.fields[index], "decoded field");

            let mut ctx = DecodeContext {
                fields: &mut self.fields,
                index,
            };
            for link in links.iter().filter(|l| l.length == index) {
                let len = ctx.fields[index].as_u64().unwrap_or_default();
                let len = usize::try_from(len).unwrap_or(usize::MAX);
                if len > link.max {
                    return Err(Error::FieldOutOfRange {
                        field: link.name,
                        len,
                        max: link.max,
                    });
                }
                ctx.resize(link.payload, len);
            }
            check(&mut ctx)?;
        }
        Ok(())
    }

    /// Encode every field in declaration order at the writer's position.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        for field in &self.fields {
            field.encode(writer)?;
        }
        Ok(())
    }
}

/// View of a record mid-decode, handed to validation callbacks.
///
/// Fields before and at [`index`](Self::index) hold decoded values; later
/// fields still hold their defaults.
pub struct DecodeContext<'a> {
    fields: &'a mut [Field],
    index: usize,
}

impl DecodeContext<'_> {
    /// Index of the field just decoded.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Value of the field just decoded.
    pub fn value<T: Scalar>(&self) -> T {
        scalar(&*self.fields, self.index)
    }

    /// Value of an already-decoded field.
    pub fn get<T: Scalar>(&self, index: usize) -> T {
        scalar(&*self.fields, index)
    }

    /// Contents of the byte block just decoded; empty for scalars.
    pub fn bytes(&self) -> &[u8] {
        match &self.fields[self.index] {
            Field::Bytes(data) => data,
            _ => &[],
        }
    }

    /// Current total width of the record.
    pub fn record_size(&self) -> u64 {
        self.fields.iter().map(|f| f.size() as u64).sum()
    }

    /// Resize a later byte block so it decodes `len` bytes.
    pub fn resize(&mut self, slot: usize, len: usize) {
        debug_assert!(slot > self.index, "only later fields may be resized");
        if let Field::Bytes(data) = &mut self.fields[slot] {
            data.clear();
            data.resize(len, 0);
        }
    }
}

/// A record type with a fixed field layout.
pub trait Record {
    /// Name used in diagnostics.
    const NAME: &'static str;

    fn object(&self) -> &StructuredObject;

    /// Current total width in bytes.
    fn size(&self) -> u64 {
        self.object().size()
    }

    /// Encode the whole record at the writer's position.
    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.object().write(writer)
    }
}

/// Generates typed getter/setter pairs over a record's `object` field.
macro_rules! accessors {
    ($($index:literal => $get:ident, $set:ident: $ty:ty;)*) => {
        $(
            pub fn $get(&self) -> $ty {
                self.object.get($index)
            }

            pub fn $set(&mut self, value: $ty) {
                self.object.set($index, value)
            }
        )*
    };
}

pub(crate) use accessors;

/// Reject a signature field that does not hold `expected`.
pub(crate) fn expect_signature(
    ctx: &DecodeContext<'_>,
    record: &'static str,
    expected: u32,
) -> Result<()> {
    let actual = ctx.value::<u32>();
    if actual != expected {
        return Err(Error::InvalidHeader {
            record,
            expected,
            actual,
        });
    }
    Ok(())
}

fn scalar<T: Scalar>(fields: &[Field], index: usize) -> T {
    match T::from_field(&fields[index]) {
        Some(v) => v,
        None => panic!("field {index} is not {} bytes wide", T::WIDTH),
    }
}

// Callers check `len` against the link's maximum first.
fn store_length(field: &mut Field, len: usize) {
    match field {
        Field::U16(v) => *v = len as u16,
        Field::U32(v) => *v = len as u32,
        Field::U64(v) => *v = len as u64,
        Field::Bytes(_) => debug_assert!(false, "length field must be a scalar"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const LINKS: &[LengthLink] = &[LengthLink::u16(1, 2, "name")];

    fn named() -> StructuredObject {
        StructuredObject::new(vec![Field::U32(0), Field::U16(0), Field::bytes()], LINKS)
    }

    #[test]
    fn test_length_field_resizes_payload_before_it_is_read() {
        let mut data = Vec::new();
        data.extend_from_slice(&7u32.to_le_bytes());
        data.extend_from_slice(&3u16.to_le_bytes());
        data.extend_from_slice(b"abcdef");

        let mut object = named();
        let mut cursor = Cursor::new(data);
        object.read(&mut cursor, |_| Ok(())).unwrap();

        assert_eq!(object.get::<u32>(0), 7);
        assert_eq!(object.bytes(2), b"abc");
        assert_eq!(object.size(), 9);
        assert_eq!(cursor.position(), 9);
    }

    #[test]
    fn test_set_payload_updates_length() {
        let mut object = named();
        object.set_payload(2, b"hello".to_vec()).unwrap();

        assert_eq!(object.get::<u16>(1), 5);
        assert_eq!(object.size(), 11);
        assert_eq!(
            object.fields(),
            [Field::U32(0), Field::U16(5), Field::Bytes(b"hello".to_vec())]
        );
    }

    #[test]
    fn test_set_payload_rejects_oversized() {
        let mut object = named();
        let err = object
            .set_payload(2, vec![0; u16::MAX as usize + 1])
            .unwrap_err();

        assert!(matches!(
            err,
            Error::FieldOutOfRange {
                field: "name",
                max: 65535,
                ..
            }
        ));
        assert_eq!(object.get::<u16>(1), 0);
        assert_eq!(object.size(), 6);
    }

    #[test]
    fn test_decode_rejects_length_over_link_max() {
        const TIGHT: &[LengthLink] = &[LengthLink {
            length: 0,
            payload: 1,
            name: "extra",
            max: 4,
        }];
        let mut object = StructuredObject::new(vec![Field::U16(0), Field::bytes()], TIGHT);
        let mut cursor = Cursor::new(vec![5, 0, 1, 2, 3, 4, 5]);

        let err = object.read(&mut cursor, |_| Ok(())).unwrap_err();
        assert!(matches!(err, Error::FieldOutOfRange { len: 5, .. }));
    }

    #[test]
    fn test_check_sees_fields_in_order_and_can_abort() {
        let mut object = named();
        let mut seen = Vec::new();
        let mut cursor = Cursor::new(vec![0x50, 0x4b, 0x03, 0x04, 0, 0]);

        let err = object
            .read(&mut cursor, |ctx| {
                seen.push(ctx.index());
                expect_signature(ctx, "test record", 0x02014b50)
            })
            .unwrap_err();

        assert_eq!(seen, [0]);
        assert!(matches!(
            err,
            Error::InvalidHeader {
                expected: 0x02014b50,
                actual: 0x04034b50,
                ..
            }
        ));
    }

    #[test]
    fn test_write_then_read_is_stable() {
        let mut object = named();
        object.set(0, 0xdeadbeefu32);
        object.set_payload(2, b"entry.bin".to_vec()).unwrap();

        let mut out = Vec::new();
        object.write(&mut out).unwrap();
        assert_eq!(out.len() as u64, object.size());

        let mut decoded = named();
        decoded.read(&mut Cursor::new(out), |_| Ok(())).unwrap();
        assert_eq!(decoded, object);
        assert_eq!(decoded.size(), object.size());
    }

    #[test]
    #[should_panic(expected = "not 4 bytes wide")]
    fn test_set_wrong_width_panics() {
        let mut object = named();
        object.set(1, 1u32);
    }
}
