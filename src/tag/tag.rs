use std::io::Write;

use tagwire_error::{bail, FormatError, TagError, TagResult};

use super::{Null, Payload, StandardPayload};
use crate::codec::{
    header_size, implicit_size, write_header, CountingWriter, ImplicitSize, TagId, TAG_NULL,
};

/// Тег: ID и payload.
///
/// Тег владеет payload единолично; вложенные теги составных payload
/// принадлежат родителю.
#[derive(Debug, Clone)]
pub struct Tag {
    id: TagId,
    payload: Box<dyn Payload>,
}

impl Tag {
    pub fn new<P: Payload>(
        id: TagId,
        payload: P,
    ) -> Self {
        Self::from_boxed(id, Box::new(payload))
    }

    pub fn from_boxed(
        id: TagId,
        payload: Box<dyn Payload>,
    ) -> Self {
        Self { id, payload }
    }

    /// Стандартный тег с закреплённым за типом ID.
    pub fn standard<P: StandardPayload>(payload: P) -> Self {
        Self::new(P::TAG.id(), payload)
    }

    pub fn null() -> Self {
        Self::standard(Null)
    }

    pub fn id(&self) -> TagId {
        self.id
    }

    pub fn is_null(&self) -> bool {
        self.id == TAG_NULL
    }

    /// Типизированный доступ к payload.
    pub fn payload<T: Payload>(&self) -> Option<&T> {
        self.payload.as_any().downcast_ref::<T>()
    }

    pub fn payload_mut<T: Payload>(&mut self) -> Option<&mut T> {
        self.payload.as_any_mut().downcast_mut::<T>()
    }

    pub fn payload_dyn(&self) -> &dyn Payload {
        self.payload.as_ref()
    }

    pub fn payload_dyn_mut(&mut self) -> &mut dyn Payload {
        self.payload.as_mut()
    }

    /// Забирает payload, если он имеет тип `T`.
    pub fn into_payload<T: Payload>(self) -> Option<T> {
        self.payload.into_any().downcast::<T>().ok().map(|p| *p)
    }

    /// Размер payload без заголовка.
    pub fn value_size(&self) -> u64 {
        self.payload.value_size()
    }

    pub fn header_size(&self) -> u64 {
        header_size(self.id, self.value_size())
    }

    /// Полный размер тега на проводе.
    pub fn size(&self) -> u64 {
        let value_size = self.value_size();
        header_size(self.id, value_size) + value_size
    }

    /// Пишет тег целиком и возвращает кол-во записанных байт.
    ///
    /// # Errors
    /// - `BadTagFormat(ImplicitSizeMismatch)`, если payload не совпадает по
    ///   размеру с неявным ID
    /// - `UnsupportedTagId` для неназначенного неявного ID
    pub fn serialize(
        &self,
        w: &mut dyn Write,
    ) -> TagResult<u64> {
        let value_size = self.value_size();
        match implicit_size(self.id) {
            Some(ImplicitSize::Fixed(expected)) if expected != value_size => {
                bail!(FormatError::ImplicitSizeMismatch {
                    id: self.id,
                    expected,
                    actual: value_size,
                });
            }
            Some(ImplicitSize::Unassigned) => bail!(TagError::UnsupportedTagId { id: self.id }),
            _ => {}
        }

        let mut counter = CountingWriter::new(w);
        write_header(&mut counter, self.id, value_size)?;
        self.payload.serialize_value(&mut counter)?;

        debug_assert_eq!(
            counter.count(),
            header_size(self.id, value_size) + value_size,
            "payload of tag {} wrote a different number of bytes than it reported",
            self.id
        );
        Ok(counter.count())
    }

    pub fn to_bytes(&self) -> TagResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.size() as usize);
        self.serialize(&mut buf)?;
        Ok(buf)
    }
}

impl Default for Tag {
    fn default() -> Self {
        Self::null()
    }
}

impl PartialEq for Tag {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.id == other.id && *self.payload == *other.payload
    }
}

impl<P: StandardPayload> From<P> for Tag {
    fn from(payload: P) -> Self {
        Self::standard(payload)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        codec::{to_vec, TAG_STRING},
        tag::{Bool, Int32, TagArray, UInt16, UInt8, Utf8String, Varint},
    };

    #[test]
    fn test_null_tag() {
        let tag = Tag::null();
        assert!(tag.is_null());
        assert_eq!(tag.to_bytes().unwrap(), vec![0x00]);
        assert_eq!(tag.size(), 1);
    }

    #[test]
    fn test_empty_string_tag() {
        let tag = Tag::from(Utf8String::default());
        assert_eq!(tag.id(), TAG_STRING);
        assert_eq!(tag.to_bytes().unwrap(), vec![0x11, 0x00]);
        assert_eq!(tag.header_size(), 2);
    }

    #[test]
    fn test_uint8_with_large_explicit_id() {
        let id = 0x1234_5678_90AB_CDEF;
        let tag = Tag::new(id, UInt8(0xFA));

        let mut expected = to_vec(id);
        expected.extend_from_slice(&[0x01, 0xFA]);
        assert_eq!(tag.to_bytes().unwrap(), expected);
        assert_eq!(tag.size(), expected.len() as u64);
    }

    #[test]
    fn test_implicit_size_mismatch() {
        // UInt16 под ID UInt8 (неявный, 1 байт)
        let tag = Tag::new(2, UInt16(1));
        let err = tag.to_bytes().unwrap_err();
        assert!(matches!(
            err,
            TagError::BadTagFormat(FormatError::ImplicitSizeMismatch {
                id: 2,
                expected: 1,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_unassigned_implicit_id() {
        let err = Tag::new(15, Varint(1)).to_bytes().unwrap_err();
        assert!(matches!(err, TagError::UnsupportedTagId { id: 15 }));
    }

    #[test]
    fn test_typed_access() {
        let mut tag = Tag::from(Int32(5));
        assert_eq!(tag.payload::<Int32>(), Some(&Int32(5)));
        assert!(tag.payload::<Bool>().is_none());

        tag.payload_mut::<Int32>().unwrap().0 = 6;
        assert_eq!(tag.into_payload::<Int32>(), Some(Int32(6)));
    }

    #[test]
    fn test_equality_respects_id_and_type() {
        assert_eq!(Tag::from(Bool(true)), Tag::from(Bool(true)));
        assert_ne!(Tag::from(Bool(true)), Tag::from(Bool(false)));
        assert_ne!(Tag::new(40, Bool(true)), Tag::from(Bool(true)));
        assert_ne!(Tag::from(Int32(0)), Tag::from(UInt16(0)));
    }

    /// Тест проверяет, что клон вложенного тега равен оригиналу, а изменение
    /// вложенного payload делает теги различными.
    #[test]
    fn test_clone_nested_equality() {
        let original = Tag::from(TagArray(vec![
            Tag::from(UInt8(1)),
            Tag::from(TagArray(vec![Tag::null()])),
        ]));
        let mut copy = original.clone();
        assert_eq!(copy, original);

        copy.payload_mut::<TagArray>().unwrap().0[0] = Tag::from(UInt8(2));
        assert_ne!(copy, original);
    }
}
