//! Теги, payload которых является значением внешнего типа.
//!
//! [`ValueCodec`] описывает, как значение пишется и читается, а
//! [`WrappedTag`] добавляет к нему ID и заголовок. Пакетные методы пишут
//! подряд несколько тегов одного ID; вариант `*_or_null` вместо
//! отсутствующего значения пишет null-тег `0x00`.

use std::{
    fmt,
    io::{Read, Write},
    marker::PhantomData,
};

use tagwire_error::{FormatError, TagError, TagResult};

use super::{Payload, Tag, TagFactory};
use crate::codec::{
    header_size, is_implicit, parse_exact, read_declared_size, read_varint, write_header,
    write_varint, DeclaredSize, TagId, TAG_NULL,
};

/// Кодек значения внешнего типа.
pub trait ValueCodec: 'static {
    type Value: Clone + PartialEq + fmt::Debug + 'static;

    /// Имя для сообщений об ошибках.
    const NAME: &'static str;

    fn size(value: &Self::Value) -> u64;

    fn serialize(
        value: &Self::Value,
        w: &mut dyn Write,
    ) -> TagResult<()>;

    fn deserialize(
        factory: &TagFactory,
        size: DeclaredSize,
        r: &mut dyn Read,
    ) -> TagResult<Self::Value>;
}

/// Тег с явным ID и слотом под одно значение.
pub struct WrappedTag<C: ValueCodec> {
    id: TagId,
    slot: Option<C::Value>,
    _codec: PhantomData<fn() -> C>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl<C: ValueCodec> WrappedTag<C> {
    /// # Panics
    /// Если `id` неявный: у обёрнутого значения размер всегда явный.
    pub fn new(id: TagId) -> Self {
        assert!(!is_implicit(id), "wrapped tag id {id} must be explicit");
        Self {
            id,
            slot: None,
            _codec: PhantomData,
        }
    }

    pub fn with_value(
        id: TagId,
        value: C::Value,
    ) -> Self {
        let mut tag = Self::new(id);
        tag.slot = Some(value);
        tag
    }

    /// Регистрирует пустой `WrappedTag<C>` в фабрике под `id`.
    pub fn register(
        factory: &mut TagFactory,
        id: TagId,
    ) {
        factory.register(id, move || Box::new(Self::new(id)) as Box<dyn Payload>);
    }

    pub fn id(&self) -> TagId {
        self.id
    }

    pub fn wrapped(&self) -> Option<&C::Value> {
        self.slot.as_ref()
    }

    pub fn set_wrapped(
        &mut self,
        value: C::Value,
    ) {
        self.slot = Some(value);
    }

    pub fn take_wrapped(&mut self) -> Option<C::Value> {
        self.slot.take()
    }

    pub fn into_tag(self) -> Tag {
        Tag::new(self.id, self)
    }

    fn tag_size(
        &self,
        value: &C::Value,
    ) -> u64 {
        let value_size = C::size(value);
        header_size(self.id, value_size) + value_size
    }

    fn write_one(
        &self,
        value: &C::Value,
        w: &mut dyn Write,
    ) -> TagResult<u64> {
        let value_size = C::size(value);
        let header = write_header(w, self.id, value_size)? as u64;
        C::serialize(value, w)?;
        Ok(header + value_size)
    }

    fn read_body(
        &self,
        factory: &TagFactory,
        r: &mut dyn Read,
    ) -> TagResult<C::Value> {
        let (size, _) = read_declared_size(r, self.id, factory.config().max_tag_size)?;
        read_value::<C>(factory, size, r)
    }

    /// Пишет тег со значением из слота.
    pub fn serialize_tag(
        &self,
        w: &mut dyn Write,
    ) -> TagResult<u64> {
        let value = self
            .slot
            .as_ref()
            .ok_or(FormatError::MissingValue { what: C::NAME })?;
        self.write_one(value, w)
    }

    /// Читает тег с этим ID и кладёт значение в слот.
    pub fn deserialize_tag(
        &mut self,
        factory: &TagFactory,
        r: &mut dyn Read,
    ) -> TagResult<()> {
        let (id, _) = read_varint(r)?;
        if id != self.id {
            return Err(TagError::UnexpectedTagId {
                expected: self.id,
                actual: id,
            });
        }
        self.slot = Some(self.read_body(factory, r)?);
        Ok(())
    }

    /// Суммарный размер тегов для `values`.
    pub fn batch_size(
        &self,
        values: &[C::Value],
    ) -> u64 {
        values.iter().map(|v| self.tag_size(v)).sum()
    }

    /// Пишет по тегу на каждое значение. Возвращает кол-во записанных байт.
    pub fn serialize_batch(
        &mut self,
        values: &[C::Value],
        w: &mut dyn Write,
    ) -> TagResult<u64> {
        self.slot = None;
        let mut written = 0;
        for value in values {
            written += self.write_one(value, w)?;
        }
        Ok(written)
    }

    /// Читает `count` тегов подряд.
    pub fn deserialize_batch(
        &mut self,
        factory: &TagFactory,
        count: usize,
        r: &mut dyn Read,
    ) -> TagResult<Vec<C::Value>> {
        self.slot = None;
        let mut values = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            self.deserialize_tag(factory, r)?;
            values.extend(self.slot.take());
        }
        Ok(values)
    }

    pub fn batch_size_or_null(
        &self,
        values: &[Option<C::Value>],
    ) -> u64 {
        values
            .iter()
            .map(|v| v.as_ref().map_or(1, |v| self.tag_size(v)))
            .sum()
    }

    /// Как [`WrappedTag::serialize_batch`], но `None` пишется null-тегом.
    pub fn serialize_batch_or_null(
        &mut self,
        values: &[Option<C::Value>],
        w: &mut dyn Write,
    ) -> TagResult<u64> {
        self.slot = None;
        let mut written = 0;
        for value in values {
            written += match value {
                Some(value) => self.write_one(value, w)?,
                None => write_varint(w, TAG_NULL)? as u64,
            };
        }
        Ok(written)
    }

    /// Читает `count` тегов, каждый из которых либо null, либо тег этого ID.
    pub fn deserialize_batch_or_null(
        &mut self,
        factory: &TagFactory,
        count: usize,
        r: &mut dyn Read,
    ) -> TagResult<Vec<Option<C::Value>>> {
        self.slot = None;
        let mut values = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            let (id, _) = read_varint(r)?;
            let value = match id {
                TAG_NULL => None,
                id if id == self.id => Some(self.read_body(factory, r)?),
                actual => {
                    return Err(TagError::UnexpectedTagId {
                        expected: self.id,
                        actual,
                    })
                }
            };
            values.push(value);
        }
        Ok(values)
    }
}

/// Читает значение строго в границах объявленного размера: кодек не может
/// ни выйти за payload, ни оставить в нём непрочитанные байты.
fn read_value<C: ValueCodec>(
    factory: &TagFactory,
    size: DeclaredSize,
    r: &mut dyn Read,
) -> TagResult<C::Value> {
    let declared = size.exact(C::NAME)?;
    parse_exact(r, declared, C::NAME, |sub| {
        C::deserialize(factory, DeclaredSize::Exact(declared), sub)
    })
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl<C: ValueCodec> Clone for WrappedTag<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            slot: self.slot.clone(),
            _codec: PhantomData,
        }
    }
}

impl<C: ValueCodec> PartialEq for WrappedTag<C> {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.id == other.id && self.slot == other.slot
    }
}

impl<C: ValueCodec> fmt::Debug for WrappedTag<C> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("WrappedTag")
            .field("codec", &C::NAME)
            .field("id", &self.id)
            .field("slot", &self.slot)
            .finish()
    }
}

impl<C: ValueCodec> Payload for WrappedTag<C> {
    fn value_size(&self) -> u64 {
        self.slot.as_ref().map_or(0, C::size)
    }

    fn serialize_value(
        &self,
        w: &mut dyn Write,
    ) -> TagResult<()> {
        match &self.slot {
            Some(value) => C::serialize(value, w),
            None => Err(FormatError::MissingValue { what: C::NAME }.into()),
        }
    }

    fn deserialize_value(
        &mut self,
        factory: &TagFactory,
        size: DeclaredSize,
        r: &mut dyn Read,
    ) -> TagResult<()> {
        self.slot = Some(read_value::<C>(factory, size, r)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::{ReadBytes, WriteBytes};

    /// Координата: два `i32`.
    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Coord {
        lat: i32,
        lon: i32,
    }

    struct CoordCodec;

    impl ValueCodec for CoordCodec {
        type Value = Coord;
        const NAME: &'static str = "coord";

        fn size(_value: &Coord) -> u64 {
            8
        }

        fn serialize(
            value: &Coord,
            w: &mut dyn Write,
        ) -> TagResult<()> {
            w.write_i32(value.lat)?;
            w.write_i32(value.lon)
        }

        fn deserialize(
            _factory: &TagFactory,
            size: DeclaredSize,
            r: &mut dyn Read,
        ) -> TagResult<Coord> {
            size.require_exact(8, "coord")?;
            Ok(Coord {
                lat: r.read_i32()?,
                lon: r.read_i32()?,
            })
        }
    }

    /// Кодек, который читает ровно `N` байт, что бы ни было объявлено.
    struct FixedReadCodec<const N: usize>;

    impl<const N: usize> ValueCodec for FixedReadCodec<N> {
        type Value = Vec<u8>;
        const NAME: &'static str = "fixed read";

        fn size(value: &Vec<u8>) -> u64 {
            value.len() as u64
        }

        fn serialize(
            value: &Vec<u8>,
            w: &mut dyn Write,
        ) -> TagResult<()> {
            w.write_bytes(value)
        }

        fn deserialize(
            _factory: &TagFactory,
            _size: DeclaredSize,
            r: &mut dyn Read,
        ) -> TagResult<Vec<u8>> {
            r.read_bytes(N as u64)
        }
    }

    const COORD_ID: TagId = 0x50;

    fn coord(
        lat: i32,
        lon: i32,
    ) -> Coord {
        Coord { lat, lon }
    }

    #[test]
    #[should_panic(expected = "explicit")]
    fn test_implicit_id_panics() {
        WrappedTag::<CoordCodec>::new(3);
    }

    #[test]
    fn test_slot_access() {
        let mut tag = WrappedTag::<CoordCodec>::new(COORD_ID);
        assert!(tag.wrapped().is_none());
        tag.set_wrapped(coord(1, 2));
        assert_eq!(tag.wrapped(), Some(&coord(1, 2)));
        assert_eq!(tag.take_wrapped(), Some(coord(1, 2)));
        assert!(tag.wrapped().is_none());
    }

    #[test]
    fn test_empty_slot_is_error() {
        let tag = WrappedTag::<CoordCodec>::new(COORD_ID);
        let err = tag.serialize_tag(&mut Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            TagError::BadTagFormat(FormatError::MissingValue { what: "coord" })
        ));
    }

    #[test]
    fn test_single_tag_roundtrip() {
        let factory = TagFactory::new();
        let tag = WrappedTag::<CoordCodec>::with_value(COORD_ID, coord(-5, 7));
        let mut buf = Vec::new();
        assert_eq!(tag.serialize_tag(&mut buf).unwrap(), 10);
        assert_eq!(&buf[..2], &[0x50, 0x08]);

        let mut out = WrappedTag::<CoordCodec>::new(COORD_ID);
        out.deserialize_tag(&factory, &mut Cursor::new(&buf)).unwrap();
        assert_eq!(out.wrapped(), Some(&coord(-5, 7)));

        let mut other = WrappedTag::<CoordCodec>::new(COORD_ID + 1);
        assert!(matches!(
            other.deserialize_tag(&factory, &mut Cursor::new(&buf)),
            Err(TagError::UnexpectedTagId { .. })
        ));
    }

    #[test]
    fn test_batch_roundtrip() {
        let factory = TagFactory::new();
        let mut tag = WrappedTag::<CoordCodec>::with_value(COORD_ID, coord(0, 0));
        let values = vec![coord(1, 1), coord(2, 2), coord(3, 3)];

        let mut buf = Vec::new();
        let written = tag.serialize_batch(&values, &mut buf).unwrap();
        assert_eq!(written, tag.batch_size(&values));
        assert_eq!(written, buf.len() as u64);
        assert!(tag.wrapped().is_none());

        tag.set_wrapped(coord(9, 9));
        let decoded = tag
            .deserialize_batch(&factory, 3, &mut Cursor::new(&buf))
            .unwrap();
        assert_eq!(decoded, values);
        assert!(tag.wrapped().is_none());
    }

    #[test]
    fn test_batch_or_null() {
        let factory = TagFactory::new();
        let mut tag = WrappedTag::<CoordCodec>::new(COORD_ID);
        let values = vec![Some(coord(1, 2)), None, Some(coord(3, 4)), None];

        let mut buf = Vec::new();
        let written = tag.serialize_batch_or_null(&values, &mut buf).unwrap();
        assert_eq!(written, tag.batch_size_or_null(&values));
        assert_eq!(buf[10], 0x00);
        assert_eq!(*buf.last().unwrap(), 0x00);

        let decoded = tag
            .deserialize_batch_or_null(&factory, 4, &mut Cursor::new(&buf))
            .unwrap();
        assert_eq!(decoded, values);
        assert!(tag.wrapped().is_none());
    }

    #[test]
    fn test_registered_wrapped_tag() {
        let mut factory = TagFactory::new();
        WrappedTag::<CoordCodec>::register(&mut factory, COORD_ID);

        let tag = WrappedTag::<CoordCodec>::with_value(COORD_ID, coord(4, 2)).into_tag();
        let bytes = tag.to_bytes().unwrap();
        let decoded = factory.from_bytes(&bytes).unwrap();
        assert_eq!(decoded, tag);
        assert_eq!(
            decoded
                .payload::<WrappedTag<CoordCodec>>()
                .and_then(WrappedTag::wrapped),
            Some(&coord(4, 2))
        );
    }

    /// Тест проверяет, что кодек, прочитавший меньше объявленного, даёт
    /// `TrailingBytes`, и поток не рассинхронизируется молча.
    #[test]
    fn test_codec_under_read_is_error() {
        let bytes = [0x50, 0x03, 0x07, 0x00, 0x00];
        let mut tag = WrappedTag::<FixedReadCodec<1>>::new(COORD_ID);
        let err = tag
            .deserialize_tag(&TagFactory::new(), &mut Cursor::new(&bytes))
            .unwrap_err();
        assert!(matches!(
            err,
            TagError::BadTagFormat(FormatError::TrailingBytes {
                what: "fixed read",
                remaining: 2
            })
        ));

        let mut factory = TagFactory::new();
        WrappedTag::<FixedReadCodec<1>>::register(&mut factory, COORD_ID);
        assert!(matches!(
            factory.from_bytes(&bytes),
            Err(TagError::BadTagFormat(FormatError::TrailingBytes { .. }))
        ));
    }

    /// Тест проверяет, что кодек не может прочитать следующий тег потока.
    #[test]
    fn test_codec_over_read_is_error() {
        let bytes = [0x50, 0x02, 0x07, 0x08, 0x00];
        let mut tag = WrappedTag::<FixedReadCodec<3>>::new(COORD_ID);
        let mut cursor = Cursor::new(&bytes);
        let err = tag
            .deserialize_tag(&TagFactory::new(), &mut cursor)
            .unwrap_err();
        assert!(matches!(
            err,
            TagError::BadTagFormat(FormatError::Overrun {
                what: "fixed read",
                declared: 2
            })
        ));
        assert_eq!(cursor.position(), 4);
    }
}
