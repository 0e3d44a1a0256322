use std::{
    cell::Cell,
    fmt,
    io::{self, Cursor, Read},
};

use rustc_hash::FxHashMap;
use tagwire_error::{FormatError, TagError, TagResult};
use tracing::{debug, trace};

use super::{
    BigDec, BigInt, Bool, Bytes, Dictionary, Float128, Float32, Float64, Int16, Int32, Int64,
    Int8, Null, Oid, Payload, Range, SignedVarint, StringDictionary, Tag, TagArray, TagSequence,
    UInt16, UInt32, UInt64, UInt8, Utf8String, Varint, VarintArray, Version,
};
use crate::{
    codec::{is_reserved, read_declared_size, read_varint, DeclaredSize, StandardTag, TagId},
    config::{CodecConfig, UnknownTagPolicy},
};

/// Конструктор пустого payload для свободного ID.
pub type PayloadConstructor = Box<dyn Fn() -> Box<dyn Payload> + Send + Sync>;

/// Фабрика тегов: сопоставляет ID конкретному типу payload и управляет
/// разбором тегов из потока.
///
/// Зарезервированные ID (`0..32`) обслуживаются встроенной таблицей и не
/// переопределяются. Свободные ID берутся из реестра, который заполняется до
/// начала разбора; сам разбор работает через `&TagFactory`.
pub struct TagFactory {
    config: CodecConfig,
    registry: FxHashMap<TagId, PayloadConstructor>,
}

thread_local! {
    /// Глубина текущего разбора в этом потоке.
    static DEPTH: Cell<u32> = const { Cell::new(0) };
}

/// Уровень вложенности разбора; снимается при выходе из области видимости.
struct DepthGuard;

impl DepthGuard {
    fn enter(limit: u32) -> TagResult<Self> {
        DEPTH.with(|depth| {
            let next = depth.get() + 1;
            if next > limit {
                debug!(limit, "tag nesting limit reached");
                return Err(FormatError::TooDeep { limit }.into());
            }
            depth.set(next);
            Ok(DepthGuard)
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get() - 1));
    }
}

/// Пустой payload стандартного типа.
fn standard_payload(tag: StandardTag) -> Box<dyn Payload> {
    match tag {
        StandardTag::Null => Box::new(Null),
        StandardTag::Bool => Box::new(Bool::default()),
        StandardTag::UInt8 => Box::new(UInt8::default()),
        StandardTag::Int8 => Box::new(Int8::default()),
        StandardTag::UInt16 => Box::new(UInt16::default()),
        StandardTag::Int16 => Box::new(Int16::default()),
        StandardTag::UInt32 => Box::new(UInt32::default()),
        StandardTag::Int32 => Box::new(Int32::default()),
        StandardTag::UInt64 => Box::new(UInt64::default()),
        StandardTag::Int64 => Box::new(Int64::default()),
        StandardTag::Varint => Box::new(Varint::default()),
        StandardTag::Float32 => Box::new(Float32::default()),
        StandardTag::Float64 => Box::new(Float64::default()),
        StandardTag::Float128 => Box::new(Float128::default()),
        StandardTag::SignedVarint => Box::new(SignedVarint::default()),
        StandardTag::Bytes => Box::new(Bytes::default()),
        StandardTag::String => Box::new(Utf8String::default()),
        StandardTag::BigInt => Box::new(BigInt::default()),
        StandardTag::BigDec => Box::new(BigDec::default()),
        StandardTag::VarintArray => Box::new(VarintArray::default()),
        StandardTag::TagArray => Box::new(TagArray::default()),
        StandardTag::TagSequence => Box::new(TagSequence::default()),
        StandardTag::Range => Box::new(Range::default()),
        StandardTag::Version => Box::new(Version::default()),
        StandardTag::Oid => Box::new(Oid::default()),
        StandardTag::Dictionary => Box::new(Dictionary::default()),
        StandardTag::StringDictionary => Box::new(StringDictionary::default()),
    }
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl TagFactory {
    /// Фабрика с настройками по умолчанию (strict, 512 MiB).
    pub fn new() -> Self {
        Self::with_config(CodecConfig::default())
    }

    pub fn strict() -> Self {
        Self::with_config(CodecConfig::default().with_unknown_tags(UnknownTagPolicy::Strict))
    }

    /// Неизвестные свободные ID сохраняются как сырые байты.
    pub fn permissive() -> Self {
        Self::with_config(CodecConfig::default().with_unknown_tags(UnknownTagPolicy::Permissive))
    }

    pub fn with_config(config: CodecConfig) -> Self {
        Self {
            config,
            registry: FxHashMap::default(),
        }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Регистрирует конструктор payload для свободного `id`.
    ///
    /// Повторная регистрация заменяет прежний конструктор.
    ///
    /// # Panics
    /// Если `id` зарезервирован: стандартный каталог не переопределяется.
    pub fn register<F>(
        &mut self,
        id: TagId,
        ctor: F,
    ) where
        F: Fn() -> Box<dyn Payload> + Send + Sync + 'static,
    {
        assert!(
            !is_reserved(id),
            "tag id {id} is reserved for the standard catalogue"
        );
        let replaced = self.registry.insert(id, Box::new(ctor)).is_some();
        debug!(id, replaced, "registered tag constructor");
    }

    /// Регистрирует `P::default()` как конструктор для `id`.
    pub fn register_default<P>(
        &mut self,
        id: TagId,
    ) where
        P: Payload + Default,
    {
        self.register(id, || Box::new(P::default()) as Box<dyn Payload>);
    }

    /// Убирает конструктор. Возвращает `true`, если он был.
    pub fn unregister(
        &mut self,
        id: TagId,
    ) -> bool {
        let removed = self.registry.remove(&id).is_some();
        if removed {
            debug!(id, "unregistered tag constructor");
        }
        removed
    }

    pub fn is_registered(
        &self,
        id: TagId,
    ) -> bool {
        self.registry.contains_key(&id)
    }

    /// Создаёт пустой payload для `id`.
    ///
    /// # Errors
    /// - `UnsupportedTagId` для неназначенного зарезервированного ID
    /// - `UnsupportedTagId` для незарегистрированного свободного ID в
    ///   strict-режиме
    pub fn create_payload(
        &self,
        id: TagId,
    ) -> TagResult<Box<dyn Payload>> {
        if let Some(tag) = StandardTag::from_id(id) {
            return Ok(standard_payload(tag));
        }
        if is_reserved(id) {
            return Err(TagError::UnsupportedTagId { id });
        }
        if let Some(ctor) = self.registry.get(&id) {
            return Ok(ctor());
        }

        match self.config.unknown_tags {
            UnknownTagPolicy::Strict => Err(TagError::UnsupportedTagId { id }),
            UnknownTagPolicy::Permissive => {
                debug!(id, "unknown tag id, keeping raw payload");
                Ok(Box::new(Bytes::default()))
            }
        }
    }

    pub fn create_tag(
        &self,
        id: TagId,
    ) -> TagResult<Tag> {
        Ok(Tag::from_boxed(id, self.create_payload(id)?))
    }

    /// Читает один тег из потока.
    ///
    /// # Errors
    /// - `BadTagFormat(TooDeep)`, если вложенность превышает
    ///   `config.max_depth`
    pub fn deserialize(
        &self,
        r: &mut dyn Read,
    ) -> TagResult<Tag> {
        let _depth = DepthGuard::enter(self.config.max_depth)?;
        let (id, _) = read_varint(r)?;
        let mut payload = self.create_payload(id)?;
        let size = self.read_size(r, id)?;
        payload.deserialize_value(self, size, r)?;
        Ok(Tag::from_boxed(id, payload))
    }

    /// Читает тег в существующий экземпляр.
    ///
    /// ID в потоке сверяется до чтения размера.
    ///
    /// # Errors
    /// - `UnexpectedTagId`, если ID в потоке отличается от `tag.id()`
    pub fn deserialize_into(
        &self,
        tag: &mut Tag,
        r: &mut dyn Read,
    ) -> TagResult<()> {
        let _depth = DepthGuard::enter(self.config.max_depth)?;
        let (id, _) = read_varint(r)?;
        if id != tag.id() {
            return Err(TagError::UnexpectedTagId {
                expected: tag.id(),
                actual: id,
            });
        }
        let size = self.read_size(r, id)?;
        tag.payload_dyn_mut().deserialize_value(self, size, r)
    }

    /// Читает ровно один тег из буфера; лишние байты считаются ошибкой.
    pub fn from_bytes(
        &self,
        bytes: &[u8],
    ) -> TagResult<Tag> {
        let mut cursor = Cursor::new(bytes);
        let tag = self.deserialize(&mut cursor)?;
        ensure_consumed(&cursor)?;
        Ok(tag)
    }

    pub fn from_bytes_into(
        &self,
        tag: &mut Tag,
        bytes: &[u8],
    ) -> TagResult<()> {
        let mut cursor = Cursor::new(bytes);
        self.deserialize_into(tag, &mut cursor)?;
        ensure_consumed(&cursor)
    }

    /// Пропускает один тег, не интерпретируя payload.
    ///
    /// Работает и для ID, которых фабрика не знает. Возвращает кол-во
    /// потреблённых байт.
    pub fn skip(
        &self,
        r: &mut dyn Read,
    ) -> TagResult<u64> {
        let (id, id_len) = read_varint(r)?;
        let (size, size_len) = read_declared_size(r, id, self.config.max_tag_size)?;
        let header = (id_len + size_len) as u64;

        let body = match size {
            DeclaredSize::SelfDelimited => read_varint(r)?.1 as u64,
            DeclaredSize::Exact(n) => {
                let skipped = io::copy(&mut Read::take(&mut *r, n), &mut io::sink())?;
                if skipped < n {
                    return Err(TagError::UnexpectedEndOfStream {
                        expected: n,
                        got: skipped,
                    });
                }
                n
            }
        };

        trace!(id, bytes = header + body, "skipped tag");
        Ok(header + body)
    }

    fn read_size(
        &self,
        r: &mut dyn Read,
        id: TagId,
    ) -> TagResult<DeclaredSize> {
        let (size, _) = read_declared_size(r, id, self.config.max_tag_size)?;
        trace!(id, ?size, "decoded tag header");
        Ok(size)
    }
}

fn ensure_consumed(cursor: &Cursor<&[u8]>) -> TagResult<()> {
    let remaining = cursor.get_ref().len() as u64 - cursor.position();
    if remaining > 0 {
        return Err(FormatError::TrailingBytes {
            what: "tag buffer",
            remaining,
        }
        .into());
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl Default for TagFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TagFactory {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let mut ids: Vec<_> = self.registry.keys().copied().collect();
        ids.sort_unstable();
        f.debug_struct("TagFactory")
            .field("config", &self.config)
            .field("registered", &ids)
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
