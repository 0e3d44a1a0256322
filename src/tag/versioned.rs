//! Payload с версией формата: `u16` версии и за ним тело.

use std::{
    fmt,
    io::{Read, Write},
};

use tagwire_error::{FormatError, TagResult};

use super::{Payload, TagFactory};
use crate::codec::{parse_exact, DeclaredSize, ReadBytes, WriteBytes};

/// Тело версионированного payload.
///
/// Запись всегда идёт в `CURRENT_VERSION`; при чтении тело получает
/// фактическую версию из потока и может разбирать старые форматы.
pub trait VersionedCodec: Clone + PartialEq + fmt::Debug + Default + 'static {
    const CURRENT_VERSION: u16;

    /// Поддерживается ли чтение версии `version`.
    fn is_version_supported(version: u16) -> bool {
        version == Self::CURRENT_VERSION
    }

    /// Размер тела в текущей версии.
    fn inner_size(&self) -> u64;

    fn inner_serialize(
        &self,
        w: &mut dyn Write,
    ) -> TagResult<()>;

    /// Разбирает тело версии `version`. `r` ограничен размером тела.
    fn inner_deserialize(
        &mut self,
        version: u16,
        factory: &TagFactory,
        r: &mut dyn Read,
    ) -> TagResult<()>;
}

/// Обёртка, добавляющая к телу номер версии.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    version: u16,
    inner: T,
}

impl<T: VersionedCodec> Versioned<T> {
    pub fn new(inner: T) -> Self {
        Self {
            version: T::CURRENT_VERSION,
            inner,
        }
    }

    /// Версия, прочитанная из потока (или текущая для новых значений).
    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: VersionedCodec> Default for Versioned<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: VersionedCodec> Payload for Versioned<T> {
    fn value_size(&self) -> u64 {
        2 + self.inner.inner_size()
    }

    fn serialize_value(
        &self,
        w: &mut dyn Write,
    ) -> TagResult<()> {
        w.write_u16(T::CURRENT_VERSION)?;
        self.inner.inner_serialize(w)
    }

    fn deserialize_value(
        &mut self,
        factory: &TagFactory,
        size: DeclaredSize,
        r: &mut dyn Read,
    ) -> TagResult<()> {
        let declared = size.at_least(2, "versioned payload")?;
        parse_exact(r, declared, "versioned payload", |sub| {
            let version = sub.read_u16()?;
            if !T::is_version_supported(version) {
                return Err(FormatError::UnsupportedVersion {
                    what: "versioned payload",
                    version,
                }
                .into());
            }
            self.inner.inner_deserialize(version, factory, sub)?;
            self.version = version;
            Ok(())
        })
    }
}
