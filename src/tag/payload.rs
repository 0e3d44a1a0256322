use std::{
    any::Any,
    fmt,
    io::{Read, Write},
};

use tagwire_error::TagResult;

use super::TagFactory;
use crate::codec::{DeclaredSize, StandardTag};

/// Контракт payload тега.
///
/// **ИНВАРИАНТ:** `value_size()` равен числу байт, которые пишет
/// `serialize_value`, и числу байт, которые потребляет `deserialize_value`
/// для того же значения.
///
/// Вспомогательные методы (`as_any`, клонирование, сравнение) приходят из
/// [`PayloadObject`] автоматически для любого `Clone + PartialEq` типа.
pub trait Payload: PayloadObject + fmt::Debug {
    /// Размер payload в байтах, без заголовка.
    fn value_size(&self) -> u64;

    /// Пишет payload (без заголовка).
    fn serialize_value(
        &self,
        w: &mut dyn Write,
    ) -> TagResult<()>;

    /// Читает payload объявленного размера, заменяя текущее значение.
    ///
    /// `DeclaredSize::SelfDelimited` приходит только для неявных varint-ID.
    /// При ошибке состояние `self` не определено, но безопасно.
    fn deserialize_value(
        &mut self,
        factory: &TagFactory,
        size: DeclaredSize,
        r: &mut dyn Read,
    ) -> TagResult<()>;
}

/// Объектно-безопасные операции над `dyn Payload`.
pub trait PayloadObject: Any {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    fn clone_payload(&self) -> Box<dyn Payload>;

    /// Равенство с другим payload того же конкретного типа.
    fn payload_eq(
        &self,
        other: &dyn Payload,
    ) -> bool;
}

impl<T> PayloadObject for T
where
    T: Payload + Clone + PartialEq,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn clone_payload(&self) -> Box<dyn Payload> {
        Box::new(self.clone())
    }

    fn payload_eq(
        &self,
        other: &dyn Payload,
    ) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

impl Clone for Box<dyn Payload> {
    fn clone(&self) -> Self {
        (**self).clone_payload()
    }
}

impl PartialEq for dyn Payload {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.payload_eq(other)
    }
}

/// Payload стандартного каталога с закреплённым ID.
pub trait StandardPayload: Payload + Default {
    const TAG: StandardTag;
}
