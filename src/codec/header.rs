//! Заголовок тега: `Varint(TagID)` и, для явных тегов, `Varint(размер)`.
//!
//! Для неявных ID (0..16) размер берётся из фиксированной таблицы и в поток
//! не пишется. Varint-теги (10 и 14) завершают себя сами.

use std::io::{Read, Write};

use tagwire_error::{FormatError, TagError, TagResult};
use tracing::trace;

use super::{encoded_size, is_implicit, read_varint, write_varint, TagId, IMPLICIT_ID_LIMIT};

/// Лимит размера явного payload по умолчанию (512 MiB).
pub const DEFAULT_MAX_TAG_SIZE: u64 = 512 * 1024 * 1024;

/// Размер payload неявного тега.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImplicitSize {
    /// Фиксированное кол-во байт
    Fixed(u64),
    /// Payload завершает себя сам (varint)
    SelfDelimited,
    /// ID зарезервирован, но тип не назначен
    Unassigned,
}

/// Таблица размеров для ID 0..16.
const IMPLICIT_SIZES: [ImplicitSize; IMPLICIT_ID_LIMIT as usize] = [
    ImplicitSize::Fixed(0),      // null
    ImplicitSize::Fixed(1),      // bool
    ImplicitSize::Fixed(1),      // uint8
    ImplicitSize::Fixed(1),      // int8
    ImplicitSize::Fixed(2),      // uint16
    ImplicitSize::Fixed(2),      // int16
    ImplicitSize::Fixed(4),      // uint32
    ImplicitSize::Fixed(4),      // int32
    ImplicitSize::Fixed(8),      // uint64
    ImplicitSize::Fixed(8),      // int64
    ImplicitSize::SelfDelimited, // varint
    ImplicitSize::Fixed(4),      // float32
    ImplicitSize::Fixed(8),      // float64
    ImplicitSize::Fixed(16),     // float128
    ImplicitSize::SelfDelimited, // signed varint
    ImplicitSize::Unassigned,
];

/// Размер payload, с которым вызывается его десериализация.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredSize {
    /// Ровно столько байт
    Exact(u64),
    /// Читать, пока payload не завершит себя сам. Допустимо только для
    /// varint-payload.
    SelfDelimited,
}

impl DeclaredSize {
    /// Возвращает точный размер или ошибку для payload, которым он обязателен.
    pub fn exact(
        self,
        what: &'static str,
    ) -> TagResult<u64> {
        match self {
            Self::Exact(size) => Ok(size),
            Self::SelfDelimited => Err(FormatError::SizeRequired { what }.into()),
        }
    }

    /// Требует размер ровно `expected` байт.
    pub fn require_exact(
        self,
        expected: u64,
        what: &'static str,
    ) -> TagResult<()> {
        let declared = self.exact(what)?;
        if declared != expected {
            return Err(FormatError::SizeMismatch {
                what,
                expected,
                declared,
            }
            .into());
        }
        Ok(())
    }

    /// Требует размер не меньше `minimum` байт.
    pub fn at_least(
        self,
        minimum: u64,
        what: &'static str,
    ) -> TagResult<u64> {
        let declared = self.exact(what)?;
        if declared < minimum {
            return Err(FormatError::TooShort {
                what,
                minimum,
                declared,
            }
            .into());
        }
        Ok(declared)
    }
}

/// Декодированный заголовок тега.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagHeader {
    pub id: TagId,
    pub size: DeclaredSize,
}

/// Размер payload неявного тега, `None` для явных ID.
pub fn implicit_size(id: TagId) -> Option<ImplicitSize> {
    if is_implicit(id) {
        Some(IMPLICIT_SIZES[id as usize])
    } else {
        None
    }
}

/// Размер заголовка в байтах.
pub fn header_size(
    id: TagId,
    value_size: u64,
) -> u64 {
    let id_len = encoded_size(id) as u64;
    if is_implicit(id) {
        id_len
    } else {
        id_len + encoded_size(value_size) as u64
    }
}

/// Записывает заголовок тега.
///
/// Возвращает кол-во записанных байт.
pub fn write_header<W: Write + ?Sized>(
    w: &mut W,
    id: TagId,
    value_size: u64,
) -> TagResult<usize> {
    let mut written = write_varint(w, id)?;
    if !is_implicit(id) {
        written += write_varint(w, value_size)?;
    }
    Ok(written)
}

/// Определяет размер payload для уже прочитанного ID.
///
/// Для неявных ID из потока ничего не читается.
///
/// # Errors
/// - `UnsupportedTagId` для неназначенного неявного ID
/// - `TagTooLarge`, если явный размер больше `max_size`
pub fn read_declared_size<R: Read + ?Sized>(
    r: &mut R,
    id: TagId,
    max_size: u64,
) -> TagResult<(DeclaredSize, usize)> {
    match implicit_size(id) {
        Some(ImplicitSize::Fixed(size)) => Ok((DeclaredSize::Exact(size), 0)),
        Some(ImplicitSize::SelfDelimited) => Ok((DeclaredSize::SelfDelimited, 0)),
        Some(ImplicitSize::Unassigned) => Err(TagError::UnsupportedTagId { id }),
        None => {
            let (size, len) = read_varint(r)?;
            if size > max_size {
                return Err(TagError::TagTooLarge {
                    size,
                    limit: max_size,
                });
            }
            Ok((DeclaredSize::Exact(size), len))
        }
    }
}

/// Читает заголовок тега целиком.
///
/// Возвращает заголовок и кол-во прочитанных байт.
pub fn read_header<R: Read + ?Sized>(
    r: &mut R,
    max_size: u64,
) -> TagResult<(TagHeader, usize)> {
    let (id, id_len) = read_varint(r)?;
    let (size, size_len) = read_declared_size(r, id, max_size)?;
    trace!(id, ?size, "decoded tag header");
    Ok((TagHeader { id, size }, id_len + size_len))
}
