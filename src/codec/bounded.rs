//! Чтение payload в границах объявленного размера.
//!
//! Каждый составной payload разбирается в два этапа: разбор структуры через
//! ограниченный sub-reader и проверка, что он исчерпан полностью. Выход за
//! границу и непрочитанный остаток одинаково считаются ошибкой формата.

use std::io::{Read, Take};

use tagwire_error::{FormatError, TagError, TagResult};

/// Reader, ограниченный объявленным размером payload.
pub type SubReader<'a> = Take<&'a mut dyn Read>;

/// Разбирает ровно `declared` байт из `r`.
///
/// `parse` получает sub-reader; его `limit()` показывает, сколько байт
/// осталось. После `parse` остаток обязан быть нулевым.
///
/// # Errors
/// - `BadTagFormat(Overrun)`, если разбор упёрся в границу
/// - `BadTagFormat(TrailingBytes)`, если после разбора остались байты
/// - `UnexpectedEndOfStream`, если закончился сам внешний поток
pub fn parse_exact<T>(
    r: &mut dyn Read,
    declared: u64,
    what: &'static str,
    parse: impl FnOnce(&mut SubReader<'_>) -> TagResult<T>,
) -> TagResult<T> {
    let mut sub = r.take(declared);

    let value = match parse(&mut sub) {
        Ok(value) => value,
        Err(TagError::UnexpectedEndOfStream { .. }) if sub.limit() == 0 => {
            return Err(FormatError::Overrun { what, declared }.into());
        }
        Err(e) => return Err(e),
    };

    match sub.limit() {
        0 => Ok(value),
        remaining => Err(FormatError::TrailingBytes { what, remaining }.into()),
    }
}

/// Проверяет, что заявленное число элементов вообще может поместиться в
/// оставшиеся байты (каждый элемент занимает хотя бы один байт).
pub fn ensure_count_fits(
    sub: &SubReader<'_>,
    count: u64,
    what: &'static str,
) -> TagResult<()> {
    let available = sub.limit();
    if count > available {
        return Err(FormatError::CountOverrun {
            what,
            count,
            available,
        }
        .into());
    }
    Ok(())
}
