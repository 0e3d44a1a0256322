//! Variable-length integer encoding с базой `0xF8`.
//!
//! Экономит место для маленьких чисел:
//! - 0..0xF8: 1 байт (само значение)
//! - больше: байт-заголовок `0xF8 + (size - 2)` и `(value - 0xF8)` в
//!   big-endian на `size - 1` байтах
//! - до `u64::MAX`: 9 байт максимум
//!
//! Кодирование всегда минимально, неминимальные тела при чтении
//! отвергаются. Знаковые значения проходят через zigzag-преобразование.

use std::io::{Read, Write};

use tagwire_error::{ensure, TagError, TagResult};

use super::{read_full, write_full};

/// Максимальное кол-во байт varint для u64.
pub const MAX_VARINT_LEN: usize = 9;
/// Первый байт, который начинает многобайтовую запись.
pub const VARINT_BASE: u64 = 0xF8;

/// Вычисляет размер varint для числа (без записи).
pub const fn encoded_size(value: u64) -> usize {
    if value < VARINT_BASE {
        return 1;
    }
    let body = value - VARINT_BASE;
    let bits = (u64::BITS - body.leading_zeros()) as usize;
    if bits == 0 {
        2
    } else {
        1 + bits.div_ceil(8)
    }
}

/// Полный размер varint по первому байту.
///
/// Позволяет узнать, сколько байт ещё нужно дочитать до полного декодирования.
pub const fn encoded_size_from_header(first: u8) -> usize {
    if (first as u64) < VARINT_BASE {
        1
    } else {
        (first - VARINT_BASE as u8) as usize + 2
    }
}

/// Кодирует `value` в начало `buf`.
///
/// # Errors
/// - `ShortWrite`, если `buf` короче [`encoded_size`]
///
/// # Examples
/// ```
/// use tagwire::codec::varint::encode;
///
/// let mut buf = [0u8; 9];
/// assert_eq!(encode(0xF7, &mut buf).unwrap(), 1);
/// assert_eq!(buf[0], 0xF7);
///
/// assert_eq!(encode(1_234_567_890, &mut buf).unwrap(), 5);
/// assert_eq!(&buf[..5], &[0xFB, 0x49, 0x96, 0x01, 0xDA]);
/// ```
pub fn encode(
    value: u64,
    buf: &mut [u8],
) -> TagResult<usize> {
    let size = encoded_size(value);
    ensure!(
        buf.len() >= size,
        TagError::ShortWrite {
            expected: size as u64,
            written: 0,
        }
    );
    write_encoded(value, size, &mut buf[..size]);
    Ok(size)
}

/// Кодирует `value` в массив максимальной длины; возвращает массив и
/// кол-во занятых байт.
fn encode_array(value: u64) -> ([u8; MAX_VARINT_LEN], usize) {
    let mut buf = [0u8; MAX_VARINT_LEN];
    let size = encoded_size(value);
    write_encoded(value, size, &mut buf[..size]);
    (buf, size)
}

/// `out.len()` равен `encoded_size(value)`.
fn write_encoded(
    value: u64,
    size: usize,
    out: &mut [u8],
) {
    if size == 1 {
        out[0] = value as u8;
        return;
    }

    out[0] = VARINT_BASE as u8 + (size - 2) as u8;
    let body = (value - VARINT_BASE).to_be_bytes();
    out[1..].copy_from_slice(&body[body.len() - (size - 1)..]);
}

/// Кодирует `value` в новый вектор.
pub fn to_vec(value: u64) -> Vec<u8> {
    let (buf, size) = encode_array(value);
    buf[..size].to_vec()
}

/// Декодирует тело многобайтового varint (без байта-заголовка).
fn decode_body(body: &[u8]) -> TagResult<u64> {
    ensure!(
        !body.is_empty() && body.len() <= 8,
        TagError::InvalidVarint {
            body_len: body.len(),
            reason: "body must be 1 to 8 bytes long",
        }
    );

    let mut raw = [0u8; 8];
    raw[8 - body.len()..].copy_from_slice(body);
    let value = u64::from_be_bytes(raw)
        .checked_add(VARINT_BASE)
        .ok_or(TagError::VarintOverflow { target: "u64" })?;

    ensure!(
        encoded_size(value) == body.len() + 1,
        TagError::InvalidVarint {
            body_len: body.len(),
            reason: "non-minimal encoding",
        }
    );
    Ok(value)
}

/// Декодирует varint из начала `buf`.
///
/// Возвращает значение и кол-во прочитанных байт.
///
/// # Errors
/// - `UnexpectedEndOfStream`, если `buf` обрывается раньше конца записи
/// - `VarintOverflow`, если значение не помещается в u64
/// - `InvalidVarint` для неминимальной записи
pub fn decode(buf: &[u8]) -> TagResult<(u64, usize)> {
    let first = *buf.first().ok_or(TagError::UnexpectedEndOfStream {
        expected: 1,
        got: 0,
    })?;
    let size = encoded_size_from_header(first);
    if size == 1 {
        return Ok((first as u64, 1));
    }

    ensure!(
        buf.len() >= size,
        TagError::UnexpectedEndOfStream {
            expected: size as u64,
            got: buf.len() as u64,
        }
    );
    Ok((decode_body(&buf[1..size])?, size))
}

/// Записывает u64 в varint формате.
///
/// Возвращает кол-во записанных байт.
pub fn write_varint<W: Write + ?Sized>(
    w: &mut W,
    value: u64,
) -> TagResult<usize> {
    let (buf, size) = encode_array(value);
    write_full(w, &buf[..size])?;
    Ok(size)
}

/// Читает u64 из varint формата.
///
/// Сначала читается байт-заголовок, затем ровно столько байт тела, сколько
/// он объявляет. Счётчики в `UnexpectedEndOfStream` учитывают заголовок.
pub fn read_varint<R: Read + ?Sized>(r: &mut R) -> TagResult<(u64, usize)> {
    let mut first = [0u8; 1];
    read_full(r, &mut first)?;

    let size = encoded_size_from_header(first[0]);
    if size == 1 {
        return Ok((first[0] as u64, 1));
    }

    let mut body = [0u8; MAX_VARINT_LEN - 1];
    let body = &mut body[..size - 1];
    read_full(r, body).map_err(|e| match e {
        TagError::UnexpectedEndOfStream { expected, got } => TagError::UnexpectedEndOfStream {
            expected: expected + 1,
            got: got + 1,
        },
        other => other,
    })?;

    Ok((decode_body(body)?, size))
}

/// Сужает декодированное значение до целевого типа.
///
/// # Errors
/// - `VarintOverflow`, если значение не помещается в `T`
pub fn narrow<T: TryFrom<u64>>(value: u64) -> TagResult<T> {
    T::try_from(value).map_err(|_| TagError::VarintOverflow {
        target: std::any::type_name::<T>(),
    })
}

/// Читает varint и сужает его до `T` (длины, счётчики).
pub fn read_varint_as<T: TryFrom<u64>, R: Read + ?Sized>(r: &mut R) -> TagResult<T> {
    let (value, _) = read_varint(r)?;
    narrow(value)
}

// ---------------------------------------------------------------------------
//  Знаковый вариант
// ---------------------------------------------------------------------------

/// Zigzag: `n >= 0` -> `2n`, `n < 0` -> `!(2n)`.
///
/// Считается по битовому представлению, поэтому `i64::MIN` переживает
/// преобразование без потерь.
pub const fn zigzag(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Обратное к [`zigzag`] преобразование.
pub const fn unzigzag(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

pub const fn signed_encoded_size(value: i64) -> usize {
    encoded_size(zigzag(value))
}

pub fn encode_signed(
    value: i64,
    buf: &mut [u8],
) -> TagResult<usize> {
    encode(zigzag(value), buf)
}

pub fn decode_signed(buf: &[u8]) -> TagResult<(i64, usize)> {
    let (raw, size) = decode(buf)?;
    Ok((unzigzag(raw), size))
}

pub fn write_signed_varint<W: Write + ?Sized>(
    w: &mut W,
    value: i64,
) -> TagResult<usize> {
    write_varint(w, zigzag(value))
}

pub fn read_signed_varint<R: Read + ?Sized>(r: &mut R) -> TagResult<(i64, usize)> {
    let (raw, size) = read_varint(r)?;
    Ok((unzigzag(raw), size))
}
