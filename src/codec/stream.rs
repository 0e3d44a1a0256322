//! Примитивы потока: big-endian числа фиксированной ширины, блоки байт и
//! строки UTF-8 поверх `std::io::{Read, Write}`.
//!
//! В отличие от `read_exact`/`write_all`, короткое чтение и короткая запись
//! различаются и несут счётчики байт.

use std::io::{self, ErrorKind, Read, Write};

use byteorder::{BigEndian, ByteOrder};
use tagwire_error::{FormatError, TagError, TagResult};

/// Читает ровно `buf.len()` байт.
///
/// # Errors
/// - `UnexpectedEndOfStream` с кол-вом реально прочитанных байт
pub fn read_full<R: Read + ?Sized>(
    r: &mut R,
    buf: &mut [u8],
) -> TagResult<()> {
    let mut got = 0;
    while got < buf.len() {
        match r.read(&mut buf[got..]) {
            Ok(0) => {
                return Err(TagError::UnexpectedEndOfStream {
                    expected: buf.len() as u64,
                    got: got as u64,
                })
            }
            Ok(n) => got += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Записывает ровно `buf.len()` байт.
///
/// # Errors
/// - `ShortWrite`, если приёмник перестал принимать данные
pub fn write_full<W: Write + ?Sized>(
    w: &mut W,
    buf: &[u8],
) -> TagResult<()> {
    let mut written = 0;
    while written < buf.len() {
        match w.write(&buf[written..]) {
            Ok(0) => {
                return Err(TagError::ShortWrite {
                    expected: buf.len() as u64,
                    written: written as u64,
                })
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

macro_rules! read_be {
    ($name:ident, $ty:ty, $len:expr, $conv:path) => {
        #[doc = concat!("Читает `", stringify!($ty), "` в big-endian.")]
        fn $name(&mut self) -> TagResult<$ty> {
            let mut buf = [0u8; $len];
            read_full(self, &mut buf)?;
            Ok($conv(&buf))
        }
    };
}

macro_rules! write_be {
    ($name:ident, $ty:ty, $len:expr, $conv:path) => {
        #[doc = concat!("Пишет `", stringify!($ty), "` в big-endian.")]
        fn $name(
            &mut self,
            value: $ty,
        ) -> TagResult<()> {
            let mut buf = [0u8; $len];
            $conv(&mut buf, value);
            write_full(self, &buf)
        }
    };
}

/// Чтение примитивов фиксированной ширины.
pub trait ReadBytes: Read {
    fn read_u8(&mut self) -> TagResult<u8> {
        let mut buf = [0u8; 1];
        read_full(self, &mut buf)?;
        Ok(buf[0])
    }

    fn read_i8(&mut self) -> TagResult<i8> {
        Ok(self.read_u8()? as i8)
    }

    read_be!(read_u16, u16, 2, BigEndian::read_u16);
    read_be!(read_i16, i16, 2, BigEndian::read_i16);
    read_be!(read_u32, u32, 4, BigEndian::read_u32);
    read_be!(read_i32, i32, 4, BigEndian::read_i32);
    read_be!(read_u64, u64, 8, BigEndian::read_u64);
    read_be!(read_i64, i64, 8, BigEndian::read_i64);
    read_be!(read_f32, f32, 4, BigEndian::read_f32);
    read_be!(read_f64, f64, 8, BigEndian::read_f64);

    /// Читает массив фиксированной длины.
    fn read_fixed<const N: usize>(&mut self) -> TagResult<[u8; N]> {
        let mut buf = [0u8; N];
        read_full(self, &mut buf)?;
        Ok(buf)
    }

    /// Читает ровно `len` байт.
    ///
    /// Буфер растёт по мере чтения, поэтому заведомо ложная длина не приводит
    /// к выделению памяти под весь объявленный размер.
    fn read_bytes(
        &mut self,
        len: u64,
    ) -> TagResult<Vec<u8>> {
        let mut buf = Vec::new();
        Read::take(&mut *self, len).read_to_end(&mut buf)?;
        if (buf.len() as u64) < len {
            return Err(TagError::UnexpectedEndOfStream {
                expected: len,
                got: buf.len() as u64,
            });
        }
        Ok(buf)
    }

    /// Читает `len` байт и проверяет, что это корректный UTF-8.
    fn read_utf8(
        &mut self,
        len: u64,
    ) -> TagResult<String> {
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes).map_err(|e| {
            FormatError::BadUtf8 {
                reason: e.utf8_error().to_string(),
            }
            .into()
        })
    }
}

/// Запись примитивов фиксированной ширины.
pub trait WriteBytes: Write {
    fn write_u8(
        &mut self,
        value: u8,
    ) -> TagResult<()> {
        write_full(self, &[value])
    }

    fn write_i8(
        &mut self,
        value: i8,
    ) -> TagResult<()> {
        self.write_u8(value as u8)
    }

    write_be!(write_u16, u16, 2, BigEndian::write_u16);
    write_be!(write_i16, i16, 2, BigEndian::write_i16);
    write_be!(write_u32, u32, 4, BigEndian::write_u32);
    write_be!(write_i32, i32, 4, BigEndian::write_i32);
    write_be!(write_u64, u64, 8, BigEndian::write_u64);
    write_be!(write_i64, i64, 8, BigEndian::write_i64);
    write_be!(write_f32, f32, 4, BigEndian::write_f32);
    write_be!(write_f64, f64, 8, BigEndian::write_f64);

    fn write_bytes(
        &mut self,
        bytes: &[u8],
    ) -> TagResult<()> {
        write_full(self, bytes)
    }
}

impl<R: Read + ?Sized> ReadBytes for R {}
impl<W: Write + ?Sized> WriteBytes for W {}

/// Writer-обёртка, считающая записанные байты.
pub struct CountingWriter<'a> {
    inner: &'a mut dyn Write,
    count: u64,
}

impl<'a> CountingWriter<'a> {
    pub fn new(inner: &'a mut dyn Write) -> Self {
        Self { inner, count: 0 }
    }

    /// Кол-во байт, принятых нижележащим writer.
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Write for CountingWriter<'_> {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
