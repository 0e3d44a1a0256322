//! Примитивные payload: числа фиксированной ширины, varint, байты и строки.

use std::io::{Read, Write};

use tagwire_error::{FormatError, TagResult};

use super::{Payload, StandardPayload, TagFactory};
use crate::codec::{
    encoded_size, parse_exact, read_signed_varint, read_varint, signed_encoded_size,
    write_signed_varint, write_varint, DeclaredSize, ReadBytes, StandardTag, WriteBytes,
};

/// Payload фиксированной ширины вида `Name(pub T)`.
macro_rules! fixed_payload {
    (
        $(#[$meta:meta])*
        $name:ident($ty:ty), $tag:ident, $width:expr, $read:ident, $write:ident $(, $derive:ident)*
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq $(, $derive)*)]
        pub struct $name(pub $ty);

        impl Payload for $name {
            fn value_size(&self) -> u64 {
                $width
            }

            fn serialize_value(
                &self,
                w: &mut dyn Write,
            ) -> TagResult<()> {
                w.$write(self.0)
            }

            fn deserialize_value(
                &mut self,
                _factory: &TagFactory,
                size: DeclaredSize,
                r: &mut dyn Read,
            ) -> TagResult<()> {
                size.require_exact($width, stringify!($name))?;
                self.0 = r.$read()?;
                Ok(())
            }
        }

        impl StandardPayload for $name {
            const TAG: StandardTag = StandardTag::$tag;
        }

        impl From<$ty> for $name {
            fn from(value: $ty) -> Self {
                Self(value)
            }
        }

        impl From<$name> for $ty {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

fixed_payload!(UInt8(u8), UInt8, 1, read_u8, write_u8, Eq, Hash);
fixed_payload!(Int8(i8), Int8, 1, read_i8, write_i8, Eq, Hash);
fixed_payload!(UInt16(u16), UInt16, 2, read_u16, write_u16, Eq, Hash);
fixed_payload!(Int16(i16), Int16, 2, read_i16, write_i16, Eq, Hash);
fixed_payload!(UInt32(u32), UInt32, 4, read_u32, write_u32, Eq, Hash);
fixed_payload!(Int32(i32), Int32, 4, read_i32, write_i32, Eq, Hash);
fixed_payload!(UInt64(u64), UInt64, 8, read_u64, write_u64, Eq, Hash);
fixed_payload!(Int64(i64), Int64, 8, read_i64, write_i64, Eq, Hash);
fixed_payload!(
    /// IEEE 754 binary32
    Float32(f32), Float32, 4, read_f32, write_f32
);
fixed_payload!(
    /// IEEE 754 binary64
    Float64(f64), Float64, 8, read_f64, write_f64
);

/// Пустой payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Null;

impl Payload for Null {
    fn value_size(&self) -> u64 {
        0
    }

    fn serialize_value(
        &self,
        _w: &mut dyn Write,
    ) -> TagResult<()> {
        Ok(())
    }

    fn deserialize_value(
        &mut self,
        _factory: &TagFactory,
        size: DeclaredSize,
        _r: &mut dyn Read,
    ) -> TagResult<()> {
        size.require_exact(0, "null")
    }
}

impl StandardPayload for Null {
    const TAG: StandardTag = StandardTag::Null;
}

/// Логическое значение. Любой ненулевой байт читается как `true`,
/// записывается всегда `1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Bool(pub bool);

impl Payload for Bool {
    fn value_size(&self) -> u64 {
        1
    }

    fn serialize_value(
        &self,
        w: &mut dyn Write,
    ) -> TagResult<()> {
        w.write_u8(self.0 as u8)
    }

    fn deserialize_value(
        &mut self,
        _factory: &TagFactory,
        size: DeclaredSize,
        r: &mut dyn Read,
    ) -> TagResult<()> {
        size.require_exact(1, "bool")?;
        self.0 = r.read_u8()? != 0;
        Ok(())
    }
}

impl StandardPayload for Bool {
    const TAG: StandardTag = StandardTag::Bool;
}

impl From<bool> for Bool {
    fn from(value: bool) -> Self {
        Self(value)
    }
}

/// IEEE 754 binary128 в виде 16 байт big-endian.
///
/// Арифметики над значением нет: payload только переносит биты.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Float128(pub [u8; 16]);

impl Float128 {
    /// Точное представление `f64` в binary128.
    pub fn from_f64(value: f64) -> Self {
        let bits = value.to_bits();
        let sign = (bits >> 63) as u128;
        let exp = ((bits >> 52) & 0x7FF) as i64;
        let frac = (bits & ((1 << 52) - 1)) as u128;

        let (exp128, frac128) = match exp {
            0 if frac == 0 => (0u128, 0u128),
            0 => {
                // субнормальное f64 становится нормальным в binary128
                let shift = frac.leading_zeros() as i64 - (128 - 52);
                let e = 1 - 1023 - shift - 1 + 16383;
                let f = (frac << (shift + 1)) & ((1 << 52) - 1);
                (e as u128, f << 60)
            }
            0x7FF => (0x7FFF, frac << 60),
            _ => ((exp - 1023 + 16383) as u128, frac << 60),
        };

        let bits128 = (sign << 127) | (exp128 << 112) | frac128;
        Self(bits128.to_be_bytes())
    }

    pub fn to_bits(&self) -> u128 {
        u128::from_be_bytes(self.0)
    }
}

impl Payload for Float128 {
    fn value_size(&self) -> u64 {
        16
    }

    fn serialize_value(
        &self,
        w: &mut dyn Write,
    ) -> TagResult<()> {
        w.write_bytes(&self.0)
    }

    fn deserialize_value(
        &mut self,
        _factory: &TagFactory,
        size: DeclaredSize,
        r: &mut dyn Read,
    ) -> TagResult<()> {
        size.require_exact(16, "float128")?;
        self.0 = r.read_fixed::<16>()?;
        Ok(())
    }
}

impl StandardPayload for Float128 {
    const TAG: StandardTag = StandardTag::Float128;
}

/// Беззнаковый varint. Под неявным ID 10 завершает себя сам, под явным
/// ID обязан занять ровно объявленный размер.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Varint(pub u64);

impl Payload for Varint {
    fn value_size(&self) -> u64 {
        encoded_size(self.0) as u64
    }

    fn serialize_value(
        &self,
        w: &mut dyn Write,
    ) -> TagResult<()> {
        write_varint(w, self.0)?;
        Ok(())
    }

    fn deserialize_value(
        &mut self,
        _factory: &TagFactory,
        size: DeclaredSize,
        r: &mut dyn Read,
    ) -> TagResult<()> {
        let (value, _) = match size {
            DeclaredSize::SelfDelimited => read_varint(r)?,
            DeclaredSize::Exact(n) => parse_exact(r, n, "varint", |sub| read_varint(sub))?,
        };
        self.0 = value;
        Ok(())
    }
}

impl StandardPayload for Varint {
    const TAG: StandardTag = StandardTag::Varint;
}

impl From<u64> for Varint {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Знаковый varint (zigzag).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SignedVarint(pub i64);

impl Payload for SignedVarint {
    fn value_size(&self) -> u64 {
        signed_encoded_size(self.0) as u64
    }

    fn serialize_value(
        &self,
        w: &mut dyn Write,
    ) -> TagResult<()> {
        write_signed_varint(w, self.0)?;
        Ok(())
    }

    fn deserialize_value(
        &mut self,
        _factory: &TagFactory,
        size: DeclaredSize,
        r: &mut dyn Read,
    ) -> TagResult<()> {
        let (value, _) = match size {
            DeclaredSize::SelfDelimited => read_signed_varint(r)?,
            DeclaredSize::Exact(n) => {
                parse_exact(r, n, "signed varint", |sub| read_signed_varint(sub))?
            }
        };
        self.0 = value;
        Ok(())
    }
}

impl StandardPayload for SignedVarint {
    const TAG: StandardTag = StandardTag::SignedVarint;
}

impl From<i64> for SignedVarint {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Сырые байты. Размер всегда явный.
///
/// Этим же payload фабрика в permissive-режиме сохраняет теги с
/// неизвестным ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl Payload for Bytes {
    fn value_size(&self) -> u64 {
        self.0.len() as u64
    }

    fn serialize_value(
        &self,
        w: &mut dyn Write,
    ) -> TagResult<()> {
        w.write_bytes(&self.0)
    }

    fn deserialize_value(
        &mut self,
        _factory: &TagFactory,
        size: DeclaredSize,
        r: &mut dyn Read,
    ) -> TagResult<()> {
        let len = size.exact("bytes")?;
        self.0 = r.read_bytes(len)?;
        Ok(())
    }
}

impl StandardPayload for Bytes {
    const TAG: StandardTag = StandardTag::Bytes;
}

impl From<Vec<u8>> for Bytes {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl From<&[u8]> for Bytes {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

/// Строка UTF-8.
///
/// Некорректный UTF-8 не представим: он отвергается и при чтении из потока,
/// и в [`Utf8String::from_utf8`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Utf8String(pub String);

impl Utf8String {
    /// Проверяет байты и создаёт строку.
    pub fn from_utf8(bytes: Vec<u8>) -> TagResult<Self> {
        String::from_utf8(bytes).map(Self).map_err(|e| {
            FormatError::BadUtf8 {
                reason: e.utf8_error().to_string(),
            }
            .into()
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Payload for Utf8String {
    fn value_size(&self) -> u64 {
        self.0.len() as u64
    }

    fn serialize_value(
        &self,
        w: &mut dyn Write,
    ) -> TagResult<()> {
        w.write_bytes(self.0.as_bytes())
    }

    fn deserialize_value(
        &mut self,
        _factory: &TagFactory,
        size: DeclaredSize,
        r: &mut dyn Read,
    ) -> TagResult<()> {
        let len = size.exact("string")?;
        self.0 = r.read_utf8(len)?;
        Ok(())
    }
}

impl StandardPayload for Utf8String {
    const TAG: StandardTag = StandardTag::String;
}

impl From<String> for Utf8String {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Utf8String {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use tagwire_error::TagError;

    use super::*;

    fn write<P: Payload>(payload: &P) -> Vec<u8> {
        let mut buf = Vec::new();
        payload.serialize_value(&mut buf).unwrap();
        assert_eq!(buf.len() as u64, payload.value_size());
        buf
    }

    fn read<P: Payload + Default>(
        size: DeclaredSize,
        bytes: &[u8],
    ) -> TagResult<P> {
        let factory = TagFactory::new();
        let mut payload = P::default();
        payload.deserialize_value(&factory, size, &mut Cursor::new(bytes))?;
        Ok(payload)
    }

    #[test]
    fn test_fixed_width_big_endian() {
        assert_eq!(write(&UInt16(0x1234)), vec![0x12, 0x34]);
        assert_eq!(write(&Int32(-1)), vec![0xFF; 4]);
        assert_eq!(write(&UInt64(1)), vec![0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(
            read::<Int16>(DeclaredSize::Exact(2), &[0xFF, 0xFE]).unwrap(),
            Int16(-2)
        );
    }

    #[test]
    fn test_fixed_width_size_mismatch() {
        let err = read::<UInt32>(DeclaredSize::Exact(3), &[0, 0, 0]).unwrap_err();
        assert!(matches!(
            err,
            TagError::BadTagFormat(FormatError::SizeMismatch {
                expected: 4,
                declared: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_bool_nonzero_is_true() {
        assert_eq!(read::<Bool>(DeclaredSize::Exact(1), &[0x7F]).unwrap(), Bool(true));
        assert_eq!(read::<Bool>(DeclaredSize::Exact(1), &[0x00]).unwrap(), Bool(false));
        assert_eq!(write(&Bool(true)), vec![0x01]);
    }

    #[test]
    fn test_null_is_empty() {
        assert!(write(&Null).is_empty());
        assert!(read::<Null>(DeclaredSize::Exact(1), &[0]).is_err());
    }

    #[test]
    fn test_float_roundtrip() {
        let bytes = write(&Float64(-0.5));
        assert_eq!(read::<Float64>(DeclaredSize::Exact(8), &bytes).unwrap(), Float64(-0.5));
        let bytes = write(&Float32(3.25));
        assert_eq!(read::<Float32>(DeclaredSize::Exact(4), &bytes).unwrap(), Float32(3.25));
    }

    #[test]
    fn test_float128_from_f64() {
        assert_eq!(Float128::from_f64(0.0).to_bits(), 0);
        assert_eq!(
            Float128::from_f64(1.0).to_bits(),
            0x3FFF_0000_0000_0000_0000_0000_0000_0000
        );
        assert_eq!(
            Float128::from_f64(-2.0).to_bits(),
            0xC000_0000_0000_0000_0000_0000_0000_0000
        );
        assert_eq!(
            Float128::from_f64(f64::INFINITY).to_bits(),
            0x7FFF_0000_0000_0000_0000_0000_0000_0000
        );
        // наименьшее субнормальное f64 = 2^-1074
        assert_eq!(
            Float128::from_f64(f64::from_bits(1)).to_bits(),
            ((16383u128 - 1074) << 112)
        );

        let value = Float128::from_f64(1.5);
        let bytes = write(&value);
        assert_eq!(bytes.len(), 16);
        assert_eq!(read::<Float128>(DeclaredSize::Exact(16), &bytes).unwrap(), value);
    }

    #[test]
    fn test_varint_self_delimited() {
        let bytes = write(&Varint(1_234_567_890));
        assert_eq!(bytes, vec![0xFB, 0x49, 0x96, 0x01, 0xDA]);
        assert_eq!(
            read::<Varint>(DeclaredSize::SelfDelimited, &bytes).unwrap(),
            Varint(1_234_567_890)
        );
    }

    #[test]
    fn test_varint_exact_must_match() {
        assert_eq!(read::<Varint>(DeclaredSize::Exact(1), &[0x05]).unwrap(), Varint(5));
        let err = read::<Varint>(DeclaredSize::Exact(2), &[0x05, 0x00]).unwrap_err();
        assert!(matches!(
            err,
            TagError::BadTagFormat(FormatError::TrailingBytes { remaining: 1, .. })
        ));
    }

    #[test]
    fn test_signed_varint() {
        for v in [0, -1, 1, i64::MIN, i64::MAX] {
            let bytes = write(&SignedVarint(v));
            assert_eq!(
                read::<SignedVarint>(DeclaredSize::SelfDelimited, &bytes).unwrap(),
                SignedVarint(v)
            );
        }
        assert_eq!(write(&SignedVarint(-1)), vec![0x01]);
    }

    #[test]
    fn test_bytes_requires_size() {
        assert!(matches!(
            read::<Bytes>(DeclaredSize::SelfDelimited, &[]).unwrap_err(),
            TagError::BadTagFormat(FormatError::SizeRequired { .. })
        ));
        assert_eq!(
            read::<Bytes>(DeclaredSize::Exact(3), &[1, 2, 3]).unwrap(),
            Bytes(vec![1, 2, 3])
        );
    }

    #[test]
    fn test_string_utf8() {
        let s = Utf8String::from("привет");
        assert_eq!(s.value_size(), 12);
        let bytes = write(&s);
        assert_eq!(read::<Utf8String>(DeclaredSize::Exact(12), &bytes).unwrap(), s);

        let err = read::<Utf8String>(DeclaredSize::Exact(2), &[0xC3, 0x28]).unwrap_err();
        assert!(matches!(
            err,
            TagError::BadTagFormat(FormatError::BadUtf8 { .. })
        ));
        assert!(Utf8String::from_utf8(vec![0xFF]).is_err());
    }

    #[test]
    fn test_short_stream() {
        let err = read::<UInt64>(DeclaredSize::Exact(8), &[1, 2, 3]).unwrap_err();
        assert!(matches!(
            err,
            TagError::UnexpectedEndOfStream {
                expected: 8,
                got: 3
            }
        ));
    }
}
