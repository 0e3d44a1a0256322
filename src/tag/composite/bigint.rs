use std::io::{Read, Write};

use rust_decimal::Decimal;
use tagwire_error::TagResult;

use crate::{
    codec::{parse_exact, DeclaredSize, ReadBytes, StandardTag, WriteBytes},
    tag::{Payload, StandardPayload, TagFactory},
};

/// Целое произвольной длины в дополнительном коде, big-endian.
///
/// **ИНВАРИАНТ:** `bytes` никогда не пуст; ноль хранится как `[0x00]`.
/// Избыточные знаковые байты, пришедшие из потока, сохраняются как есть,
/// поэтому повторная сериализация даёт те же байты.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BigInt {
    bytes: Vec<u8>,
}

/// Отбрасывает ведущие байты, которые лишь повторяют знак.
fn minimal(bytes: &[u8]) -> &[u8] {
    let mut start = 0;
    while start + 1 < bytes.len() {
        let (head, next) = (bytes[start], bytes[start + 1]);
        let redundant =
            (head == 0x00 && next & 0x80 == 0) || (head == 0xFF && next & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    &bytes[start..]
}

impl BigInt {
    /// Создаёт значение из байт дополнительного кода. Пустой срез означает ноль.
    pub fn from_be_bytes(bytes: Vec<u8>) -> Self {
        if bytes.is_empty() {
            return Self::default();
        }
        Self { bytes }
    }

    pub fn from_i128(value: i128) -> Self {
        Self {
            bytes: minimal(&value.to_be_bytes()).to_vec(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_negative(&self) -> bool {
        self.bytes[0] & 0x80 != 0
    }

    /// Значение как `i128`, если оно туда помещается.
    pub fn to_i128(&self) -> Option<i128> {
        let significant = minimal(&self.bytes);
        if significant.len() > 16 {
            return None;
        }
        let fill = if self.is_negative() { 0xFF } else { 0x00 };
        let mut buf = [fill; 16];
        buf[16 - significant.len()..].copy_from_slice(significant);
        Some(i128::from_be_bytes(buf))
    }
}

impl Default for BigInt {
    fn default() -> Self {
        Self { bytes: vec![0x00] }
    }
}

impl From<i128> for BigInt {
    fn from(value: i128) -> Self {
        Self::from_i128(value)
    }
}

impl From<i64> for BigInt {
    fn from(value: i64) -> Self {
        Self::from_i128(value as i128)
    }
}

impl Payload for BigInt {
    fn value_size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn serialize_value(
        &self,
        w: &mut dyn Write,
    ) -> TagResult<()> {
        w.write_bytes(&self.bytes)
    }

    fn deserialize_value(
        &mut self,
        _factory: &TagFactory,
        size: DeclaredSize,
        r: &mut dyn Read,
    ) -> TagResult<()> {
        let len = size.at_least(1, "big integer")?;
        self.bytes = r.read_bytes(len)?;
        Ok(())
    }
}

impl StandardPayload for BigInt {
    const TAG: StandardTag = StandardTag::BigInt;
}

/// Десятичное число: `unscaled * 10^-scale`.
///
/// На проводе: байты [`BigInt`] и за ними `i32` масштаба.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BigDec {
    pub unscaled: BigInt,
    pub scale: i32,
}

impl BigDec {
    pub fn new(
        unscaled: BigInt,
        scale: i32,
    ) -> Self {
        Self { unscaled, scale }
    }

    /// Значение как `Decimal`, если мантисса и масштаб помещаются.
    pub fn to_decimal(&self) -> Option<Decimal> {
        let mut mantissa = self.unscaled.to_i128()?;
        let mut scale = self.scale;
        if mantissa == 0 && scale < 0 {
            return Some(Decimal::ZERO);
        }
        // Ненулевая мантисса, умноженная на 10^39, уже не помещается в i128.
        if scale < -38 {
            return None;
        }
        while scale < 0 {
            mantissa = mantissa.checked_mul(10)?;
            scale += 1;
        }
        Decimal::try_from_i128_with_scale(mantissa, scale as u32).ok()
    }
}

impl From<Decimal> for BigDec {
    fn from(value: Decimal) -> Self {
        Self {
            unscaled: BigInt::from_i128(value.mantissa()),
            scale: value.scale() as i32,
        }
    }
}

impl Payload for BigDec {
    fn value_size(&self) -> u64 {
        self.unscaled.value_size() + 4
    }

    fn serialize_value(
        &self,
        w: &mut dyn Write,
    ) -> TagResult<()> {
        self.unscaled.serialize_value(w)?;
        w.write_i32(self.scale)
    }

    fn deserialize_value(
        &mut self,
        _factory: &TagFactory,
        size: DeclaredSize,
        r: &mut dyn Read,
    ) -> TagResult<()> {
        let declared = size.at_least(5, "big decimal")?;
        let (bytes, scale) = parse_exact(r, declared, "big decimal", |sub| {
            let bytes = sub.read_bytes(declared - 4)?;
            let scale = sub.read_i32()?;
            Ok((bytes, scale))
        })?;
        self.unscaled = BigInt::from_be_bytes(bytes);
        self.scale = scale;
        Ok(())
    }
}

impl StandardPayload for BigDec {
    const TAG: StandardTag = StandardTag::BigDec;
}

#[cfg(test)]
mod tests {
    use std::{io::Cursor, str::FromStr};

    use tagwire_error::{FormatError, TagError};

    use super::*;

    fn roundtrip<P: Payload + Default>(value: &P) -> P {
        let mut buf = Vec::new();
        value.serialize_value(&mut buf).unwrap();
        assert_eq!(buf.len() as u64, value.value_size());

        let mut out = P::default();
        out.deserialize_value(
            &TagFactory::new(),
            DeclaredSize::Exact(buf.len() as u64),
            &mut Cursor::new(buf),
        )
        .unwrap();
        out
    }

    #[test]
    fn test_bigint_minimal_encoding() {
        assert_eq!(BigInt::from_i128(0).as_bytes(), &[0x00]);
        assert_eq!(BigInt::from_i128(127).as_bytes(), &[0x7F]);
        assert_eq!(BigInt::from_i128(128).as_bytes(), &[0x00, 0x80]);
        assert_eq!(BigInt::from_i128(-1).as_bytes(), &[0xFF]);
        assert_eq!(BigInt::from_i128(-129).as_bytes(), &[0xFF, 0x7F]);
        assert_eq!(BigInt::from_be_bytes(Vec::new()), BigInt::default());
    }

    #[test]
    fn test_bigint_i128_conversion() {
        for v in [0, 1, -1, 255, -256, i128::MAX, i128::MIN] {
            let big = BigInt::from(v);
            assert_eq!(big.to_i128(), Some(v));
            assert_eq!(roundtrip(&big), big);
        }
        // лишние знаковые байты не мешают конверсии
        let padded = BigInt::from_be_bytes(vec![0xFF, 0xFF, 0xFE]);
        assert_eq!(padded.to_i128(), Some(-2));
        assert_eq!(padded.value_size(), 3);

        let huge = BigInt::from_be_bytes(vec![0x01; 17]);
        assert_eq!(huge.to_i128(), None);
    }

    #[test]
    fn test_bigint_rejects_empty() {
        let mut big = BigInt::default();
        let err = big
            .deserialize_value(
                &TagFactory::new(),
                DeclaredSize::Exact(0),
                &mut Cursor::new(Vec::new()),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            TagError::BadTagFormat(FormatError::TooShort { minimum: 1, .. })
        ));
    }

    #[test]
    fn test_bigdec_layout() {
        let dec = BigDec::new(BigInt::from(-5i64), 2);
        let mut buf = Vec::new();
        dec.serialize_value(&mut buf).unwrap();
        assert_eq!(buf, vec![0xFB, 0x00, 0x00, 0x00, 0x02]);
        assert_eq!(roundtrip(&dec), dec);
    }

    #[test]
    fn test_bigdec_too_short() {
        let mut dec = BigDec::default();
        let err = dec
            .deserialize_value(
                &TagFactory::new(),
                DeclaredSize::Exact(4),
                &mut Cursor::new(vec![0; 4]),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            TagError::BadTagFormat(FormatError::TooShort { minimum: 5, .. })
        ));
    }

    #[test]
    fn test_decimal_conversion() {
        let d = Decimal::from_str("-1234.5678").unwrap();
        let dec = BigDec::from(d);
        assert_eq!(dec.scale, 4);
        assert_eq!(dec.unscaled.to_i128(), Some(-12_345_678));
        assert_eq!(dec.to_decimal(), Some(d));

        let shifted = BigDec::new(BigInt::from(12i64), -3);
        assert_eq!(shifted.to_decimal(), Some(Decimal::from(12_000)));

        let unrepresentable = BigDec::new(BigInt::from(1i64), 40);
        assert_eq!(unrepresentable.to_decimal(), None);
    }

    /// Тест проверяет, что экстремальный отрицательный масштаб решается
    /// сразу, без пошагового умножения.
    #[test]
    fn test_decimal_extreme_negative_scale() {
        let zero = BigDec::new(BigInt::from(0i64), i32::MIN);
        assert_eq!(zero.to_decimal(), Some(Decimal::ZERO));

        let one = BigDec::new(BigInt::from(1i64), i32::MIN);
        assert_eq!(one.to_decimal(), None);

        let edge = BigDec::new(BigInt::from(1i64), -39);
        assert_eq!(edge.to_decimal(), None);
    }
}
