use std::io::{Read, Write};

use tagwire_error::TagResult;

use crate::{
    codec::{
        encoded_size, parse_exact, read_varint, write_varint, DeclaredSize, ReadBytes,
        StandardTag, WriteBytes,
    },
    tag::{Payload, StandardPayload, TagFactory},
};

/// Полуоткрытый диапазон `start..start + count`.
///
/// На проводе: `Varint(start)` и `u16` счётчика. Минимальный размер 3 байта.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: u64,
    pub count: u16,
}

impl Range {
    pub fn new(
        start: u64,
        count: u16,
    ) -> Self {
        Self { start, count }
    }

    /// Исключающая верхняя граница (насыщается на `u64::MAX`).
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.count as u64)
    }

    pub fn contains(
        &self,
        value: u64,
    ) -> bool {
        value >= self.start && value - self.start < self.count as u64
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Payload for Range {
    fn value_size(&self) -> u64 {
        encoded_size(self.start) as u64 + 2
    }

    fn serialize_value(
        &self,
        w: &mut dyn Write,
    ) -> TagResult<()> {
        write_varint(w, self.start)?;
        w.write_u16(self.count)
    }

    fn deserialize_value(
        &mut self,
        _factory: &TagFactory,
        size: DeclaredSize,
        r: &mut dyn Read,
    ) -> TagResult<()> {
        let declared = size.at_least(3, "range")?;
        let (start, count) = parse_exact(r, declared, "range", |sub| {
            let (start, _) = read_varint(sub)?;
            let count = sub.read_u16()?;
            Ok((start, count))
        })?;
        *self = Self { start, count };
        Ok(())
    }
}

impl StandardPayload for Range {
    const TAG: StandardTag = StandardTag::Range;
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use tagwire_error::{FormatError, TagError};

    use super::*;

    fn decode(bytes: &[u8]) -> TagResult<Range> {
        let mut range = Range::default();
        range.deserialize_value(
            &TagFactory::new(),
            DeclaredSize::Exact(bytes.len() as u64),
            &mut Cursor::new(bytes),
        )?;
        Ok(range)
    }

    #[test]
    fn test_range_wire() {
        let range = Range::new(300, 10);
        let mut buf = Vec::new();
        range.serialize_value(&mut buf).unwrap();
        assert_eq!(buf, vec![0xF8, 0x34, 0x00, 0x0A]);
        assert_eq!(range.value_size(), 4);
        assert_eq!(decode(&buf).unwrap(), range);
    }

    #[test]
    fn test_range_bounds() {
        let range = Range::new(10, 5);
        assert_eq!(range.end(), 15);
        assert!(range.contains(10));
        assert!(range.contains(14));
        assert!(!range.contains(15));
        assert!(!range.contains(9));
        assert_eq!(Range::new(u64::MAX, 2).end(), u64::MAX);
        assert!(Range::new(3, 0).is_empty());
    }

    #[test]
    fn test_range_too_short() {
        let err = decode(&[0x01, 0x00]).unwrap_err();
        assert!(matches!(
            err,
            TagError::BadTagFormat(FormatError::TooShort { minimum: 3, .. })
        ));
    }

    #[test]
    fn test_range_leftover() {
        let err = decode(&[0x01, 0x00, 0x02, 0xFF]).unwrap_err();
        assert!(matches!(
            err,
            TagError::BadTagFormat(FormatError::TrailingBytes { remaining: 1, .. })
        ));
    }
}
