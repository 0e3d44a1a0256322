use std::io::{Read, Write};

use tagwire_error::TagResult;

use super::PREALLOC_LIMIT;
use crate::{
    codec::{
        encoded_size, ensure_count_fits, parse_exact, read_varint, write_varint, DeclaredSize,
        StandardTag, SubReader,
    },
    tag::{Payload, StandardPayload, Tag, TagFactory},
};

////////////////////////////////////////////////////////////////////////////////
// Списки varint
////////////////////////////////////////////////////////////////////////////////

fn varints_size(values: &[u64]) -> u64 {
    let body: u64 = values.iter().map(|&v| encoded_size(v) as u64).sum();
    encoded_size(values.len() as u64) as u64 + body
}

fn write_varints(
    values: &[u64],
    w: &mut dyn Write,
) -> TagResult<()> {
    write_varint(w, values.len() as u64)?;
    for &v in values {
        write_varint(w, v)?;
    }
    Ok(())
}

fn read_varints(
    size: DeclaredSize,
    r: &mut dyn Read,
    what: &'static str,
) -> TagResult<Vec<u64>> {
    let declared = size.at_least(1, what)?;
    parse_exact(r, declared, what, |sub| {
        let (count, _) = read_varint(sub)?;
        ensure_count_fits(sub, count, what)?;

        let mut values = Vec::with_capacity(count.min(PREALLOC_LIMIT) as usize);
        for _ in 0..count {
            values.push(read_varint(sub)?.0);
        }
        Ok(values)
    })
}

/// Массив varint: `Varint(count)` и элементы. Пустой массив кодируется как `0x00`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VarintArray(pub Vec<u64>);

impl Payload for VarintArray {
    fn value_size(&self) -> u64 {
        varints_size(&self.0)
    }

    fn serialize_value(
        &self,
        w: &mut dyn Write,
    ) -> TagResult<()> {
        write_varints(&self.0, w)
    }

    fn deserialize_value(
        &mut self,
        _factory: &TagFactory,
        size: DeclaredSize,
        r: &mut dyn Read,
    ) -> TagResult<()> {
        self.0 = read_varints(size, r, "varint array")?;
        Ok(())
    }
}

impl StandardPayload for VarintArray {
    const TAG: StandardTag = StandardTag::VarintArray;
}

impl From<Vec<u64>> for VarintArray {
    fn from(value: Vec<u64>) -> Self {
        Self(value)
    }
}

/// Идентификатор объекта (OID), компоненты хранятся как массив varint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Oid(pub Vec<u64>);

impl Oid {
    pub fn components(&self) -> &[u64] {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl Payload for Oid {
    fn value_size(&self) -> u64 {
        varints_size(&self.0)
    }

    fn serialize_value(
        &self,
        w: &mut dyn Write,
    ) -> TagResult<()> {
        write_varints(&self.0, w)
    }

    fn deserialize_value(
        &mut self,
        _factory: &TagFactory,
        size: DeclaredSize,
        r: &mut dyn Read,
    ) -> TagResult<()> {
        self.0 = read_varints(size, r, "oid")?;
        Ok(())
    }
}

impl StandardPayload for Oid {
    const TAG: StandardTag = StandardTag::Oid;
}

////////////////////////////////////////////////////////////////////////////////
// Вложенные теги
////////////////////////////////////////////////////////////////////////////////

fn tags_size(tags: &[Tag]) -> u64 {
    tags.iter().map(Tag::size).sum()
}

fn write_tags(
    tags: &[Tag],
    w: &mut dyn Write,
) -> TagResult<()> {
    for tag in tags {
        tag.serialize(w)?;
    }
    Ok(())
}

/// Массив вложенных тегов со счётчиком.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagArray(pub Vec<Tag>);

impl Payload for TagArray {
    fn value_size(&self) -> u64 {
        encoded_size(self.0.len() as u64) as u64 + tags_size(&self.0)
    }

    fn serialize_value(
        &self,
        w: &mut dyn Write,
    ) -> TagResult<()> {
        write_varint(w, self.0.len() as u64)?;
        write_tags(&self.0, w)
    }

    fn deserialize_value(
        &mut self,
        factory: &TagFactory,
        size: DeclaredSize,
        r: &mut dyn Read,
    ) -> TagResult<()> {
        let declared = size.at_least(1, "tag array")?;
        self.0 = parse_exact(r, declared, "tag array", |sub| {
            let (count, _) = read_varint(sub)?;
            ensure_count_fits(sub, count, "tag array")?;

            let mut tags = Vec::with_capacity(count.min(PREALLOC_LIMIT) as usize);
            for _ in 0..count {
                tags.push(factory.deserialize(sub)?);
            }
            Ok(tags)
        })?;
        Ok(())
    }
}

impl StandardPayload for TagArray {
    const TAG: StandardTag = StandardTag::TagArray;
}

impl From<Vec<Tag>> for TagArray {
    fn from(value: Vec<Tag>) -> Self {
        Self(value)
    }
}

/// Последовательность вложенных тегов без счётчика: читается, пока не
/// исчерпан объявленный размер.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagSequence(pub Vec<Tag>);

fn read_sequence(
    factory: &TagFactory,
    sub: &mut SubReader<'_>,
) -> TagResult<Vec<Tag>> {
    let mut tags = Vec::new();
    while sub.limit() > 0 {
        tags.push(factory.deserialize(sub)?);
    }
    Ok(tags)
}

impl Payload for TagSequence {
    fn value_size(&self) -> u64 {
        tags_size(&self.0)
    }

    fn serialize_value(
        &self,
        w: &mut dyn Write,
    ) -> TagResult<()> {
        write_tags(&self.0, w)
    }

    fn deserialize_value(
        &mut self,
        factory: &TagFactory,
        size: DeclaredSize,
        r: &mut dyn Read,
    ) -> TagResult<()> {
        let declared = size.exact("tag sequence")?;
        self.0 = parse_exact(r, declared, "tag sequence", |sub| read_sequence(factory, sub))?;
        Ok(())
    }
}

impl StandardPayload for TagSequence {
    const TAG: StandardTag = StandardTag::TagSequence;
}

impl From<Vec<Tag>> for TagSequence {
    fn from(value: Vec<Tag>) -> Self {
        Self(value)
    }
}
