use std::io::{Read, Write};

use tagwire_error::{FormatError, TagResult};

use super::PREALLOC_LIMIT;
use crate::{
    codec::{
        encoded_size, ensure_count_fits, header_size, parse_exact, read_varint, write_varint,
        DeclaredSize, StandardTag, SubReader, TAG_STRING,
    },
    collections::OrderedMap,
    tag::{Payload, StandardPayload, Tag, TagFactory, Utf8String},
};

// Ключи и строковые значения лежат в словаре вложенными String-тегами.

fn string_tag(s: &str) -> Tag {
    Tag::from(Utf8String::from(s))
}

fn string_tag_size(s: &str) -> u64 {
    let len = s.len() as u64;
    header_size(TAG_STRING, len) + len
}

fn write_string_tag(
    w: &mut dyn Write,
    s: &str,
) -> TagResult<()> {
    string_tag(s).serialize(w).map(drop)
}

/// Читает String-тег; тег другого ID даёт `UnexpectedTagId`.
fn read_string_tag(
    factory: &TagFactory,
    sub: &mut SubReader<'_>,
) -> TagResult<String> {
    let mut tag = Tag::from(Utf8String::default());
    factory.deserialize_into(&mut tag, sub)?;
    Ok(tag
        .into_payload::<Utf8String>()
        .map(|s| s.0)
        .unwrap_or_default())
}

/// Общий разбор словаря: счётчик и `count` пар, ключи уникальны.
fn read_pairs<V>(
    factory: &TagFactory,
    size: DeclaredSize,
    r: &mut dyn Read,
    what: &'static str,
    mut read_value: impl FnMut(&mut SubReader<'_>) -> TagResult<V>,
) -> TagResult<OrderedMap<String, V>> {
    let declared = size.at_least(1, what)?;
    parse_exact(r, declared, what, |sub| {
        let (count, _) = read_varint(sub)?;
        ensure_count_fits(sub, count, what)?;

        let mut map = OrderedMap::with_capacity(count.min(PREALLOC_LIMIT) as usize);
        for _ in 0..count {
            let key = read_string_tag(factory, sub)?;
            let value = read_value(sub)?;
            if map.contains_key(&key) {
                return Err(FormatError::DuplicateKey { what, key }.into());
            }
            map.put(key, value);
        }
        Ok(map)
    })
}

/// Словарь строка -> тег в порядке первой вставки.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary(pub OrderedMap<String, Tag>);

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<&Tag> {
        self.0.get(key)
    }

    pub fn put(
        &mut self,
        key: impl Into<String>,
        tag: impl Into<Tag>,
    ) -> Option<Tag> {
        self.0.put(key.into(), tag.into())
    }

    pub fn remove(
        &mut self,
        key: &str,
    ) -> Option<Tag> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Payload for Dictionary {
    fn value_size(&self) -> u64 {
        let pairs: u64 = self.0.iter().map(|(k, v)| string_tag_size(k) + v.size()).sum();
        encoded_size(self.0.len() as u64) as u64 + pairs
    }

    fn serialize_value(
        &self,
        w: &mut dyn Write,
    ) -> TagResult<()> {
        write_varint(w, self.0.len() as u64)?;
        for (key, tag) in &self.0 {
            write_string_tag(w, key)?;
            tag.serialize(w)?;
        }
        Ok(())
    }

    fn deserialize_value(
        &mut self,
        factory: &TagFactory,
        size: DeclaredSize,
        r: &mut dyn Read,
    ) -> TagResult<()> {
        self.0 = read_pairs(factory, size, r, "dictionary", |sub| {
            factory.deserialize(sub)
        })?;
        Ok(())
    }
}

impl StandardPayload for Dictionary {
    const TAG: StandardTag = StandardTag::Dictionary;
}

/// Словарь строка -> строка в порядке первой вставки.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringDictionary(pub OrderedMap<String, String>);

impl StringDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn put(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        self.0.put(key.into(), value.into())
    }

    pub fn remove(
        &mut self,
        key: &str,
    ) -> Option<String> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Payload for StringDictionary {
    fn value_size(&self) -> u64 {
        let pairs: u64 = self.0.iter().map(|(k, v)| string_tag_size(k) + string_tag_size(v)).sum();
        encoded_size(self.0.len() as u64) as u64 + pairs
    }

    fn serialize_value(
        &self,
        w: &mut dyn Write,
    ) -> TagResult<()> {
        write_varint(w, self.0.len() as u64)?;
        for (key, value) in &self.0 {
            write_string_tag(w, key)?;
            write_string_tag(w, value)?;
        }
        Ok(())
    }

    fn deserialize_value(
        &mut self,
        factory: &TagFactory,
        size: DeclaredSize,
        r: &mut dyn Read,
    ) -> TagResult<()> {
        self.0 = read_pairs(factory, size, r, "string dictionary", |sub| {
            read_string_tag(factory, sub)
        })?;
        Ok(())
    }
}

impl StandardPayload for StringDictionary {
    const TAG: StandardTag = StandardTag::StringDictionary;
}
