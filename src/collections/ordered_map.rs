use std::{borrow::Borrow, fmt, hash::Hash};

use rustc_hash::FxHashMap;

/// Словарь, сохраняющий порядок первой вставки ключей.
///
/// **ИНВАРИАНТЫ:**
///
/// - `index[k] == i` тогда и только тогда, когда `slots[i] == Some((k, _))`
/// - `live` равно кол-ву занятых слотов
/// - повторный `put` существующего ключа обновляет значение на месте и не
///   меняет порядок
///
/// `remove` оставляет в `slots` «надгробие» (`None`). Порядок и содержимое
/// от этого не меняются, но `slot_count()` растёт, пока не будет вызван
/// [`OrderedMap::rebuild`].
#[derive(Clone)]
pub struct OrderedMap<K, V> {
    slots: Vec<Option<(K, V)>>,
    index: FxHashMap<K, usize>,
    live: usize,
}

/// Итератор по живым записям в порядке вставки.
pub struct Iter<'a, K, V> {
    inner: std::slice::Iter<'a, Option<(K, V)>>,
    remaining: usize,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl<K, V> OrderedMap<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Создаёт пустой словарь.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            live: 0,
        }
    }

    /// Кол-во живых записей.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Кол-во слотов, включая надгробия.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Кол-во надгробий, оставленных `remove`.
    pub fn tombstones(&self) -> usize {
        self.slots.len() - self.live
    }

    pub fn contains_key<Q>(
        &self,
        key: &Q,
    ) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    pub fn get<Q>(
        &self,
        key: &Q,
    ) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.index.get(key)?;
        self.slots[slot].as_ref().map(|(_, v)| v)
    }

    pub fn get_mut<Q>(
        &mut self,
        key: &Q,
    ) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.index.get(key)?;
        self.slots[slot].as_mut().map(|(_, v)| v)
    }

    /// Вставляет или обновляет запись.
    ///
    /// Для существующего ключа значение заменяется на месте, порядок не
    /// меняется; возвращается старое значение.
    pub fn put(
        &mut self,
        key: K,
        value: V,
    ) -> Option<V> {
        if let Some(&slot) = self.index.get(&key) {
            if let Some((_, old)) = self.slots[slot].as_mut() {
                return Some(std::mem::replace(old, value));
            }
        }

        self.index.insert(key.clone(), self.slots.len());
        self.slots.push(Some((key, value)));
        self.live += 1;
        None
    }

    /// Удаляет запись, оставляя надгробие на её месте.
    pub fn remove<Q>(
        &mut self,
        key: &Q,
    ) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.index.remove(key)?;
        let (_, value) = self.slots[slot].take()?;
        self.live -= 1;
        Some(value)
    }

    /// Уплотняет слоты, убирая надгробия, и перестраивает индекс.
    pub fn rebuild(&mut self) {
        if self.tombstones() == 0 {
            return;
        }

        self.slots.retain(Option::is_some);
        self.index.clear();
        for (i, slot) in self.slots.iter().enumerate() {
            if let Some((key, _)) = slot {
                self.index.insert(key.clone(), i);
            }
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
        self.live = 0;
    }

    /// Живые записи в порядке вставки.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.slots.iter(),
            remaining: self.live,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl<K, V> Default for OrderedMap<K, V>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.inner.by_ref() {
            if let Some((k, v)) = slot {
                self.remaining -= 1;
                return Some((k, v));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K, V> IntoIterator for &'a OrderedMap<K, V>
where
    K: Hash + Eq + Clone,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> IntoIterator for OrderedMap<K, V> {
    type Item = (K, V);
    type IntoIter = std::iter::Flatten<std::vec::IntoIter<Option<(K, V)>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.into_iter().flatten()
    }
}

impl<K, V> FromIterator<(K, V)> for OrderedMap<K, V>
where
    K: Hash + Eq + Clone,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K, V> Extend<(K, V)> for OrderedMap<K, V>
where
    K: Hash + Eq + Clone,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(
        &mut self,
        iter: I,
    ) {
        for (k, v) in iter {
            self.put(k, v);
        }
    }
}

/// Равенство учитывает порядок записей, но не надгробия.
impl<K, V> PartialEq for OrderedMap<K, V>
where
    K: Hash + Eq + Clone,
    V: PartialEq,
{
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K, V> Eq for OrderedMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Eq,
{
}

impl<K, V> fmt::Debug for OrderedMap<K, V>
where
    K: Hash + Eq + Clone + fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
