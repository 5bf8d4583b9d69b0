use std::fmt;
use std::marker::PhantomData;

/// Types that index a slot of a [`SparseMap`].
pub trait SparseIndex {
    fn sparse_index(&self) -> usize;
}

/// Values stored in slots addressed by a small dense key.
///
/// Archetypes use this to find a column from a component id without hashing.
#[derive(Clone)]
pub struct SparseMap<K: SparseIndex, V> {
    slots: Vec<Option<V>>,
    /// The amount of filled slots.
    len: usize,
    _key: PhantomData<fn(&K)>,
}

/// An iterator over the filled slots of a [`SparseMap`].
pub struct Values<I> {
    slots: I,
    remaining: usize,
}

impl<K: SparseIndex, V> SparseMap<K, V> {
    pub const fn new() -> Self {
        Self { slots: Vec::new(), len: 0, _key: PhantomData }
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.slots.get(key.sparse_index())?.as_ref()
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.slots.get_mut(key.sparse_index())?.as_mut()
    }

    /// Fills the slot of `key`, returning its previous value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let index = key.sparse_index();

        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }

        let previous = self.slots[index].replace(value);

        if previous.is_none() {
            self.len += 1;
        }

        previous
    }

    /// Returns an iterator over the values in slot order.
    pub fn iter(&self) -> Values<impl Iterator<Item = &V>> {
        Values {
            slots: self.slots.iter().filter_map(Option::as_ref),
            remaining: self.len,
        }
    }

    pub fn iter_mut(&mut self) -> Values<impl Iterator<Item = &mut V>> {
        Values {
            slots: self.slots.iter_mut().filter_map(Option::as_mut),
            remaining: self.len,
        }
    }
}

impl<I: Iterator> Iterator for Values<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let value = self.slots.next()?;

        self.remaining -= 1;

        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<I: Iterator> ExactSizeIterator for Values<I> {}

impl<K: SparseIndex, V: fmt::Debug> fmt::Debug for SparseMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<K: SparseIndex, V> Default for SparseMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: SparseIndex, V> FromIterator<(K, V)> for SparseMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();

        for (key, value) in iter {
            map.insert(key, value);
        }

        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl SparseIndex for usize {
        fn sparse_index(&self) -> usize {
            *self
        }
    }

    #[test]
    fn iteration_skips_empty_slots() {
        let mut map: SparseMap<usize, usize> =
            [(0, 0), (1, 1), (3, 3)].into_iter().collect();

        {
            let mut iter = map.iter().copied();

            assert_eq!(iter.len(), 3);
            assert_eq!(iter.next(), Some(0));
            assert_eq!(iter.next(), Some(1));
            assert_eq!(iter.len(), 1);
            assert_eq!(iter.next(), Some(3));
            assert_eq!(iter.next(), None);
        }

        for value in map.iter_mut() {
            *value *= 10;
        }

        assert_eq!(map.get(&3), Some(&30));
        assert_eq!(map.get(&2), None);
        assert_eq!(map.get(&10), None);
    }

    #[test]
    fn insert_replaces() {
        let mut map = SparseMap::<usize, &str>::new();

        assert_eq!(map.insert(5, "five"), None);
        assert_eq!(map.insert(5, "FIVE"), Some("five"));
        assert_eq!(map.len(), 1);
        assert!(!map.is_empty());
    }
}
