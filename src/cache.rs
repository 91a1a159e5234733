use std::cell::Cell;

use crate::hash::TableHash;

/// Direct-mapped computed table.
///
/// Each slot holds at most one entry; an insertion into an occupied slot simply
/// overwrites it. Keys are stored in full, so a hash collision is a miss,
/// never a wrong answer.
pub struct Cache<K, V> {
    data: Vec<Option<(K, V)>>,
    bitmask: u64,
    hits: Cell<usize>,
    misses: Cell<usize>,
}

impl<K, V> Cache<K, V> {
    /// Create a new cache of size `2^bits`.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Bits should be in the range 0..=31");

        let size = 1 << bits;
        Self {
            data: std::iter::repeat_with(|| None).take(size).collect(),
            bitmask: (size - 1) as u64,
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.get()
    }

    pub fn misses(&self) -> usize {
        self.misses.get()
    }

    pub fn clear(&mut self) {
        self.data.fill_with(|| None);
    }
}

impl<K, V> Cache<K, V>
where
    K: TableHash + Eq,
{
    fn slot(&self, key: &K) -> usize {
        (key.table_hash() & self.bitmask) as usize
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        match &self.data[self.slot(key)] {
            Some((k, v)) if k == key => {
                self.hits.set(self.hits.get() + 1);
                Some(v)
            }
            _ => {
                self.misses.set(self.misses.get() + 1);
                None
            }
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        let slot = self.slot(&key);
        self.data[slot] = Some((key, value));
    }
}
