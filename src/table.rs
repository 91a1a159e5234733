//! Unique table: hash-consed node storage with chained buckets.
//!
//! Cell 0 is a sentinel and is never handed out, so index 0 doubles as the
//! "end of chain" marker. Freed cells are reused by later allocations.

use crate::hash::TableHash;

#[derive(Clone, Default)]
struct Entry<T> {
    value: T,
    next: usize,
    occupied: bool,
}

pub struct Table<T> {
    data: Vec<Entry<T>>,
    buckets: Vec<usize>,
    bitmask: u64,
    /// Index of the first *possibly* free cell.
    min_free: usize,
    /// Number of occupied cells (the sentinel excluded).
    real_size: usize,
}

impl<T> Table<T>
where
    T: Default,
{
    /// Create a new table with room for `2^bits` cells before it has to grow.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Storage bits should be in the range 0..=31");

        let mut data = Vec::with_capacity(1 << bits);
        data.push(Entry {
            occupied: true,
            ..Entry::default()
        });

        let buckets_size = 1 << bits.min(16);

        Self {
            data,
            buckets: vec![0; buckets_size],
            bitmask: (buckets_size - 1) as u64,
            min_free: 1,
            real_size: 0,
        }
    }

    /// Allocate a cell and return its index.
    fn alloc(&mut self) -> usize {
        let index = (self.min_free..self.data.len())
            .find(|&i| !self.data[i].occupied)
            .unwrap_or_else(|| {
                self.data.push(Entry::default());
                self.data.len() - 1
            });
        assert!(index <= i32::MAX as usize, "Storage is full");

        self.data[index].occupied = true;
        self.min_free = index + 1;
        self.real_size += 1;
        index
    }

    /// Store `value` in a fresh cell outside of any bucket.
    pub fn add(&mut self, value: T) -> usize {
        let index = self.alloc();
        self.data[index].value = value;
        self.data[index].next = 0;
        index
    }
}

impl<T> Table<T> {
    /// Number of cells ever allocated (including freed ones and the sentinel).
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Number of occupied cells.
    pub fn real_size(&self) -> usize {
        self.real_size
    }

    pub fn value(&self, index: usize) -> &T {
        assert_ne!(index, 0, "Index is 0");
        &self.data[index].value
    }

    pub fn is_occupied(&self, index: usize) -> bool {
        self.data[index].occupied
    }

    /// Release the cell at `index`. The caller unlinks it from its bucket.
    fn free(&mut self, index: usize) {
        assert_ne!(index, 0, "Index is 0");
        assert!(self.data[index].occupied, "Double free of cell {}", index);
        self.data[index].occupied = false;
        self.data[index].next = 0;
        self.min_free = self.min_free.min(index);
        self.real_size -= 1;
    }

    /// Drop every cell for which `alive` returns `false`, relinking the buckets.
    ///
    /// Returns the number of freed cells.
    pub fn retain(&mut self, mut alive: impl FnMut(usize) -> bool) -> usize {
        let mut freed = 0;
        for b in 0..self.buckets.len() {
            let mut kept = Vec::new();
            let mut index = self.buckets[b];
            while index != 0 {
                let next = self.data[index].next;
                if alive(index) {
                    kept.push(index);
                } else {
                    self.free(index);
                    freed += 1;
                }
                index = next;
            }
            self.buckets[b] = kept.first().copied().unwrap_or(0);
            for pair in kept.windows(2) {
                self.data[pair[0]].next = pair[1];
            }
            if let Some(&last) = kept.last() {
                self.data[last].next = 0;
            }
        }
        freed
    }
}

impl<T> Table<T>
where
    T: Default + TableHash + Eq,
{
    fn bucket_index(&self, value: &T) -> usize {
        (value.table_hash() & self.bitmask) as usize
    }

    /// Put a value into the table, returning the index of the existing equal
    /// value if there is one.
    pub fn put(&mut self, value: T) -> usize {
        let bucket = self.bucket_index(&value);
        let mut index = self.buckets[bucket];

        if index == 0 {
            let i = self.add(value);
            self.buckets[bucket] = i;
            return i;
        }

        loop {
            if self.data[index].value == value {
                return index;
            }
            let next = self.data[index].next;
            if next == 0 {
                let i = self.add(value);
                self.data[index].next = i;
                return i;
            }
            index = next;
        }
    }
}
