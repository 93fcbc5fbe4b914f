//! Hash-consing unique table.
//!
//! Values are stored once and addressed by a stable `usize` index. Index `0`
//! is reserved (never handed out), so callers can use it as a "none" marker.
//! Collisions are chained through the `next` field of each entry.

use std::ops::Index;

use crate::utils::MyHash;

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    next: usize,
}

#[derive(Debug, Clone)]
pub struct Table<T> {
    /// `data[i - 1]` holds the value with index `i`.
    data: Vec<Entry<T>>,
    buckets: Vec<usize>,
    bitmask: u64,
}

impl<T> Table<T> {
    /// Create a new table with `2^bits` buckets.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Table bits should be in the range 0..=31");

        let buckets_size = 1 << bits;
        Self {
            data: Vec::new(),
            buckets: vec![0; buckets_size],
            bitmask: (buckets_size - 1) as u64,
        }
    }

    /// Get the number of stored values.
    pub fn len(&self) -> usize {
        self.data.len()
    }
    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the reference to the value at the given index.
    pub fn value(&self, index: usize) -> &T {
        assert_ne!(index, 0, "Index is 0");
        &self.data[index - 1].value
    }

    /// Iterate over `(index, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.data.iter().enumerate().map(|(i, e)| (i + 1, &e.value))
    }

    fn next(&self, index: usize) -> usize {
        self.data[index - 1].next
    }
}

impl<T> Table<T>
where
    T: MyHash + Eq,
{
    fn bucket_index(&self, value: &T) -> usize {
        (value.hash() & self.bitmask) as usize
    }

    /// Find the index of an already stored value.
    pub fn find(&self, value: &T) -> Option<usize> {
        let mut index = self.buckets[self.bucket_index(value)];
        while index != 0 {
            if value == self.value(index) {
                return Some(index);
            }
            index = self.next(index);
        }
        None
    }

    /// Put a value into the table and return its index.
    ///
    /// Returns the existing index if an equal value is already stored.
    pub fn put(&mut self, value: T) -> usize {
        if let Some(index) = self.find(&value) {
            return index;
        }

        if self.data.len() >= 2 * self.buckets.len() {
            self.grow();
        }

        // Prepend the new entry to its bucket chain.
        let bucket_index = self.bucket_index(&value);
        let next = self.buckets[bucket_index];
        self.data.push(Entry { value, next });
        let index = self.data.len();
        self.buckets[bucket_index] = index;
        index
    }

    fn grow(&mut self) {
        let size = self.buckets.len() * 2;
        self.buckets = vec![0; size];
        self.bitmask = (size - 1) as u64;

        for index in 1..=self.data.len() {
            let bucket_index = self.bucket_index(self.value(index));
            self.data[index - 1].next = self.buckets[bucket_index];
            self.buckets[bucket_index] = index;
        }
    }
}

impl<T> Index<usize> for Table<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.value(index)
    }
}
