//! Dense bit set over small integer identifiers.
//!
//! Used for state label sets, action sets in the stubborn-set computation,
//! variable sets of actions, and acceptance sets of automata. These sets
//! are small (a handful of words), so the size is recounted on demand.

use std::fmt;
use std::hash::{Hash, Hasher};

const WORD: usize = u64::BITS as usize;

/// Bit set stored as little-endian `u64` blocks.
///
/// Grows on insertion. Equality and hashing ignore trailing zero blocks, so
/// the capacity a set was created with does not matter.
#[derive(Clone, Default)]
pub struct BitSet {
    blocks: Vec<u64>,
}

#[inline]
fn locate(index: usize) -> (usize, u64) {
    (index / WORD, 1u64 << (index % WORD))
}

impl BitSet {
    /// Empty set with room for `capacity` bits.
    pub fn new(capacity: usize) -> Self {
        Self {
            blocks: vec![0; capacity.div_ceil(WORD)],
        }
    }

    pub fn empty() -> Self {
        Self { blocks: Vec::new() }
    }

    /// The set `{0, 1, ..., n - 1}`.
    pub fn full(n: usize) -> Self {
        let mut blocks = vec![u64::MAX; n / WORD];
        if n % WORD != 0 {
            blocks.push((1u64 << (n % WORD)) - 1);
        }
        Self { blocks }
    }

    pub fn len(&self) -> usize {
        self.blocks.iter().map(|b| b.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|&b| b == 0)
    }

    #[inline]
    fn block(&self, i: usize) -> u64 {
        self.blocks.get(i).copied().unwrap_or(0)
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        let (i, mask) = locate(index);
        self.block(i) & mask != 0
    }

    /// Add `index`; returns `true` if it was absent.
    pub fn insert(&mut self, index: usize) -> bool {
        let (i, mask) = locate(index);
        if i >= self.blocks.len() {
            self.blocks.resize(i + 1, 0);
        }
        let absent = self.blocks[i] & mask == 0;
        self.blocks[i] |= mask;
        absent
    }

    /// Remove `index`; returns `true` if it was present.
    pub fn remove(&mut self, index: usize) -> bool {
        let (i, mask) = locate(index);
        match self.blocks.get_mut(i) {
            Some(block) if *block & mask != 0 => {
                *block &= !mask;
                true
            }
            _ => false,
        }
    }

    /// Remove and return the smallest element.
    pub fn pop_first(&mut self) -> Option<usize> {
        let (i, block) = self.blocks.iter_mut().enumerate().find(|(_, b)| **b != 0)?;
        let bit = block.trailing_zeros() as usize;
        *block &= *block - 1;
        Some(i * WORD + bit)
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    pub fn is_subset(&self, other: &BitSet) -> bool {
        self.blocks.iter().enumerate().all(|(i, &b)| b & !other.block(i) == 0)
    }

    pub fn is_disjoint(&self, other: &BitSet) -> bool {
        self.blocks.iter().zip(&other.blocks).all(|(a, b)| a & b == 0)
    }

    /// `self ∪= other`
    pub fn union_with(&mut self, other: &BitSet) {
        if self.blocks.len() < other.blocks.len() {
            self.blocks.resize(other.blocks.len(), 0);
        }
        self.blocks.iter_mut().zip(&other.blocks).for_each(|(a, b)| *a |= b);
    }

    /// `self ∩= other`
    pub fn intersect_with(&mut self, other: &BitSet) {
        for (i, a) in self.blocks.iter_mut().enumerate() {
            *a &= other.block(i);
        }
    }

    /// `self \= other`
    pub fn difference_with(&mut self, other: &BitSet) {
        self.blocks.iter_mut().zip(&other.blocks).for_each(|(a, b)| *a &= !b);
    }

    pub fn intersection(&self, other: &BitSet) -> BitSet {
        let mut result = self.clone();
        result.intersect_with(other);
        result
    }

    pub fn difference(&self, other: &BitSet) -> BitSet {
        let mut result = self.clone();
        result.difference_with(other);
        result
    }

    /// Elements in increasing order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            blocks: &self.blocks,
            index: 0,
            rest: self.block(0),
        }
    }

    fn trimmed(&self) -> &[u64] {
        let len = self.blocks.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        &self.blocks[..len]
    }
}

impl PartialEq for BitSet {
    fn eq(&self, other: &Self) -> bool {
        self.trimmed() == other.trimmed()
    }
}

impl Eq for BitSet {}

impl Hash for BitSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.trimmed().hash(state);
    }
}

impl fmt::Debug for BitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl Extend<usize> for BitSet {
    fn extend<I: IntoIterator<Item = usize>>(&mut self, iter: I) {
        iter.into_iter().for_each(|i| {
            self.insert(i);
        });
    }
}

impl FromIterator<usize> for BitSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = BitSet::empty();
        set.extend(iter);
        set
    }
}

/// Iterator over the elements of a [`BitSet`].
pub struct Iter<'a> {
    blocks: &'a [u64],
    /// Block currently being drained.
    index: usize,
    /// Unvisited bits of that block.
    rest: u64,
}

impl Iterator for Iter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.rest == 0 {
            self.index += 1;
            self.rest = *self.blocks.get(self.index)?;
        }
        let bit = self.rest.trailing_zeros() as usize;
        self.rest &= self.rest - 1;
        Some(self.index * WORD + bit)
    }
}

impl<'a> IntoIterator for &'a BitSet {
    type Item = usize;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_insert_remove() {
        let mut set = BitSet::new(10);
        assert!(set.is_empty());
        assert!(set.insert(130));
        assert!(!set.insert(130));
        assert!(set.contains(130));
        assert!(!set.contains(2));
        assert_eq!(set.len(), 1);
        assert!(set.remove(130));
        assert!(!set.remove(130));
        assert!(!set.remove(100_000));
        assert!(set.is_empty());
    }

    #[test]
    fn test_pop_first_in_order() {
        let mut set: BitSet = [70, 5, 3].into_iter().collect();
        assert_eq!(set.pop_first(), Some(3));
        set.insert(1);
        assert_eq!(set.pop_first(), Some(1));
        assert_eq!(set.pop_first(), Some(5));
        assert_eq!(set.pop_first(), Some(70));
        assert_eq!(set.pop_first(), None);
    }

    #[test]
    fn test_iter_skips_empty_blocks() {
        let set: BitSet = [200, 0, 63, 64].into_iter().collect();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 63, 64, 200]);
        assert_eq!(BitSet::empty().iter().next(), None);
        assert_eq!(format!("{:?}", set), "{0, 63, 64, 200}");
    }

    #[test]
    fn test_full() {
        let set = BitSet::full(70);
        assert_eq!(set.len(), 70);
        assert!(set.contains(69));
        assert!(!set.contains(70));
        assert_eq!(BitSet::full(64).len(), 64);
        assert!(BitSet::full(0).is_empty());
    }

    #[test]
    fn test_set_algebra() {
        let a: BitSet = [1, 2, 3, 100].into_iter().collect();
        let b: BitSet = [2, 3].into_iter().collect();
        let c: BitSet = [7, 200].into_iter().collect();

        assert!(b.is_subset(&a));
        assert!(!a.is_subset(&b));
        assert!(a.is_disjoint(&c));
        assert!(!a.is_disjoint(&b));

        assert_eq!(a.intersection(&b), b);
        assert_eq!(a.difference(&b).iter().collect::<Vec<_>>(), vec![1, 100]);

        let mut u = b.clone();
        u.union_with(&c);
        assert_eq!(u.len(), 4);
        assert!(u.contains(200));

        u.clear();
        assert!(u.is_empty());
    }

    #[test]
    fn test_eq_ignores_capacity() {
        let mut a = BitSet::new(1000);
        a.insert(3);
        let b: BitSet = [3].into_iter().collect();
        assert_eq!(a, b);

        let set: HashSet<BitSet> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }
}
