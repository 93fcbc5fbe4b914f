//! Tree-compressed set of state vectors.
//!
//! Fixed-length vectors of `u32` are stored as a binary tree of hash-consing
//! tables (Blom, Lisser, van de Pol et al., "A Database Approach to
//! Distributed State Space Generation", ENTCS 198(1), 2008). A vector is
//! split into two halves; each half longer than one slot is stored in the
//! child table for that half, and the node table stores the pair of child
//! indices. Vectors sharing a half share its storage.
//!
//! ```
//! use ltl_rs::treeset::TreeSet;
//!
//! let mut set = TreeSet::new(4);
//! assert!(set.insert(&[1, 2, 3, 4]));
//! assert!(set.insert(&[1, 2, 3, 5]));
//! assert!(!set.insert(&[1, 2, 3, 4]));
//! assert!(set.contains(&[1, 2, 3, 5]));
//! assert_eq!(set.len(), 2);
//! ```

use crate::reach::StateSet;
use crate::table::Table;

/// Buckets of a fresh table, as a power of two.
const TABLE_BITS: usize = 8;

#[derive(Debug, Clone)]
struct TreeNode {
    width: usize,
    /// Length of the left half.
    split: usize,
    table: Table<(u32, u32)>,
    left: Option<Box<TreeNode>>,
    right: Option<Box<TreeNode>>,
}

impl TreeNode {
    fn new(width: usize) -> Self {
        let split = width.div_ceil(2);
        let child = |w: usize| (w > 1).then(|| Box::new(TreeNode::new(w)));
        Self {
            width,
            split,
            table: Table::new(TABLE_BITS),
            left: child(split),
            right: child(width - split),
        }
    }

    /// Map a half to its slot value: the index in the child table, or the value itself.
    fn half(child: &mut Option<Box<TreeNode>>, half: &[u32]) -> u32 {
        match child {
            Some(node) => node.insert(half),
            None => half.first().copied().unwrap_or(0),
        }
    }

    fn find_half(child: &Option<Box<TreeNode>>, half: &[u32]) -> Option<u32> {
        match child {
            Some(node) => node.find(half),
            None => Some(half.first().copied().unwrap_or(0)),
        }
    }

    fn insert(&mut self, item: &[u32]) -> u32 {
        let (lo, hi) = item.split_at(self.split);
        let pair = (Self::half(&mut self.left, lo), Self::half(&mut self.right, hi));
        self.table.put(pair) as u32
    }

    fn find(&self, item: &[u32]) -> Option<u32> {
        let (lo, hi) = item.split_at(self.split);
        let pair = (Self::find_half(&self.left, lo)?, Self::find_half(&self.right, hi)?);
        self.table.find(&pair).map(|i| i as u32)
    }

    fn get(&self, index: u32, out: &mut Vec<u32>) {
        let &(lo, hi) = self.table.value(index as usize);
        for (child, v, w) in [(&self.left, lo, self.split), (&self.right, hi, self.width - self.split)] {
            match child {
                Some(node) => node.get(v, out),
                None if w == 1 => out.push(v),
                None => {}
            }
        }
    }

    fn size(&self) -> usize {
        self.table.len() + self.left.as_ref().map_or(0, |n| n.size()) + self.right.as_ref().map_or(0, |n| n.size())
    }
}

/// Set of state vectors of a fixed width.
#[derive(Debug, Clone)]
pub struct TreeSet {
    root: TreeNode,
}

impl TreeSet {
    /// Create an empty set of vectors of length `width`.
    pub fn new(width: usize) -> Self {
        assert!(width > 0, "State vectors must not be empty");
        Self {
            root: TreeNode::new(width),
        }
    }

    pub fn width(&self) -> usize {
        self.root.width
    }

    fn check(&self, item: &[u32]) {
        assert_eq!(
            item.len(),
            self.root.width,
            "State vector of length {} in a set of width {}",
            item.len(),
            self.root.width
        );
    }

    /// Add `item`; returns `true` if it was not present.
    pub fn insert(&mut self, item: &[u32]) -> bool {
        self.check(item);
        let before = self.root.table.len();
        self.root.insert(item);
        self.root.table.len() > before
    }

    pub fn contains(&self, item: &[u32]) -> bool {
        self.check(item);
        self.root.find(item).is_some()
    }

    pub fn len(&self) -> usize {
        self.root.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.table.is_empty()
    }

    /// Total number of pairs stored over all tables.
    pub fn size(&self) -> usize {
        self.root.size()
    }

    /// Iterate over the stored vectors in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = Vec<u32>> + '_ {
        self.root.table.iter().map(|(i, _)| {
            let mut out = Vec::with_capacity(self.root.width);
            self.root.get(i as u32, &mut out);
            out
        })
    }
}

impl<S> StateSet<S> for TreeSet
where
    S: AsRef<[u32]>,
{
    fn insert(&mut self, state: S) -> bool {
        TreeSet::insert(self, state.as_ref())
    }
    fn contains(&self, state: &S) -> bool {
        TreeSet::contains(self, state.as_ref())
    }
    fn len(&self) -> usize {
        TreeSet::len(self)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use test_log::test;

    use super::*;

    #[test]
    fn test_single_slot() {
        let mut set = TreeSet::new(1);
        assert!(set.insert(&[7]));
        assert!(set.insert(&[0]));
        assert!(!set.insert(&[7]));
        assert!(set.contains(&[0]));
        assert!(!set.contains(&[1]));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![vec![7], vec![0]]);
    }

    #[test]
    fn test_odd_width() {
        let mut set = TreeSet::new(5);
        let items = [[0, 1, 2, 3, 4], [0, 1, 2, 3, 5], [9, 1, 2, 3, 4], [0, 0, 0, 0, 0]];
        for item in &items {
            assert!(set.insert(item));
        }
        for item in &items {
            assert!(set.contains(item));
            assert!(!set.insert(item));
        }
        assert!(!set.contains(&[0, 1, 2, 4, 3]));
        assert_eq!(set.len(), 4);
        assert_eq!(set.iter().collect::<Vec<_>>(), items.iter().map(|i| i.to_vec()).collect::<Vec<_>>());
    }

    #[test]
    fn test_shared_halves_are_stored_once() {
        let mut set = TreeSet::new(4);
        for a in 0..10 {
            set.insert(&[a, a, 1, 2]);
        }
        // 10 roots, 10 left halves, 1 right half.
        assert_eq!(set.len(), 10);
        assert_eq!(set.size(), 21);
    }

    #[test]
    fn test_agrees_with_hash_set() {
        let mut tree = TreeSet::new(3);
        let mut hash = HashSet::new();
        let mut x: u32 = 12345;
        for _ in 0..2000 {
            x = x.wrapping_mul(1103515245).wrapping_add(12345);
            let item = [x % 7, (x >> 8) % 5, (x >> 16) % 11];
            assert_eq!(tree.insert(&item), hash.insert(item));
        }
        assert_eq!(tree.len(), hash.len());
        for item in &hash {
            assert!(tree.contains(item));
        }
    }

    #[test]
    fn test_as_state_set() {
        fn fill<V: StateSet<Vec<u32>>>(set: &mut V) {
            set.insert(vec![1, 2]);
            set.insert(vec![1, 2]);
            set.insert(vec![2, 1]);
        }
        let mut set = TreeSet::new(2);
        fill(&mut set);
        assert_eq!(StateSet::<Vec<u32>>::len(&set), 2);
        assert!(StateSet::contains(&set, &vec![2, 1]));
    }

    #[test]
    #[should_panic(expected = "State vector of length 2")]
    fn test_wrong_width() {
        let mut set = TreeSet::new(3);
        set.insert(&[1, 2]);
    }
}
