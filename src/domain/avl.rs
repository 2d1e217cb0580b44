//! Height-balanced (AVL) binary search tree over an arena of nodes.
//!
//! Nodes only link downwards. Every recursive mutation returns the index of
//! the (possibly new) subtree root and the caller relinks it, so no parent
//! back-references are ever needed.

use std::cmp::Ordering;
use std::fmt;
use std::mem;

use generational_arena::{Arena, Index};
use tracing::{debug, instrument, trace};

use crate::domain::error::{DuplicateKeyError, InvariantViolation};

/// Records stored in an [`AvlTree`] are ordered by a unique key.
pub trait Keyed {
    type Key: Ord + Copy + fmt::Debug + fmt::Display;

    fn key(&self) -> Self::Key;
}

macro_rules! keyed_by_value {
    ($($ty:ty),*) => {
        $(
            impl Keyed for $ty {
                type Key = $ty;

                fn key(&self) -> $ty {
                    *self
                }
            }
        )*
    };
}

keyed_by_value!(i32, i64, u32, u64, usize);

/// Tree vertex: one record, two optional children and the cached height.
#[derive(Debug)]
pub(crate) struct AvlNode<R> {
    pub(crate) record: R,
    pub(crate) left: Option<Index>,
    pub(crate) right: Option<Index>,
    pub(crate) height: usize,
}

impl<R> AvlNode<R> {
    fn leaf(record: R) -> Self {
        Self {
            record,
            left: None,
            right: None,
            // A new node is a leaf of height 1
            height: 1,
        }
    }

    fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Ordered collection of uniquely keyed records with O(log n) search,
/// insertion and deletion.
///
/// The tree is the sole owner of its nodes; each arena slot is referenced by
/// exactly one parent link or by the root slot.
#[derive(Debug)]
pub struct AvlTree<R> {
    /// Arena storage for all tree nodes
    arena: Arena<AvlNode<R>>,
    /// Index of the root node, None for empty trees
    root: Option<Index>,
}

impl<R: Keyed> Default for AvlTree<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Keyed> AvlTree<R> {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Height of the whole tree, counted in nodes (empty tree = 0).
    pub fn height(&self) -> usize {
        self.height_of(self.root)
    }

    pub fn root_key(&self) -> Option<R::Key> {
        self.root.map(|idx| self.arena[idx].record.key())
    }

    pub fn contains(&self, key: R::Key) -> bool {
        self.search(key).is_some()
    }

    /// Looks up the record stored under `key`.
    #[instrument(level = "trace", skip(self))]
    pub fn search(&self, key: R::Key) -> Option<&R> {
        let mut current = self.root;
        while let Some(idx) = current {
            let node = &self.arena[idx];
            current = match key.cmp(&node.record.key()) {
                Ordering::Equal => return Some(&node.record),
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
        }
        None
    }

    /// Inserts `record`, rebalancing every ancestor on the insertion path.
    ///
    /// A record whose key is already present is rejected and the tree is
    /// left untouched.
    #[instrument(level = "trace", skip(self, record), fields(key = %record.key()))]
    pub fn insert(&mut self, record: R) -> Result<(), DuplicateKeyError<R::Key>> {
        let key = record.key();
        if self.contains(key) {
            debug!("insert: duplicate key {}", key);
            return Err(DuplicateKeyError { key });
        }
        let root = self.insert_at(self.root, record);
        self.root = Some(root);
        Ok(())
    }

    /// Removes the record stored under `key`.
    ///
    /// Returns false without touching the tree when the key is absent.
    #[instrument(level = "trace", skip(self))]
    pub fn delete(&mut self, key: R::Key) -> bool {
        self.take(key).is_some()
    }

    /// Removes the record stored under `key` and returns it.
    #[instrument(level = "trace", skip(self))]
    pub fn take(&mut self, key: R::Key) -> Option<R> {
        if !self.contains(key) {
            return None;
        }
        let mut removed = None;
        self.root = self.delete_at(self.root, key, &mut removed);
        removed
    }

    /// All records in ascending key order, materialized in one pass.
    pub fn list_ordered(&self) -> Vec<&R> {
        let mut records = Vec::with_capacity(self.len());
        self.collect_in_order(self.root, &mut records);
        records
    }

    pub fn iter(&self) -> InOrderIterator<'_, R> {
        InOrderIterator::new(self)
    }

    /// Keys of all nodes without children, ascending.
    pub fn leaf_keys(&self) -> Vec<R::Key> {
        self.iter_nodes()
            .filter(|node| node.is_leaf())
            .map(|node| node.record.key())
            .collect()
    }

    /// Verifies the height, balance and ordering invariants of every node.
    #[instrument(level = "debug", skip(self))]
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut reachable = 0;
        self.check_subtree(self.root, None, None, &mut reachable)?;
        if reachable != self.arena.len() {
            return Err(InvariantViolation::Unreachable {
                stored: self.arena.len(),
                reachable,
            });
        }
        Ok(())
    }

    pub(crate) fn root_index(&self) -> Option<Index> {
        self.root
    }

    pub(crate) fn node(&self, idx: Index) -> &AvlNode<R> {
        &self.arena[idx]
    }

    pub(crate) fn balance_of(&self, node: Option<Index>) -> isize {
        match node {
            Some(idx) => {
                let node = &self.arena[idx];
                self.height_of(node.left) as isize - self.height_of(node.right) as isize
            }
            None => 0,
        }
    }

    fn iter_nodes(&self) -> impl Iterator<Item = &AvlNode<R>> {
        InOrderIterator::new(self).nodes()
    }

    fn height_of(&self, node: Option<Index>) -> usize {
        node.map_or(0, |idx| self.arena[idx].height)
    }

    fn update_height(&mut self, idx: Index) {
        let node = &self.arena[idx];
        let height = 1 + self.height_of(node.left).max(self.height_of(node.right));
        self.arena[idx].height = height;
    }

    // ============================================================
    // Rotations
    // ============================================================

    /// Promotes the left child of `y`; returns the new subtree root.
    fn rotate_right(&mut self, y: Index) -> Index {
        let Some(x) = self.arena[y].left else {
            return y;
        };
        let t2 = self.arena[x].right;

        self.arena[x].right = Some(y);
        self.arena[y].left = t2;

        self.update_height(y);
        self.update_height(x);
        x
    }

    /// Promotes the right child of `x`; returns the new subtree root.
    fn rotate_left(&mut self, x: Index) -> Index {
        let Some(y) = self.arena[x].right else {
            return x;
        };
        let t2 = self.arena[y].left;

        self.arena[y].left = Some(x);
        self.arena[x].right = t2;

        self.update_height(x);
        self.update_height(y);
        y
    }

    /// Refreshes the height of `idx` and applies at most one single or
    /// double rotation. The aligned case is checked before the opposite
    /// case on each side.
    fn rebalance(&mut self, idx: Index) -> Index {
        self.update_height(idx);
        let balance = self.balance_of(Some(idx));
        let left = self.arena[idx].left;
        let right = self.arena[idx].right;

        if balance > 1 && self.balance_of(left) >= 0 {
            trace!("rebalance: right rotation");
            return self.rotate_right(idx);
        }
        if balance > 1 && self.balance_of(left) < 0 {
            trace!("rebalance: left-right rotation");
            if let Some(l) = left {
                self.arena[idx].left = Some(self.rotate_left(l));
            }
            return self.rotate_right(idx);
        }
        if balance < -1 && self.balance_of(right) <= 0 {
            trace!("rebalance: left rotation");
            return self.rotate_left(idx);
        }
        if balance < -1 && self.balance_of(right) > 0 {
            trace!("rebalance: right-left rotation");
            if let Some(r) = right {
                self.arena[idx].right = Some(self.rotate_right(r));
            }
            return self.rotate_left(idx);
        }
        idx
    }

    // ============================================================
    // Recursive mutation
    // ============================================================

    fn insert_at(&mut self, node: Option<Index>, record: R) -> Index {
        let Some(idx) = node else {
            return self.arena.insert(AvlNode::leaf(record));
        };

        match record.key().cmp(&self.arena[idx].record.key()) {
            Ordering::Less => {
                let left = self.insert_at(self.arena[idx].left, record);
                self.arena[idx].left = Some(left);
            }
            Ordering::Greater => {
                let right = self.insert_at(self.arena[idx].right, record);
                self.arena[idx].right = Some(right);
            }
            // Rejected by the caller before descending
            Ordering::Equal => return idx,
        }

        self.rebalance(idx)
    }

    fn delete_at(&mut self, node: Option<Index>, key: R::Key, removed: &mut Option<R>) -> Option<Index> {
        let idx = node?;

        match key.cmp(&self.arena[idx].record.key()) {
            Ordering::Less => {
                let left = self.delete_at(self.arena[idx].left, key, removed);
                self.arena[idx].left = left;
            }
            Ordering::Greater => {
                let right = self.delete_at(self.arena[idx].right, key, removed);
                self.arena[idx].right = right;
            }
            Ordering::Equal => {
                let (left, right) = (self.arena[idx].left, self.arena[idx].right);
                match (left, right) {
                    (None, _) => {
                        *removed = self.arena.remove(idx).map(|n| n.record);
                        return right;
                    }
                    (_, None) => {
                        *removed = self.arena.remove(idx).map(|n| n.record);
                        return left;
                    }
                    (Some(_), Some(r)) => {
                        // Two children: the in-order successor's record takes
                        // this node's place and the successor node is freed.
                        let successor = self.leftmost(r);
                        let successor_key = self.arena[successor].record.key();
                        trace!("delete: splicing successor {}", successor_key);

                        let mut successor_record = None;
                        let new_right = self.delete_at(Some(r), successor_key, &mut successor_record);
                        self.arena[idx].right = new_right;
                        if let Some(record) = successor_record {
                            *removed = Some(mem::replace(&mut self.arena[idx].record, record));
                        }
                    }
                }
            }
        }

        Some(self.rebalance(idx))
    }

    fn leftmost(&self, mut idx: Index) -> Index {
        while let Some(left) = self.arena[idx].left {
            idx = left;
        }
        idx
    }

    // ============================================================
    // Traversal
    // ============================================================

    fn collect_in_order<'a>(&'a self, node: Option<Index>, records: &mut Vec<&'a R>) {
        if let Some(idx) = node {
            let node = &self.arena[idx];
            self.collect_in_order(node.left, records);
            records.push(&node.record);
            self.collect_in_order(node.right, records);
        }
    }

    /// Returns the height of the subtree after checking it against the
    /// exclusive key bounds inherited from its ancestors.
    fn check_subtree(
        &self,
        node: Option<Index>,
        lower: Option<R::Key>,
        upper: Option<R::Key>,
        reachable: &mut usize,
    ) -> Result<usize, InvariantViolation> {
        let Some(idx) = node else {
            return Ok(0);
        };
        *reachable += 1;
        let node = &self.arena[idx];
        let key = node.record.key();

        if lower.is_some_and(|low| key <= low) || upper.is_some_and(|high| key >= high) {
            return Err(InvariantViolation::Ordering {
                key: key.to_string(),
            });
        }

        let left = self.check_subtree(node.left, lower, Some(key), reachable)?;
        let right = self.check_subtree(node.right, Some(key), upper, reachable)?;

        let actual = 1 + left.max(right);
        if node.height != actual {
            return Err(InvariantViolation::Height {
                key: key.to_string(),
                cached: node.height,
                actual,
            });
        }
        let balance = left as isize - right as isize;
        if balance.abs() > 1 {
            return Err(InvariantViolation::Balance {
                key: key.to_string(),
                balance,
            });
        }
        Ok(actual)
    }
}

/// Borrowing in-order iterator driven by an explicit stack.
pub struct InOrderIterator<'a, R> {
    tree: &'a AvlTree<R>,
    stack: Vec<Index>,
}

impl<'a, R> InOrderIterator<'a, R> {
    fn new(tree: &'a AvlTree<R>) -> Self {
        let mut iter = Self {
            tree,
            stack: Vec::new(),
        };
        iter.push_left_spine(tree.root);
        iter
    }

    fn push_left_spine(&mut self, mut node: Option<Index>) {
        while let Some(idx) = node {
            self.stack.push(idx);
            node = self.tree.arena[idx].left;
        }
    }

    fn next_node(&mut self) -> Option<&'a AvlNode<R>> {
        let idx = self.stack.pop()?;
        let tree = self.tree;
        let node = &tree.arena[idx];
        self.push_left_spine(node.right);
        Some(node)
    }

    fn nodes(mut self) -> impl Iterator<Item = &'a AvlNode<R>> {
        std::iter::from_fn(move || self.next_node())
    }
}

impl<'a, R> Iterator for InOrderIterator<'a, R> {
    type Item = &'a R;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_node().map(|node| &node.record)
    }
}

impl<'a, R: Keyed> IntoIterator for &'a AvlTree<R> {
    type Item = &'a R;
    type IntoIter = InOrderIterator<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn tree_of(keys: &[i32]) -> AvlTree<i32> {
        let mut tree = AvlTree::new();
        for &key in keys {
            tree.insert(key).unwrap();
        }
        tree
    }

    fn keys(tree: &AvlTree<i32>) -> Vec<i32> {
        tree.list_ordered().into_iter().copied().collect()
    }

    #[test]
    fn given_empty_tree_when_queried_then_reports_nothing() {
        let tree: AvlTree<i32> = AvlTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.root_key(), None);
        assert!(tree.search(1).is_none());
        assert!(tree.list_ordered().is_empty());
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn given_single_insert_when_queried_then_leaf_has_height_one() {
        let tree = tree_of(&[42]);
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.root_key(), Some(42));
        assert_eq!(tree.leaf_keys(), vec![42]);
    }

    #[rstest]
    #[case::right_rotation(&[3, 2, 1], 2)]
    #[case::left_rotation(&[1, 2, 3], 2)]
    #[case::left_right_rotation(&[3, 1, 2], 2)]
    #[case::right_left_rotation(&[1, 3, 2], 2)]
    fn given_three_keys_when_inserted_then_middle_key_becomes_root(
        #[case] input: &[i32],
        #[case] expected_root: i32,
    ) {
        let tree = tree_of(input);
        assert_eq!(tree.root_key(), Some(expected_root));
        assert_eq!(tree.height(), 2);
        assert_eq!(tree.leaf_keys(), vec![1, 3]);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn given_duplicate_key_when_inserting_then_tree_is_unchanged() {
        let mut tree = tree_of(&[10, 20, 30]);
        let before = keys(&tree);

        let err = tree.insert(20).unwrap_err();

        assert_eq!(err.key, 20);
        assert_eq!(keys(&tree), before);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn given_leaf_when_deleting_then_parent_is_rebalanced() {
        // 2 is the root with 1 and 3 below, 4 hangs under 3
        let mut tree = tree_of(&[2, 1, 3, 4]);

        assert!(tree.delete(1));

        assert_eq!(tree.root_key(), Some(3));
        assert_eq!(keys(&tree), vec![2, 3, 4]);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn given_two_children_when_deleting_root_then_successor_takes_its_place() {
        let mut tree = tree_of(&[20, 10, 30, 25, 35]);

        assert_eq!(tree.take(20), Some(20));

        assert_eq!(tree.root_key(), Some(25));
        assert_eq!(keys(&tree), vec![10, 25, 30, 35]);
        assert_eq!(tree.len(), 4);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn given_single_child_when_deleting_then_child_replaces_node() {
        let mut tree = tree_of(&[2, 1, 3, 4]);

        assert!(tree.delete(3));

        assert_eq!(keys(&tree), vec![1, 2, 4]);
        assert_eq!(tree.height(), 2);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn given_missing_key_when_deleting_then_returns_false() {
        let mut tree = tree_of(&[1, 2, 3]);
        assert!(!tree.delete(9));
        assert_eq!(tree.take(9), None);
        assert_eq!(keys(&tree), vec![1, 2, 3]);
    }

    #[test]
    fn given_tree_when_iterating_then_matches_list_ordered() {
        let tree = tree_of(&[50, 20, 80, 10, 30, 70, 90, 60]);
        let iterated: Vec<i32> = tree.iter().copied().collect();
        assert_eq!(iterated, keys(&tree));
        let via_into_iter: Vec<i32> = (&tree).into_iter().copied().collect();
        assert_eq!(via_into_iter, iterated);
    }

    #[test]
    fn given_broken_height_when_checking_then_reports_violation() {
        let mut tree = tree_of(&[1, 2, 3]);
        let root = tree.root_index().unwrap();
        tree.arena[root].height = 7;

        let violation = tree.check_invariants().unwrap_err();

        assert!(matches!(violation, InvariantViolation::Height { cached: 7, actual: 2, .. }));
    }

    #[test]
    fn given_broken_ordering_when_checking_then_reports_violation() {
        let mut tree = tree_of(&[1, 2, 3]);
        let root = tree.root_index().unwrap();
        let left = tree.arena[root].left.unwrap();
        tree.arena[left].record = 5;

        let violation = tree.check_invariants().unwrap_err();

        assert_eq!(
            violation,
            InvariantViolation::Ordering {
                key: "5".to_string()
            }
        );
    }
}
