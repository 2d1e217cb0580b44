use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::domain::avl::{AvlTree, Keyed};

/// Placeholder for the missing child of a node that has exactly one child.
const ABSENT: &str = "·";

pub trait TreeRender {
    fn to_tree_string(&self) -> Tree<String>;
}

impl<R: Keyed> TreeRender for AvlTree<R> {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        fn build<R: Keyed>(tree: &AvlTree<R>, idx: Index) -> Tree<String> {
            let node = tree.node(idx);
            let label = format!(
                "{} (h={}, bf={})",
                node.record.key(),
                node.height,
                tree.balance_of(Some(idx))
            );

            if node.left.is_none() && node.right.is_none() {
                return Tree::new(label);
            }

            // Left child first, right child second
            let leaves = [node.left, node.right].into_iter().map(|child| match child {
                Some(child_idx) => build(tree, child_idx),
                None => Tree::new(ABSENT.to_string()),
            });
            Tree::new(label).with_leaves(leaves)
        }

        match self.root_index() {
            Some(root) => build(self, root),
            None => Tree::new("(empty)".to_string()),
        }
    }
}
