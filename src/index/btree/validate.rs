//! Structural self-check.

use tracing::error;

use crate::common::{Error, Key, NodeId, Result};
use crate::index::btree::node::Node;
use crate::index::btree::BPlusTree;

/// State threaded through the recursive walk.
struct Walk {
    leaf_depth: Option<usize>,
    leaves: Vec<NodeId>,
    entries: usize,
    errors: Vec<String>,
}

impl BPlusTree {
    /// Check every structural invariant of the tree.
    ///
    /// Covers key ordering, separator containment, uniform leaf depth,
    /// occupancy bounds, parent links, both directions of the leaf chain
    /// and the entry count. All violations found are reported together.
    ///
    /// # Errors
    /// Returns `Error::Corrupted` listing every violation.
    pub fn validate(&self) -> Result<()> {
        let mut walk = Walk {
            leaf_depth: None,
            leaves: Vec::new(),
            entries: 0,
            errors: Vec::new(),
        };

        if self.nodes.parent_of(self.root).is_some() {
            walk.errors.push(format!("root {} has a parent", self.root));
        }
        self.validate_node(self.root, None, 0, (None, None), &mut walk);
        self.validate_leaf_chain(&walk.leaves, &mut walk.errors);

        if walk.entries != self.len {
            walk.errors
                .push(format!("len mismatch: len={}, stored entries={}", self.len, walk.entries));
        }

        let reachable = walk.leaves.len() + self.count_internal(self.root);
        if reachable != self.nodes.len() {
            walk.errors.push(format!(
                "{} live nodes but {} reachable from the root",
                self.nodes.len(),
                reachable
            ));
        }

        if walk.errors.is_empty() {
            return Ok(());
        }
        let reason = walk.errors.join("; ");
        error!(violations = walk.errors.len(), %reason, "tree validation failed");
        Err(Error::Corrupted { reason })
    }

    /// Walk the subtree at `id`, whose keys must all lie in `[low, high)`.
    fn validate_node(
        &self,
        id: NodeId,
        parent: Option<NodeId>,
        depth: usize,
        (low, high): (Option<Key>, Option<Key>),
        walk: &mut Walk,
    ) {
        let node = self.nodes.get(id);
        let is_root = id == self.root;
        let max = self.order.max_keys();
        let min = self.order.min_keys();

        if node.parent() != parent {
            walk.errors.push(format!(
                "{} parent link is {:?}, expected {:?}",
                id,
                node.parent(),
                parent
            ));
        }

        let keys = node.keys();
        if keys.windows(2).any(|pair| pair[0] >= pair[1]) {
            walk.errors.push(format!("{} keys not strictly ascending: {:?}", id, keys));
        }
        let out_of_bounds = keys.iter().any(|&k| {
            low.is_some_and(|low| k < low) || high.is_some_and(|high| k >= high)
        });
        if out_of_bounds {
            walk.errors.push(format!(
                "{} keys {:?} escape separator bounds [{:?}, {:?})",
                id, keys, low, high
            ));
        }
        if keys.len() > max {
            walk.errors
                .push(format!("{} holds {} keys, more than {}", id, keys.len(), max));
        }

        match node {
            Node::Leaf(leaf) => {
                match walk.leaf_depth {
                    None => walk.leaf_depth = Some(depth),
                    Some(expected) if expected != depth => walk.errors.push(format!(
                        "leaf {} at depth {}, expected {}",
                        id, depth, expected
                    )),
                    Some(_) => {}
                }
                if !is_root && leaf.len() < min {
                    walk.errors
                        .push(format!("leaf {} holds {} keys, fewer than {}", id, leaf.len(), min));
                }
                if leaf.values.len() != leaf.keys.len() {
                    walk.errors.push(format!(
                        "leaf {} has {} keys but {} values",
                        id,
                        leaf.keys.len(),
                        leaf.values.len()
                    ));
                }
                walk.entries += leaf.len();
                walk.leaves.push(id);
            }
            Node::Internal(internal) => {
                if is_root && internal.keys.is_empty() {
                    walk.errors.push(format!("internal root {} has no keys", id));
                }
                if !is_root && internal.keys.len() < min {
                    walk.errors.push(format!(
                        "{} holds {} keys, fewer than {}",
                        id,
                        internal.keys.len(),
                        min
                    ));
                }
                if internal.children.len() != internal.keys.len() + 1 {
                    walk.errors.push(format!(
                        "{} has {} keys but {} children",
                        id,
                        internal.keys.len(),
                        internal.children.len()
                    ));
                    return;
                }
                for (i, &child) in internal.children.iter().enumerate() {
                    let child_low = if i == 0 { low } else { Some(internal.keys[i - 1]) };
                    let child_high = internal.keys.get(i).copied().or(high);
                    self.validate_node(child, Some(id), depth + 1, (child_low, child_high), walk);
                }
            }
        }
    }

    /// The `prev`/`next` links must reproduce the in-order leaf sequence.
    fn validate_leaf_chain(&self, leaves: &[NodeId], errors: &mut Vec<String>) {
        for (i, &id) in leaves.iter().enumerate() {
            let Node::Leaf(leaf) = self.nodes.get(id) else {
                continue;
            };
            let expected_prev = i.checked_sub(1).map(|j| leaves[j]);
            let expected_next = leaves.get(i + 1).copied();
            if leaf.prev != expected_prev {
                errors.push(format!(
                    "leaf {} prev is {:?}, expected {:?}",
                    id, leaf.prev, expected_prev
                ));
            }
            if leaf.next != expected_next {
                errors.push(format!(
                    "leaf {} next is {:?}, expected {:?}",
                    id, leaf.next, expected_next
                ));
            }
        }
    }

    fn count_internal(&self, id: NodeId) -> usize {
        match self.nodes.get(id) {
            Node::Leaf(_) => 0,
            Node::Internal(internal) => {
                1 + internal
                    .children
                    .iter()
                    .map(|&child| self.count_internal(child))
                    .sum::<usize>()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::btree::tests::tree_with;

    fn violation(tree: &BPlusTree) -> String {
        match tree.validate() {
            Err(Error::Corrupted { reason }) => reason,
            other => panic!("expected corruption, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_accepts_well_formed_trees() {
        BPlusTree::with_order(3).unwrap().validate().unwrap();
        for m in [3, 4, 5, 8, 20] {
            tree_with(m, (0..500).map(|k| (k * 7919) % 500)).validate().unwrap();
        }
    }

    #[test]
    fn test_validate_detects_unsorted_leaf() {
        let mut tree = tree_with(5, 0..20);
        let leaf = tree.locate(0);
        if let Node::Leaf(leaf) = tree.nodes.get_mut(leaf) {
            leaf.keys.swap(0, 1);
        }

        assert!(violation(&tree).contains("not strictly ascending"));
    }

    #[test]
    fn test_validate_detects_key_outside_separators() {
        let mut tree = tree_with(3, [1, 2, 3]);
        let left = tree.locate(1);
        if let Node::Leaf(leaf) = tree.nodes.get_mut(left) {
            leaf.keys[0] = 5;
        }

        assert!(violation(&tree).contains("escape separator bounds"));
    }

    #[test]
    fn test_validate_detects_broken_chain() {
        let mut tree = tree_with(3, 0..10);
        let leaf = tree.locate(9);
        if let Node::Leaf(leaf) = tree.nodes.get_mut(leaf) {
            leaf.prev = None;
        }

        assert!(violation(&tree).contains("prev is None"));
    }

    #[test]
    fn test_validate_detects_parent_link() {
        let mut tree = tree_with(3, [1, 2, 3]);
        let right = tree.locate(3);
        tree.nodes.set_parent(right, None);

        assert!(violation(&tree).contains("parent link"));
    }

    #[test]
    fn test_validate_detects_len_mismatch() {
        let mut tree = tree_with(4, 0..10);
        tree.len += 1;

        assert!(violation(&tree).contains("len mismatch"));
    }

    #[test]
    fn test_validate_reports_all_violations() {
        let mut tree = tree_with(3, [1, 2, 3]);
        tree.len = 0;
        let right = tree.locate(3);
        tree.nodes.set_parent(right, None);

        let reason = violation(&tree);
        assert!(reason.contains("len mismatch"));
        assert!(reason.contains("parent link"));
    }
}
