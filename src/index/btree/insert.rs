//! Insertion with split-on-overflow.
//!
//! A leaf that overflows keeps its first `MIN` entries and hands the rest to
//! a new right leaf, whose first key is copied up into the parent. An
//! internal node that overflows moves its middle key up instead. Splits
//! propagate until a node absorbs the new separator or a new root is made.

use tracing::{debug, trace};

use crate::common::{Key, NodeId, Value};
use crate::index::btree::node::{InternalNode, Node};
use crate::index::btree::BPlusTree;
use crate::index::stats::IndexStats;

impl BPlusTree {
    /// Insert `key` with `value` if the key is absent.
    ///
    /// Returns `true` if the entry was added. If the key is already present
    /// the call is a no-op: the stored value is kept and `false` is returned.
    pub fn insert(&mut self, key: Key, value: Value) -> bool {
        let leaf_id = self.locate(key);
        let max = self.order.max_keys();

        let overflow = match self.nodes.get_mut(leaf_id) {
            Node::Leaf(leaf) => match leaf.search(key) {
                Ok(_) => {
                    IndexStats::bump(&self.stats.duplicate_inserts);
                    trace!(key, "insert ignored, key present");
                    return false;
                }
                Err(index) => {
                    leaf.insert_at(index, key, value);
                    leaf.len() > max
                }
            },
            // locate() only stops at leaves.
            Node::Internal(_) => return false,
        };

        self.len += 1;
        IndexStats::bump(&self.stats.inserts);
        trace!(key, "insert");

        if overflow {
            self.split_leaf(leaf_id);
        }
        true
    }

    /// Split an overflowing leaf and link the new right leaf into the chain.
    fn split_leaf(&mut self, leaf_id: NodeId) {
        let min = self.order.min_keys();

        let (mut right, old_next) = match self.nodes.get_mut(leaf_id) {
            Node::Leaf(leaf) => (leaf.split_off(min), leaf.next),
            Node::Internal(_) => return,
        };
        let Some(separator) = right.first_key() else {
            return;
        };
        right.prev = Some(leaf_id);
        right.next = old_next;

        let right_id = self.nodes.alloc(Node::Leaf(right));
        if let Node::Leaf(leaf) = self.nodes.get_mut(leaf_id) {
            leaf.next = Some(right_id);
        }
        if let Some(next_id) = old_next {
            if let Node::Leaf(next) = self.nodes.get_mut(next_id) {
                next.prev = Some(right_id);
            }
        }

        IndexStats::bump(&self.stats.leaf_splits);
        debug!(left = %leaf_id, right = %right_id, separator, "leaf split");

        self.insert_into_parent(leaf_id, separator, right_id);
    }

    /// Split an overflowing internal node around its middle key.
    fn split_internal(&mut self, node_id: NodeId) {
        let min = self.order.min_keys();

        let (middle, right) = match self.nodes.get_mut(node_id) {
            Node::Internal(internal) => internal.split_off(min),
            Node::Leaf(_) => return,
        };
        let moved_children = right.children.clone();
        let right_id = self.nodes.alloc(Node::Internal(right));
        for child in moved_children {
            self.nodes.set_parent(child, Some(right_id));
        }

        IndexStats::bump(&self.stats.internal_splits);
        debug!(left = %node_id, right = %right_id, separator = middle, "internal split");

        self.insert_into_parent(node_id, middle, right_id);
    }

    /// Hang `right_id` to the right of `left_id` under `separator`.
    ///
    /// If `left_id` was the root, a new root is created above both.
    fn insert_into_parent(&mut self, left_id: NodeId, separator: Key, right_id: NodeId) {
        let Some(parent_id) = self.nodes.parent_of(left_id) else {
            let root = InternalNode::new_root(separator, left_id, right_id);
            let root_id = self.nodes.alloc(Node::Internal(root));
            self.nodes.set_parent(left_id, Some(root_id));
            self.nodes.set_parent(right_id, Some(root_id));
            self.root = root_id;

            IndexStats::bump(&self.stats.root_splits);
            debug!(root = %root_id, separator, "new root");
            return;
        };

        self.nodes.set_parent(right_id, Some(parent_id));
        let max = self.order.max_keys();
        let overflow = match self.nodes.get_mut(parent_id) {
            Node::Internal(parent) => {
                let index = parent.insert_separator(separator, right_id);
                debug_assert_eq!(parent.children[index], left_id);
                parent.keys.len() > max
            }
            Node::Leaf(_) => false,
        };

        if overflow {
            self.split_internal(parent_id);
        }
    }
}
