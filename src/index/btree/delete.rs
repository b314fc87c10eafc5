//! Deletion with borrow/merge rebalancing and root collapse.
//!
//! An underflowing node is repaired in a fixed priority order:
//!
//! 1. borrow one item from the right sibling
//! 2. borrow one item from the left sibling
//! 3. merge the right sibling into this node
//! 4. merge this node into the left sibling
//!
//! Only true siblings qualify, i.e. nodes hanging off the same parent. For
//! leaves the candidates are the chain neighbours, filtered on their parent
//! link; a chain neighbour under a different parent is never touched.
//! Merges remove a separator from the parent, which may underflow in turn.

use tracing::{debug, error, trace};

use crate::common::{Error, Key, NodeId, Result, Value};
use crate::index::btree::BPlusTree;
use crate::index::stats::IndexStats;

impl BPlusTree {
    /// Remove `key` and return its value, or `None` if it was absent.
    ///
    /// # Errors
    /// Returns `Error::Corrupted` if rebalancing finds a broken invariant,
    /// e.g. an underflowing node with no sibling under its parent. The tree
    /// must not be used after that.
    pub fn remove(&mut self, key: Key) -> Result<Option<Value>> {
        let leaf_id = self.locate(key);
        let min = self.order.min_keys();

        let leaf = self.nodes.leaf_mut(leaf_id)?;
        let Ok(index) = leaf.search(key) else {
            IndexStats::bump(&self.stats.missing_deletes);
            trace!(key, "delete ignored, key absent");
            return Ok(None);
        };
        let (_, value) = leaf.remove_at(index);
        let underflow = leaf.len() < min;

        self.len -= 1;
        IndexStats::bump(&self.stats.deletes);
        trace!(key, "delete");

        if underflow && leaf_id != self.root {
            self.rebalance_leaf(leaf_id).map_err(|e| {
                error!(key, error = %e, "rebalance after delete failed");
                e
            })?;
        }
        Ok(Some(value))
    }

    // ========================================================================
    // Internal: Leaf rebalancing
    // ========================================================================

    fn rebalance_leaf(&mut self, leaf_id: NodeId) -> Result<()> {
        let min = self.order.min_keys();
        let leaf = self.nodes.leaf(leaf_id)?;
        let parent_id = leaf
            .parent
            .ok_or_else(|| Error::corrupted(format!("non-root leaf {} has no parent", leaf_id)))?;

        let right_id = leaf.next.filter(|&id| self.nodes.parent_of(id) == Some(parent_id));
        let left_id = leaf.prev.filter(|&id| self.nodes.parent_of(id) == Some(parent_id));

        if let Some(right_id) = right_id {
            if self.nodes.leaf(right_id)?.len() > min {
                return self.borrow_from_right_leaf(leaf_id, right_id, parent_id);
            }
        }
        if let Some(left_id) = left_id {
            if self.nodes.leaf(left_id)?.len() > min {
                return self.borrow_from_left_leaf(leaf_id, left_id, parent_id);
            }
        }
        if let Some(right_id) = right_id {
            return self.merge_leaves(leaf_id, right_id, parent_id);
        }
        if let Some(left_id) = left_id {
            return self.merge_leaves(left_id, leaf_id, parent_id);
        }

        Err(Error::corrupted(format!(
            "underflowing leaf {} has no sibling under {}",
            leaf_id, parent_id
        )))
    }

    /// Move the right sibling's first entry to the end of this leaf.
    fn borrow_from_right_leaf(&mut self, leaf_id: NodeId, right_id: NodeId, parent_id: NodeId) -> Result<()> {
        let separator_index = self.separator_left_of(parent_id, right_id)?;

        let right = self.nodes.leaf_mut(right_id)?;
        let (key, value) = right
            .pop_front()
            .ok_or_else(|| Error::corrupted(format!("lending leaf {} is empty", right_id)))?;
        let new_first = right
            .first_key()
            .ok_or_else(|| Error::corrupted(format!("leaf {} emptied by a borrow", right_id)))?;

        self.nodes.leaf_mut(leaf_id)?.push_back(key, value);
        self.nodes.internal_mut(parent_id)?.keys[separator_index] = new_first;

        IndexStats::bump(&self.stats.borrows);
        debug!(leaf = %leaf_id, from = %right_id, key, "leaf borrow from right");
        Ok(())
    }

    /// Move the left sibling's last entry to the front of this leaf.
    fn borrow_from_left_leaf(&mut self, leaf_id: NodeId, left_id: NodeId, parent_id: NodeId) -> Result<()> {
        let separator_index = self.separator_left_of(parent_id, leaf_id)?;

        let (key, value) = self
            .nodes
            .leaf_mut(left_id)?
            .pop_back()
            .ok_or_else(|| Error::corrupted(format!("lending leaf {} is empty", left_id)))?;

        self.nodes.leaf_mut(leaf_id)?.push_front(key, value);
        self.nodes.internal_mut(parent_id)?.keys[separator_index] = key;

        IndexStats::bump(&self.stats.borrows);
        debug!(leaf = %leaf_id, from = %left_id, key, "leaf borrow from left");
        Ok(())
    }

    /// Absorb `right_id` into `left_id`, unlink it, and drop its separator.
    fn merge_leaves(&mut self, left_id: NodeId, right_id: NodeId, parent_id: NodeId) -> Result<()> {
        let separator_index = self.separator_left_of(parent_id, right_id)?;

        let mut right = self.nodes.take_leaf(right_id)?;
        let left = self.nodes.leaf_mut(left_id)?;
        left.append(&mut right);
        left.next = right.next;
        if let Some(next_id) = right.next {
            self.nodes.leaf_mut(next_id)?.prev = Some(left_id);
        }

        IndexStats::bump(&self.stats.merges);
        debug!(into = %left_id, absorbed = %right_id, "leaf merge");

        self.delete_separator(parent_id, separator_index)
    }

    // ========================================================================
    // Internal: Internal-node rebalancing
    // ========================================================================

    /// Remove `keys[index]` and the child to its right from an internal node,
    /// then repair the node if it underflows.
    ///
    /// The child must already have been freed by a merge.
    fn delete_separator(&mut self, node_id: NodeId, index: usize) -> Result<()> {
        let min = self.order.min_keys();
        let node = self.nodes.internal_mut(node_id)?;
        if index >= node.keys.len() {
            return Err(Error::corrupted(format!(
                "separator {} out of bounds in {}",
                index, node_id
            )));
        }
        node.remove_separator(index);

        if node_id == self.root {
            if node.keys.is_empty() {
                self.collapse_root()?;
            }
            return Ok(());
        }

        if node.keys.len() >= min {
            return Ok(());
        }
        self.rebalance_internal(node_id)
    }

    /// Replace an empty internal root with its only child.
    fn collapse_root(&mut self) -> Result<()> {
        let old_root = self.root;
        let root = self.nodes.take_internal(old_root)?;
        let child = match root.children.as_slice() {
            [child] => *child,
            _ => {
                return Err(Error::corrupted(format!(
                    "collapsing root {} has {} children",
                    old_root,
                    root.children.len()
                )))
            }
        };
        self.nodes.set_parent(child, None);
        self.root = child;

        IndexStats::bump(&self.stats.root_collapses);
        debug!(old = %old_root, new = %child, "root collapse");
        Ok(())
    }

    fn rebalance_internal(&mut self, node_id: NodeId) -> Result<()> {
        let min = self.order.min_keys();
        let parent_id = self
            .nodes
            .parent_of(node_id)
            .ok_or_else(|| Error::corrupted(format!("non-root node {} has no parent", node_id)))?;

        let parent = self.nodes.internal(parent_id)?;
        let position = parent
            .position_of(node_id)
            .ok_or_else(|| Error::corrupted(format!("{} is not a child of {}", node_id, parent_id)))?;
        let left_id = position.checked_sub(1).map(|i| parent.children[i]);
        let right_id = parent.children.get(position + 1).copied();

        if let Some(right_id) = right_id {
            if self.nodes.internal(right_id)?.keys.len() > min {
                return self.borrow_from_right_internal(node_id, right_id, parent_id, position);
            }
        }
        if let Some(left_id) = left_id {
            if self.nodes.internal(left_id)?.keys.len() > min {
                return self.borrow_from_left_internal(node_id, left_id, parent_id, position);
            }
        }
        if let Some(right_id) = right_id {
            return self.merge_internals(node_id, right_id, parent_id, position);
        }
        if let Some(left_id) = left_id {
            return self.merge_internals(left_id, node_id, parent_id, position - 1);
        }

        Err(Error::corrupted(format!(
            "underflowing node {} has no sibling under {}",
            node_id, parent_id
        )))
    }

    /// Rotate through the parent: the separator comes down to the end of
    /// this node, the right sibling's first key goes up, and its first child
    /// moves across.
    fn borrow_from_right_internal(
        &mut self,
        node_id: NodeId,
        right_id: NodeId,
        parent_id: NodeId,
        position: usize,
    ) -> Result<()> {
        let right = self.nodes.internal_mut(right_id)?;
        if right.keys.is_empty() || right.children.is_empty() {
            return Err(Error::corrupted(format!("lending node {} is empty", right_id)));
        }
        let up_key = right.keys.remove(0);
        let moved_child = right.children.remove(0);

        let parent = self.nodes.internal_mut(parent_id)?;
        let down_key = std::mem::replace(&mut parent.keys[position], up_key);

        let node = self.nodes.internal_mut(node_id)?;
        node.keys.push(down_key);
        node.children.push(moved_child);
        self.nodes.set_parent(moved_child, Some(node_id));

        IndexStats::bump(&self.stats.borrows);
        debug!(node = %node_id, from = %right_id, key = down_key, "internal borrow from right");
        Ok(())
    }

    /// Mirror of `borrow_from_right_internal` using the left sibling's last
    /// key and child.
    fn borrow_from_left_internal(
        &mut self,
        node_id: NodeId,
        left_id: NodeId,
        parent_id: NodeId,
        position: usize,
    ) -> Result<()> {
        let left = self.nodes.internal_mut(left_id)?;
        let (Some(up_key), Some(moved_child)) = (left.keys.pop(), left.children.pop()) else {
            return Err(Error::corrupted(format!("lending node {} is empty", left_id)));
        };

        let parent = self.nodes.internal_mut(parent_id)?;
        let down_key = std::mem::replace(&mut parent.keys[position - 1], up_key);

        let node = self.nodes.internal_mut(node_id)?;
        node.keys.insert(0, down_key);
        node.children.insert(0, moved_child);
        self.nodes.set_parent(moved_child, Some(node_id));

        IndexStats::bump(&self.stats.borrows);
        debug!(node = %node_id, from = %left_id, key = down_key, "internal borrow from left");
        Ok(())
    }

    /// Absorb `right_id` and the separator between them into `left_id`.
    ///
    /// `separator_index` is the parent key between the two nodes.
    fn merge_internals(
        &mut self,
        left_id: NodeId,
        right_id: NodeId,
        parent_id: NodeId,
        separator_index: usize,
    ) -> Result<()> {
        let separator = *self
            .nodes
            .internal(parent_id)?
            .keys
            .get(separator_index)
            .ok_or_else(|| Error::corrupted(format!("separator {} missing in {}", separator_index, parent_id)))?;

        let right = self.nodes.take_internal(right_id)?;
        let left = self.nodes.internal_mut(left_id)?;
        left.keys.push(separator);
        left.keys.extend_from_slice(&right.keys);
        left.children.extend_from_slice(&right.children);
        for child in right.children {
            self.nodes.set_parent(child, Some(left_id));
        }

        IndexStats::bump(&self.stats.merges);
        debug!(into = %left_id, absorbed = %right_id, separator, "internal merge");

        self.delete_separator(parent_id, separator_index)
    }

    /// Index of the parent separator whose right-hand child is `child_id`.
    fn separator_left_of(&self, parent_id: NodeId, child_id: NodeId) -> Result<usize> {
        self.nodes
            .internal(parent_id)?
            .position_of(child_id)
            .and_then(|position| position.checked_sub(1))
            .ok_or_else(|| Error::corrupted(format!("{} has no separator on its left in {}", child_id, parent_id)))
    }
}
