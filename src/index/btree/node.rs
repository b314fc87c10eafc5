//! Node layout: a tagged union over internal and leaf nodes.
//!
//! Both variants carry a non-owning `parent` link. Leaves additionally carry
//! `prev`/`next` links forming the leaf chain. Only the arena owns nodes.

use crate::common::{Key, NodeId, Value};

/// A tree node.
#[derive(Debug, Clone)]
pub(crate) enum Node {
    Internal(InternalNode),
    Leaf(LeafNode),
}

/// Routing node: `n` ascending separator keys and `n + 1` children.
///
/// Child `i` owns the keys `k` with `keys[i - 1] <= k < keys[i]`, so a key
/// equal to a separator routes to the right child.
#[derive(Debug, Clone, Default)]
pub(crate) struct InternalNode {
    pub(crate) parent: Option<NodeId>,
    pub(crate) keys: Vec<Key>,
    pub(crate) children: Vec<NodeId>,
}

/// Data node: ascending unique keys with their values, kept in parallel.
#[derive(Debug, Clone, Default)]
pub(crate) struct LeafNode {
    pub(crate) parent: Option<NodeId>,
    pub(crate) prev: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
    pub(crate) keys: Vec<Key>,
    pub(crate) values: Vec<Value>,
}

impl Node {
    /// Creates a new empty leaf node.
    pub(crate) fn new_leaf() -> Self {
        Node::Leaf(LeafNode::default())
    }

    pub(crate) fn parent(&self) -> Option<NodeId> {
        match self {
            Node::Internal(internal) => internal.parent,
            Node::Leaf(leaf) => leaf.parent,
        }
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        match self {
            Node::Internal(internal) => internal.parent = parent,
            Node::Leaf(leaf) => leaf.parent = parent,
        }
    }

    /// Keys held by this node (separators or entry keys).
    pub(crate) fn keys(&self) -> &[Key] {
        match self {
            Node::Internal(internal) => &internal.keys,
            Node::Leaf(leaf) => &leaf.keys,
        }
    }
}

impl InternalNode {
    /// Builds a fresh root above a split: one separator, two children.
    pub(crate) fn new_root(separator: Key, left: NodeId, right: NodeId) -> Self {
        Self {
            parent: None,
            keys: vec![separator],
            children: vec![left, right],
        }
    }

    /// Number of keys `<= key`; the index of the child that routes `key`.
    #[inline]
    pub(crate) fn upper_bound(&self, key: Key) -> usize {
        self.keys.partition_point(|&k| k <= key)
    }

    /// The child a search for `key` descends into.
    #[inline]
    pub(crate) fn route(&self, key: Key) -> NodeId {
        self.children[self.upper_bound(key)]
    }

    /// Position of `child` among this node's children.
    pub(crate) fn position_of(&self, child: NodeId) -> Option<usize> {
        self.children.iter().position(|&c| c == child)
    }

    /// Inserts `separator` with `right` as its right-hand child.
    ///
    /// Returns the index the separator landed at.
    pub(crate) fn insert_separator(&mut self, separator: Key, right: NodeId) -> usize {
        let index = self.upper_bound(separator);
        self.keys.insert(index, separator);
        self.children.insert(index + 1, right);
        index
    }

    /// Removes `keys[index]` together with the child to its right.
    pub(crate) fn remove_separator(&mut self, index: usize) -> (Key, NodeId) {
        let key = self.keys.remove(index);
        let child = self.children.remove(index + 1);
        (key, child)
    }

    /// Splits an overflowing node around `keys[min]`.
    ///
    /// `self` keeps `keys[..min]` and `children[..=min]`; the returned node
    /// takes everything after the middle key, which is moved up rather than
    /// copied. The new node's parent is left for the caller to set.
    pub(crate) fn split_off(&mut self, min: usize) -> (Key, InternalNode) {
        let right_keys = self.keys.split_off(min + 1);
        let right_children = self.children.split_off(min + 1);
        // keys.len() == min + 1 here, so the pop is keys[min].
        let middle = self.keys.pop().unwrap_or_default();
        let right = InternalNode {
            parent: self.parent,
            keys: right_keys,
            children: right_children,
        };
        (middle, right)
    }
}

impl LeafNode {
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }

    /// `Ok(index)` if `key` is stored, `Err(insert_position)` otherwise.
    #[inline]
    pub(crate) fn search(&self, key: Key) -> Result<usize, usize> {
        self.keys.binary_search(&key)
    }

    /// First index whose key is `>= key`.
    #[inline]
    pub(crate) fn lower_bound(&self, key: Key) -> usize {
        self.keys.partition_point(|&k| k < key)
    }

    /// First index whose key is `> key`.
    #[inline]
    pub(crate) fn upper_bound(&self, key: Key) -> usize {
        self.keys.partition_point(|&k| k <= key)
    }

    pub(crate) fn get(&self, key: Key) -> Option<Value> {
        self.search(key).ok().map(|index| self.values[index])
    }

    pub(crate) fn insert_at(&mut self, index: usize, key: Key, value: Value) {
        self.keys.insert(index, key);
        self.values.insert(index, value);
    }

    pub(crate) fn remove_at(&mut self, index: usize) -> (Key, Value) {
        (self.keys.remove(index), self.values.remove(index))
    }

    pub(crate) fn push_back(&mut self, key: Key, value: Value) {
        self.keys.push(key);
        self.values.push(value);
    }

    pub(crate) fn push_front(&mut self, key: Key, value: Value) {
        self.insert_at(0, key, value);
    }

    pub(crate) fn pop_back(&mut self) -> Option<(Key, Value)> {
        let key = self.keys.pop()?;
        let value = self.values.pop()?;
        Some((key, value))
    }

    pub(crate) fn pop_front(&mut self) -> Option<(Key, Value)> {
        if self.keys.is_empty() {
            return None;
        }
        Some(self.remove_at(0))
    }

    pub(crate) fn first_key(&self) -> Option<Key> {
        self.keys.first().copied()
    }

    /// Appends every entry of `other`, which must hold only larger keys.
    pub(crate) fn append(&mut self, other: &mut LeafNode) {
        self.keys.append(&mut other.keys);
        self.values.append(&mut other.values);
    }

    /// Splits an overflowing leaf, keeping the first `min` entries.
    ///
    /// The returned leaf has no chain links yet; its first key is the
    /// separator to copy up.
    pub(crate) fn split_off(&mut self, min: usize) -> LeafNode {
        LeafNode {
            parent: self.parent,
            prev: None,
            next: None,
            keys: self.keys.split_off(min),
            values: self.values.split_off(min),
        }
    }
}
