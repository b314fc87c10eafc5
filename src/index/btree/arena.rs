//! Node store: the arena that owns every node of a tree.
//!
//! Nodes refer to each other only through [`NodeId`] handles, so parent
//! back-references and leaf-chain links never own anything. Freeing a node
//! returns its slot to a free list for reuse.

use crate::common::{Error, NodeId, Result};
use crate::index::btree::node::{InternalNode, LeafNode, Node};

#[derive(Debug, Clone, Default)]
pub(crate) struct NodeArena {
    slots: Vec<Option<Node>>,
    free: Vec<NodeId>,
}

impl NodeArena {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(crate) fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.slots[id.0] = Some(node);
            id
        } else {
            self.slots.push(Some(node));
            NodeId::new(self.slots.len() - 1)
        }
    }

    /// # Panics
    /// Panics if `id` does not name a live node.
    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> &Node {
        match self.slots.get(id.0) {
            Some(Some(node)) => node,
            _ => panic!("stale node handle {}", id),
        }
    }

    /// # Panics
    /// Panics if `id` does not name a live node.
    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node {
        match self.slots.get_mut(id.0) {
            Some(Some(node)) => node,
            _ => panic!("stale node handle {}", id),
        }
    }

    /// Removes a node from the arena and hands it back.
    ///
    /// # Panics
    /// Panics if `id` does not name a live node.
    pub(crate) fn take(&mut self, id: NodeId) -> Node {
        match self.slots.get_mut(id.0).and_then(Option::take) {
            Some(node) => {
                self.free.push(id);
                node
            }
            None => panic!("stale node handle {}", id),
        }
    }

    // ========================================================================
    // Variant-checked access
    // ========================================================================

    pub(crate) fn leaf(&self, id: NodeId) -> Result<&LeafNode> {
        match self.get(id) {
            Node::Leaf(leaf) => Ok(leaf),
            Node::Internal(_) => Err(Error::corrupted(format!("{} is not a leaf", id))),
        }
    }

    pub(crate) fn leaf_mut(&mut self, id: NodeId) -> Result<&mut LeafNode> {
        match self.get_mut(id) {
            Node::Leaf(leaf) => Ok(leaf),
            Node::Internal(_) => Err(Error::corrupted(format!("{} is not a leaf", id))),
        }
    }

    pub(crate) fn internal(&self, id: NodeId) -> Result<&InternalNode> {
        match self.get(id) {
            Node::Internal(internal) => Ok(internal),
            Node::Leaf(_) => Err(Error::corrupted(format!("{} is not an internal node", id))),
        }
    }

    pub(crate) fn internal_mut(&mut self, id: NodeId) -> Result<&mut InternalNode> {
        match self.get_mut(id) {
            Node::Internal(internal) => Ok(internal),
            Node::Leaf(_) => Err(Error::corrupted(format!("{} is not an internal node", id))),
        }
    }

    pub(crate) fn take_leaf(&mut self, id: NodeId) -> Result<LeafNode> {
        // Check before taking so a mismatch leaves the arena untouched.
        self.leaf(id)?;
        match self.take(id) {
            Node::Leaf(leaf) => Ok(leaf),
            Node::Internal(_) => Err(Error::corrupted(format!("{} is not a leaf", id))),
        }
    }

    pub(crate) fn take_internal(&mut self, id: NodeId) -> Result<InternalNode> {
        self.internal(id)?;
        match self.take(id) {
            Node::Internal(internal) => Ok(internal),
            Node::Leaf(_) => Err(Error::corrupted(format!("{} is not an internal node", id))),
        }
    }

    pub(crate) fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).parent()
    }

    pub(crate) fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        self.get_mut(id).set_parent(parent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_alloc_reuses_freed_slots() {
        let mut arena = NodeArena::new();
        let a = arena.alloc(Node::new_leaf());
        let b = arena.alloc(Node::new_leaf());
        assert_eq!(arena.len(), 2);

        arena.take(a);
        assert_eq!(arena.len(), 1);

        let c = arena.alloc(Node::new_leaf());
        assert_eq!(c, a);
        assert_ne!(c, b);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_variant_mismatch_is_corruption() {
        let mut arena = NodeArena::new();
        let leaf = arena.alloc(Node::new_leaf());
        let internal = arena.alloc(Node::Internal(InternalNode::new_root(1, leaf, leaf)));

        assert!(arena.leaf(leaf).is_ok());
        assert!(matches!(arena.internal(leaf), Err(Error::Corrupted { .. })));
        assert!(matches!(arena.leaf_mut(internal), Err(Error::Corrupted { .. })));
        assert!(matches!(arena.take_leaf(internal), Err(Error::Corrupted { .. })));

        // The failed take left the node in place.
        assert_eq!(arena.len(), 2);
        assert!(arena.take_internal(internal).is_ok());
    }

    #[test]
    fn test_parent_links() {
        let mut arena = NodeArena::new();
        let child = arena.alloc(Node::new_leaf());
        let parent = arena.alloc(Node::new_leaf());

        assert_eq!(arena.parent_of(child), None);
        arena.set_parent(child, Some(parent));
        assert_eq!(arena.parent_of(child), Some(parent));
    }

    #[test]
    #[should_panic(expected = "stale node handle")]
    fn test_stale_handle_panics() {
        let mut arena = NodeArena::new();
        let id = arena.alloc(Node::new_leaf());
        arena.take(id);
        let _ = arena.get(id);
    }

    #[derive(Clone, Debug)]
    enum Operation {
        Alloc(i32),
        Free(usize),
        Update(usize, i32),
    }

    fn strategy() -> impl Strategy<Value = Operation> {
        prop_oneof![
            4 => any::<i32>().prop_map(Operation::Alloc),
            2 => any::<usize>().prop_map(Operation::Free),
            1 => (any::<usize>(), any::<i32>()).prop_map(|(which, key)| Operation::Update(which, key)),
        ]
    }

    fn leaf_key(arena: &NodeArena, id: NodeId) -> i32 {
        arena.leaf(id).unwrap().keys[0]
    }

    proptest! {
        #[test]
        fn arena_tracks_live_nodes(operations in prop::collection::vec(strategy(), 0..200)) {
            let mut model: Vec<(NodeId, i32)> = Vec::new();
            let mut arena = NodeArena::new();

            for operation in operations {
                match operation {
                    Operation::Alloc(key) => {
                        let mut leaf = LeafNode::default();
                        leaf.push_back(key, 0.0);
                        let id = arena.alloc(Node::Leaf(leaf));
                        prop_assert!(model.iter().all(|&(other, _)| other != id));
                        model.push((id, key));
                    }
                    Operation::Free(which) => {
                        if model.is_empty() {
                            continue;
                        }
                        let (id, key) = model.swap_remove(which % model.len());
                        let leaf = arena.take_leaf(id).unwrap();
                        prop_assert_eq!(leaf.keys[0], key);
                    }
                    Operation::Update(which, key) => {
                        if model.is_empty() {
                            continue;
                        }
                        let index = which % model.len();
                        arena.leaf_mut(model[index].0).unwrap().keys[0] = key;
                        model[index].1 = key;
                    }
                }

                prop_assert_eq!(arena.len(), model.len());
                for &(id, key) in &model {
                    prop_assert_eq!(leaf_key(&arena, id), key);
                }
            }
        }
    }
}
