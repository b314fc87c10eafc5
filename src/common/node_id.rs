//! Node identifier type.

use std::fmt;

/// Identifies a node slot in the tree's node arena.
///
/// Using `usize` because:
/// 1. Nodes are stored in a `Vec` of slots
/// 2. Direct indexing without casting: `slots[node_id.0]`
/// 3. Parent and leaf-chain links are plain copies of this value, so they
///    never own the node they point at
///
/// A `NodeId` stays valid until its node is freed by a merge or a root
/// collapse; the slot may then be reused for a new node.
///
/// # Example
/// ```
/// use bplustree::NodeId;
///
/// let node_id = NodeId::new(5);
/// assert_eq!(node_id.0, 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// Create a new NodeId.
    #[inline]
    pub fn new(id: usize) -> Self {
        NodeId(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}
