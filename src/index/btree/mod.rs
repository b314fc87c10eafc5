//! B+ tree index engine.
//!
//! # Layout
//! ```text
//!                        ┌──────────────┐
//!                        │ In[30]       │  root (internal)
//!                        └──┬────────┬──┘
//!                 ┌─────────┘        └─────────┐
//!           ┌─────┴──────┐               ┌─────┴──────┐
//!           │ In[10,20]  │               │ In[40]     │
//!           └─┬────┬───┬─┘               └──┬──────┬──┘
//!      ┌──────┘    │   └─────┐          ┌───┘      └───┐
//!   [1,5] ⇄ [10,15] ⇄ [20,25] ⇄ ──── [30,35] ⇄ ───── [40,45]
//!                    leaf chain (prev/next)
//! ```
//!
//! Every node lives in a [`NodeArena`](arena::NodeArena) owned by the tree;
//! children, parents and chain neighbours are [`NodeId`] handles. Separators
//! follow the copy-up convention: a key equal to a separator lives in the
//! right subtree.
//!
//! # Operations
//! - descent and point lookup (this module)
//! - [`insert`](BPlusTree::insert) with split propagation (`insert`)
//! - [`remove`](BPlusTree::remove) with borrow/merge rebalancing and root
//!   collapse (`delete`)
//! - [`range`](BPlusTree::range) and forward iteration over the leaf chain
//!   (`range`)
//! - structural [`validate`](BPlusTree::validate) (`validate`)

mod arena;
mod delete;
mod insert;
mod node;
mod range;
mod validate;

use std::collections::VecDeque;
use std::fmt;

use tracing::trace;

use crate::common::{Key, NodeId, Order, Result, Value};
use crate::index::stats::IndexStats;

use arena::NodeArena;
use node::Node;

pub use range::RangeIter;

/// An in-memory B+ tree mapping `i32` keys to `f64` values.
///
/// The tree begins as a single empty leaf that is also the root. Only two
/// paths ever reassign the root: root creation when a split reaches the top,
/// and root collapse when an internal root loses its last key.
///
/// # Example
/// ```
/// use bplustree::{BPlusTree, Order};
///
/// let mut tree = BPlusTree::new(Order::new(3).unwrap());
/// assert!(tree.insert(7, 0.7));
/// assert!(!tree.insert(7, 9.9)); // insert never overwrites
/// assert_eq!(tree.get(7), Some(0.7));
/// assert_eq!(tree.range(0, 10).unwrap(), vec![0.7]);
/// assert_eq!(tree.remove(7).unwrap(), Some(0.7));
/// assert!(tree.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BPlusTree {
    order: Order,
    nodes: NodeArena,
    root: NodeId,
    len: usize,
    stats: IndexStats,
}

impl BPlusTree {
    /// Create an empty tree with the given branching factor.
    pub fn new(order: Order) -> Self {
        let mut nodes = NodeArena::new();
        let root = nodes.alloc(Node::new_leaf());
        Self {
            order,
            nodes,
            root,
            len: 0,
            stats: IndexStats::new(),
        }
    }

    /// Create an empty tree from a raw branching factor.
    ///
    /// # Errors
    /// Returns `Error::InvalidOrder` if `m < 3`.
    pub fn with_order(m: usize) -> Result<Self> {
        Ok(Self::new(Order::new(m)?))
    }

    // ========================================================================
    // Public API: Info
    // ========================================================================

    /// The branching factor this tree was built with.
    pub fn order(&self) -> Order {
        self.order
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels, counting the leaf level (a lone root leaf is 1).
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut current = self.root;
        while let Node::Internal(internal) = self.nodes.get(current) {
            current = internal.children[0];
            height += 1;
        }
        height
    }

    /// Number of live nodes, internal and leaf.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Operation and structural-change counters.
    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    // ========================================================================
    // Public API: Lookup
    // ========================================================================

    /// Look up the value stored under `key`.
    ///
    /// Returns `None` when the key is absent; never a placeholder value.
    pub fn get(&self, key: Key) -> Option<Value> {
        IndexStats::bump(&self.stats.point_lookups);
        let value = match self.nodes.get(self.locate(key)) {
            Node::Leaf(leaf) => leaf.get(key),
            Node::Internal(_) => None,
        };
        trace!(key, found = value.is_some(), "get");
        value
    }

    /// Whether `key` is stored.
    pub fn contains_key(&self, key: Key) -> bool {
        match self.nodes.get(self.locate(key)) {
            Node::Leaf(leaf) => leaf.search(key).is_ok(),
            Node::Internal(_) => false,
        }
    }

    // ========================================================================
    // Internal: Descent
    // ========================================================================

    /// Descend from the root to the leaf that owns (or would own) `key`.
    ///
    /// At each internal node the search moves to
    /// `children[upper_bound(keys, key)]`.
    pub(crate) fn locate(&self, key: Key) -> NodeId {
        let mut current = self.root;
        while let Node::Internal(internal) = self.nodes.get(current) {
            current = internal.route(key);
        }
        current
    }

    /// Descend two cursors in lockstep for `low` and `high`.
    ///
    /// All leaves sit at the same depth, so both cursors reach the leaf level
    /// together, and since `low <= high` the right cursor never ends up left
    /// of the left one in chain order.
    pub(crate) fn locate_range(&self, low: Key, high: Key) -> (NodeId, NodeId) {
        let mut left = self.root;
        let mut right = self.root;
        while let (Node::Internal(l), Node::Internal(r)) = (self.nodes.get(left), self.nodes.get(right)) {
            left = l.route(low);
            right = r.route(high);
        }
        (left, right)
    }

    /// Leftmost leaf, where a full scan starts.
    pub(crate) fn first_leaf(&self) -> NodeId {
        let mut current = self.root;
        while let Node::Internal(internal) = self.nodes.get(current) {
            current = internal.children[0];
        }
        current
    }
}

/// Level-order rendering, one line per level.
///
/// Internal nodes print as `In[k1,k2]`, leaves as `[k1,k2]`.
impl fmt::Display for BPlusTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut level: VecDeque<NodeId> = VecDeque::from([self.root]);
        while !level.is_empty() {
            let mut next = VecDeque::new();
            for id in level {
                let node = self.nodes.get(id);
                let keys = node
                    .keys()
                    .iter()
                    .map(|k| k.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                match node {
                    Node::Internal(internal) => {
                        write!(f, "In[{}]", keys)?;
                        next.extend(internal.children.iter().copied());
                    }
                    Node::Leaf(_) => write!(f, "[{}]", keys)?,
                }
            }
            writeln!(f)?;
            level = next;
        }
        Ok(())
    }
}
