//! Range scans over the leaf chain.

use std::iter::FusedIterator;

use tracing::trace;

use crate::common::{Error, Key, NodeId, Result, Value};
use crate::index::btree::arena::NodeArena;
use crate::index::btree::node::Node;
use crate::index::btree::BPlusTree;
use crate::index::stats::IndexStats;

impl BPlusTree {
    /// Values of every key in `[low, high]`, in ascending key order.
    ///
    /// # Errors
    /// Returns `Error::InvalidRange` if `low > high`.
    pub fn range(&self, low: Key, high: Key) -> Result<Vec<Value>> {
        let values: Vec<Value> = self.range_entries(low, high)?.map(|(_, value)| value).collect();
        IndexStats::bump(&self.stats.range_scans);
        trace!(low, high, count = values.len(), "range");
        Ok(values)
    }

    /// Iterate the entries with keys in `[low, high]` without collecting.
    ///
    /// # Errors
    /// Returns `Error::InvalidRange` if `low > high`.
    pub fn range_entries(&self, low: Key, high: Key) -> Result<RangeIter<'_>> {
        if low > high {
            return Err(Error::InvalidRange { low, high });
        }
        let (left, right) = self.locate_range(low, high);
        let index = match self.nodes.get(left) {
            Node::Leaf(leaf) => leaf.lower_bound(low),
            Node::Internal(_) => 0,
        };
        Ok(RangeIter::new(&self.nodes, left, index, Some((right, high))))
    }

    /// Iterate every entry in ascending key order.
    pub fn iter(&self) -> RangeIter<'_> {
        RangeIter::new(&self.nodes, self.first_leaf(), 0, None)
    }
}

/// Forward iterator over `(key, value)` pairs, following `next` links.
///
/// Each leaf is visited at most once. A bounded scan stops after the leaf
/// that owns its upper bound.
pub struct RangeIter<'a> {
    nodes: &'a NodeArena,
    leaf: Option<NodeId>,
    index: usize,
    end: usize,
    stop: Option<(NodeId, Key)>,
}

impl<'a> RangeIter<'a> {
    fn new(nodes: &'a NodeArena, leaf: NodeId, index: usize, stop: Option<(NodeId, Key)>) -> Self {
        let mut iter = Self {
            nodes,
            leaf: Some(leaf),
            index,
            end: 0,
            stop,
        };
        iter.end = iter.end_of(leaf);
        iter
    }

    /// Exclusive slice end within `id`: the whole leaf, or up to the bound
    /// on the last leaf of the scan.
    fn end_of(&self, id: NodeId) -> usize {
        let Node::Leaf(leaf) = self.nodes.get(id) else {
            return 0;
        };
        match self.stop {
            Some((last, high)) if last == id => leaf.upper_bound(high),
            _ => leaf.len(),
        }
    }
}

impl Iterator for RangeIter<'_> {
    type Item = (Key, Value);

    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.nodes;
        loop {
            let id = self.leaf?;
            let Node::Leaf(leaf) = nodes.get(id) else {
                self.leaf = None;
                return None;
            };

            if self.index < self.end {
                let item = (leaf.keys[self.index], leaf.values[self.index]);
                self.index += 1;
                return Some(item);
            }

            if matches!(self.stop, Some((last, _)) if last == id) {
                self.leaf = None;
                return None;
            }
            self.leaf = leaf.next;
            self.index = 0;
            if let Some(next) = self.leaf {
                self.end = self.end_of(next);
            }
        }
    }
}

impl FusedIterator for RangeIter<'_> {}
