//! Index layer: the B+ tree engine and the facade callers go through.
//!
//! [`TreeIndex`] is the entry point for the four operations a driver issues
//! (initialize, insert, delete, search). It owns at most one
//! [`BPlusTree`](btree::BPlusTree) behind a lock, so it can be shared by
//! reference across threads.

pub mod btree;
pub mod stats;

use parking_lot::RwLock;
use tracing::{debug, error};

use crate::common::{Error, Key, Order, Result, Value};
use crate::index::btree::BPlusTree;
use crate::index::stats::StatsSnapshot;

/// Lifecycle of the tree held by a [`TreeIndex`].
#[derive(Debug)]
enum IndexState {
    Uninitialized,
    Ready(BPlusTree),
    /// A consistency failure was seen; the tree has been dropped.
    Poisoned,
}

/// Initialize-once facade over a single [`BPlusTree`].
///
/// # Thread Safety
/// - lookups (`get`, `range`, `len`, `stats`, `render`) take the read lock
/// - mutations (`initialize`, `insert`, `delete`) take the write lock
///
/// A `Corrupted` error from the engine poisons the index: the tree is
/// discarded and every later call fails with `Error::Poisoned`.
///
/// # Usage
/// ```
/// use bplustree::{Order, TreeIndex};
///
/// let index = TreeIndex::new();
/// index.initialize(Order::new(3)?)?;
/// index.insert(21, 0.3)?;
/// index.insert(108, 31.907)?;
///
/// assert_eq!(index.get(21)?, Some(0.3));
/// assert_eq!(index.range(0, 200)?, vec![0.3, 31.907]);
/// # Ok::<(), bplustree::Error>(())
/// ```
#[derive(Debug)]
pub struct TreeIndex {
    state: RwLock<IndexState>,
}

impl TreeIndex {
    /// Create an index with no tree. Call [`initialize`](Self::initialize)
    /// before anything else.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(IndexState::Uninitialized),
        }
    }

    /// Create the tree with branching factor `order`.
    ///
    /// # Errors
    /// - `Error::AlreadyInitialized` if a tree already exists
    /// - `Error::Poisoned` after a consistency failure
    pub fn initialize(&self, order: Order) -> Result<()> {
        let mut state = self.state.write();
        match *state {
            IndexState::Uninitialized => {
                *state = IndexState::Ready(BPlusTree::new(order));
                debug!(%order, "index initialized");
                Ok(())
            }
            IndexState::Ready(_) => Err(Error::AlreadyInitialized),
            IndexState::Poisoned => Err(Error::Poisoned),
        }
    }

    pub fn is_initialized(&self) -> bool {
        matches!(*self.state.read(), IndexState::Ready(_))
    }

    /// Whether a consistency failure has disabled this index.
    pub fn is_poisoned(&self) -> bool {
        matches!(*self.state.read(), IndexState::Poisoned)
    }

    // ========================================================================
    // Public API: Mutations
    // ========================================================================

    /// Insert a new entry. Returns `false` if the key was already present,
    /// in which case nothing changes.
    pub fn insert(&self, key: Key, value: Value) -> Result<bool> {
        self.write(|tree| Ok(tree.insert(key, value)))
    }

    /// Remove `key`, returning its value if it was present.
    pub fn delete(&self, key: Key) -> Result<Option<Value>> {
        self.write(|tree| tree.remove(key))
    }

    // ========================================================================
    // Public API: Lookups
    // ========================================================================

    pub fn get(&self, key: Key) -> Result<Option<Value>> {
        self.read(|tree| Ok(tree.get(key)))
    }

    /// Values of every key in `[low, high]`, ascending.
    pub fn range(&self, low: Key, high: Key) -> Result<Vec<Value>> {
        self.read(|tree| tree.range(low, high))
    }

    pub fn len(&self) -> Result<usize> {
        self.read(|tree| Ok(tree.len()))
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.read(|tree| Ok(tree.is_empty()))
    }

    pub fn stats(&self) -> Result<StatsSnapshot> {
        self.read(|tree| Ok(tree.stats().snapshot()))
    }

    /// Level-order rendering of the tree, one line per level.
    pub fn render(&self) -> Result<String> {
        self.read(|tree| Ok(tree.to_string()))
    }

    /// Run the structural self-check. A failure poisons the index.
    pub fn validate(&self) -> Result<()> {
        self.write(|tree| tree.validate())
    }

    // ========================================================================
    // Internal: Lock helpers
    // ========================================================================

    fn read<T>(&self, f: impl FnOnce(&BPlusTree) -> Result<T>) -> Result<T> {
        match &*self.state.read() {
            IndexState::Ready(tree) => f(tree),
            IndexState::Uninitialized => Err(Error::NotInitialized),
            IndexState::Poisoned => Err(Error::Poisoned),
        }
    }

    fn write<T>(&self, f: impl FnOnce(&mut BPlusTree) -> Result<T>) -> Result<T> {
        let mut state = self.state.write();
        let tree = match &mut *state {
            IndexState::Ready(tree) => tree,
            IndexState::Uninitialized => return Err(Error::NotInitialized),
            IndexState::Poisoned => return Err(Error::Poisoned),
        };

        let result = f(tree);
        if let Err(e) = &result {
            if e.is_fatal() {
                error!(error = %e, "index poisoned");
                *state = IndexState::Poisoned;
            }
        }
        result
    }
}

impl Default for TreeIndex {
    fn default() -> Self {
        Self::new()
    }
}
