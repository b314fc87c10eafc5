//! An in-memory B+ tree index mapping `i32` keys to `f64` values.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Command driver (command/)                                      │
//! │     Initialize / Insert / Delete / Search lines → TreeIndex     │
//! └─────────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  TreeIndex (index/)                                             │
//! │     initialize-once, RwLock, poisoned on consistency failure    │
//! └─────────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  BPlusTree (index/btree/)                                       │
//! │     NodeArena + descent, split, borrow/merge, range, validate   │
//! │     IndexStats (atomic counters)                                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (Order, NodeId, Error, Key/Value)
//! - [`index`] - The tree engine, its statistics, and the `TreeIndex` facade
//! - [`command`] - The line-oriented instruction driver
//!
//! # Quick Start
//! ```
//! use bplustree::{BPlusTree, Order};
//!
//! let mut tree = BPlusTree::new(Order::new(4)?);
//! for k in 0..100 {
//!     tree.insert(k, k as f64 / 10.0);
//! }
//! tree.remove(50)?;
//!
//! assert_eq!(tree.get(42), Some(4.2));
//! assert_eq!(tree.range(49, 51)?, vec![4.9, 5.1]);
//! # Ok::<(), bplustree::Error>(())
//! ```

pub mod command;
pub mod common;
pub mod index;

// Re-export commonly used items at crate root for convenience
pub use common::config::MIN_ORDER;
pub use common::{Error, Key, NodeId, Order, Result, Value};

pub use index::btree::{BPlusTree, RangeIter};
pub use index::stats::{IndexStats, StatsSnapshot};
pub use index::TreeIndex;
