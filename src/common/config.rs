//! Configuration for the B+ tree index.

use std::fmt;

use crate::common::{Error, Result};

/// Smallest branching factor that keeps `MIN >= 1`.
///
/// With `M = 2` a non-root node could legally be empty, so borrow/merge
/// rebalancing would have nothing to work with.
pub const MIN_ORDER: usize = 3;

/// File the command driver writes search results to.
pub const OUTPUT_FILENAME: &str = "output_file.txt";

/// Branching factor `M` of a tree, fixed at construction.
///
/// # Derived bounds
/// ```text
/// MAX = M - 1            keys per internal node, entries per leaf
/// MIN = ceil(M / 2) - 1  lower bound for every non-root node
/// ```
///
/// # Example
/// ```
/// use bplustree::Order;
///
/// let order = Order::new(5).unwrap();
/// assert_eq!(order.max_keys(), 4);
/// assert_eq!(order.min_keys(), 2);
/// assert!(Order::new(2).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Order(usize);

impl Order {
    /// Validate and wrap a branching factor.
    ///
    /// # Errors
    /// Returns `Error::InvalidOrder` if `m < MIN_ORDER`.
    pub fn new(m: usize) -> Result<Self> {
        if m < MIN_ORDER {
            return Err(Error::InvalidOrder {
                order: i64::try_from(m).unwrap_or(i64::MAX),
            });
        }
        Ok(Order(m))
    }

    /// The branching factor `M`.
    #[inline]
    pub fn get(self) -> usize {
        self.0
    }

    /// Maximum keys per internal node and entries per leaf.
    #[inline]
    pub fn max_keys(self) -> usize {
        self.0 - 1
    }

    /// Minimum keys/entries for any node that is not the root.
    #[inline]
    pub fn min_keys(self) -> usize {
        self.0.div_ceil(2) - 1
    }
}

impl TryFrom<i64> for Order {
    type Error = Error;

    fn try_from(m: i64) -> Result<Self> {
        let m = usize::try_from(m).map_err(|_| Error::InvalidOrder { order: m })?;
        Order::new(m)
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Order({})", self.0)
    }
}
