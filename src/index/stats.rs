//! Index statistics tracking.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics tracked by a tree.
///
/// All fields are atomic so that lookups, which only hold `&self` (or a
/// shared read lock in [`TreeIndex`](crate::TreeIndex)), can still count.
///
/// # Memory Ordering
/// We use `Ordering::Relaxed` for all operations because:
/// - We only need atomicity (no partial updates)
/// - We don't need synchronization between different counters
/// - Statistics are "eventually consistent" - exact ordering doesn't matter
///
/// # Example
/// ```
/// use bplustree::IndexStats;
/// use std::sync::atomic::Ordering;
///
/// let stats = IndexStats::new();
/// stats.point_lookups.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(stats.point_lookups.load(Ordering::Relaxed), 1);
/// ```
#[derive(Debug, Default)]
pub struct IndexStats {
    /// Number of `get` calls.
    pub point_lookups: AtomicU64,

    /// Number of `range` calls that passed validation.
    pub range_scans: AtomicU64,

    /// Number of inserts that added a new key.
    pub inserts: AtomicU64,

    /// Number of inserts ignored because the key was already present.
    pub duplicate_inserts: AtomicU64,

    /// Number of deletes that removed a key.
    pub deletes: AtomicU64,

    /// Number of deletes of a key that was not present.
    pub missing_deletes: AtomicU64,

    /// Number of leaf splits.
    pub leaf_splits: AtomicU64,

    /// Number of internal node splits.
    pub internal_splits: AtomicU64,

    /// Number of single-entry (leaf) or single-key (internal) borrows.
    pub borrows: AtomicU64,

    /// Number of sibling merges, leaf or internal.
    pub merges: AtomicU64,

    /// Number of times a new root was created above a split.
    pub root_splits: AtomicU64,

    /// Number of times an empty internal root was replaced by its child.
    pub root_collapses: AtomicU64,
}

impl IndexStats {
    /// Create a new stats tracker with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Fraction of deletes that found their key (0.0 to 1.0).
    pub fn delete_hit_rate(&self) -> f64 {
        self.snapshot().delete_hit_rate()
    }

    /// Get a snapshot of current statistics.
    ///
    /// This returns a non-atomic copy for display/logging.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            point_lookups: self.point_lookups.load(Ordering::Relaxed),
            range_scans: self.range_scans.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            duplicate_inserts: self.duplicate_inserts.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            missing_deletes: self.missing_deletes.load(Ordering::Relaxed),
            leaf_splits: self.leaf_splits.load(Ordering::Relaxed),
            internal_splits: self.internal_splits.load(Ordering::Relaxed),
            borrows: self.borrows.load(Ordering::Relaxed),
            merges: self.merges.load(Ordering::Relaxed),
            root_splits: self.root_splits.load(Ordering::Relaxed),
            root_collapses: self.root_collapses.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        for counter in [
            &self.point_lookups,
            &self.range_scans,
            &self.inserts,
            &self.duplicate_inserts,
            &self.deletes,
            &self.missing_deletes,
            &self.leaf_splits,
            &self.internal_splits,
            &self.borrows,
            &self.merges,
            &self.root_splits,
            &self.root_collapses,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Clone for IndexStats {
    fn clone(&self) -> Self {
        let s = self.snapshot();
        Self {
            point_lookups: AtomicU64::new(s.point_lookups),
            range_scans: AtomicU64::new(s.range_scans),
            inserts: AtomicU64::new(s.inserts),
            duplicate_inserts: AtomicU64::new(s.duplicate_inserts),
            deletes: AtomicU64::new(s.deletes),
            missing_deletes: AtomicU64::new(s.missing_deletes),
            leaf_splits: AtomicU64::new(s.leaf_splits),
            internal_splits: AtomicU64::new(s.internal_splits),
            borrows: AtomicU64::new(s.borrows),
            merges: AtomicU64::new(s.merges),
            root_splits: AtomicU64::new(s.root_splits),
            root_collapses: AtomicU64::new(s.root_collapses),
        }
    }
}

/// A point-in-time snapshot of index statistics.
///
/// Unlike `IndexStats`, this is not atomic and can be safely
/// printed, compared, etc.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub point_lookups: u64,
    pub range_scans: u64,
    pub inserts: u64,
    pub duplicate_inserts: u64,
    pub deletes: u64,
    pub missing_deletes: u64,
    pub leaf_splits: u64,
    pub internal_splits: u64,
    pub borrows: u64,
    pub merges: u64,
    pub root_splits: u64,
    pub root_collapses: u64,
}

impl StatsSnapshot {
    /// Fraction of deletes that found their key (0.0 to 1.0).
    pub fn delete_hit_rate(&self) -> f64 {
        let total = self.deletes + self.missing_deletes;
        if total == 0 {
            0.0
        } else {
            self.deletes as f64 / total as f64
        }
    }

    /// Total splits of either node kind.
    pub fn splits(&self) -> u64 {
        self.leaf_splits + self.internal_splits
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ inserts: {}, deletes: {}, lookups: {}, ranges: {}, splits: {}, borrows: {}, merges: {}, height changes: +{}/-{} }}",
            self.inserts,
            self.deletes,
            self.point_lookups,
            self.range_scans,
            self.splits(),
            self.borrows,
            self.merges,
            self.root_splits,
            self.root_collapses
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = IndexStats::new();
        assert_eq!(stats.inserts.load(Ordering::Relaxed), 0);
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
        assert_eq!(stats.delete_hit_rate(), 0.0);
    }

    #[test]
    fn test_stats_increment() {
        let stats = IndexStats::new();

        stats.deletes.fetch_add(3, Ordering::Relaxed);
        IndexStats::bump(&stats.missing_deletes);

        assert_eq!(stats.delete_hit_rate(), 0.75);
    }

    #[test]
    fn test_stats_snapshot() {
        let stats = IndexStats::new();
        IndexStats::bump(&stats.leaf_splits);
        IndexStats::bump(&stats.leaf_splits);
        IndexStats::bump(&stats.internal_splits);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.leaf_splits, 2);
        assert_eq!(snapshot.splits(), 3);
    }

    #[test]
    fn test_stats_reset() {
        let stats = IndexStats::new();
        stats.inserts.fetch_add(100, Ordering::Relaxed);
        stats.root_collapses.fetch_add(2, Ordering::Relaxed);

        stats.reset();

        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_stats_clone_is_independent() {
        let stats = IndexStats::new();
        IndexStats::bump(&stats.merges);

        let cloned = stats.clone();
        IndexStats::bump(&stats.merges);

        assert_eq!(cloned.merges.load(Ordering::Relaxed), 1);
        assert_eq!(stats.merges.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_stats_display() {
        let stats = IndexStats::new();
        stats.inserts.fetch_add(80, Ordering::Relaxed);
        stats.deletes.fetch_add(20, Ordering::Relaxed);
        stats.borrows.fetch_add(5, Ordering::Relaxed);

        let display = format!("{}", stats.snapshot());

        assert!(display.contains("inserts: 80"));
        assert!(display.contains("deletes: 20"));
        assert!(display.contains("borrows: 5"));
    }
}
