//! Target-game capability set.
//!
//! The compiler core never interprets content bits directly; every decision
//! that depends on what a brush *is* routes through this trait. A game
//! supplies a content type (typically a small bitflag struct) and the core
//! stays agnostic of its encoding.

use std::fmt::Debug;

/// Per-game content semantics for brushes and leaves.
pub trait Contents: Clone + Send + Sync + Debug {
    /// Per-compile tally of leaf contents, folded at leaf creation.
    type LeafStats: Default + Debug + Send;

    /// The contents of nothing at all (an empty leaf).
    fn empty() -> Self;

    /// Merge the contents of two overlapping volumes.
    fn combine(&self, other: &Self) -> Self;

    /// Detail brushes do not participate in visibility portal generation
    /// and must never cut structural geometry.
    fn is_any_detail(&self) -> bool;

    /// Solid brushes are allowed to bite overlapping brushes during chopping.
    fn is_solid(&self) -> bool;

    /// Record this leaf's contents in the compile tally.
    fn count_in(&self, stats: &mut Self::LeafStats);

    /// Emit the tally to the log.
    fn log_stats(stats: &Self::LeafStats, label: &str);
}
