use crate::float_types::{Real, BOGUS_RANGE};

/// Injected configuration for a compile.
///
/// Every knob the core recognises; external layers (CLI parsing, map
/// directives) populate this and hand it to [`crate::Compiler`].
#[derive(Debug, Clone)]
pub struct Options {
    /// Maximum absolute coordinate for any vertex. Split halves that land
    /// outside this range are rejected as bogus.
    pub worldextent: Real,
    /// Minimum volume a brush may have after a split; smaller halves are
    /// dropped and counted.
    pub microvolume: Real,
    /// When >= 64, nodes larger than this along any axis are split with the
    /// volume-balancing midsplit method instead of the full heuristic.
    pub maxnodesize: Real,
    /// When non-zero, switch to midsplit while a node still holds more than
    /// this fraction of the map's brushes. Overrides the size-based trigger.
    pub midsplitbrushfraction: Real,
    /// Subtracted from `maxnodesize` before comparing node extents.
    pub epsilon: Real,
    /// Epsilon handed to winding clipping.
    pub on_epsilon: Real,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            worldextent: BOGUS_RANGE,
            microvolume: 1.0,
            maxnodesize: 1024.0,
            midsplitbrushfraction: 0.0,
            epsilon: 0.0001,
            on_epsilon: 0.0001,
        }
    }
}
