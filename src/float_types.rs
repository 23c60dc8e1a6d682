// Re-export parry for the appropriate float size
#[cfg(feature = "f64")]
pub use parry3d_f64 as parry3d;

#[cfg(feature = "f32")]
pub use parry3d;

// Our Real scalar type:
#[cfg(feature = "f32")]
pub type Real = f32;
#[cfg(feature = "f64")]
pub type Real = f64;

/// Tolerance for normal comparison and parallel-plane checks.
pub const NORMAL_EPSILON: Real = 1e-6;

/// Tolerance for plane-distance equality in the plane registry.
pub const DIST_EPSILON: Real = 1e-4;

/// If a brush just barely pokes onto the other side of a plane,
/// let it slide by without chopping.
pub const PLANESIDE_EPSILON: Real = 0.001;

/// Half-extent of the square produced by [`crate::winding::Winding::base_for_plane`];
/// large enough to cover any sane map before clipping trims it down.
pub const BOGUS_RANGE: Real = 65536.0;

/// The exact bounding box of the brushes is expanded by this much for the
/// head node volume.
pub const SIDESPACE: Real = 24.0;

/// Edge length below which integer vertex snapping would crunch the edge
/// out of existence.
pub const EDGE_LENGTH: Real = 0.2;
