use crate::float_types::Real;
use nalgebra::Point3;

/// A winding failed one of its validity checks.
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
pub enum WindingError {
    /// Fewer than three points can't bound an area
    #[error("winding has {0} points, need at least 3")]
    NotEnoughPoints(usize),
    /// A vertex lies outside the representable coordinate range
    #[error("point({0}) is outside the world range")]
    OutOfRange(Point3<Real>),
    /// Two consecutive vertices are (nearly) identical
    #[error("degenerate edge at point({0})")]
    DegenerateEdge(Point3<Real>),
    /// A vertex does not lie on the winding's plane
    #[error("point({0}) is {1} off the winding plane")]
    OffPlane(Point3<Real>, Real),
    /// The vertex loop is not convex
    #[error("winding is not convex at point({0})")]
    NonConvex(Point3<Real>),
}

/// A plane could not be constructed.
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
pub enum PlaneError {
    /// The input points are collinear or coincident
    #[error("points do not define a plane")]
    Degenerate,
}
