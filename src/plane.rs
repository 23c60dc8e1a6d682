//! Oriented planes and plane-side classification.

use crate::errors::PlaneError;
use crate::float_types::{parry3d::bounding_volume::Aabb, Real, NORMAL_EPSILON, PLANESIDE_EPSILON};
use nalgebra::{Point3, Vector3};

/// Something lies (at least partly) in front of the plane.
pub const FRONT: u8 = 1;
/// Something lies (at least partly) behind the plane.
pub const BACK: u8 = 2;
/// Both sides at once.
pub const BOTH: u8 = FRONT | BACK;
/// OR'ed into a brush classification when one of the brush's sides lies on
/// the tested plane.
pub const FACING: u8 = 4;

/// Axial planes sort before the dominant-axis tags; several hot paths take a
/// shortcut for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneType {
    X,
    Y,
    Z,
    AnyX,
    AnyY,
    AnyZ,
}

/// An oriented plane: the locus of points `p` with `normal · p == dist`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vector3<Real>,
    pub dist: Real,
}

impl Plane {
    pub const fn new(normal: Vector3<Real>, dist: Real) -> Self {
        Self { normal, dist }
    }

    /// Plane through three counter-clockwise points.
    pub fn from_points(
        a: &Point3<Real>,
        b: &Point3<Real>,
        c: &Point3<Real>,
    ) -> Result<Self, PlaneError> {
        let normal = (b - a).cross(&(c - a));
        if normal.norm() < NORMAL_EPSILON {
            return Err(PlaneError::Degenerate);
        }
        let normal = normal.normalize();
        Ok(Self::new(normal, normal.dot(&a.coords)))
    }

    /// Signed distance of `p` above the plane.
    #[inline]
    pub fn distance_to(&self, p: &Point3<Real>) -> Real {
        self.normal.dot(&p.coords) - self.dist
    }

    /// The same plane facing the other way.
    #[inline]
    pub fn flipped(&self) -> Self {
        Self::new(-self.normal, -self.dist)
    }

    pub fn flip(&mut self) {
        *self = self.flipped();
    }

    /// Classify by the normal: exactly axis-aligned, or tagged with the
    /// dominant axis.
    pub fn plane_type(&self) -> PlaneType {
        for (i, ty) in [PlaneType::X, PlaneType::Y, PlaneType::Z]
            .into_iter()
            .enumerate()
        {
            if self.normal[i] == 1.0 || self.normal[i] == -1.0 {
                return ty;
            }
        }

        let ax = self.normal.x.abs();
        let ay = self.normal.y.abs();
        let az = self.normal.z.abs();
        if ax >= ay && ax >= az {
            PlaneType::AnyX
        } else if ay >= az {
            PlaneType::AnyY
        } else {
            PlaneType::AnyZ
        }
    }

    #[inline]
    pub fn is_axial(&self) -> bool {
        matches!(self.plane_type(), PlaneType::X | PlaneType::Y | PlaneType::Z)
    }

    /// True when the dominant component of the normal is positive; the plane
    /// registry stores this orientation at even indices.
    pub fn is_positive(&self) -> bool {
        let mut axis = 0;
        for i in 1..3 {
            if self.normal[i].abs() > self.normal[axis].abs() {
                axis = i;
            }
        }
        self.normal[axis] > 0.0
    }
}

/// Which side(s) of `plane` the box occupies: [`FRONT`], [`BACK`] or [`BOTH`].
pub fn box_on_plane_side(bounds: &Aabb, plane: &Plane) -> u8 {
    // axial planes are easy
    let ty = plane.plane_type();
    if let PlaneType::X | PlaneType::Y | PlaneType::Z = ty {
        let axis = ty as usize;
        let mut side = 0;
        if bounds.maxs[axis] > plane.dist + PLANESIDE_EPSILON {
            side |= FRONT;
        }
        if bounds.mins[axis] < plane.dist - PLANESIDE_EPSILON {
            side |= BACK;
        }
        return side;
    }

    // create the proper leading and trailing corners for the box
    let mut corners = [Point3::origin(); 2];
    for i in 0..3 {
        if plane.normal[i] < 0.0 {
            corners[0][i] = bounds.mins[i];
            corners[1][i] = bounds.maxs[i];
        } else {
            corners[1][i] = bounds.mins[i];
            corners[0][i] = bounds.maxs[i];
        }
    }

    let dist1 = plane.distance_to(&corners[0]);
    let dist2 = plane.distance_to(&corners[1]);
    let mut side = 0;
    if dist1 >= PLANESIDE_EPSILON {
        side = FRONT;
    }
    if dist2 < PLANESIDE_EPSILON {
        side |= BACK;
    }

    side
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_types() {
        let p = Plane::new(Vector3::x(), 10.0);
        assert_eq!(p.plane_type(), PlaneType::X);
        assert!(p.is_axial());
        assert!(p.is_positive());

        let q = Plane::new(-Vector3::z(), 4.0);
        assert_eq!(q.plane_type(), PlaneType::Z);
        assert!(!q.is_positive());

        let sloped = Plane::new(Vector3::new(0.8, 0.6, 0.0), 0.0);
        assert_eq!(sloped.plane_type(), PlaneType::AnyX);
        assert!(!sloped.is_axial());
    }

    #[test]
    fn from_points_ccw() {
        let p = Plane::from_points(
            &Point3::new(0.0, 0.0, 5.0),
            &Point3::new(1.0, 0.0, 5.0),
            &Point3::new(0.0, 1.0, 5.0),
        )
        .unwrap();
        assert_eq!(p.normal, Vector3::z());
        assert_eq!(p.dist, 5.0);

        assert_eq!(
            Plane::from_points(
                &Point3::origin(),
                &Point3::new(1.0, 0.0, 0.0),
                &Point3::new(2.0, 0.0, 0.0),
            ),
            Err(PlaneError::Degenerate)
        );
    }

    #[test]
    fn box_sides() {
        let bounds = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(64.0, 64.0, 64.0));
        let split = Plane::new(Vector3::x(), 32.0);
        assert_eq!(box_on_plane_side(&bounds, &split), BOTH);

        let front_of = Plane::new(Vector3::x(), -16.0);
        assert_eq!(box_on_plane_side(&bounds, &front_of), FRONT);

        let behind = Plane::new(Vector3::x(), 128.0);
        assert_eq!(box_on_plane_side(&bounds, &behind), BACK);

        let sloped = Plane::new(Vector3::new(1.0, 1.0, 0.0).normalize(), 45.0);
        assert_eq!(box_on_plane_side(&bounds, &sloped), BOTH);
    }
}
