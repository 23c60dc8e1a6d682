//! Convex planar polygons and the clipping operations the compiler is built on.

use crate::errors::WindingError;
use crate::float_types::{Real, BOGUS_RANGE, DIST_EPSILON, EDGE_LENGTH};
use crate::plane::Plane;
use nalgebra::{Point3, Vector3};

/// An ordered, convex, planar loop of vertices.
///
/// May be empty: bevel sides carry no winding, and clipping can consume a
/// winding entirely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Winding {
    pub points: Vec<Point3<Real>>,
}

impl Winding {
    pub const fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn from_points(points: Vec<Point3<Real>>) -> Self {
        Self { points }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A huge square lying on `plane`, centred on the projection of the
    /// origin onto it. Every real winding starts as one of these and is
    /// clipped down.
    pub fn base_for_plane(plane: &Plane) -> Self {
        // find the major axis of the normal
        let mut axis = None;
        let mut max = -1.0;
        for i in 0..3 {
            let v = plane.normal[i].abs();
            if v > max {
                max = v;
                axis = Some(i);
            }
        }
        let mut up = match axis {
            Some(2) => Vector3::x(),
            Some(_) => Vector3::z(),
            None => unreachable!("zero-length plane normal"),
        };

        up -= plane.normal * up.dot(&plane.normal);
        let up = up.normalize() * BOGUS_RANGE;
        let right = up.cross(&plane.normal);

        let org = Point3::origin() + plane.normal * plane.dist;

        // counter-clockwise as seen from the front half-space
        Self::from_points(vec![
            org - right + up,
            org - right - up,
            org + right - up,
            org + right + up,
        ])
    }

    /// Reverse the loop, flipping the facing of the winding.
    pub fn flipped(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self { points }
    }

    /// Sum of the areas of the fan triangles.
    pub fn area(&self) -> Real {
        let mut total = 0.0;
        for i in 2..self.points.len() {
            let d1 = self.points[i - 1] - self.points[0];
            let d2 = self.points[i] - self.points[0];
            total += d1.cross(&d2).norm() * 0.5;
        }
        total
    }

    /// Split by `plane` into the part in front and the part behind. Points
    /// within `eps` of the plane go to both halves.
    pub fn clip(&self, plane: &Plane, eps: Real) -> (Option<Winding>, Option<Winding>) {
        const SIDE_FRONT: usize = 0;
        const SIDE_BACK: usize = 1;
        const SIDE_ON: usize = 2;

        if self.is_empty() {
            return (None, None);
        }

        let n = self.points.len();
        let mut dists = Vec::with_capacity(n + 1);
        let mut sides = Vec::with_capacity(n + 1);
        let mut counts = [0usize; 3];

        for p in &self.points {
            let d = plane.distance_to(p);
            let side = if d > eps {
                SIDE_FRONT
            } else if d < -eps {
                SIDE_BACK
            } else {
                SIDE_ON
            };
            dists.push(d);
            sides.push(side);
            counts[side] += 1;
        }
        dists.push(dists[0]);
        sides.push(sides[0]);

        if counts[SIDE_FRONT] == 0 {
            return (None, Some(self.clone()));
        }
        if counts[SIDE_BACK] == 0 {
            return (Some(self.clone()), None);
        }

        let mut front = Vec::with_capacity(n + 4);
        let mut back = Vec::with_capacity(n + 4);

        for i in 0..n {
            let p1 = self.points[i];

            if sides[i] == SIDE_ON {
                front.push(p1);
                back.push(p1);
                continue;
            }
            if sides[i] == SIDE_FRONT {
                front.push(p1);
            } else {
                back.push(p1);
            }

            if sides[i + 1] == SIDE_ON || sides[i + 1] == sides[i] {
                continue;
            }

            // generate the split point
            let p2 = self.points[(i + 1) % n];
            let dot = dists[i] / (dists[i] - dists[i + 1]);
            let mut mid = Point3::origin();
            for j in 0..3 {
                // avoid round off error when possible
                if plane.normal[j] == 1.0 {
                    mid[j] = plane.dist;
                } else if plane.normal[j] == -1.0 {
                    mid[j] = -plane.dist;
                } else {
                    mid[j] = p1[j] + dot * (p2[j] - p1[j]);
                }
            }

            front.push(mid);
            back.push(mid);
        }

        (
            Some(Winding::from_points(front)),
            Some(Winding::from_points(back)),
        )
    }

    /// Keep only the part in front of `plane`.
    pub fn clip_front(&self, plane: &Plane, eps: Real) -> Option<Winding> {
        self.clip(plane, eps).0
    }

    /// Keep only the part behind `plane`.
    pub fn clip_back(&self, plane: &Plane, eps: Real) -> Option<Winding> {
        self.clip(plane, eps).1
    }

    /// True if vertex snapping would crunch the winding out of existence:
    /// fewer than three edges survive the snap threshold.
    pub fn is_tiny(&self) -> bool {
        let mut edges = 0;
        let n = self.points.len();
        for i in 0..n {
            let j = (i + 1) % n;
            let len = (self.points[j] - self.points[i]).norm();
            if len > EDGE_LENGTH {
                edges += 1;
                if edges == 3 {
                    return false;
                }
            }
        }
        true
    }

    /// True if any vertex component lies outside the configured world extent;
    /// such a winding still carries a point of its base square.
    pub fn is_huge(&self, worldextent: Real) -> bool {
        self.points
            .iter()
            .any(|p| (0..3).any(|j| p[j].abs() > worldextent))
    }

    /// Validity checks: enough points, in range, non-degenerate edges, planar
    /// within `on_epsilon`, convex.
    pub fn check(&self, plane: &Plane, on_epsilon: Real) -> Result<(), WindingError> {
        let n = self.points.len();
        if n < 3 {
            return Err(WindingError::NotEnoughPoints(n));
        }

        for i in 0..n {
            let p1 = self.points[i];
            for j in 0..3 {
                if p1[j].abs() > BOGUS_RANGE {
                    return Err(WindingError::OutOfRange(p1));
                }
            }

            let d = plane.distance_to(&p1);
            if d.abs() > on_epsilon {
                return Err(WindingError::OffPlane(p1, d));
            }

            let p2 = self.points[(i + 1) % n];
            let dir = p2 - p1;
            if dir.norm() < DIST_EPSILON {
                return Err(WindingError::DegenerateEdge(p1));
            }

            // all other points must be behind the edge plane
            let edgenormal = plane.normal.cross(&dir).normalize();
            let edgedist = edgenormal.dot(&p1.coords) + on_epsilon;
            for (k, p) in self.points.iter().enumerate() {
                if k == i || k == (i + 1) % n {
                    continue;
                }
                if edgenormal.dot(&p.coords) > edgedist {
                    return Err(WindingError::NonConvex(p1));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square_z() -> Winding {
        Winding::from_points(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(4.0, 4.0, 0.0),
            Point3::new(0.0, 4.0, 0.0),
        ])
    }

    #[test]
    fn base_winding_lies_on_plane() {
        let plane = Plane::new(Vector3::new(1.0, 2.0, 3.0).normalize(), 17.0);
        let w = Winding::base_for_plane(&plane);
        assert_eq!(w.len(), 4);
        for p in &w.points {
            assert_relative_eq!(plane.distance_to(p), 0.0, epsilon = 1e-6);
        }
        // counter-clockwise as seen from the front side
        let derived = Plane::from_points(&w.points[0], &w.points[1], &w.points[2]).unwrap();
        assert_relative_eq!(derived.normal.dot(&plane.normal), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn clip_square() {
        let w = unit_square_z();
        let split = Plane::new(Vector3::x(), 2.0);
        let (front, back) = w.clip(&split, 0.0);
        let front = front.unwrap();
        let back = back.unwrap();
        assert_relative_eq!(front.area(), 8.0, epsilon = 1e-9);
        assert_relative_eq!(back.area(), 8.0, epsilon = 1e-9);
        for p in &front.points {
            assert!(p.x >= 2.0 - 1e-9);
        }
        for p in &back.points {
            assert!(p.x <= 2.0 + 1e-9);
        }
    }

    #[test]
    fn clip_all_one_side() {
        let w = unit_square_z();
        let split = Plane::new(Vector3::x(), -10.0);
        let (front, back) = w.clip(&split, 0.0);
        assert_eq!(front, Some(w.clone()));
        assert!(back.is_none());
    }

    #[test]
    fn tiny_and_area() {
        let w = unit_square_z();
        assert!(!w.is_tiny());
        assert_relative_eq!(w.area(), 16.0, epsilon = 1e-9);

        let sliver = Winding::from_points(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(4.0, 0.05, 0.0),
            Point3::new(0.0, 0.05, 0.0),
        ]);
        assert!(sliver.is_tiny());
    }

    #[test]
    fn check_catches_bad_windings() {
        let plane = Plane::new(Vector3::z(), 0.0);
        assert!(unit_square_z().check(&plane, 0.0001).is_ok());

        let two = Winding::from_points(vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)]);
        assert_eq!(two.check(&plane, 0.0001), Err(WindingError::NotEnoughPoints(2)));

        let off = Winding::from_points(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(4.0, 4.0, 1.0),
        ]);
        assert!(matches!(
            off.check(&plane, 0.0001),
            Err(WindingError::OffPlane(_, _))
        ));
    }
}
