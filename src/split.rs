//! Splitting a brush by a plane, and classifying a brush against a plane.

use crate::brush::{Brush, Side};
use crate::builder::BspStats;
use crate::compiler::Compiler;
use crate::contents::Contents;
use crate::float_types::Real;
use crate::plane::{box_on_plane_side, BACK, BOTH, FACING, FRONT};
use crate::winding::Winding;
use std::sync::Arc;
use std::sync::atomic::Ordering::Relaxed;

/// Split metrics for one brush against one candidate plane.
#[derive(Debug, Default)]
pub struct TestCounts {
    /// Visible faces that would be cut in two.
    pub numsplits: i32,
    /// A hint face would be cut.
    pub hintsplit: bool,
    /// The brush only just grazes the plane.
    pub epsilonbrush: i32,
}

impl Compiler {
    /// Split `brush` by plane `planenum`, returning the (front, back) halves.
    /// A brush that doesn't really cross the plane comes back whole on the
    /// side it occupies.
    pub fn split_brush<C: Contents>(
        &self,
        brush: Brush<C>,
        planenum: usize,
        stats: &BspStats<C>,
    ) -> (Option<Brush<C>>, Option<Brush<C>>) {
        let split = self.planes.get(planenum);

        // check all points
        let mut d_front: Real = 0.0;
        let mut d_back: Real = 0.0;
        for face in &brush.sides {
            for p in &face.winding.points {
                let d = split.distance_to(p);
                if d > 0.0 && d > d_front {
                    d_front = d;
                }
                if d < 0.0 && d < d_back {
                    d_back = d;
                }
            }
        }
        if d_front < 0.1 {
            // only on back
            return (None, Some(brush));
        }
        if d_back > -0.1 {
            // only on front
            return (Some(brush), None);
        }

        // create a new winding from the split plane
        let mut w = Some(Winding::base_for_plane(&split));
        for face in &brush.sides {
            let Some(cur) = w else { break };
            w = cur.clip_back(&self.planes.get(face.planenum), 0.0);
        }

        let midwinding = match w {
            Some(w) if !w.is_tiny() => w,
            _ => {
                // the brush isn't really split
                let side = brush.mostly_on_side(&split);
                return if side == FRONT {
                    (Some(brush), None)
                } else {
                    (None, Some(brush))
                };
            }
        };

        if midwinding.is_huge(self.options.worldextent) {
            log::warn!("huge winding");
        }

        // split it for real: start with two empty brushes and distribute the
        // clipped side windings between them
        let mut halves = [(); 2].map(|_| {
            let mut half = Brush::new(brush.contents.clone());
            half.mapbrush = brush.mapbrush;
            half.sides.reserve(brush.sides.len() + 1);
            half
        });

        for face in &brush.sides {
            let (front_w, back_w) = face.winding.clip(&split, 0.0);
            for (half, clipped) in halves.iter_mut().zip([front_w, back_w]) {
                let Some(cw) = clipped else { continue };
                let mut copy = face.clone();
                copy.winding = cw;
                half.sides.push(copy);
            }
        }

        // see if we have valid polygons on both sides
        let mut keep = [true, true];
        for (i, half) in halves.iter_mut().enumerate() {
            let mut bogus = false;
            if !half.update_bounds() {
                stats.bogus_brushes.fetch_add(1, Relaxed);
                bogus = true;
            } else {
                for j in 0..3 {
                    if half.bounds.mins[j] < -self.options.worldextent
                        || half.bounds.maxs[j] > self.options.worldextent
                    {
                        stats.bogus_brushes.fetch_add(1, Relaxed);
                        bogus = true;
                        break;
                    }
                }
            }
            if half.sides.len() < 3 || bogus {
                keep[i] = false;
            }
        }

        match keep {
            [false, false] => {
                stats.brushes_removed.fetch_add(1, Relaxed);
                return (None, None);
            }
            [true, false] => {
                stats.brushes_onesided.fetch_add(1, Relaxed);
                return (Some(brush), None);
            }
            [false, true] => {
                stats.brushes_onesided.fetch_add(1, Relaxed);
                return (None, Some(brush));
            }
            [true, true] => {}
        }

        // add the midwinding to both sides; the face on the front half points
        // back into the back half
        for (i, half) in halves.iter_mut().enumerate() {
            let mut cs = Side::new(planenum ^ i ^ 1);
            cs.texinfo = None;
            cs.visible = false;
            cs.tested = false;
            cs.onnode = true;
            cs.winding = if i == 0 {
                midwinding.flipped()
            } else {
                midwinding.clone()
            };
            half.sides.push(cs);
            half.update_bounds();
        }

        let ancestor = match brush.original.clone() {
            Some(a) => a,
            None => Arc::new(brush),
        };
        let [front, back] = halves.map(|mut half| {
            half.original = Some(ancestor.clone());
            if half.volume(&self.planes) < self.options.microvolume {
                stats.tiny_volumes.fetch_add(1, Relaxed);
                None
            } else {
                Some(half)
            }
        });

        (front, back)
    }

    /// Classify `brush` against plane `planenum`: [`FRONT`], [`BACK`] or
    /// [`BOTH`], with [`FACING`] OR'ed in when one of the brush's sides lies
    /// on the plane. When `counts` is given and the brush spans the plane,
    /// fill in the split metrics for the splitter heuristic.
    pub fn test_brush_to_planenum<C: Contents>(
        &self,
        brush: &Brush<C>,
        planenum: usize,
        mut counts: Option<&mut TestCounts>,
    ) -> u8 {
        if let Some(c) = counts.as_deref_mut() {
            *c = TestCounts::default();
        }

        // if the brush actually uses the planenum,
        // we can tell the side for sure
        for side in &brush.sides {
            if side.planenum == planenum {
                return BACK | FACING;
            }
            if side.planenum == (planenum ^ 1) {
                return FRONT | FACING;
            }
        }

        let plane = self.planes.get(planenum);
        let s = box_on_plane_side(&brush.bounds, &plane);
        if s != BOTH {
            return s;
        }

        if let Some(c) = counts {
            // if both sides, count the visible faces split
            let mut d_front: Real = 0.0;
            let mut d_back: Real = 0.0;

            for side in &brush.sides {
                if side.onnode {
                    continue; // on node, don't worry about splits
                }
                if !side.visible {
                    continue; // we don't care about non-visible
                }
                if side.winding.is_empty() {
                    continue;
                }
                let mut front = false;
                let mut back = false;
                for p in &side.winding.points {
                    let d = plane.distance_to(p);
                    if d > d_front {
                        d_front = d;
                    }
                    if d < d_back {
                        d_back = d;
                    }
                    if d > 0.1 {
                        front = true;
                    }
                    if d < -0.1 {
                        back = true;
                    }
                }
                if front && back && !side.hintskip {
                    c.numsplits += 1;
                    if side.hint {
                        c.hintsplit = true;
                    }
                }
            }

            if (d_front > 0.0 && d_front < 1.0) || (d_back < 0.0 && d_back > -1.0) {
                c.epsilonbrush += 1;
            }
        }

        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::float_types::parry3d::bounding_volume::Aabb;
    use crate::plane::Plane;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    #[derive(Debug, Clone, PartialEq)]
    struct Solid;

    impl Contents for Solid {
        type LeafStats = ();
        fn empty() -> Self {
            Solid
        }
        fn combine(&self, _other: &Self) -> Self {
            Solid
        }
        fn is_any_detail(&self) -> bool {
            false
        }
        fn is_solid(&self) -> bool {
            true
        }
        fn count_in(&self, _stats: &mut ()) {}
        fn log_stats(_stats: &(), _label: &str) {}
    }

    fn cube(compiler: &Compiler, mins: Real, maxs: Real) -> Brush<Solid> {
        compiler.brush_from_bounds(
            &Aabb::new(
                Point3::new(mins, mins, mins),
                Point3::new(maxs, maxs, maxs),
            ),
            Solid,
        )
    }

    #[test]
    fn split_through_the_middle() {
        let compiler = Compiler::default();
        let brush = cube(&compiler, 0.0, 64.0);
        let planenum = compiler
            .planes
            .add_or_find(&Plane::new(Vector3::x(), 16.0));
        let stats = BspStats::<Solid>::default();

        let (front, back) = compiler.split_brush(brush, planenum, &stats);
        let front = front.unwrap();
        let back = back.unwrap();

        assert_relative_eq!(front.volume(&compiler.planes), 48.0 * 64.0 * 64.0);
        assert_relative_eq!(back.volume(&compiler.planes), 16.0 * 64.0 * 64.0);
        assert_eq!(front.sides.len(), 7);
        assert_eq!(back.sides.len(), 7);

        // both halves carry the dividing face, marked used and invisible
        let front_div = front.sides.last().unwrap();
        let back_div = back.sides.last().unwrap();
        assert_eq!(front_div.planenum, planenum ^ 1);
        assert_eq!(back_div.planenum, planenum);
        assert!(front_div.onnode && back_div.onnode);
        assert!(!front_div.visible && !back_div.visible);

        // fragments share their ancestor
        assert!(Arc::ptr_eq(
            front.original.as_ref().unwrap(),
            back.original.as_ref().unwrap()
        ));
    }

    #[test]
    fn split_misses_return_the_brush_unchanged() {
        let compiler = Compiler::default();
        let brush = cube(&compiler, 0.0, 64.0);
        let stats = BspStats::<Solid>::default();

        let behind = compiler
            .planes
            .add_or_find(&Plane::new(Vector3::x(), 128.0));
        let (front, back) = compiler.split_brush(brush, behind, &stats);
        assert!(front.is_none());
        let brush = back.unwrap();
        assert!(brush.original.is_none());

        let ahead = compiler
            .planes
            .add_or_find(&Plane::new(Vector3::x(), -128.0));
        let (front, back) = compiler.split_brush(brush, ahead, &stats);
        assert!(back.is_none());
        assert!(front.is_some());
    }

    #[test]
    fn grazing_split_slides_by() {
        let compiler = Compiler::default();
        let brush = cube(&compiler, 0.0, 64.0);
        let stats = BspStats::<Solid>::default();

        // pokes 0.05 past the face: under the 0.1 slide-by threshold
        let planenum = compiler
            .planes
            .add_or_find(&Plane::new(Vector3::x(), 64.05));
        let (front, back) = compiler.split_brush(brush, planenum, &stats);
        assert!(front.is_none());
        assert_eq!(back.unwrap().sides.len(), 6);
    }

    #[test]
    fn one_sided_split_returns_the_original() {
        let compiler = Compiler::new(crate::options::Options {
            worldextent: 100.0,
            ..Default::default()
        });
        let brush = compiler.brush_from_bounds(
            &Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(150.0, 64.0, 64.0)),
            Solid,
        );
        let stats = BspStats::<Solid>::default();

        // the front half would reach past the world extent and gets dropped;
        // the surviving side receives the whole original brush, not the
        // trimmed half
        let planenum = compiler
            .planes
            .add_or_find(&Plane::new(Vector3::x(), 32.0));
        let (front, back) = compiler.split_brush(brush, planenum, &stats);
        assert!(front.is_none());
        let back = back.unwrap();
        assert_eq!(back.bounds.maxs.x, 150.0);
        assert_eq!(back.sides.len(), 6);
        assert_eq!(
            stats.brushes_onesided.load(std::sync::atomic::Ordering::Relaxed),
            1
        );
    }

    #[test]
    fn classification_uses_facing_sides() {
        let compiler = Compiler::default();
        let brush = cube(&compiler, 0.0, 64.0);

        // the cube's own +x face plane
        let facenum = compiler
            .planes
            .add_or_find(&Plane::new(Vector3::x(), 64.0));
        assert_eq!(
            compiler.test_brush_to_planenum(&brush, facenum, None),
            BACK | FACING
        );
        assert_eq!(
            compiler.test_brush_to_planenum(&brush, facenum ^ 1, None),
            FRONT | FACING
        );

        let mut counts = TestCounts::default();
        let through = compiler
            .planes
            .add_or_find(&Plane::new(Vector3::y(), 32.0));
        let s = compiler.test_brush_to_planenum(&brush, through, Some(&mut counts));
        assert_eq!(s, BOTH);
        // four visible side windings cross y=32
        assert_eq!(counts.numsplits, 4);
        assert_eq!(counts.epsilonbrush, 0);

        let grazing = compiler
            .planes
            .add_or_find(&Plane::new(Vector3::y(), 63.5));
        let mut counts = TestCounts::default();
        let s = compiler.test_brush_to_planenum(&brush, grazing, Some(&mut counts));
        assert_eq!(s, BOTH);
        assert_eq!(counts.epsilonbrush, 1);
    }
}
