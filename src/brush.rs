//! Convex brushes and their sides.

use crate::compiler::Compiler;
use crate::contents::Contents;
use crate::float_types::{parry3d::bounding_volume::Aabb, Real};
use crate::plane::{Plane, BACK, FRONT};
use crate::plane_table::PlaneTable;
use crate::winding::Winding;
use nalgebra::Vector3;
use std::sync::Arc;

/// One face of a brush: a plane reference, the winding of that face clipped
/// by the brush's other planes, and the compile-state flags the splitter
/// selection machinery tracks per side.
#[derive(Debug, Clone)]
pub struct Side {
    /// Index into the compile's plane registry.
    pub planenum: usize,
    /// The face polygon; empty for bevel sides.
    pub winding: Winding,
    /// Opaque reference into the external texinfo table; `None` marks the
    /// synthesised skip faces that splits add.
    pub texinfo: Option<u32>,
    pub visible: bool,
    /// Bevels only exist for collision expansion and are never splitters.
    pub bevel: bool,
    /// Already used as a node splitter somewhere above.
    pub onnode: bool,
    /// Metrics for this side's plane were already taken this selection round.
    pub tested: bool,
    pub hint: bool,
    pub hintskip: bool,
}

impl Side {
    pub fn new(planenum: usize) -> Self {
        Self {
            planenum,
            winding: Winding::new(),
            texinfo: None,
            visible: true,
            bevel: false,
            onnode: false,
            tested: false,
            hint: false,
            hintskip: false,
        }
    }
}

/// A convex polyhedron: the intersection of its sides' back half-spaces.
#[derive(Debug, Clone)]
pub struct Brush<C: Contents> {
    pub sides: Vec<Side>,
    /// Tight bounds of the side windings.
    pub bounds: Aabb,
    pub contents: C,
    /// Opaque reference to the map brush this one descends from.
    pub mapbrush: usize,
    /// The pre-split/pre-chop ancestor, shared by all fragments of it.
    pub original: Option<Arc<Brush<C>>>,
    /// Plane-side classification cached by splitter selection.
    pub(crate) side: u8,
    pub(crate) testside: u8,
}

impl<C: Contents> Brush<C> {
    pub fn new(contents: C) -> Self {
        Self {
            sides: Vec::new(),
            bounds: Aabb::new_invalid(),
            contents,
            mapbrush: 0,
            original: None,
            side: 0,
            testside: 0,
        }
    }

    /// Recompute `bounds` from the side windings. Returns false when the
    /// brush has no winding points at all.
    pub fn update_bounds(&mut self) -> bool {
        let mut bounds = Aabb::new_invalid();
        let mut any = false;
        for side in &self.sides {
            for p in &side.winding.points {
                bounds.take_point(*p);
                any = true;
            }
        }
        self.bounds = bounds;
        any
    }

    /// Volume of the brush: tetrahedrons from an arbitrary corner to every
    /// face.
    pub fn volume(&self, planes: &PlaneTable) -> Real {
        // grab the first valid point as the corner
        let Some(corner) = self
            .sides
            .iter()
            .find_map(|s| s.winding.points.first().copied())
        else {
            return 0.0;
        };

        let mut volume = 0.0;
        for side in &self.sides {
            if side.winding.is_empty() {
                continue;
            }
            let plane = planes.get(side.planenum);
            let d = -plane.distance_to(&corner);
            volume += d * side.winding.area();
        }
        volume / 3.0
    }

    /// Which side of `split` holds the farthest vertex.
    pub fn mostly_on_side(&self, split: &Plane) -> u8 {
        let mut max = 0.0;
        let mut side = FRONT;
        for face in &self.sides {
            for p in &face.winding.points {
                let d = split.distance_to(p);
                if d > max {
                    max = d;
                    side = FRONT;
                }
                if -d > max {
                    max = -d;
                    side = BACK;
                }
            }
        }
        side
    }
}

impl Compiler {
    /// Create a new axial brush filling `bounds`.
    pub fn brush_from_bounds<C: Contents>(&self, bounds: &Aabb, contents: C) -> Brush<C> {
        let mut brush = Brush::new(contents);
        brush.sides.reserve(6);

        for i in 0..3 {
            let mut normal = Vector3::zeros();
            normal[i] = 1.0;
            let plane = Plane::new(normal, bounds.maxs[i]);
            brush.sides.push(Side::new(self.planes.add_or_find(&plane)));
        }
        for i in 0..3 {
            let mut normal = Vector3::zeros();
            normal[i] = -1.0;
            let plane = Plane::new(normal, -bounds.mins[i]);
            brush.sides.push(Side::new(self.planes.add_or_find(&plane)));
        }

        self.create_brush_windings(&mut brush);
        brush
    }

    /// Rebuild every side winding: the base polygon for the side's plane,
    /// trimmed back by all the other sides.
    pub fn create_brush_windings<C: Contents>(&self, brush: &mut Brush<C>) {
        for i in 0..brush.sides.len() {
            let plane = self.planes.get(brush.sides[i].planenum);
            let mut winding = Some(Winding::base_for_plane(&plane));
            for j in 0..brush.sides.len() {
                if i == j {
                    continue;
                }
                let Some(w) = winding else { break };
                let clip = self.planes.get(brush.sides[j].planenum);
                winding = w.clip_back(&clip, self.options.on_epsilon);
            }
            brush.sides[i].winding = winding.unwrap_or_default();
        }
        brush.update_bounds();
    }
}
