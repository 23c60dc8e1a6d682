//! Recursive tree construction: splitter selection and brush partition.

use crate::brush::Brush;
use crate::compiler::Compiler;
use crate::contents::Contents;
use crate::float_types::{
    parry3d::bounding_volume::{Aabb, BoundingVolume},
    Real, NORMAL_EPSILON, SIDESPACE,
};
use crate::plane::{Plane, PlaneType, BACK, BOTH, FACING, FRONT};
use crate::split::TestCounts;
use crate::tree::{Node, Tree};
use nalgebra::Point3;
use std::sync::atomic::{AtomicUsize, Ordering::Relaxed};
use std::sync::{Arc, Mutex};

/// Per-compile statistics. Counters are relaxed atomics; the builder tasks
/// bump them from whatever worker they run on.
#[derive(Debug)]
pub struct BspStats<C: Contents> {
    /// Per-game tally of leaf contents.
    pub leafstats: Mutex<C::LeafStats>,
    /// Total number of interior nodes, including nonvisible ones.
    pub nodes: AtomicUsize,
    /// Nodes created by splitting on a side nobody can see.
    pub nonvis_nodes: AtomicUsize,
    /// Nodes created by the four-pass heuristic.
    pub heuristic_nodes: AtomicUsize,
    /// Nodes created by the volume-balancing midsplit.
    pub midsplit_nodes: AtomicUsize,
    /// Total number of leaves.
    pub leafs: AtomicUsize,
    /// Split halves rejected beyond the world extents.
    pub bogus_brushes: AtomicUsize,
    /// Brushes entirely removed by a split.
    pub brushes_removed: AtomicUsize,
    /// Brushes kept whole because only one split half survived.
    pub brushes_onesided: AtomicUsize,
    /// Tiny volumes dropped after clipping.
    pub tiny_volumes: AtomicUsize,
}

impl<C: Contents> Default for BspStats<C> {
    fn default() -> Self {
        Self {
            leafstats: Mutex::new(C::LeafStats::default()),
            nodes: AtomicUsize::new(0),
            nonvis_nodes: AtomicUsize::new(0),
            heuristic_nodes: AtomicUsize::new(0),
            midsplit_nodes: AtomicUsize::new(0),
            leafs: AtomicUsize::new(0),
            bogus_brushes: AtomicUsize::new(0),
            brushes_removed: AtomicUsize::new(0),
            brushes_onesided: AtomicUsize::new(0),
            tiny_volumes: AtomicUsize::new(0),
        }
    }
}

/// Knobs that stay fixed for the whole recursion.
pub(crate) struct BuildParams {
    pub total_brushes: usize,
    pub forced_quick: Option<bool>,
}

fn check_plane_against_parents(planenum: usize, ancestors: &[usize]) {
    for &p in ancestors {
        assert_ne!(p, planenum, "tried a plane already used by a parent node");
    }
}

fn check_plane_against_volume<C: Contents>(
    compiler: &Compiler,
    planenum: usize,
    node: &Node<C>,
    stats: &BspStats<C>,
) -> bool {
    let Some(volume) = &node.volume else {
        return false;
    };
    let (front, back) = compiler.split_brush(volume.clone(), planenum, stats);
    front.is_some() && back.is_some()
}

/// Split a bounding box by a plane. The returned front and back bounds each
/// completely contain the portion of the input box on that side, so for a
/// non-axial plane they overlap.
pub(crate) fn divide_bounds(in_bounds: &Aabb, split: &Plane) -> (Aabb, Aabb) {
    let mut front = *in_bounds;
    let mut back = *in_bounds;

    let ty = split.plane_type();
    if let PlaneType::X | PlaneType::Y | PlaneType::Z = ty {
        let axis = ty as usize;
        front.mins[axis] = split.dist;
        back.maxs[axis] = split.dist;
        return (front, back);
    }

    // make proper sloping cuts
    for a in 0..3 {
        if split.normal[a].abs() < NORMAL_EPSILON {
            continue; // parallel, no intersection on this axis
        }
        let b = (a + 1) % 3;
        let c = (a + 2) % 3;

        let mut split_mins = in_bounds.maxs[a];
        let mut split_maxs = in_bounds.mins[a];
        let mut corner = Point3::origin();
        for i in 0..2 {
            corner[b] = if i == 0 {
                in_bounds.mins[b]
            } else {
                in_bounds.maxs[b]
            };
            for j in 0..2 {
                corner[c] = if j == 0 {
                    in_bounds.mins[c]
                } else {
                    in_bounds.maxs[c]
                };

                corner[a] = in_bounds.mins[a];
                let dist1 = split.distance_to(&corner);
                corner[a] = in_bounds.maxs[a];
                let dist2 = split.distance_to(&corner);

                let mut mid = in_bounds.maxs[a] - in_bounds.mins[a];
                mid *= dist1 / (dist1 - dist2);
                mid += in_bounds.mins[a];

                split_mins = mid.min(split_mins).max(in_bounds.mins[a]);
                split_maxs = mid.max(split_maxs).min(in_bounds.maxs[a]);
            }
        }
        if split.normal[a] > 0.0 {
            front.mins[a] = split_mins;
            back.maxs[a] = split_maxs;
        } else {
            back.mins[a] = split_mins;
            front.maxs[a] = split_maxs;
        }
    }

    (front, back)
}

/// A good split leaves equal volumes on front and back; a bad one has all of
/// the volume on one side.
fn split_plane_metric(p: &Plane, bounds: &Aabb) -> Real {
    let (f, b) = divide_bounds(bounds, p);
    (f.volume() - b.volume()).abs()
}

/// Midsplit selection: ignore split counts entirely and pick the plane that
/// divides the node's bounds most evenly, preferring axial candidates.
fn choose_midplane_from_list<C: Contents>(
    compiler: &Compiler,
    brushes: &[Brush<C>],
    node: &Node<C>,
    stats: &BspStats<C>,
) -> Option<usize> {
    let mut bestaxialmetric = Real::MAX;
    let mut bestaxialplane = None;
    let mut bestanymetric = Real::MAX;
    let mut bestanyplane = None;

    for brush in brushes {
        for side in &brush.sides {
            if side.bevel {
                continue; // never use a bevel as a splitter
            }
            if side.onnode {
                continue; // already a node splitter
            }

            let positive_planenum = side.planenum & !1;
            let plane = compiler.planes.positive(side.planenum);

            if !check_plane_against_volume(compiler, positive_planenum, node, stats) {
                continue; // would produce a tiny volume
            }

            let metric = split_plane_metric(&plane, &node.bounds);

            if metric < bestanymetric {
                bestanymetric = metric;
                bestanyplane = Some(positive_planenum);
            }

            // check for axis aligned surfaces
            if plane.is_axial() && metric < bestaxialmetric {
                bestaxialmetric = metric;
                bestaxialplane = Some(positive_planenum);
            }
        }
    }

    // prefer the axial split
    bestaxialplane.or(bestanyplane)
}

/// Choose the plane to partition `brushes` with, caching each brush's side of
/// it. `None` means no valid plane remains and the node becomes a leaf.
pub(crate) fn select_split_plane<C: Contents>(
    compiler: &Compiler,
    brushes: &mut [Brush<C>],
    node: &mut Node<C>,
    ancestors: &[usize],
    params: &BuildParams,
    stats: &BspStats<C>,
) -> Option<usize> {
    // no brushes left to split, so we can't use any plane
    if brushes.is_empty() {
        return None;
    }

    let opts = &compiler.options;

    let mut quick = params.forced_quick;
    if quick.is_none() {
        // decide if we should switch to the midsplit method
        if opts.midsplitbrushfraction != 0.0 {
            // how much of the map are we partitioning?
            let fraction = brushes.len() as Real / params.total_brushes as Real;
            quick = Some(fraction > opts.midsplitbrushfraction);
        } else if opts.maxnodesize >= 64.0 {
            let maxnodesize = opts.maxnodesize - opts.epsilon;
            let extents = node.bounds.extents();
            quick = Some(
                extents.x > maxnodesize || extents.y > maxnodesize || extents.z > maxnodesize,
            );
        }
    }

    if quick == Some(true) {
        if let Some(midplane) = choose_midplane_from_list(compiler, brushes, node, stats) {
            stats.midsplit_nodes.fetch_add(1, Relaxed);

            for brush in brushes.iter_mut() {
                brush.side = compiler.test_brush_to_planenum(brush, midplane, None);
            }

            return Some(midplane);
        }
    }

    let mut bestvalue = -99999i64;
    let mut best: Option<(usize, usize)> = None;

    // the search order goes: visible-structural, visible-detail,
    // nonvisible-structural, nonvisible-detail. If any valid plane is
    // available in a pass, no further passes are tried.
    'passes: for pass in 0..4 {
        for bi in 0..brushes.len() {
            if ((pass & 1) == 1) != brushes[bi].contents.is_any_detail() {
                continue;
            }
            for si in 0..brushes[bi].sides.len() {
                let (planenum, skip, visible, hint) = {
                    let side = &brushes[bi].sides[si];
                    let skip = side.bevel // never use a bevel as a splitter
                        || side.winding.is_empty() // nothing visible, so it can't split
                        || side.onnode // already a node splitter
                        || side.tested // we already have metrics for this plane
                        || side.hintskip; // skip surfaces are never chosen
                    (side.planenum, skip, side.visible, side.hint)
                };
                if skip {
                    continue;
                }
                if visible != (pass < 2) {
                    continue; // only check visible faces on the first passes
                }

                let positive_planenum = planenum & !1;
                check_plane_against_parents(positive_planenum, ancestors);

                if !check_plane_against_volume(compiler, positive_planenum, node, stats) {
                    continue; // would produce a tiny volume
                }

                let mut front = 0i64;
                let mut back = 0i64;
                let mut facing = 0i64;
                let mut splits = 0i64;
                let mut epsilonbrush = 0i64;
                let mut hintsplit = false;

                for ti in 0..brushes.len() {
                    let mut counts = TestCounts::default();
                    let s = compiler.test_brush_to_planenum(
                        &brushes[ti],
                        positive_planenum,
                        Some(&mut counts),
                    );

                    splits += counts.numsplits as i64;
                    if counts.numsplits != 0 && (s & FACING) != 0 {
                        panic!("brush facing the split plane with nonzero splits");
                    }
                    hintsplit |= counts.hintsplit;
                    epsilonbrush += counts.epsilonbrush as i64;

                    brushes[ti].testside = s;
                    // if the brush shares this face, don't bother testing
                    // that plane as a splitter again
                    if s & FACING != 0 {
                        facing += 1;
                        for side in brushes[ti].sides.iter_mut() {
                            if (side.planenum & !1) == positive_planenum {
                                side.tested = true;
                            }
                        }
                    }
                    if s & FRONT != 0 {
                        front += 1;
                    }
                    if s & BACK != 0 {
                        back += 1;
                    }
                }

                // give a value estimate for using this plane
                let plane = compiler.planes.get(positive_planenum);
                let mut value = 5 * facing - 5 * splits - (front - back).abs();
                if plane.is_axial() {
                    value += 5; // axial is better
                }
                value -= epsilonbrush * 1000; // avoid!

                // never split a hint side except with another hint
                if hintsplit && !hint {
                    value = -9999999;
                }

                // save off the side test so we don't need to recalculate it
                // when we actually separate the brushes
                if value > bestvalue {
                    bestvalue = value;
                    best = Some((bi, si));
                    for brush in brushes.iter_mut() {
                        brush.side = brush.testside;
                    }
                }
            }
        }

        // if we found a good plane, don't bother trying any other passes
        if best.is_some() {
            if pass > 0 {
                node.detail_separator = true; // not needed for vis
            }
            break 'passes;
        }
    }

    // clear all the tested flags we set
    for brush in brushes.iter_mut() {
        for side in brush.sides.iter_mut() {
            side.tested = false;
        }
    }

    let (bi, si) = best?;
    let bestside = &brushes[bi].sides[si];

    if !bestside.visible {
        stats.nonvis_nodes.fetch_add(1, Relaxed);
    }
    stats.heuristic_nodes.fetch_add(1, Relaxed);

    Some(bestside.planenum & !1)
}

/// Partition `brushes` by the chosen plane using the sides cached by
/// [`select_split_plane`].
fn split_brush_list<C: Contents>(
    compiler: &Compiler,
    brushes: Vec<Brush<C>>,
    planenum: usize,
    stats: &BspStats<C>,
) -> (Vec<Brush<C>>, Vec<Brush<C>>) {
    let mut front_list = Vec::new();
    let mut back_list = Vec::new();

    for mut brush in brushes {
        let sides = brush.side;

        if sides == BOTH {
            // split into two brushes
            let (front, back) = compiler.split_brush(brush, planenum, stats);
            if let Some(front) = front {
                front_list.push(front);
            }
            if let Some(back) = back {
                back_list.push(back);
            }
            continue;
        }

        // if the planenum is actually a part of the brush, flag the side as
        // used so it won't be tried as a splitter again
        if sides & FACING != 0 {
            for side in brush.sides.iter_mut() {
                if (side.planenum & !1) == planenum {
                    side.onnode = true;
                }
            }
        }

        if sides & FRONT != 0 {
            front_list.push(brush);
            continue;
        }
        if sides & BACK != 0 {
            back_list.push(brush);
        }
    }

    (front_list, back_list)
}

/// Turn `node` into a leaf holding the combined contents of `brushes`.
pub(crate) fn leaf_node<C: Contents>(
    node: &mut Node<C>,
    brushes: Vec<Brush<C>>,
    stats: &BspStats<C>,
) {
    let mut contents = C::empty();
    for brush in &brushes {
        contents = contents.combine(&brush.contents);
    }
    for brush in brushes {
        let original = match brush.original.clone() {
            Some(o) => o,
            None => Arc::new(brush),
        };
        node.original_brushes.push(original);
    }

    contents.count_in(&mut stats.leafstats.lock().unwrap());
    node.contents = Some(contents);
    node.volume = None;
}

/// Prepare an interior node: record the plane, partition the brushes, and
/// hand each child its bounds and sub-volume. Returns the children and their
/// brush lists for the caller to recurse into.
#[allow(clippy::type_complexity)]
pub(crate) fn split_node<C: Contents>(
    compiler: &Compiler,
    node: &mut Node<C>,
    brushes: Vec<Brush<C>>,
    bestplane: usize,
    stats: &BspStats<C>,
) -> ([Box<Node<C>>; 2], [Vec<Brush<C>>; 2]) {
    stats.nodes.fetch_add(1, Relaxed);
    // make sure this was a positive-facing split
    assert_eq!(bestplane & 1, 0, "split plane must be positive-facing");

    node.planenum = Some(bestplane);
    let plane = compiler.planes.get(bestplane);

    let (front_brushes, back_brushes) = split_brush_list(compiler, brushes, bestplane, stats);

    // allocate children before recursing
    let mut front_node = Box::new(Node::new(node.bounds));
    let mut back_node = Box::new(Node::new(node.bounds));

    for i in 0..3 {
        if plane.normal[i] == 1.0 {
            front_node.bounds.mins[i] = plane.dist;
            back_node.bounds.maxs[i] = plane.dist;
            break;
        }
    }

    // to save time/memory we can destroy the node's volume at this point
    let (front_volume, back_volume) = match node.volume.take() {
        Some(volume) => compiler.split_brush(volume, bestplane, stats),
        None => (None, None),
    };
    front_node.volume = front_volume;
    back_node.volume = back_volume;

    ([front_node, back_node], [front_brushes, back_brushes])
}

#[cfg(not(feature = "parallel"))]
pub(crate) fn build_tree_r<C: Contents>(
    compiler: &Compiler,
    node: &mut Node<C>,
    brushes: Vec<Brush<C>>,
    ancestors: &[usize],
    params: &BuildParams,
    stats: &BspStats<C>,
) {
    let mut brushes = brushes;

    // find the best plane to use as a splitter
    let Some(bestplane) =
        select_split_plane(compiler, &mut brushes, node, ancestors, params, stats)
    else {
        // this is a leaf node
        stats.leafs.fetch_add(1, Relaxed);
        leaf_node(node, brushes, stats);
        return;
    };

    let ([mut front_node, mut back_node], [front_brushes, back_brushes]) =
        split_node(compiler, node, brushes, bestplane, stats);

    let mut child_ancestors = ancestors.to_vec();
    child_ancestors.push(bestplane);

    build_tree_r(
        compiler,
        &mut front_node,
        front_brushes,
        &child_ancestors,
        params,
        stats,
    );
    build_tree_r(
        compiler,
        &mut back_node,
        back_brushes,
        &child_ancestors,
        params,
        stats,
    );

    node.children = Some([front_node, back_node]);
}

#[cfg(feature = "parallel")]
use crate::builder_parallel::build_tree_r;

fn log_bsp_stats<C: Contents>(stats: &BspStats<C>) {
    let nodes = stats.nodes.load(Relaxed);
    let nonvis = stats.nonvis_nodes.load(Relaxed);
    log::info!("{:8} visible nodes", nodes - nonvis);
    if nonvis != 0 {
        log::info!("{:8} nonvis nodes", nonvis);
    }
    let heuristic = stats.heuristic_nodes.load(Relaxed);
    if heuristic != 0 {
        log::info!("{:8} expensive split nodes", heuristic);
    }
    let midsplit = stats.midsplit_nodes.load(Relaxed);
    if midsplit != 0 {
        log::info!("{:8} midsplit nodes", midsplit);
    }
    log::info!("{:8} leafs", stats.leafs.load(Relaxed));
    let bogus = stats.bogus_brushes.load(Relaxed);
    if bogus != 0 {
        log::info!("{:8} bogus brushes", bogus);
    }
    let removed = stats.brushes_removed.load(Relaxed);
    if removed != 0 {
        log::info!("{:8} brushes removed from a split", removed);
    }
    let onesided = stats.brushes_onesided.load(Relaxed);
    if onesided != 0 {
        log::info!("{:8} brushes split only on one side", onesided);
    }
    let tiny = stats.tiny_volumes.load(Relaxed);
    if tiny != 0 {
        log::info!("{:8} tiny volumes removed after splits", tiny);
    }

    C::log_stats(&stats.leafstats.lock().unwrap(), "leafs");
}

impl Compiler {
    /// Build a BSP tree over `brushlist`, which should already be a disjoint
    /// cover (see [`Compiler::chop_brushes`]). Returns the finished tree and
    /// the compile statistics.
    ///
    /// `forced_quick` pins splitter selection to midsplit (`Some(true)`) or
    /// the full heuristic (`Some(false)`); `None` lets the configured
    /// thresholds decide per node.
    pub fn brush_bsp<C: Contents>(
        &self,
        brushlist: Vec<Brush<C>>,
        entity_bounds: Aabb,
        forced_quick: Option<bool>,
    ) -> (Tree<C>, BspStats<C>) {
        let stats = BspStats::<C>::default();

        if brushlist.is_empty() {
            // An entity can be constructed with no visible brushes at all,
            // but the engine still needs a simple empty collision hull.
            let mut headnode = Box::new(Node::new(entity_bounds));
            // The choice of plane is mostly unimportant, but having it at
            // (0, 0, 0) affects the node bounds calculation.
            headnode.planenum = Some(0);
            let children = [(); 2].map(|_| {
                let mut leaf = Box::new(Node::new(entity_bounds));
                leaf.contents = Some(C::empty());
                leaf
            });
            headnode.children = Some(children);

            return (
                Tree {
                    bounds: entity_bounds,
                    headnode,
                },
                stats,
            );
        }

        let mut c_faces = 0usize;
        let mut c_nonvisfaces = 0usize;
        let mut bounds = Aabb::new_invalid();
        for brush in &brushlist {
            for side in &brush.sides {
                if side.bevel {
                    continue;
                }
                if side.winding.is_empty() {
                    continue;
                }
                if side.onnode {
                    continue;
                }
                if side.visible {
                    c_faces += 1;
                } else {
                    c_nonvisfaces += 1;
                }
            }
            bounds.merge(&brush.bounds);
        }

        log::info!("{:8} brushes", brushlist.len());
        log::info!("{:8} visible faces", c_faces);
        log::info!("{:8} nonvisible faces", c_nonvisfaces);

        let grown = bounds.loosened(SIDESPACE);
        let mut headnode = Box::new(Node::new(grown));
        headnode.volume = Some(self.brush_from_bounds(&grown, C::empty()));

        let params = BuildParams {
            total_brushes: brushlist.len(),
            forced_quick,
        };
        build_tree_r(self, &mut headnode, brushlist, &[], &params, &stats);

        log_bsp_stats::<C>(&stats);

        (Tree { bounds, headnode }, stats)
    }
}
