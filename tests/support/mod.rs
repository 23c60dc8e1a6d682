//! Test support library
//! Provides a minimal target game plus brush and tree helpers for tests.

use brushbsp::contents::Contents;
use brushbsp::float_types::{parry3d::bounding_volume::Aabb, Real};
use brushbsp::{Brush, Compiler, Node, Tree};
use nalgebra::Point3;

pub const CONTENTS_SOLID: u32 = 1;
pub const CONTENTS_DETAIL: u32 = 2;

/// A tiny stand-in for a real game's content flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameContents {
    pub bits: u32,
}

#[derive(Debug, Default)]
pub struct LeafTally {
    pub solid: usize,
    pub empty: usize,
}

impl Contents for GameContents {
    type LeafStats = LeafTally;

    fn empty() -> Self {
        Self { bits: 0 }
    }

    fn combine(&self, other: &Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    fn is_any_detail(&self) -> bool {
        self.bits & CONTENTS_DETAIL != 0
    }

    fn is_solid(&self) -> bool {
        self.bits & CONTENTS_SOLID != 0
    }

    fn count_in(&self, stats: &mut LeafTally) {
        if self.is_solid() {
            stats.solid += 1;
        } else {
            stats.empty += 1;
        }
    }

    fn log_stats(_stats: &LeafTally, _label: &str) {}
}

pub fn solid() -> GameContents {
    GameContents {
        bits: CONTENTS_SOLID,
    }
}

pub fn detail_solid() -> GameContents {
    GameContents {
        bits: CONTENTS_SOLID | CONTENTS_DETAIL,
    }
}

/// An axial brush spanning `mins..maxs`.
pub fn cube(
    compiler: &Compiler,
    mins: [Real; 3],
    maxs: [Real; 3],
    contents: GameContents,
    mapbrush: usize,
) -> Brush<GameContents> {
    let bounds = Aabb::new(Point3::from(mins), Point3::from(maxs));
    let mut brush = compiler.brush_from_bounds(&bounds, contents);
    brush.mapbrush = mapbrush;
    brush
}

pub fn point_in_brush(
    compiler: &Compiler,
    brush: &Brush<GameContents>,
    p: &Point3<Real>,
    eps: Real,
) -> bool {
    brush
        .sides
        .iter()
        .all(|s| compiler.planes.get(s.planenum).distance_to(p) <= eps)
}

pub fn point_in_any(
    compiler: &Compiler,
    brushes: &[Brush<GameContents>],
    p: &Point3<Real>,
    eps: Real,
) -> bool {
    brushes.iter().any(|b| point_in_brush(compiler, b, p, eps))
}

/// Every interior node of the finished tree.
pub fn interior_nodes(tree: &Tree<GameContents>) -> Vec<&Node<GameContents>> {
    let mut result = Vec::new();
    let mut stack = vec![tree.headnode.as_ref()];
    while let Some(node) = stack.pop() {
        if let Some(children) = &node.children {
            result.push(node);
            stack.extend(children.iter().map(|c| c.as_ref()));
        }
    }
    result
}

/// Structural invariants every finished tree satisfies: interior nodes carry
/// a plane and two children, leaves carry contents, nobody keeps a volume,
/// and leaf contents equal the fold of their original brushes' contents.
pub fn check_tree_shape(tree: &Tree<GameContents>) {
    let mut stack = vec![tree.headnode.as_ref()];
    while let Some(node) = stack.pop() {
        assert!(node.volume.is_none());
        match &node.children {
            Some(children) => {
                assert!(!node.is_leaf());
                assert!(node.planenum.is_some());
                stack.extend(children.iter().map(|c| c.as_ref()));
            }
            None => {
                assert!(node.is_leaf());
                let contents = node.contents.expect("leaf without contents");
                let folded = node
                    .original_brushes
                    .iter()
                    .fold(GameContents::empty(), |acc, b| acc.combine(&b.contents));
                assert_eq!(contents, folded);
            }
        }
    }
}

/// No plane may repeat along any root path.
pub fn check_ancestor_planes(tree: &Tree<GameContents>) {
    fn walk(node: &Node<GameContents>, path: &mut Vec<usize>) {
        if let Some(children) = &node.children {
            let planenum = node.planenum.unwrap() & !1;
            assert!(
                !path.contains(&planenum),
                "plane {planenum} repeats along a root path"
            );
            path.push(planenum);
            for child in children.iter() {
                walk(child, path);
            }
            path.pop();
        }
    }
    walk(&tree.headnode, &mut Vec::new());
}
