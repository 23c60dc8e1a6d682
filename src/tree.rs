//! BSP tree structure.

use crate::brush::Brush;
use crate::contents::Contents;
use crate::float_types::parry3d::bounding_volume::Aabb;
use std::sync::Arc;

/// A node of the tree: either an interior split or a leaf.
///
/// During construction a node carries the convex sub-volume of the scene
/// enclosed by its ancestors' half-spaces; the builder hands the split halves
/// of it to the children and clears it, so a finished tree stores no volumes.
#[derive(Debug)]
pub struct Node<C: Contents> {
    /// Bounding volume, not just the points inside.
    pub bounds: Aabb,
    /// The splitting plane; always positive-facing, interior nodes only.
    pub planenum: Option<usize>,
    /// Front and back subtrees, interior nodes only.
    pub children: Option<[Box<Node<C>>; 2]>,
    /// The convex sub-volume while this subtree is being built.
    pub volume: Option<Brush<C>>,
    /// Combined contents of the leaf's brushes, leaves only.
    pub contents: Option<C>,
    /// The undivided brushes this leaf descends from, leaves only.
    pub original_brushes: Vec<Arc<Brush<C>>>,
    /// The split separating this node's children came from a detail brush
    /// and does not contribute to vis portals.
    pub detail_separator: bool,
}

impl<C: Contents> Node<C> {
    pub fn new(bounds: Aabb) -> Self {
        Self {
            bounds,
            planenum: None,
            children: None,
            volume: None,
            contents: None,
            original_brushes: Vec::new(),
            detail_separator: false,
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// A finished BSP tree. Nodes own their subtrees; leaf brushes are owned by
/// their leaves.
#[derive(Debug)]
pub struct Tree<C: Contents> {
    pub headnode: Box<Node<C>>,
    /// Tight bounds of the input brushes (not the inflated head volume).
    pub bounds: Aabb,
}

impl<C: Contents> Tree<C> {
    /// All leaf nodes, collected iteratively to avoid deep recursion.
    pub fn leaf_nodes(&self) -> Vec<&Node<C>> {
        let mut result = Vec::new();
        let mut stack = vec![self.headnode.as_ref()];

        while let Some(node) = stack.pop() {
            match &node.children {
                Some(children) => stack.extend(children.iter().map(|c| c.as_ref())),
                None => result.push(node),
            }
        }
        result
    }
}
