//! Parallel twin of the tree recursion: the two subtree builds are sibling
//! tasks on a work-stealing pool, and the parent joins both before returning.
//!
//! Brushes are never shared between tasks; each list moves into the closure
//! that owns its subtree, so no locking is needed on the hot path.

use crate::brush::Brush;
use crate::builder::{leaf_node, select_split_plane, split_node, BspStats, BuildParams};
use crate::compiler::Compiler;
use crate::contents::Contents;
use crate::tree::Node;
use std::sync::atomic::Ordering::Relaxed;

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

    // recursively process children
    rayon::join(
        || {
            build_tree_r(
                compiler,
                &mut front_node,
                front_brushes,
                &child_ancestors,
                params,
                stats,
            )
        },
        || {
            build_tree_r(
                compiler,
                &mut back_node,
                back_brushes,
                &child_ancestors,
                params,
                stats,
            )
        },
    );

    node.children = Some([front_node, back_node]);
}
