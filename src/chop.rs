//! Chopping an intersecting brush set into a disjoint cover.
//!
//! Pairwise subtract-and-retry: higher-priority brushes bite overlapping
//! volume out of lower-priority ones, swallowed brushes disappear, and any
//! bite that would fragment both victims is skipped to avoid brush-count
//! explosion.

use crate::brush::Brush;
use crate::builder::BspStats;
use crate::compiler::Compiler;
use crate::contents::Contents;

/// True if `b1` is allowed to bite `b2`.
pub fn brush_ge<C: Contents>(b1: &Brush<C>, b2: &Brush<C>) -> bool {
    // detail brushes never bite structural brushes
    if b1.contents.is_any_detail() && !b2.contents.is_any_detail() {
        return false;
    }
    b1.contents.is_solid()
}

/// True if the two brushes definitely do not intersect. There are false
/// negatives for some non-axial combinations.
pub fn brushes_disjoint<C: Contents>(a: &Brush<C>, b: &Brush<C>) -> bool {
    // bounding boxes don't overlap
    for i in 0..3 {
        if a.bounds.mins[i] >= b.bounds.maxs[i] || b.bounds.mins[i] >= a.bounds.maxs[i] {
            return true;
        }
    }

    // check for opposing planes
    for a_side in &a.sides {
        for b_side in &b.sides {
            if a_side.planenum == (b_side.planenum ^ 1) {
                // opposite planes, so not touching
                return true;
            }
        }
    }

    false // might intersect
}

impl Compiler {
    /// The brushes that remain of `a` after `b` is subtracted from it.
    ///
    /// `None` means the two never really intersected and `a` stands as it
    /// is; an empty list means `a` was entirely inside `b`.
    pub fn subtract_brush<C: Contents>(
        &self,
        a: &Brush<C>,
        b: &Brush<C>,
        stats: &BspStats<C>,
    ) -> Option<Vec<Brush<C>>> {
        let mut out = Vec::new();
        let mut remainder = a.clone();

        for side in &b.sides {
            let (front, back) = self.split_brush(remainder, side.planenum, stats);

            if let Some(front) = front {
                // the piece outside this face of b survives
                out.push(front);
            }

            match back {
                Some(back) => remainder = back,
                // didn't really intersect
                None => return None,
            }
        }

        Some(out)
    }

    /// Carve any intersecting brushes into non-intersecting ones, biased so
    /// higher-priority brushes keep their volume.
    pub fn chop_brushes<C: Contents>(&self, brushes: Vec<Brush<C>>) -> Vec<Brush<C>> {
        let original_count = brushes.len();
        let mut list = brushes;

        let mut swallowed = 0usize;
        let mut from_split = 0usize;
        // subtraction probes shouldn't pollute the compile statistics
        let scratch = BspStats::<C>::default();

        let mut start = 0usize;
        'newlist: loop {
            if list.is_empty() {
                return list;
            }

            let mut i = start;
            while i < list.len() {
                let mut j = i + 1;
                while j < list.len() {
                    if brushes_disjoint(&list[i], &list[j]) {
                        j += 1;
                        continue;
                    }

                    let mut sub = None;
                    let mut sub2 = None;

                    if brush_ge(&list[j], &list[i]) {
                        match self.subtract_brush(&list[i], &list[j], &scratch) {
                            None => {
                                j += 1;
                                continue; // didn't really intersect
                            }
                            Some(pieces) if pieces.is_empty() => {
                                // b1 is swallowed by b2
                                list.remove(i);
                                swallowed += 1;
                                start = i; // continue after b1
                                continue 'newlist;
                            }
                            Some(pieces) => sub = Some(pieces),
                        }
                    }

                    if brush_ge(&list[i], &list[j]) {
                        match self.subtract_brush(&list[j], &list[i], &scratch) {
                            None => {
                                j += 1;
                                continue; // didn't really intersect
                            }
                            Some(pieces) if pieces.is_empty() => {
                                // b2 is swallowed by b1
                                list.remove(j);
                                swallowed += 1;
                                start = i; // continue where b1 was
                                continue 'newlist;
                            }
                            Some(pieces) => sub2 = Some(pieces),
                        }
                    }

                    if sub.is_none() && sub2.is_none() {
                        j += 1;
                        continue; // neither one can bite
                    }

                    // only accept a bite that didn't fragment the victim
                    let c1 = sub.as_ref().map_or(usize::MAX, Vec::len);
                    let c2 = sub2.as_ref().map_or(usize::MAX, Vec::len);
                    if c1 > 1 && c2 > 1 {
                        j += 1;
                        continue;
                    }

                    if c1 < c2 {
                        let pieces = sub.unwrap();
                        from_split += pieces.len();
                        list.extend(pieces);
                        list.remove(i);
                        start = i; // start from after b1
                    } else {
                        let pieces = sub2.unwrap();
                        from_split += pieces.len();
                        list.extend(pieces);
                        list.remove(j);
                        start = i; // start from where b1 left off
                    }
                    continue 'newlist;
                }
                i += 1;
            }
            break;
        }

        if swallowed != 0 {
            log::info!("{:8} brushes swallowed", swallowed);
        }
        if from_split != 0 {
            log::info!("{:8} brushes created from being consumed", from_split);
        }
        log::info!("chopped {} brushes into {}", original_count, list.len());

        list
    }
}
