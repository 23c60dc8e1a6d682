//! Deduplicating registry mapping oriented planes to stable indices.
//!
//! Every plane and its geometric flip occupy adjacent indices `p` and
//! `p ^ 1`, with the positive-facing orientation at the even index. The
//! table is internally synchronised: builder tasks on different subtrees
//! insert concurrently and equal planes always resolve to the same index.

use crate::float_types::{Real, DIST_EPSILON, NORMAL_EPSILON};
use crate::plane::Plane;
use hashbrown::HashMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
struct Inner {
    planes: Vec<Plane>,
    /// quantised |dist| bucket -> even indices stored there
    buckets: HashMap<i64, Vec<usize>>,
}

/// Shared, compile-lifetime plane registry.
#[derive(Debug, Default)]
pub struct PlaneTable {
    inner: RwLock<Inner>,
}

fn planes_equal(a: &Plane, b: &Plane) -> bool {
    (a.dist - b.dist).abs() < DIST_EPSILON
        && (a.normal.x - b.normal.x).abs() < NORMAL_EPSILON
        && (a.normal.y - b.normal.y).abs() < NORMAL_EPSILON
        && (a.normal.z - b.normal.z).abs() < NORMAL_EPSILON
}

fn bucket(dist: Real) -> i64 {
    dist.floor() as i64
}

impl Inner {
    /// Look up a canonical (positive-facing) plane; returns the matching
    /// stored index, which may be the odd twin if the stored pair was
    /// canonicalised the other way round near an axis tie.
    fn find(&self, canon: &Plane) -> Option<usize> {
        let b = bucket(canon.dist.abs());
        for key in [b - 1, b, b + 1] {
            let Some(indices) = self.buckets.get(&key) else {
                continue;
            };
            for &idx in indices {
                if planes_equal(canon, &self.planes[idx]) {
                    return Some(idx);
                }
                if planes_equal(canon, &self.planes[idx ^ 1]) {
                    return Some(idx ^ 1);
                }
            }
        }
        None
    }
}

impl PlaneTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().planes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of `plane`, inserting the plane/flip pair if it is new.
    /// Equal planes (within `NORMAL_EPSILON` / `DIST_EPSILON`) share an index.
    pub fn add_or_find(&self, plane: &Plane) -> usize {
        let positive = plane.is_positive();
        let canon = if positive { *plane } else { plane.flipped() };

        {
            let inner = self.inner.read().unwrap();
            if let Some(idx) = inner.find(&canon) {
                return if positive { idx } else { idx ^ 1 };
            }
        }

        let mut inner = self.inner.write().unwrap();
        // another task may have inserted between the read and the write
        if let Some(idx) = inner.find(&canon) {
            return if positive { idx } else { idx ^ 1 };
        }

        let idx = inner.planes.len();
        inner.planes.push(canon);
        inner.planes.push(canon.flipped());
        inner
            .buckets
            .entry(bucket(canon.dist.abs()))
            .or_default()
            .push(idx);

        if positive {
            idx
        } else {
            idx ^ 1
        }
    }

    /// The stored orientation of plane `num`.
    pub fn get(&self, num: usize) -> Plane {
        self.inner.read().unwrap().planes[num]
    }

    /// The positive-facing twin of plane `num`.
    pub fn positive(&self, num: usize) -> Plane {
        self.get(num & !1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn add_or_find_is_idempotent() {
        let table = PlaneTable::new();
        let p = Plane::new(Vector3::x(), 32.0);
        let num = table.add_or_find(&p);
        assert_eq!(table.add_or_find(&p), num);
        assert_eq!(table.add_or_find(&table.get(num)), num);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn flip_twins_are_adjacent() {
        let table = PlaneTable::new();
        let p = Plane::new(Vector3::new(1.0, 2.0, 0.5).normalize(), -7.0);
        let num = table.add_or_find(&p);
        let twin = table.add_or_find(&p.flipped());
        assert_eq!(num ^ 1, twin);
        assert_eq!(num & !1, twin & !1);
        assert!(table.positive(num).is_positive());
    }

    #[test]
    fn negative_facing_gets_odd_index() {
        let table = PlaneTable::new();
        let num = table.add_or_find(&Plane::new(-Vector3::y(), 16.0));
        assert_eq!(num & 1, 1);
        let stored = table.get(num);
        assert_eq!(stored.normal, -Vector3::y());
        assert_eq!(stored.dist, 16.0);
    }

    #[test]
    fn concurrent_inserts_agree() {
        let table = PlaneTable::new();
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        (0..64)
                            .map(|i| {
                                table.add_or_find(&Plane::new(Vector3::z(), i as Real * 16.0))
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            let results: Vec<Vec<usize>> =
                handles.into_iter().map(|h| h.join().unwrap()).collect();
            for pair in results.windows(2) {
                assert_eq!(pair[0], pair[1]);
            }
        });
        assert_eq!(table.len(), 128);
    }

    #[test]
    fn near_equal_planes_share_an_index() {
        let table = PlaneTable::new();
        let a = table.add_or_find(&Plane::new(Vector3::z(), 64.0));
        let b = table.add_or_find(&Plane::new(Vector3::z(), 64.0 + DIST_EPSILON / 2.0));
        assert_eq!(a, b);
        let c = table.add_or_find(&Plane::new(Vector3::z(), 64.0 + 1.0));
        assert_ne!(a, c);
    }
}
