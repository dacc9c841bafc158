// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spatial lookup over the device bounds of rendering ops.
//!
//! Ids are draw ordinals: the `n`th drawing record of a list has id `n`.
//! Culled dispatch walks records in order and compares each drawing
//! record's ordinal against the sorted result of [`SpatialIndex::search`].

use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;

use kurbo::Rect;

/// Maximum children per tree node.
const FAN_OUT: usize = 8;

/// Answers "which ops might touch this region".
pub trait SpatialIndex: Send + Sync + Debug {
    /// Appends the ids whose bounds overlap `query` to `out`, in ascending
    /// order.
    fn search(&self, query: Rect, out: &mut Vec<u32>);

    /// Union of every indexed rect.
    fn bounds(&self) -> Rect;

    /// The rect stored for `id`.
    fn rect(&self, id: u32) -> Option<Rect>;

    /// The rects overlapping `query`, with mutually overlapping results
    /// merged until no two overlap.
    fn search_and_consolidate(&self, query: Rect) -> Vec<Rect> {
        let mut ids = Vec::new();
        self.search(query, &mut ids);
        let mut merged: Vec<Rect> = Vec::new();
        for id in ids {
            let Some(mut rect) = self.rect(id) else {
                continue;
            };
            while let Some(pos) = merged.iter().position(|m| overlaps(*m, rect)) {
                rect = rect.union(merged.swap_remove(pos));
            }
            merged.push(rect);
        }
        merged
    }
}

/// Strict overlap: rects that only share an edge do not overlap.
#[inline]
pub(crate) fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

/// Whether `outer` covers all of `inner`.
#[inline]
pub(crate) fn contains_rect(outer: Rect, inner: Rect) -> bool {
    outer.x0 <= inner.x0 && outer.y0 <= inner.y0 && outer.x1 >= inner.x1 && outer.y1 >= inner.y1
}

fn has_area(rect: Rect) -> bool {
    rect.width() > 0.0 && rect.height() > 0.0
}

#[derive(Clone, Copy, Debug)]
struct Node {
    bounds: Rect,
    first: usize,
    count: usize,
    leaf: bool,
}

/// A static R-tree, bulk loaded with sort-tile-recursive packing.
#[derive(Clone, Debug, Default)]
pub struct RTree {
    rects: Vec<Rect>,
    ids: Vec<u32>,
    nodes: Vec<Node>,
    root: Option<usize>,
    bounds: Rect,
}

impl RTree {
    /// Indexes `rects`; each rect's id is its position in the slice.
    ///
    /// Rects without area can never overlap a query and are left out.
    #[must_use]
    pub fn new(rects: &[Rect]) -> Self {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "the builder caps draw ops below u32::MAX"
        )]
        let mut entries: Vec<(Rect, u32)> = rects
            .iter()
            .enumerate()
            .filter(|(_, r)| has_area(**r))
            .map(|(i, r)| (*r, i as u32))
            .collect();
        str_order(&mut entries, |e| e.0);

        let mut level: Vec<Node> = entries
            .chunks(FAN_OUT)
            .enumerate()
            .map(|(i, chunk)| Node {
                bounds: union_all(chunk.iter().map(|e| e.0)),
                first: i * FAN_OUT,
                count: chunk.len(),
                leaf: true,
            })
            .collect();
        let ids = entries.iter().map(|e| e.1).collect();

        let mut nodes = Vec::new();
        while level.len() > 1 {
            str_order(&mut level, |n| n.bounds);
            let base = nodes.len();
            let parents = level
                .chunks(FAN_OUT)
                .enumerate()
                .map(|(i, chunk)| Node {
                    bounds: union_all(chunk.iter().map(|n| n.bounds)),
                    first: base + i * FAN_OUT,
                    count: chunk.len(),
                    leaf: false,
                })
                .collect();
            nodes.append(&mut level);
            level = parents;
        }
        let (root, bounds) = match level.pop() {
            Some(node) => {
                nodes.push(node);
                (Some(nodes.len() - 1), node.bounds)
            }
            None => (None, Rect::ZERO),
        };

        Self {
            rects: rects.to_vec(),
            ids,
            nodes,
            root,
            bounds,
        }
    }

    /// Number of rects passed to [`new`](Self::new).
    #[must_use]
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    /// Whether no rects were indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }
}

impl SpatialIndex for RTree {
    fn search(&self, query: Rect, out: &mut Vec<u32>) {
        let Some(root) = self.root else {
            return;
        };
        let start = out.len();
        let mut stack = vec![root];
        while let Some(i) = stack.pop() {
            let node = self.nodes[i];
            if !overlaps(node.bounds, query) {
                continue;
            }
            let range = node.first..node.first + node.count;
            if node.leaf {
                out.extend(
                    self.ids[range]
                        .iter()
                        .copied()
                        .filter(|id| overlaps(self.rects[*id as usize], query)),
                );
            } else {
                stack.extend(range);
            }
        }
        out[start..].sort_unstable();
    }

    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn rect(&self, id: u32) -> Option<Rect> {
        self.rects.get(id as usize).copied()
    }
}

fn union_all(rects: impl Iterator<Item = Rect>) -> Rect {
    rects.reduce(|a, b| a.union(b)).unwrap_or(Rect::ZERO)
}

/// Orders `items` into vertical slices by x centre, then each slice by y
/// centre, so consecutive runs of `FAN_OUT` are spatially compact.
fn str_order<T>(items: &mut [T], rect: impl Fn(&T) -> Rect) {
    let groups = items.len().div_ceil(FAN_OUT);
    if groups <= 1 {
        return;
    }
    let slices = groups.isqrt().max(1);
    let per_slice = groups.div_ceil(slices) * FAN_OUT;
    items.sort_by(|a, b| rect(a).center().x.total_cmp(&rect(b).center().x));
    for slice in items.chunks_mut(per_slice) {
        slice.sort_by(|a, b| rect(a).center().y.total_cmp(&rect(b).center().y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(n: usize) -> Vec<Rect> {
        (0..n * n)
            .map(|i| {
                let x = (i % n) as f64 * 10.0;
                let y = (i / n) as f64 * 10.0;
                Rect::new(x, y, x + 8.0, y + 8.0)
            })
            .collect()
    }

    fn brute_force(rects: &[Rect], query: Rect) -> Vec<u32> {
        rects
            .iter()
            .enumerate()
            .filter(|(_, r)| has_area(**r) && overlaps(**r, query))
            .map(|(i, _)| u32::try_from(i).unwrap())
            .collect()
    }

    #[test]
    fn empty_tree_finds_nothing() {
        let tree = RTree::new(&[]);
        let mut out = Vec::new();
        tree.search(Rect::new(0.0, 0.0, 1.0, 1.0), &mut out);
        assert!(out.is_empty());
        assert!(tree.is_empty());
        assert_eq!(tree.bounds(), Rect::ZERO);
    }

    #[test]
    fn matches_brute_force_on_grid() {
        let rects = grid(20);
        let tree = RTree::new(&rects);
        assert_eq!(tree.bounds(), Rect::new(0.0, 0.0, 198.0, 198.0));
        for query in [
            Rect::new(0.0, 0.0, 5.0, 5.0),
            Rect::new(35.0, 35.0, 95.0, 61.0),
            Rect::new(-50.0, -50.0, 500.0, 500.0),
            Rect::new(8.0, 8.0, 10.0, 10.0),
        ] {
            let mut out = Vec::new();
            tree.search(query, &mut out);
            assert_eq!(out, brute_force(&rects, query), "query {query:?}");
        }
    }

    #[test]
    fn results_are_sorted_and_appended() {
        let rects = grid(5);
        let tree = RTree::new(&rects);
        let mut out = vec![999];
        tree.search(Rect::new(0.0, 0.0, 50.0, 50.0), &mut out);
        assert_eq!(out[0], 999);
        assert!(out[1..].windows(2).all(|w| w[0] < w[1]));
        assert_eq!(out.len(), 26);
    }

    #[test]
    fn zero_area_rects_are_skipped() {
        let rects = [Rect::new(0.0, 0.0, 0.0, 10.0), Rect::new(0.0, 0.0, 10.0, 10.0)];
        let tree = RTree::new(&rects);
        let mut out = Vec::new();
        tree.search(Rect::new(-1.0, -1.0, 20.0, 20.0), &mut out);
        assert_eq!(out, [1]);
        assert_eq!(tree.rect(0), Some(rects[0]));
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        let tree = RTree::new(&[Rect::new(0.0, 0.0, 10.0, 10.0)]);
        let mut out = Vec::new();
        tree.search(Rect::new(10.0, 0.0, 20.0, 10.0), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn consolidate_merges_chains() {
        let rects = [
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(5.0, 5.0, 15.0, 15.0),
            Rect::new(12.0, 12.0, 20.0, 20.0),
            Rect::new(100.0, 100.0, 110.0, 110.0),
        ];
        let tree = RTree::new(&rects);
        let mut merged = tree.search_and_consolidate(Rect::new(-1.0, -1.0, 200.0, 200.0));
        merged.sort_by(|a, b| a.x0.total_cmp(&b.x0));
        assert_eq!(
            merged,
            [Rect::new(0.0, 0.0, 20.0, 20.0), Rect::new(100.0, 100.0, 110.0, 110.0)]
        );
    }
}
