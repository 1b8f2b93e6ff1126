//! Midpoint quad-split subdivision.
//!
//! ```text
//!            v2
//!            /\
//!           /c2\
//!      m20 /____\ m12
//!         /\ c3 /\
//!        /c0\  /c1\
//!       /____\/____\
//!     v0     m01    v1
//! ```

use tracing::trace;

use super::{Triangle, TriangleSelector};
use crate::types::{TriangleId, VertexId};

/// Child corner layout, as (vertex slots, parent edge of each child edge).
/// Slots 0..3 are the parent vertices, 3..6 the midpoints m01, m12, m20.
const CHILD_LAYOUT: [([usize; 3], [Option<u8>; 3]); 4] = [
    ([0, 3, 5], [Some(0), None, Some(2)]),
    ([3, 1, 4], [Some(0), Some(1), None]),
    ([5, 4, 2], [None, Some(1), Some(2)]),
    ([3, 4, 5], [None, None, None]),
];

impl TriangleSelector {
    /// Split a leaf triangle into four midpoint children.
    ///
    /// Returns `false` without changing anything when the id is invalid, the
    /// triangle is already split, its longest edge is within `edge_limit`,
    /// the children would fall below `min_edge_length` or exceed `max_depth`.
    pub fn split(&mut self, id: TriangleId, edge_limit: f32) -> bool {
        let Some(tri) = self.triangles.get(id.index()) else {
            trace!("split ignored: invalid triangle {:?}", id);
            return false;
        };
        if tri.is_split() || tri.depth >= self.config.max_depth {
            return false;
        }

        let longest = self.longest_edge(id);
        if longest <= edge_limit || longest * 0.5 < self.config.min_edge_length {
            return false;
        }

        self.split_unchecked(id);
        true
    }

    /// Split without edge-length checks (used when replaying snapshots)
    pub(crate) fn split_unchecked(&mut self, id: TriangleId) -> [TriangleId; 4] {
        let parent = &self.triangles[id.index()];
        let [v0, v1, v2] = parent.verts;
        let (label, depth, source_facet) = (parent.label, parent.depth + 1, parent.source_facet);

        let m01 = self.midpoint(v0, v1);
        let m12 = self.midpoint(v1, v2);
        let m20 = self.midpoint(v2, v0);
        let slots = [v0, v1, v2, m01, m12, m20];

        let first = self.triangles.len() as u32;
        let children = [
            TriangleId(first),
            TriangleId(first + 1),
            TriangleId(first + 2),
            TriangleId(first + 3),
        ];
        for (corners, parent_edge) in CHILD_LAYOUT {
            self.triangles.push(Triangle {
                verts: corners.map(|slot| slots[slot]),
                label,
                children: None,
                parent: Some(id),
                depth,
                source_facet,
                parent_edge,
                selected_by_seed_fill: false,
            });
        }
        self.triangles[id.index()].children = Some(children);
        self.touch();

        trace!("split {:?} at depth {} -> {:?}", id, depth - 1, children);
        children
    }

    /// Shared midpoint vertex of the edge `ab`, created on first use
    fn midpoint(&mut self, a: VertexId, b: VertexId) -> VertexId {
        let key = (a.min(b), a.max(b));
        if let Some(&existing) = self.midpoints.get(&key) {
            return existing;
        }
        let position = (self.vertices[a.index()] + self.vertices[b.index()]) * 0.5;
        let id = VertexId(self.vertices.len() as u32);
        self.vertices.push(position);
        self.midpoints.insert(key, id);
        id
    }

    pub(crate) fn midpoint_of(&self, a: VertexId, b: VertexId) -> Option<VertexId> {
        self.midpoints.get(&(a.min(b), a.max(b))).copied()
    }

    /// Length of the longest edge of a triangle. Panics on invalid ids.
    pub fn longest_edge(&self, id: TriangleId) -> f32 {
        let [a, b, c] = self.triangle_positions(id);
        a.distance(b).max(b.distance(c)).max(c.distance(a))
    }

    /// Whether `split(id, edge_limit)` would subdivide the triangle
    pub fn can_split(&self, id: TriangleId, edge_limit: f32) -> bool {
        let Some(tri) = self.triangles.get(id.index()) else {
            return false;
        };
        if tri.is_split() || tri.depth >= self.config.max_depth {
            return false;
        }
        let longest = self.longest_edge(id);
        longest > edge_limit && longest * 0.5 >= self.config.min_edge_length
    }
}
