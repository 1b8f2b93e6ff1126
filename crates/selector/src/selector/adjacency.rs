//! On-demand adjacency across mismatched split depths.
//!
//! Only level-0 facet neighbors are stored. The neighbor of a child across
//! an edge is either a sibling (interior edge) or is found by asking the
//! parent for its neighbor across the containing edge and descending into
//! that neighbor's children when it was split at the same depth.

use tracing::error;

use super::TriangleSelector;
use crate::types::{TriangleId, VertexId};

/// A leaf touching a triangle along (part of) one of its edges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedEdge {
    /// Edge index on the queried triangle
    pub edge: usize,
    /// The touching leaf
    pub neighbor: TriangleId,
    /// Endpoints of the shared segment
    pub segment: [VertexId; 2],
}

impl TriangleSelector {
    /// Triangle across edge `edge` at the same depth or shallower.
    ///
    /// A shallower result is always a leaf. `None` at mesh boundaries and
    /// non-manifold edges.
    pub fn neighbor(&self, id: TriangleId, edge: usize) -> Option<TriangleId> {
        let tri = self.triangles.get(id.index())?;
        if edge >= 3 {
            return None;
        }

        let Some(parent) = tri.parent else {
            return self.facet_neighbors[id.index()][edge];
        };
        let (a, b) = tri.edge(edge);

        match tri.parent_edge[edge] {
            // Interior edge: the sibling on the other side
            None => self.triangles[parent.index()]
                .children?
                .into_iter()
                .find(|&c| c != id && self.triangles[c.index()].has_edge(a, b)),
            Some(parent_edge) => {
                let across = self.neighbor(parent, parent_edge as usize)?;
                let across_tri = &self.triangles[across.index()];
                match across_tri.children {
                    Some(children) if across_tri.depth + 1 == tri.depth => {
                        let found = children
                            .into_iter()
                            .find(|&c| self.triangles[c.index()].has_edge(a, b));
                        if found.is_none() {
                            error!(
                                "Adjacency mismatch: no child of {:?} shares edge of {:?}",
                                across, id
                            );
                            debug_assert!(false, "split neighbor lacks matching child");
                        }
                        found
                    }
                    _ => Some(across),
                }
            }
        }
    }

    /// Per-edge neighbors, see [`TriangleSelector::neighbor`]
    pub fn neighbors(&self, id: TriangleId) -> [Option<TriangleId>; 3] {
        [0, 1, 2].map(|edge| self.neighbor(id, edge))
    }

    /// Every leaf sharing a (sub-)edge with `id`, sorted by id
    pub fn touching_triangles(&self, id: TriangleId) -> Vec<TriangleId> {
        let mut touching: Vec<TriangleId> = self
            .shared_edges(id)
            .into_iter()
            .map(|shared| shared.neighbor)
            .collect();
        touching.sort_unstable();
        touching.dedup();
        touching
    }

    /// Leaves touching `id` with the exact shared segment for each
    pub fn shared_edges(&self, id: TriangleId) -> Vec<SharedEdge> {
        let mut out = Vec::new();
        let Some(tri) = self.triangles.get(id.index()) else {
            return out;
        };
        for edge in 0..3 {
            let Some(across) = self.neighbor(id, edge) else {
                continue;
            };
            let (a, b) = tri.edge(edge);
            if self.triangles[across.index()].depth < tri.depth {
                // Shallower leaf: the whole edge lies on it
                out.push(SharedEdge {
                    edge,
                    neighbor: across,
                    segment: [a, b],
                });
            } else {
                self.collect_along_edge(edge, across, a, b, &mut out);
            }
        }
        out
    }

    /// Descend into `node` (which has the exact edge `ab`) collecting leaves
    fn collect_along_edge(
        &self,
        edge: usize,
        node: TriangleId,
        a: VertexId,
        b: VertexId,
        out: &mut Vec<SharedEdge>,
    ) {
        let tri = &self.triangles[node.index()];
        let Some(children) = tri.children else {
            out.push(SharedEdge {
                edge,
                neighbor: node,
                segment: [a, b],
            });
            return;
        };
        let Some(m) = self.midpoint_of(a, b) else {
            error!("Split triangle {:?} has no midpoint on shared edge", node);
            debug_assert!(false, "missing midpoint on split edge");
            return;
        };
        for (from, to) in [(a, m), (m, b)] {
            if let Some(child) = children
                .into_iter()
                .find(|&c| self.triangles[c.index()].has_edge(from, to))
            {
                self.collect_along_edge(edge, child, from, to, out);
            }
        }
    }
}
