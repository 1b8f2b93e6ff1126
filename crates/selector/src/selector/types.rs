//! Type definitions for the triangle arena.

use crate::types::{Label, TriangleId, VertexId};

/// A triangle in the selector arena.
///
/// Level-0 triangles mirror the input facets one to one; split children are
/// appended after them. A split triangle carries no paint weight itself,
/// only its children do.
#[derive(Debug, Clone)]
pub struct Triangle {
    /// Vertex ids in counter-clockwise order
    pub verts: [VertexId; 3],
    /// Paint label (meaningful for leaves only)
    pub label: Label,
    /// Children created by a midpoint quad-split
    pub children: Option<[TriangleId; 4]>,
    /// Parent triangle (None for level-0 facets)
    pub parent: Option<TriangleId>,
    /// Split depth below the level-0 facet
    pub depth: u8,
    /// Index of the level-0 facet this triangle descends from
    pub source_facet: u32,
    /// For each edge, the parent edge it lies on (None for edges interior to the parent)
    pub(crate) parent_edge: [Option<u8>; 3],
    /// Transient mark set by the active seed-fill pass
    pub(crate) selected_by_seed_fill: bool,
}

impl Triangle {
    pub(crate) fn facet(verts: [VertexId; 3], source_facet: u32) -> Self {
        Self {
            verts,
            label: Label::NONE,
            children: None,
            parent: None,
            depth: 0,
            source_facet,
            parent_edge: [None; 3],
            selected_by_seed_fill: false,
        }
    }

    #[inline]
    pub fn is_split(&self) -> bool {
        self.children.is_some()
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    #[inline]
    pub fn is_selected_by_seed_fill(&self) -> bool {
        self.selected_by_seed_fill
    }

    /// Endpoints of edge `edge` (`verts[edge] -> verts[edge + 1]`)
    #[inline]
    pub fn edge(&self, edge: usize) -> (VertexId, VertexId) {
        (self.verts[edge % 3], self.verts[(edge + 1) % 3])
    }

    /// Whether the triangle has the undirected edge `ab`
    pub fn has_edge(&self, a: VertexId, b: VertexId) -> bool {
        (0..3).any(|e| {
            let (x, y) = self.edge(e);
            (x == a && y == b) || (x == b && y == a)
        })
    }
}

/// Errors that can occur while building a selector from mesh data
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("Mesh has no triangles")]
    EmptyMesh,
    #[error("Facet {facet} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        facet: usize,
        index: u32,
        vertex_count: usize,
    },
    #[error("Vertex {index} has a non-finite position")]
    NonFinitePosition { index: usize },
    #[error("Mesh is too large: {0} facets")]
    TooManyFacets(usize),
}
