//! Vertex and index buffers for painted patches.
//!
//! Every triangle gets three unique vertices so the barycentric attribute
//! can drive a wireframe overlay in the fragment shader.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use selector::{Label, PatchSet, TriangleId, TriangleSelector};

/// Vertex layout shared by patch and preview buffers
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PatchVertex {
    /// Mesh-local position
    pub position: [f32; 3],
    /// Barycentric corner (1,0,0), (0,1,0) or (0,0,1)
    pub barycentric: [f32; 3],
}

const CORNERS: [[f32; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// Triangle list ready for upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchMesh {
    pub vertices: Vec<PatchVertex>,
    pub indices: Vec<u32>,
}

impl PatchMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mesh from the given selector triangles
    pub fn from_triangles(
        selector: &TriangleSelector,
        triangles: impl IntoIterator<Item = TriangleId>,
    ) -> Self {
        let mut mesh = Self::new();
        for id in triangles {
            if selector.triangle(id).is_some() {
                mesh.push_triangle(selector.triangle_positions(id));
            }
        }
        mesh
    }

    pub fn push_triangle(&mut self, corners: [Vec3; 3]) {
        let base = self.vertices.len() as u32;
        for (corner, barycentric) in corners.into_iter().zip(CORNERS) {
            self.vertices.push(PatchVertex {
                position: corner.to_array(),
                barycentric,
            });
        }
        self.indices.extend_from_slice(&[base, base + 1, base + 2]);
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Raw vertex bytes for a GPU upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// One patch as it should be drawn
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPatch {
    /// Label stored in the selector
    pub label: Label,
    /// Label to draw with after gap fill
    pub effective_label: Label,
    pub is_fragment: bool,
    pub mesh: PatchMesh,
}

/// Buffers for every patch of `patches`
pub fn build_render_patches(selector: &TriangleSelector, patches: &PatchSet) -> Vec<RenderPatch> {
    patches
        .patches()
        .iter()
        .enumerate()
        .map(|(index, patch)| RenderPatch {
            label: patch.label,
            effective_label: patches.effective_label(index).unwrap_or(patch.label),
            is_fragment: patches.is_fragment(index),
            mesh: PatchMesh::from_triangles(selector, patch.triangles.iter().copied()),
        })
        .collect()
}
