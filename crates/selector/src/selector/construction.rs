//! Building a selector from indexed mesh data.

use std::collections::HashMap;

use facetpaint_config::SubdivisionConfig;
use glam::Vec3;
use tracing::{debug, info};

use super::{MeshError, Triangle, TriangleSelector};
use crate::geometry::{Aabb, triangle_normal};
use crate::types::{MeshData, TriangleId, VertexId};

impl TriangleSelector {
    /// Build a selector over `mesh` with default subdivision limits
    pub fn from_mesh(mesh: &MeshData) -> Result<Self, MeshError> {
        Self::new(mesh, SubdivisionConfig::default())
    }

    /// Build a selector over `mesh`.
    ///
    /// Vertices with bit-identical positions are welded so that facets of a
    /// triangle soup still see each other as neighbors.
    pub fn new(mesh: &MeshData, config: SubdivisionConfig) -> Result<Self, MeshError> {
        if mesh.indices.is_empty() {
            return Err(MeshError::EmptyMesh);
        }
        if mesh.indices.len() > u32::MAX as usize / 2 {
            return Err(MeshError::TooManyFacets(mesh.indices.len()));
        }
        if let Some(index) = mesh.positions.iter().position(|p| !p.is_finite()) {
            return Err(MeshError::NonFinitePosition { index });
        }

        let (vertices, remap) = weld_vertices(&mesh.positions);

        let mut triangles = Vec::with_capacity(mesh.indices.len());
        for (facet, indices) in mesh.indices.iter().enumerate() {
            let mut verts = [VertexId(0); 3];
            for (slot, &index) in indices.iter().enumerate() {
                let welded = remap.get(index as usize).ok_or(MeshError::IndexOutOfRange {
                    facet,
                    index,
                    vertex_count: mesh.positions.len(),
                })?;
                verts[slot] = *welded;
            }
            triangles.push(Triangle::facet(verts, facet as u32));
        }

        let facet_normals = triangles
            .iter()
            .map(|tri| {
                let [a, b, c] = tri.verts.map(|v| vertices[v.index()]);
                triangle_normal(a, b, c)
            })
            .collect();
        let facet_neighbors = build_facet_neighbors(&triangles);
        let bounds = Aabb::from_points(vertices.iter().copied());

        info!(
            "TriangleSelector created: {} facets, {} vertices ({} welded)",
            triangles.len(),
            vertices.len(),
            mesh.positions.len() - vertices.len()
        );

        Ok(Self {
            base_vertex_count: vertices.len(),
            vertices,
            facet_count: triangles.len() as u32,
            triangles,
            facet_neighbors,
            facet_normals,
            midpoints: HashMap::new(),
            bounds,
            config,
            revision: 0,
            generation: 0,
            listeners: Vec::new(),
            next_listener: 0,
        })
    }
}

/// Merge bit-identical positions, returning the welded positions and the
/// input index to welded id mapping
fn weld_vertices(positions: &[Vec3]) -> (Vec<Vec3>, Vec<VertexId>) {
    let mut welded: Vec<Vec3> = Vec::with_capacity(positions.len());
    let mut lookup: HashMap<[u32; 3], VertexId> = HashMap::with_capacity(positions.len());
    let mut remap = Vec::with_capacity(positions.len());

    for &p in positions {
        // Adding 0.0 folds -0.0 into +0.0 so both weld together
        let key = [(p.x + 0.0).to_bits(), (p.y + 0.0).to_bits(), (p.z + 0.0).to_bits()];
        let id = *lookup.entry(key).or_insert_with(|| {
            welded.push(p);
            VertexId((welded.len() - 1) as u32)
        });
        remap.push(id);
    }

    (welded, remap)
}

/// Pair up facets across shared edges. Boundary and non-manifold edges
/// (one or more than two incident facets) get no neighbor.
fn build_facet_neighbors(triangles: &[Triangle]) -> Vec<[Option<TriangleId>; 3]> {
    let mut edge_map: HashMap<(VertexId, VertexId), Vec<(usize, usize)>> = HashMap::new();
    for (facet, tri) in triangles.iter().enumerate() {
        for edge in 0..3 {
            let (a, b) = tri.edge(edge);
            if a == b {
                continue;
            }
            edge_map
                .entry((a.min(b), a.max(b)))
                .or_default()
                .push((facet, edge));
        }
    }

    let mut neighbors = vec![[None; 3]; triangles.len()];
    let mut non_manifold = 0usize;
    for incident in edge_map.values() {
        match incident.as_slice() {
            [(f0, e0), (f1, e1)] if f0 != f1 => {
                neighbors[*f0][*e0] = Some(TriangleId(*f1 as u32));
                neighbors[*f1][*e1] = Some(TriangleId(*f0 as u32));
            }
            [_] => {}
            _ => non_manifold += 1,
        }
    }
    if non_manifold > 0 {
        debug!("{} non-manifold edges left without neighbors", non_manifold);
    }

    neighbors
}
