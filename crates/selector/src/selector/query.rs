//! Read-only queries: labels, areas, point location and ray casts.

use glam::Vec3;

use super::{Triangle, TriangleSelector};
use crate::geometry::{self, Aabb};
use crate::types::{Label, TriangleId, VertexId};

/// Result of casting a ray against the selector's mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Leaf triangle containing the hit point
    pub triangle: TriangleId,
    /// Level-0 facet that was hit
    pub facet: u32,
    /// Hit point in mesh-local space
    pub point: Vec3,
    /// Ray parameter in units of the ray direction
    pub t: f32,
}

impl TriangleSelector {
    pub fn triangle(&self, id: TriangleId) -> Option<&Triangle> {
        self.triangles.get(id.index())
    }

    /// Total number of triangles in the arena (split and leaf)
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Number of level-0 facets
    pub fn facet_count(&self) -> usize {
        self.facet_count as usize
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn vertex(&self, id: VertexId) -> Option<Vec3> {
        self.vertices.get(id.index()).copied()
    }

    /// Bounding box of the mesh in local space
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Local-space corner positions of a triangle.
    ///
    /// Panics on invalid ids; callers validate through [`Self::triangle`].
    pub fn triangle_positions(&self, id: TriangleId) -> [Vec3; 3] {
        self.triangles[id.index()]
            .verts
            .map(|v| self.vertices[v.index()])
    }

    /// Unit normal of the level-0 facet the triangle descends from
    pub fn facet_normal(&self, id: TriangleId) -> Vec3 {
        self.triangles
            .get(id.index())
            .map(|tri| self.facet_normals[tri.source_facet as usize])
            .unwrap_or(Vec3::ZERO)
    }

    /// Panics on invalid ids, like [`Self::triangle_positions`]
    pub fn centroid(&self, id: TriangleId) -> Vec3 {
        let [a, b, c] = self.triangle_positions(id);
        (a + b + c) / 3.0
    }

    /// Surface area of a triangle. Panics on invalid ids.
    pub fn area(&self, id: TriangleId) -> f32 {
        let [a, b, c] = self.triangle_positions(id);
        geometry::triangle_area(a, b, c)
    }

    /// Label of a triangle: the leaf label, or the common label of all
    /// leaves below a split triangle (`None` when they differ)
    pub fn label_of_triangle(&self, id: TriangleId) -> Option<Label> {
        let tri = self.triangles.get(id.index())?;
        if tri.is_leaf() {
            return Some(tri.label);
        }
        let mut leaves = self.leaves_of(id).into_iter();
        let first = self.triangles[leaves.next()?.index()].label;
        leaves
            .all(|leaf| self.triangles[leaf.index()].label == first)
            .then_some(first)
    }

    /// Label at the mesh point closest to `point` (mesh-local)
    pub fn label_of_point(&self, point: Vec3) -> Option<Label> {
        let leaf = self.locate(point)?;
        Some(self.triangles[leaf.index()].label)
    }

    /// Leaf containing the mesh point closest to `point` (mesh-local)
    pub fn locate(&self, point: Vec3) -> Option<TriangleId> {
        self.locate_within(point, f32::INFINITY)
    }

    /// Like [`Self::locate`], but `None` when the mesh is farther than
    /// `max_distance` from `point`
    pub fn locate_within(&self, point: Vec3, max_distance: f32) -> Option<TriangleId> {
        if !point.is_finite() {
            return None;
        }
        let (facet, distance_sq) = (0..self.facet_count)
            .map(|f| {
                let id = TriangleId(f);
                (id, self.distance_squared_to(id, point))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))?;
        if distance_sq > max_distance * max_distance {
            return None;
        }
        Some(self.descend_to_leaf(facet, point))
    }

    /// Follow the split hierarchy down to the leaf closest to `point`
    fn descend_to_leaf(&self, mut id: TriangleId, point: Vec3) -> TriangleId {
        while let Some(children) = self.triangles[id.index()].children {
            id = children
                .into_iter()
                .min_by(|&a, &b| {
                    self.distance_squared_to(a, point)
                        .total_cmp(&self.distance_squared_to(b, point))
                })
                .unwrap_or(children[0]);
        }
        id
    }

    fn distance_squared_to(&self, id: TriangleId, point: Vec3) -> f32 {
        let [a, b, c] = self.triangle_positions(id);
        geometry::closest_point_on_triangle(point, a, b, c).distance_squared(point)
    }

    /// Cast a mesh-local ray; returns the nearest hit leaf
    pub fn raycast(&self, origin: Vec3, direction: Vec3) -> Option<RayHit> {
        let (facet, hit) = (0..self.facet_count)
            .filter_map(|f| {
                let [a, b, c] = self.triangle_positions(TriangleId(f));
                geometry::ray_triangle_intersection(origin, direction, a, b, c).map(|h| (f, h))
            })
            .min_by(|a, b| a.1.t.total_cmp(&b.1.t))?;
        let point = origin + direction * hit.t;
        Some(RayHit {
            triangle: self.descend_to_leaf(TriangleId(facet), point),
            facet,
            point,
            t: hit.t,
        })
    }

    /// Every leaf below (or equal to) `id`, in depth-first child order
    pub fn leaves_of(&self, id: TriangleId) -> Vec<TriangleId> {
        let mut leaves = Vec::new();
        if id.index() >= self.triangles.len() {
            return leaves;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            match self.triangles[current.index()].children {
                Some(children) => stack.extend(children.into_iter().rev()),
                None => leaves.push(current),
            }
        }
        leaves
    }

    /// Every leaf in the arena, in id order
    pub fn leaf_ids(&self) -> Vec<TriangleId> {
        self.triangles
            .iter()
            .enumerate()
            .filter(|(_, tri)| tri.is_leaf())
            .map(|(i, _)| TriangleId(i as u32))
            .collect()
    }

    pub fn leaf_count(&self) -> usize {
        self.triangles.iter().filter(|tri| tri.is_leaf()).count()
    }

    /// Summed area of the leaves below `id`
    pub fn leaf_area(&self, id: TriangleId) -> f32 {
        self.leaves_of(id).into_iter().map(|leaf| self.area(leaf)).sum()
    }

    /// Area of the level-0 mesh
    pub fn mesh_area(&self) -> f32 {
        (0..self.facet_count).map(|f| self.area(TriangleId(f))).sum()
    }

    /// Total area of leaves carrying `label`
    pub fn label_area(&self, label: Label) -> f32 {
        self.triangles
            .iter()
            .enumerate()
            .filter(|(_, tri)| tri.is_leaf() && tri.label == label)
            .map(|(i, _)| self.area(TriangleId(i as u32)))
            .sum()
    }

    /// Whether any leaf carries `label`
    pub fn has_label(&self, label: Label) -> bool {
        self.triangles
            .iter()
            .any(|tri| tri.is_leaf() && tri.label == label)
    }

    /// Whether any leaf carries a label other than `NONE`
    pub fn has_any_label(&self) -> bool {
        self.triangles
            .iter()
            .any(|tri| tri.is_leaf() && !tri.label.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MeshData;

    fn square() -> TriangleSelector {
        let mesh = MeshData::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(2.0, 2.0, 0.0),
                Vec3::new(0.0, 2.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        );
        TriangleSelector::from_mesh(&mesh).unwrap()
    }

    #[test]
    fn test_locate_descends_to_leaf() {
        let mut selector = square();
        selector.split(TriangleId(0), 0.1);
        let leaf = selector.locate(Vec3::new(1.9, 0.05, 0.3)).unwrap();
        let tri = selector.triangle(leaf).unwrap();
        assert!(tri.is_leaf());
        assert_eq!(tri.source_facet, 0);
        assert_eq!(tri.depth, 1);

        assert_eq!(selector.locate(Vec3::new(0.1, 1.9, 0.0)), Some(TriangleId(1)));
        assert_eq!(selector.locate_within(Vec3::new(0.1, 1.9, 5.0), 1.0), None);
        assert_eq!(selector.locate(Vec3::splat(f32::NAN)), None);
    }

    #[test]
    fn test_label_queries() {
        let mut selector = square();
        assert!(!selector.has_any_label());
        selector.set_facet(1, Label::ENFORCER);

        assert!(selector.has_label(Label::ENFORCER));
        assert!(!selector.has_label(Label::BLOCKER));
        assert!((selector.label_area(Label::ENFORCER) - 2.0).abs() < 1e-5);
        assert_eq!(selector.label_of_point(Vec3::new(0.2, 1.5, 0.0)), Some(Label::ENFORCER));
        assert_eq!(selector.label_of_point(Vec3::new(1.5, 0.2, 0.0)), Some(Label::NONE));
    }

    #[test]
    fn test_label_of_split_triangle() {
        let mut selector = square();
        selector.split(TriangleId(0), 0.1);
        assert_eq!(selector.label_of_triangle(TriangleId(0)), Some(Label::NONE));

        let children = selector.triangle(TriangleId(0)).unwrap().children.unwrap();
        selector.triangles[children[1].index()].label = Label::BLOCKER;
        assert_eq!(selector.label_of_triangle(TriangleId(0)), None);
        assert_eq!(selector.label_of_triangle(TriangleId(99)), None);
    }

    #[test]
    fn test_leaf_area_matches_facet_area() {
        let mut selector = square();
        selector.split(TriangleId(0), 0.1);
        let children = selector.triangle(TriangleId(0)).unwrap().children.unwrap();
        selector.split(children[3], 0.1);

        assert_eq!(selector.leaves_of(TriangleId(0)).len(), 7);
        assert!((selector.leaf_area(TriangleId(0)) - selector.area(TriangleId(0))).abs() < 1e-5);
        assert!((selector.mesh_area() - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_raycast() {
        let selector = square();
        let hit = selector
            .raycast(Vec3::new(0.5, 1.5, 3.0), Vec3::new(0.0, 0.0, -1.0))
            .unwrap();
        assert_eq!(hit.facet, 1);
        assert_eq!(hit.triangle, TriangleId(1));
        assert!((hit.t - 3.0).abs() < 1e-5);
        assert!(selector.raycast(Vec3::new(5.0, 5.0, 3.0), Vec3::NEG_Z).is_none());
    }

    #[test]
    #[should_panic]
    fn test_area_panics_on_invalid_id() {
        square().area(TriangleId(999));
    }

    #[test]
    #[should_panic]
    fn test_centroid_panics_on_invalid_id() {
        square().centroid(TriangleId(999));
    }
}
