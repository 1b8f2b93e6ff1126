//! Seed-fill region growing (smart fill and bucket fill).
//!
//! Selection only sets the transient seed-fill flag on leaves so that a
//! hover can preview the region; [`TriangleSelector::seed_fill_apply`]
//! turns the flagged leaves into labels.

use std::collections::VecDeque;
use std::f32::consts::PI;

use glam::{Affine3A, Vec3};
use tracing::{debug, trace};

use crate::constants::COPLANAR_EPSILON;
use crate::events::SelectorEvent;
use crate::geometry::ClippingPlane;
use crate::selector::TriangleSelector;
use crate::types::{Label, TriangleId, VertexId};

/// Clipping half-space in world space plus the mesh-to-world transform
/// needed to test mesh-local triangles against it
#[derive(Debug, Clone, Copy)]
pub struct FillClip {
    pub plane: ClippingPlane,
    pub transform: Affine3A,
}

impl FillClip {
    /// Whether the mesh-local point is on the clipped side
    pub fn clips(&self, local: Vec3) -> bool {
        self.plane
            .is_point_clipped(self.transform.transform_point3(local))
    }
}

/// Minimum unit-normal dot product admitted by an angle threshold.
///
/// `None` (or anything at or above pi) means unconstrained.
pub fn cos_limit(angle_threshold: Option<f32>) -> f32 {
    match angle_threshold {
        Some(angle) if angle < PI => angle.max(0.0).cos() - COPLANAR_EPSILON,
        _ => f32::NEG_INFINITY,
    }
}

struct FillRule {
    cos_limit: f32,
    /// Only cross into leaves with this label
    same_label: Option<Label>,
    /// Only stay within this level-0 facet
    facet: Option<u32>,
}

impl TriangleSelector {
    /// Smart fill: flag the region reachable from `seed` across edges whose
    /// facet normals differ by at most `angle_threshold` radians.
    ///
    /// Clears any previous selection first. Returns the number of flagged
    /// leaves.
    pub fn seed_fill_select(
        &mut self,
        seed: TriangleId,
        angle_threshold: f32,
        clip: Option<&FillClip>,
    ) -> usize {
        let rule = FillRule {
            cos_limit: cos_limit(Some(angle_threshold)),
            same_label: None,
            facet: None,
        };
        self.grow_selection(seed, rule, clip)
    }

    /// Bucket fill: like smart fill but only across leaves carrying the
    /// seed's label. With `propagate == false` the fill stays within the
    /// seed's level-0 facet; a `None` threshold is unconstrained.
    pub fn bucket_fill_select(
        &mut self,
        seed: TriangleId,
        angle_threshold: Option<f32>,
        propagate: bool,
        clip: Option<&FillClip>,
    ) -> usize {
        let Some(tri) = self.triangle(seed) else {
            trace!("bucket fill ignored: invalid seed {:?}", seed);
            return 0;
        };
        let rule = FillRule {
            cos_limit: cos_limit(angle_threshold),
            same_label: Some(tri.label),
            facet: (!propagate).then_some(tri.source_facet),
        };
        self.grow_selection(seed, rule, clip)
    }

    fn grow_selection(&mut self, seed: TriangleId, rule: FillRule, clip: Option<&FillClip>) -> usize {
        let had_selection = self.clear_seed_fill_flags() > 0;

        let selected = if self.triangle(seed).is_some_and(|tri| tri.is_leaf()) {
            self.flood(seed, &rule, clip)
        } else {
            trace!("seed fill ignored: {:?} is not a leaf", seed);
            0
        };

        if selected > 0 || had_selection {
            self.touch();
            self.emit(SelectorEvent::SeedFillChanged {
                revision: self.revision,
                selected,
            });
        }
        debug!("seed fill from {:?}: {} leaves selected", seed, selected);
        selected
    }

    /// Breadth-first growth with a global visited set
    fn flood(&mut self, seed: TriangleId, rule: &FillRule, clip: Option<&FillClip>) -> usize {
        let mut visited = vec![false; self.triangles.len()];
        let mut queue = VecDeque::from([seed]);
        visited[seed.index()] = true;
        let mut selected = 0;

        while let Some(current) = queue.pop_front() {
            if clip.is_some_and(|c| c.clips(self.centroid(current))) {
                continue;
            }
            self.triangles[current.index()].selected_by_seed_fill = true;
            selected += 1;

            let normal = self.facet_normal(current);
            for next in self.touching_triangles(current) {
                if visited[next.index()] {
                    continue;
                }
                let tri = &self.triangles[next.index()];
                if rule.same_label.is_some_and(|label| tri.label != label)
                    || rule.facet.is_some_and(|facet| tri.source_facet != facet)
                {
                    continue;
                }
                // Not marked visited on rejection: another route may admit it
                if normal.dot(self.facet_normal(next)) < rule.cos_limit {
                    continue;
                }
                visited[next.index()] = true;
                queue.push_back(next);
            }
        }

        selected
    }

    /// Write `label` to every flagged leaf and clear the flags.
    /// Returns the number of leaves whose label changed.
    pub fn seed_fill_apply(&mut self, label: Label) -> usize {
        let mut changed = 0;
        let mut flagged = 0;
        for tri in &mut self.triangles {
            if tri.selected_by_seed_fill {
                tri.selected_by_seed_fill = false;
                flagged += 1;
                if tri.is_leaf() && tri.label != label {
                    tri.label = label;
                    changed += 1;
                }
            }
        }

        if flagged > 0 {
            self.touch();
            self.emit(SelectorEvent::LabelsChanged {
                revision: self.revision,
                changed,
            });
        }
        debug!("seed fill apply {}: {} of {} leaves changed", label, changed, flagged);
        changed
    }

    /// Clear the selection without labeling anything
    pub fn seed_fill_unselect_all(&mut self) {
        if self.clear_seed_fill_flags() > 0 {
            self.touch();
            self.emit(SelectorEvent::SeedFillChanged {
                revision: self.revision,
                selected: 0,
            });
        }
    }

    fn clear_seed_fill_flags(&mut self) -> usize {
        let mut cleared = 0;
        for tri in &mut self.triangles {
            if tri.selected_by_seed_fill {
                tri.selected_by_seed_fill = false;
                cleared += 1;
            }
        }
        cleared
    }

    /// Leaves currently flagged by seed fill
    pub fn seed_fill_selection(&self) -> Vec<TriangleId> {
        self.triangles
            .iter()
            .enumerate()
            .filter(|(_, tri)| tri.selected_by_seed_fill)
            .map(|(i, _)| TriangleId(i as u32))
            .collect()
    }

    /// Boundary segments between flagged and unflagged leaves.
    /// Mesh-boundary edges of the selection are not included.
    pub fn seed_fill_contour(&self) -> Vec<[VertexId; 2]> {
        let mut contour = Vec::new();
        for id in self.seed_fill_selection() {
            for shared in self.shared_edges(id) {
                if !self.triangles[shared.neighbor.index()].selected_by_seed_fill {
                    contour.push(shared.segment);
                }
            }
        }
        contour
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;
    use crate::types::MeshData;

    /// Two squares folded 90 degrees along x = 1: floor (z = 0) and wall (x = 1)
    fn folded() -> TriangleSelector {
        let mesh = MeshData::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(1.0, 1.0, 1.0),
            ],
            vec![[0, 1, 2], [0, 2, 3], [1, 4, 5], [1, 5, 2]],
        );
        TriangleSelector::from_mesh(&mesh).unwrap()
    }

    #[test]
    fn test_smart_fill_stops_at_crease() {
        let mut selector = folded();
        assert_eq!(selector.seed_fill_select(TriangleId(0), 0.5, None), 2);
        assert_eq!(selector.seed_fill_selection(), vec![TriangleId(0), TriangleId(1)]);

        // Wide enough to cross the fold
        assert_eq!(selector.seed_fill_select(TriangleId(0), FRAC_PI_2 + 0.01, None), 4);
    }

    #[test]
    fn test_zero_threshold_is_coplanar_only() {
        let mut selector = folded();
        assert_eq!(selector.seed_fill_select(TriangleId(2), 0.0, None), 2);
    }

    #[test]
    fn test_apply_and_unselect() {
        let mut selector = folded();
        selector.seed_fill_select(TriangleId(0), 0.1, None);
        assert_eq!(selector.seed_fill_apply(Label::ENFORCER), 2);
        assert!(selector.seed_fill_selection().is_empty());
        assert_eq!(selector.label_of_triangle(TriangleId(1)), Some(Label::ENFORCER));
        assert_eq!(selector.label_of_triangle(TriangleId(2)), Some(Label::NONE));

        selector.seed_fill_select(TriangleId(2), 0.1, None);
        selector.seed_fill_unselect_all();
        assert_eq!(selector.seed_fill_apply(Label::BLOCKER), 0);
        assert!(!selector.has_label(Label::BLOCKER));
    }

    #[test]
    fn test_bucket_fill_respects_label() {
        let mut selector = folded();
        selector.set_facet(1, Label::BLOCKER);
        // Unconstrained angle, but facet 1 carries another label
        assert_eq!(selector.bucket_fill_select(TriangleId(0), None, true, None), 3);
        assert!(!selector.seed_fill_selection().contains(&TriangleId(1)));
    }

    #[test]
    fn test_bucket_fill_without_propagation_stays_in_facet() {
        let mut selector = folded();
        selector.split(TriangleId(0), 0.1);
        let children = selector.triangle(TriangleId(0)).unwrap().children.unwrap();
        assert_eq!(selector.bucket_fill_select(children[0], None, false, None), 4);
    }

    #[test]
    fn test_clipped_triangles_are_not_filled() {
        let mut selector = folded();
        // Clip away everything with y > 0.5 (centroids of facets 1 and 3 are
        // there); facet 2 is only reachable through the clipped facet 3
        let clip = FillClip {
            plane: ClippingPlane::new(Vec3::NEG_Y, 0.5),
            transform: Affine3A::IDENTITY,
        };
        let selected = selector.bucket_fill_select(TriangleId(0), None, true, Some(&clip));
        assert_eq!(selected, 1);
        assert_eq!(selector.seed_fill_selection(), vec![TriangleId(0)]);
    }

    #[test]
    fn test_contour_surrounds_selection() {
        let mut selector = folded();
        selector.seed_fill_select(TriangleId(0), 0.1, None);
        let contour = selector.seed_fill_contour();
        // Floor meets the wall along the x = 1 edge of facet 0
        assert_eq!(contour.len(), 1);
        let a = selector.vertex(contour[0][0]).unwrap();
        let b = selector.vertex(contour[0][1]).unwrap();
        assert!((a.x - 1.0).abs() < 1e-6 && (b.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cos_limit() {
        assert_eq!(cos_limit(None), f32::NEG_INFINITY);
        assert_eq!(cos_limit(Some(PI)), f32::NEG_INFINITY);
        assert!((cos_limit(Some(0.0)) - (1.0 - COPLANAR_EPSILON)).abs() < 1e-7);
    }
}
