//! Brush painting and whole-facet labeling.

use glam::{Affine3A, Vec3};
use tracing::{debug, trace};

use crate::cursor::Cursor;
use crate::events::SelectorEvent;
use crate::geometry::triangle_normal;
use crate::selector::TriangleSelector;
use crate::types::{Label, TriangleId};

impl TriangleSelector {
    /// Label everything inside the cursor, refining triangles that the
    /// cursor boundary crosses down to `edge_limit`.
    ///
    /// Leaves that can no longer split are labeled when their centroid is
    /// inside the cursor. Returns the number of leaves whose label changed.
    pub fn paint(&mut self, cursor: &Cursor, label: Label, edge_limit: f32) -> usize {
        if cursor.misses_bounds(&self.bounds) {
            debug!("paint ignored: cursor outside mesh bounds");
            return 0;
        }

        let revision = self.revision;
        let mut changed = 0;
        for facet in 0..self.facet_count {
            let id = TriangleId(facet);
            if !cursor.faces_triangle(self.triangle_positions(id)) {
                continue;
            }
            changed += self.paint_recursive(id, cursor, label, edge_limit);
        }

        if changed > 0 {
            self.touch();
        }
        if self.revision != revision {
            self.emit(SelectorEvent::LabelsChanged {
                revision: self.revision,
                changed,
            });
        }
        debug!(
            "paint {}: {} leaves changed, {} triangles total",
            label,
            changed,
            self.triangles.len()
        );
        changed
    }

    fn paint_recursive(
        &mut self,
        id: TriangleId,
        cursor: &Cursor,
        label: Label,
        edge_limit: f32,
    ) -> usize {
        let corners = self.triangle_positions(id);
        if !cursor.touches_triangle(corners) {
            return 0;
        }
        if cursor.covers_triangle(corners) {
            return self.label_subtree(id, label);
        }

        if self.triangles[id.index()].is_leaf() && !self.split(id, edge_limit) {
            return if cursor.contains_point(self.centroid(id)) {
                usize::from(self.set_leaf_label(id, label))
            } else {
                0
            };
        }

        let Some(children) = self.triangles[id.index()].children else {
            return 0;
        };
        children
            .into_iter()
            .map(|child| self.paint_recursive(child, cursor, label, edge_limit))
            .sum()
    }

    /// Leaves the cursor reaches, without modifying anything
    pub fn hit_triangles(&self, cursor: &Cursor) -> Vec<TriangleId> {
        let mut hits = Vec::new();
        if cursor.misses_bounds(&self.bounds) {
            return hits;
        }
        let mut stack: Vec<TriangleId> = (0..self.facet_count)
            .rev()
            .map(TriangleId)
            .filter(|&id| cursor.faces_triangle(self.triangle_positions(id)))
            .collect();
        while let Some(id) = stack.pop() {
            if !cursor.touches_triangle(self.triangle_positions(id)) {
                continue;
            }
            match self.triangles[id.index()].children {
                Some(children) => stack.extend(children.into_iter().rev()),
                None => hits.push(id),
            }
        }
        hits
    }

    /// Set the label of every leaf of a level-0 facet.
    /// Returns the number of leaves whose label changed.
    pub fn set_facet(&mut self, facet: u32, label: Label) -> usize {
        if facet >= self.facet_count {
            trace!("set_facet ignored: invalid facet {}", facet);
            return 0;
        }
        let changed = self.label_subtree(TriangleId(facet), label);
        if changed > 0 {
            self.touch();
            self.emit(SelectorEvent::LabelsChanged {
                revision: self.revision,
                changed,
            });
        }
        changed
    }

    /// Label level-0 facets whose world normal lies within `threshold`
    /// radians of `down`, e.g. overhangs that need support.
    pub fn paint_overhangs(
        &mut self,
        transform: &Affine3A,
        down: Vec3,
        threshold: f32,
        label: Label,
    ) -> usize {
        let Some(down) = down.try_normalize() else {
            debug!("paint_overhangs ignored: zero down direction");
            return 0;
        };
        let cos_limit = threshold.cos();

        let mut changed = 0;
        for facet in 0..self.facet_count {
            let id = TriangleId(facet);
            let [a, b, c] = self.triangle_positions(id).map(|p| transform.transform_point3(p));
            let normal = triangle_normal(a, b, c);
            if normal != Vec3::ZERO && normal.dot(down) >= cos_limit {
                changed += self.label_subtree(id, label);
            }
        }

        if changed > 0 {
            self.touch();
            self.emit(SelectorEvent::LabelsChanged {
                revision: self.revision,
                changed,
            });
        }
        debug!("paint_overhangs {}: {} leaves changed", label, changed);
        changed
    }

    /// Label every leaf below `id`; returns how many changed
    pub(crate) fn label_subtree(&mut self, id: TriangleId, label: Label) -> usize {
        let mut changed = 0;
        for leaf in self.leaves_of(id) {
            changed += usize::from(self.set_leaf_label(leaf, label));
        }
        changed
    }

    pub(crate) fn set_leaf_label(&mut self, id: TriangleId, label: Label) -> bool {
        let tri = &mut self.triangles[id.index()];
        if tri.label == label {
            return false;
        }
        tri.label = label;
        true
    }
}
