//! Line segments for region outlines and the seed-fill contour

use glam::Vec3;
use selector::{PatchSet, TriangleSelector, VertexId};

fn segment_positions(selector: &TriangleSelector, [a, b]: [VertexId; 2]) -> Option<[Vec3; 2]> {
    Some([selector.vertex(a)?, selector.vertex(b)?])
}

/// Edges between leaves whose effective labels differ.
///
/// Each shared segment is emitted once, from the side with the lower id.
pub fn outline_edges(selector: &TriangleSelector, patches: &PatchSet) -> Vec<[Vec3; 2]> {
    let mut lines = Vec::new();
    for leaf in selector.leaf_ids() {
        let label = patches.effective_label_of(leaf);
        for shared in selector.shared_edges(leaf) {
            if shared.neighbor <= leaf || patches.effective_label_of(shared.neighbor) == label {
                continue;
            }
            lines.extend(segment_positions(selector, shared.segment));
        }
    }
    lines
}

/// Seed-fill contour as positioned line segments
pub fn seed_fill_contour_lines(selector: &TriangleSelector) -> Vec<[Vec3; 2]> {
    selector
        .seed_fill_contour()
        .into_iter()
        .filter_map(|segment| segment_positions(selector, segment))
        .collect()
}
