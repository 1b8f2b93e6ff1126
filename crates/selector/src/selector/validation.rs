//! Structural validation of the arena.

use super::TriangleSelector;
use crate::constants::AREA_RELATIVE_TOLERANCE;
use crate::types::TriangleId;

/// Broken internal invariant found by [`TriangleSelector::validate`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConsistencyError {
    #[error("Child {child:?} does not point back to parent {parent:?}")]
    ChildParentMismatch { parent: TriangleId, child: TriangleId },
    #[error("Child {child:?} has depth {found}, expected {expected}")]
    DepthMismatch {
        child: TriangleId,
        expected: u8,
        found: u8,
    },
    #[error("Leaves of facet {facet} cover area {found}, expected {expected}")]
    AreaMismatch {
        facet: u32,
        expected: f32,
        found: f32,
    },
    #[error("Adjacency reported split triangle {0:?} as touching")]
    SplitTouching(TriangleId),
    #[error("{from:?} touches {to:?} but not the reverse")]
    AsymmetricAdjacency { from: TriangleId, to: TriangleId },
}

impl TriangleSelector {
    /// Check hierarchy links, area preservation and adjacency symmetry.
    ///
    /// Walks every leaf's adjacency, so this is meant for tests and debug
    /// tooling rather than per-gesture use.
    pub fn validate(&self) -> Result<(), ConsistencyError> {
        for (index, tri) in self.triangles.iter().enumerate() {
            let parent = TriangleId(index as u32);
            let Some(children) = tri.children else {
                continue;
            };
            for child in children {
                let child_tri = &self.triangles[child.index()];
                if child_tri.parent != Some(parent) {
                    return Err(ConsistencyError::ChildParentMismatch { parent, child });
                }
                if child_tri.depth != tri.depth + 1 {
                    return Err(ConsistencyError::DepthMismatch {
                        child,
                        expected: tri.depth + 1,
                        found: child_tri.depth,
                    });
                }
            }
        }

        for facet in 0..self.facet_count {
            let expected = self.area(TriangleId(facet));
            let found = self.leaf_area(TriangleId(facet));
            if (expected - found).abs() > AREA_RELATIVE_TOLERANCE * expected.max(1.0) {
                return Err(ConsistencyError::AreaMismatch {
                    facet,
                    expected,
                    found,
                });
            }
        }

        for leaf in self.leaf_ids() {
            for other in self.touching_triangles(leaf) {
                if self.triangles[other.index()].is_split() {
                    return Err(ConsistencyError::SplitTouching(other));
                }
                if !self.touching_triangles(other).contains(&leaf) {
                    return Err(ConsistencyError::AsymmetricAdjacency {
                        from: leaf,
                        to: other,
                    });
                }
            }
        }

        Ok(())
    }
}
