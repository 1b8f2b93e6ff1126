//! Triangle arena with paint labels and a midpoint subdivision hierarchy.
//!
//! The level-0 facets of the input mesh occupy ids `0..facet_count` for the
//! whole lifetime of the selector. Splitting appends four children per
//! triangle; neighbor relations are never stored, they are derived on
//! demand from the level-0 facet adjacency and the split hierarchy.

mod adjacency;
mod construction;
mod query;
mod subdivision;
mod types;
mod validation;

use std::collections::HashMap;

use facetpaint_config::SubdivisionConfig;
use glam::Vec3;

use crate::events::SelectorEvent;
use crate::geometry::Aabb;

pub use adjacency::SharedEdge;
pub use query::RayHit;
pub use types::{MeshError, Triangle};
pub use validation::ConsistencyError;

use crate::types::{TriangleId, VertexId};

type Listener = Box<dyn Fn(&SelectorEvent) + Send + Sync>;

/// Handle for removing a listener registered with
/// [`TriangleSelector::add_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Paint-selection state for one mesh instance.
///
/// All operations are synchronous. The selector is `Send` so it can be
/// moved to another thread, but a single instance must not be used from
/// two threads at once without external locking.
pub struct TriangleSelector {
    /// Vertex positions; level-0 vertices first, split midpoints appended
    pub(crate) vertices: Vec<Vec3>,
    /// Triangle arena; level-0 facets first, split children appended
    pub(crate) triangles: Vec<Triangle>,
    /// Number of level-0 facets
    pub(crate) facet_count: u32,
    /// Number of (welded) level-0 vertices
    pub(crate) base_vertex_count: usize,
    /// Neighbor facet across each edge of each level-0 facet
    pub(crate) facet_neighbors: Vec<[Option<TriangleId>; 3]>,
    /// Unit normal of each level-0 facet (shared by all its descendants)
    pub(crate) facet_normals: Vec<Vec3>,
    /// Shared edge midpoints, keyed by the ordered endpoint pair
    pub(crate) midpoints: HashMap<(VertexId, VertexId), VertexId>,
    /// Bounding box of the level-0 mesh in local space
    pub(crate) bounds: Aabb,
    pub(crate) config: SubdivisionConfig,
    /// Advances on every change visible to queries or renderers
    pub(crate) revision: u64,
    /// Advances when the arena is rebuilt (reset / restore)
    pub(crate) generation: u32,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl std::fmt::Debug for TriangleSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriangleSelector")
            .field("facet_count", &self.facet_count)
            .field("triangle_count", &self.triangles.len())
            .field("vertex_count", &self.vertices.len())
            .field("revision", &self.revision)
            .field("generation", &self.generation)
            .field("listener_count", &self.listeners.len())
            .finish()
    }
}

impl TriangleSelector {
    /// Subdivision tunables in effect
    pub fn config(&self) -> &SubdivisionConfig {
        &self.config
    }

    /// Change counter; advances on every labeling, split or seed-fill change
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Arena generation; advances on `reset` and `restore`
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Register a listener notified after every state-changing operation.
    ///
    /// Listeners are how the render layer learns that its patches are stale.
    pub fn add_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&SelectorEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Unregister a listener; returns false for unknown ids
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub(crate) fn emit(&self, event: SelectorEvent) {
        for (_, listener) in &self.listeners {
            listener(&event);
        }
    }

    /// Record a change without notifying listeners
    #[inline]
    pub(crate) fn touch(&mut self) {
        self.revision += 1;
    }

    /// Drop every split child and label, returning to the unpainted level-0 mesh
    pub fn reset(&mut self) {
        self.clear_to_level0();
        self.generation += 1;
        self.touch();
        tracing::info!(
            "TriangleSelector reset: {} facets, generation {}",
            self.facet_count,
            self.generation
        );
        self.emit(SelectorEvent::Reset {
            generation: self.generation,
        });
    }

    pub(crate) fn clear_to_level0(&mut self) {
        self.triangles.truncate(self.facet_count as usize);
        self.vertices.truncate(self.base_vertex_count);
        self.midpoints.clear();
        for tri in &mut self.triangles {
            tri.children = None;
            tri.label = crate::types::Label::NONE;
            tri.selected_by_seed_fill = false;
        }
    }
}
