//! Lazily rebuilt render data for one selector.
//!
//! Patch buffers are only rebuilt when labels or splits changed; seed-fill
//! preview buffers follow every selection change. Change notification comes
//! from a selector listener that raises shared dirty flags.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use glam::Vec3;
use selector::{ListenerId, PatchSet, SelectorEvent, TriangleSelector};
use tracing::{debug, trace, warn};

use crate::buffers::{PatchMesh, RenderPatch, build_render_patches};
use crate::outline::{outline_edges, seed_fill_contour_lines};

#[derive(Debug, Default)]
struct DirtyFlags {
    patches: AtomicBool,
    preview: AtomicBool,
}

/// Render data cache for a [`TriangleSelector`]
#[derive(Debug)]
pub struct PatchRenderer {
    dirty: Arc<DirtyFlags>,
    /// Listener registered on the selector this renderer follows
    listener: Option<ListenerId>,
    gap_area: f32,
    /// Selector (revision, generation) of the last rebuild
    built_at: Option<(u64, u32)>,
    patches: Vec<RenderPatch>,
    outline: Vec<[Vec3; 2]>,
    preview: PatchMesh,
    contour: Vec<[Vec3; 2]>,
}

impl PatchRenderer {
    pub fn new(gap_area: f32) -> Self {
        Self {
            dirty: Arc::new(DirtyFlags::default()),
            listener: None,
            gap_area,
            built_at: None,
            patches: Vec::new(),
            outline: Vec::new(),
            preview: PatchMesh::new(),
            contour: Vec::new(),
        }
    }

    /// Register a listener on `selector` that marks this renderer dirty.
    ///
    /// A renderer follows one selector; returns false if already attached.
    pub fn attach(&mut self, selector: &mut TriangleSelector) -> bool {
        if self.listener.is_some() {
            warn!("PatchRenderer already attached; detach first");
            return false;
        }
        let dirty = Arc::clone(&self.dirty);
        let id = selector.add_listener(move |event: &SelectorEvent| {
            if event.invalidates_patches() {
                dirty.patches.store(true, Ordering::SeqCst);
            }
            dirty.preview.store(true, Ordering::SeqCst);
        });
        self.listener = Some(id);
        true
    }

    /// Remove the listener registered by [`Self::attach`].
    /// The renderer falls back to polling the selector revision.
    pub fn detach(&mut self, selector: &mut TriangleSelector) -> bool {
        let Some(id) = self.listener.take() else {
            return false;
        };
        selector.remove_listener(id)
    }

    pub fn is_attached(&self) -> bool {
        self.listener.is_some()
    }

    pub fn gap_area(&self) -> f32 {
        self.gap_area
    }

    /// Change the gap area used for effective labels
    pub fn set_gap_area(&mut self, gap_area: f32) {
        if gap_area != self.gap_area {
            self.gap_area = gap_area;
            self.dirty.patches.store(true, Ordering::SeqCst);
        }
    }

    /// Whether the next [`Self::update`] would rebuild anything
    pub fn needs_update(&self, selector: &TriangleSelector) -> bool {
        self.dirty.patches.load(Ordering::SeqCst)
            || self.dirty.preview.load(Ordering::SeqCst)
            || self.is_out_of_date(selector)
    }

    fn is_out_of_date(&self, selector: &TriangleSelector) -> bool {
        match self.built_at {
            None => true,
            Some((revision, generation)) => {
                generation != selector.generation()
                    || (self.listener.is_none() && revision != selector.revision())
            }
        }
    }

    /// Rebuild whatever changed since the last call.
    ///
    /// Returns true if any buffer was rebuilt.
    pub fn update(&mut self, selector: &TriangleSelector) -> bool {
        let out_of_date = self.is_out_of_date(selector);
        let rebuild_patches = self.dirty.patches.swap(false, Ordering::SeqCst) || out_of_date;
        let rebuild_preview = self.dirty.preview.swap(false, Ordering::SeqCst) || out_of_date;

        if rebuild_patches {
            let set = PatchSet::build(selector, self.gap_area);
            self.patches = build_render_patches(selector, &set);
            self.outline = outline_edges(selector, &set);
            debug!(
                "Rebuilt {} render patches ({} outline segments)",
                self.patches.len(),
                self.outline.len()
            );
        }
        if rebuild_preview {
            self.preview = PatchMesh::from_triangles(selector, selector.seed_fill_selection());
            self.contour = seed_fill_contour_lines(selector);
            trace!("Rebuilt seed-fill preview: {} triangles", self.preview.triangle_count());
        }

        self.built_at = Some((selector.revision(), selector.generation()));
        rebuild_patches || rebuild_preview
    }

    pub fn patches(&self) -> &[RenderPatch] {
        &self.patches
    }

    pub fn outline(&self) -> &[[Vec3; 2]] {
        &self.outline
    }

    pub fn preview(&self) -> &PatchMesh {
        &self.preview
    }

    pub fn contour(&self) -> &[[Vec3; 2]] {
        &self.contour
    }
}
