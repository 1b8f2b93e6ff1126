//! Interactive paint session
//!
//! This module connects:
//! - Gesture events (already resolved to world-space hits by the caller)
//! - Tool settings (cursor kind, radius, fill angle, gap area)
//! - The triangle selector (painting, fills, gap fill)
//! - Undo/redo history built from selector snapshots
//!
//! The session does not depend on any windowing or rendering layer.

mod gesture;
mod stroke;
mod tool;
mod transform;
mod undo;

use facetpaint_config::PaintConfig;
use glam::{Affine3A, Vec3};

use crate::fill::FillClip;
use crate::geometry::{self, ClippingPlane};
use crate::selector::{MeshError, TriangleSelector};
use crate::types::{MeshData, TriangleId};

pub use gesture::{GestureEvent, GestureOutcome, PointerSample};
pub use stroke::ActiveStroke;
pub use tool::{ToolKind, ToolSettings};
pub use transform::{MeshTransform, TransformFn};
pub use undo::UndoEntry;

/// Paint session for one mesh instance
///
/// Workflow:
/// 1. Gestures come in via [`PaintSession::handle`] (or the stroke methods)
/// 2. The active tool turns each sample into a cursor or a fill seed
/// 3. The selector is refined and relabeled
/// 4. Finished strokes leave an undo entry with the pre-stroke snapshot
#[derive(Debug)]
pub struct PaintSession {
    pub(crate) selector: TriangleSelector,
    pub(crate) config: PaintConfig,
    pub(crate) settings: ToolSettings,
    /// Active scene clipping plane, in world space
    pub(crate) clipping: Option<ClippingPlane>,
    /// Stroke in progress (None when idle)
    pub(crate) stroke: Option<ActiveStroke>,
    pub(crate) next_stroke_id: u64,
    /// Undo stack (most recent at end)
    pub(crate) undo_stack: Vec<UndoEntry>,
    /// Redo stack (most recent at end)
    pub(crate) redo_stack: Vec<UndoEntry>,
}

impl PaintSession {
    pub fn new(selector: TriangleSelector, config: PaintConfig) -> Self {
        let settings = ToolSettings::from_config(&config);
        Self {
            selector,
            config,
            settings,
            clipping: None,
            stroke: None,
            next_stroke_id: 1,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    /// Build the selector for `mesh` using the subdivision limits of `config`
    pub fn from_mesh(mesh: &MeshData, config: PaintConfig) -> Result<Self, MeshError> {
        let selector = TriangleSelector::new(mesh, config.subdivision)?;
        Ok(Self::new(selector, config))
    }

    pub fn selector(&self) -> &TriangleSelector {
        &self.selector
    }

    /// Mutable selector access, e.g. to register listeners.
    /// Changes made here bypass the undo history.
    pub fn selector_mut(&mut self) -> &mut TriangleSelector {
        &mut self.selector
    }

    pub fn config(&self) -> &PaintConfig {
        &self.config
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    /// Replace the tool settings, clamped to the configured limits
    pub fn set_settings(&mut self, mut settings: ToolSettings) {
        settings.clamp_to(&self.config);
        self.settings = settings;
    }

    pub fn clipping(&self) -> Option<ClippingPlane> {
        self.clipping
    }

    pub fn set_clipping(&mut self, plane: Option<ClippingPlane>) {
        self.clipping = plane;
    }

    pub(crate) fn fill_clip(&self, transform: Affine3A) -> Option<FillClip> {
        self.clipping.map(|plane| FillClip { plane, transform })
    }

    /// Leaf under a world-space hit point, if the mesh is within
    /// `cursor_radius` of it in world units
    pub(crate) fn seed_at(&self, world: Vec3, transform: Affine3A) -> Option<TriangleId> {
        let local = transform.inverse().transform_point3(world);
        let leaf = self.selector.locate(local)?;
        let [a, b, c] = self
            .selector
            .triangle_positions(leaf)
            .map(|corner| transform.transform_point3(corner));
        let closest = geometry::closest_point_on_triangle(world, a, b, c);
        (world.distance(closest) <= self.settings.cursor_radius).then_some(leaf)
    }
}
