//! Stroke handling for the paint session

use glam::Affine3A;
use tracing::{debug, error, trace};

use super::{MeshTransform, PaintSession, PointerSample, ToolKind, UndoEntry};
use crate::cursor::{Cursor, CursorKind};
use crate::patch::PatchSet;
use crate::snapshot::SelectorSnapshot;
use crate::types::Label;

/// State of a stroke between press and release
#[derive(Debug, Clone)]
pub struct ActiveStroke {
    pub(crate) id: u64,
    pub(crate) label: Label,
    /// Selector state before the stroke, for undo and cancel
    pub(crate) before: SelectorSnapshot,
    pub(crate) last_sample: Option<PointerSample>,
    /// Leaves relabeled so far
    pub(crate) changed: usize,
}

impl ActiveStroke {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn changed(&self) -> usize {
        self.changed
    }
}

impl PaintSession {
    /// Begin a stroke painting `label`; an unfinished stroke is ended first
    pub fn begin_stroke(&mut self, label: Label) -> u64 {
        if self.stroke.is_some() {
            debug!("begin_stroke: ending unfinished stroke");
            self.end_stroke();
        }

        let id = self.next_stroke_id;
        self.next_stroke_id += 1;
        self.stroke = Some(ActiveStroke {
            id,
            label,
            before: self.selector.snapshot(),
            last_sample: None,
            changed: 0,
        });
        debug!("Stroke {} started with label {}", id, label);
        id
    }

    /// Continue the stroke at a new world-space sample.
    ///
    /// Returns the number of leaves relabeled by this sample.
    pub fn stroke_to<T>(&mut self, sample: PointerSample, transform: &T) -> usize
    where
        T: MeshTransform + ?Sized,
    {
        let Some(stroke) = self.stroke.as_ref() else {
            debug!("stroke_to: no active stroke, ignoring");
            return 0;
        };
        let (label, previous) = (stroke.label, stroke.last_sample);

        let changed = self.apply_tool(label, sample, previous, transform.mesh_to_world());
        if let Some(stroke) = self.stroke.as_mut() {
            stroke.last_sample = Some(sample);
            stroke.changed += changed;
        }
        changed
    }

    /// End the stroke, recording an undo entry when anything changed.
    ///
    /// Returns true if an undo entry was recorded.
    pub fn end_stroke(&mut self) -> bool {
        let Some(stroke) = self.stroke.take() else {
            return false;
        };
        self.selector.seed_fill_unselect_all();

        if self.selector.snapshot() == stroke.before {
            debug!("Stroke {} left the selector unchanged", stroke.id);
            return false;
        }

        self.push_undo(UndoEntry {
            stroke_id: stroke.id,
            snapshot: stroke.before,
        });
        self.redo_stack.clear();
        debug!(
            "Saved undo entry for stroke {} ({} leaves relabeled, {} entries)",
            stroke.id,
            stroke.changed,
            self.undo_stack.len()
        );
        true
    }

    /// Abort the stroke and restore the pre-stroke state
    pub fn cancel_stroke(&mut self) -> bool {
        let Some(stroke) = self.stroke.take() else {
            return false;
        };
        if !self.selector.restore_or_reset(&stroke.before) {
            error!("Stroke {} could not be rolled back; paint was reset", stroke.id);
        }
        debug!("Stroke {} cancelled", stroke.id);
        true
    }

    /// Check if a stroke is currently in progress
    pub fn is_stroking(&self) -> bool {
        self.stroke.is_some()
    }

    pub fn active_stroke(&self) -> Option<&ActiveStroke> {
        self.stroke.as_ref()
    }

    /// Run the active tool for one sample
    pub(crate) fn apply_tool(
        &mut self,
        label: Label,
        sample: PointerSample,
        previous: Option<PointerSample>,
        transform: Affine3A,
    ) -> usize {
        let settings = self.settings.clone();
        match (settings.tool, settings.cursor) {
            (ToolKind::Brush, CursorKind::Sphere | CursorKind::Circle) => {
                let radius = settings.cursor_radius;
                let cursor = match previous {
                    Some(prev) => Cursor::double_point(
                        settings.cursor,
                        prev.position,
                        sample.position,
                        radius,
                        sample.view_direction,
                        transform,
                    ),
                    None => Cursor::single_point(
                        settings.cursor,
                        sample.position,
                        radius,
                        sample.view_direction,
                        transform,
                    ),
                };
                let edge_limit = self.config.subdivision.edge_limit_for_radius(radius);
                self.paint_with(cursor, label, edge_limit)
            }
            (ToolKind::Brush, CursorKind::HeightRange) => {
                let half = settings.height_range * 0.5;
                let z = sample.position.z;
                let cursor = Cursor::height_range(z - half, z + half, transform);
                let edge_limit = self
                    .config
                    .subdivision
                    .edge_limit_for_radius(settings.height_range);
                self.paint_with(cursor, label, edge_limit)
            }
            (ToolKind::Brush, CursorKind::Pointer) | (ToolKind::SmartFill | ToolKind::BucketFill, _) => {
                match self.select_fill(sample, transform) {
                    Some(selected) if selected > 0 => self.selector.seed_fill_apply(label),
                    _ => 0,
                }
            }
            (ToolKind::GapFill, _) => {
                if previous.is_some() {
                    return 0;
                }
                let patches = PatchSet::build(&self.selector, settings.gap_area);
                patches.finalize(&mut self.selector)
            }
        }
    }

    fn paint_with(&mut self, cursor: Option<Cursor>, label: Label, edge_limit: f32) -> usize {
        let Some(cursor) = cursor else {
            debug!("paint ignored: degenerate cursor");
            return 0;
        };
        let cursor = cursor.with_clipping(self.clipping);
        self.selector.paint(&cursor, label, edge_limit)
    }

    /// Flag the fill region of the active tool under `sample` without
    /// labeling it. Returns None when the tool does not seed-fill.
    pub(crate) fn select_fill(&mut self, sample: PointerSample, transform: Affine3A) -> Option<usize> {
        if !self.settings.uses_seed_fill() {
            return None;
        }
        let Some(seed) = self.seed_at(sample.position, transform) else {
            trace!("fill ignored: no mesh under {:?}", sample.position);
            self.selector.seed_fill_unselect_all();
            return Some(0);
        };

        let clip = self.fill_clip(transform);
        let clip = clip.as_ref();
        let angle = self.settings.smart_fill_angle();
        let selected = match self.settings.tool {
            ToolKind::SmartFill => self.selector.seed_fill_select(seed, angle, clip),
            ToolKind::BucketFill => self.selector.bucket_fill_select(seed, Some(angle), true, clip),
            // Pointer brush fills the seed's facet region
            ToolKind::Brush | ToolKind::GapFill => {
                self.selector.bucket_fill_select(seed, None, false, clip)
            }
        };
        Some(selected)
    }
}
