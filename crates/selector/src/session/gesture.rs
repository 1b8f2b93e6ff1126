//! Gesture dispatch for the paint session
//!
//! The host resolves pointer input to world-space surface hits before
//! handing events over; nothing here knows about windows or cameras.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{MeshTransform, PaintSession, ToolKind};
use crate::cursor::CursorKind;
use crate::geometry::ClippingPlane;
use crate::types::Label;

/// A pointer position on the mesh surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    /// Hit point in world space
    pub position: Vec3,
    /// Camera view direction in world space
    pub view_direction: Vec3,
}

impl PointerSample {
    pub fn new(position: Vec3, view_direction: Vec3) -> Self {
        Self {
            position,
            view_direction,
        }
    }
}

/// Input delivered to [`PaintSession::handle`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    /// Button down on the mesh with the label bound to that button
    Press { sample: PointerSample, label: u8 },
    Drag { sample: PointerSample },
    Release,
    /// Abort the stroke (e.g. escape key or focus loss)
    Cancel,
    /// Pointer moved without a button held; None when off the mesh
    Hover { sample: Option<PointerSample> },
    Wheel { steps: i32 },
    SetCursor(CursorKind),
    SetTool(ToolKind),
    SetClipping(Option<ClippingPlane>),
}

/// What a gesture did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    Ignored,
    Painted { changed: usize },
    Previewed { selected: usize },
    SettingsChanged,
    StrokeFinished { recorded: bool },
    StrokeCancelled,
}

impl PaintSession {
    /// Handle one gesture with the instance's current mesh-to-world transform
    pub fn handle<T>(&mut self, event: GestureEvent, transform: &T) -> GestureOutcome
    where
        T: MeshTransform + ?Sized,
    {
        trace!("gesture {:?}", event);
        match event {
            GestureEvent::Press { sample, label } => {
                let Some(label) = Label::new(label) else {
                    debug!("Press ignored: invalid label {}", label);
                    return GestureOutcome::Ignored;
                };
                self.selector.seed_fill_unselect_all();
                self.begin_stroke(label);
                let changed = self.stroke_to(sample, transform);
                GestureOutcome::Painted { changed }
            }
            GestureEvent::Drag { sample } => {
                if !self.is_stroking() {
                    return GestureOutcome::Ignored;
                }
                let changed = self.stroke_to(sample, transform);
                GestureOutcome::Painted { changed }
            }
            GestureEvent::Release => {
                if !self.is_stroking() {
                    return GestureOutcome::Ignored;
                }
                let recorded = self.end_stroke();
                GestureOutcome::StrokeFinished { recorded }
            }
            GestureEvent::Cancel => {
                if self.cancel_stroke() {
                    GestureOutcome::StrokeCancelled
                } else {
                    GestureOutcome::Ignored
                }
            }
            GestureEvent::Hover { sample } => {
                if self.is_stroking() {
                    return GestureOutcome::Ignored;
                }
                let selected = match sample {
                    Some(sample) => {
                        match self.select_fill(sample, transform.mesh_to_world()) {
                            Some(selected) => selected,
                            None => return GestureOutcome::Ignored,
                        }
                    }
                    None => {
                        self.selector.seed_fill_unselect_all();
                        0
                    }
                };
                GestureOutcome::Previewed { selected }
            }
            GestureEvent::Wheel { steps } => {
                if self.settings.apply_wheel(steps, &self.config) {
                    GestureOutcome::SettingsChanged
                } else {
                    GestureOutcome::Ignored
                }
            }
            GestureEvent::SetCursor(kind) => {
                if self.settings.cursor == kind {
                    return GestureOutcome::Ignored;
                }
                self.settings.cursor = kind;
                self.selector.seed_fill_unselect_all();
                GestureOutcome::SettingsChanged
            }
            GestureEvent::SetTool(tool) => {
                if self.settings.tool == tool {
                    return GestureOutcome::Ignored;
                }
                self.settings.tool = tool;
                self.selector.seed_fill_unselect_all();
                GestureOutcome::SettingsChanged
            }
            GestureEvent::SetClipping(plane) => {
                self.set_clipping(plane);
                GestureOutcome::SettingsChanged
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use facetpaint_config::PaintConfig;
    use glam::Affine3A;

    use super::*;
    use crate::session::ToolSettings;
    use crate::types::{MeshData, TriangleId};

    fn session() -> PaintSession {
        let mesh = MeshData::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(10.0, 0.0, 0.0),
                Vec3::new(10.0, 10.0, 0.0),
                Vec3::new(0.0, 10.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        );
        PaintSession::from_mesh(&mesh, PaintConfig::default()).unwrap()
    }

    fn at(x: f32, y: f32) -> PointerSample {
        PointerSample::new(Vec3::new(x, y, 0.0), Vec3::NEG_Z)
    }

    #[test]
    fn test_press_drag_release() {
        let mut session = session();
        let id = Affine3A::IDENTITY;
        let outcome = session.handle(
            GestureEvent::Press {
                sample: at(7.0, 2.0),
                label: 1,
            },
            &id,
        );
        assert!(matches!(outcome, GestureOutcome::Painted { changed } if changed > 0));
        session.handle(GestureEvent::Drag { sample: at(7.0, 4.0) }, &id);
        assert_eq!(
            session.handle(GestureEvent::Release, &id),
            GestureOutcome::StrokeFinished { recorded: true }
        );
        assert_eq!(session.handle(GestureEvent::Release, &id), GestureOutcome::Ignored);
        assert!(session.can_undo());
    }

    #[test]
    fn test_invalid_label_is_ignored() {
        let mut session = session();
        let outcome = session.handle(
            GestureEvent::Press {
                sample: at(5.0, 5.0),
                label: Label::MAX + 1,
            },
            &Affine3A::IDENTITY,
        );
        assert_eq!(outcome, GestureOutcome::Ignored);
        assert!(!session.is_stroking());
        assert!(!session.selector().has_any_label());
    }

    #[test]
    fn test_transform_moves_the_brush() {
        let mut session = session();
        // Mesh translated by +100 in x; the hit point is in world space
        let transform = Affine3A::from_translation(Vec3::new(100.0, 0.0, 0.0));
        session.handle(
            GestureEvent::Press {
                sample: at(107.0, 2.0),
                label: 2,
            },
            &transform,
        );
        session.handle(GestureEvent::Release, &transform);
        assert_eq!(
            session.selector().label_of_point(Vec3::new(7.0, 2.0, 0.0)),
            Some(Label::BLOCKER)
        );
    }

    #[test]
    fn test_hover_previews_fill() {
        let mut session = session();
        let id = Affine3A::IDENTITY;
        // Brush with a sphere cursor has nothing to preview
        assert_eq!(
            session.handle(GestureEvent::Hover { sample: Some(at(5.0, 1.0)) }, &id),
            GestureOutcome::Ignored
        );

        session.handle(GestureEvent::SetTool(ToolKind::SmartFill), &id);
        assert_eq!(
            session.handle(GestureEvent::Hover { sample: Some(at(5.0, 1.0)) }, &id),
            GestureOutcome::Previewed { selected: 2 }
        );
        assert_eq!(session.selector().seed_fill_selection().len(), 2);
        // Preview does not label anything
        assert!(!session.selector().has_any_label());

        assert_eq!(
            session.handle(GestureEvent::Hover { sample: None }, &id),
            GestureOutcome::Previewed { selected: 0 }
        );
        assert!(session.selector().seed_fill_selection().is_empty());
    }

    #[test]
    fn test_cancel_discards_stroke() {
        let mut session = session();
        let id = Affine3A::IDENTITY;
        session.handle(
            GestureEvent::Press {
                sample: at(2.0, 7.0),
                label: 1,
            },
            &id,
        );
        assert_eq!(session.handle(GestureEvent::Cancel, &id), GestureOutcome::StrokeCancelled);
        assert!(!session.selector().has_any_label());
        assert!(!session.can_undo());
        assert_eq!(session.handle(GestureEvent::Cancel, &id), GestureOutcome::Ignored);
    }

    #[test]
    fn test_wheel_and_settings() {
        let mut session = session();
        let id = Affine3A::IDENTITY;
        let radius = session.settings().cursor_radius;
        assert_eq!(
            session.handle(GestureEvent::Wheel { steps: 1 }, &id),
            GestureOutcome::SettingsChanged
        );
        assert!(session.settings().cursor_radius > radius);

        session.handle(GestureEvent::SetCursor(CursorKind::Pointer), &id);
        assert_eq!(session.handle(GestureEvent::Wheel { steps: 1 }, &id), GestureOutcome::Ignored);
        assert_eq!(
            session.handle(GestureEvent::SetCursor(CursorKind::Pointer), &id),
            GestureOutcome::Ignored
        );

        let plane = ClippingPlane::new(Vec3::X, 0.0);
        session.handle(GestureEvent::SetClipping(Some(plane)), &id);
        assert_eq!(session.clipping(), Some(plane));
    }

    #[test]
    fn test_gap_fill_press_merges_fragments() {
        let mut session = session();
        let id = Affine3A::IDENTITY;
        session.selector_mut().set_facet(0, Label::ENFORCER);
        // A small blocker dab inside the enforcer facet
        session.set_settings(ToolSettings {
            cursor_radius: 0.5,
            ..ToolSettings::default()
        });
        session.handle(
            GestureEvent::Press {
                sample: at(7.0, 2.0),
                label: 2,
            },
            &id,
        );
        session.handle(GestureEvent::Release, &id);
        assert!(session.selector().has_label(Label::BLOCKER));

        session.set_settings(ToolSettings {
            tool: ToolKind::GapFill,
            gap_area: 3.0,
            ..ToolSettings::default()
        });
        let outcome = session.handle(
            GestureEvent::Press {
                sample: at(5.0, 5.0),
                label: 0,
            },
            &id,
        );
        assert!(matches!(outcome, GestureOutcome::Painted { changed } if changed > 0));
        session.handle(GestureEvent::Release, &id);
        assert!(!session.selector().has_label(Label::BLOCKER));
        assert_eq!(
            session.selector().label_of_triangle(TriangleId(1)),
            Some(Label::NONE)
        );
        assert_eq!(session.undo_count(), 2);
    }
}
