//! Undo/redo for the paint session

use tracing::{debug, error};

use super::PaintSession;
use crate::snapshot::SelectorSnapshot;

/// Selector state captured before a stroke
#[derive(Debug, Clone)]
pub struct UndoEntry {
    /// Stroke ID this entry corresponds to
    pub stroke_id: u64,
    /// Snapshot to go back to
    pub snapshot: SelectorSnapshot,
}

impl PaintSession {
    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get the number of undo levels available
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Undo the last stroke
    ///
    /// Returns true if an undo was performed. Ignored while stroking.
    pub fn undo(&mut self) -> bool {
        if self.is_stroking() {
            debug!("Undo: ignored during a stroke");
            return false;
        }
        let Some(entry) = self.undo_stack.pop() else {
            debug!("Undo: no entries available");
            return false;
        };

        debug!("Undoing stroke {}", entry.stroke_id);
        match self.swap_snapshot(entry) {
            Ok(redo) => {
                self.redo_stack.push(redo);
                true
            }
            Err(entry) => {
                self.undo_stack.push(entry);
                false
            }
        }
    }

    /// Redo the last undone stroke
    pub fn redo(&mut self) -> bool {
        if self.is_stroking() {
            debug!("Redo: ignored during a stroke");
            return false;
        }
        let Some(entry) = self.redo_stack.pop() else {
            debug!("Redo: no entries available");
            return false;
        };

        debug!("Redoing stroke {}", entry.stroke_id);
        match self.swap_snapshot(entry) {
            Ok(undo) => {
                self.undo_stack.push(undo);
                true
            }
            Err(entry) => {
                self.redo_stack.push(entry);
                false
            }
        }
    }

    /// Clear all paint as one undoable step
    pub fn clear_paint(&mut self) -> bool {
        if self.is_stroking() {
            self.cancel_stroke();
        }
        let before = self.selector.snapshot();
        if before.is_empty() {
            return false;
        }

        let stroke_id = self.next_stroke_id;
        self.next_stroke_id += 1;
        self.selector.reset();
        self.push_undo(UndoEntry {
            stroke_id,
            snapshot: before,
        });
        self.redo_stack.clear();
        true
    }

    /// Drop all undo and redo entries
    pub fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Push an entry, dropping the oldest beyond the configured limit
    pub(crate) fn push_undo(&mut self, entry: UndoEntry) {
        self.undo_stack.push(entry);
        while self.undo_stack.len() > self.config.undo_levels {
            self.undo_stack.remove(0);
        }
    }

    /// Restore `entry` and return the entry that leads back to the current
    /// state. On failure the selector is untouched and `entry` is returned.
    fn swap_snapshot(&mut self, entry: UndoEntry) -> Result<UndoEntry, UndoEntry> {
        let current = self.selector.snapshot();
        if let Err(err) = self.selector.restore(&entry.snapshot) {
            error!("Failed to restore snapshot of stroke {}: {}", entry.stroke_id, err);
            return Err(entry);
        }
        Ok(UndoEntry {
            stroke_id: entry.stroke_id,
            snapshot: current,
        })
    }
}

#[cfg(test)]
mod tests {
    use facetpaint_config::PaintConfig;
    use glam::{Affine3A, Vec3};

    use super::*;
    use crate::session::PointerSample;
    use crate::types::{Label, MeshData, TriangleId};

    fn session(undo_levels: usize) -> PaintSession {
        let mesh = MeshData::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(10.0, 0.0, 0.0),
                Vec3::new(10.0, 10.0, 0.0),
                Vec3::new(0.0, 10.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        );
        let config = PaintConfig {
            undo_levels,
            ..PaintConfig::default()
        };
        PaintSession::from_mesh(&mesh, config).unwrap()
    }

    fn dab(session: &mut PaintSession, label: Label, x: f32, y: f32) {
        session.begin_stroke(label);
        session.stroke_to(
            PointerSample::new(Vec3::new(x, y, 0.0), Vec3::NEG_Z),
            &Affine3A::IDENTITY,
        );
        session.end_stroke();
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut session = session(20);
        dab(&mut session, Label::ENFORCER, 7.0, 2.0);
        let painted = session.selector().snapshot();

        assert!(session.undo());
        assert!(!session.selector().has_any_label());
        assert_eq!(session.selector().triangle_count(), 2);
        assert!(session.can_redo());

        assert!(session.redo());
        assert_eq!(session.selector().snapshot(), painted);
        assert!(!session.redo());
    }

    #[test]
    fn test_undo_levels_are_capped() {
        let mut session = session(2);
        dab(&mut session, Label::ENFORCER, 7.0, 2.0);
        dab(&mut session, Label::BLOCKER, 2.0, 7.0);
        dab(&mut session, Label::material(1).unwrap(), 5.0, 5.0);
        assert_eq!(session.undo_count(), 2);

        assert!(session.undo());
        assert!(session.undo());
        assert!(!session.undo());
        // The first stroke is beyond the history
        assert!(session.selector().has_label(Label::ENFORCER));
        assert!(!session.selector().has_label(Label::BLOCKER));
    }

    #[test]
    fn test_new_stroke_clears_redo() {
        let mut session = session(20);
        dab(&mut session, Label::ENFORCER, 7.0, 2.0);
        session.undo();
        assert_eq!(session.redo_count(), 1);
        dab(&mut session, Label::BLOCKER, 2.0, 7.0);
        assert_eq!(session.redo_count(), 0);
    }

    #[test]
    fn test_clear_paint_is_undoable() {
        let mut session = session(20);
        session.selector_mut().set_facet(1, Label::BLOCKER);
        assert!(session.clear_paint());
        assert!(!session.selector().has_any_label());
        assert!(!session.clear_paint());

        assert!(session.undo());
        assert_eq!(
            session.selector().label_of_triangle(TriangleId(1)),
            Some(Label::BLOCKER)
        );
    }
}
