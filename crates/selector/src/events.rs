//! Change notifications emitted by the selector.

/// Event delivered to listeners registered with
/// [`crate::TriangleSelector::add_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorEvent {
    /// Leaf labels or the split structure changed
    LabelsChanged { revision: u64, changed: usize },
    /// The transient seed-fill selection changed
    SeedFillChanged { revision: u64, selected: usize },
    /// All splits and labels were dropped
    Reset { generation: u32 },
    /// A snapshot was restored into a fresh arena
    Restored { generation: u32 },
}

impl SelectorEvent {
    /// Whether the event invalidates previously built patches
    pub fn invalidates_patches(&self) -> bool {
        match self {
            SelectorEvent::SeedFillChanged { .. } => false,
            SelectorEvent::LabelsChanged { .. }
            | SelectorEvent::Reset { .. }
            | SelectorEvent::Restored { .. } => true,
        }
    }
}
