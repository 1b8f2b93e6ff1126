use serde::{Deserialize, Serialize};

/// Type-safe triangle identifier (index into the selector arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TriangleId(pub u32);

impl TriangleId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Type-safe vertex identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(pub u32);

impl VertexId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Paint label carried by a leaf triangle.
///
/// `0` is "no label", `1` and `2` are the support enforcer/blocker pair and
/// `3..=Label::MAX` are material slots (`Label::material(1)` is `3`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Label(u8);

/// Number of material slots addressable by [`Label::material`]
pub const MAX_MATERIALS: u8 = 16;

impl Label {
    pub const NONE: Label = Label(0);
    pub const ENFORCER: Label = Label(1);
    pub const BLOCKER: Label = Label(2);
    /// Largest valid raw label value
    pub const MAX: u8 = 2 + MAX_MATERIALS;

    /// Validate a raw label value; out-of-enum values yield `None`
    pub fn new(raw: u8) -> Option<Label> {
        (raw <= Self::MAX).then_some(Label(raw))
    }

    /// Label for material slot `slot` (1-based)
    pub fn material(slot: u8) -> Option<Label> {
        if slot == 0 || slot > MAX_MATERIALS {
            return None;
        }
        Some(Label(2 + slot))
    }

    #[inline]
    pub fn raw(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Material slot for material labels
    pub fn material_slot(self) -> Option<u8> {
        (self.0 > 2).then(|| self.0 - 2)
    }
}

/// Raw value outside `0..=Label::MAX`
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid label {0} (max {max})", max = Label::MAX)]
pub struct InvalidLabel(pub u8);

impl TryFrom<u8> for Label {
    type Error = InvalidLabel;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Label::new(raw).ok_or(InvalidLabel(raw))
    }
}

impl From<Label> for u8 {
    fn from(label: Label) -> u8 {
        label.0
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Label::NONE => write!(f, "none"),
            Label::ENFORCER => write!(f, "enforcer"),
            Label::BLOCKER => write!(f, "blocker"),
            Label(raw) => write!(f, "material {}", raw - 2),
        }
    }
}

/// Indexed triangle mesh handed to the selector at construction.
///
/// Positions are in mesh-local space. The selector never mutates them.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub positions: Vec<glam::Vec3>,
    pub indices: Vec<[u32; 3]>,
}

impl MeshData {
    pub fn new(positions: Vec<glam::Vec3>, indices: Vec<[u32; 3]>) -> Self {
        Self { positions, indices }
    }

    /// Number of level-0 facets
    pub fn facet_count(&self) -> usize {
        self.indices.len()
    }
}
