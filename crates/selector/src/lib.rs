//! Facetpaint selector - triangle paint-selection engine
//!
//! This crate owns the paint state of a single mesh instance:
//! - [`selector::TriangleSelector`] - triangle arena with midpoint subdivision
//!   and on-demand adjacency across split depths
//! - [`cursor`] - sphere, circle and height-range cursor volumes
//! - [`paint`] - brush painting and whole-facet labeling
//! - [`fill`] - smart fill and bucket fill region growing
//! - [`patch`] - same-label patches and gap-fill reclassification
//! - [`snapshot`] - compact label snapshots for undo and persistence
//! - [`session`] - gesture handling with undo/redo

pub mod constants;
pub mod cursor;
pub mod events;
pub mod fill;
pub mod geometry;
pub mod paint;
pub mod patch;
pub mod selector;
pub mod session;
pub mod snapshot;
pub mod types;

pub use constants::*;
pub use cursor::*;
pub use events::*;
pub use geometry::{Aabb, ClippingPlane};
pub use patch::*;
pub use selector::*;
pub use session::*;
pub use snapshot::*;
pub use types::*;
