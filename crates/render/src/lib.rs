//! Renderable layer for the triangle selector
//!
//! Turns the paint state of a [`selector::TriangleSelector`] into GPU-ready
//! data without touching the core:
//! - [`buffers`] - `Pod` vertex and index buffers per patch
//! - [`outline`] - boundary edges between differently labeled regions
//! - [`renderer::PatchRenderer`] - lazy rebuild driven by selector events

pub mod buffers;
pub mod outline;
pub mod renderer;

pub use buffers::{PatchMesh, PatchVertex, RenderPatch, build_render_patches};
pub use outline::{outline_edges, seed_fill_contour_lines};
pub use renderer::PatchRenderer;
