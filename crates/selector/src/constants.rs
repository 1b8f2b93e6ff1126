/// Tolerance on unit-normal dot products in fill growth.
/// A zero angle threshold therefore admits only coplanar neighbors.
pub const COPLANAR_EPSILON: f32 = 1e-5;

/// Patch areas stop accumulating past this value (mesh units squared).
pub const GAP_AREA_CEILING: f32 = facetpaint_config::GAP_AREA_MAX;

/// Relative tolerance used when comparing leaf area sums to facet areas.
pub const AREA_RELATIVE_TOLERANCE: f32 = 1e-4;

/// Default thickness of the height-range cursor band.
pub const DEFAULT_HEIGHT_RANGE: f32 = 0.2;

/// Magic bytes at the start of an encoded snapshot.
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"FPSL";

/// Current snapshot encoding version.
pub const SNAPSHOT_VERSION: u16 = 1;
