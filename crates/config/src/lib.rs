//! Shared configuration for facetpaint
//!
//! This crate provides the single source of truth for paint tool limits
//! (cursor radius, smart-fill angle, gap area) and the tunables of the
//! subdivision engine. Values are configurable and should not be treated as
//! magic numbers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest cursor radius reachable with the mouse wheel (world units)
pub const CURSOR_RADIUS_MIN: f32 = 0.4;

/// Largest cursor radius reachable with the mouse wheel (world units)
pub const CURSOR_RADIUS_MAX: f32 = 8.0;

/// Cursor radius change per wheel notch
pub const CURSOR_RADIUS_STEP: f32 = 0.2;

/// Cursor radius when a tool is first activated
pub const CURSOR_RADIUS_DEFAULT: f32 = 2.0;

/// Smart-fill angle limits in degrees
pub const SMART_FILL_ANGLE_MIN_DEG: f32 = 0.0;
pub const SMART_FILL_ANGLE_MAX_DEG: f32 = 90.0;
pub const SMART_FILL_ANGLE_STEP_DEG: f32 = 1.0;
pub const SMART_FILL_ANGLE_DEFAULT_DEG: f32 = 30.0;

/// Gap-fill area limits (squared world units)
pub const GAP_AREA_MIN: f32 = 0.0;
pub const GAP_AREA_MAX: f32 = 5.0;
pub const GAP_AREA_STEP: f32 = 0.1;

/// Maximum subdivision depth below a level-0 facet
pub const DEFAULT_MAX_DEPTH: u8 = 10;

/// Edges shorter than this are never split further (mesh units)
pub const DEFAULT_MIN_EDGE_LENGTH: f32 = 0.01;

/// Target edge length as a fraction of the cursor radius
pub const DEFAULT_EDGE_LIMIT_RATIO: f32 = 0.2;

/// Number of undo steps kept per paint session
pub const DEFAULT_UNDO_LEVELS: usize = 20;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse paint config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid range for {name}: min {min} > max {max}")]
    InvalidRange { name: &'static str, min: f32, max: f32 },
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: f32 },
}

/// Cursor radius limits for the brush tool
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorLimits {
    pub radius_min: f32,
    pub radius_max: f32,
    pub radius_step: f32,
    pub radius_default: f32,
}

impl Default for CursorLimits {
    fn default() -> Self {
        Self {
            radius_min: CURSOR_RADIUS_MIN,
            radius_max: CURSOR_RADIUS_MAX,
            radius_step: CURSOR_RADIUS_STEP,
            radius_default: CURSOR_RADIUS_DEFAULT,
        }
    }
}

/// Angle limits for smart fill and bucket fill, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartFillLimits {
    pub angle_min_deg: f32,
    pub angle_max_deg: f32,
    pub angle_step_deg: f32,
    pub angle_default_deg: f32,
}

impl Default for SmartFillLimits {
    fn default() -> Self {
        Self {
            angle_min_deg: SMART_FILL_ANGLE_MIN_DEG,
            angle_max_deg: SMART_FILL_ANGLE_MAX_DEG,
            angle_step_deg: SMART_FILL_ANGLE_STEP_DEG,
            angle_default_deg: SMART_FILL_ANGLE_DEFAULT_DEG,
        }
    }
}

/// Area limits for the gap-fill tool
///
/// `area_max` is also the ceiling at which patch area accumulation stops:
/// a patch that large can never be a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapFillLimits {
    pub area_min: f32,
    pub area_max: f32,
    pub area_step: f32,
    pub area_default: f32,
}

impl Default for GapFillLimits {
    fn default() -> Self {
        Self {
            area_min: GAP_AREA_MIN,
            area_max: GAP_AREA_MAX,
            area_step: GAP_AREA_STEP,
            area_default: GAP_AREA_MIN,
        }
    }
}

/// Subdivision engine tunables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubdivisionConfig {
    /// Maximum split depth below a level-0 facet
    pub max_depth: u8,
    /// Split requests producing edges shorter than this are ignored
    pub min_edge_length: f32,
    /// Brush edge limit as a fraction of the cursor radius
    pub edge_limit_ratio: f32,
}

impl Default for SubdivisionConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            min_edge_length: DEFAULT_MIN_EDGE_LENGTH,
            edge_limit_ratio: DEFAULT_EDGE_LIMIT_RATIO,
        }
    }
}

impl SubdivisionConfig {
    /// Edge limit used by the brush for a given cursor radius
    pub fn edge_limit_for_radius(&self, radius: f32) -> f32 {
        (radius * self.edge_limit_ratio).max(self.min_edge_length)
    }
}

/// Complete paint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaintConfig {
    pub cursor: CursorLimits,
    pub smart_fill: SmartFillLimits,
    pub gap_fill: GapFillLimits,
    pub subdivision: SubdivisionConfig,
    pub undo_levels: usize,
}

impl Default for PaintConfig {
    fn default() -> Self {
        Self {
            cursor: CursorLimits::default(),
            smart_fill: SmartFillLimits::default(),
            gap_fill: GapFillLimits::default(),
            subdivision: SubdivisionConfig::default(),
            undo_levels: DEFAULT_UNDO_LEVELS,
        }
    }
}

impl PaintConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON; missing fields take default values
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: PaintConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to pretty JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every range is ordered and every step is positive
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("cursor.radius", self.cursor.radius_min, self.cursor.radius_max)?;
        check_range(
            "smart_fill.angle_deg",
            self.smart_fill.angle_min_deg,
            self.smart_fill.angle_max_deg,
        )?;
        check_range("gap_fill.area", self.gap_fill.area_min, self.gap_fill.area_max)?;
        check_positive("cursor.radius_step", self.cursor.radius_step)?;
        check_positive("smart_fill.angle_step_deg", self.smart_fill.angle_step_deg)?;
        check_positive("gap_fill.area_step", self.gap_fill.area_step)?;
        check_positive("subdivision.min_edge_length", self.subdivision.min_edge_length)?;
        check_positive("subdivision.edge_limit_ratio", self.subdivision.edge_limit_ratio)?;
        if self.undo_levels == 0 {
            return Err(ConfigError::InvalidValue {
                name: "undo_levels",
                value: 0.0,
            });
        }
        if self.cursor.radius_min <= 0.0 {
            return Err(ConfigError::InvalidValue {
                name: "cursor.radius_min",
                value: self.cursor.radius_min,
            });
        }
        Ok(())
    }
}

fn check_range(name: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    if !(min.is_finite() && max.is_finite()) || min > max {
        return Err(ConfigError::InvalidRange { name, min, max });
    }
    Ok(())
}

fn check_positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(ConfigError::InvalidValue { name, value });
    }
    Ok(())
}
