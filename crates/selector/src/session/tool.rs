//! Per-session tool settings.

use facetpaint_config::PaintConfig;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_HEIGHT_RANGE;
use crate::cursor::CursorKind;

/// Paint tool selected in the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ToolKind {
    /// Paint with the cursor volume
    #[default]
    Brush,
    /// Fill across edges within the smart-fill angle
    SmartFill,
    /// Fill the same-label region within the smart-fill angle
    BucketFill,
    /// Merge small fragments into their neighbors on click
    GapFill,
}

/// Values adjusted by the user while painting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub tool: ToolKind,
    pub cursor: CursorKind,
    /// Sphere/circle cursor radius (world units)
    pub cursor_radius: f32,
    /// Height-range band thickness (world units)
    pub height_range: f32,
    /// Smart-fill angle threshold in degrees
    pub smart_fill_angle_deg: f32,
    /// Patch area below which fragments are merged (mesh units squared)
    pub gap_area: f32,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self::from_config(&PaintConfig::default())
    }
}

impl ToolSettings {
    pub fn from_config(config: &PaintConfig) -> Self {
        Self {
            tool: ToolKind::default(),
            cursor: CursorKind::default(),
            cursor_radius: config.cursor.radius_default,
            height_range: DEFAULT_HEIGHT_RANGE,
            smart_fill_angle_deg: config.smart_fill.angle_default_deg,
            gap_area: config.gap_fill.area_default,
        }
    }

    /// Smart-fill threshold in radians
    pub fn smart_fill_angle(&self) -> f32 {
        self.smart_fill_angle_deg.to_radians()
    }

    /// Whether the active tool works by flagging a seed-fill region
    pub fn uses_seed_fill(&self) -> bool {
        matches!(
            (self.tool, self.cursor),
            (ToolKind::Brush, CursorKind::Pointer) | (ToolKind::SmartFill | ToolKind::BucketFill, _)
        )
    }

    /// Apply `steps` mouse-wheel notches (positive = up) to whatever the
    /// active tool adjusts. Returns whether a value changed.
    pub fn apply_wheel(&mut self, steps: i32, config: &PaintConfig) -> bool {
        if steps == 0 {
            return false;
        }
        let steps = steps as f32;
        let (value, step, min, max) = match (self.tool, self.cursor) {
            (ToolKind::Brush, CursorKind::Sphere | CursorKind::Circle) => (
                &mut self.cursor_radius,
                config.cursor.radius_step,
                config.cursor.radius_min,
                config.cursor.radius_max,
            ),
            (ToolKind::Brush, CursorKind::HeightRange) => (
                &mut self.height_range,
                config.cursor.radius_step,
                config.cursor.radius_step,
                config.cursor.radius_max,
            ),
            (ToolKind::Brush, CursorKind::Pointer) => return false,
            (ToolKind::SmartFill | ToolKind::BucketFill, _) => (
                &mut self.smart_fill_angle_deg,
                config.smart_fill.angle_step_deg,
                config.smart_fill.angle_min_deg,
                config.smart_fill.angle_max_deg,
            ),
            (ToolKind::GapFill, _) => (
                &mut self.gap_area,
                config.gap_fill.area_step,
                config.gap_fill.area_min,
                config.gap_fill.area_max,
            ),
        };
        let adjusted = (*value + step * steps).clamp(min, max);
        let changed = adjusted != *value;
        *value = adjusted;
        changed
    }

    /// Clamp every value into the limits of `config`
    pub fn clamp_to(&mut self, config: &PaintConfig) {
        self.cursor_radius = self
            .cursor_radius
            .clamp(config.cursor.radius_min, config.cursor.radius_max);
        self.height_range = self
            .height_range
            .clamp(config.cursor.radius_step, config.cursor.radius_max);
        self.smart_fill_angle_deg = self
            .smart_fill_angle_deg
            .clamp(config.smart_fill.angle_min_deg, config.smart_fill.angle_max_deg);
        self.gap_area = self
            .gap_area
            .clamp(config.gap_fill.area_min, config.gap_fill.area_max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_config() {
        let config = PaintConfig::default();
        let settings = ToolSettings::default();
        assert_eq!(settings.cursor_radius, config.cursor.radius_default);
        assert_eq!(settings.smart_fill_angle_deg, config.smart_fill.angle_default_deg);
        assert_eq!(settings.gap_area, config.gap_fill.area_default);
    }

    #[test]
    fn test_wheel_adjusts_radius_within_limits() {
        let config = PaintConfig::default();
        let mut settings = ToolSettings::default();
        assert!(settings.apply_wheel(1, &config));
        assert!((settings.cursor_radius - 2.2).abs() < 1e-5);

        assert!(settings.apply_wheel(1000, &config));
        assert_eq!(settings.cursor_radius, config.cursor.radius_max);
        assert!(!settings.apply_wheel(1, &config));

        settings.apply_wheel(-1000, &config);
        assert_eq!(settings.cursor_radius, config.cursor.radius_min);
    }

    #[test]
    fn test_wheel_target_depends_on_tool() {
        let config = PaintConfig::default();
        let mut settings = ToolSettings {
            tool: ToolKind::SmartFill,
            ..ToolSettings::default()
        };
        settings.apply_wheel(-2, &config);
        assert!((settings.smart_fill_angle_deg - 28.0).abs() < 1e-5);
        assert_eq!(settings.cursor_radius, config.cursor.radius_default);

        settings.tool = ToolKind::GapFill;
        settings.apply_wheel(3, &config);
        assert!((settings.gap_area - 0.3).abs() < 1e-5);

        settings.tool = ToolKind::Brush;
        settings.cursor = CursorKind::Pointer;
        assert!(!settings.apply_wheel(1, &config));
    }

    #[test]
    fn test_clamp_to_config() {
        let config = PaintConfig::default();
        let mut settings = ToolSettings {
            cursor_radius: 100.0,
            smart_fill_angle_deg: -5.0,
            ..ToolSettings::default()
        };
        settings.clamp_to(&config);
        assert_eq!(settings.cursor_radius, config.cursor.radius_max);
        assert_eq!(settings.smart_fill_angle_deg, 0.0);
    }
}
