//! Cursor volumes used for hit testing.
//!
//! Cursor shapes live in world space. Mesh-local triangles are mapped
//! through the mesh-to-world transform before every test so that painting
//! follows the instance placement without touching the stored positions.

use glam::{Affine3A, Vec3};
use serde::{Deserialize, Serialize};

use crate::geometry::{self, Aabb, ClippingPlane};

/// Cursor kinds offered by the paint tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CursorKind {
    /// Ball around the hit point
    #[default]
    Sphere,
    /// Cylinder through the hit point along the view direction
    Circle,
    /// Horizontal band around the hit point's height
    HeightRange,
    /// Single facet under the pointer
    Pointer,
}

impl CursorKind {
    /// Whether the kind has a radius adjusted by the mouse wheel
    pub fn has_radius(self) -> bool {
        matches!(self, CursorKind::Sphere | CursorKind::Circle)
    }
}

/// World-space cursor volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CursorShape {
    Sphere {
        center: Vec3,
        radius: f32,
    },
    /// Sphere swept from `start` to `end`
    Capsule {
        start: Vec3,
        end: Vec3,
        radius: f32,
    },
    /// Infinite cylinder along the unit `direction`
    Circle {
        center: Vec3,
        radius: f32,
        direction: Vec3,
    },
    /// Cylinder swept from `start` to `end`, both projected along `direction`
    SweptCircle {
        start: Vec3,
        end: Vec3,
        radius: f32,
        direction: Vec3,
    },
    /// World heights in `[low, high)`
    HeightRange {
        low: f32,
        high: f32,
    },
}

/// A cursor shape bound to a mesh instance's transform
#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    shape: CursorShape,
    transform: Affine3A,
    clipping: Option<ClippingPlane>,
}

fn valid_radius(radius: f32) -> bool {
    radius.is_finite() && radius > 0.0
}

impl Cursor {
    /// Sphere cursor; `None` for a non-positive radius
    pub fn sphere(center: Vec3, radius: f32, transform: Affine3A) -> Option<Self> {
        (valid_radius(radius) && center.is_finite())
            .then_some(Self::with_shape(CursorShape::Sphere { center, radius }, transform))
    }

    /// Swept sphere between two samples of a drag
    pub fn capsule(start: Vec3, end: Vec3, radius: f32, transform: Affine3A) -> Option<Self> {
        (valid_radius(radius) && start.is_finite() && end.is_finite()).then_some(
            Self::with_shape(CursorShape::Capsule { start, end, radius }, transform),
        )
    }

    /// Cylinder cursor along the view direction
    pub fn circle(center: Vec3, radius: f32, view_dir: Vec3, transform: Affine3A) -> Option<Self> {
        let direction = view_dir.try_normalize()?;
        (valid_radius(radius) && center.is_finite()).then_some(Self::with_shape(
            CursorShape::Circle {
                center,
                radius,
                direction,
            },
            transform,
        ))
    }

    /// Swept cylinder between two samples of a drag
    pub fn swept_circle(
        start: Vec3,
        end: Vec3,
        radius: f32,
        view_dir: Vec3,
        transform: Affine3A,
    ) -> Option<Self> {
        let direction = view_dir.try_normalize()?;
        (valid_radius(radius) && start.is_finite() && end.is_finite()).then_some(
            Self::with_shape(
                CursorShape::SweptCircle {
                    start,
                    end,
                    radius,
                    direction,
                },
                transform,
            ),
        )
    }

    /// Height band `[low, high)`; `None` when empty
    pub fn height_range(low: f32, high: f32, transform: Affine3A) -> Option<Self> {
        (low.is_finite() && high.is_finite() && low < high).then_some(Self::with_shape(
            CursorShape::HeightRange { low, high },
            transform,
        ))
    }

    /// Cursor for a click of the given kind. Pointer and height-range
    /// cursors are built by the caller from their own parameters.
    pub fn single_point(
        kind: CursorKind,
        center: Vec3,
        radius: f32,
        view_dir: Vec3,
        transform: Affine3A,
    ) -> Option<Self> {
        match kind {
            CursorKind::Sphere => Self::sphere(center, radius, transform),
            CursorKind::Circle => Self::circle(center, radius, view_dir, transform),
            CursorKind::HeightRange | CursorKind::Pointer => None,
        }
    }

    /// Swept cursor between two successive drag samples
    pub fn double_point(
        kind: CursorKind,
        start: Vec3,
        end: Vec3,
        radius: f32,
        view_dir: Vec3,
        transform: Affine3A,
    ) -> Option<Self> {
        match kind {
            CursorKind::Sphere => Self::capsule(start, end, radius, transform),
            CursorKind::Circle => Self::swept_circle(start, end, radius, view_dir, transform),
            CursorKind::HeightRange | CursorKind::Pointer => None,
        }
    }

    fn with_shape(shape: CursorShape, transform: Affine3A) -> Self {
        Self {
            shape,
            transform,
            clipping: None,
        }
    }

    /// Exclude everything on the clipped side of `plane`
    pub fn with_clipping(mut self, plane: Option<ClippingPlane>) -> Self {
        self.clipping = plane;
        self
    }

    pub fn shape(&self) -> &CursorShape {
        &self.shape
    }

    pub fn transform(&self) -> &Affine3A {
        &self.transform
    }

    /// Largest radius of the cursor footprint (0 for height bands)
    pub fn radius(&self) -> f32 {
        match self.shape {
            CursorShape::Sphere { radius, .. }
            | CursorShape::Capsule { radius, .. }
            | CursorShape::Circle { radius, .. }
            | CursorShape::SweptCircle { radius, .. } => radius,
            CursorShape::HeightRange { .. } => 0.0,
        }
    }

    #[inline]
    fn to_world(&self, local: Vec3) -> Vec3 {
        self.transform.transform_point3(local)
    }

    fn is_clipped(&self, world: Vec3) -> bool {
        self.clipping
            .is_some_and(|plane| plane.is_point_clipped(world))
    }

    /// Whether the mesh-local point lies inside the cursor volume
    pub fn contains_point(&self, local: Vec3) -> bool {
        let world = self.to_world(local);
        !self.is_clipped(world) && self.shape.contains(world)
    }

    /// Whether the cursor reaches any part of the mesh-local triangle
    pub fn touches_triangle(&self, local: [Vec3; 3]) -> bool {
        let world = local.map(|p| self.to_world(p));
        if world.iter().all(|&p| self.is_clipped(p)) {
            return false;
        }
        self.shape.touches(world)
    }

    /// Whether the whole mesh-local triangle lies inside the cursor.
    ///
    /// Every shape and the clipping half-space are convex, so testing the
    /// corners is enough.
    pub fn covers_triangle(&self, local: [Vec3; 3]) -> bool {
        local.iter().all(|&p| self.contains_point(p))
    }

    /// Whether the triangle faces the viewer; cylinder cursors only paint
    /// front faces so they do not bleed through to the far side
    pub fn faces_triangle(&self, local: [Vec3; 3]) -> bool {
        let direction = match self.shape {
            CursorShape::Circle { direction, .. } | CursorShape::SweptCircle { direction, .. } => {
                direction
            }
            _ => return true,
        };
        let [a, b, c] = local.map(|p| self.to_world(p));
        (b - a).cross(c - a).dot(direction) <= 0.0
    }

    /// Whether the cursor cannot reach anything inside the mesh-local box
    pub fn misses_bounds(&self, local_bounds: &Aabb) -> bool {
        if local_bounds.is_empty() {
            return true;
        }
        let world = Aabb::from_points(local_bounds.corners().map(|p| self.to_world(p)));
        let center = world.center();
        let reach = world.size().length() * 0.5;

        match self.shape {
            CursorShape::Sphere { center: c, radius } => !world.intersects_sphere(c, radius),
            CursorShape::Capsule { start, end, radius } => {
                let swept = Aabb::from_points([start, end]).expanded(radius);
                !world.intersects(&swept)
            }
            CursorShape::Circle {
                center: c,
                radius,
                direction,
            } => distance_to_axis(center, c, direction) > radius + reach,
            CursorShape::SweptCircle {
                start,
                end,
                radius,
                direction,
            } => {
                let p = project(center, start, direction);
                let closest = geometry::closest_point_on_segment(
                    p,
                    start,
                    project(end, start, direction),
                );
                p.distance(closest) > radius + reach
            }
            CursorShape::HeightRange { low, high } => world.max.z < low || world.min.z >= high,
        }
    }
}

/// Project `p` onto the plane through `origin` perpendicular to `direction`
#[inline]
fn project(p: Vec3, origin: Vec3, direction: Vec3) -> Vec3 {
    p - direction * (p - origin).dot(direction)
}

#[inline]
fn distance_to_axis(p: Vec3, origin: Vec3, direction: Vec3) -> f32 {
    project(p, origin, direction).distance(origin)
}

impl CursorShape {
    /// World-space point containment
    pub fn contains(&self, p: Vec3) -> bool {
        match *self {
            CursorShape::Sphere { center, radius } => p.distance_squared(center) <= radius * radius,
            CursorShape::Capsule { start, end, radius } => {
                geometry::closest_point_on_segment(p, start, end).distance_squared(p)
                    <= radius * radius
            }
            CursorShape::Circle {
                center,
                radius,
                direction,
            } => distance_to_axis(p, center, direction) <= radius,
            CursorShape::SweptCircle {
                start,
                end,
                radius,
                direction,
            } => {
                let q = project(p, start, direction);
                let e = project(end, start, direction);
                geometry::closest_point_on_segment(q, start, e).distance_squared(q)
                    <= radius * radius
            }
            CursorShape::HeightRange { low, high } => p.z >= low && p.z < high,
        }
    }

    /// World-space triangle overlap
    pub fn touches(&self, [a, b, c]: [Vec3; 3]) -> bool {
        match *self {
            CursorShape::Sphere { center, radius } => {
                geometry::closest_point_on_triangle(center, a, b, c).distance_squared(center)
                    <= radius * radius
            }
            CursorShape::Capsule { start, end, radius } => {
                geometry::segment_triangle_distance_squared(start, end, a, b, c) <= radius * radius
            }
            CursorShape::Circle {
                center,
                radius,
                direction,
            } => {
                let [pa, pb, pc] = [a, b, c].map(|p| project(p, center, direction));
                geometry::closest_point_on_triangle(center, pa, pb, pc).distance_squared(center)
                    <= radius * radius
            }
            CursorShape::SweptCircle {
                start,
                end,
                radius,
                direction,
            } => {
                let [pa, pb, pc] = [a, b, c].map(|p| project(p, start, direction));
                let e = project(end, start, direction);
                geometry::segment_triangle_distance_squared(start, e, pa, pb, pc)
                    <= radius * radius
            }
            CursorShape::HeightRange { low, high } => {
                let min_z = a.z.min(b.z).min(c.z);
                let max_z = a.z.max(b.z).max(c.z);
                min_z < high && max_z >= low
            }
        }
    }
}
