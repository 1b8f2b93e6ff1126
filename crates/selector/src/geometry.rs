//! Geometric primitives shared by the selector, cursors and fills.
//!
//! Ray-triangle intersection uses the Moller-Trumbore algorithm; the
//! closest-point queries follow the region-based formulation from
//! "Real-Time Collision Detection" (Ericson).

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Epsilon for floating point comparisons in intersection tests
pub const EPSILON: f32 = 1e-6;

/// Area of the triangle `abc`
#[inline]
pub fn triangle_area(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    0.5 * (b - a).cross(c - a).length()
}

/// Unit normal of the triangle `abc` (zero for degenerate triangles)
#[inline]
pub fn triangle_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a).normalize_or_zero()
}

/// Result of a ray-triangle intersection test
#[derive(Debug, Clone, Copy)]
pub struct TriangleHit {
    /// Distance along the ray to the intersection point
    pub t: f32,
    /// Barycentric coordinate u (weight for vertex 1)
    pub u: f32,
    /// Barycentric coordinate v (weight for vertex 2)
    pub v: f32,
}

/// Moller-Trumbore ray-triangle intersection.
///
/// `t` is measured in units of `ray_dir`, so passing an unnormalized
/// segment direction gives `t` in `[0, 1]` along the segment.
pub fn ray_triangle_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
) -> Option<TriangleHit> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let pvec = ray_dir.cross(edge2);
    let det = edge1.dot(pvec);

    // Ray lies in the plane of the triangle or misses
    if det.abs() < EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let tvec = ray_origin - v0;

    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(edge1);
    let v = ray_dir.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(qvec) * inv_det;
    if t < 0.0 {
        return None;
    }

    Some(TriangleHit { t, u, v })
}

/// Closest point to `p` on the segment `ab`
pub fn closest_point_on_segment(p: Vec3, a: Vec3, b: Vec3) -> Vec3 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < EPSILON * EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Closest point to `p` on the triangle `abc`
pub fn closest_point_on_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;

    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = 1.0 / (va + vb + vc);
    if !denom.is_finite() {
        // Degenerate triangle: fall back to the closest edge point
        return [
            closest_point_on_segment(p, a, b),
            closest_point_on_segment(p, b, c),
            closest_point_on_segment(p, c, a),
        ]
        .into_iter()
        .min_by(|x, y| x.distance_squared(p).total_cmp(&y.distance_squared(p)))
        .unwrap_or(a);
    }
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}

/// Closest points between segments `p1q1` and `p2q2`
pub fn closest_points_between_segments(p1: Vec3, q1: Vec3, p2: Vec3, q2: Vec3) -> (Vec3, Vec3) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.length_squared();
    let e = d2.length_squared();
    let f = d2.dot(r);

    let degenerate_1 = a <= EPSILON * EPSILON;
    let degenerate_2 = e <= EPSILON * EPSILON;

    if degenerate_1 && degenerate_2 {
        return (p1, p2);
    }
    if degenerate_1 {
        let t = (f / e).clamp(0.0, 1.0);
        return (p1, p2 + d2 * t);
    }

    let c = d1.dot(r);
    if degenerate_2 {
        let s = (-c / a).clamp(0.0, 1.0);
        return (p1 + d1 * s, p2);
    }

    let b = d1.dot(d2);
    let denom = a * e - b * b;
    let mut s = if denom > EPSILON {
        ((b * f - c * e) / denom).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let mut t = (b * s + f) / e;
    if t < 0.0 {
        t = 0.0;
        s = (-c / a).clamp(0.0, 1.0);
    } else if t > 1.0 {
        t = 1.0;
        s = ((b - c) / a).clamp(0.0, 1.0);
    }
    (p1 + d1 * s, p2 + d2 * t)
}

/// Squared distance between the segment `s0s1` and the triangle `abc`
pub fn segment_triangle_distance_squared(s0: Vec3, s1: Vec3, a: Vec3, b: Vec3, c: Vec3) -> f32 {
    if let Some(hit) = ray_triangle_intersection(s0, s1 - s0, a, b, c) {
        if hit.t <= 1.0 {
            return 0.0;
        }
    }

    let mut best = closest_point_on_triangle(s0, a, b, c).distance_squared(s0);
    best = best.min(closest_point_on_triangle(s1, a, b, c).distance_squared(s1));
    for (e0, e1) in [(a, b), (b, c), (c, a)] {
        let (x, y) = closest_points_between_segments(s0, s1, e0, e1);
        best = best.min(x.distance_squared(y));
    }
    best
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(f32::MIN),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut aabb = Self::empty();
        for p in points {
            aabb.include_point(p);
        }
        aabb
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn include_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Grow the box by `margin` on every side
    pub fn expanded(&self, margin: f32) -> Self {
        Self {
            min: self.min - Vec3::splat(margin),
            max: self.max + Vec3::splat(margin),
        }
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        let closest = center.clamp(self.min, self.max);
        closest.distance_squared(center) <= radius * radius
    }

    /// The eight corners of the box
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }
}

/// Scene clipping half-space in world coordinates.
///
/// Points with `normal · p + distance < 0` are clipped away and can be
/// neither painted nor filled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClippingPlane {
    pub normal: Vec3,
    pub distance: f32,
}

impl ClippingPlane {
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self {
            normal: normal.normalize_or_zero(),
            distance,
        }
    }

    #[inline]
    pub fn is_point_clipped(&self, point: Vec3) -> bool {
        self.normal.dot(point) + self.distance < 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_triangle_hit() {
        let v0 = Vec3::new(0.0, 0.0, 0.0);
        let v1 = Vec3::new(1.0, 0.0, 0.0);
        let v2 = Vec3::new(0.0, 1.0, 0.0);

        let hit = ray_triangle_intersection(
            Vec3::new(0.25, 0.25, 1.0),
            Vec3::new(0.0, 0.0, -1.0),
            v0,
            v1,
            v2,
        )
        .unwrap();
        assert!((hit.t - 1.0).abs() < EPSILON);
        assert!((hit.u - 0.25).abs() < EPSILON);
        assert!((hit.v - 0.25).abs() < EPSILON);
    }

    #[test]
    fn test_ray_triangle_miss_and_behind() {
        let v0 = Vec3::new(0.0, 0.0, 0.0);
        let v1 = Vec3::new(1.0, 0.0, 0.0);
        let v2 = Vec3::new(0.0, 1.0, 0.0);

        let down = Vec3::new(0.0, 0.0, -1.0);
        assert!(ray_triangle_intersection(Vec3::new(2.0, 2.0, 1.0), down, v0, v1, v2).is_none());
        assert!(ray_triangle_intersection(Vec3::new(0.25, 0.25, 1.0), -down, v0, v1, v2).is_none());
    }

    #[test]
    fn test_triangle_area_and_normal() {
        let a = Vec3::ZERO;
        let b = Vec3::new(2.0, 0.0, 0.0);
        let c = Vec3::new(0.0, 2.0, 0.0);
        assert!((triangle_area(a, b, c) - 2.0).abs() < EPSILON);
        assert!((triangle_normal(a, b, c) - Vec3::Z).length() < EPSILON);
        assert_eq!(triangle_normal(a, a, a), Vec3::ZERO);
    }

    #[test]
    fn test_closest_point_on_triangle_regions() {
        let a = Vec3::ZERO;
        let b = Vec3::new(1.0, 0.0, 0.0);
        let c = Vec3::new(0.0, 1.0, 0.0);

        // Face region projects straight down
        let p = closest_point_on_triangle(Vec3::new(0.2, 0.2, 3.0), a, b, c);
        assert!((p - Vec3::new(0.2, 0.2, 0.0)).length() < EPSILON);

        // Vertex region
        let p = closest_point_on_triangle(Vec3::new(-1.0, -1.0, 0.0), a, b, c);
        assert!((p - a).length() < EPSILON);

        // Edge region (hypotenuse)
        let p = closest_point_on_triangle(Vec3::new(1.0, 1.0, 0.0), a, b, c);
        assert!((p - Vec3::new(0.5, 0.5, 0.0)).length() < EPSILON);
    }

    #[test]
    fn test_segment_triangle_distance() {
        let a = Vec3::ZERO;
        let b = Vec3::new(1.0, 0.0, 0.0);
        let c = Vec3::new(0.0, 1.0, 0.0);

        // Piercing segment
        let d = segment_triangle_distance_squared(
            Vec3::new(0.2, 0.2, 1.0),
            Vec3::new(0.2, 0.2, -1.0),
            a,
            b,
            c,
        );
        assert!(d < EPSILON);

        // Parallel segment hovering above the triangle
        let d = segment_triangle_distance_squared(
            Vec3::new(-1.0, 0.2, 0.5),
            Vec3::new(2.0, 0.2, 0.5),
            a,
            b,
            c,
        );
        assert!((d - 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_clipping_plane() {
        let plane = ClippingPlane::new(Vec3::new(0.0, 0.0, -1.0), 1.0);
        assert!(!plane.is_point_clipped(Vec3::new(0.0, 0.0, 0.5)));
        assert!(plane.is_point_clipped(Vec3::new(0.0, 0.0, 1.5)));
    }

    #[test]
    fn test_aabb_queries() {
        let aabb = Aabb::from_points([Vec3::ZERO, Vec3::ONE]);
        assert!(aabb.contains_point(Vec3::splat(0.5)));
        assert!(aabb.intersects_sphere(Vec3::new(1.5, 0.5, 0.5), 0.6));
        assert!(!aabb.intersects_sphere(Vec3::new(3.0, 0.5, 0.5), 0.6));
        assert!(Aabb::empty().is_empty());
    }
}
