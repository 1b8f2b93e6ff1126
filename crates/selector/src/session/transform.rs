//! Mesh-to-world transform providers.

use glam::{Affine3A, Mat4};

/// Supplies the current mesh-to-world transform of the painted instance
pub trait MeshTransform {
    fn mesh_to_world(&self) -> Affine3A;
}

impl MeshTransform for Affine3A {
    fn mesh_to_world(&self) -> Affine3A {
        *self
    }
}

impl MeshTransform for Mat4 {
    fn mesh_to_world(&self) -> Affine3A {
        Affine3A::from_mat4(*self)
    }
}

/// Adapter for closures that compute the transform on demand
/// (e.g. reading it from a scene graph at event time)
pub struct TransformFn<F>(pub F);

impl<F> MeshTransform for TransformFn<F>
where
    F: Fn() -> Affine3A,
{
    fn mesh_to_world(&self) -> Affine3A {
        (self.0)()
    }
}

impl<T: MeshTransform + ?Sized> MeshTransform for &T {
    fn mesh_to_world(&self) -> Affine3A {
        (**self).mesh_to_world()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    #[test]
    fn test_transform_providers_agree() {
        let affine = Affine3A::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let from_mat = Mat4::from(affine).mesh_to_world();
        let from_fn = TransformFn(move || affine).mesh_to_world();
        let p = Vec3::new(0.5, -1.0, 2.0);
        assert!((from_mat.transform_point3(p) - affine.transform_point3(p)).length() < 1e-6);
        assert_eq!(from_fn, affine);
        assert_eq!((&affine).mesh_to_world(), affine);
    }
}
