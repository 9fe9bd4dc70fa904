use glam::{Quat, Vec3};
use rapier3d::na::{self, Vector3};

#[inline]
/// Build a [`rapier3d::na::Isometry3`] from a rotation and a translation, for parry queries
pub fn isometry_from_rotation_translation(rotation: Quat, translation: Vec3) -> na::Isometry3<f32> {
    let rotation = rotation.normalize();
    na::Isometry3::from_parts(
        na::Translation3::new(translation.x, translation.y, translation.z),
        na::UnitQuaternion::new_unchecked(na::Quaternion::new(
            rotation.w, rotation.x, rotation.y, rotation.z,
        )),
    )
}

#[inline]
/// Convert a [`glam::Vec3`] into a [`rapier3d::na::Vector3`]
pub fn na_vector_from_glam(v: Vec3) -> Vector3<f32> {
    [v.x, v.y, v.z].into()
}

#[inline]
/// Decompose a [`rapier3d::na::Isometry3`] into its rotation and translation components
pub fn decompose_isometry(i: &na::Isometry3<f32>) -> (Quat, Vec3) {
    let q = i.rotation.quaternion();
    (
        Quat::from_xyzw(q.i, q.j, q.k, q.w),
        glam_vec_from_na(&i.translation.vector),
    )
}

#[inline]
/// Convert a [`rapier3d::na::Vector3`] into a [`glam::Vec3`]
pub fn glam_vec_from_na(v: &Vector3<f32>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

#[inline]
/// Convert a [`glam::Vec3`] into a [`rapier3d::na::Point3`]
pub fn na_point_from_glam(v: Vec3) -> na::Point3<f32> {
    na::Point3::new(v.x, v.y, v.z)
}

#[inline]
/// Normalize `v`, falling back to `fallback` when `v` is too short to have a direction
pub fn normalize_or(v: Vec3, fallback: Vec3) -> Vec3 {
    let n = v.normalize_or_zero();
    if n == Vec3::ZERO {
        fallback
    } else {
        n
    }
}
