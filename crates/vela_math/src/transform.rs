// Transform utilities for Mat4
//
// Extends glam::Mat4 with the box transform used by instance-style bounds.

use glam::{EulerRot, Mat4, Vec3};
use crate::Aabb;

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// Transform an axis-aligned bounding box.
    /// Computes the bounding box of all 8 transformed corners, so the result
    /// is conservative rather than tight under rotation.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;
}

impl Mat4Ext for Mat4 {
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        if aabb.is_empty() {
            return Aabb::EMPTY;
        }

        (0..8)
            .map(|i| self.transform_point3(aabb.corner(i)))
            .fold(Aabb::EMPTY, |mut acc, corner| {
                acc.expand(&Aabb::from_min_max(corner, corner));
                acc
            })
    }
}

/// Scale, then rotate (XYZ Euler angles in degrees), then translate, all
/// about `center` instead of the origin.
pub fn srt_about(center: Vec3, scale: Vec3, rotate_degrees: Vec3, translate: Vec3) -> Mat4 {
    let rotation = Mat4::from_euler(
        EulerRot::XYZ,
        rotate_degrees.x.to_radians(),
        rotate_degrees.y.to_radians(),
        rotate_degrees.z.to_radians(),
    );

    Mat4::from_translation(center + translate)
        * rotation
        * Mat4::from_scale(scale)
        * Mat4::from_translation(-center)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-4, "{a:?} != {b:?}");
    }

    #[test]
    fn test_transform_aabb_identity() {
        let aabb = Aabb::from_min_max(Vec3::ZERO, Vec3::ONE);
        let transformed = Mat4::IDENTITY.transform_aabb(&aabb);

        assert_close(transformed.min, aabb.min);
        assert_close(transformed.max, aabb.max);
    }

    #[test]
    fn test_transform_aabb_translation() {
        let mat = Mat4::from_translation(Vec3::new(5.0, 5.0, 5.0));
        let aabb = Aabb::from_min_max(Vec3::ZERO, Vec3::ONE);
        let transformed = mat.transform_aabb(&aabb);

        assert_close(transformed.min, Vec3::splat(5.0));
        assert_close(transformed.max, Vec3::splat(6.0));
    }

    #[test]
    fn test_transform_empty_stays_empty() {
        let mat = Mat4::from_translation(Vec3::X);
        assert!(mat.transform_aabb(&Aabb::EMPTY).is_empty());
    }

    #[test]
    fn test_srt_about_keeps_center_fixed() {
        let center = Vec3::new(1.0, 2.0, 3.0);
        let mat = srt_about(center, Vec3::splat(2.0), Vec3::new(0.0, 90.0, 0.0), Vec3::ZERO);

        assert_close(mat.transform_point3(center), center);
    }

    #[test]
    fn test_srt_about_scales_around_center() {
        let center = Vec3::ONE;
        let mat = srt_about(center, Vec3::splat(2.0), Vec3::ZERO, Vec3::X);

        // (2,1,1) is one unit from the center, so it lands two units away, then shifts by +X.
        assert_close(mat.transform_point3(Vec3::new(2.0, 1.0, 1.0)), Vec3::new(4.0, 1.0, 1.0));
    }
}
