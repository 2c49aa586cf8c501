//! Sphere primitive for ray tracing.

use crate::primitive::{Intersection, Primitive};
use vela_math::{Aabb, Ray, Vec2, Vec3};
use std::f32::consts::PI;

/// A sphere primitive.
///
/// The intersection test projects the center onto the ray, so ray directions
/// are expected to be unit length (cameras and tracers always normalize).
#[derive(Debug, Clone)]
pub struct Sphere {
    center: Vec3,
    radius: f32,
    material_id: usize,
    bbox: Aabb,
}

impl Sphere {
    /// Create a new sphere.
    pub fn new(center: Vec3, radius: f32, material_id: usize) -> Self {
        let radius = radius.max(0.0);
        let rvec = Vec3::splat(radius);

        Self {
            center,
            radius,
            material_id,
            bbox: Aabb::from_min_max(center - rvec, center + rvec),
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Longitude/latitude mapping of a unit direction from the center.
    fn texcoord(n: Vec3) -> Vec2 {
        let u = 0.5 + n.z.atan2(n.x) / (2.0 * PI);
        let v = 0.5 - n.y.clamp(-1.0, 1.0).asin() / PI;
        Vec2::new(u - u.floor(), v - v.floor())
    }
}

impl Primitive for Sphere {
    fn intersect(&self, ray: &Ray, rec: &mut Intersection) -> bool {
        let origin_to_center = self.center - ray.origin();
        let origin_to_center_distance2 = origin_to_center.length_squared();
        let radius2 = self.radius * self.radius;

        let t1 = origin_to_center.dot(ray.direction());
        let perpendicular_distance2 = origin_to_center_distance2 - t1 * t1;
        let origin_is_outside = origin_to_center_distance2 >= radius2;

        if origin_is_outside {
            // Whole sphere is behind the origin
            if t1 < 0.0 {
                return false;
            }

            // Ray passes beside the sphere
            if perpendicular_distance2 > radius2 {
                return false;
            }
        }

        let t2 = (radius2 - perpendicular_distance2).max(0.0).sqrt();
        let t = if origin_is_outside { t1 - t2 } else { t1 + t2 };

        if !rec.accepts(ray, t) {
            return false;
        }

        let position = ray.at(t);
        let outward_normal = (position - self.center).normalize_or_zero();

        rec.was_found = true;
        rec.distance = t;
        rec.position = position;
        rec.normal = if origin_is_outside { outward_normal } else { -outward_normal };
        rec.front_face = origin_is_outside;
        rec.texcoord = Self::texcoord(outward_normal);
        rec.wrap_texcoord = true;
        rec.material_id = self.material_id;

        true
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn material_id(&self) -> Option<usize> {
        Some(self.material_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_hit_from_outside() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5, 3);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let mut rec = Intersection::default();

        assert!(sphere.intersect(&ray, &mut rec));
        assert!(rec.was_found);
        assert!((rec.distance - 0.5).abs() < 1e-5);
        assert!((rec.normal - Vec3::Z).length() < 1e-5);
        assert!(rec.front_face);
        assert_eq!(rec.material_id, 3);
    }

    #[test]
    fn test_sphere_hit_from_inside() {
        let sphere = Sphere::new(Vec3::ZERO, 2.0, 0);
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let mut rec = Intersection::default();

        assert!(sphere.intersect(&ray, &mut rec));
        assert!((rec.distance - 2.0).abs() < 1e-5);
        // Normal points back inward, toward the origin of the ray.
        assert!((rec.normal - Vec3::NEG_X).length() < 1e-5);
        assert!(!rec.front_face);
    }

    #[test]
    fn test_sphere_miss() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5, 0);
        let mut rec = Intersection::default();

        // Pointing away
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(!sphere.intersect(&ray, &mut rec));

        // Passing beside
        let ray = Ray::new(Vec3::new(1.0, 0.0, 0.0), Vec3::NEG_Z);
        assert!(!sphere.intersect(&ray, &mut rec));
        assert!(!rec.was_found);
    }

    #[test]
    fn test_sphere_respects_closest_so_far() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -5.0), 1.0, 0);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let mut rec = Intersection {
            was_found: true,
            distance: 2.0,
            ..Default::default()
        };

        assert!(!sphere.intersect(&ray, &mut rec));
        assert_eq!(rec.distance, 2.0);
    }

    #[test]
    fn test_sphere_respects_max_distance() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -5.0), 1.0, 0);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z).with_range(0.0, 3.0);
        let mut rec = Intersection::default();

        assert!(!sphere.intersect(&ray, &mut rec));
    }

    #[test]
    fn test_sphere_texcoords_in_unit_square() {
        let sphere = Sphere::new(Vec3::ZERO, 1.0, 0);
        let ray = Ray::new(Vec3::new(0.3, 0.7, 5.0), Vec3::NEG_Z);
        let mut rec = Intersection::default();

        assert!(sphere.intersect(&ray, &mut rec));
        assert!((0.0..1.0).contains(&rec.texcoord.x));
        assert!((0.0..1.0).contains(&rec.texcoord.y));
        assert!(rec.wrap_texcoord);
    }

    #[test]
    fn test_sphere_bounding_box() {
        let sphere = Sphere::new(Vec3::new(1.0, 2.0, 3.0), 2.0, 0);
        let bbox = sphere.bounding_box();
        assert_eq!(bbox.min, Vec3::new(-1.0, 0.0, 1.0));
        assert_eq!(bbox.max, Vec3::new(3.0, 4.0, 5.0));
    }
}
