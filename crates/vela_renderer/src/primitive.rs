//! Primitive trait and Intersection record for ray-object intersection.

use std::sync::Arc;

use vela_math::{Aabb, Onb, Ray, Vec2, Vec3};

/// Record of the closest (or, for fast-occlusion rays, the first) hit found
/// so far during one intersection query.
///
/// `distance` starts at infinity and only ever decreases, which is how every
/// primitive knows whether its own hit is closer than what was already found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub was_found: bool,
    /// Ray parameter of the hit
    pub distance: f32,
    /// World-space hit point
    pub position: Vec3,
    /// Shading normal (unit length)
    pub normal: Vec3,
    /// Texture coordinates
    pub texcoord: Vec2,
    /// Texcoords repeat over `[0, 1)` after material scaling (spherical mapping)
    pub wrap_texcoord: bool,
    /// Index into the scene's material table
    pub material_id: usize,
    /// Whether the ray arrived from the outside of the surface
    pub front_face: bool,
    /// Basis around `normal`, filled in by the scene after traversal
    pub onb: Onb,
}

impl Default for Intersection {
    fn default() -> Self {
        Self {
            was_found: false,
            distance: f32::INFINITY,
            position: Vec3::ZERO,
            normal: Vec3::ZERO,
            texcoord: Vec2::ZERO,
            wrap_texcoord: false,
            material_id: 0,
            front_face: true,
            onb: Onb::UP,
        }
    }
}

impl Intersection {
    /// Whether a hit at distance `t` should replace the current record.
    ///
    /// The hit must lie inside the ray's range. Unless the ray only asks for
    /// occlusion, it must also be strictly closer than the current record.
    #[inline]
    pub fn accepts(&self, ray: &Ray, t: f32) -> bool {
        ray.range().contains(t) && (ray.fast_occlusion() || t < self.distance)
    }
}

/// Trait for objects that can be hit by rays.
pub trait Primitive: Send + Sync {
    /// Test the ray against this object.
    ///
    /// Returns true only if a hit was found that [`Intersection::accepts`];
    /// in that case the record has been overwritten with it.
    fn intersect(&self, ray: &Ray, intersection: &mut Intersection) -> bool;

    /// Get the axis-aligned bounding box of this object.
    fn bounding_box(&self) -> Aabb;

    /// Material referenced by this primitive, if it has exactly one.
    fn material_id(&self) -> Option<usize> {
        None
    }
}

/// Shared handle to a primitive, as stored by the scene and the BVH.
pub type PrimitiveHandle = Arc<dyn Primitive>;

/// Closest-hit query over a plain slice, without any acceleration.
///
/// The BVH must agree with this for every ray; it is also what a leaf does.
pub fn intersect_all(primitives: &[PrimitiveHandle], ray: &Ray, intersection: &mut Intersection) -> bool {
    let mut found = false;

    for primitive in primitives {
        if primitive.intersect(ray, intersection) {
            if ray.fast_occlusion() {
                return true;
            }
            found = true;
        }
    }

    found
}
