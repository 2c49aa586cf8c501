use crate::{srt_about, Mat4Ext, Ray, Vec3};

/// Axis-Aligned Bounding Box for spatial acceleration structures (BVH).
///
/// A box is two corner points. [`Aabb::EMPTY`] (min = +inf, max = -inf) is the
/// identity for [`Aabb::expand`]: expanding it by any box yields that box.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// The box that contains nothing.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create an AABB from its corners. No reordering is done.
    pub const fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB from a center point and the full edge lengths.
    pub fn from_center_extent(center: Vec3, extent: Vec3) -> Self {
        Self {
            min: center - extent * 0.5,
            max: center + extent * 0.5,
        }
    }

    /// Create the AABB enclosing a triangle.
    pub fn from_vertices(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self {
            min: v0.min(v1).min(v2),
            max: v0.max(v1).max(v2),
        }
    }

    /// Grow this box to also cover `other`.
    pub fn expand(&mut self, other: &Aabb) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// True for boxes with min > max on any axis, such as [`Aabb::EMPTY`].
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    /// One of the 8 corners; bit 0 selects x, bit 1 y, bit 2 z (0 = min, 1 = max).
    pub fn corner(&self, index: usize) -> Vec3 {
        Vec3::new(
            if index & 1 == 0 { self.min.x } else { self.max.x },
            if index & 2 == 0 { self.min.y } else { self.max.y },
            if index & 4 == 0 { self.min.z } else { self.max.z },
        )
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn surface_area(&self) -> f32 {
        let e = self.extent();
        2.0 * (e.x * e.y + e.z * e.y + e.x * e.z)
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the largest extent.
    /// Ties go to the lower index.
    pub fn largest_axis(&self) -> usize {
        let e = self.extent();
        let mut largest = 0;

        if e.y > e.x {
            largest = 1;
        }

        if e.z > e.x && e.z > e.y {
            largest = 2;
        }

        largest
    }

    /// Slab test against the ray's valid distance range.
    ///
    /// The near/far plane of each axis is picked from the sign of the inverse
    /// direction, so no per-axis branch or swap is needed. A zero direction
    /// component yields a signed infinity, which makes that slab either span
    /// everything or nothing depending on where the origin lies. A NaN product
    /// (origin exactly on a plane of a slab it travels parallel to) is
    /// absorbed by `f32::max`/`f32::min` and treated as touching.
    pub fn intersects(&self, ray: &Ray) -> bool {
        let bounds = [self.min, self.max];
        let origin = ray.origin();
        let inv = ray.inverse_direction();
        let sign = ray.direction_is_negative();

        let mut tmin = (bounds[sign[0]].x - origin.x) * inv.x;
        let mut tmax = (bounds[1 - sign[0]].x - origin.x) * inv.x;

        let tymin = (bounds[sign[1]].y - origin.y) * inv.y;
        let tymax = (bounds[1 - sign[1]].y - origin.y) * inv.y;
        tmin = tmin.max(tymin);
        tmax = tmax.min(tymax);

        let tzmin = (bounds[sign[2]].z - origin.z) * inv.z;
        let tzmax = (bounds[1 - sign[2]].z - origin.z) * inv.z;
        tmin = tmin.max(tzmin);
        tmax = tmax.min(tzmax);

        tmin <= tmax && tmin < ray.max_distance() && tmax > ray.min_distance()
    }

    /// Box enclosing this box after scaling, rotating (XYZ Euler degrees) and
    /// translating it about its own center. Not a tight bound under rotation.
    pub fn transformed(&self, scale: Vec3, rotate: Vec3, translate: Vec3) -> Aabb {
        srt_about(self.center(), scale, rotate, translate).transform_aabb(self)
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}
