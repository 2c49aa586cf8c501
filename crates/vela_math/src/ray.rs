use crate::{Interval, Vec3};

/// A ray in 3D space.
///
/// Besides origin and direction a ray carries everything the slab test needs
/// (inverse direction and per-axis sign bits), the distance range in which hits
/// are valid, and two independent flags: `is_shadow_ray` is a shading hint,
/// while `fast_occlusion` lets traversal stop at the first hit instead of the
/// closest one.
///
/// Fields are private so that the precomputed values always match the
/// direction; use the `with_*` builders to derive new rays.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
    inverse_direction: Vec3,
    direction_is_negative: [usize; 3],
    range: Interval,
    is_shadow_ray: bool,
    fast_occlusion: bool,
}

impl Ray {
    /// Create a new ray valid for all non-negative distances.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        // Zero components become signed infinities here, which the slab test relies on.
        let inverse_direction = direction.recip();

        Self {
            origin,
            direction,
            inverse_direction,
            direction_is_negative: [
                (inverse_direction.x < 0.0) as usize,
                (inverse_direction.y < 0.0) as usize,
                (inverse_direction.z < 0.0) as usize,
            ],
            range: Interval::FORWARD,
            is_shadow_ray: false,
            fast_occlusion: false,
        }
    }

    /// Restrict the valid hit distances to `[min, max]`.
    pub fn with_range(mut self, min: f32, max: f32) -> Self {
        self.range = Interval::new(min, max);
        self
    }

    /// Mark the ray as a shadow ray.
    pub fn with_shadow(mut self, is_shadow_ray: bool) -> Self {
        self.is_shadow_ray = is_shadow_ray;
        self
    }

    /// Allow traversal to stop at the first hit in range.
    pub fn with_fast_occlusion(mut self, fast_occlusion: bool) -> Self {
        self.fast_occlusion = fast_occlusion;
        self
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Componentwise reciprocal of the direction (may contain infinities).
    #[inline]
    pub fn inverse_direction(&self) -> Vec3 {
        self.inverse_direction
    }

    /// 1 where the inverse direction component is negative, else 0.
    #[inline]
    pub fn direction_is_negative(&self) -> [usize; 3] {
        self.direction_is_negative
    }

    #[inline]
    pub fn range(&self) -> Interval {
        self.range
    }

    #[inline]
    pub fn min_distance(&self) -> f32 {
        self.range.min
    }

    #[inline]
    pub fn max_distance(&self) -> f32 {
        self.range.max
    }

    #[inline]
    pub fn is_shadow_ray(&self) -> bool {
        self.is_shadow_ray
    }

    #[inline]
    pub fn fast_occlusion(&self) -> bool {
        self.fast_occlusion
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}
