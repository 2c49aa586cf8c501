use crate::Vec3;

/// Orthonormal basis used to orient hemisphere samples around a surface normal.
///
/// `w` is the "up" axis (the normal), `u` and `v` span the tangent plane.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Onb {
    pub u: Vec3,
    pub v: Vec3,
    pub w: Vec3,
}

impl Onb {
    pub const UP: Onb = Onb {
        u: Vec3::X,
        v: Vec3::NEG_Z,
        w: Vec3::Y,
    };

    /// Build a basis whose `w` axis is `normal` (assumed unit length).
    ///
    /// A zero normal yields [`Onb::UP`].
    pub fn from_normal(normal: Vec3) -> Self {
        // Any vector not parallel to the normal works as a seed for the tangent.
        let seed = if normal.x.abs() > 0.9 { Vec3::Y } else { Vec3::X };
        let v = normal.cross(seed).normalize_or_zero();
        if v == Vec3::ZERO {
            return Self::UP;
        }
        let u = v.cross(normal);

        Self { u, v, w: normal }
    }

    /// Map local coordinates (x along u, y along v, z along w) to world space.
    pub fn local_to_world(&self, local: Vec3) -> Vec3 {
        self.u * local.x + self.v * local.y + self.w * local.z
    }
}

impl Default for Onb {
    fn default() -> Self {
        Self::UP
    }
}
