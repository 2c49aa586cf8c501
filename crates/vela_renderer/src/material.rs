//! Surface materials.
//!
//! A material is a plain record of shading parameters addressed by id from the
//! scene's material table. The tracers decide what to do with it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use vela_math::{Vec2, Vec3};

use crate::primitive::Intersection;
use crate::texture::Texture;

/// Color type alias (linear RGB, not clamped)
pub type Color = Vec3;

/// Shading parameters of a surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Surface is a light source; tracers return its emittance and stop
    pub emissive: bool,
    pub emittance: Color,
    #[serde(skip)]
    pub emittance_texture: Option<Arc<dyn Texture>>,

    pub ambient_reflectance: Color,
    pub diffuse_reflectance: Color,
    #[serde(skip)]
    pub diffuse_texture: Option<Arc<dyn Texture>>,
    pub specular_reflectance: Color,
    /// Phong exponent
    pub shininess: f32,

    /// Weight of the mirror-reflected ray (ray tracer)
    pub ray_reflectance: f32,
    /// Weight of the refracted ray (ray tracer)
    pub ray_transmittance: f32,
    pub refractive_index: f32,
    /// Redistribute reflection and transmission with Schlick's approximation
    pub fresnel_reflection: bool,

    /// Texture coordinates are divided by this before texture lookups
    pub texcoord_scale: Vec2,

    /// Ignore lights and use the diffuse color as is
    pub skip_lighting: bool,
    /// Flip the shading normal of every hit
    pub invert_normal: bool,
    /// Flip the shading normal to face the incoming ray
    pub auto_invert_normal: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            emissive: false,
            emittance: Color::ZERO,
            emittance_texture: None,
            ambient_reflectance: Color::ZERO,
            diffuse_reflectance: Color::ZERO,
            diffuse_texture: None,
            specular_reflectance: Color::ZERO,
            shininess: 2.0,
            ray_reflectance: 0.0,
            ray_transmittance: 0.0,
            refractive_index: 1.0,
            fresnel_reflection: false,
            texcoord_scale: Vec2::ONE,
            skip_lighting: false,
            invert_normal: false,
            auto_invert_normal: true,
        }
    }
}

impl Material {
    /// Lambertian surface.
    pub fn diffuse(color: Color) -> Self {
        Self {
            ambient_reflectance: color,
            diffuse_reflectance: color,
            ..Default::default()
        }
    }

    /// Light source.
    pub fn emissive(emittance: Color) -> Self {
        Self {
            emissive: true,
            emittance,
            ..Default::default()
        }
    }

    /// Perfect mirror.
    pub fn mirror(tint: Color) -> Self {
        Self {
            specular_reflectance: tint,
            shininess: 64.0,
            ray_reflectance: 1.0,
            ..Default::default()
        }
    }

    /// Clear dielectric with Fresnel-weighted reflection.
    pub fn glass(refractive_index: f32) -> Self {
        Self {
            ray_transmittance: 1.0,
            refractive_index,
            fresnel_reflection: true,
            ..Default::default()
        }
    }

    pub fn with_specular(mut self, color: Color, shininess: f32) -> Self {
        self.specular_reflectance = color;
        self.shininess = shininess;
        self
    }

    pub fn with_ambient(mut self, color: Color) -> Self {
        self.ambient_reflectance = color;
        self
    }

    pub fn with_ray_reflectance(mut self, reflectance: f32) -> Self {
        self.ray_reflectance = reflectance;
        self
    }

    pub fn with_diffuse_texture(mut self, texture: Arc<dyn Texture>) -> Self {
        self.diffuse_texture = Some(texture);
        self
    }

    pub fn with_emittance_texture(mut self, texture: Arc<dyn Texture>) -> Self {
        self.emissive = true;
        self.emittance_texture = Some(texture);
        self
    }

    pub fn with_texcoord_scale(mut self, scale: Vec2) -> Self {
        self.texcoord_scale = scale;
        self
    }

    pub fn with_normal_flags(mut self, invert_normal: bool, auto_invert_normal: bool) -> Self {
        self.invert_normal = invert_normal;
        self.auto_invert_normal = auto_invert_normal;
        self
    }

    /// Emitted color at a hit: texture color times intensity if textured.
    pub fn emittance_at(&self, intersection: &Intersection) -> Color {
        self.lookup(&self.emittance_texture, self.emittance, intersection)
    }

    /// Diffuse reflectance at a hit: texture color times intensity if textured.
    pub fn diffuse_at(&self, intersection: &Intersection) -> Color {
        self.lookup(&self.diffuse_texture, self.diffuse_reflectance, intersection)
    }

    /// Texture coordinates of a hit after applying `texcoord_scale`.
    ///
    /// Wrapping primitives (spheres) are brought back into `[0, 1)` after
    /// scaling; others are left to tile.
    pub fn texcoord_at(&self, intersection: &Intersection) -> Vec2 {
        let texcoord = intersection.texcoord / self.texcoord_scale;
        if intersection.wrap_texcoord {
            texcoord - texcoord.floor()
        } else {
            texcoord
        }
    }

    fn lookup(&self, texture: &Option<Arc<dyn Texture>>, fallback: Color, intersection: &Intersection) -> Color {
        match texture {
            Some(texture) => {
                texture.color(self.texcoord_at(intersection), intersection.position) * texture.intensity()
            }
            None => fallback,
        }
    }
}

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract unit vector `v` through a surface with unit normal `n` facing `v`'s
/// origin side. `eta` is the ratio of refractive indices (from / to).
///
/// Returns `None` on total internal reflection.
#[inline]
pub fn refract(v: Vec3, n: Vec3, eta: f32) -> Option<Vec3> {
    let cos_i = (-v).dot(n).min(1.0);
    let sin2_t = eta * eta * (1.0 - cos_i * cos_i);
    if sin2_t > 1.0 {
        return None;
    }
    let cos_t = (1.0 - sin2_t).sqrt();
    Some(eta * v + (eta * cos_i - cos_t) * n)
}

/// Schlick's approximation of the Fresnel reflectance.
#[inline]
pub fn schlick(cosine: f32, n1: f32, n2: f32) -> f32 {
    let r0 = ((n1 - n2) / (n1 + n2)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).clamp(0.0, 1.0).powi(5)
}
