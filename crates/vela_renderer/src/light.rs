//! Light sources used by the ray and preview tracers.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use vela_math::{Onb, Ray, Vec3};

use crate::material::Color;
use crate::sampler::{SamplerType, Stratum};
use crate::scene::Scene;

/// Constant light added to every lit surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: Color::ONE,
            intensity: 0.0,
        }
    }
}

impl AmbientLight {
    pub fn new(color: Color, intensity: f32) -> Self {
        Self { color, intensity }
    }

    pub fn radiance(&self) -> Color {
        self.color * self.intensity
    }
}

/// Light arriving from a single direction with no falloff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    /// Direction the light travels in
    pub direction: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            color: Color::ONE,
            intensity: 1.0,
            direction: Vec3::NEG_Y,
        }
    }
}

impl DirectionalLight {
    pub fn new(direction: Vec3, color: Color, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            direction,
        }
    }

    pub fn radiance(&self) -> Color {
        self.color * self.intensity
    }

    /// Unit vector from a surface toward the light.
    pub fn direction_to_light(&self) -> Vec3 {
        (-self.direction).normalize_or_zero()
    }

    /// 1 if nothing blocks the light at `position`, else 0.
    pub fn visibility(&self, scene: &Scene, position: Vec3, ray_start_offset: f32) -> f32 {
        let shadow = Ray::new(position, self.direction_to_light())
            .with_range(ray_start_offset, f32::INFINITY)
            .with_shadow(true)
            .with_fast_occlusion(true);

        if scene.is_occluded(&shadow) {
            0.0
        } else {
            1.0
        }
    }
}

/// Disc-shaped emitter around a point light, facing the lit surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaLight {
    pub radius: f32,
    /// Shadow rays per evaluation is the square of this
    pub sample_count_sqrt: u32,
    pub sampler: SamplerType,
}

impl Default for AreaLight {
    fn default() -> Self {
        Self {
            radius: 1.0,
            sample_count_sqrt: 3,
            sampler: SamplerType::Jittered,
        }
    }
}

/// Light emitted from a point, falling off with the squared distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
    /// Soft shadows: sample visibility over a disc instead of the point
    pub area: Option<AreaLight>,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            color: Color::ONE,
            intensity: 1.0,
            position: Vec3::ZERO,
            area: None,
        }
    }
}

impl PointLight {
    pub fn new(position: Vec3, color: Color, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            position,
            area: None,
        }
    }

    pub fn with_area(mut self, area: AreaLight) -> Self {
        self.area = Some(area);
        self
    }

    /// Radiance reaching a point `distance2` (squared) away.
    pub fn radiance(&self, distance2: f32) -> Color {
        if distance2 <= 0.0 {
            return Color::ZERO;
        }
        self.color * self.intensity / distance2
    }

    /// Fraction of the light visible from `position`, in `[0, 1]`.
    ///
    /// A point light is either visible or not. An area light averages the
    /// visibility of `sample_count_sqrt²` stratified points on its disc.
    pub fn visibility(&self, scene: &Scene, position: Vec3, ray_start_offset: f32, rng: &mut dyn RngCore) -> f32 {
        let Some(area) = self.area.filter(|a| a.sample_count_sqrt > 0 && a.radius > 0.0) else {
            return if self.is_visible_from(scene, position, self.position, ray_start_offset) {
                1.0
            } else {
                0.0
            };
        };

        let to_light = (self.position - position).normalize_or_zero();
        let disc = Onb::from_normal(to_light);
        let sampler = area.sampler.as_sampler();
        let permutation = rng.gen::<u32>();
        let n = area.sample_count_sqrt;

        let mut visible = 0u32;
        for y in 0..n {
            for x in 0..n {
                let offset = sampler.sample_disc(Stratum::new(x, y, n, n), permutation, rng) * area.radius;
                let sample_position = self.position + offset.x * disc.u + offset.y * disc.v;

                if self.is_visible_from(scene, position, sample_position, ray_start_offset) {
                    visible += 1;
                }
            }
        }

        visible as f32 / (n * n) as f32
    }

    fn is_visible_from(&self, scene: &Scene, position: Vec3, light_position: Vec3, ray_start_offset: f32) -> bool {
        let to_light = light_position - position;
        let distance = to_light.length();
        if distance <= ray_start_offset {
            return true;
        }

        let shadow = Ray::new(position, to_light / distance)
            .with_range(ray_start_offset, distance)
            .with_shadow(true)
            .with_fast_occlusion(true);

        !scene.is_occluded(&shadow)
    }
}

/// All lights of a scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lights {
    pub ambient: AmbientLight,
    pub directional: Vec<DirectionalLight>,
    pub point: Vec<PointLight>,
}

impl Lights {
    pub fn is_empty(&self) -> bool {
        self.ambient.intensity == 0.0 && self.directional.is_empty() && self.point.is_empty()
    }
}
