//! Unidirectional path tracer.

use rand::RngCore;
use vela_math::Ray;

use crate::material::Color;
use crate::primitive::Intersection;
use crate::sampler::{RandomSampler, Sampler, Stratum};
use crate::scene::Scene;
use crate::tracer::{Tracer, TracerType};

/// Path tracer: follows one diffuse bounce per hit until it reaches a light,
/// escapes, or runs out of path length. Images converge over many passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathTracer;

impl PathTracer {
    /// Radiance along `ray` for a path that already has `iteration` vertices.
    pub fn trace_path(&self, scene: &Scene, ray: &Ray, iteration: u32, rng: &mut dyn RngCore) -> Color {
        let settings = &scene.settings().path_tracer;

        if iteration >= settings.max_path_length {
            return Color::ZERO;
        }

        let mut intersection = Intersection::default();
        if !scene.intersect(ray, &mut intersection) {
            return Color::ZERO;
        }

        let Some(material) = scene.material(intersection.material_id) else {
            return Color::ZERO;
        };

        if material.emissive {
            return material.emittance_at(&intersection);
        }

        let direction = RandomSampler.sample_hemisphere(&intersection.onb, 1.0, Stratum::SINGLE, 0, rng);
        let next = Ray::new(intersection.position + direction * settings.ray_start_offset, direction);

        let reflectance = material.diffuse_at(&intersection);
        let weight = 2.0 * reflectance * direction.dot(intersection.normal).abs();

        weight * self.trace_path(scene, &next, iteration + 1, rng)
    }
}

impl Tracer for PathTracer {
    fn trace(&self, scene: &Scene, ray: &Ray, rng: &mut dyn RngCore) -> Color {
        self.trace_path(scene, ray, 0, rng)
    }

    fn pixel_samples(&self, scene: &Scene) -> u32 {
        scene.settings().path_tracer.pixel_samples.max(1)
    }

    fn tracer_type(&self) -> TracerType {
        TracerType::Path
    }
}
