//! Ambient occlusion tracer.

use rand::RngCore;
use vela_math::Ray;

use crate::material::Color;
use crate::primitive::Intersection;
use crate::sampler::{RandomSampler, Sampler, Stratum};
use crate::scene::Scene;
use crate::tracer::{Tracer, TracerType};

/// Fraction of the cosine-weighted hemisphere above each hit that is open
/// within `max_distance`. One occlusion ray per sample, accumulated over passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmbientOcclusionTracer;

impl Tracer for AmbientOcclusionTracer {
    fn trace(&self, scene: &Scene, ray: &Ray, rng: &mut dyn RngCore) -> Color {
        let settings = &scene.settings().ambient_occlusion;

        let mut intersection = Intersection::default();
        if !scene.intersect(ray, &mut intersection) {
            return scene.settings().background_color;
        }

        let Some(material) = scene.material(intersection.material_id) else {
            return scene.settings().background_color;
        };

        if material.emissive {
            return material.emittance_at(&intersection);
        }

        let direction = RandomSampler.sample_hemisphere(&intersection.onb, 1.0, Stratum::SINGLE, 0, rng);
        let occlusion = Ray::new(intersection.position, direction)
            .with_range(settings.ray_start_offset, settings.max_distance)
            .with_shadow(true)
            .with_fast_occlusion(true);

        if scene.is_occluded(&occlusion) {
            return Color::ZERO;
        }

        if settings.use_reflectance {
            material.diffuse_at(&intersection)
        } else {
            Color::ONE
        }
    }

    fn pixel_samples(&self, scene: &Scene) -> u32 {
        scene.settings().ambient_occlusion.pixel_samples.max(1)
    }

    fn tracer_type(&self) -> TracerType {
        TracerType::AmbientOcclusion
    }
}
