//! Preview tracer for quick, noise-free feedback.

use rand::RngCore;
use vela_math::Ray;

use crate::material::Color;
use crate::primitive::Intersection;
use crate::scene::Scene;
use crate::tracer::{Tracer, TracerType};

/// Diffuse color scaled by the facing ratio. No lights, no shadows, one
/// sample per pixel.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreviewTracer;

impl Tracer for PreviewTracer {
    fn trace(&self, scene: &Scene, ray: &Ray, _rng: &mut dyn RngCore) -> Color {
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

        let facing = intersection.normal.dot(-ray.direction()).abs();
        material.diffuse_at(&intersection) * facing
    }

    fn pixel_samples(&self, _scene: &Scene) -> u32 {
        1
    }

    fn tracer_type(&self) -> TracerType {
        TracerType::Preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use crate::scene::SceneSettings;
    use crate::Sphere;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;
    use vela_math::Vec3;

    #[test]
    fn test_preview_shading() {
        let mut scene = Scene::new(SceneSettings::default().with_background(Color::splat(0.25)));
        let red = scene.add_material(Material::diffuse(Color::new(1.0, 0.0, 0.0)));
        let light = scene.add_material(Material::emissive(Color::splat(3.0)));
        scene.add_primitive(Arc::new(Sphere::new(Vec3::new(0.0, 0.0, -5.0), 1.0, red)));
        scene.add_primitive(Arc::new(Sphere::new(Vec3::new(5.0, 0.0, -5.0), 1.0, light)));
        scene.initialize().unwrap();

        let mut rng = StdRng::seed_from_u64(42);

        // Head-on hit: full facing ratio
        let c = PreviewTracer.trace(&scene, &Ray::new(Vec3::ZERO, Vec3::NEG_Z), &mut rng);
        assert!((c - Color::new(1.0, 0.0, 0.0)).length() < 1e-5);

        // Grazing hit is darker
        let c = PreviewTracer.trace(&scene, &Ray::new(Vec3::new(0.9, 0.0, 0.0), Vec3::NEG_Z), &mut rng);
        assert!(c.x > 0.0 && c.x < 0.5);

        let c = PreviewTracer.trace(&scene, &Ray::new(Vec3::new(5.0, 0.0, 0.0), Vec3::NEG_Z), &mut rng);
        assert_eq!(c, Color::splat(3.0));

        let c = PreviewTracer.trace(&scene, &Ray::new(Vec3::ZERO, Vec3::Z), &mut rng);
        assert_eq!(c, Color::splat(0.25));

        assert_eq!(PreviewTracer.pixel_samples(&scene), 1);
    }
}
