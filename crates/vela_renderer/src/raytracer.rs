//! Whitted-style ray tracer.
//!
//! Direct lighting from the scene's lights with shadow rays, plus recursive
//! mirror reflection and refraction up to `max_ray_iterations`.

use rand::RngCore;
use vela_math::{Ray, Vec3};

use crate::material::{reflect, refract, schlick, Color, Material};
use crate::primitive::Intersection;
use crate::scene::Scene;
use crate::tracer::{Tracer, TracerType};

#[derive(Debug, Clone, Copy, Default)]
pub struct RayTracer;

impl RayTracer {
    /// Radiance along `ray` at recursion depth `iteration`.
    pub fn trace_ray(&self, scene: &Scene, ray: &Ray, iteration: u32, rng: &mut dyn RngCore) -> Color {
        let settings = &scene.settings().ray_tracer;

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

        let local = if material.skip_lighting {
            material.diffuse_at(&intersection)
        } else {
            shade_local(scene, material, ray, &intersection, rng)
        };

        let mut reflectance = material.ray_reflectance;
        let mut transmittance = material.ray_transmittance;

        if iteration >= settings.max_ray_iterations || (reflectance <= 0.0 && transmittance <= 0.0) {
            return local;
        }

        let direction = ray.direction();
        let normal = intersection.normal;
        let (n1, n2) = if intersection.front_face {
            (1.0, material.refractive_index)
        } else {
            (material.refractive_index, 1.0)
        };

        let mut transmitted_direction = None;
        if transmittance > 0.0 {
            match refract(direction, normal, n1 / n2) {
                Some(t) => transmitted_direction = Some(t),
                None => {
                    reflectance += transmittance;
                    transmittance = 0.0;
                }
            }
        }

        if material.fresnel_reflection {
            if let Some(t) = transmitted_direction {
                let cosine = if n1 <= n2 {
                    (-direction).dot(normal)
                } else {
                    t.dot(-normal)
                };
                let fresnel = schlick(cosine, n1, n2);
                let total = reflectance + transmittance;
                reflectance = total * fresnel;
                transmittance = total * (1.0 - fresnel);
            }
        }

        let offset = settings.ray_start_offset;
        let position = intersection.position;

        let reflected = if reflectance > 0.0 {
            let r = reflect(direction, normal).normalize_or_zero();
            self.trace_ray(scene, &Ray::new(position + r * offset, r), iteration + 1, rng)
        } else {
            Color::ZERO
        };

        let transmitted = match transmitted_direction {
            Some(t) if transmittance > 0.0 => {
                let t = t.normalize_or_zero();
                self.trace_ray(scene, &Ray::new(position + t * offset, t), iteration + 1, rng)
            }
            _ => Color::ZERO,
        };

        local * (1.0 - reflectance - transmittance).max(0.0) + reflected * reflectance + transmitted * transmittance
    }
}

impl Tracer for RayTracer {
    fn trace(&self, scene: &Scene, ray: &Ray, rng: &mut dyn RngCore) -> Color {
        self.trace_ray(scene, ray, 0, rng)
    }

    fn pixel_samples(&self, scene: &Scene) -> u32 {
        scene.settings().ray_tracer.pixel_samples.max(1)
    }

    fn tracer_type(&self) -> TracerType {
        TracerType::Ray
    }
}

/// Ambient plus diffuse and Phong specular from every visible light.
fn shade_local(
    scene: &Scene,
    material: &Material,
    ray: &Ray,
    intersection: &Intersection,
    rng: &mut dyn RngCore,
) -> Color {
    let lights = &scene.lights;
    let offset = scene.settings().ray_tracer.ray_start_offset;
    let position = intersection.position;
    let normal = intersection.normal;
    let to_viewer = -ray.direction();
    let diffuse = material.diffuse_at(intersection);

    let mut color = material.ambient_reflectance * lights.ambient.radiance();

    let phong = |to_light: Vec3, radiance: Color| -> Color {
        let cosine = normal.dot(to_light);
        let mut c = diffuse * cosine * radiance;
        if material.specular_reflectance != Color::ZERO {
            let highlight = reflect(-to_light, normal).dot(to_viewer).max(0.0);
            c += material.specular_reflectance * highlight.powf(material.shininess) * radiance;
        }
        c
    };

    for light in &lights.directional {
        let to_light = light.direction_to_light();
        if normal.dot(to_light) <= 0.0 {
            continue;
        }

        let visibility = light.visibility(scene, position, offset);
        if visibility > 0.0 {
            color += phong(to_light, light.radiance() * visibility);
        }
    }

    for light in &lights.point {
        let to_light = light.position - position;
        let distance2 = to_light.length_squared();
        let to_light = to_light.normalize_or_zero();
        if normal.dot(to_light) <= 0.0 {
            continue;
        }

        let visibility = light.visibility(scene, position, offset, rng);
        if visibility > 0.0 {
            color += phong(to_light, light.radiance(distance2) * visibility);
        }
    }

    color
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::{AmbientLight, DirectionalLight, PointLight};
    use crate::scene::SceneSettings;
    use crate::{Sphere, Triangle};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn floor(scene: &mut Scene, material_id: usize) {
        scene.add_primitive(Arc::new(Triangle::new(
            Vec3::new(-100.0, 0.0, 100.0),
            Vec3::new(100.0, 0.0, 100.0),
            Vec3::new(0.0, 0.0, -100.0),
            material_id,
        )));
    }

    #[test]
    fn test_miss_returns_background() {
        let mut scene = Scene::new(SceneSettings::default().with_background(Color::new(0.1, 0.2, 0.3)));
        scene.initialize().unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        let c = RayTracer.trace(&scene, &Ray::new(Vec3::ZERO, Vec3::Z), &mut rng);
        assert_eq!(c, Color::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn test_lambert_and_shadow() {
        let mut scene = Scene::new(SceneSettings::default());
        let white = scene.add_material(Material::diffuse(Color::ONE));
        floor(&mut scene, white);
        scene.add_primitive(Arc::new(Sphere::new(Vec3::new(5.0, 2.0, 0.0), 1.0, white)));
        scene.lights.directional.push(DirectionalLight::new(Vec3::NEG_Y, Color::ONE, 1.0));
        scene.initialize().unwrap();

        let mut rng = StdRng::seed_from_u64(42);

        // Straight down onto the floor: full Lambert term
        let lit = RayTracer.trace(&scene, &Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Y), &mut rng);
        assert!((lit - Color::ONE).length() < 1e-4, "lit {lit}");

        // Under the sphere
        let shadowed = RayTracer.trace(&scene, &Ray::new(Vec3::new(5.0, 0.5, 0.0), Vec3::NEG_Y), &mut rng);
        assert_eq!(shadowed, Color::ZERO);
    }

    #[test]
    fn test_point_light_inverse_square() {
        let mut scene = Scene::new(SceneSettings::default());
        let white = scene.add_material(Material::diffuse(Color::ONE));
        floor(&mut scene, white);
        scene.lights.point.push(PointLight::new(Vec3::new(0.0, 2.0, 0.0), Color::ONE, 8.0));
        scene.initialize().unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        let c = RayTracer.trace(&scene, &Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Y), &mut rng);
        assert!((c - Color::splat(2.0)).length() < 1e-4, "color {c}");
    }

    #[test]
    fn test_ambient_only() {
        let mut scene = Scene::new(SceneSettings::default());
        let grey = scene.add_material(Material::diffuse(Color::splat(0.5)));
        floor(&mut scene, grey);
        scene.lights.ambient = AmbientLight::new(Color::ONE, 0.2);
        scene.initialize().unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        let c = RayTracer.trace(&scene, &Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Y), &mut rng);
        assert!((c - Color::splat(0.1)).length() < 1e-5);
    }

    #[test]
    fn test_mirror_reflects_emitter() {
        let mut scene = Scene::new(SceneSettings::default());
        let mirror = scene.add_material(Material::mirror(Color::ONE));
        let light = scene.add_material(Material::emissive(Color::new(1.0, 0.5, 0.25)));
        floor(&mut scene, mirror);
        scene.add_primitive(Arc::new(Sphere::new(Vec3::new(2.0, 2.0, 0.0), 0.5, light)));
        scene.initialize().unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        // Bounces off the floor at (1, 0, 0) and climbs to the sphere
        let dir = Vec3::new(1.0, -2.0, 0.0).normalize();
        let c = RayTracer.trace(&scene, &Ray::new(Vec3::new(0.0, 2.0, 0.0), dir), &mut rng);
        assert!((c - Color::new(1.0, 0.5, 0.25)).length() < 1e-4, "color {c}");
    }

    #[test]
    fn test_recursion_limit_returns_local_shading() {
        let mut settings = SceneSettings::default();
        settings.ray_tracer.max_ray_iterations = 0;
        let mut scene = Scene::new(settings);
        let mirror = scene.add_material(Material::mirror(Color::ONE).with_ambient(Color::ONE));
        floor(&mut scene, mirror);
        scene.lights.ambient = AmbientLight::new(Color::ONE, 0.5);
        scene.initialize().unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        let c = RayTracer.trace(&scene, &Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Y), &mut rng);
        assert_eq!(c, Color::splat(0.5));
    }

    #[test]
    fn test_glass_passes_light_through() {
        let mut scene = Scene::new(SceneSettings::default());
        let glass = scene.add_material(Material::glass(1.5));
        let light = scene.add_material(Material::emissive(Color::ONE));
        scene.add_primitive(Arc::new(Sphere::new(Vec3::new(0.0, 0.0, -3.0), 1.0, glass)));
        scene.add_primitive(Arc::new(Sphere::new(Vec3::new(0.0, 0.0, -10.0), 2.0, light)));
        scene.settings_mut().ray_tracer.max_ray_iterations = 4;
        scene.initialize().unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        let c = RayTracer.trace(&scene, &Ray::new(Vec3::ZERO, Vec3::NEG_Z), &mut rng);

        // Head-on: two interfaces, each passing 96%
        assert!(c.x > 0.9 && c.x < 1.0, "color {c}");
    }
}
