//! Tracer state and render passes.
//!
//! [`TracerState`] owns the active tracer and the film. Each call to
//! [`TracerState::render_pass`] renders every bucket once in parallel and
//! merges the results into the film.

use std::sync::atomic::AtomicBool;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bucket::{generate_buckets, render_bucket, BucketContext, BucketResult, DEFAULT_BUCKET_SIZE};
use crate::camera::Camera;
use crate::film::Film;
use crate::sampler::SamplerType;
use crate::scene::Scene;
use crate::tracer::{Tracer, TracerType};

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Bucket edge length in pixels
    pub bucket_size: u32,
    /// Base seed; every bucket of every pass derives its own stream
    pub seed: u64,
    /// Pixel sample pattern
    pub sampler: SamplerType,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            bucket_size: DEFAULT_BUCKET_SIZE,
            seed: 0,
            sampler: SamplerType::Jittered,
        }
    }
}

/// Outcome of one render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStatus {
    Completed,
    /// Cancelled before every pixel was rendered; finished pixels were kept
    Cancelled,
}

/// Active tracer plus the film it renders into.
pub struct TracerState {
    tracer: Box<dyn Tracer>,
    film: Film,
    /// Passes started on the current film, cancelled ones included. Drives
    /// the per-bucket seeds, so no two passes share a sample stream.
    pass_index: u32,
}

impl TracerState {
    pub fn new(tracer_type: TracerType, width: u32, height: u32) -> Self {
        Self {
            tracer: tracer_type.create(),
            film: Film::new(width, height),
            pass_index: 0,
        }
    }

    pub fn tracer_type(&self) -> TracerType {
        self.tracer.tracer_type()
    }

    pub fn film(&self) -> &Film {
        &self.film
    }

    /// Switch tracer. The film is cleared.
    pub fn set_tracer_type(&mut self, tracer_type: TracerType) {
        log::debug!("Switching tracer: {} -> {}", self.tracer_type(), tracer_type);
        self.tracer = tracer_type.create();
        self.film.clear();
        self.pass_index = 0;
    }

    /// Switch between the ray and path tracers. The film is cleared.
    pub fn toggle(&mut self) {
        self.set_tracer_type(self.tracer_type().toggled());
    }

    /// Change resolution. The film is cleared.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.film.resize(width, height);
        self.pass_index = 0;
    }

    /// Render one pass of the whole image.
    ///
    /// Path passes add to what the film holds; ray and preview passes replace
    /// it. `camera` must match the film's resolution.
    pub fn render_pass(
        &mut self,
        scene: &Scene,
        camera: &Camera,
        config: &RenderConfig,
        cancel: &AtomicBool,
    ) -> PassStatus {
        let tracer_type = self.tracer_type();
        if !tracer_type.accumulates() {
            self.film.clear();
        }

        let start = Instant::now();
        let buckets = generate_buckets(self.film.width(), self.film.height(), config.bucket_size);

        let ctx = BucketContext {
            scene,
            camera,
            tracer: self.tracer.as_ref(),
            sampler: config.sampler.as_sampler(),
            seed: config.seed,
            pass: self.pass_index,
            center_single_sample: !tracer_type.accumulates(),
            cancel,
        };

        let results: Vec<BucketResult> = buckets.par_iter().map(|bucket| render_bucket(bucket, &ctx)).collect();
        self.pass_index = self.pass_index.wrapping_add(1);

        let mut complete = true;
        for result in &results {
            complete &= result.is_complete();
            for (x, y, color) in result.iter() {
                self.film.add(x, y, color);
            }
        }

        if !complete {
            log::debug!("Render pass cancelled after {} ms", start.elapsed().as_millis());
            return PassStatus::Cancelled;
        }

        self.film.pass_count += 1;
        log::debug!(
            "{} pass {} finished ({} buckets, {} ms)",
            tracer_type,
            self.film.pass_count,
            results.len(),
            start.elapsed().as_millis()
        );

        PassStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::DirectionalLight;
    use crate::material::{Color, Material};
    use crate::scene::SceneSettings;
    use crate::primitive::{Intersection, Primitive};
    use crate::{Sphere, Triangle};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use vela_math::{Aabb, Ray, Vec3};

    fn test_scene(tracer_type: TracerType) -> Scene {
        let mut scene = Scene::new(
            SceneSettings::default()
                .with_tracer(tracer_type)
                .with_background(Color::new(0.2, 0.3, 0.5)),
        );
        let white = scene.add_material(Material::diffuse(Color::splat(0.8)));
        let light = scene.add_material(Material::emissive(Color::splat(4.0)));

        scene.add_primitive(Arc::new(Triangle::new(
            Vec3::new(-50.0, -1.0, 50.0),
            Vec3::new(50.0, -1.0, 50.0),
            Vec3::new(0.0, -1.0, -50.0),
            white,
        )));
        scene.add_primitive(Arc::new(Sphere::new(Vec3::new(0.0, 0.0, -3.0), 1.0, white)));
        scene.add_primitive(Arc::new(Sphere::new(Vec3::new(0.0, 6.0, -3.0), 2.0, light)));
        scene
            .lights
            .directional
            .push(DirectionalLight::new(Vec3::new(-0.3, -1.0, -0.2), Color::ONE, 1.0));
        scene.initialize().unwrap();
        scene
    }

    fn camera() -> Camera {
        Camera::new()
            .with_resolution(24, 16)
            .with_position(Vec3::new(0.0, 0.5, 2.0), Vec3::new(0.0, 0.0, -3.0), Vec3::Y)
    }

    fn config() -> RenderConfig {
        RenderConfig {
            bucket_size: 8,
            seed: 42,
            sampler: SamplerType::Jittered,
        }
    }

    fn pixels(film: &Film) -> Vec<Color> {
        (0..film.height())
            .flat_map(|y| (0..film.width()).map(move |x| (x, y)))
            .map(|(x, y)| film.pixel(x, y))
            .collect()
    }

    #[test]
    fn test_render_is_deterministic_for_a_seed() {
        let scene = test_scene(TracerType::Path);
        let cancel = AtomicBool::new(false);

        let render = || {
            let mut state = TracerState::new(TracerType::Path, 24, 16);
            for _ in 0..2 {
                assert_eq!(state.render_pass(&scene, &camera(), &config(), &cancel), PassStatus::Completed);
            }
            pixels(state.film())
        };

        assert_eq!(render(), render());
    }

    #[test]
    fn test_path_passes_accumulate() {
        let scene = test_scene(TracerType::Path);
        let cancel = AtomicBool::new(false);
        let mut state = TracerState::new(TracerType::Path, 24, 16);

        state.render_pass(&scene, &camera(), &config(), &cancel);
        state.render_pass(&scene, &camera(), &config(), &cancel);

        assert_eq!(state.film().pass_count, 2);
        assert_eq!(state.film().sample_count(0, 0), 2);
        assert_eq!(state.film().total_samples(), 2 * 24 * 16);
    }

    #[test]
    fn test_ray_passes_replace() {
        let scene = test_scene(TracerType::Ray);
        let cancel = AtomicBool::new(false);
        let mut state = TracerState::new(TracerType::Ray, 24, 16);

        state.render_pass(&scene, &camera(), &config(), &cancel);
        let first = pixels(state.film());
        state.render_pass(&scene, &camera(), &config(), &cancel);

        assert_eq!(state.film().sample_count(5, 5), 1);
        assert_eq!(pixels(state.film()), first);
        // Top row looks past the floor into the background
        assert_eq!(state.film().pixel(0, 0), Color::new(0.2, 0.3, 0.5));
    }

    #[test]
    fn test_switching_tracer_clears_film() {
        let scene = test_scene(TracerType::Path);
        let cancel = AtomicBool::new(false);
        let mut state = TracerState::new(TracerType::Path, 24, 16);

        state.render_pass(&scene, &camera(), &config(), &cancel);
        assert!(state.film().total_samples() > 0);

        state.toggle();
        assert_eq!(state.tracer_type(), TracerType::Ray);
        assert_eq!(state.film().total_samples(), 0);
        assert_eq!(state.film().pass_count, 0);

        state.render_pass(&scene, &camera(), &config(), &cancel);
        state.set_tracer_type(TracerType::Preview);
        assert_eq!(state.film().total_samples(), 0);

        state.toggle();
        assert_eq!(state.tracer_type(), TracerType::Ray);
    }

    #[test]
    fn test_cancel_stops_between_pixels() {
        let scene = test_scene(TracerType::Path);
        let cancel = AtomicBool::new(true);
        let mut state = TracerState::new(TracerType::Path, 24, 16);

        assert_eq!(state.render_pass(&scene, &camera(), &config(), &cancel), PassStatus::Cancelled);
        assert_eq!(state.film().total_samples(), 0);
        assert_eq!(state.film().pass_count, 0);

        cancel.store(false, Ordering::Relaxed);
        assert_eq!(state.render_pass(&scene, &camera(), &config(), &cancel), PassStatus::Completed);
        assert_eq!(state.film().pass_count, 1);
    }

    /// Wraps a primitive and raises the cancel flag once, after `limit` queries.
    struct CancelAfter {
        inner: Triangle,
        calls: AtomicUsize,
        limit: usize,
        cancel: Arc<AtomicBool>,
    }

    impl Primitive for CancelAfter {
        fn intersect(&self, ray: &Ray, intersection: &mut Intersection) -> bool {
            if self.calls.fetch_add(1, Ordering::Relaxed) + 1 == self.limit {
                self.cancel.store(true, Ordering::Relaxed);
            }
            self.inner.intersect(ray, intersection)
        }

        fn bounding_box(&self) -> Aabb {
            self.inner.bounding_box()
        }

        fn material_id(&self) -> Option<usize> {
            self.inner.material_id()
        }
    }

    #[test]
    fn test_pass_after_cancel_draws_fresh_samples() {
        let cancel = Arc::new(AtomicBool::new(false));

        // Diffuse floor under a huge emitter: every path sample is 2|cos|
        let mut scene = Scene::new(SceneSettings::default().with_max_path_length(2));
        let white = scene.add_material(Material::diffuse(Color::ONE));
        let light = scene.add_material(Material::emissive(Color::ONE));
        scene.add_primitive(Arc::new(CancelAfter {
            inner: Triangle::new(
                Vec3::new(-100.0, 0.0, 100.0),
                Vec3::new(100.0, 0.0, 100.0),
                Vec3::new(0.0, 0.0, -100.0),
                white,
            ),
            calls: AtomicUsize::new(0),
            limit: 40,
            cancel: cancel.clone(),
        }));
        scene.add_primitive(Arc::new(Sphere::new(Vec3::new(0.0, 1000.0, 0.0), 999.0, light)));
        scene.initialize().unwrap();

        let camera = Camera::new()
            .with_resolution(24, 16)
            .with_position(Vec3::new(0.0, 0.5, 0.0), Vec3::new(0.0, 0.0, -0.5), Vec3::Y);
        let mut state = TracerState::new(TracerType::Path, 24, 16);

        assert_eq!(state.render_pass(&scene, &camera, &config(), &cancel), PassStatus::Cancelled);
        let first = pixels(state.film());
        let rendered: Vec<usize> = (0..first.len())
            .filter(|&i| state.film().sample_count(i as u32 % 24, i as u32 / 24) == 1)
            .collect();
        assert!(!rendered.is_empty());

        cancel.store(false, Ordering::Relaxed);
        assert_eq!(state.render_pass(&scene, &camera, &config(), &cancel), PassStatus::Completed);
        assert_eq!(state.film().pass_count, 1);

        let second = pixels(state.film());
        for &i in &rendered {
            let (x, y) = (i as u32 % 24, i as u32 / 24);
            assert_eq!(state.film().sample_count(x, y), 2);
            // Identical means would mean the second pass replayed the first
            if first[i] != Color::ZERO {
                assert_ne!(second[i], first[i], "pixel ({x}, {y}) got the same sample twice");
            }
        }
    }

    #[test]
    fn test_preview_pass() {
        let scene = test_scene(TracerType::Preview);
        let cancel = AtomicBool::new(false);
        let mut state = TracerState::new(TracerType::Preview, 24, 16);

        state.render_pass(&scene, &camera(), &config(), &cancel);
        // Center of the image sees the diffuse sphere head-on
        let center = state.film().pixel(12, 8);
        assert!(center.x > 0.5 && center.x <= 0.8, "center {center}");
    }

    #[test]
    fn test_render_config_defaults() {
        let config: RenderConfig = serde_json::from_str(r#"{ "seed": 7 }"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.bucket_size, DEFAULT_BUCKET_SIZE);
        assert_eq!(config.sampler, SamplerType::Jittered);
    }
}
