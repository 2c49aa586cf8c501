//! Simple render example.
//!
//! Renders a small scene of spheres on a checkered floor and saves it as PNG.
//!
//! ```text
//! cargo run --example simple_render --release -- [ray|path|preview|ao] [passes]
//! ```

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vela_renderer::{
    AreaLight, BvhBuildInfo, Camera, CheckerTexture, Color, DirectionalLight, Material, PassStatus, PointLight,
    RenderConfig, SamplerType, Scene, SceneSettings, Sphere, TracerState, TracerType, Triangle, Vec3,
};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 360;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let tracer_type: TracerType = match args.next() {
        Some(name) => name.parse()?,
        None => TracerType::Ray,
    };
    let passes: u32 = match args.next() {
        Some(n) => n.parse().context("passes must be a positive integer")?,
        None if tracer_type.accumulates() => 64,
        None => 1,
    };

    let start = std::time::Instant::now();
    let scene = build_scene(tracer_type)?;
    log::info!("Scene built in {:?}", start.elapsed());

    let camera = Camera::new()
        .with_resolution(WIDTH, HEIGHT)
        .with_position(Vec3::new(13.0, 2.0, 3.0), Vec3::ZERO, Vec3::Y)
        .with_fov(20.0);

    let config = RenderConfig {
        seed: 42,
        ..Default::default()
    };
    let cancel = AtomicBool::new(false);
    let mut state = TracerState::new(tracer_type, WIDTH, HEIGHT);

    log::info!("Rendering {}x{} with the {} tracer, {} passes", WIDTH, HEIGHT, tracer_type, passes);
    let start = std::time::Instant::now();
    for _ in 0..passes {
        if state.render_pass(&scene, &camera, &config, &cancel) == PassStatus::Cancelled {
            break;
        }
    }
    log::info!("Rendered in {:?}", start.elapsed());

    let filename = format!("output_{tracer_type}.png");
    let image = image::RgbaImage::from_raw(WIDTH, HEIGHT, state.film().to_rgba8())
        .ok_or_else(|| anyhow!("film size does not match {WIDTH}x{HEIGHT}"))?;
    image.save(&filename).with_context(|| format!("failed to save {filename}"))?;
    log::info!("Saved to {}", filename);

    Ok(())
}

fn build_scene(tracer_type: TracerType) -> Result<Scene> {
    let settings = SceneSettings::default()
        .with_tracer(tracer_type)
        .with_background(Color::new(0.5, 0.7, 1.0))
        .with_bvh(BvhBuildInfo::default().with_sah(4))
        .with_max_path_length(5);
    let mut scene = Scene::new(settings);

    let checker = Arc::new(CheckerTexture::new(Color::splat(0.8), Color::splat(0.3), 1.0));
    let ground = scene.add_material(Material::diffuse(Color::ONE).with_diffuse_texture(checker));
    let glass = scene.add_material(Material::glass(1.5));
    let brown = scene.add_material(Material::diffuse(Color::new(0.4, 0.2, 0.1)));
    let mirror = scene.add_material(Material::mirror(Color::new(0.7, 0.6, 0.5)));
    let sky = scene.add_material(Material::emissive(Color::splat(1.5)));

    // Ground: two large triangles with texture coordinates in world units
    let (a, b, c, d) = (
        Vec3::new(-50.0, 0.0, -50.0),
        Vec3::new(50.0, 0.0, -50.0),
        Vec3::new(50.0, 0.0, 50.0),
        Vec3::new(-50.0, 0.0, 50.0),
    );
    let uv = |p: Vec3| vela_renderer::Vec2::new(p.x, p.z);
    scene.add_primitive(Arc::new(Triangle::new(a, b, c, ground).with_texcoords([uv(a), uv(b), uv(c)])));
    scene.add_primitive(Arc::new(Triangle::new(a, c, d, ground).with_texcoords([uv(a), uv(c), uv(d)])));

    scene.add_primitive(Arc::new(Sphere::new(Vec3::new(0.0, 1.0, 0.0), 1.0, glass)));
    scene.add_primitive(Arc::new(Sphere::new(Vec3::new(-4.0, 1.0, 0.0), 1.0, brown)));
    scene.add_primitive(Arc::new(Sphere::new(Vec3::new(4.0, 1.0, 0.0), 1.0, mirror)));

    // Emitter for the path tracer
    if tracer_type == TracerType::Path {
        scene.add_primitive(Arc::new(Sphere::new(Vec3::new(0.0, 60.0, 0.0), 40.0, sky)));
    }

    // Small random spheres
    let mut rng = StdRng::seed_from_u64(7);
    for a in -5..5 {
        for b in -5..5 {
            let center = Vec3::new(a as f32 + 0.9 * rng.gen::<f32>(), 0.2, b as f32 + 0.9 * rng.gen::<f32>());
            if (center - Vec3::new(4.0, 0.2, 0.0)).length() <= 0.9 {
                continue;
            }

            let choose_mat: f32 = rng.gen();
            let material = if choose_mat < 0.8 {
                let albedo = Color::new(
                    rng.gen::<f32>() * rng.gen::<f32>(),
                    rng.gen::<f32>() * rng.gen::<f32>(),
                    rng.gen::<f32>() * rng.gen::<f32>(),
                );
                Material::diffuse(albedo).with_specular(Color::splat(0.3), 32.0)
            } else if choose_mat < 0.95 {
                Material::mirror(Color::splat(0.5 + 0.5 * rng.gen::<f32>()))
            } else {
                Material::glass(1.5)
            };

            let id = scene.add_material(material);
            scene.add_primitive(Arc::new(Sphere::new(center, 0.2, id)));
        }
    }

    scene.lights.ambient.intensity = 0.1;
    scene
        .lights
        .directional
        .push(DirectionalLight::new(Vec3::new(-1.0, -2.0, -0.5), Color::ONE, 0.8));
    scene.lights.point.push(
        PointLight::new(Vec3::new(2.0, 6.0, 4.0), Color::new(1.0, 0.9, 0.8), 20.0).with_area(AreaLight {
            radius: 0.5,
            sample_count_sqrt: 3,
            sampler: SamplerType::Jittered,
        }),
    );

    scene.initialize()?;
    log::info!("Scene has {} primitives", scene.primitive_count());

    Ok(scene)
}
