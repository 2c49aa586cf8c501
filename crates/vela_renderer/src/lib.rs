//! Vela renderer - BVH-accelerated CPU ray and path tracing.
//!
//! A scene of spheres and triangles is indexed by a bounding volume hierarchy
//! and rendered in parallel buckets by one of four tracers: a Whitted-style
//! ray tracer, a unidirectional path tracer that accumulates over passes, an
//! ambient occlusion tracer, and a flat preview tracer.

mod ambient_occlusion;
mod bucket;
mod bvh;
mod bvh_config;
mod camera;
mod film;
mod light;
mod material;
mod pathtracer;
mod preview;
mod primitive;
mod raytracer;
mod renderer;
mod sampler;
mod scene;
mod sphere;
mod texture;
mod tracer;
mod triangle;

pub use ambient_occlusion::AmbientOcclusionTracer;
pub use bucket::{bucket_seed, generate_buckets, render_bucket, Bucket, BucketContext, BucketResult, DEFAULT_BUCKET_SIZE};
pub use bvh::{sah_cost, Bvh, NodeRef};
pub use bvh_config::{AxisSelection, AxisSplit, BvhBuildInfo, BvhError, BvhResult};
pub use camera::Camera;
pub use film::{color_to_rgba, linear_to_gamma, Film};
pub use light::{AmbientLight, AreaLight, DirectionalLight, Lights, PointLight};
pub use material::{reflect, refract, schlick, Color, Material};
pub use pathtracer::PathTracer;
pub use preview::PreviewTracer;
pub use primitive::{intersect_all, Intersection, Primitive, PrimitiveHandle};
pub use raytracer::RayTracer;
pub use renderer::{PassStatus, RenderConfig, TracerState};
pub use sampler::{concentric_disc, permute, JitteredSampler, RandomSampler, Sampler, SamplerType, Stratum};
pub use scene::{
    AmbientOcclusionSettings, PathTracerSettings, RayTracerSettings, Scene, SceneError, SceneResult, SceneSettings,
};
pub use sphere::Sphere;
pub use texture::{CheckerTexture, SolidTexture, Texture};
pub use tracer::{Tracer, TracerType};
pub use triangle::Triangle;

/// Re-export common math types from vela_math
pub use vela_math::{Aabb, Interval, Onb, Ray, Vec2, Vec3};
