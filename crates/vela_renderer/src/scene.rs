//! Scene container: primitives, materials, lights and settings.
//!
//! A scene is filled in, then [`Scene::initialize`] validates it and builds
//! the BVH. After that it is only read, and is shared by all render threads.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vela_math::{Aabb, Onb, Ray};

use crate::bvh::Bvh;
use crate::bvh_config::{BvhBuildInfo, BvhError};
use crate::light::Lights;
use crate::material::{Color, Material};
use crate::primitive::{Intersection, Primitive, PrimitiveHandle};
use crate::tracer::TracerType;

/// Errors reported while preparing a scene for rendering.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("BVH build failed: {0}")]
    Bvh(#[from] BvhError),

    #[error("Primitive {primitive} references unknown material id {material_id}")]
    UnknownMaterial { primitive: usize, material_id: usize },

    #[error("Path tracer max path length must be at least 1")]
    InvalidPathLength,

    #[error("Unknown tracer type: {0:?} (expected \"ray\", \"path\", \"preview\" or \"ao\")")]
    UnknownTracerType(String),

    #[error("Unknown sampler type: {0:?} (expected \"random\" or \"jittered\")")]
    UnknownSamplerType(String),
}

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// Ray tracer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RayTracerSettings {
    /// Reflection/refraction recursion depth
    pub max_ray_iterations: u32,
    /// Secondary and shadow rays start this far from the surface
    pub ray_start_offset: f32,
    /// Rays per pixel side (n x n stratified grid)
    pub pixel_samples: u32,
}

impl Default for RayTracerSettings {
    fn default() -> Self {
        Self {
            max_ray_iterations: 3,
            ray_start_offset: 1e-4,
            pixel_samples: 1,
        }
    }
}

/// Path tracer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathTracerSettings {
    /// Vertices per path, including the camera hit
    pub max_path_length: u32,
    pub ray_start_offset: f32,
    /// Paths per pixel side per pass (n x n stratified grid)
    pub pixel_samples: u32,
}

impl Default for PathTracerSettings {
    fn default() -> Self {
        Self {
            max_path_length: 3,
            ray_start_offset: 1e-4,
            pixel_samples: 1,
        }
    }
}

/// Ambient occlusion tracer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientOcclusionSettings {
    /// Occluders further away than this are ignored
    pub max_distance: f32,
    /// Scale the result by the diffuse reflectance of the hit
    pub use_reflectance: bool,
    pub ray_start_offset: f32,
    /// Samples per pixel side per pass (n x n stratified grid)
    pub pixel_samples: u32,
}

impl Default for AmbientOcclusionSettings {
    fn default() -> Self {
        Self {
            max_distance: 1.0,
            use_reflectance: false,
            ray_start_offset: 1e-4,
            pixel_samples: 1,
        }
    }
}

/// Scene-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    pub tracer_type: TracerType,
    /// Color of rays that escape the scene (ray and preview tracers)
    pub background_color: Color,
    pub bvh: BvhBuildInfo,
    /// Seed for the random BVH split policies
    pub bvh_seed: u64,
    pub ray_tracer: RayTracerSettings,
    pub path_tracer: PathTracerSettings,
    pub ambient_occlusion: AmbientOcclusionSettings,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            tracer_type: TracerType::default(),
            background_color: Color::ZERO,
            bvh: BvhBuildInfo::default(),
            bvh_seed: 0,
            ray_tracer: RayTracerSettings::default(),
            path_tracer: PathTracerSettings::default(),
            ambient_occlusion: AmbientOcclusionSettings::default(),
        }
    }
}

impl SceneSettings {
    pub fn with_tracer(mut self, tracer_type: TracerType) -> Self {
        self.tracer_type = tracer_type;
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    pub fn with_bvh(mut self, bvh: BvhBuildInfo) -> Self {
        self.bvh = bvh;
        self
    }

    pub fn with_max_path_length(mut self, max_path_length: u32) -> Self {
        self.path_tracer.max_path_length = max_path_length;
        self
    }

    pub fn with_ambient_occlusion(mut self, ambient_occlusion: AmbientOcclusionSettings) -> Self {
        self.ambient_occlusion = ambient_occlusion;
        self
    }
}

/// Everything the tracers need to shade a ray.
pub struct Scene {
    settings: SceneSettings,
    materials: Vec<Material>,
    primitives: Vec<PrimitiveHandle>,
    pub lights: Lights,
    bvh: Bvh,
}

impl Scene {
    pub fn new(settings: SceneSettings) -> Self {
        Self {
            settings,
            materials: Vec::new(),
            primitives: Vec::new(),
            lights: Lights::default(),
            bvh: Bvh::empty(),
        }
    }

    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut SceneSettings {
        &mut self.settings
    }

    /// Add a material, returning its id.
    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    pub fn add_primitive(&mut self, primitive: PrimitiveHandle) {
        self.primitives.push(primitive);
    }

    pub fn material(&self, id: usize) -> Option<&Material> {
        self.materials.get(id)
    }

    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bvh.bounding_box()
    }

    /// Validate the scene and build its BVH.
    ///
    /// May be called again after adding primitives; the BVH is rebuilt.
    pub fn initialize(&mut self) -> SceneResult<()> {
        log::info!(
            "Initializing scene (primitives: {}, materials: {})",
            self.primitives.len(),
            self.materials.len()
        );

        if self.settings.path_tracer.max_path_length == 0 {
            return Err(SceneError::InvalidPathLength);
        }

        for (index, primitive) in self.primitives.iter().enumerate() {
            if let Some(material_id) = primitive.material_id() {
                if material_id >= self.materials.len() {
                    return Err(SceneError::UnknownMaterial {
                        primitive: index,
                        material_id,
                    });
                }
            }
        }

        let mut rng = StdRng::seed_from_u64(self.settings.bvh_seed);
        self.bvh = Bvh::build(self.primitives.clone(), &self.settings.bvh, &mut rng)?;

        Ok(())
    }

    /// Closest hit along `ray`, with the material's normal flags applied and
    /// the shading basis built.
    ///
    /// Fast-occlusion rays only learn whether something was hit.
    pub fn intersect(&self, ray: &Ray, intersection: &mut Intersection) -> bool {
        if !self.bvh.intersect(ray, intersection) {
            return false;
        }

        if ray.fast_occlusion() {
            return true;
        }

        if let Some(material) = self.materials.get(intersection.material_id) {
            if material.invert_normal {
                intersection.normal = -intersection.normal;
            } else if material.auto_invert_normal && ray.direction().dot(intersection.normal) > 0.0 {
                intersection.normal = -intersection.normal;
            }
        }

        intersection.onb = Onb::from_normal(intersection.normal);
        true
    }

    /// Whether anything lies within the range of `ray`.
    pub fn is_occluded(&self, ray: &Ray) -> bool {
        let mut intersection = Intersection::default();
        self.bvh.intersect(ray, &mut intersection)
    }
}
