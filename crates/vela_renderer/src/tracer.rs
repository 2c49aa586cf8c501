//! Tracer trait and tracer selection.

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use vela_math::Ray;

use crate::ambient_occlusion::AmbientOcclusionTracer;
use crate::material::Color;
use crate::pathtracer::PathTracer;
use crate::preview::PreviewTracer;
use crate::raytracer::RayTracer;
use crate::scene::{Scene, SceneError};

/// Trait for light transport integrators.
pub trait Tracer: Send + Sync {
    /// Radiance arriving along `ray`.
    fn trace(&self, scene: &Scene, ray: &Ray, rng: &mut dyn RngCore) -> Color;

    /// Samples per pixel side: each pass traces an n x n grid per pixel.
    fn pixel_samples(&self, scene: &Scene) -> u32;

    fn tracer_type(&self) -> TracerType;
}

/// Available tracers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TracerType {
    /// Whitted-style ray tracing with direct lighting
    #[default]
    Ray,
    /// Unidirectional path tracing, accumulated over passes
    Path,
    /// Fast flat shading for interactive previews
    Preview,
    /// Unoccluded fraction of the hemisphere, accumulated over passes
    #[serde(rename = "ao")]
    AmbientOcclusion,
}

impl TracerType {
    pub fn create(self) -> Box<dyn Tracer> {
        match self {
            Self::Ray => Box::new(RayTracer),
            Self::Path => Box::new(PathTracer),
            Self::Preview => Box::new(PreviewTracer),
            Self::AmbientOcclusion => Box::new(AmbientOcclusionTracer),
        }
    }

    /// The other of the two full-quality tracers.
    pub fn toggled(self) -> Self {
        match self {
            Self::Ray => Self::Path,
            Self::Path | Self::Preview | Self::AmbientOcclusion => Self::Ray,
        }
    }

    /// Whether successive passes refine the same image.
    pub fn accumulates(self) -> bool {
        matches!(self, Self::Path | Self::AmbientOcclusion)
    }
}

impl fmt::Display for TracerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ray => "ray",
            Self::Path => "path",
            Self::Preview => "preview",
            Self::AmbientOcclusion => "ao",
        })
    }
}

impl FromStr for TracerType {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ray" => Ok(Self::Ray),
            "path" => Ok(Self::Path),
            "preview" => Ok(Self::Preview),
            "ao" | "ambient_occlusion" => Ok(Self::AmbientOcclusion),
            _ => Err(SceneError::UnknownTracerType(s.to_string())),
        }
    }
}
