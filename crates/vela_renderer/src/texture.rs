//! Textures sampled by materials.

use std::fmt;

use vela_math::{Vec2, Vec3};

use crate::material::Color;

/// Trait for textures.
pub trait Texture: Send + Sync + fmt::Debug {
    /// Color at a surface point.
    fn color(&self, texcoord: Vec2, position: Vec3) -> Color;

    /// Multiplier applied by materials on top of [`Texture::color`].
    fn intensity(&self) -> f32 {
        1.0
    }
}

/// A single color everywhere.
#[derive(Debug, Clone, Copy)]
pub struct SolidTexture {
    pub color: Color,
    pub intensity: f32,
}

impl SolidTexture {
    pub fn new(color: Color) -> Self {
        Self { color, intensity: 1.0 }
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }
}

impl Texture for SolidTexture {
    fn color(&self, _texcoord: Vec2, _position: Vec3) -> Color {
        self.color
    }

    fn intensity(&self) -> f32 {
        self.intensity
    }
}

/// Checkerboard in texture space.
///
/// `frequency` squares per unit of texcoord along each axis.
#[derive(Debug, Clone, Copy)]
pub struct CheckerTexture {
    pub even: Color,
    pub odd: Color,
    pub frequency: f32,
    pub intensity: f32,
}

impl CheckerTexture {
    pub fn new(even: Color, odd: Color, frequency: f32) -> Self {
        Self {
            even,
            odd,
            frequency,
            intensity: 1.0,
        }
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }
}

impl Texture for CheckerTexture {
    fn color(&self, texcoord: Vec2, _position: Vec3) -> Color {
        let cell = (texcoord * self.frequency).floor();
        if (cell.x as i64 + cell.y as i64).rem_euclid(2) == 0 {
            self.even
        } else {
            self.odd
        }
    }

    fn intensity(&self) -> f32 {
        self.intensity
    }
}
