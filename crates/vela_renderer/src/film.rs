//! Accumulation buffer for rendered samples.

use crate::material::Color;

/// Per-pixel running sums of linear color.
///
/// Each [`Film::add`] contributes one sample; [`Film::pixel`] is the mean.
#[derive(Debug, Clone)]
pub struct Film {
    width: u32,
    height: u32,
    sums: Vec<Color>,
    counts: Vec<u32>,
    /// Completed render passes since the last clear
    pub pass_count: u32,
}

impl Film {
    /// Create a new, empty film.
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width as usize) * (height as usize);
        Self {
            width,
            height,
            sums: vec![Color::ZERO; len],
            counts: vec![0; len],
            pass_count: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Change resolution. Contents are discarded.
    pub fn resize(&mut self, width: u32, height: u32) {
        *self = Self::new(width, height);
    }

    /// Discard all samples and reset the pass count.
    pub fn clear(&mut self) {
        self.sums.fill(Color::ZERO);
        self.counts.fill(0);
        self.pass_count = 0;
    }

    /// Add one sample to pixel (x, y). Out-of-range pixels are ignored.
    pub fn add(&mut self, x: u32, y: u32, color: Color) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = (y as usize) * (self.width as usize) + x as usize;
        self.sums[index] += color;
        self.counts[index] += 1;
    }

    /// Mean of the samples at (x, y), black if there are none.
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        if x >= self.width || y >= self.height {
            return Color::ZERO;
        }
        let index = (y as usize) * (self.width as usize) + x as usize;
        match self.counts[index] {
            0 => Color::ZERO,
            n => self.sums[index] / n as f32,
        }
    }

    pub fn sample_count(&self, x: u32, y: u32) -> u32 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.counts[(y as usize) * (self.width as usize) + x as usize]
    }

    /// Total samples over all pixels.
    pub fn total_samples(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    /// Convert to RGBA bytes (for display or saving).
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.sums.len() * 4);
        for y in 0..self.height {
            for x in 0..self.width {
                bytes.extend_from_slice(&color_to_rgba(self.pixel(x, y)));
            }
        }
        bytes
    }
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a color to 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let r = (255.0 * linear_to_gamma(color.x).clamp(0.0, 1.0)) as u8;
    let g = (255.0 * linear_to_gamma(color.y).clamp(0.0, 1.0)) as u8;
    let b = (255.0 * linear_to_gamma(color.z).clamp(0.0, 1.0)) as u8;
    [r, g, b, 255]
}
