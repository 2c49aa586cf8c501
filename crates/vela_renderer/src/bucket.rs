//! Bucket-based tile rendering.
//!
//! Divides the image into tiles (buckets) that can be rendered
//! independently and in parallel using rayon.

use std::sync::atomic::{AtomicBool, Ordering};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vela_math::Vec2;

use crate::camera::Camera;
use crate::material::Color;
use crate::sampler::{Sampler, Stratum};
use crate::scene::Scene;
use crate::tracer::Tracer;

/// A rectangular region of the image to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// X coordinate of bucket's top-left corner
    pub x: u32,
    /// Y coordinate of bucket's top-left corner
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Index of this bucket in the render order
    pub index: usize,
}

impl Bucket {
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            index,
        }
    }

    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }
}

/// Default bucket size in pixels.
pub const DEFAULT_BUCKET_SIZE: u32 = 32;

/// Generate buckets for an image, sorted from the center outward.
pub fn generate_buckets(width: u32, height: u32, bucket_size: u32) -> Vec<Bucket> {
    let bucket_size = bucket_size.max(1);
    let mut buckets = Vec::new();

    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            let bw = bucket_size.min(width - x);
            let bh = bucket_size.min(height - y);
            buckets.push(Bucket::new(x, y, bw, bh, 0));
            x += bucket_size;
        }
        y += bucket_size;
    }

    sort_spiral(&mut buckets, width, height);

    for (i, bucket) in buckets.iter_mut().enumerate() {
        bucket.index = i;
    }

    buckets
}

/// Sort buckets by distance from image center.
fn sort_spiral(buckets: &mut [Bucket], width: u32, height: u32) {
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;

    let distance = |b: &Bucket| {
        let bx = b.x as f32 + b.width as f32 / 2.0;
        let by = b.y as f32 + b.height as f32 / 2.0;
        (bx - center_x).powi(2) + (by - center_y).powi(2)
    };

    // Stable sort keeps row-major order between equally distant buckets
    buckets.sort_by(|a, b| distance(a).total_cmp(&distance(b)));
}

/// Seed of the RNG stream for one bucket of one pass.
///
/// SplitMix64 finalizer over the combined inputs, so neighbouring buckets and
/// passes get unrelated streams.
pub fn bucket_seed(seed: u64, pass: u32, bucket_index: usize) -> u64 {
    let mut z = seed
        ^ (pass as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15)
        ^ (bucket_index as u64).wrapping_mul(0xbf58_476d_1ce4_e5b9).rotate_left(32);
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Everything a bucket needs besides its own coordinates.
pub struct BucketContext<'a> {
    pub scene: &'a Scene,
    pub camera: &'a Camera,
    pub tracer: &'a dyn Tracer,
    pub sampler: &'a dyn Sampler,
    pub seed: u64,
    pub pass: u32,
    /// Trace every sample at the pixel center instead of jittering
    pub center_single_sample: bool,
    pub cancel: &'a AtomicBool,
}

/// Result of rendering a bucket.
#[derive(Debug, Clone)]
pub struct BucketResult {
    pub bucket: Bucket,
    /// Pixel colors in row-major order. Shorter than the bucket if cancelled.
    pub pixels: Vec<Color>,
}

impl BucketResult {
    pub fn is_complete(&self) -> bool {
        self.pixels.len() == self.bucket.pixel_count() as usize
    }

    /// Image coordinates and color of every rendered pixel.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, Color)> + '_ {
        let bucket = self.bucket;
        self.pixels.iter().enumerate().map(move |(i, &color)| {
            let i = i as u32;
            (bucket.x + i % bucket.width, bucket.y + i / bucket.width, color)
        })
    }
}

/// Render a single bucket.
///
/// The cancel flag is checked before each pixel; a pixel in progress always
/// finishes.
pub fn render_bucket(bucket: &Bucket, ctx: &BucketContext<'_>) -> BucketResult {
    let mut rng = StdRng::seed_from_u64(bucket_seed(ctx.seed, ctx.pass, bucket.index));
    let mut pixels = Vec::with_capacity(bucket.pixel_count() as usize);

    let n = ctx.tracer.pixel_samples(ctx.scene).max(1);
    let sample_weight = 1.0 / (n * n) as f32;

    'rows: for local_y in 0..bucket.height {
        for local_x in 0..bucket.width {
            if ctx.cancel.load(Ordering::Relaxed) {
                break 'rows;
            }

            let x = bucket.x + local_x;
            let y = bucket.y + local_y;
            let permutation = rng.gen::<u32>();

            let mut color = Color::ZERO;
            for sy in 0..n {
                for sx in 0..n {
                    let offset = if ctx.center_single_sample && n == 1 {
                        Vec2::splat(0.5)
                    } else {
                        ctx.sampler.sample_2d(Stratum::new(sx, sy, n, n), permutation, &mut rng)
                    };

                    let ray = ctx.camera.get_ray(x, y, offset);
                    color += ctx.tracer.trace(ctx.scene, &ray, &mut rng);
                }
            }

            pixels.push(color * sample_weight);
        }
    }

    BucketResult {
        bucket: *bucket,
        pixels,
    }
}
