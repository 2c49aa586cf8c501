//! Sample generators for stochastic integration.
//!
//! A sampler maps an index within a stratification (plus a permutation key and
//! an RNG) to a point in the unit interval or square. Hemisphere and disc
//! samples are derived from the 2D samples.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};
use std::fmt;
use std::str::FromStr;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use vela_math::{Onb, Vec2, Vec3};

use crate::scene::SceneError;

/// Largest f32 below one.
const ONE_MINUS_EPSILON: f32 = 1.0 - f32::EPSILON / 2.0;

/// Cell `(x, y)` of an `nx` by `ny` grid over the unit square.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stratum {
    pub x: u32,
    pub y: u32,
    pub nx: u32,
    pub ny: u32,
}

impl Stratum {
    /// The whole unit square as one cell.
    pub const SINGLE: Stratum = Stratum {
        x: 0,
        y: 0,
        nx: 1,
        ny: 1,
    };

    pub const fn new(x: u32, y: u32, nx: u32, ny: u32) -> Self {
        Self { x, y, nx, ny }
    }
}

/// Trait for sample generators.
pub trait Sampler: Send + Sync {
    /// Sample in `[0, 1)` for `index` out of `count`.
    fn sample_1d(&self, index: u32, count: u32, permutation: u32, rng: &mut dyn RngCore) -> f32;

    /// Sample in `[0, 1)²` for one cell of a stratification.
    fn sample_2d(&self, stratum: Stratum, permutation: u32, rng: &mut dyn RngCore) -> Vec2;

    /// Point on the unit disc (concentric mapping of [`Sampler::sample_2d`]).
    fn sample_disc(&self, stratum: Stratum, permutation: u32, rng: &mut dyn RngCore) -> Vec2 {
        concentric_disc(self.sample_2d(stratum, permutation, rng))
    }

    /// Unit direction in the hemisphere around `onb.w`.
    ///
    /// Directions follow a cosine-power lobe: `exponent` 1 is cosine-weighted,
    /// 0 is uniform over the hemisphere.
    fn sample_hemisphere(
        &self,
        onb: &Onb,
        exponent: f32,
        stratum: Stratum,
        permutation: u32,
        rng: &mut dyn RngCore,
    ) -> Vec3 {
        let sample = self.sample_2d(stratum, permutation, rng);
        onb.local_to_world(hemisphere_direction(sample, exponent))
    }
}

/// Uniform random samples. Indices and permutation are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSampler;

impl Sampler for RandomSampler {
    fn sample_1d(&self, _index: u32, _count: u32, _permutation: u32, rng: &mut dyn RngCore) -> f32 {
        rng.gen::<f32>()
    }

    fn sample_2d(&self, _stratum: Stratum, _permutation: u32, rng: &mut dyn RngCore) -> Vec2 {
        Vec2::new(rng.gen::<f32>(), rng.gen::<f32>())
    }
}

/// Stratified samples: one jittered point per cell.
///
/// The cell visited for a given index is shuffled by a hash permutation keyed
/// by `permutation`, so sweeping every index of a grid with one key covers
/// every cell exactly once in decorrelated order.
#[derive(Debug, Clone, Copy, Default)]
pub struct JitteredSampler;

impl Sampler for JitteredSampler {
    fn sample_1d(&self, index: u32, count: u32, permutation: u32, rng: &mut dyn RngCore) -> f32 {
        let count = count.max(1);
        let cell = permute(index % count, count, permutation);
        ((cell as f32 + rng.gen::<f32>()) / count as f32).min(ONE_MINUS_EPSILON)
    }

    fn sample_2d(&self, stratum: Stratum, permutation: u32, rng: &mut dyn RngCore) -> Vec2 {
        let nx = stratum.nx.max(1);
        let ny = stratum.ny.max(1);
        let cells = nx * ny;

        let index = ((stratum.y % ny) * nx + stratum.x % nx) % cells;
        let cell = permute(index, cells, permutation);
        let (cx, cy) = (cell % nx, cell / nx);

        Vec2::new(
            ((cx as f32 + rng.gen::<f32>()) / nx as f32).min(ONE_MINUS_EPSILON),
            ((cy as f32 + rng.gen::<f32>()) / ny as f32).min(ONE_MINUS_EPSILON),
        )
    }
}

/// Which sampler a consumer should create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplerType {
    Random,
    #[default]
    Jittered,
}

impl SamplerType {
    pub fn create(self) -> Box<dyn Sampler> {
        match self {
            Self::Random => Box::new(RandomSampler),
            Self::Jittered => Box::new(JitteredSampler),
        }
    }

    /// Shared instance; the samplers are stateless.
    pub fn as_sampler(self) -> &'static dyn Sampler {
        match self {
            Self::Random => &RandomSampler,
            Self::Jittered => &JitteredSampler,
        }
    }
}

impl fmt::Display for SamplerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Random => "random",
            Self::Jittered => "jittered",
        })
    }
}

impl FromStr for SamplerType {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "jittered" => Ok(Self::Jittered),
            _ => Err(SceneError::UnknownSamplerType(s.to_string())),
        }
    }
}

/// Bijective hash of `index` within `[0, len)` keyed by `key`.
///
/// Kensler's "Correlated Multi-Jittered Sampling" permutation: the hash is a
/// bijection on the next power of two, and out-of-range results are hashed
/// again until they land inside `[0, len)`.
pub fn permute(index: u32, len: u32, key: u32) -> u32 {
    if len <= 1 {
        return 0;
    }

    let mut w = len - 1;
    w |= w >> 1;
    w |= w >> 2;
    w |= w >> 4;
    w |= w >> 8;
    w |= w >> 16;

    let mut i = index;
    loop {
        i ^= key;
        i = i.wrapping_mul(0xe170893d);
        i ^= key >> 16;
        i ^= (i & w) >> 4;
        i ^= key >> 8;
        i = i.wrapping_mul(0x0929eb3f);
        i ^= key >> 23;
        i ^= (i & w) >> 1;
        i = i.wrapping_mul(1 | key >> 27);
        i = i.wrapping_mul(0x6935fa69);
        i ^= (i & w) >> 11;
        i = i.wrapping_mul(0x74dcb303);
        i ^= (i & w) >> 2;
        i = i.wrapping_mul(0x9e501cc3);
        i ^= (i & w) >> 2;
        i = i.wrapping_mul(0xc860a3df);
        i &= w;
        i ^= i >> 5;

        if i < len {
            break;
        }
    }

    ((i as u64 + key as u64) % len as u64) as u32
}

/// Shirley-Chiu concentric mapping from `[0, 1)²` to the unit disc.
pub fn concentric_disc(sample: Vec2) -> Vec2 {
    let a = 2.0 * sample.x - 1.0;
    let b = 2.0 * sample.y - 1.0;

    if a == 0.0 && b == 0.0 {
        return Vec2::ZERO;
    }

    let (r, phi) = if a.abs() > b.abs() {
        (a, FRAC_PI_4 * (b / a))
    } else {
        (b, FRAC_PI_2 - FRAC_PI_4 * (a / b))
    };

    Vec2::new(r * phi.cos(), r * phi.sin())
}

/// Direction in the local frame (z up) for a cosine-power lobe.
fn hemisphere_direction(sample: Vec2, exponent: f32) -> Vec3 {
    let cos_theta = (1.0 - sample.x).powf(1.0 / (exponent + 1.0));
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = 2.0 * PI * sample.y;

    Vec3::new(phi.cos() * sin_theta, phi.sin() * sin_theta, cos_theta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_permute_is_bijective() {
        for len in [1u32, 2, 3, 7, 16, 33, 100] {
            for key in [0u32, 1, 0xdead_beef, u32::MAX] {
                let mut seen = vec![false; len as usize];
                for i in 0..len {
                    let p = permute(i, len, key) as usize;
                    assert!(!seen[p], "len {len} key {key}: {p} repeated");
                    seen[p] = true;
                }
            }
        }
    }

    #[test]
    fn test_jittered_full_sweep_covers_every_cell() {
        let sampler = JitteredSampler;
        let mut rng = StdRng::seed_from_u64(42);
        let (nx, ny) = (5u32, 3u32);
        let mut hits = vec![0; (nx * ny) as usize];

        for y in 0..ny {
            for x in 0..nx {
                let s = sampler.sample_2d(Stratum::new(x, y, nx, ny), 1234, &mut rng);
                assert!((0.0..1.0).contains(&s.x) && (0.0..1.0).contains(&s.y));
                let cx = (s.x * nx as f32) as u32;
                let cy = (s.y * ny as f32) as u32;
                hits[(cy * nx + cx) as usize] += 1;
            }
        }

        assert!(hits.iter().all(|&h| h == 1), "cell hits: {hits:?}");
    }

    #[test]
    fn test_jittered_1d_sweep() {
        let sampler = JitteredSampler;
        let mut rng = StdRng::seed_from_u64(7);
        let n = 8;
        let mut cells: Vec<u32> = (0..n)
            .map(|i| (sampler.sample_1d(i, n, 99, &mut rng) * n as f32) as u32)
            .collect();
        cells.sort_unstable();
        assert_eq!(cells, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn test_samplers_are_deterministic_per_seed() {
        for sampler_type in [SamplerType::Random, SamplerType::Jittered] {
            let sampler = sampler_type.create();
            let run = || {
                let mut rng = StdRng::seed_from_u64(5);
                (0..16)
                    .map(|i| sampler.sample_2d(Stratum::new(i % 4, i / 4, 4, 4), 17, &mut rng))
                    .collect::<Vec<_>>()
            };
            assert_eq!(run(), run());
        }
    }

    #[test]
    fn test_random_sampler_range() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1000 {
            let v = RandomSampler.sample_1d(0, 1, 0, &mut rng);
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_disc_samples_inside_unit_disc() {
        let mut rng = StdRng::seed_from_u64(11);
        for i in 0..64 {
            let p = JitteredSampler.sample_disc(Stratum::new(i % 8, i / 8, 8, 8), 3, &mut rng);
            assert!(p.length() <= 1.0 + 1e-5);
        }
        assert_eq!(concentric_disc(Vec2::splat(0.5)), Vec2::ZERO);
    }

    #[test]
    fn test_hemisphere_samples_above_surface() {
        let mut rng = StdRng::seed_from_u64(42);
        let normal = Vec3::new(1.0, 1.0, 0.0).normalize();
        let onb = Onb::from_normal(normal);

        for exponent in [0.0, 1.0, 10.0] {
            for _ in 0..256 {
                let d = RandomSampler.sample_hemisphere(&onb, exponent, Stratum::SINGLE, 0, &mut rng);
                assert!((d.length() - 1.0).abs() < 1e-4);
                assert!(d.dot(normal) >= -1e-5);
            }
        }
    }

    #[test]
    fn test_sampler_type_parse() {
        assert_eq!("Jittered".parse::<SamplerType>(), Ok(SamplerType::Jittered));
        assert_eq!(
            "cmj".parse::<SamplerType>(),
            Err(SceneError::UnknownSamplerType("cmj".to_string()))
        );
        assert_eq!(SamplerType::Random.to_string(), "random");
    }

    #[test]
    fn test_sample_clamp_is_next_float_below_one() {
        assert!(ONE_MINUS_EPSILON < 1.0);
        assert_eq!(f32::from_bits(ONE_MINUS_EPSILON.to_bits() + 1), 1.0);

        // A jitter of exactly one in the last cell still stays inside [0, 1)
        let sample = ((3.0_f32 + 1.0) / 4.0).min(ONE_MINUS_EPSILON);
        assert!(sample < 1.0);
    }
}
