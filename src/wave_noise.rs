//! Height noise sources for the displacement kernel
//!
//! Two interchangeable sources:
//! - `Perlin`: seeded gradient noise from the `noise` crate, remapped to [0, 1]
//! - `Classic`: stateless classic 2D Perlin noise (permutation polynomial
//!   variant), roughly in [-1, 1], needing no permutation table

use crate::constants::classic_noise::{INV_SQRT_A, INV_SQRT_B, MODULUS, OUTPUT_SCALE};
use noise::NoiseFn;
use serde::{Deserialize, Serialize};

/// Noise source selection (part of `OceanConfig`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NoiseSource {
    Perlin { seed: u32 },
    Classic,
}

impl Default for NoiseSource {
    fn default() -> Self {
        NoiseSource::Perlin { seed: 0 }
    }
}

/// Ready-to-sample noise, built once per pipeline and cloned into jobs
#[derive(Clone)]
pub enum NoiseSampler {
    Perlin(noise::Perlin),
    Classic,
}

impl std::fmt::Debug for NoiseSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoiseSampler::Perlin(_) => f.write_str("NoiseSampler::Perlin"),
            NoiseSampler::Classic => f.write_str("NoiseSampler::Classic"),
        }
    }
}

/// Build the sampler for a source
pub fn create_sampler(source: NoiseSource) -> NoiseSampler {
    match source {
        NoiseSource::Perlin { seed } => NoiseSampler::Perlin(noise::Perlin::new(seed)),
        NoiseSource::Classic => NoiseSampler::Classic,
    }
}

/// Sample 2D noise at (x, y)
#[inline]
pub fn sample(sampler: &NoiseSampler, x: f32, y: f32) -> f32 {
    match sampler {
        NoiseSampler::Perlin(perlin) => {
            let value = perlin.get([x as f64, y as f64]) as f32;
            (value * 0.5 + 0.5).clamp(0.0, 1.0)
        }
        NoiseSampler::Classic => classic_noise(x, y),
    }
}

#[inline]
fn mod289(x: f32) -> f32 {
    x - (x / MODULUS).floor() * MODULUS
}

#[inline]
fn permute(x: f32) -> f32 {
    mod289((x * 34.0 + 1.0) * x)
}

#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Gradient contribution of one lattice corner
#[inline]
fn corner(ix: f32, iy: f32, fx: f32, fy: f32) -> f32 {
    let i = permute(permute(ix) + iy);

    let scaled = i / 41.0;
    let mut gx = (scaled - scaled.floor()) * 2.0 - 1.0;
    let gy = gx.abs() - 0.5;
    gx -= (gx + 0.5).floor();

    let norm = INV_SQRT_A - (gx * gx + gy * gy) * INV_SQRT_B;
    (gx * norm) * fx + (gy * norm) * fy
}

/// Classic 2D Perlin noise without a permutation table
///
/// Zero at every integer lattice point.
pub fn classic_noise(x: f32, y: f32) -> f32 {
    let (x0, y0) = (x.floor(), y.floor());
    let (ix0, iy0) = (mod289(x0), mod289(y0));
    let (ix1, iy1) = (mod289(x0 + 1.0), mod289(y0 + 1.0));

    let (fx0, fy0) = (x - x0, y - y0);
    let (fx1, fy1) = (fx0 - 1.0, fy0 - 1.0);

    let n00 = corner(ix0, iy0, fx0, fy0);
    let n10 = corner(ix1, iy0, fx1, fy0);
    let n01 = corner(ix0, iy1, fx0, fy1);
    let n11 = corner(ix1, iy1, fx1, fy1);

    let fade_x = fade(fx0);
    let fade_y = fade(fy0);

    let n_x0 = lerp(n00, n10, fade_x);
    let n_x1 = lerp(n01, n11, fade_x);
    OUTPUT_SCALE * lerp(n_x0, n_x1, fade_y)
}
