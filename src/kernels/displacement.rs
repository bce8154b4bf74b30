//! Vertex displacement kernel
//!
//! Replaces each vertex height with a noise term plus a radial ripple:
//!
//! `y = noise((t + x) * scale, (t + z) * scale) * perlin_strength
//!    + sin(t + |(x, z)|) * ripple_strength`
//!
//! x and z pass through unchanged. Pure and order independent.

use crate::config::WaveParams;
use crate::wave_noise::{self, NoiseSampler};
use glam::{Vec2, Vec3};
use rayon::prelude::*;

/// Displace a single vertex at kernel time `time`
#[inline]
pub fn displace_vertex(vertex: Vec3, time: f32, params: &WaveParams, sampler: &NoiseSampler) -> Vec3 {
    let ripple = (time + Vec2::new(vertex.x, vertex.z).length()).sin();
    let perlin = wave_noise::sample(
        sampler,
        (time + vertex.x) * params.scale,
        (time + vertex.z) * params.scale,
    );

    Vec3::new(
        vertex.x,
        perlin * params.perlin_strength + ripple * params.ripple_strength,
        vertex.z,
    )
}

/// Displace `input` into `output` across the current rayon pool
pub fn displace_vertices_parallel(
    input: &[Vec3],
    output: &mut [Vec3],
    params: &WaveParams,
    sampler: &NoiseSampler,
    batch_size: usize,
) {
    debug_assert_eq!(input.len(), output.len());
    let time = params.effective_time();

    output
        .par_iter_mut()
        .zip(input.par_iter())
        .with_min_len(batch_size.max(1))
        .for_each(|(out, &vertex)| *out = displace_vertex(vertex, time, params, sampler));
}

/// Displace `input` into `output` on the calling thread
pub fn displace_vertices_serial(
    input: &[Vec3],
    output: &mut [Vec3],
    params: &WaveParams,
    sampler: &NoiseSampler,
) {
    debug_assert_eq!(input.len(), output.len());
    let time = params.effective_time();

    for (out, &vertex) in output.iter_mut().zip(input) {
        *out = displace_vertex(vertex, time, params, sampler);
    }
}
