//! Normal recalculation kernels
//!
//! Two stages, run in order every frame:
//! 1. one face normal per triangle from the current positions
//! 2. one vertex normal per vertex, folded from its incident triangles
//!    through the adjacency map
//!
//! A zero-area triangle has no direction; its normal is `Vec3::ZERO`.
//! The same sentinel is produced for a vertex whose incident normals
//! cancel out or that has no incident triangles.

use crate::adjacency::{incident_triangles, VertexAdjacencyData};
use glam::Vec3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// How incident triangle normals are combined at a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalAggregation {
    /// Sum, then normalize. Unit length regardless of fan-out.
    #[default]
    Normalize,
    /// Sum divided by the number of incident triangles. Shorter than
    /// unit length wherever the surface curves.
    AverageByCount,
}

/// Unit face normal of (p1, p2, p3), counter-clockwise winding
#[inline]
pub fn triangle_normal(p1: Vec3, p2: Vec3, p3: Vec3) -> Vec3 {
    (p2 - p1).cross(p3 - p1).normalize_or_zero()
}

#[inline]
fn triangle_normal_at(positions: &[Vec3], corners: &[u32]) -> Vec3 {
    triangle_normal(
        positions[corners[0] as usize],
        positions[corners[1] as usize],
        positions[corners[2] as usize],
    )
}

/// Stage 1 across the current rayon pool
pub fn compute_triangle_normals_parallel(
    positions: &[Vec3],
    indices: &[u32],
    triangle_normals: &mut [Vec3],
    batch_size: usize,
) {
    debug_assert_eq!(indices.len() / 3, triangle_normals.len());

    triangle_normals
        .par_iter_mut()
        .zip(indices.par_chunks_exact(3))
        .with_min_len(batch_size.max(1))
        .for_each(|(normal, corners)| *normal = triangle_normal_at(positions, corners));
}

/// Stage 1 on the calling thread
pub fn compute_triangle_normals_serial(
    positions: &[Vec3],
    indices: &[u32],
    triangle_normals: &mut [Vec3],
) {
    debug_assert_eq!(indices.len() / 3, triangle_normals.len());

    for (normal, corners) in triangle_normals.iter_mut().zip(indices.chunks_exact(3)) {
        *normal = triangle_normal_at(positions, corners);
    }
}

/// Fold the incident triangle normals of vertex `v`
#[inline]
pub fn aggregate_vertex_normal(
    adjacency: &VertexAdjacencyData,
    v: usize,
    triangle_normals: &[Vec3],
    policy: NormalAggregation,
) -> Vec3 {
    let incident = incident_triangles(adjacency, v);
    let sum: Vec3 = incident
        .iter()
        .map(|&t| triangle_normals[t as usize])
        .sum();

    match policy {
        NormalAggregation::Normalize => sum.normalize_or_zero(),
        NormalAggregation::AverageByCount => {
            if incident.is_empty() {
                Vec3::ZERO
            } else {
                sum / incident.len() as f32
            }
        }
    }
}

/// Stage 2 across the current rayon pool
pub fn aggregate_vertex_normals_parallel(
    adjacency: &VertexAdjacencyData,
    triangle_normals: &[Vec3],
    vertex_normals: &mut [Vec3],
    policy: NormalAggregation,
    batch_size: usize,
) {
    vertex_normals
        .par_iter_mut()
        .enumerate()
        .with_min_len(batch_size.max(1))
        .for_each(|(v, normal)| {
            *normal = aggregate_vertex_normal(adjacency, v, triangle_normals, policy)
        });
}

/// Stage 2 on the calling thread
pub fn aggregate_vertex_normals_serial(
    adjacency: &VertexAdjacencyData,
    triangle_normals: &[Vec3],
    vertex_normals: &mut [Vec3],
    policy: NormalAggregation,
) {
    for (v, normal) in vertex_normals.iter_mut().enumerate() {
        *normal = aggregate_vertex_normal(adjacency, v, triangle_normals, policy);
    }
}

/// Single-pass normals without an adjacency map
///
/// Scatters each face normal onto its three corners, then normalizes.
/// Serial only: corners are shared between triangles.
pub fn recalculate_normals_scatter(positions: &[Vec3], indices: &[u32], vertex_normals: &mut [Vec3]) {
    vertex_normals.iter_mut().for_each(|n| *n = Vec3::ZERO);

    for corners in indices.chunks_exact(3) {
        let normal = triangle_normal_at(positions, corners);
        for &v in corners {
            vertex_normals[v as usize] += normal;
        }
    }

    vertex_normals
        .iter_mut()
        .for_each(|n| *n = n.normalize_or_zero());
}
