//! Vertex adjacency operations - Pure DOP functions

use super::adjacency_data::VertexAdjacencyData;
use crate::error::{OceanError, OceanResult};

/// Marker stored in unused slots
pub const EMPTY_SLOT: u32 = u32::MAX;

/// Corners of one triangle with repeats skipped, so a collapsed triangle
/// such as (a, a, b) is listed once at `a`
#[inline]
fn distinct_corners(corners: &[u32]) -> impl Iterator<Item = u32> + '_ {
    corners
        .iter()
        .enumerate()
        .filter(|&(i, vertex)| !corners[..i].contains(vertex))
        .map(|(_, &vertex)| vertex)
}

/// Build the vertex -> incident triangle map
///
/// Fan-out is counted for the whole mesh before any slot is written, so a
/// mesh that violates `capacity` is rejected without producing a partial
/// map. The reported vertex is the lowest offending id.
///
/// Indices must already be range-checked against `vertex_count`.
pub fn build_vertex_adjacency(
    indices: &[u32],
    vertex_count: usize,
    capacity: usize,
) -> OceanResult<VertexAdjacencyData> {
    let mut counts = vec![0u32; vertex_count];
    for corners in indices.chunks_exact(3) {
        for vertex in distinct_corners(corners) {
            counts[vertex as usize] += 1;
        }
    }

    if let Some((vertex, &fan_out)) = counts
        .iter()
        .enumerate()
        .find(|(_, &count)| count as usize > capacity)
    {
        log::error!(
            "[build_vertex_adjacency] Vertex {} has fan-out {} (capacity {})",
            vertex,
            fan_out,
            capacity
        );
        return Err(OceanError::AdjacencyCapacityExceeded {
            vertex,
            fan_out: fan_out as usize,
            capacity,
        });
    }

    let mut triangle_ids = vec![EMPTY_SLOT; vertex_count * capacity];
    counts.iter_mut().for_each(|count| *count = 0);

    for (triangle, corners) in indices.chunks_exact(3).enumerate() {
        for vertex in distinct_corners(corners) {
            let v = vertex as usize;
            let slot = v * capacity + counts[v] as usize;
            triangle_ids[slot] = triangle as u32;
            counts[v] += 1;
        }
    }

    let adjacency = VertexAdjacencyData {
        triangle_ids,
        counts,
        capacity,
    };

    log::debug!(
        "[build_vertex_adjacency] {} vertices, {} triangles, max fan-out {}",
        vertex_count,
        indices.len() / 3,
        max_fan_out(&adjacency)
    );

    Ok(adjacency)
}

/// Triangles touching vertex `v`, ascending
#[inline]
pub fn incident_triangles(adjacency: &VertexAdjacencyData, v: usize) -> &[u32] {
    let start = v * adjacency.capacity;
    &adjacency.triangle_ids[start..start + adjacency.counts[v] as usize]
}

#[inline]
pub fn fan_out(adjacency: &VertexAdjacencyData, v: usize) -> usize {
    adjacency.counts[v] as usize
}

pub fn max_fan_out(adjacency: &VertexAdjacencyData) -> usize {
    adjacency.counts.iter().copied().max().unwrap_or(0) as usize
}

#[inline]
pub fn vertex_count(adjacency: &VertexAdjacencyData) -> usize {
    adjacency.counts.len()
}
