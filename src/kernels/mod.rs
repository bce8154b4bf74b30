//! Per-element kernels
//!
//! Every kernel comes in a parallel form (rayon, chunked by batch size)
//! and a serial form producing identical results. None of them allocate.

pub mod displacement;
pub mod normals;

pub use displacement::{displace_vertex, displace_vertices_parallel, displace_vertices_serial};
pub use normals::{
    aggregate_vertex_normal, aggregate_vertex_normals_parallel, aggregate_vertex_normals_serial,
    compute_triangle_normals_parallel, compute_triangle_normals_serial,
    recalculate_normals_scatter, triangle_normal, NormalAggregation,
};
