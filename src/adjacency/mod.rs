/// Vertex Adjacency Module - Data-Oriented Programming (DOP) style
///
/// Vertex -> incident triangle map, built once from the index buffer and
/// read by the vertex normal kernel every frame.

pub mod adjacency_data;
pub mod adjacency_operations;

pub use adjacency_data::VertexAdjacencyData;

pub use adjacency_operations::{
    build_vertex_adjacency, fan_out, incident_triangles, max_fan_out, vertex_count,
};
