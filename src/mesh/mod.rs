/// Mesh Module - Data-Oriented Programming (DOP) style
///
/// - mesh_data.rs: Host mesh supplied once at initialization
/// - mesh_operations.rs: Construction, queries and validation

pub mod mesh_data;
pub mod mesh_operations;

pub use mesh_data::OceanMeshData;

pub use mesh_operations::{
    create_from_raw, create_ocean_mesh, triangle, triangle_count, validate_mesh, vertex_count,
};
