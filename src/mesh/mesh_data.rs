//! Mesh data - Pure DOP
//!
//! NO METHODS. Just data.
//! All transformations happen in mesh_operations.rs

use glam::Vec3;

/// Triangle mesh handed over by the host
///
/// Vertex count is fixed for the lifetime of a pipeline built from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OceanMeshData {
    /// Vertex positions
    pub positions: Vec<Vec3>,

    /// Triangle list, three vertex indices per triangle
    pub indices: Vec<u32>,
}
