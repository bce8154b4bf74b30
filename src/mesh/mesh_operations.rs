//! Mesh operations - Pure DOP functions

use super::mesh_data::OceanMeshData;
use crate::error::MeshError;
use glam::Vec3;

/// Create mesh data from positions and a triangle list
pub fn create_ocean_mesh(positions: Vec<Vec3>, indices: Vec<u32>) -> OceanMeshData {
    OceanMeshData { positions, indices }
}

/// Create mesh data from plain float triples (host vertex arrays)
pub fn create_from_raw(positions: &[[f32; 3]], indices: &[u32]) -> OceanMeshData {
    OceanMeshData {
        positions: positions.iter().copied().map(Vec3::from).collect(),
        indices: indices.to_vec(),
    }
}

#[inline]
pub fn vertex_count(mesh: &OceanMeshData) -> usize {
    mesh.positions.len()
}

#[inline]
pub fn triangle_count(mesh: &OceanMeshData) -> usize {
    mesh.indices.len() / 3
}

/// Vertex indices of triangle `t`
#[inline]
pub fn triangle(mesh: &OceanMeshData, t: usize) -> [u32; 3] {
    let base = t * 3;
    [
        mesh.indices[base],
        mesh.indices[base + 1],
        mesh.indices[base + 2],
    ]
}

/// Check structural validity of a mesh before any buffers are built from it
pub fn validate_mesh(mesh: &OceanMeshData) -> Result<(), MeshError> {
    if mesh.positions.is_empty() || mesh.indices.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    if mesh.indices.len() % 3 != 0 {
        return Err(MeshError::MalformedIndexBuffer {
            len: mesh.indices.len(),
        });
    }

    let vertex_count = mesh.positions.len();
    if let Some((slot, &index)) = mesh
        .indices
        .iter()
        .enumerate()
        .find(|(_, &index)| index as usize >= vertex_count)
    {
        return Err(MeshError::IndexOutOfRange {
            triangle: slot / 3,
            index,
            vertex_count,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_triangle() -> OceanMeshData {
        create_from_raw(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
            &[0, 1, 2],
        )
    }

    #[test]
    fn test_counts_and_triangle_lookup() {
        let mesh = single_triangle();
        assert_eq!(vertex_count(&mesh), 3);
        assert_eq!(triangle_count(&mesh), 1);
        assert_eq!(triangle(&mesh, 0), [0, 1, 2]);
        assert!(validate_mesh(&mesh).is_ok());
    }

    #[test]
    fn test_rejects_empty_mesh() {
        let mesh = create_ocean_mesh(Vec::new(), Vec::new());
        assert_eq!(validate_mesh(&mesh), Err(MeshError::EmptyMesh));
    }

    #[test]
    fn test_rejects_partial_triangle() {
        let mut mesh = single_triangle();
        mesh.indices.push(0);
        assert_eq!(
            validate_mesh(&mesh),
            Err(MeshError::MalformedIndexBuffer { len: 4 })
        );
    }

    #[test]
    fn test_rejects_out_of_range_index() {
        let mut mesh = single_triangle();
        mesh.indices.extend_from_slice(&[0, 2, 9]);
        assert_eq!(
            validate_mesh(&mesh),
            Err(MeshError::IndexOutOfRange {
                triangle: 1,
                index: 9,
                vertex_count: 3,
            })
        );
    }
}
