//! Vertex adjacency data - Pure DOP
//!
//! NO METHODS. Just data.
//! All transformations happen in adjacency_operations.rs

/// Fixed-capacity vertex -> triangle map
///
/// Slot layout is flat: vertex `v` owns
/// `triangle_ids[v * capacity .. v * capacity + counts[v]]`.
/// Unused slots hold `u32::MAX`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexAdjacencyData {
    /// Incident triangle ids, `capacity` slots per vertex
    pub triangle_ids: Vec<u32>,

    /// Number of filled slots per vertex
    pub counts: Vec<u32>,

    /// Slots reserved per vertex
    pub capacity: usize,
}
