//! Pipeline data - buffers and per-frame state
//!
//! Data only. Frame orchestration lives in ocean_pipeline.rs

use crate::thread_pool::JobHandle;
use glam::Vec3;

/// Identity of one of the two vertex buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferId {
    A,
    B,
}

impl BufferId {
    pub fn other(self) -> Self {
        match self {
            BufferId::A => BufferId::B,
            BufferId::B => BufferId::A,
        }
    }
}

/// Progress of one vertex generation from displacement to presentation
///
/// A generation walks DisplaceScheduled -> DisplaceDone ->
/// NormalsTriangleScheduled -> NormalsVertexScheduled -> NormalsDone ->
/// Presented across two frames. Most of these steps happen inside jobs;
/// the trace records them per generation, while `OceanPipeline::stage`
/// reports only where the host calls leave the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameStage {
    /// Initialized, no frame advanced yet
    Idle,
    /// Next generation's displacement has been issued
    DisplaceScheduled,
    /// Previous displacement finished, read buffer is stable
    DisplaceDone,
    NormalsTriangleScheduled,
    NormalsVertexScheduled,
    NormalsDone,
    /// Positions and normals handed to the host
    Presented,
    /// Buffers released
    Shutdown,
}

/// One vertex buffer and the generation of positions it holds
#[derive(Debug, Clone, PartialEq)]
pub struct VertexGeneration {
    pub id: BufferId,
    pub generation: u64,
    pub positions: Vec<Vec3>,
}

/// Normal buffers travelling through the two-stage normal jobs
#[derive(Debug, Clone, PartialEq)]
pub struct NormalBuffers {
    pub triangle_normals: Vec<Vec3>,
    pub vertex_normals: Vec<Vec3>,
    /// Vertex generation the normals were computed from
    pub source_generation: u64,
}

/// Buffer owned either by the pipeline or by an in-flight job
pub(crate) enum Slot<T> {
    Ready(T),
    InFlight(JobHandle<T>),
    Released,
}

/// Read-only view of a presented frame
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub positions: &'a [Vec3],
    pub normals: &'a [Vec3],
    /// Vertex generation held in `positions`
    pub generation: u64,
    /// Vertex generation `normals` were computed from
    pub normals_generation: u64,
    pub frame_index: u64,
}
