// Tidal Mesh - Data-Oriented Programming (DOP) Architecture
//
// CPU ocean surface pipeline: per-frame vertex displacement and normal
// recalculation over a double-buffered mesh, overlapped with the host.
// - *_data modules hold plain data
// - *_operations modules hold pure functions over that data
// - pipeline::OceanPipeline schedules the kernels on the job system

// Constants module
pub mod constants;

// Core modules
pub mod config;
pub mod error;

// Mesh data and topology
pub mod adjacency;
pub mod mesh;

// Kernels
pub mod kernels;
pub mod wave_noise;

// Scheduling
pub mod pipeline;
pub mod thread_pool;

pub use config::{ExecutionMode, OceanConfig, WaveParams};
pub use error::{MeshError, OceanError, OceanResult, OptionExt};

// === Mesh Types ===
pub use adjacency::VertexAdjacencyData;
pub use mesh::OceanMeshData;

// === Kernel Types ===
pub use kernels::NormalAggregation;
pub use wave_noise::{NoiseSampler, NoiseSource};

// === Pipeline Types ===
pub use pipeline::{
    BufferId, FrameStage, FrameView, OceanPipeline, PipelineTrace, TraceEvent, TraceKind,
};
pub use thread_pool::{JobHandle, JobSystemData};

// Re-export commonly used external types
pub use glam::Vec3;
