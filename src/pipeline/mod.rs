/// Pipeline Module - double-buffered frame orchestration
///
/// - pipeline_data.rs: Buffers, stages and the presented frame view
/// - ocean_pipeline.rs: Frame scheduling over the job system
/// - trace.rs: Optional record of job start/finish order

pub mod ocean_pipeline;
pub mod pipeline_data;
pub mod trace;

pub use ocean_pipeline::OceanPipeline;

pub use pipeline_data::{BufferId, FrameStage, FrameView, NormalBuffers, VertexGeneration};

pub use trace::{PipelineTrace, TraceEvent, TraceKind};
