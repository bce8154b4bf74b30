//! Double-buffered ocean frame pipeline
//!
//! Two vertex buffers alternate roles every frame. While the host consumes
//! generation N (read buffer), the displacement job writes generation N + 1
//! into the other buffer. Normals for generation N are computed in two
//! dependent jobs: face normals, then per-vertex normals through the
//! adjacency map.
//!
//! Buffers move into the jobs that write them and come back through the
//! job handles, so a buffer has exactly one writer at any time. The read
//! buffer is shared immutably (`Arc`) between the displacement job, the
//! face normal job and the host.
//!
//! Host call order per frame: `advance_frame` then `sync_and_fetch`
//! (and optionally `copy_into`). Blocking happens only at the top of
//! `advance_frame` (previous frame's jobs) and in `sync_and_fetch`
//! (this frame's normal jobs).

use super::pipeline_data::{BufferId, FrameStage, FrameView, NormalBuffers, Slot, VertexGeneration};
use super::trace::{self, PipelineTrace, TraceKind};
use crate::adjacency::{build_vertex_adjacency, VertexAdjacencyData};
use crate::config::{ExecutionMode, OceanConfig, WaveParams};
use crate::error::{OceanError, OceanResult, OptionExt};
use crate::kernels::{
    aggregate_vertex_normals_parallel, aggregate_vertex_normals_serial,
    compute_triangle_normals_parallel, compute_triangle_normals_serial,
    displace_vertices_parallel, displace_vertices_serial, recalculate_normals_scatter,
};
use crate::mesh::{self, OceanMeshData};
use crate::thread_pool::{self, JobHandle, JobSystemData};
use crate::wave_noise::{create_sampler, NoiseSampler};
use glam::Vec3;
use std::sync::Arc;

fn state_error(expected: &str, actual: &str) -> OceanError {
    OceanError::StateError {
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

fn check_len(buffer: &str, expected: usize, found: usize) -> OceanResult<()> {
    if expected != found {
        return Err(OceanError::BufferSizeMismatch {
            buffer: buffer.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

/// Wait for an in-flight buffer to come back
fn settle<T>(slot: &mut Slot<T>) -> OceanResult<()> {
    if let Slot::InFlight(_) = slot {
        if let Slot::InFlight(handle) = std::mem::replace(slot, Slot::Released) {
            *slot = Slot::Ready(thread_pool::complete(handle)?);
        }
    }
    Ok(())
}

/// Take a buffer that must already be back from its job
fn take_ready<T>(slot: &mut Slot<T>, what: &str) -> OceanResult<T> {
    match std::mem::replace(slot, Slot::Released) {
        Slot::Ready(value) => Ok(value),
        Slot::InFlight(handle) => {
            *slot = Slot::InFlight(handle);
            Err(state_error(&format!("{} ready", what), "still in flight"))
        }
        Slot::Released => Err(state_error(&format!("{} ready", what), "released")),
    }
}

/// Double-buffered displacement and normal recalculation for one mesh
pub struct OceanPipeline {
    config: OceanConfig,
    jobs: JobSystemData,
    sampler: NoiseSampler,

    /// Immutable topology shared with jobs
    indices: Arc<Vec<u32>>,
    adjacency: Arc<VertexAdjacencyData>,
    vertex_count: usize,
    triangle_count: usize,

    /// Generation currently exposed to normals jobs and the host
    read: Option<Arc<VertexGeneration>>,
    /// Generation being produced for the next frame
    write: Slot<VertexGeneration>,
    normals: Slot<NormalBuffers>,

    stage: FrameStage,
    frame_index: u64,
    trace: Option<Arc<PipelineTrace>>,
}

impl OceanPipeline {
    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Validate inputs, build adjacency, allocate both generations
    ///
    /// Config and mesh topology are checked before any frame buffer is
    /// allocated. Both buffers start as copies of the mesh (read = A,
    /// write = B) and the initial normals are computed synchronously, so
    /// `sync_and_fetch` is valid before the first `advance_frame`.
    pub fn initialize(mesh: &OceanMeshData, config: OceanConfig) -> OceanResult<Self> {
        log::info!(
            "[OceanPipeline::initialize] Mesh with {} vertices, {} triangles",
            mesh::vertex_count(mesh),
            mesh::triangle_count(mesh)
        );

        config.validate()?;
        mesh::validate_mesh(mesh)?;

        let vertex_count = mesh::vertex_count(mesh);
        let triangle_count = mesh::triangle_count(mesh);

        let adjacency = build_vertex_adjacency(&mesh.indices, vertex_count, config.adjacency_capacity)
            .map_err(|e| {
                log::error!("[OceanPipeline::initialize] Mesh rejected: {}", e);
                e
            })?;

        let jobs = thread_pool::create_job_system(config.resolved_worker_threads(), config.batch_size)?;
        let sampler = create_sampler(config.noise);

        let read = VertexGeneration {
            id: BufferId::A,
            generation: 0,
            positions: mesh.positions.clone(),
        };
        let write = VertexGeneration {
            id: BufferId::B,
            generation: 0,
            positions: mesh.positions.clone(),
        };

        let mut normals = NormalBuffers {
            triangle_normals: vec![Vec3::ZERO; triangle_count],
            vertex_normals: vec![Vec3::ZERO; vertex_count],
            source_generation: 0,
        };
        compute_triangle_normals_serial(&read.positions, &mesh.indices, &mut normals.triangle_normals);
        aggregate_vertex_normals_serial(
            &adjacency,
            &normals.triangle_normals,
            &mut normals.vertex_normals,
            config.aggregation,
        );

        let trace = config.record_trace.then(|| Arc::new(PipelineTrace::new()));

        log::info!(
            "[OceanPipeline::initialize] Ready: adjacency capacity {}, {} workers",
            config.adjacency_capacity,
            jobs.worker_threads
        );

        Ok(Self {
            config,
            jobs,
            sampler,
            indices: Arc::new(mesh.indices.clone()),
            adjacency: Arc::new(adjacency),
            vertex_count,
            triangle_count,
            read: Some(Arc::new(read)),
            write: Slot::Ready(write),
            normals: Slot::Ready(normals),
            stage: FrameStage::Idle,
            frame_index: 0,
            trace,
        })
    }

    /// Start the next frame
    ///
    /// 1. wait for the previous frame's displacement and normal jobs
    /// 2. swap buffer roles
    /// 3. displace the new read buffer into the new write buffer
    /// 4. face normals over the new read buffer, then vertex normals
    ///    depending on them
    ///
    /// Returns without waiting on the jobs it issued (Deferred mode).
    pub fn advance_frame(&mut self, params: &WaveParams, mode: ExecutionMode) -> OceanResult<()> {
        self.ensure_active()?;

        settle(&mut self.write)?;
        settle(&mut self.normals)?;

        let finished = take_ready(&mut self.write, "write buffer")?;
        let mut buffers = take_ready(&mut self.normals, "normal buffers")?;
        let previous = self
            .read
            .take()
            .ok_or_ocean(|| state_error("read buffer", "released"))?;

        // Every job holding the old read buffer has finished
        let mut target = Arc::try_unwrap(previous).unwrap_or_else(|shared| {
            log::warn!("[OceanPipeline::advance_frame] Read buffer still shared, copying");
            (*shared).clone()
        });

        let read = Arc::new(finished);
        self.read = Some(Arc::clone(&read));
        self.frame_index += 1;

        let frame = self.frame_index;
        let parallel = mode == ExecutionMode::Deferred;
        let batch_size = self.jobs.batch_size;

        log::trace!(
            "[OceanPipeline::advance_frame] Frame {}: read {:?} gen {}, write {:?}, mode {:?}",
            frame,
            read.id,
            read.generation,
            target.id,
            mode
        );

        // Displacement for the next frame
        let input = Arc::clone(&read);
        let params = *params;
        let sampler = self.sampler.clone();
        let displace_trace = self.trace.clone();
        let displace = move || {
            let generation = input.generation + 1;
            trace::record(&displace_trace, frame, TraceKind::DisplaceStarted, generation);
            if parallel {
                displace_vertices_parallel(&input.positions, &mut target.positions, &params, &sampler, batch_size);
            } else {
                displace_vertices_serial(&input.positions, &mut target.positions, &params, &sampler);
            }
            target.generation = generation;
            trace::record(&displace_trace, frame, TraceKind::DisplaceFinished, generation);
            target
        };
        self.write = Slot::InFlight(self.dispatch(mode, "displace_vertices", displace));

        // Face normals of the current read generation
        let source = Arc::clone(&read);
        let indices = Arc::clone(&self.indices);
        let triangle_trace = self.trace.clone();
        let triangle_stage = move || {
            trace::record(&triangle_trace, frame, TraceKind::TriangleNormalsStarted, source.generation);
            if parallel {
                compute_triangle_normals_parallel(&source.positions, &indices, &mut buffers.triangle_normals, batch_size);
            } else {
                compute_triangle_normals_serial(&source.positions, &indices, &mut buffers.triangle_normals);
            }
            buffers.source_generation = source.generation;
            trace::record(&triangle_trace, frame, TraceKind::TriangleNormalsFinished, source.generation);
            buffers
        };
        let triangles = self.dispatch(mode, "triangle_normals", triangle_stage);

        // Vertex normals, only after every face normal is written
        let adjacency = Arc::clone(&self.adjacency);
        let policy = self.config.aggregation;
        let vertex_trace = self.trace.clone();
        let vertex_stage = move |mut buffers: NormalBuffers| {
            let generation = buffers.source_generation;
            trace::record(&vertex_trace, frame, TraceKind::VertexNormalsStarted, generation);
            if parallel {
                aggregate_vertex_normals_parallel(
                    &adjacency,
                    &buffers.triangle_normals,
                    &mut buffers.vertex_normals,
                    policy,
                    batch_size,
                );
            } else {
                aggregate_vertex_normals_serial(
                    &adjacency,
                    &buffers.triangle_normals,
                    &mut buffers.vertex_normals,
                    policy,
                );
            }
            trace::record(&vertex_trace, frame, TraceKind::VertexNormalsFinished, generation);
            buffers
        };
        let vertices = self.dispatch_after(mode, triangles, "vertex_normals", vertex_stage)?;
        self.normals = Slot::InFlight(vertices);
        self.stage = FrameStage::NormalsVertexScheduled;

        Ok(())
    }

    /// Wait for this frame's normals and expose positions and normals
    ///
    /// Does not wait for the displacement job issued by `advance_frame`;
    /// that job writes the other buffer.
    pub fn sync_and_fetch(&mut self) -> OceanResult<FrameView<'_>> {
        self.ensure_active()?;

        settle(&mut self.normals)?;

        let read = self
            .read
            .as_ref()
            .ok_or_ocean(|| state_error("read buffer", "released"))?;
        let normals = match &self.normals {
            Slot::Ready(normals) => normals,
            _ => return Err(state_error("normal buffers ready", "missing")),
        };

        trace::record(&self.trace, self.frame_index, TraceKind::Presented, read.generation);
        self.stage = FrameStage::Presented;

        Ok(FrameView {
            positions: &read.positions,
            normals: &normals.vertex_normals,
            generation: read.generation,
            normals_generation: normals.source_generation,
            frame_index: self.frame_index,
        })
    }

    /// Copy the presented frame into host arrays
    ///
    /// Both destinations must hold exactly `vertex_count` elements.
    pub fn copy_into(&self, positions_out: &mut [Vec3], normals_out: &mut [Vec3]) -> OceanResult<()> {
        let (positions, normals) = self.presentable()?;
        check_len("positions", positions.len(), positions_out.len())?;
        check_len("normals", normals.len(), normals_out.len())?;

        positions_out.copy_from_slice(positions);
        normals_out.copy_from_slice(normals);
        Ok(())
    }

    /// Copy the presented frame into flat `xyz` float arrays
    ///
    /// Both destinations must hold exactly `3 * vertex_count` floats.
    pub fn copy_into_raw(&self, positions_out: &mut [f32], normals_out: &mut [f32]) -> OceanResult<()> {
        let (positions, normals) = self.presentable()?;
        let positions: &[f32] = bytemuck::cast_slice(positions);
        let normals: &[f32] = bytemuck::cast_slice(normals);
        check_len("positions", positions.len(), positions_out.len())?;
        check_len("normals", normals.len(), normals_out.len())?;

        positions_out.copy_from_slice(positions);
        normals_out.copy_from_slice(normals);
        Ok(())
    }

    /// Wait for outstanding jobs and release every buffer
    ///
    /// Calling it again is a no-op.
    pub fn shutdown(&mut self) -> OceanResult<()> {
        if self.stage == FrameStage::Shutdown {
            return Ok(());
        }

        let displacement = settle(&mut self.write);
        let normals = settle(&mut self.normals);

        self.write = Slot::Released;
        self.normals = Slot::Released;
        self.read = None;
        self.stage = FrameStage::Shutdown;

        log::info!(
            "[OceanPipeline::shutdown] Released buffers after {} frames",
            self.frame_index
        );

        displacement.and(normals)
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Stage as seen between host calls
    ///
    /// Only `Idle`, `NormalsVertexScheduled`, `Presented` and `Shutdown`
    /// are reported here. The job stages in between are recorded per
    /// generation by the trace (`PipelineTrace::stage_history`).
    pub fn stage(&self) -> FrameStage {
        self.stage
    }

    /// Frames advanced so far
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Buffer currently in the read role (None after shutdown)
    pub fn read_buffer_id(&self) -> Option<BufferId> {
        self.read.as_ref().map(|read| read.id)
    }

    /// Buffer currently in the write role (None after shutdown)
    pub fn write_buffer_id(&self) -> Option<BufferId> {
        self.read_buffer_id().map(BufferId::other)
    }

    /// True while the displacement issued by the last `advance_frame` runs
    pub fn is_displacement_pending(&self) -> bool {
        match &self.write {
            Slot::InFlight(handle) => !thread_pool::is_completed(handle),
            _ => false,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn triangle_count(&self) -> usize {
        self.triangle_count
    }

    pub fn adjacency(&self) -> &VertexAdjacencyData {
        &self.adjacency
    }

    pub fn config(&self) -> &OceanConfig {
        &self.config
    }

    /// Job trace, when enabled by `record_trace`
    pub fn trace(&self) -> Option<&PipelineTrace> {
        self.trace.as_deref()
    }

    /// Normals of the read buffer recomputed in one serial scatter pass
    ///
    /// Independent of the adjacency map; useful to cross-check the
    /// pipeline output.
    pub fn reference_normals(&self) -> OceanResult<Vec<Vec3>> {
        self.ensure_active()?;
        let read = self
            .read
            .as_ref()
            .ok_or_ocean(|| state_error("read buffer", "released"))?;

        let mut normals = vec![Vec3::ZERO; self.vertex_count];
        recalculate_normals_scatter(&read.positions, &self.indices, &mut normals);
        Ok(normals)
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    fn ensure_active(&self) -> OceanResult<()> {
        if self.stage == FrameStage::Shutdown {
            return Err(state_error("initialized pipeline", "shut down"));
        }
        Ok(())
    }

    fn presentable(&self) -> OceanResult<(&[Vec3], &[Vec3])> {
        self.ensure_active()?;
        let read = self
            .read
            .as_ref()
            .ok_or_ocean(|| state_error("read buffer", "released"))?;
        match &self.normals {
            Slot::Ready(normals) => Ok((read.positions.as_slice(), normals.vertex_normals.as_slice())),
            Slot::InFlight(_) => Err(state_error("synced frame", "normals in flight")),
            Slot::Released => Err(state_error("normal buffers", "released")),
        }
    }

    fn dispatch<T, F>(&self, mode: ExecutionMode, label: &'static str, f: F) -> JobHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        match mode {
            ExecutionMode::Immediate => thread_pool::run_immediate(label, f),
            ExecutionMode::Deferred => thread_pool::schedule(&self.jobs, label, f),
        }
    }

    fn dispatch_after<T, U, F>(
        &self,
        mode: ExecutionMode,
        dependency: JobHandle<T>,
        label: &'static str,
        f: F,
    ) -> OceanResult<JobHandle<U>>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        match mode {
            ExecutionMode::Immediate => {
                let upstream = thread_pool::complete(dependency)?;
                Ok(thread_pool::run_immediate(label, move || f(upstream)))
            }
            ExecutionMode::Deferred => Ok(thread_pool::schedule_after(&self.jobs, dependency, label, f)),
        }
    }
}

impl Drop for OceanPipeline {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::warn!("[OceanPipeline::drop] Outstanding job failed: {}", e);
        }
    }
}

impl std::fmt::Debug for OceanPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OceanPipeline")
            .field("vertex_count", &self.vertex_count)
            .field("triangle_count", &self.triangle_count)
            .field("stage", &self.stage)
            .field("frame_index", &self.frame_index)
            .field("read_buffer", &self.read_buffer_id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjacency::incident_triangles;
    use crate::kernels::NormalAggregation;

    fn config() -> OceanConfig {
        OceanConfig {
            worker_threads: Some(2),
            batch_size: 8,
            ..OceanConfig::default()
        }
    }

    /// 6x5 quads in the XZ plane, faces pointing +Y
    fn grid() -> OceanMeshData {
        let (cols, rows) = (6u32, 5u32);
        let stride = cols + 1;
        let mut positions = Vec::new();
        for r in 0..=rows {
            for c in 0..=cols {
                positions.push(Vec3::new(c as f32, 0.0, r as f32));
            }
        }
        let mut indices = Vec::new();
        for r in 0..rows {
            for c in 0..cols {
                let i = r * stride + c;
                indices.extend_from_slice(&[i, i + stride, i + 1, i + 1, i + stride, i + stride + 1]);
            }
        }
        mesh::create_ocean_mesh(positions, indices)
    }

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-5, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_initial_frame_is_presentable() {
        let mut pipeline = OceanPipeline::initialize(&grid(), config()).expect("init");
        assert_eq!(pipeline.stage(), FrameStage::Idle);
        assert_eq!(pipeline.read_buffer_id(), Some(BufferId::A));
        assert_eq!(pipeline.write_buffer_id(), Some(BufferId::B));

        let view = pipeline.sync_and_fetch().expect("sync");
        assert_eq!(view.generation, 0);
        assert_eq!(view.frame_index, 0);
        for &n in view.normals {
            assert_close(n, Vec3::Y);
        }
        assert_eq!(pipeline.stage(), FrameStage::Presented);
    }

    #[test]
    fn test_buffer_roles_alternate() {
        let mut pipeline = OceanPipeline::initialize(&grid(), config()).expect("init");
        let params = WaveParams::default();

        for frame in 1..=5u64 {
            pipeline
                .advance_frame(&params.at_time(frame as f32 * 0.1), ExecutionMode::Deferred)
                .expect("advance");
            let expected = if frame % 2 == 1 { BufferId::B } else { BufferId::A };
            assert_eq!(pipeline.read_buffer_id(), Some(expected));
            assert_eq!(pipeline.write_buffer_id(), Some(expected.other()));

            let view = pipeline.sync_and_fetch().expect("sync");
            assert_eq!(view.frame_index, frame);
            assert_eq!(view.generation, frame - 1);
            assert_eq!(view.normals_generation, view.generation);
        }
    }

    #[test]
    fn test_stage_progression() {
        let mut pipeline = OceanPipeline::initialize(&grid(), config()).expect("init");
        pipeline
            .advance_frame(&WaveParams::default(), ExecutionMode::Deferred)
            .expect("advance");
        assert_eq!(pipeline.stage(), FrameStage::NormalsVertexScheduled);
        pipeline.sync_and_fetch().expect("sync");
        assert_eq!(pipeline.stage(), FrameStage::Presented);
    }

    #[test]
    fn test_trace_walks_frame_stages_in_order() {
        let traced = OceanConfig {
            record_trace: true,
            ..config()
        };
        let mut pipeline = OceanPipeline::initialize(&grid(), traced).expect("init");
        let params = WaveParams::default();
        for frame in 1..=4 {
            pipeline
                .advance_frame(&params.at_time(frame as f32), ExecutionMode::Deferred)
                .expect("advance");
            pipeline.sync_and_fetch().expect("sync");
        }

        let trace = pipeline.trace().expect("trace enabled");
        for generation in 1..=3 {
            assert_eq!(
                trace.stage_history(generation),
                vec![
                    FrameStage::DisplaceScheduled,
                    FrameStage::DisplaceDone,
                    FrameStage::NormalsTriangleScheduled,
                    FrameStage::NormalsVertexScheduled,
                    FrameStage::NormalsDone,
                    FrameStage::Presented,
                ],
                "generation {}",
                generation
            );
        }
    }

    #[test]
    fn test_immediate_matches_deferred() {
        let mut immediate = OceanPipeline::initialize(&grid(), config()).expect("init");
        let mut deferred = OceanPipeline::initialize(&grid(), config()).expect("init");
        let params = WaveParams::default();

        for frame in 1..=4 {
            let params = params.at_time(frame as f32 * 0.25);
            immediate.advance_frame(&params, ExecutionMode::Immediate).expect("advance");
            deferred.advance_frame(&params, ExecutionMode::Deferred).expect("advance");

            let a = immediate.sync_and_fetch().expect("sync");
            let (positions, normals) = (a.positions.to_vec(), a.normals.to_vec());
            let b = deferred.sync_and_fetch().expect("sync");
            assert_eq!(positions, b.positions);
            assert_eq!(normals, b.normals);
        }
    }

    #[test]
    fn test_pipeline_normals_match_scatter_reference() {
        let mut pipeline = OceanPipeline::initialize(&grid(), config()).expect("init");
        let params = WaveParams::default();
        for frame in 1..=3 {
            pipeline
                .advance_frame(&params.at_time(frame as f32), ExecutionMode::Deferred)
                .expect("advance");
        }

        let normals = pipeline.sync_and_fetch().expect("sync").normals.to_vec();
        let reference = pipeline.reference_normals().expect("reference");
        for (a, b) in normals.into_iter().zip(reference) {
            assert_close(a, b);
        }
    }

    #[test]
    fn test_average_by_count_policy_is_used() {
        let averaging = OceanConfig {
            aggregation: NormalAggregation::AverageByCount,
            ..config()
        };
        let mut averaged = OceanPipeline::initialize(&grid(), averaging).expect("init");
        let mut normalized = OceanPipeline::initialize(&grid(), config()).expect("init");
        let params = WaveParams::default().at_time(1.3);
        for pipeline in [&mut averaged, &mut normalized] {
            pipeline.advance_frame(&params, ExecutionMode::Deferred).expect("advance");
            pipeline.advance_frame(&params, ExecutionMode::Deferred).expect("advance");
        }

        let unit = normalized.sync_and_fetch().expect("sync").normals.to_vec();
        assert!(unit.iter().all(|n| (n.length() - 1.0).abs() < 1e-4));

        let (positions, normals) = {
            let view = averaged.sync_and_fetch().expect("sync");
            (view.positions.to_vec(), view.normals.to_vec())
        };
        let mut tri = vec![Vec3::ZERO; averaged.triangle_count()];
        compute_triangle_normals_serial(&positions, &averaged.indices, &mut tri);

        let mut shortest = f32::MAX;
        for (v, &n) in normals.iter().enumerate() {
            let incident = incident_triangles(averaged.adjacency(), v);
            let mean = incident.iter().map(|&t| tri[t as usize]).sum::<Vec3>() / incident.len() as f32;
            assert_close(n, mean);
            shortest = shortest.min(n.length());
        }
        // The displaced surface is curved, so some averages fall short of unit length
        assert!(shortest < 0.999);
    }

    #[test]
    fn test_copy_requires_sync() {
        let mut pipeline = OceanPipeline::initialize(&grid(), config()).expect("init");
        let n = pipeline.vertex_count();
        let mut positions = vec![Vec3::ZERO; n];
        let mut normals = vec![Vec3::ZERO; n];

        pipeline
            .advance_frame(&WaveParams::default(), ExecutionMode::Deferred)
            .expect("advance");
        let early = pipeline.copy_into(&mut positions, &mut normals);
        // The normal jobs may already be done, but they have not been synced
        assert!(matches!(early, Err(OceanError::StateError { .. })));

        pipeline.sync_and_fetch().expect("sync");
        pipeline.copy_into(&mut positions, &mut normals).expect("copy");

        let mut raw_positions = vec![0.0f32; n * 3];
        let mut raw_normals = vec![0.0f32; n * 3];
        pipeline
            .copy_into_raw(&mut raw_positions, &mut raw_normals)
            .expect("raw copy");
        assert_eq!(raw_positions[3], positions[1].x);
        assert_eq!(raw_normals[4], normals[1].y);
    }

    #[test]
    fn test_copy_rejects_wrong_length() {
        let mut pipeline = OceanPipeline::initialize(&grid(), config()).expect("init");
        pipeline.sync_and_fetch().expect("sync");
        let n = pipeline.vertex_count();

        let mut positions = vec![Vec3::ZERO; n - 1];
        let mut normals = vec![Vec3::ZERO; n];
        match pipeline.copy_into(&mut positions, &mut normals) {
            Err(OceanError::BufferSizeMismatch { expected, found, .. }) => {
                assert_eq!(expected, n);
                assert_eq!(found, n - 1);
            }
            other => panic!("expected size mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_shutdown_is_idempotent_and_final() {
        let mut pipeline = OceanPipeline::initialize(&grid(), config()).expect("init");
        pipeline
            .advance_frame(&WaveParams::default(), ExecutionMode::Deferred)
            .expect("advance");

        pipeline.shutdown().expect("shutdown");
        pipeline.shutdown().expect("second shutdown");
        assert_eq!(pipeline.stage(), FrameStage::Shutdown);
        assert_eq!(pipeline.read_buffer_id(), None);

        let advance = pipeline.advance_frame(&WaveParams::default(), ExecutionMode::Deferred);
        assert!(matches!(advance, Err(OceanError::StateError { .. })));
        assert!(matches!(pipeline.sync_and_fetch(), Err(OceanError::StateError { .. })));
    }

    #[test]
    fn test_rejects_invalid_mesh() {
        let mut mesh = grid();
        mesh.indices.push(0);
        let result = OceanPipeline::initialize(&mesh, config());
        assert!(matches!(result, Err(OceanError::Mesh(_))));
    }
}
