//! Job execution trace
//!
//! Optional ordered record of when each pipeline job started and finished
//! and which vertex generation it touched. Written from worker threads.

use super::pipeline_data::FrameStage;
use parking_lot::Mutex;

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceKind {
    DisplaceStarted,
    DisplaceFinished,
    TriangleNormalsStarted,
    TriangleNormalsFinished,
    VertexNormalsStarted,
    VertexNormalsFinished,
    Presented,
}

impl TraceKind {
    /// Frame stage a generation has reached once this event is recorded
    pub fn stage(self) -> Option<FrameStage> {
        match self {
            TraceKind::DisplaceStarted => Some(FrameStage::DisplaceScheduled),
            TraceKind::DisplaceFinished => Some(FrameStage::DisplaceDone),
            TraceKind::TriangleNormalsStarted => Some(FrameStage::NormalsTriangleScheduled),
            TraceKind::TriangleNormalsFinished => None,
            TraceKind::VertexNormalsStarted => Some(FrameStage::NormalsVertexScheduled),
            TraceKind::VertexNormalsFinished => Some(FrameStage::NormalsDone),
            TraceKind::Presented => Some(FrameStage::Presented),
        }
    }
}

/// One recorded step
///
/// `generation` is the vertex generation written (displacement) or read
/// (normals, presentation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceEvent {
    pub frame: u64,
    pub kind: TraceKind,
    pub generation: u64,
}

/// Thread-safe append-only event log
#[derive(Debug, Default)]
pub struct PipelineTrace {
    events: Mutex<Vec<TraceEvent>>,
}

impl PipelineTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, frame: u64, kind: TraceKind, generation: u64) {
        self.events.lock().push(TraceEvent {
            frame,
            kind,
            generation,
        });
    }

    /// Copy of all events so far, in recording order
    pub fn snapshot(&self) -> Vec<TraceEvent> {
        self.events.lock().clone()
    }

    /// Position of the first event matching `kind` and `generation`
    pub fn position_of(&self, kind: TraceKind, generation: u64) -> Option<usize> {
        self.events
            .lock()
            .iter()
            .position(|e| e.kind == kind && e.generation == generation)
    }

    /// Stages `generation` went through, in recording order
    pub fn stage_history(&self, generation: u64) -> Vec<FrameStage> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.generation == generation)
            .filter_map(|e| e.kind.stage())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

/// Record into an optional trace
#[inline]
pub(crate) fn record(trace: &Option<std::sync::Arc<PipelineTrace>>, frame: u64, kind: TraceKind, generation: u64) {
    if let Some(trace) = trace {
        trace.record(frame, kind, generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_lookup() {
        let trace = PipelineTrace::new();
        assert!(trace.is_empty());
        trace.record(1, TraceKind::DisplaceStarted, 1);
        trace.record(1, TraceKind::TriangleNormalsStarted, 0);
        trace.record(1, TraceKind::DisplaceFinished, 1);

        assert_eq!(trace.len(), 3);
        assert_eq!(trace.position_of(TraceKind::DisplaceFinished, 1), Some(2));
        assert_eq!(trace.position_of(TraceKind::DisplaceFinished, 2), None);

        assert_eq!(
            trace.stage_history(1),
            vec![FrameStage::DisplaceScheduled, FrameStage::DisplaceDone]
        );
        assert_eq!(trace.stage_history(0), vec![FrameStage::NormalsTriangleScheduled]);

        trace.clear();
        assert!(trace.snapshot().is_empty());
    }
}
