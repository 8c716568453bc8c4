/// Analysis stage, used for progress reporting.
#[derive(Clone, Copy, Debug)]
pub enum EngineStage {
    Correlation,
    Assembly,
    Rendering,
}

impl std::fmt::Display for EngineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Correlation => write!(f, "Correlating windows"),
            Self::Assembly => write!(f, "Assembling field"),
            Self::Rendering => write!(f, "Rendering flow colors"),
        }
    }
}

/// Thread-safe progress reporting for an engine run.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations. `advance`
/// is called from worker threads and must tolerate out-of-order counts.
pub trait ProgressReporter: Send + Sync {
    /// A new stage has started. `total_items` is the number of work items
    /// in this stage (e.g., tile count), if known.
    fn begin_stage(&self, _stage: EngineStage, _total_items: Option<usize>) {}

    /// One work item within the current stage has completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter, used when `run` delegates.
pub(super) struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
