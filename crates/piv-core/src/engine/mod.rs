mod config;
mod progress;

pub use config::{MaskConfig, PivConfig};
pub use progress::{EngineStage, ProgressReporter};

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use image::RgbImage;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::color::render_flow;
use crate::correlate::{find_peak, Correlator};
use crate::error::{PivError, Result};
use crate::field::{TileVector, VelocityField};
use crate::frame::Frame;
use crate::grid::{Tile, TileGrid};

use self::progress::NoOpReporter;

/// The artifacts of a completed run. They are created together and
/// discarded together on the next run or reconfiguration.
#[derive(Clone, Debug)]
pub struct PivOutputs {
    /// U, V and confidence arrays indexed by tile grid position.
    pub field: VelocityField,
    /// Color-coded visualization of the field, one pixel per tile.
    pub color: RgbImage,
}

/// Requests cancellation of a running analysis.
///
/// The flag is checked between tiles, never mid-tile; the affected run
/// fails with [`PivError::Cancelled`] and discards partial results.
#[derive(Clone, Debug, Default)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn abort(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}

/// Observable engine lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Unconfigured,
    Configured,
    Completed,
    Failed,
}

enum State {
    Unconfigured,
    Configured(Box<Inputs>),
    Completed {
        inputs: Box<Inputs>,
        outputs: PivOutputs,
    },
    Failed(PivError),
}

struct Inputs {
    frame_a: Frame,
    frame_b: Frame,
    config: PivConfig,
    grid: TileGrid,
}

/// Windowed cross-correlation PIV engine.
///
/// Lifecycle: configure an image pair, run, read the outputs. Running
/// again from the completed state recomputes and discards the previous
/// artifacts. A failed engine returns its retained error until it is
/// configured again; configuring clears any previous failure or results.
pub struct PivEngine {
    state: State,
    abort: AbortHandle,
}

impl Default for PivEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PivEngine {
    pub fn new() -> Self {
        Self {
            state: State::Unconfigured,
            abort: AbortHandle::default(),
        }
    }

    /// Validate and install an image pair and analysis parameters.
    ///
    /// Validation is atomic: either the engine moves to the configured
    /// state, or it moves to the failed state with the specific error.
    pub fn configure(&mut self, frame_a: Frame, frame_b: Frame, config: PivConfig) -> Result<()> {
        self.abort.reset();
        match TileGrid::build(&frame_a, &frame_b, config.window, config.overlap) {
            Ok(grid) => {
                info!(
                    rows = grid.rows,
                    cols = grid.cols,
                    window = %config.window,
                    "engine configured"
                );
                self.state = State::Configured(Box::new(Inputs {
                    frame_a,
                    frame_b,
                    config,
                    grid,
                }));
                Ok(())
            }
            Err(err) => {
                self.state = State::Failed(err.clone());
                Err(err)
            }
        }
    }

    /// Run the analysis without progress feedback.
    pub fn run(&mut self) -> Result<()> {
        self.run_reported(Arc::new(NoOpReporter))
    }

    /// Run the analysis, reporting progress through `reporter`.
    ///
    /// Valid from the configured or completed state. On success the engine
    /// holds the new outputs; on any error it moves to the failed state.
    pub fn run_reported(&mut self, reporter: Arc<dyn ProgressReporter>) -> Result<()> {
        let inputs = match std::mem::replace(&mut self.state, State::Unconfigured) {
            State::Configured(inputs) | State::Completed { inputs, .. } => inputs,
            State::Unconfigured => {
                return Err(PivError::InternalComputation(
                    "run() called on an unconfigured engine".into(),
                ));
            }
            State::Failed(err) => {
                self.state = State::Failed(err.clone());
                return Err(err);
            }
        };

        match run_analysis(
            &inputs.frame_a,
            &inputs.frame_b,
            &inputs.config,
            &inputs.grid,
            &self.abort,
            reporter.as_ref(),
        ) {
            Ok(outputs) => {
                self.state = State::Completed { inputs, outputs };
                Ok(())
            }
            Err(err) => {
                self.state = State::Failed(err.clone());
                Err(err)
            }
        }
    }

    /// The artifacts of the last completed run. `None` in every other
    /// state; a failed run never exposes partial output.
    pub fn outputs(&self) -> Option<&PivOutputs> {
        match &self.state {
            State::Completed { outputs, .. } => Some(outputs),
            _ => None,
        }
    }

    /// The error that moved the engine to the failed state, if any.
    pub fn failure(&self) -> Option<&PivError> {
        match &self.state {
            State::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn state(&self) -> EngineState {
        match &self.state {
            State::Unconfigured => EngineState::Unconfigured,
            State::Configured(_) => EngineState::Configured,
            State::Completed { .. } => EngineState::Completed,
            State::Failed(_) => EngineState::Failed,
        }
    }

    /// A handle that cancels the current or next run from another thread.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }
}

/// Compute a velocity field and color image for an image pair without
/// engine state. Library callers that do not need the lifecycle can use
/// this directly.
pub fn compute_flow(frame_a: &Frame, frame_b: &Frame, config: &PivConfig) -> Result<PivOutputs> {
    let grid = TileGrid::build(frame_a, frame_b, config.window, config.overlap)?;
    run_analysis(
        frame_a,
        frame_b,
        config,
        &grid,
        &AbortHandle::default(),
        &NoOpReporter,
    )
}

fn run_analysis(
    frame_a: &Frame,
    frame_b: &Frame,
    config: &PivConfig,
    grid: &TileGrid,
    abort: &AbortHandle,
    reporter: &dyn ProgressReporter,
) -> Result<PivOutputs> {
    let total = grid.len();
    info!(
        tiles = total,
        window = %grid.window,
        interpolate = config.interpolate,
        "starting PIV analysis"
    );

    reporter.begin_stage(EngineStage::Correlation, Some(total));
    let correlator = Correlator::new(grid.window.edge());
    let done = AtomicUsize::new(0);

    // Tiles are independent; each parallel iteration owns its own output
    // slot, so collecting in index order needs no locking.
    let vectors: Vec<TileVector> = (0..total)
        .into_par_iter()
        .map(|i| {
            if abort.is_aborted() {
                return Err(PivError::Cancelled);
            }
            let tile = grid.tile(i);
            let outcome = process_tile(frame_a, frame_b, grid, &tile, &correlator, config);
            reporter.advance(done.fetch_add(1, Ordering::Relaxed) + 1);
            outcome
        })
        .collect::<Result<_>>()?;
    reporter.finish_stage();

    reporter.begin_stage(EngineStage::Assembly, Some(1));
    let mut field = VelocityField::assemble(grid, &vectors);
    if let Some(mask) = &config.mask {
        field.mask_low_confidence(mask.level);
    }
    reporter.finish_stage();

    reporter.begin_stage(EngineStage::Rendering, Some(1));
    let color = render_flow(&field, &config.color);
    reporter.finish_stage();

    info!(rows = field.rows(), cols = field.cols(), "PIV analysis complete");
    Ok(PivOutputs { field, color })
}

fn process_tile(
    frame_a: &Frame,
    frame_b: &Frame,
    grid: &TileGrid,
    tile: &Tile,
    correlator: &Correlator,
    config: &PivConfig,
) -> Result<TileVector> {
    if let Some(roi) = &config.roi {
        let (cx, cy) = tile.center(grid.window.edge());
        if !roi.contains(cx, cy) {
            return Ok(TileVector::no_signal());
        }
    }

    let patch_a = grid.patch(frame_a, tile);
    let patch_b = grid.patch(frame_b, tile);
    match correlator.correlate(&patch_a, &patch_b) {
        Ok(surface) => {
            let estimate = find_peak(&surface, config.interpolate)?;
            Ok(TileVector {
                u: estimate.dx as f32,
                v: estimate.dy as f32,
                peak: estimate.peak as f32,
            })
        }
        Err(PivError::DegenerateTile) => {
            debug!(row = tile.row, col = tile.col, "degenerate tile, no signal");
            Ok(TileVector::no_signal())
        }
        Err(err) => Err(err),
    }
}
