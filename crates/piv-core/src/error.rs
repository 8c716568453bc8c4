use thiserror::Error;

/// Errors surfaced by the PIV engine.
///
/// All variants are cheap to clone so a failed engine can retain the error
/// that moved it to the failed state while also returning it to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PivError {
    #[error("frame size mismatch: {width_a}x{height_a} vs {width_b}x{height_b}")]
    DimensionMismatch {
        width_a: usize,
        height_a: usize,
        width_b: usize,
        height_b: usize,
    },

    #[error("window size {window} px does not fit a {width}x{height} frame")]
    InvalidWindowSize {
        window: usize,
        width: usize,
        height: usize,
    },

    #[error("window overlap {overlap} px must be smaller than the window edge {window} px")]
    InvalidOverlap { overlap: usize, window: usize },

    /// Zero intensity variance in a patch makes its correlation undefined.
    /// Absorbed per tile as a zero vector with zero confidence; never
    /// escapes a run.
    #[error("degenerate tile: zero intensity variance")]
    DegenerateTile,

    #[error("analysis cancelled")]
    Cancelled,

    #[error("internal computation error: {0}")]
    InternalComputation(String),
}

pub type Result<T> = std::result::Result<T, PivError>;
