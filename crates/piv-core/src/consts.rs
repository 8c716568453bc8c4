/// Patch energy (sum of squared mean-subtracted samples) below which a tile
/// is treated as zero-variance and its correlation as undefined.
pub const VARIANCE_EPSILON: f64 = 1e-12;

/// Denominator magnitude below which a sub-pixel peak fit is considered
/// linearly dependent and skipped.
pub const FIT_EPSILON: f64 = 1e-12;

/// Sub-pixel refinement offsets are clamped to this many pixels per axis.
pub const SUBPIXEL_CLAMP: f64 = 0.5;

/// Edge length (px) of the default color wheel legend.
pub const COLOR_WHEEL_SIZE: u32 = 128;

/// Default fraction of the maximum peak height below which vectors are
/// zeroed when masking is enabled.
pub const DEFAULT_MASK_LEVEL: f32 = 0.5;
