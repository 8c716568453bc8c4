use ndarray::Array2;

use crate::consts::{FIT_EPSILON, SUBPIXEL_CLAMP};
use crate::error::{PivError, Result};

/// Displacement estimate extracted from one correlation surface.
#[derive(Clone, Copy, Debug, Default)]
pub struct PeakEstimate {
    /// Horizontal displacement of frame B relative to frame A, px.
    pub dx: f64,
    /// Vertical displacement of frame B relative to frame A, px.
    pub dy: f64,
    /// Correlation value at the discrete peak, clamped to [-1, 1].
    pub peak: f64,
}

/// Locate the correlation peak, optionally refined to sub-pixel precision.
///
/// The surface must be quadrant swapped (zero displacement at the center
/// sample). When `interpolate` is set, the integer peak is refined along
/// each axis independently with a three-point fit through the peak and its
/// axis neighbors. A peak on the surface border keeps the integer location
/// for that axis; no sample outside the surface is ever read.
pub fn find_peak(surface: &Array2<f64>, interpolate: bool) -> Result<PeakEstimate> {
    let (h, w) = surface.dim();

    let mut best = f64::NEG_INFINITY;
    let mut peak_row = 0;
    let mut peak_col = 0;
    for ((row, col), &val) in surface.indexed_iter() {
        if val > best {
            best = val;
            peak_row = row;
            peak_col = col;
        }
    }

    if !best.is_finite() {
        return Err(PivError::InternalComputation(format!(
            "non-finite correlation peak at ({}, {})",
            peak_row, peak_col
        )));
    }

    let mut dx = peak_col as f64 - (w / 2) as f64;
    let mut dy = peak_row as f64 - (h / 2) as f64;

    if interpolate {
        if peak_col > 0 && peak_col < w - 1 {
            dx += axis_offset(
                surface[[peak_row, peak_col - 1]],
                best,
                surface[[peak_row, peak_col + 1]],
            );
        }
        if peak_row > 0 && peak_row < h - 1 {
            dy += axis_offset(
                surface[[peak_row - 1, peak_col]],
                best,
                surface[[peak_row + 1, peak_col]],
            );
        }
    }

    Ok(PeakEstimate {
        dx,
        dy,
        peak: best.clamp(-1.0, 1.0),
    })
}

/// Sub-pixel offset of the apex of a curve fitted through three samples
/// one pixel apart, clamped to +/- 0.5 px.
///
/// Uses the three-point Gaussian fit standard in PIV; falls back to a
/// parabolic fit when a sample is non-positive and its log undefined.
fn axis_offset(prev: f64, center: f64, next: f64) -> f64 {
    let offset = if prev > 0.0 && center > 0.0 && next > 0.0 {
        let (lp, lc, ln) = (prev.ln(), center.ln(), next.ln());
        let denom = 2.0 * (lp + ln - 2.0 * lc);
        if denom.abs() < FIT_EPSILON {
            return 0.0;
        }
        (lp - ln) / denom
    } else {
        let denom = 2.0 * (prev + next - 2.0 * center);
        if denom.abs() < FIT_EPSILON {
            return 0.0;
        }
        (prev - next) / denom
    };
    offset.clamp(-SUBPIXEL_CLAMP, SUBPIXEL_CLAMP)
}
