mod fft;
mod peak;

pub use peak::{find_peak, PeakEstimate};

use ndarray::Array2;
use num_complex::Complex;

use crate::consts::VARIANCE_EPSILON;
use crate::error::{PivError, Result};

use self::fft::{swap_quadrants, FftPair};

/// Normalized cross-correlator for equal-size square patches.
///
/// FFT plans are created once per window size and shared read-only across
/// worker threads.
pub struct Correlator {
    fft: FftPair,
}

impl Correlator {
    pub fn new(window_edge: usize) -> Self {
        Self {
            fft: FftPair::plan(window_edge),
        }
    }

    /// Correlation surface between a patch of frame A and the matching
    /// patch of frame B.
    ///
    /// The surface is the circular normalized cross-correlation of the
    /// mean-subtracted patches, quadrant swapped so zero displacement sits
    /// at the center sample. Values are bounded by [-1, 1]; identical
    /// patches score 1.0 at the center, and the peak location gives the
    /// displacement of B relative to A.
    ///
    /// A zero-variance patch on either side makes the correlation
    /// undefined and yields [`PivError::DegenerateTile`].
    pub fn correlate(&self, a: &Array2<f32>, b: &Array2<f32>) -> Result<Array2<f64>> {
        let n = self.fft.size;
        debug_assert_eq!(a.dim(), (n, n));
        debug_assert_eq!(b.dim(), (n, n));

        let (a0, energy_a) = centered(a);
        let (b0, energy_b) = centered(b);
        if energy_a < VARIANCE_EPSILON || energy_b < VARIANCE_EPSILON {
            return Err(PivError::DegenerateTile);
        }

        let fa = self.fft.fft2d(&a0);
        let fb = self.fft.fft2d(&b0);

        // conj(A) * B puts the correlation peak at the displacement of B
        // relative to A.
        let mut cross = Array2::<Complex<f64>>::zeros((n, n));
        for row in 0..n {
            for col in 0..n {
                cross[[row, col]] = fa[[row, col]].conj() * fb[[row, col]];
            }
        }

        let mut surface = self.fft.ifft2d(&cross);
        let norm = (energy_a * energy_b).sqrt();
        surface.mapv_inplace(|v| v / norm);
        swap_quadrants(&mut surface);
        Ok(surface)
    }
}

/// Subtract the patch mean. Returns the centered patch and its energy,
/// the sum of squared deviations.
fn centered(patch: &Array2<f32>) -> (Array2<f64>, f64) {
    let count = patch.len() as f64;
    let mean = patch.iter().map(|&v| v as f64).sum::<f64>() / count;

    let mut out = Array2::<f64>::zeros(patch.raw_dim());
    let mut energy = 0.0;
    for (dst, &src) in out.iter_mut().zip(patch.iter()) {
        let dev = src as f64 - mean;
        *dst = dev;
        energy += dev * dev;
    }
    (out, energy)
}
