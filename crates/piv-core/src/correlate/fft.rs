use std::sync::Arc;

use ndarray::Array2;
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Forward and inverse FFT plans for one square transform size.
///
/// rustfft plans are immutable and thread-safe, so a single pair of plans
/// serves every worker correlating tiles of the same window size.
pub(crate) struct FftPair {
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    pub size: usize,
}

impl FftPair {
    pub fn plan(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            forward: planner.plan_fft_forward(size),
            inverse: planner.plan_fft_inverse(size),
            size,
        }
    }

    /// 2D FFT: row-wise FFT, then column-wise FFT.
    pub fn fft2d(&self, data: &Array2<f64>) -> Array2<Complex<f64>> {
        let n = self.size;
        let mut work = Array2::<Complex<f64>>::zeros((n, n));
        for row in 0..n {
            for col in 0..n {
                work[[row, col]] = Complex::new(data[[row, col]], 0.0);
            }
        }

        for row in 0..n {
            let mut row_data: Vec<Complex<f64>> = (0..n).map(|c| work[[row, c]]).collect();
            self.forward.process(&mut row_data);
            for col in 0..n {
                work[[row, col]] = row_data[col];
            }
        }

        for col in 0..n {
            let mut col_data: Vec<Complex<f64>> = (0..n).map(|r| work[[r, col]]).collect();
            self.forward.process(&mut col_data);
            for row in 0..n {
                work[[row, col]] = col_data[row];
            }
        }

        work
    }

    /// Inverse 2D FFT. Returns the real part, scaled by 1/(n*n).
    pub fn ifft2d(&self, data: &Array2<Complex<f64>>) -> Array2<f64> {
        let n = self.size;
        let mut work = data.clone();

        for col in 0..n {
            let mut col_data: Vec<Complex<f64>> = (0..n).map(|r| work[[r, col]]).collect();
            self.inverse.process(&mut col_data);
            for row in 0..n {
                work[[row, col]] = col_data[row];
            }
        }

        for row in 0..n {
            let mut row_data: Vec<Complex<f64>> = (0..n).map(|c| work[[row, c]]).collect();
            self.inverse.process(&mut row_data);
            for col in 0..n {
                work[[row, col]] = row_data[col];
            }
        }

        let scale = 1.0 / (n * n) as f64;
        let mut result = Array2::<f64>::zeros((n, n));
        for row in 0..n {
            for col in 0..n {
                result[[row, col]] = work[[row, col]].re * scale;
            }
        }

        result
    }
}

/// Swap diagonal quadrants in place so the zero-displacement sample moves
/// to the array center. Requires even dimensions, which power-of-two
/// windows guarantee.
pub(crate) fn swap_quadrants(data: &mut Array2<f64>) {
    let (h, w) = data.dim();
    let (hh, hw) = (h / 2, w / 2);
    for row in 0..hh {
        for col in 0..w {
            let (row2, col2) = ((row + hh) % h, (col + hw) % w);
            let tmp = data[[row, col]];
            data[[row, col]] = data[[row2, col2]];
            data[[row2, col2]] = tmp;
        }
    }
}
