use ndarray::Array2;

use crate::grid::{TileGrid, WindowSize};

/// One tile's displacement estimate.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TileVector {
    /// Horizontal displacement, px.
    pub u: f32,
    /// Vertical displacement, px.
    pub v: f32,
    /// Correlation peak height, the confidence of this vector.
    pub peak: f32,
}

impl TileVector {
    /// Zero vector with zero confidence, the "no signal" outcome for
    /// degenerate or skipped tiles.
    pub fn no_signal() -> Self {
        Self::default()
    }
}

/// Dense displacement field over the tile grid.
///
/// Array index (r, c) corresponds exactly to tile (r, c) of the grid the
/// field was assembled from.
#[derive(Clone, Debug)]
pub struct VelocityField {
    /// Horizontal displacement per tile, px.
    pub u: Array2<f32>,
    /// Vertical displacement per tile, px.
    pub v: Array2<f32>,
    /// Correlation peak height per tile.
    pub peak: Array2<f32>,
    /// Window size the field was computed with.
    pub window: WindowSize,
}

impl VelocityField {
    /// Assemble the field from per-tile results in the grid's raster order.
    ///
    /// Pure reshaping with no numeric transformation.
    pub fn assemble(grid: &TileGrid, vectors: &[TileVector]) -> Self {
        debug_assert_eq!(vectors.len(), grid.len());

        let shape = (grid.rows, grid.cols);
        let mut u = Array2::<f32>::zeros(shape);
        let mut v = Array2::<f32>::zeros(shape);
        let mut peak = Array2::<f32>::zeros(shape);
        for (i, vec) in vectors.iter().enumerate() {
            let idx = [i / grid.cols, i % grid.cols];
            u[idx] = vec.u;
            v[idx] = vec.v;
            peak[idx] = vec.peak;
        }

        Self {
            u,
            v,
            peak,
            window: grid.window,
        }
    }

    pub fn rows(&self) -> usize {
        self.u.nrows()
    }

    pub fn cols(&self) -> usize {
        self.u.ncols()
    }

    /// Largest vector magnitude in the field.
    pub fn max_magnitude(&self) -> f32 {
        self.u
            .iter()
            .zip(self.v.iter())
            .map(|(&u, &v)| (u * u + v * v).sqrt())
            .fold(0.0, f32::max)
    }

    /// Zero out U/V wherever the peak height falls below `level` times the
    /// field's maximum peak height. The confidence array itself is left
    /// untouched so callers can re-threshold.
    pub fn mask_low_confidence(&mut self, level: f32) {
        let max_peak = self.peak.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        if !max_peak.is_finite() {
            return;
        }
        let cutoff = level * max_peak;
        for ((u, v), &peak) in self
            .u
            .iter_mut()
            .zip(self.v.iter_mut())
            .zip(self.peak.iter())
        {
            if peak < cutoff {
                *u = 0.0;
                *v = 0.0;
            }
        }
    }
}
