use std::fmt;

use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{PivError, Result};
use crate::frame::Frame;

/// Interrogation window edge length in pixels.
///
/// The correlator is FFT-based, so only square power-of-two windows are
/// supported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowSize {
    W4,
    W8,
    #[default]
    W16,
    W32,
    W64,
    W128,
}

impl WindowSize {
    /// Edge length in pixels.
    pub fn edge(self) -> usize {
        match self {
            Self::W4 => 4,
            Self::W8 => 8,
            Self::W16 => 16,
            Self::W32 => 32,
            Self::W64 => 64,
            Self::W128 => 128,
        }
    }
}

impl fmt::Display for WindowSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let e = self.edge();
        write!(f, "{}x{}", e, e)
    }
}

/// Axis-aligned region of interest in image pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// One analysis window position on the tile grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tile {
    /// Grid row.
    pub row: usize,
    /// Grid column.
    pub col: usize,
    /// Top-left pixel x of the window, identical in both frames.
    pub x: usize,
    /// Top-left pixel y of the window, identical in both frames.
    pub y: usize,
}

impl Tile {
    /// Pixel coordinates of the window center.
    pub fn center(&self, edge: usize) -> (usize, usize) {
        (self.x + edge / 2, self.y + edge / 2)
    }
}

/// The grid of analysis windows covering an image pair.
///
/// Tiles are enumerated in raster order (top-to-bottom, left-to-right).
/// Trailing pixels that do not fill a whole window are dropped, never
/// padded with invented data; the grid extent reports the covered area.
#[derive(Clone, Debug)]
pub struct TileGrid {
    pub rows: usize,
    pub cols: usize,
    pub window: WindowSize,
    stride: usize,
}

impl TileGrid {
    /// Build the grid for two dimension-matched frames.
    ///
    /// `overlap` is the number of pixels shared between adjacent windows;
    /// zero gives edge-to-edge tiling.
    pub fn build(a: &Frame, b: &Frame, window: WindowSize, overlap: usize) -> Result<Self> {
        let (ha, wa) = a.data.dim();
        let (hb, wb) = b.data.dim();
        if (ha, wa) != (hb, wb) {
            return Err(PivError::DimensionMismatch {
                width_a: wa,
                height_a: ha,
                width_b: wb,
                height_b: hb,
            });
        }

        let edge = window.edge();
        if edge > wa || edge > ha {
            return Err(PivError::InvalidWindowSize {
                window: edge,
                width: wa,
                height: ha,
            });
        }
        if overlap >= edge {
            return Err(PivError::InvalidOverlap {
                overlap,
                window: edge,
            });
        }

        let stride = edge - overlap;
        Ok(Self {
            rows: (ha - edge) / stride + 1,
            cols: (wa - edge) / stride + 1,
            window,
            stride,
        })
    }

    /// Total number of tiles.
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tile at raster index `i`.
    pub fn tile(&self, i: usize) -> Tile {
        let row = i / self.cols;
        let col = i % self.cols;
        Tile {
            row,
            col,
            x: col * self.stride,
            y: row * self.stride,
        }
    }

    /// All tiles in raster order.
    pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        (0..self.len()).map(|i| self.tile(i))
    }

    /// Copy the window for `tile` out of `frame` as an owned patch.
    pub fn patch(&self, frame: &Frame, tile: &Tile) -> Array2<f32> {
        let edge = self.window.edge();
        frame
            .data
            .slice(s![tile.y..tile.y + edge, tile.x..tile.x + edge])
            .to_owned()
    }
}
