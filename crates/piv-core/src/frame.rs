use image::{GrayImage, ImageBuffer, Luma};
use ndarray::Array2;

/// A single grayscale image frame.
/// Pixel values are f32 in [0.0, 1.0], row-major, shape = (height, width).
///
/// Frames are never mutated by the analysis; every stage borrows them
/// read-only.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Pixel data, row-major, shape = (height, width)
    pub data: Array2<f32>,
}

impl Frame {
    pub fn new(data: Array2<f32>) -> Self {
        Self { data }
    }

    /// Convert an 8-bit grayscale image, scaling samples to [0.0, 1.0].
    pub fn from_luma8(img: &GrayImage) -> Self {
        let (w, h) = img.dimensions();
        let mut data = Array2::<f32>::zeros((h as usize, w as usize));
        for (x, y, px) in img.enumerate_pixels() {
            data[[y as usize, x as usize]] = px[0] as f32 / 255.0;
        }
        Self { data }
    }

    /// Convert a 16-bit grayscale image, scaling samples to [0.0, 1.0].
    pub fn from_luma16(img: &ImageBuffer<Luma<u16>, Vec<u16>>) -> Self {
        let (w, h) = img.dimensions();
        let mut data = Array2::<f32>::zeros((h as usize, w as usize));
        for (x, y, px) in img.enumerate_pixels() {
            data[[y as usize, x as usize]] = px[0] as f32 / 65535.0;
        }
        Self { data }
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }
}
