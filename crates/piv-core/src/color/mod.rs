use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::consts::COLOR_WHEEL_SIZE;
use crate::field::VelocityField;

/// Rendering policy for [`render_flow`].
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct ColorMapConfig {
    /// Vector magnitude rendered at full brightness. `None` normalizes
    /// against the field's own maximum magnitude.
    #[serde(default)]
    pub max_magnitude: Option<f32>,
    /// Multiply brightness by the tile's correlation peak height.
    #[serde(default)]
    pub weight_by_confidence: bool,
}

/// Render a velocity field as an RGB image, one pixel per tile.
///
/// Hue encodes flow direction (atan2 of the vector, 0 degrees pointing
/// right, growing toward down); brightness encodes magnitude against the
/// normalization scale. Zero-magnitude tiles render black. Scaling every
/// vector by a positive constant changes brightness only, never hue.
pub fn render_flow(field: &VelocityField, config: &ColorMapConfig) -> RgbImage {
    let scale = match config.max_magnitude {
        Some(m) if m > 0.0 => m,
        _ => field.max_magnitude().max(f32::MIN_POSITIVE),
    };

    let mut img = RgbImage::new(field.cols() as u32, field.rows() as u32);
    for (x, y, px) in img.enumerate_pixels_mut() {
        let idx = [y as usize, x as usize];
        let u = field.u[idx] as f64;
        let v = field.v[idx] as f64;

        let magnitude = (u * u + v * v).sqrt();
        let mut value = (magnitude / scale as f64).clamp(0.0, 1.0);
        if config.weight_by_confidence {
            value *= field.peak[idx].clamp(0.0, 1.0) as f64;
        }

        *px = direction_color(u, v, value);
    }
    img
}

/// Render the reference color wheel legend.
///
/// Each pixel encodes the direction from the raster center to that pixel
/// through the same hue mapping as [`render_flow`], so the legend and a
/// rendered field are visually comparable. Brightness grows with the
/// distance from the center, full at the circle inscribed in the raster;
/// pixels outside the inscribed circle are left black.
pub fn color_wheel(width: u32, height: u32) -> RgbImage {
    let cx = width as f64 / 2.0;
    let cy = height as f64 / 2.0;
    let radius = width.min(height) as f64 / 2.0;

    let mut img = RgbImage::new(width, height);
    for (x, y, px) in img.enumerate_pixels_mut() {
        let dx = x as f64 - cx;
        let dy = y as f64 - cy;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist > radius {
            continue;
        }
        *px = direction_color(dx, dy, dist / radius);
    }
    img
}

/// Reference wheel at the default legend size.
pub fn default_color_wheel() -> RgbImage {
    color_wheel(COLOR_WHEEL_SIZE, COLOR_WHEEL_SIZE)
}

/// Hue angle for a flow direction, degrees in [0, 360).
fn direction_hue(u: f64, v: f64) -> f64 {
    let mut deg = v.atan2(u).to_degrees();
    if deg < 0.0 {
        deg += 360.0;
    }
    if deg >= 360.0 {
        deg = 0.0;
    }
    deg
}

fn direction_color(u: f64, v: f64, value: f64) -> Rgb<u8> {
    if value <= 0.0 || (u == 0.0 && v == 0.0) {
        return Rgb([0, 0, 0]);
    }
    hsv_to_rgb(direction_hue(u, v), 1.0, value.clamp(0.0, 1.0))
}

/// Convert HSV (hue in degrees [0, 360), saturation and value in [0, 1])
/// to 8-bit RGB.
fn hsv_to_rgb(hue: f64, saturation: f64, value: f64) -> Rgb<u8> {
    let c = value * saturation;
    let hp = hue / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let m = value - c;
    Rgb([
        ((r1 + m) * 255.0).round() as u8,
        ((g1 + m) * 255.0).round() as u8,
        ((b1 + m) * 255.0).round() as u8,
    ])
}
