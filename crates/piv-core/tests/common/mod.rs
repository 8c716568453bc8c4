use ndarray::Array2;

use piv_core::frame::Frame;

/// Linear congruential step; returns a uniform sample in [0, 1).
fn lcg(state: &mut u64) -> f64 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    (*state >> 11) as f64 / (1u64 << 53) as f64
}

/// Render a field of Gaussian particles, shifted by (dx, dy) px.
///
/// The same seed places the same particles, so two calls differing only in
/// the offset produce an exactly shifted image pair with no resampling
/// error. Seeding density is one particle per 16 px, enough that every
/// interrogation window down to 16x16 contains trackable texture.
pub fn particle_frame(width: usize, height: usize, seed: u64, dx: f64, dy: f64) -> Frame {
    const SIGMA: f64 = 1.5;
    const SUPPORT: i64 = 5;

    let count = (width * height) / 16;
    let mut state = seed.wrapping_add(0x9e3779b97f4a7c15);

    let mut data = Array2::<f32>::zeros((height, width));
    for _ in 0..count {
        let cx = lcg(&mut state) * width as f64 + dx;
        let cy = lcg(&mut state) * height as f64 + dy;

        let x0 = (cx as i64 - SUPPORT).max(0);
        let x1 = (cx as i64 + SUPPORT).min(width as i64 - 1);
        let y0 = (cy as i64 - SUPPORT).max(0);
        let y1 = (cy as i64 + SUPPORT).min(height as i64 - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let d2 = (x as f64 - cx).powi(2) + (y as f64 - cy).powi(2);
                data[[y as usize, x as usize]] += (-d2 / (2.0 * SIGMA * SIGMA)).exp() as f32;
            }
        }
    }

    data.mapv_inplace(|v| v.min(1.0));
    Frame::new(data)
}

/// A frame of constant intensity.
pub fn uniform_frame(width: usize, height: usize, value: f32) -> Frame {
    Frame::new(Array2::from_elem((height, width), value))
}
