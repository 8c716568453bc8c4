use serde::{Deserialize, Serialize};

use crate::color::ColorMapConfig;
use crate::consts::DEFAULT_MASK_LEVEL;
use crate::grid::{Rect, WindowSize};

/// Parameters for one PIV analysis.
///
/// The whole value is validated atomically at configure time; there is no
/// partially-configured engine state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PivConfig {
    /// Interrogation window size.
    #[serde(default)]
    pub window: WindowSize,
    /// Pixels shared between adjacent windows. Must be smaller than the
    /// window edge; zero gives edge-to-edge tiling.
    #[serde(default)]
    pub overlap: usize,
    /// Refine peak locations to sub-pixel precision.
    #[serde(default = "default_interpolate")]
    pub interpolate: bool,
    /// Zero out vectors whose confidence falls below a fraction of the
    /// field maximum.
    #[serde(default)]
    pub mask: Option<MaskConfig>,
    /// Restrict the analysis to windows centered inside this region.
    /// Windows outside yield a zero vector with zero confidence.
    #[serde(default)]
    pub roi: Option<Rect>,
    /// Rendering policy for the color-coded output.
    #[serde(default)]
    pub color: ColorMapConfig,
}

fn default_interpolate() -> bool {
    true
}

impl Default for PivConfig {
    fn default() -> Self {
        Self {
            window: WindowSize::default(),
            overlap: 0,
            interpolate: true,
            mask: None,
            roi: None,
            color: ColorMapConfig::default(),
        }
    }
}

/// Peak-height masking of the assembled field.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MaskConfig {
    /// Fraction of the maximum peak height below which vectors are zeroed.
    pub level: f32,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_MASK_LEVEL,
        }
    }
}
