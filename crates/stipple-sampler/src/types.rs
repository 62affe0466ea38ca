//! Point cloud types produced by sampling

use serde::{Deserialize, Serialize};
use stipple_core::SamplePoint;
use thiserror::Error;

/// Why sampling produced no usable point cloud
#[derive(Clone, Debug, PartialEq, Error, Serialize, Deserialize)]
pub enum SampleError {
    #[error("image load failed: {0}")]
    Load(String),
    #[error("image draw failed: {0}")]
    Draw(String),
}

/// The result of sampling one image at one display width and gap
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SampledImage {
    /// Sampling grid width in pixels (display-derived, not intrinsic)
    pub width: u32,
    pub height: u32,
    /// Points in raster order (row-major, stride = gap)
    pub points: Vec<SamplePoint>,
    /// Present when loading or drawing failed; such a result carries no points
    pub error: Option<SampleError>,
}

impl SampledImage {
    /// Placeholder result for a failed load or draw
    pub fn failed(error: SampleError) -> Self {
        Self {
            width: 100,
            height: 100,
            points: Vec::new(),
            error: Some(error),
        }
    }

    /// True when the caller should show the source image instead of particles
    pub fn needs_fallback(&self) -> bool {
        self.error.is_some() || self.points.is_empty()
    }
}

/// Per-channel brightness/gamma lift applied at sample time
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorBoost {
    pub mult: f32,
    pub gamma: f32,
}

impl ColorBoost {
    pub const fn new(mult: f32, gamma: f32) -> Self {
        Self { mult, gamma }
    }

    pub fn is_identity(&self) -> bool {
        self.mult == 1.0 && self.gamma == 1.0
    }

    pub fn apply(&self, c: u8) -> u8 {
        let lifted = (c as f32 / 255.0).powf(1.0 / self.gamma) * 255.0 * self.mult;
        lifted.min(255.0) as u8
    }
}
