//! Stipple Render - CPU rasterization for the particle engine
//!
//! A plain RGBA8 canvas with the handful of operations the engine needs:
//! clearing, alpha-blended circle fills for the dots, scaled bitmap blits for
//! the fallback path, and PNG export for headless rendering. Presentation
//! (packing into a window framebuffer) is the caller's concern.

mod canvas;

pub use canvas::{Canvas, RenderError};
