//! Stipple Core - Foundational types for the Stipple engine
//!
//! This crate provides the core types that all other Stipple crates depend on:
//! - `Vec2`, `Rect` - Screen-space types
//! - `Color` - RGBA color
//! - `SamplePoint` - One sampled image point, the particle target unit
//! - Error types and Result alias

mod error;
mod types;

pub use error::{Result, StippleError};
pub use types::{Color, Rect, SamplePoint, Vec2};
