//! Stipple Sampler - raster images to sparse point clouds
//!
//! Turns a bitmap into the normalized colored points a particle swarm
//! targets:
//! - File and http(s) sources, decoded with `image`
//! - Display-box scaling with the intrinsic aspect ratio preserved
//! - Gap-stride grid walk with an alpha cutoff
//! - Shared result cache keyed by (source, width bucket, gap)

pub mod bitmap;
pub mod cache;
pub mod sampler;
pub mod types;

pub use bitmap::load_bitmap;
pub use cache::{SampleCache, SampleKey};
pub use sampler::{SampleOutcome, Sampler};
pub use stipple_core::SamplePoint;
pub use types::{ColorBoost, SampleError, SampledImage};
