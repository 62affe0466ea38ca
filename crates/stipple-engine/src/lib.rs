//! Stipple Engine - sampling, simulation and painting tied together
//!
//! Owns one particle swarm and transitions it between images:
//! - Background sampling with generation-tagged deliveries (stale results
//!   are discarded on arrival, never applied)
//! - Reconciliation against whatever the pool holds when a sample lands
//! - Automatic fallback to a bitmap or placeholder when an image yields
//!   no particles
//! - Frame painting over `stipple-render`'s canvas

pub mod config;
pub mod engine;
pub mod events;
pub mod pipeline;

pub use config::EngineConfig;
pub use engine::{FallbackView, ImageRequest, TransitionEngine};
pub use events::EngineEvent;
pub use pipeline::{SampleRequest, SampleWorker};
