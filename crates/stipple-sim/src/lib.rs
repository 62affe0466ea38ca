//! Stipple Sim - persistent particle swarm simulation
//!
//! Provides the morphing particle pool:
//! - Index-paired reconciliation between successive point clouds
//! - Spring-damper integration with per-particle friction and ease
//! - Pointer repulsion and opacity-based lifecycle
//! - Draw-list packing for whatever painter sits downstream

pub mod curves;
pub mod particle;
pub mod rand;
pub mod swarm;
pub mod tuning;

pub use particle::{DotInstance, Particle, DEAD_ALPHA};
pub use rand::SwarmRng;
pub use swarm::{FrameInput, Swarm, DRAW_ALPHA};
pub use tuning::Tuning;
