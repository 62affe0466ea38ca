//! Stipple Runtime - frame scheduling and shared input state
//!
//! The pieces that keep a swarm animating:
//! - `FrameClock` - per-frame timing with delta clamping and sleep pacing
//! - `PointerState` - lock-free latest-value pointer cell
//! - `RenderLoop` / `LoopHandle` - a paced loop thread that stops on drop

mod clock;
mod pointer;
mod render_loop;

pub use clock::FrameClock;
pub use pointer::{PointerState, PARKED};
pub use render_loop::{LoopFlow, LoopHandle, RenderLoop};
