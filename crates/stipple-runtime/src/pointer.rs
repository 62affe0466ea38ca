//! Shared pointer position, written by the windowing side and read per frame

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use stipple_core::Vec2;

/// Where the pointer parks when it leaves the surface: far enough out that
/// no repulsion radius can reach it.
pub const PARKED: Vec2 = Vec2::new(-9999.0, -9999.0);

/// Lock-free latest-value pointer position.
///
/// Clones share the same cell. Writers are fire-and-forget; the simulation
/// samples whatever the latest value is at the top of each frame.
#[derive(Clone)]
pub struct PointerState {
    inner: Arc<Cell>,
}

struct Cell {
    x: AtomicU32,
    y: AtomicU32,
}

impl Default for PointerState {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Cell {
                x: AtomicU32::new(PARKED.x.to_bits()),
                y: AtomicU32::new(PARKED.y.to_bits()),
            }),
        }
    }

    pub fn set(&self, x: f32, y: f32) {
        self.inner.x.store(x.to_bits(), Ordering::Relaxed);
        self.inner.y.store(y.to_bits(), Ordering::Relaxed);
    }

    /// Move the pointer out of reach (cursor left the surface)
    pub fn park(&self) {
        self.set(PARKED.x, PARKED.y);
    }

    pub fn get(&self) -> Vec2 {
        Vec2::new(
            f32::from_bits(self.inner.x.load(Ordering::Relaxed)),
            f32::from_bits(self.inner.y.load(Ordering::Relaxed)),
        )
    }
}
