//! Cancellable paced frame loop on a dedicated thread

use crate::clock::FrameClock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use stipple_core::{Result, StippleError};

/// What the loop body wants to happen next
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopFlow {
    Continue,
    Stop,
}

pub struct RenderLoop;

impl RenderLoop {
    /// Run `body` once per paced frame on a named thread until it returns
    /// [`LoopFlow::Stop`] or the handle cancels it.
    pub fn spawn<F>(name: &str, target_fps: f64, mut body: F) -> Result<LoopHandle>
    where
        F: FnMut(&FrameClock) -> LoopFlow + Send + 'static,
    {
        if target_fps <= 0.0 {
            return Err(StippleError::LoopError(format!(
                "target fps must be positive, got {}",
                target_fps
            )));
        }

        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        let join = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut clock = FrameClock::new(target_fps);
                while !thread_stop.load(Ordering::Relaxed) {
                    clock.tick();
                    if body(&clock) == LoopFlow::Stop {
                        break;
                    }
                    clock.pace();
                }
            })
            .map_err(|e| StippleError::LoopError(e.to_string()))?;

        Ok(LoopHandle {
            stop,
            join: Some(join),
        })
    }
}

/// Owning handle to a running render loop.
///
/// Dropping the handle stops the loop and joins the thread, so a loop can
/// never outlive the scope that spawned it.
pub struct LoopHandle {
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl LoopHandle {
    /// Signal the loop to stop and wait for the thread to finish
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }

    /// True once the loop thread has exited
    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, |j| j.is_finished())
    }
}

impl Drop for LoopHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
