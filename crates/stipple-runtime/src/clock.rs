//! Frame clock with delta clamping and sleep-based pacing

use std::time::{Duration, Instant};

/// Tracks per-frame time and paces a loop toward a target frame rate
pub struct FrameClock {
    /// Total elapsed time in seconds
    pub total_time: f64,
    /// Time since last frame in seconds
    pub delta_time: f64,
    /// Frames ticked so far
    pub frame_count: u64,
    target_frame_time: f64,
    last_instant: Instant,
    first_tick: bool,
}

impl FrameClock {
    /// Create a clock pacing toward `target_fps` frames per second
    pub fn new(target_fps: f64) -> Self {
        Self {
            total_time: 0.0,
            delta_time: 0.0,
            frame_count: 0,
            target_frame_time: 1.0 / target_fps.max(1.0),
            last_instant: Instant::now(),
            first_tick: true,
        }
    }

    pub fn target_frame_time(&self) -> f64 {
        self.target_frame_time
    }

    /// Advance the clock. Call once at the top of each frame.
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.frame_count += 1;

        if self.first_tick {
            self.first_tick = false;
            self.last_instant = now;
            self.delta_time = 0.0;
            return;
        }

        let elapsed = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;

        // Clamp long stalls (breakpoints, suspended machines) to 250ms
        self.delta_time = elapsed.min(0.25);
        self.total_time += self.delta_time;
    }

    /// Sleep away whatever remains of the current frame budget
    pub fn pace(&self) {
        let spent = Instant::now().duration_since(self.last_instant).as_secs_f64();
        let remaining = self.target_frame_time - spent;
        if remaining > 0.0 {
            std::thread::sleep(Duration::from_secs_f64(remaining));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_defaults() {
        let clock = FrameClock::new(60.0);
        assert!((clock.target_frame_time() - 1.0 / 60.0).abs() < 1e-10);
        assert_eq!(clock.total_time, 0.0);
        assert_eq!(clock.frame_count, 0);
    }

    #[test]
    fn test_first_tick_zero_delta() {
        let mut clock = FrameClock::new(60.0);
        clock.tick();
        assert_eq!(clock.delta_time, 0.0);
        assert_eq!(clock.frame_count, 1);
    }

    #[test]
    fn test_delta_is_clamped_and_accumulates() {
        let mut clock = FrameClock::new(60.0);
        clock.tick();
        std::thread::sleep(Duration::from_millis(5));
        clock.tick();
        assert!(clock.delta_time > 0.0);
        assert!(clock.delta_time <= 0.25);
        assert!((clock.total_time - clock.delta_time).abs() < 1e-12);
    }

    #[test]
    fn test_nonpositive_fps_is_floored() {
        let clock = FrameClock::new(0.0);
        assert!((clock.target_frame_time() - 1.0).abs() < 1e-10);
    }
}
