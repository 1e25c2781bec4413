//! Frame timing for the simulation loop.
//!
//! Turns wall-clock frame intervals into integrator time steps. Steps are
//! clamped to [`DT_MAX`] so a slow or stalled frame never lets a particle
//! tunnel through the chamber walls in one jump.
//!
//! # Example
//!
//! ```ignore
//! use cloudchamber::time::FrameClock;
//!
//! let mut clock = FrameClock::new();
//!
//! // In your frame callback:
//! let dt = clock.tick();
//! if !clock.is_paused() {
//!     sim.step(dt);
//! }
//! ```

use std::time::{Duration, Instant};

use crate::integrator::{clamp_dt, DT_MAX};

/// Frame clock producing clamped time steps.
#[derive(Debug)]
pub struct FrameClock {
    /// When the last frame occurred.
    last_frame: Instant,
    /// Simulated seconds since start (sum of clamped steps).
    simulated_secs: f32,
    /// Last step handed out.
    delta_secs: f32,
    /// Total frames ticked while running.
    frame_count: u64,
    /// Calculated FPS (updated periodically).
    fps: f32,
    /// Frame count at last FPS update.
    fps_frame_count: u64,
    /// Time of last FPS calculation.
    fps_update_time: Instant,
    /// How often to update FPS calculation.
    fps_update_interval: Duration,
    /// Whether time is paused.
    paused: bool,
    /// Fixed step for deterministic runs (optional).
    fixed_delta: Option<f32>,
}

impl FrameClock {
    /// Create a new clock starting from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            simulated_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            paused: false,
            fixed_delta: None,
        }
    }

    /// Clock that always hands out the same step, e.g. for offline rendering.
    pub fn fixed(delta: f32) -> Self {
        let mut clock = Self::new();
        clock.set_fixed_delta(Some(delta));
        clock
    }

    /// Advance one frame. Call once per frame.
    ///
    /// Returns the clamped step, or 0 while paused.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let raw_delta = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        if self.paused {
            self.delta_secs = 0.0;
            return 0.0;
        }

        self.delta_secs = clamp_dt(self.fixed_delta.unwrap_or(raw_delta));
        self.simulated_secs += self.delta_secs;
        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        self.delta_secs
    }

    /// Simulated seconds so far.
    #[inline]
    pub fn simulated(&self) -> f32 {
        self.simulated_secs
    }

    /// Step handed out by the last `tick`.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Stop handing out time. `tick` returns 0 until resumed.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume after pausing. The paused interval is not replayed.
    pub fn resume(&mut self) {
        if self.paused {
            self.last_frame = Instant::now();
            self.paused = false;
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Set a fixed step for deterministic updates, or `None` for wall time.
    ///
    /// Fixed steps are clamped like measured ones.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }

    /// Largest step this clock will ever return.
    #[inline]
    pub fn max_delta(&self) -> f32 {
        DT_MAX
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
