//! Tick clock for driving a simulation.
//!
//! Converts frame time into the `dt` handed to
//! [`SimulationSystem::advance_tick`](crate::SimulationSystem::advance_tick).
//! Supports a fixed step for deterministic runs, a time scale, and pausing.
//!
//! # Example
//!
//! ```ignore
//! use steerfield::clock::TickClock;
//!
//! let mut clock = TickClock::new();
//! clock.set_fixed_delta(Some(1.0 / 60.0));
//!
//! // In your game loop:
//! let dt = clock.update();
//! system.advance_tick(dt);
//!
//! println!("Tick {} at {:.2}s", clock.tick(), clock.elapsed());
//! ```

use std::time::{Duration, Instant};

/// Frame timing for a simulation loop.
#[derive(Debug)]
pub struct TickClock {
    /// When the last update happened.
    last_update: Instant,
    /// Simulated seconds so far (scaled, pauses excluded).
    elapsed_secs: f32,
    /// Seconds handed out by the last update.
    delta_secs: f32,
    /// Updates that advanced time.
    tick_count: u64,
    paused: bool,
    /// Fixed step replacing the measured frame time.
    fixed_delta: Option<f32>,
    /// Time scale multiplier (1.0 = normal speed).
    time_scale: f32,
    /// Upper bound on a single measured step.
    max_delta: f32,
}

impl TickClock {
    /// Create a clock starting from now.
    pub fn new() -> Self {
        Self {
            last_update: Instant::now(),
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            tick_count: 0,
            paused: false,
            fixed_delta: None,
            time_scale: 1.0,
            max_delta: 0.25,
        }
    }

    /// Measure the frame and return the `dt` for this tick.
    ///
    /// Returns 0 while paused. Measured steps are capped at
    /// [`max_delta`](Self::set_max_delta) so a stall does not launch agents
    /// across the plane.
    pub fn update(&mut self) -> f32 {
        let now = Instant::now();
        let raw = now.duration_since(self.last_update).as_secs_f32();
        self.last_update = now;

        if self.paused {
            self.delta_secs = 0.0;
            return 0.0;
        }

        let step = self.fixed_delta.unwrap_or_else(|| raw.min(self.max_delta));
        self.delta_secs = step * self.time_scale;
        self.elapsed_secs += self.delta_secs;
        self.tick_count += 1;
        self.delta_secs
    }

    /// Simulated seconds since start.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// `dt` from the last update.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Get delta time as a Duration.
    #[inline]
    pub fn delta_duration(&self) -> Duration {
        Duration::from_secs_f32(self.delta_secs)
    }

    /// Ticks that advanced time.
    #[inline]
    pub fn tick(&self) -> u64 {
        self.tick_count
    }

    /// Whether updates currently return zero.
    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Current time scale multiplier.
    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Stop advancing time.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume advancing time without counting the paused interval.
    pub fn resume(&mut self) {
        if self.paused {
            self.last_update = Instant::now();
            self.paused = false;
        }
    }

    /// Toggle pause state.
    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Use a fixed step instead of measured frame time. `None` measures.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta.map(|d| d.max(0.0));
    }

    /// Set time scale multiplier.
    ///
    /// - `1.0` = normal speed
    /// - `0.5` = half speed (slow motion)
    /// - `2.0` = double speed
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    /// Cap on a single measured step, in seconds.
    pub fn set_max_delta(&mut self, max_delta: f32) {
        self.max_delta = max_delta.max(0.0);
    }

    /// Back to zero elapsed time and ticks.
    pub fn reset(&mut self) {
        self.last_update = Instant::now();
        self.elapsed_secs = 0.0;
        self.delta_secs = 0.0;
        self.tick_count = 0;
        self.paused = false;
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_clock_new() {
        let clock = TickClock::new();
        assert_eq!(clock.tick(), 0);
        assert!(!clock.is_paused());
        assert_eq!(clock.time_scale(), 1.0);
    }

    #[test]
    fn test_clock_update() {
        let mut clock = TickClock::new();
        thread::sleep(Duration::from_millis(10));
        let dt = clock.update();

        assert!(dt > 0.0);
        assert_eq!(clock.elapsed(), dt);
        assert_eq!(clock.tick(), 1);
    }

    #[test]
    fn test_clock_pause() {
        let mut clock = TickClock::new();
        clock.set_fixed_delta(Some(0.1));
        clock.update();

        clock.pause();
        let elapsed_before = clock.elapsed();
        assert_eq!(clock.update(), 0.0);
        assert_eq!(clock.elapsed(), elapsed_before);
        assert_eq!(clock.tick(), 1);

        clock.toggle_pause();
        assert!(!clock.is_paused());
    }

    #[test]
    fn test_fixed_delta_and_scale() {
        let mut clock = TickClock::new();
        clock.set_fixed_delta(Some(1.0 / 60.0));
        clock.set_time_scale(2.0);

        thread::sleep(Duration::from_millis(20));
        let dt = clock.update();
        assert!((dt - 2.0 / 60.0).abs() < 1e-6);

        // Negative scale should clamp to 0
        clock.set_time_scale(-1.0);
        assert_eq!(clock.time_scale(), 0.0);
    }

    #[test]
    fn test_measured_step_is_capped() {
        let mut clock = TickClock::new();
        clock.set_max_delta(0.001);
        thread::sleep(Duration::from_millis(10));
        assert!(clock.update() <= 0.001);

        clock.reset();
        assert_eq!(clock.tick(), 0);
        assert_eq!(clock.elapsed(), 0.0);
    }
}
