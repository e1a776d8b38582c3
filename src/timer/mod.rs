//! Brew stopwatch.
//!
//! Elapsed time is always recomputed from a captured monotonic start instant
//! rather than counted up per sample, so a late or throttled sample catches up
//! instead of drifting.

pub mod sampler;

pub use sampler::*;

use embassy_time::Instant;
use log::{debug, info};
use serde::{Deserialize, Serialize};

pub type TickCallback = Box<dyn FnMut(u32) + Send>;

/// Read-only view of the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub elapsed_seconds: u32,
    pub is_running: bool,
    pub target_seconds: Option<u32>,
}

/// Result of a single sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSample {
    pub elapsed_seconds: u32,
    /// Set on the one sample that first reached the target in this run
    pub target_reached: bool,
}

pub struct BrewTimer {
    start_instant: Option<Instant>,
    accumulated_seconds: u32,
    elapsed_seconds: u32,
    running: bool,
    target_seconds: Option<u32>,
    completed: bool,
    // Bumped on every start/stop/reset; a pending sample from an older run is discarded
    epoch: u32,
    on_tick: Option<TickCallback>,
    on_complete: Option<TickCallback>,
}

impl BrewTimer {
    pub fn new() -> Self {
        Self {
            start_instant: None,
            accumulated_seconds: 0,
            elapsed_seconds: 0,
            running: false,
            target_seconds: None,
            completed: false,
            epoch: 0,
            on_tick: None,
            on_complete: None,
        }
    }

    pub fn with_target(target_seconds: u32) -> Self {
        let mut timer = Self::new();
        timer.target_seconds = Some(target_seconds);
        timer
    }

    pub fn set_target(&mut self, target_seconds: Option<u32>) {
        self.target_seconds = target_seconds;
    }

    /// Called with the elapsed seconds on every sample
    pub fn on_tick<F>(&mut self, callback: F)
    where
        F: FnMut(u32) + Send + 'static,
    {
        self.on_tick = Some(Box::new(callback));
    }

    /// Called once per run, the first time elapsed reaches the target
    pub fn on_complete<F>(&mut self, callback: F)
    where
        F: FnMut(u32) + Send + 'static,
    {
        self.on_complete = Some(Box::new(callback));
    }

    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.start_instant = Some(Instant::now());
        self.completed = false;
        self.running = true;
        self.epoch = self.epoch.wrapping_add(1);
        info!("Timer started (resuming from {}s)", self.accumulated_seconds);
    }

    /// Recompute elapsed time from the clock. Returns `None` when not running.
    pub fn sample(&mut self) -> Option<TimerSample> {
        if !self.running {
            return None;
        }
        let start = self.start_instant?;
        let since_start = Instant::now().duration_since(start).as_secs();
        let elapsed = self
            .accumulated_seconds
            .saturating_add(u32::try_from(since_start).unwrap_or(u32::MAX));
        self.elapsed_seconds = elapsed;

        if let Some(callback) = self.on_tick.as_mut() {
            callback(elapsed);
        }

        let mut target_reached = false;
        if let Some(target) = self.target_seconds {
            if elapsed >= target && !self.completed {
                self.completed = true;
                target_reached = true;
                debug!("Timer target reached: {}s >= {}s", elapsed, target);
                if let Some(callback) = self.on_complete.as_mut() {
                    callback(elapsed);
                }
            }
        }

        Some(TimerSample {
            elapsed_seconds: elapsed,
            target_reached,
        })
    }

    /// Stop and freeze the elapsed time; a later `start` resumes from it
    pub fn stop(&mut self) -> u32 {
        if !self.running {
            return self.elapsed_seconds;
        }
        self.sample();
        self.accumulated_seconds = self.elapsed_seconds;
        self.start_instant = None;
        self.running = false;
        self.epoch = self.epoch.wrapping_add(1);
        info!("Timer stopped at {}s", self.elapsed_seconds);
        self.elapsed_seconds
    }

    pub fn reset(&mut self) {
        self.start_instant = None;
        self.accumulated_seconds = 0;
        self.elapsed_seconds = 0;
        self.completed = false;
        self.running = false;
        self.epoch = self.epoch.wrapping_add(1);
        debug!("Timer reset");
    }

    pub fn toggle(&mut self) {
        if self.running {
            self.stop();
        } else {
            self.start();
        }
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            elapsed_seconds: self.elapsed_seconds,
            is_running: self.running,
            target_seconds: self.target_seconds,
        }
    }

    /// Current elapsed time as "M:SS"
    pub fn formatted(&self) -> String {
        format_time(self.elapsed_seconds)
    }
}

impl Default for BrewTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BrewTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrewTimer")
            .field("elapsed_seconds", &self.elapsed_seconds)
            .field("accumulated_seconds", &self.accumulated_seconds)
            .field("running", &self.running)
            .field("target_seconds", &self.target_seconds)
            .field("completed", &self.completed)
            .field("epoch", &self.epoch)
            .finish()
    }
}

/// Format seconds as "M:SS"
pub fn format_time(seconds: u32) -> String {
    crate::calc::format_brew_time(Some(seconds))
}
