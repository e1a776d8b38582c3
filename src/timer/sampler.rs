//! Re-sampling loop for a shared [`BrewTimer`].
//!
//! Each call to [`TimerSampler::next_sample`] arms one wake-up; the caller
//! re-arms after handling the result, so samples never overlap. Stopping or
//! resetting through the sampler wakes a pending wait and the run epoch makes
//! sure a wake-up from an older run never samples a stopped timer.
//!
//! The armed deadline outlives the future: a caller that drops a pending
//! `next_sample` (to handle something else) gets the same deadline back on
//! the next call instead of a fresh interval.

use super::{BrewTimer, TimerSample, TimerSnapshot};
use embassy_futures::select::{select, Either};
use embassy_sync::{
    blocking_mutex::{self, raw::CriticalSectionRawMutex},
    mutex::Mutex,
    signal::Signal,
};
use embassy_time::{Duration, Instant, Timer};
use log::debug;
use std::cell::Cell;
use std::sync::Arc;

pub type SharedTimer = Arc<Mutex<CriticalSectionRawMutex, BrewTimer>>;

pub struct TimerSampler {
    timer: SharedTimer,
    interval: Duration,
    started: Signal<CriticalSectionRawMutex, ()>,
    cancelled: Signal<CriticalSectionRawMutex, ()>,
    // (run epoch, wake-up instant) of the sample currently armed
    deadline: blocking_mutex::Mutex<CriticalSectionRawMutex, Cell<Option<(u32, Instant)>>>,
}

impl TimerSampler {
    pub fn new(timer: BrewTimer, interval: Duration) -> Self {
        Self::with_shared(Arc::new(Mutex::new(timer)), interval)
    }

    pub fn with_shared(timer: SharedTimer, interval: Duration) -> Self {
        Self {
            timer,
            interval,
            started: Signal::new(),
            cancelled: Signal::new(),
            deadline: blocking_mutex::Mutex::new(Cell::new(None)),
        }
    }

    pub fn timer_handle(&self) -> SharedTimer {
        Arc::clone(&self.timer)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn start(&self) {
        self.timer.lock().await.start();
        self.cancelled.reset();
        self.started.signal(());
    }

    pub async fn stop(&self) -> u32 {
        let elapsed = self.timer.lock().await.stop();
        self.cancelled.signal(());
        elapsed
    }

    pub async fn reset(&self) {
        self.timer.lock().await.reset();
        self.cancelled.signal(());
    }

    pub async fn toggle(&self) {
        let running = self.timer.lock().await.is_running();
        if running {
            self.stop().await;
        } else {
            self.start().await;
        }
    }

    pub async fn set_target(&self, target_seconds: Option<u32>) {
        self.timer.lock().await.set_target(target_seconds);
    }

    pub async fn elapsed_seconds(&self) -> u32 {
        self.timer.lock().await.elapsed_seconds()
    }

    pub async fn is_running(&self) -> bool {
        self.timer.lock().await.is_running()
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        self.timer.lock().await.snapshot()
    }

    // Deadline for `epoch`, arming a new one when none is pending for that run
    fn deadline_for(&self, epoch: u32) -> Instant {
        self.deadline.lock(|slot| match slot.get() {
            Some((armed, at)) if armed == epoch => at,
            _ => {
                let at = Instant::now() + self.interval;
                slot.set(Some((epoch, at)));
                at
            }
        })
    }

    /// Wait one interval and sample.
    ///
    /// While the timer is idle this waits for the next `start`; a stop or reset
    /// during the wait returns `None` without sampling.
    pub async fn next_sample(&self) -> Option<TimerSample> {
        let epoch = {
            let timer = self.timer.lock().await;
            if timer.is_running() {
                Some(timer.epoch())
            } else {
                None
            }
        };

        let Some(epoch) = epoch else {
            self.started.wait().await;
            return None;
        };

        let deadline = self.deadline_for(epoch);
        if let Either::Second(()) = select(Timer::at(deadline), self.cancelled.wait()).await {
            debug!("Pending timer sample cancelled");
            return None;
        }
        self.deadline.lock(|slot| slot.set(None));

        let mut timer = self.timer.lock().await;
        if timer.epoch() != epoch {
            return None;
        }
        timer.sample()
    }
}
