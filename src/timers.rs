//! Timer multiplexer.
//!
//! Cooperative periodic callbacks driven by the acquisition tick.  The
//! loop calls [`TimerMultiplexer::run_timers`] once per base tick with
//! the current civil time; every timer whose due time has passed fires
//! once and is rescheduled from its previous due time.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  AcquisitionLoop.tick()                      │
//! │                          │                                   │
//! │                          ▼                                   │
//! │             TimerMultiplexer.run_timers(now_ms)              │
//! │                          │                                   │
//! │        ┌─────────────────┼──────────────────┐                │
//! │        ▼                 ▼                  ▼                │
//! │  ┌───────────┐    ┌─────────────┐    ┌────────────┐          │
//! │  │  display  │    │ data comm   │    │   (free)   │          │
//! │  │  1 Hz     │    │ 1000/freq   │    │            │          │
//! │  └─────┬─────┘    └──────┬──────┘    └────────────┘          │
//! │        │                 │                                   │
//! │        └────────┬────────┘                                   │
//! │                 ▼                                            │
//! │        fn(&mut CoreState) -> TimerControl                    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callbacks are plain function pointers over a context type, so a timer
//! never holds a reference back into the loop that owns it.  A callback
//! retunes its own cadence by returning [`TimerControl::SetPeriod`].

use heapless::Vec;
use log::{info, warn};

use crate::error::{Error, Result, TimerError};

/// Maximum number of concurrent timers (stack-allocated).
pub const MAX_TIMERS: usize = 8;

/// What a callback asks of its own timer after firing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimerControl {
    /// Keep the current period.
    Keep,
    /// Switch to a new period (ms) before rescheduling.
    SetPeriod(f64),
}

/// Callback signature.  `C` is the state the owning loop lends to timers.
pub type TimerFn<C> = fn(&mut C) -> TimerControl;

/// Opaque reference to a registered timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u8);

struct Timer<C> {
    label: &'static str,
    period_ms: f64,
    due_at: f64,
    callback: TimerFn<C>,
}

pub struct TimerMultiplexer<C> {
    timers: Vec<Timer<C>, MAX_TIMERS>,
}

impl<C> Default for TimerMultiplexer<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> TimerMultiplexer<C> {
    pub fn new() -> Self {
        Self { timers: Vec::new() }
    }

    /// Register a timer that first fires one period after `now_ms`.
    pub fn add_timer(
        &mut self,
        label: &'static str,
        period_ms: f64,
        now_ms: f64,
        callback: TimerFn<C>,
    ) -> Result<TimerHandle> {
        let period_ms = checked_period(period_ms)?;
        let index = self.timers.len();
        self.timers
            .push(Timer {
                label,
                period_ms,
                due_at: now_ms + period_ms,
                callback,
            })
            .map_err(|_| TimerError::Full)?;
        info!("Timers: added '{}' every {:.1} ms", label, period_ms);
        Ok(TimerHandle(index as u8))
    }

    /// Fire every timer that is due, each at most once.
    ///
    /// The next due time advances by one period from the old due time,
    /// not from `now_ms`.  After a stall of several periods a timer is
    /// therefore still due on each of the following calls until it has
    /// caught up, one firing per call.
    ///
    /// Returns the number of callbacks run.
    pub fn run_timers(&mut self, now_ms: f64, ctx: &mut C) -> usize {
        let mut fired = 0;
        for timer in self.timers.iter_mut() {
            if now_ms < timer.due_at {
                continue;
            }
            fired += 1;
            if let TimerControl::SetPeriod(ms) = (timer.callback)(ctx) {
                match checked_period(ms) {
                    Ok(ms) => timer.period_ms = ms,
                    Err(e) => warn!("Timers: '{}' kept its period: {}", timer.label, e),
                }
            }
            timer.due_at += timer.period_ms;
        }
        fired
    }

    /// Change a live timer's period.  The next due time is left alone,
    /// so the timer's phase is kept.
    pub fn set_period(&mut self, handle: TimerHandle, period_ms: f64) -> Result<()> {
        let period_ms = checked_period(period_ms)?;
        let timer = self
            .timers
            .get_mut(usize::from(handle.0))
            .ok_or(TimerError::UnknownHandle)?;
        if timer.period_ms != period_ms {
            info!(
                "Timers: '{}' period {:.1} -> {:.1} ms",
                timer.label, timer.period_ms, period_ms
            );
        }
        timer.period_ms = period_ms;
        Ok(())
    }

    pub fn period(&self, handle: TimerHandle) -> Option<f64> {
        self.timers.get(usize::from(handle.0)).map(|t| t.period_ms)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

/// Only strictly positive, finite periods may be scheduled.
pub fn checked_period(period_ms: f64) -> Result<f64> {
    if period_ms.is_finite() && period_ms > 0.0 {
        Ok(period_ms)
    } else {
        Err(Error::InvalidObservationParameter(
            "timer period must be positive",
        ))
    }
}
