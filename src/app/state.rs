//! Mutable session state shared by the tick and the timer callbacks.
//!
//! Everything the acquisition loop changes between ticks lives in
//! [`CoreState`].  Timer callbacks receive it by `&mut`, so nothing is
//! global and nothing needs a lock: the tick thread is the only owner.

use heapless::Deque;
use log::{debug, warn};

use super::events::{Alert, Notice};
use crate::calibration::{CalibrationCurve, CalibrationSession};
use crate::clock::SiderealClock;
use crate::config::{ProtocolSettings, SiteConfig};
use crate::data::{ChannelSample, DataPoint, DeclinometerSample, History};
use crate::observation::Observation;

/// Alerts a single transition can queue.
pub const MAX_QUEUED_ALERTS: usize = 8;

/// Console lines kept for display.
pub const CONSOLE_TAIL: usize = 7;

// ───────────────────────────────────────────────────────────────
// Acknowledgement gate
// ───────────────────────────────────────────────────────────────

/// What to do once every queued alert has been acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    EnterCalibration,
    EnterBackground,
}

/// Protocol polling is suspended while alerts are open.  Sampling and the
/// display keep running.
#[derive(Debug)]
pub enum AckState {
    Running,
    WaitingForAck {
        alerts: Deque<Alert, MAX_QUEUED_ALERTS>,
        then: Deferred,
    },
}

impl AckState {
    pub fn is_waiting(&self) -> bool {
        matches!(self, Self::WaitingForAck { .. })
    }

    /// The alert the operator is looking at, if any.
    pub fn current(&self) -> Option<&Alert> {
        match self {
            Self::Running => None,
            Self::WaitingForAck { alerts, .. } => alerts.front(),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Console log
// ───────────────────────────────────────────────────────────────

/// Operator-facing message log, stamped with sidereal time.
#[derive(Debug, Default)]
pub struct ConsoleLog {
    entries: Vec<ConsoleEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ConsoleEntry {
    stamp: String,
    message: String,
}

impl ConsoleLog {
    /// Append unless it repeats the previous message.  Returns whether
    /// the entry was kept.
    pub fn push(&mut self, stamp: String, message: &str) -> bool {
        if self.entries.last().is_some_and(|e| e.message == message) {
            return false;
        }
        self.entries.push(ConsoleEntry {
            stamp,
            message: message.to_owned(),
        });
        true
    }

    /// The last [`CONSOLE_TAIL`] lines, oldest first.
    pub fn tail(&self) -> Vec<String> {
        let start = self.entries.len().saturating_sub(CONSOLE_TAIL);
        self.entries[start..]
            .iter()
            .map(|e| format!("{}  {}", e.stamp, e.message))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ───────────────────────────────────────────────────────────────
// Tick-rate meter
// ───────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct RateMeter {
    ticks: u32,
    since_secs: f64,
}

impl RateMeter {
    pub fn new(now_secs: f64) -> Self {
        Self {
            ticks: 0,
            since_secs: now_secs,
        }
    }

    pub fn count_tick(&mut self) {
        self.ticks += 1;
    }

    /// Ticks per second since the previous call, then restart.
    pub fn sample(&mut self, now_secs: f64) -> Option<f64> {
        let elapsed = now_secs - self.since_secs;
        let rate = (elapsed > 0.0).then(|| f64::from(self.ticks) / elapsed);
        self.ticks = 0;
        self.since_secs = now_secs;
        rate
    }
}

// ───────────────────────────────────────────────────────────────
// CoreState
// ───────────────────────────────────────────────────────────────

pub struct CoreState {
    pub clock: SiderealClock,
    pub history: History,
    pub curve: CalibrationCurve,
    pub observation: Option<Observation>,
    pub calibration: Option<CalibrationSession>,
    /// Last calibrated declination (degrees).
    pub current_dec: f64,
    /// Last raw declinometer reading, for calibration.
    pub last_raw_dec: Option<f64>,
    /// Beep at the next display refresh.
    pub beep_pending: bool,
    pub ack: AckState,
    pub console: ConsoleLog,
    pub rate: RateMeter,
    pub protocol: ProtocolSettings,
    pub site: SiteConfig,
    /// Fastest data rate the base tick can serve (Hz).
    pub max_freq: f64,
    /// Notices produced since the last flush.
    pub outbox: Vec<Notice>,
}

impl CoreState {
    pub fn new(
        clock: SiderealClock,
        curve: CalibrationCurve,
        protocol: ProtocolSettings,
        site: SiteConfig,
        max_freq: f64,
    ) -> Self {
        let rate = RateMeter::new(clock.civil_secs());
        Self {
            clock,
            history: History::new(),
            curve,
            observation: None,
            calibration: None,
            current_dec: 0.0,
            last_raw_dec: None,
            beep_pending: false,
            ack: AckState::Running,
            console: ConsoleLog::default(),
            rate,
            protocol,
            site,
            max_freq,
            outbox: Vec::new(),
        }
    }

    /// Fuse one pair of samples into a data point.  Readings that cannot
    /// produce a valid declination are dropped.
    pub fn record(&mut self, channels: ChannelSample, dec: DeclinometerSample, timestamp: f64) {
        if !(dec.raw.is_finite() && channels.a.is_finite() && channels.b.is_finite()) {
            debug!("Dropping non-finite sample");
            return;
        }
        let declination = match self.curve.apply(dec.raw) {
            Ok(d) => d,
            Err(e) => {
                warn!("Declination for raw {:.4} unavailable: {}", dec.raw, e);
                return;
            }
        };
        self.current_dec = declination;
        self.history.push(DataPoint {
            sidereal_timestamp: timestamp,
            declination,
            channel_a: channels.a,
            channel_b: channels.b,
        });
    }

    // ── operator output ──────────────────────────────────────

    /// Status message: logged to the console and announced with a beep.
    pub fn message(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.log_console(&text);
        self.outbox.push(Notice::Message {
            text,
            silent: false,
        });
    }

    /// Status line update with no beep and no console entry.
    pub fn silent_message(&mut self, text: impl Into<String>) {
        self.outbox.push(Notice::Message {
            text: text.into(),
            silent: true,
        });
    }

    fn log_console(&mut self, text: &str) {
        let stamp = self.clock.get_formatted_sidereal_time();
        self.console.push(stamp, text);
    }

    fn show_alert(&mut self, alert: Alert) {
        self.log_console(&alert.message);
        self.outbox.push(Notice::Alert(alert));
    }

    // ── acknowledgement gate ─────────────────────────────────

    /// Show `alerts` one at a time and run `then` after the last is
    /// acknowledged.  With no alerts `then` runs immediately.
    pub fn suspend(&mut self, alerts: impl IntoIterator<Item = Alert>, then: Deferred) {
        let mut queue: Deque<Alert, MAX_QUEUED_ALERTS> = Deque::new();
        for alert in alerts {
            if let Err(dropped) = queue.push_back(alert) {
                warn!("Alert queue full, dropping '{}'", dropped.message);
            }
        }
        let Some(first) = queue.front().cloned() else {
            self.resume(then);
            return;
        };
        self.ack = AckState::WaitingForAck {
            alerts: queue,
            then,
        };
        self.show_alert(first);
    }

    /// The operator dismissed the current alert.  Returns `false` when no
    /// alert was open.
    pub fn acknowledge(&mut self) -> bool {
        let next = match &mut self.ack {
            AckState::Running => {
                debug!("Acknowledge with no open alert");
                return false;
            }
            AckState::WaitingForAck { alerts, then } => {
                alerts.pop_front();
                alerts.front().cloned().ok_or(*then)
            }
        };
        match next {
            Ok(alert) => self.show_alert(alert),
            Err(then) => {
                self.ack = AckState::Running;
                self.resume(then);
            }
        }
        true
    }

    fn resume(&mut self, then: Deferred) {
        self.clock.reset_anchor_time();
        self.advance_observation();
        match then {
            Deferred::EnterCalibration => self.message("Taking calibration data!!!"),
            Deferred::EnterBackground => self.message("Taking background data!!!"),
        }
    }

    pub fn advance_observation(&mut self) {
        if let Some(obs) = self.observation.as_mut() {
            obs.next();
        }
    }
}
