//! Acquisition loop — the hexagonal core.
//!
//! [`AcquisitionLoop`] owns the [`CoreState`] and the timer multiplexer.
//! It exposes a hardware-agnostic API: the caller drives [`tick`] at the
//! base rate and forwards operator actions to [`handle_command`].  All I/O
//! flows through port traits injected at call sites.
//!
//! ```text
//!  SamplePort (DAQ) ──────▶ ┌─────────────────────────┐ ──▶ NoticeSink
//!  SamplePort (dec) ──────▶ │     AcquisitionLoop     │
//!                           │  clock · curve · timers │
//!  CalibrationStore ◀─────▶ │  observation protocol   │
//!                           └─────────────────────────┘
//! ```
//!
//! [`tick`]: AcquisitionLoop::tick
//! [`handle_command`]: AcquisitionLoop::handle_command

use log::{info, warn};

use crate::calibration::{CalibrationCurve, CalibrationSession, SessionState, StepOutcome};
use crate::clock::SiderealClock;
use crate::config::{CalibrationConfig, RigConfig};
use crate::data::{ChannelSample, DeclinometerSample, History};
use crate::error::{Error, Result};
use crate::observation::{Comm, Observation};
use crate::timers::{TimerControl, TimerHandle, TimerMultiplexer};

use super::commands::RigCommand;
use super::events::{Alert, DisplayUpdate, Notice};
use super::ports::{CalibrationStore, NoticeSink, SamplePort};
use super::state::{AckState, CoreState, Deferred};

// ───────────────────────────────────────────────────────────────
// AcquisitionLoop
// ───────────────────────────────────────────────────────────────

pub struct AcquisitionLoop {
    state: CoreState,
    timers: TimerMultiplexer<CoreState>,
    data_timer: TimerHandle,
    calibration_config: CalibrationConfig,
    tick_count: u64,
}

impl AcquisitionLoop {
    /// Build the loop and register the display and data-communication
    /// timers.
    pub fn new(config: &RigConfig, clock: SiderealClock, curve: CalibrationCurve) -> Result<Self> {
        config.validate()?;
        let now_ms = clock.civil_millis();
        let mut state = CoreState::new(
            clock,
            curve,
            config.protocol,
            config.site,
            config.max_data_rate_hz(),
        );

        let mut timers = TimerMultiplexer::new();
        timers.add_timer(
            "display",
            f64::from(config.gui_update_period_ms),
            now_ms,
            update_display,
        )?;
        let data_timer = timers.add_timer(
            "data",
            f64::from(config.data_period_ms),
            now_ms,
            update_data,
        )?;

        state.message("Ready!!!");
        Ok(Self {
            state,
            timers,
            data_timer,
            calibration_config: config.calibration.clone(),
            tick_count: 0,
        })
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// One pass: poll both readers, record a data point if both delivered,
    /// run due timers, flush notices.
    pub fn tick(
        &mut self,
        daq: &mut impl SamplePort<Sample = ChannelSample>,
        declinometer: &mut impl SamplePort<Sample = DeclinometerSample>,
        sink: &mut impl NoticeSink,
    ) {
        self.tick_count += 1;

        // 1. Poll readers; neither call blocks.
        let channels = daq.read_latest();
        let dec = declinometer.read_latest();
        let timestamp = self.state.clock.get_sidereal_seconds();

        // 2. Fuse into a data point when both are fresh.
        if let Some(d) = dec {
            self.state.last_raw_dec = Some(d.raw);
        }
        if let (Some(ch), Some(d)) = (channels, dec) {
            self.state.record(ch, d, timestamp);
        }
        self.state.rate.count_tick();

        // 3. Timers: display refresh and protocol polling.
        let now_ms = self.state.clock.civil_millis();
        self.timers.run_timers(now_ms, &mut self.state);

        self.flush(sink);
    }

    // ── Command handling ──────────────────────────────────────

    /// Apply an operator command.  Notices it produces are flushed before
    /// returning, including on error.
    pub fn handle_command(
        &mut self,
        cmd: RigCommand,
        store: &mut impl CalibrationStore,
        sink: &mut impl NoticeSink,
    ) -> Result<()> {
        let result = self.apply_command(cmd, store);
        self.flush(sink);
        result
    }

    fn apply_command(&mut self, cmd: RigCommand, store: &mut impl CalibrationStore) -> Result<()> {
        match cmd {
            RigCommand::StartObservation(request) => {
                if self.state.observation.is_some() {
                    return Err(Error::Busy("an observation is already running"));
                }
                if self.state.calibration.is_some() {
                    return Err(Error::Busy("a calibration is in progress"));
                }
                let now = self.state.clock.get_time();
                let obs = request.validate(now, self.state.max_freq, self.state.protocol)?;
                let kind = obs.kind().name();
                info!(
                    "{} requested: RA {:.0}..{:.0} at {} Hz",
                    kind,
                    obs.start_ra(),
                    obs.end_ra(),
                    obs.freq()
                );
                self.state.observation = Some(obs);
                self.state.outbox.push(Notice::ObservationStarted { kind });
            }
            RigCommand::AbortObservation => {
                let Some(obs) = self.state.observation.take() else {
                    return Ok(());
                };
                self.state.ack = AckState::Running;
                let kind = obs.kind().name();
                self.state.message(format!("{kind} aborted"));
                self.state.outbox.push(Notice::ObservationEnded {
                    kind,
                    aborted: true,
                });
            }
            RigCommand::StartCalibration(direction) => {
                if self.state.calibration.is_some() {
                    return Err(Error::Busy("a calibration is already in progress"));
                }
                if self.state.observation.is_some() {
                    return Err(Error::Busy("an observation is running"));
                }
                let mut session = CalibrationSession::new(&self.calibration_config);
                session.choose_direction(direction)?;
                let target = session.current_target();
                self.state.calibration = Some(session);
                self.state.outbox.push(Notice::CalibrationStep { target });
            }
            RigCommand::RecordCalibrationPoint => self.record_calibration_point(store)?,
            RigCommand::DiscardCalibration => {
                if self.state.calibration.take().is_some() {
                    info!("Calibration: discarded");
                }
            }
            RigCommand::Acknowledge => {
                self.state.acknowledge();
            }
            RigCommand::SetSiderealTime(seconds) => {
                if !seconds.is_finite() {
                    return Err(Error::InvalidObservationParameter(
                        "sidereal time must be finite",
                    ));
                }
                self.state.clock.set_sidereal_time(seconds);
            }
            RigCommand::ReloadCalibration => self.reload_curve(&*store)?,
        }
        Ok(())
    }

    fn record_calibration_point(&mut self, store: &mut impl CalibrationStore) -> Result<()> {
        let session = self
            .state
            .calibration
            .as_mut()
            .ok_or(Error::CalibrationSession("no calibration in progress"))?;

        // A complete session that failed to save is retried without a new sample.
        if session.state() != SessionState::Complete {
            let raw = self.state.last_raw_dec.ok_or(Error::NoSample)?;
            if let StepOutcome::Continue { next_target } = session.advance(raw)? {
                self.state.outbox.push(Notice::CalibrationStep {
                    target: next_target,
                });
                return Ok(());
            }
        }

        session.persist(store)?;
        self.state.calibration = None;
        self.reload_curve(&*store)?;
        self.state.outbox.push(Notice::CalibrationSaved);
        Ok(())
    }

    /// Replace the curve from `store`.  On failure the old curve stays.
    fn reload_curve(&mut self, store: &impl CalibrationStore) -> Result<()> {
        match CalibrationCurve::load(store, &self.calibration_config) {
            Ok(curve) => {
                self.state.curve = curve;
                Ok(())
            }
            Err(e) => {
                warn!("Calibration reload failed, keeping previous curve: {}", e);
                Err(e.into())
            }
        }
    }

    fn flush(&mut self, sink: &mut impl NoticeSink) {
        for notice in self.state.outbox.drain(..) {
            sink.emit(&notice);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn history(&self) -> &History {
        &self.state.history
    }

    pub fn observation(&self) -> Option<&Observation> {
        self.state.observation.as_ref()
    }

    pub fn calibration(&self) -> Option<&CalibrationSession> {
        self.state.calibration.as_ref()
    }

    pub fn curve(&self) -> &CalibrationCurve {
        &self.state.curve
    }

    pub fn clock(&self) -> &SiderealClock {
        &self.state.clock
    }

    pub fn current_dec(&self) -> f64 {
        self.state.current_dec
    }

    /// The alert awaiting acknowledgement, if any.
    pub fn open_alert(&self) -> Option<&Alert> {
        self.state.ack.current()
    }

    pub fn is_waiting_for_ack(&self) -> bool {
        self.state.ack.is_waiting()
    }

    /// Current data-communication period (ms).
    pub fn data_period_ms(&self) -> Option<f64> {
        self.timers.period(self.data_timer)
    }

    pub fn console(&self) -> Vec<String> {
        self.state.console.tail()
    }

    /// Total ticks executed since construction.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

// ───────────────────────────────────────────────────────────────
// Timer callbacks
// ───────────────────────────────────────────────────────────────

/// 1 Hz display refresh.
fn update_display(state: &mut CoreState) -> TimerControl {
    if state.beep_pending {
        state.beep_pending = false;
        state.outbox.push(Notice::Beep);
    }

    let (progress_percent, countdown, sweeps) = match state.observation.as_ref() {
        Some(obs) => {
            let t = state.clock.get_time();
            let span = obs.end_ra() - obs.start_ra();
            let progress = if t >= obs.start_ra() && t < obs.end_ra() {
                ((t - obs.start_ra()) / span * 100.0).clamp(0.0, 100.0) as u8
            } else {
                0
            };
            let countdown = format_countdown(state.clock.get_time_until(obs.start_ra()));
            (progress, countdown, Some(obs.sweeps_display()))
        }
        None => (0, "n/a".to_string(), None),
    };

    let latest = state.history.latest().copied();
    let tick_rate = match state.rate.sample(state.clock.civil_secs()) {
        Some(hz) => format!("{hz:.2}Hz"),
        None => "n/a".to_string(),
    };

    let update = DisplayUpdate {
        sidereal_time: state.clock.get_formatted_sidereal_time(),
        declination: format!("{:.4}°", state.current_dec),
        sweeps,
        progress_percent,
        countdown,
        tick_rate,
        channel_a: latest.map_or_else(|| "n/a".to_string(), |p| format!("{:.4}V", p.channel_a)),
        channel_b: latest.map_or_else(|| "n/a".to_string(), |p| format!("{:.4}V", p.channel_b)),
        dish_angle_deg: state.current_dec - state.site.latitude_deg,
        console: state.console.tail(),
    };
    state.outbox.push(Notice::Display(update));
    TimerControl::Keep
}

/// Data-communication tick: poll the observation and act on its signal.
fn update_data(state: &mut CoreState) -> TimerControl {
    if state.ack.is_waiting() {
        return TimerControl::Keep;
    }
    let t = state.clock.get_time();
    let Some(obs) = state.observation.as_mut() else {
        return TimerControl::Keep;
    };
    let period = 1000.0 / obs.freq();
    let comm = obs.communicate(state.history.latest(), t);
    dispatch(state, comm);
    TimerControl::SetPeriod(period)
}

/// Carry out the side effects of `comm`.
fn dispatch(state: &mut CoreState, comm: Comm) {
    let Some(obs) = state.observation.as_ref() else {
        return;
    };
    let kind = obs.kind();

    match comm {
        Comm::StartCal => {
            let mut alerts = Vec::new();
            if let Some(text) = obs.advisory(comm) {
                alerts.push(Alert::new(text, "Close"));
            }
            if kind.is_survey() && obs.is_closing_calibration() {
                alerts.push(Alert::new("STOP the telescope", "Okay"));
                alerts.push(Alert::new("Has the telescope been stopped?", "Yes"));
            }
            alerts.push(Alert::new("Turn the calibration switches ON", "Okay"));
            alerts.push(Alert::new("Are the calibration switches ON?", "Yes"));
            state.suspend(alerts, Deferred::EnterCalibration);
        }
        Comm::StartBg => {
            let alerts = [
                Alert::new("Turn the calibration switches OFF", "Okay"),
                Alert::new("Are the calibration switches OFF?", "Yes"),
            ];
            state.suspend(alerts, Deferred::EnterBackground);
        }
        Comm::StartWait => {
            state.advance_observation();
            state.message(format!("Waiting for {} to begin...", kind.lowercase_name()));
        }
        Comm::StartData => {
            state.advance_observation();
            state.message(format!("Taking {} data!!!", kind.lowercase_name()));
        }
        Comm::Finished => {
            state.advance_observation();
            state.message(format!("{} complete!!!", kind.name()));
            state.observation = None;
            state.outbox.push(Notice::ObservationEnded {
                kind: kind.name(),
                aborted: false,
            });
        }
        Comm::SendTelNorth => {
            state.silent_message("Send telescope NORTH at max speed!!!");
            state.beep_pending = true;
        }
        Comm::SendTelSouth => {
            state.silent_message("Send telescope SOUTH at max speed!!!");
            state.beep_pending = true;
        }
        Comm::EndSendTel => {
            state.silent_message(format!("Taking {} data!!!", kind.lowercase_name()));
        }
        Comm::Beep => state.beep_pending = true,
        Comm::Next => state.advance_observation(),
        Comm::NoAction => {}
    }
}

/// `T-HH:MM:SS` style countdown to `start_ra`.  The sign is `-` once the
/// start has passed; hour and minute fields are omitted while zero.
pub fn format_countdown(time_until_start: f64) -> String {
    let total = time_until_start.abs();
    let hours = (total / 3600.0) as u64;
    let minutes = ((total - hours as f64 * 3600.0) / 60.0) as u64;
    let seconds = (total - hours as f64 * 3600.0 - minutes as f64 * 60.0) as u64;

    let mut out = String::from("T");
    out.push(if time_until_start < 0.0 { '-' } else { '+' });
    if hours != 0 {
        out.push_str(&format!("{hours:02}:"));
    }
    if minutes != 0 {
        out.push_str(&format!("{minutes:02}:"));
    }
    out.push_str(&format!("{seconds:02}"));
    out
}
