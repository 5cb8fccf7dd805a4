//! Observation protocol state machine.
//!
//! Phases are laid out on the sidereal timeline relative to `start_ra`:
//!
//! ```text
//!   ──┬───────────┬────────────┬─────────┬──────────────┬────────────▶ t
//!     │ cal       │ background │ settle  │ data         │ (survey)
//!     │           │            │ (wait)  │              │ closing cal
//!   cal_start  bg_start    wait_start  start_ra       end_ra
//! ```
//!
//! [`Observation::communicate`] works out which phase the current time
//! belongs to.  If that is later than the committed phase it announces
//! the transition (`StartCal`, `StartBg`, ...) and remembers it as
//! pending; [`Observation::next`] commits it once the caller has acted.
//! Phases only ever move forward.  Windows that closed before the
//! observation was first polled are skipped.
//!
//! Inside a phase the protocol emits cues: slew commands while the
//! telescope is being positioned or swept, and a once-per-second beep
//! during the final countdown to data.

use log::{info, warn};

use super::{Comm, ObservationKind, ObservationRequest};
use crate::config::ProtocolSettings;
use crate::data::DataPoint;

/// Protocol phase, in timeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Created,
    Armed,
    Calibration,
    Background,
    Waiting,
    Data,
    ClosingCalibration,
    Finished,
}

impl Phase {
    const ALL: [Phase; 8] = [
        Self::Created,
        Self::Armed,
        Self::Calibration,
        Self::Background,
        Self::Waiting,
        Self::Data,
        Self::ClosingCalibration,
        Self::Finished,
    ];

    /// The signal that announces entry into this phase.
    fn signal(self) -> Comm {
        match self {
            Self::Created | Self::Armed => Comm::Next,
            Self::Calibration | Self::ClosingCalibration => Comm::StartCal,
            Self::Background => Comm::StartBg,
            Self::Waiting => Comm::StartWait,
            Self::Data => Comm::StartData,
            Self::Finished => Comm::Finished,
        }
    }
}

/// Survey sweep between the two declination bounds.
#[derive(Debug, Clone, Copy)]
struct Sweep {
    from: f64,
    to: f64,
    announced: bool,
    reversing: bool,
}

impl Sweep {
    fn direction(&self) -> Comm {
        if self.to > self.from {
            Comm::SendTelNorth
        } else {
            Comm::SendTelSouth
        }
    }

    fn reached(&self, dec: f64, tolerance: f64) -> bool {
        if self.to > self.from {
            dec >= self.to - tolerance
        } else {
            dec <= self.to + tolerance
        }
    }
}

#[derive(Debug, Clone)]
pub struct Observation {
    kind: ObservationKind,
    start_ra: f64,
    end_ra: f64,
    freq: f64,
    sweep_limit: Option<u32>,
    sweeps: i32,
    timing: ProtocolSettings,
    phase: Phase,
    pending: Option<Phase>,
    closing_started_at: Option<f64>,
    slewing: Option<Comm>,
    sweep: Option<Sweep>,
    last_beep_second: Option<i64>,
}

impl Observation {
    pub(super) fn new(request: ObservationRequest, timing: ProtocolSettings) -> Self {
        Self {
            kind: request.kind,
            start_ra: request.start_ra,
            end_ra: request.end_ra,
            freq: request.freq,
            sweep_limit: request.sweeps,
            sweeps: if request.kind.is_survey() { 0 } else { -1 },
            timing,
            phase: Phase::Created,
            pending: None,
            closing_started_at: None,
            slewing: None,
            sweep: None,
            last_beep_second: None,
        }
    }

    // ── accessors ────────────────────────────────────────────────

    pub fn kind(&self) -> ObservationKind {
        self.kind
    }

    pub fn start_ra(&self) -> f64 {
        self.start_ra
    }

    pub fn end_ra(&self) -> f64 {
        self.end_ra
    }

    pub fn freq(&self) -> f64 {
        self.freq
    }

    /// Completed sweeps, or `-1` for kinds that do not sweep.
    pub fn sweeps(&self) -> i32 {
        self.sweeps
    }

    pub fn sweeps_display(&self) -> String {
        if self.sweeps == -1 {
            "n/a".to_string()
        } else {
            self.sweeps.to_string()
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn pending(&self) -> Option<Phase> {
        self.pending
    }

    /// Whether the announced calibration is the one that closes a survey.
    pub fn is_closing_calibration(&self) -> bool {
        self.pending == Some(Phase::ClosingCalibration)
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished || self.pending == Some(Phase::Finished)
    }

    /// Text the operator needs alongside `comm`, if any.
    pub fn advisory(&self, comm: Comm) -> Option<String> {
        match (self.kind, comm) {
            (ObservationKind::Spectrum, Comm::StartCal) => Some(format!(
                "Set frequency to {}MHz",
                self.timing.spectrum_tuning_mhz
            )),
            _ => None,
        }
    }

    // ── protocol ─────────────────────────────────────────────────

    /// Decide what the caller should do at sidereal time `t`.
    pub fn communicate(&mut self, latest: Option<&DataPoint>, t: f64) -> Comm {
        if self.is_finished() {
            return Comm::NoAction;
        }
        if self.phase == Phase::ClosingCalibration && self.closing_started_at.is_none() {
            self.closing_started_at = Some(t);
        }

        let target = self.target_phase(t);
        if target > self.phase {
            if self.pending != Some(target) {
                let skipped = self.skipped_phases(target);
                if !skipped.is_empty() {
                    warn!(
                        "Observation: {} window(s) already closed, skipping {:?}",
                        skipped.len(),
                        skipped
                    );
                }
                self.pending = Some(target);
            }
            return target.signal();
        }

        match self.phase {
            Phase::Waiting => self.positioning_cue(latest, t),
            Phase::Data if self.kind.is_survey() => self.sweep_cue(latest),
            _ => Comm::NoAction,
        }
    }

    /// Commit the phase announced by the last transition signal.
    pub fn next(&mut self) {
        let Some(phase) = self.pending.take() else {
            return;
        };
        info!(
            "Observation: {} {:?} -> {:?}",
            self.kind.name(),
            self.phase,
            phase
        );
        self.phase = phase;
        self.slewing = None;
        if phase == Phase::Data {
            if let ObservationKind::Survey { start_dec, end_dec } = self.kind {
                self.sweep = Some(Sweep {
                    from: start_dec,
                    to: end_dec,
                    announced: false,
                    reversing: false,
                });
            }
        }
    }

    fn sweep_limit_reached(&self) -> bool {
        self.sweep_limit
            .is_some_and(|limit| i64::from(self.sweeps) >= i64::from(limit))
    }

    fn target_phase(&self, t: f64) -> Phase {
        let data_done = t >= self.end_ra || self.sweep_limit_reached();
        if data_done {
            if !self.kind.is_survey() {
                return Phase::Finished;
            }
            return match self.closing_started_at {
                Some(started) if t - started >= self.timing.calibration_secs => Phase::Finished,
                _ => Phase::ClosingCalibration,
            };
        }

        let wait_start = self.start_ra - self.timing.settle_secs;
        let bg_start = wait_start - self.timing.background_secs;
        let cal_start = bg_start - self.timing.calibration_secs;
        if t >= self.start_ra {
            Phase::Data
        } else if t >= wait_start {
            Phase::Waiting
        } else if t >= bg_start {
            Phase::Background
        } else if t >= cal_start {
            Phase::Calibration
        } else {
            Phase::Armed
        }
    }

    /// Meaningful phases strictly between the committed phase and `target`.
    fn skipped_phases(&self, target: Phase) -> Vec<Phase> {
        Phase::ALL
            .into_iter()
            .filter(|p| *p > self.phase && *p < target)
            .filter(|p| match p {
                Phase::Created | Phase::Armed => false,
                Phase::ClosingCalibration => self.kind.is_survey(),
                _ => true,
            })
            .collect()
    }

    /// Waiting phase: get the telescope to its starting declination, then
    /// count down to the data window.
    fn positioning_cue(&mut self, latest: Option<&DataPoint>, t: f64) -> Comm {
        if let (Some(target), Some(point)) = (self.kind.initial_dec(), latest) {
            let offset = point.declination - target;
            if offset.abs() > self.timing.slew_tolerance_deg {
                let comm = if offset < 0.0 {
                    Comm::SendTelNorth
                } else {
                    Comm::SendTelSouth
                };
                self.slewing = Some(comm);
                return comm;
            }
            if self.slewing.take().is_some() {
                return Comm::EndSendTel;
            }
        }

        let remaining = self.start_ra - t;
        if remaining > 0.0 && remaining <= self.timing.countdown_beep_secs {
            let second = remaining.ceil() as i64;
            if self.last_beep_second != Some(second) {
                self.last_beep_second = Some(second);
                return Comm::Beep;
            }
        }
        Comm::NoAction
    }

    /// Survey data phase: reverse at each declination bound.
    fn sweep_cue(&mut self, latest: Option<&DataPoint>) -> Comm {
        let tolerance = self.timing.slew_tolerance_deg;
        let Some(sweep) = self.sweep.as_mut() else {
            return Comm::NoAction;
        };
        if !sweep.announced {
            sweep.announced = true;
            sweep.reversing = true;
            return sweep.direction();
        }
        let Some(point) = latest else {
            return Comm::NoAction;
        };

        if sweep.reached(point.declination, tolerance) {
            core::mem::swap(&mut sweep.from, &mut sweep.to);
            sweep.reversing = true;
            let comm = sweep.direction();
            self.sweeps += 1;
            info!("Observation: sweep {} complete", self.sweeps);
            if self.sweep_limit_reached() {
                return Comm::NoAction;
            }
            return comm;
        }
        if sweep.reversing && (point.declination - sweep.from).abs() > tolerance {
            sweep.reversing = false;
            return Comm::EndSendTel;
        }
        Comm::NoAction
    }
}
