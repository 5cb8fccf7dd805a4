//! Stepwise calibration walk.
//!
//! ```text
//!  AwaitingDirection ──choose_direction──▶ AwaitingDirection
//!         │                                      │
//!         └──────────── advance(raw) ────────────┘
//!                            │
//!                            ▼
//!                        Stepping ──advance(raw)──▶ Stepping
//!                            │
//!                            │ target left [south, north]
//!                            ▼
//!                        Complete ──persist──▶ (file written)
//! ```
//!
//! The operator points the telescope at each target declination and
//! records the declinometer's raw reading.  The walk may start at either
//! end of the ladder; the persisted file is always south to north.

use log::info;

use crate::app::ports::CalibrationStore;
use crate::config::CalibrationConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Start at the south bound and step north.
    North,
    /// Start at the north bound and step south.
    South,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingDirection,
    Stepping,
    Complete,
}

/// Result of recording one rung.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// Point the telescope at `next_target` and record again.
    Continue { next_target: f64 },
    /// Every rung has a value.
    Complete,
}

#[derive(Debug, Clone)]
pub struct CalibrationSession {
    south_dec: i32,
    north_dec: i32,
    current: i32,
    step: i32,
    samples: Vec<f64>,
    state: SessionState,
}

impl CalibrationSession {
    /// A new session starts at the south bound, stepping north.
    pub fn new(config: &CalibrationConfig) -> Self {
        Self {
            south_dec: config.south_dec,
            north_dec: config.north_dec,
            current: config.south_dec,
            step: config.step as i32,
            samples: Vec::new(),
            state: SessionState::AwaitingDirection,
        }
    }

    /// Pick which end of the ladder to start from.  Only allowed before
    /// the first sample is recorded.
    pub fn choose_direction(&mut self, direction: Direction) -> Result<()> {
        if self.state != SessionState::AwaitingDirection {
            return Err(Error::CalibrationSession(
                "direction is fixed once stepping has begun",
            ));
        }
        let magnitude = self.step.abs();
        match direction {
            Direction::North => {
                self.current = self.south_dec;
                self.step = magnitude;
            }
            Direction::South => {
                self.current = self.north_dec;
                self.step = -magnitude;
            }
        }
        info!(
            "Calibration: walking {:?} from {}°",
            direction, self.current
        );
        Ok(())
    }

    /// Record the raw reading for the current target and move to the next.
    pub fn advance(&mut self, raw: f64) -> Result<StepOutcome> {
        if self.state == SessionState::Complete {
            return Err(Error::CalibrationSession("session already complete"));
        }
        if !raw.is_finite() {
            return Err(Error::CalibrationSession("raw reading is not finite"));
        }
        self.samples.push(raw);
        info!(
            "Calibration: {}° -> raw {:.4} ({} recorded)",
            self.current,
            raw,
            self.samples.len()
        );
        self.current += self.step;

        if self.current > self.north_dec || self.current < self.south_dec {
            self.state = SessionState::Complete;
            info!("Calibration: all {} rungs recorded", self.samples.len());
            Ok(StepOutcome::Complete)
        } else {
            self.state = SessionState::Stepping;
            Ok(StepOutcome::Continue {
                next_target: f64::from(self.current),
            })
        }
    }

    /// Declination the telescope should be pointed at next.
    pub fn current_target(&self) -> f64 {
        f64::from(self.current)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// The file body: one value per line, south to north, no trailing
    /// newline.
    pub fn file_contents(&self) -> String {
        let mut values = self.samples.clone();
        if self.step < 0 {
            values.reverse();
        }
        values
            .iter()
            .map(f64::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Back up the current calibration data and write this session's
    /// values over it.  The session must be complete.
    pub fn persist(&self, store: &mut impl CalibrationStore) -> Result<()> {
        if self.state != SessionState::Complete {
            return Err(Error::CalibrationSession("session is not complete"));
        }
        store.backup()?;
        store.write(&self.file_contents())?;
        info!("Calibration: saved {} values", self.samples.len());
        Ok(())
    }
}
