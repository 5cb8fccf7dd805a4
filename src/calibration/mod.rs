//! Declination calibration.
//!
//! The declinometer reports a raw value that is only monotonically related
//! to true declination.  A [`CalibrationCurve`] maps raw readings onto
//! degrees by piecewise-linear interpolation through a ladder of known
//! declinations, extrapolating from the end segments outside the ladder.
//!
//! ```text
//!   dec (°)
//!     95 ┤                          ●
//!        │                      ●
//!        │                 ●            y: fixed ladder
//!        │           ●                     south_dec..=north_dec step 10
//!    -25 ┤  ●                           x: raw values, one per file line
//!        └──┬────┬─────┬────┬──────┬──▶ raw
//!          x0   x1    x2   x3     x_n
//! ```
//!
//! The ladder values are produced by a [`CalibrationSession`] that walks
//! the telescope across the sky one rung at a time.

mod session;

pub use session::{CalibrationSession, Direction, SessionState, StepOutcome};

use log::info;

use crate::app::ports::CalibrationStore;
use crate::config::CalibrationConfig;
use crate::error::{CalibrationDegenerateError, CalibrationLoadError};

/// Raw-to-declination model.  Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationCurve {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl CalibrationCurve {
    /// Build a curve from parallel raw (`x`) and declination (`y`) values.
    ///
    /// Both must have the same length, at least two points, finite values
    /// and `x` must never decrease.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self, CalibrationLoadError> {
        if x.len() != y.len() {
            return Err(CalibrationLoadError::LengthMismatch {
                expected: y.len(),
                found: x.len(),
            });
        }
        if x.len() < 2 {
            return Err(CalibrationLoadError::TooShort);
        }
        if let Some(index) = x.iter().position(|v| !v.is_finite()) {
            return Err(CalibrationLoadError::Parse { line: index + 1 });
        }
        if let Some(index) = x.windows(2).position(|w| w[1] < w[0]) {
            return Err(CalibrationLoadError::NotAscending { index: index + 1 });
        }
        Ok(Self { x, y })
    }

    /// Read raw values from `store` and pair them with the configured
    /// ladder, south to north.
    pub fn load(
        store: &impl CalibrationStore,
        config: &CalibrationConfig,
    ) -> Result<Self, CalibrationLoadError> {
        let text = store.read()?;
        let x = parse_values(&text)?;
        let y = config.ladder();
        if x.len() != y.len() {
            return Err(CalibrationLoadError::LengthMismatch {
                expected: y.len(),
                found: x.len(),
            });
        }
        let curve = Self::new(x, y)?;
        info!(
            "Calibration: loaded {} points, raw {:.4}..{:.4}",
            curve.len(),
            curve.x[0],
            curve.x[curve.len() - 1]
        );
        Ok(curve)
    }

    /// Convert a raw declinometer reading to degrees.
    pub fn apply(&self, raw: f64) -> Result<f64, CalibrationDegenerateError> {
        let last = self.x.len() - 1;
        let i = if raw < self.x[0] {
            0
        } else if raw > self.x[last] {
            last - 1
        } else {
            // First segment whose upper end reaches `raw`.
            self.x
                .windows(2)
                .position(|w| raw <= w[1])
                .unwrap_or(last - 1)
        };

        let dx = self.x[i + 1] - self.x[i];
        if dx == 0.0 {
            return Err(CalibrationDegenerateError { index: i });
        }
        let slope = (self.y[i + 1] - self.y[i]) / dx;
        Ok(self.y[i] + slope * (raw - self.x[i]))
    }

    pub fn raw_values(&self) -> &[f64] {
        &self.x
    }

    pub fn declinations(&self) -> &[f64] {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// One float per line.  A single trailing newline is tolerated; any other
/// blank line is a parse error.
fn parse_values(text: &str) -> Result<Vec<f64>, CalibrationLoadError> {
    let body = text.strip_suffix('\n').unwrap_or(text);
    let body = body.strip_suffix('\r').unwrap_or(body);
    if body.is_empty() {
        return Ok(Vec::new());
    }
    body.lines()
        .enumerate()
        .map(|(i, line)| {
            line.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or(CalibrationLoadError::Parse { line: i + 1 })
        })
        .collect()
}
