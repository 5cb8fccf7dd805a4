//! Outbound notices.
//!
//! The [`AcquisitionLoop`](super::service::AcquisitionLoop) emits these
//! through the [`NoticeSink`](super::ports::NoticeSink) port.  Adapters on
//! the other side decide what to do with them: log them, drive a window,
//! play a sound.  The core never waits for delivery.

/// Structured notices emitted by the acquisition core.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// Status line for the operator.  `silent` notices neither beep nor
    /// enter the console log.
    Message { text: String, silent: bool },

    /// The operator must acknowledge this before the protocol continues.
    Alert(Alert),

    /// Play the beep cue.
    Beep,

    /// Periodic display refresh.
    Display(DisplayUpdate),

    /// An observation was accepted.
    ObservationStarted { kind: &'static str },

    /// The active observation finished or was aborted.
    ObservationEnded { kind: &'static str, aborted: bool },

    /// A calibration session wants the telescope at `target` degrees.
    CalibrationStep { target: f64 },

    /// A calibration session was saved and the new curve loaded.
    CalibrationSaved,
}

/// Text plus the label of the single acknowledgement button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub message: String,
    pub button: String,
}

impl Alert {
    pub fn new(message: impl Into<String>, button: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            button: button.into(),
        }
    }
}

/// Everything the 1 Hz display refresh shows.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayUpdate {
    /// `HH:MM:SS` sidereal time.
    pub sidereal_time: String,
    /// Current declination, e.g. `"12.3456°"`.
    pub declination: String,
    /// Sweep counter, `"n/a"` for kinds that do not sweep; `None` with no
    /// observation.
    pub sweeps: Option<String>,
    /// Percent of the data window elapsed.
    pub progress_percent: u8,
    /// Countdown relative to `start_ra` (`T-05:00`, `T+12`) or `"n/a"`.
    pub countdown: String,
    /// Measured tick rate since the previous refresh, e.g. `"99.87Hz"`.
    pub tick_rate: String,
    /// Latest channel voltages, e.g. `"0.1234V"`.
    pub channel_a: String,
    pub channel_b: String,
    /// Dish tilt from zenith for the dish view (degrees).
    pub dish_angle_deg: f64,
    /// Most recent console lines, oldest first.
    pub console: Vec<String>,
}
