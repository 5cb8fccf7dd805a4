//! Unified error types for the acquisition core.
//!
//! A single [`Error`] enum that every subsystem converts into, so the
//! acquisition loop and the command handlers share one `Result` type.
//! Leaf errors stay small and `Copy` where they can; only configuration
//! parsing carries an owned message.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the core funnels into this type.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The calibration file could not be turned into a curve.
    CalibrationLoad(CalibrationLoadError),
    /// A calibration evaluation hit a zero-width segment.
    CalibrationDegenerate(CalibrationDegenerateError),
    /// The calibration session was driven out of order.
    CalibrationSession(&'static str),
    /// An observation request or timer period was rejected.
    InvalidObservationParameter(&'static str),
    /// The timer multiplexer refused an operation.
    Timer(TimerError),
    /// The calibration store failed.
    Storage(StorageError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// The requested operation conflicts with work already in progress.
    Busy(&'static str),
    /// No declinometer sample has arrived yet.
    NoSample,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CalibrationLoad(e) => write!(f, "calibration load: {e}"),
            Self::CalibrationDegenerate(e) => write!(f, "calibration: {e}"),
            Self::CalibrationSession(msg) => write!(f, "calibration session: {msg}"),
            Self::InvalidObservationParameter(msg) => {
                write!(f, "invalid observation parameter: {msg}")
            }
            Self::Timer(e) => write!(f, "timer: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Busy(msg) => write!(f, "busy: {msg}"),
            Self::NoSample => write!(f, "no declinometer sample available"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Calibration errors
// ---------------------------------------------------------------------------

/// The calibration file does not describe a usable curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationLoadError {
    /// Line count differs from the number of ladder rungs.
    LengthMismatch { expected: usize, found: usize },
    /// A line is not a finite float (1-based line number).
    Parse { line: usize },
    /// Raw values decrease at this index.
    NotAscending { index: usize },
    /// Fewer than two points.
    TooShort,
    /// The backing store could not be read.
    Storage(StorageError),
}

impl fmt::Display for CalibrationLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch { expected, found } => {
                write!(f, "expected {expected} calibration values, found {found}")
            }
            Self::Parse { line } => write!(f, "line {line} is not a number"),
            Self::NotAscending { index } => {
                write!(f, "raw values decrease at index {index}")
            }
            Self::TooShort => write!(f, "a curve needs at least two points"),
            Self::Storage(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CalibrationLoadError {}

impl From<CalibrationLoadError> for Error {
    fn from(e: CalibrationLoadError) -> Self {
        Self::CalibrationLoad(e)
    }
}

/// Interpolation was asked to use a segment whose two raw values coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationDegenerateError {
    /// Index of the segment's lower point.
    pub index: usize,
}

impl fmt::Display for CalibrationDegenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "segment {}..{} has zero width",
            self.index,
            self.index + 1
        )
    }
}

impl std::error::Error for CalibrationDegenerateError {}

impl From<CalibrationDegenerateError> for Error {
    fn from(e: CalibrationDegenerateError) -> Self {
        Self::CalibrationDegenerate(e)
    }
}

// ---------------------------------------------------------------------------
// Timer errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// Every slot is taken.
    Full,
    /// The handle does not name a registered timer.
    UnknownHandle,
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "no free timer slots"),
            Self::UnknownHandle => write!(f, "unknown timer handle"),
        }
    }
}

impl std::error::Error for TimerError {}

impl From<TimerError> for Error {
    fn from(e: TimerError) -> Self {
        Self::Timer(e)
    }
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Nothing has been stored yet.
    NotFound,
    /// Underlying I/O failure.
    Io(std::io::ErrorKind),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "calibration data not found"),
            Self::Io(kind) => write!(f, "I/O error: {kind}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound,
            kind => Self::Io(kind),
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<StorageError> for CalibrationLoadError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A field failed range validation.
    /// The `&'static str` names the field and the rule.
    ValidationFailed(&'static str),
    /// The file exists but is not valid JSON for [`RigConfig`](crate::config::RigConfig).
    Parse(String),
    /// The file could not be read.
    Io(std::io::ErrorKind),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::Parse(msg) => write!(f, "parse error: {}", msg),
            Self::Io(kind) => write!(f, "I/O error: {}", kind),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
