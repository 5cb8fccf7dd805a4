//! Port traits — the hexagonal boundary between the control core and the rig.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AcquisitionLoop (domain)
//! ```
//!
//! Hardware readers, the clock source, the calibration file and the UI
//! implement these traits.  The [`AcquisitionLoop`](super::service::AcquisitionLoop)
//! consumes them via generics, so the core never touches devices or the
//! filesystem directly.

use crate::error::StorageError;

// ───────────────────────────────────────────────────────────────
// Sample port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Non-blocking poll of an independently clocked hardware reader.
///
/// Implementations MUST NOT block the tick.  A reader that has produced
/// nothing since the previous call returns `None`; the same sample is
/// never handed out twice.
pub trait SamplePort {
    type Sample;

    fn read_latest(&mut self) -> Option<Self::Sample>;
}

// ───────────────────────────────────────────────────────────────
// Time source (driven adapter: system clock → domain)
// ───────────────────────────────────────────────────────────────

/// Monotonic civil time.
pub trait TimeSource {
    /// Seconds since an arbitrary fixed origin.  Never decreases.
    fn now_secs(&self) -> f64;
}

// ───────────────────────────────────────────────────────────────
// Notice sink (driven adapter: domain → UI)
// ───────────────────────────────────────────────────────────────

/// The core emits [`Notice`](super::events::Notice)s through this port.
/// Delivery is one-way; the core never waits on the sink.
pub trait NoticeSink {
    fn emit(&mut self, notice: &super::events::Notice);
}

// ───────────────────────────────────────────────────────────────
// Calibration store (driven adapter: domain ↔ calibration file)
// ───────────────────────────────────────────────────────────────

/// Persistent home of the declination calibration values.
pub trait CalibrationStore {
    /// Full text of the current calibration data.
    fn read(&self) -> Result<String, StorageError>;

    /// Copy the current data over the backup in full.
    /// Succeeds without doing anything if there is no current data.
    fn backup(&mut self) -> Result<(), StorageError>;

    /// Replace the current data with `contents`.
    fn write(&mut self, contents: &str) -> Result<(), StorageError>;
}
