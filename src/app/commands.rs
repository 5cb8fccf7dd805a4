//! Inbound commands to the acquisition core.
//!
//! These are operator actions (menu items, dialog buttons, CLI flags)
//! that the [`AcquisitionLoop`](super::service::AcquisitionLoop)
//! interprets and acts upon between ticks.

use crate::calibration::Direction;
use crate::observation::ObservationRequest;

#[derive(Debug, Clone, PartialEq)]
pub enum RigCommand {
    /// Validate and activate a new observation, replacing none.
    StartObservation(ObservationRequest),

    /// Drop the active observation immediately.
    AbortObservation,

    /// Open a calibration session walking in `Direction`.
    StartCalibration(Direction),

    /// Record the latest raw declinometer reading for the current rung.
    RecordCalibrationPoint,

    /// Throw the calibration session away without saving.
    DiscardCalibration,

    /// The operator pressed the button on the oldest open alert.
    Acknowledge,

    /// Re-sync the sidereal clock (seconds of day).
    SetSiderealTime(f64),

    /// Reload the calibration curve from the store.
    ReloadCalibration,
}
