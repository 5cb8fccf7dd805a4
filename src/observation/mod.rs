//! Observations and the signal vocabulary of the observation protocol.
//!
//! An operator request becomes an [`Observation`] only after
//! [`ObservationRequest::validate`] accepts it.  The acquisition loop then
//! polls it with [`Observation::communicate`] and acts on the returned
//! [`Comm`].

mod protocol;

pub use protocol::{Observation, Phase};

use crate::config::ProtocolSettings;
use crate::error::{Error, Result};

/// Control signal returned by [`Observation::communicate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comm {
    StartCal,
    StartBg,
    StartWait,
    StartData,
    Finished,
    SendTelNorth,
    SendTelSouth,
    EndSendTel,
    Beep,
    Next,
    NoAction,
}

/// What is being observed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObservationKind {
    /// Sweep back and forth between two declinations while the sky drifts.
    Survey { start_dec: f64, end_dec: f64 },
    /// Hold one declination while the sky drifts through the beam.
    Scan { dec: f64 },
    /// Fixed pointing, frequency-resolved.
    Spectrum,
}

impl ObservationKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Survey { .. } => "Survey",
            Self::Scan { .. } => "Scan",
            Self::Spectrum => "Spectrum",
        }
    }

    pub fn lowercase_name(&self) -> &'static str {
        match self {
            Self::Survey { .. } => "survey",
            Self::Scan { .. } => "scan",
            Self::Spectrum => "spectrum",
        }
    }

    pub fn is_survey(&self) -> bool {
        matches!(self, Self::Survey { .. })
    }

    /// Declination the telescope must hold before data starts.
    pub fn initial_dec(&self) -> Option<f64> {
        match *self {
            Self::Survey { start_dec, .. } => Some(start_dec),
            Self::Scan { dec } => Some(dec),
            Self::Spectrum => None,
        }
    }
}

/// Operator request for a new observation.  RA bounds are absolute
/// sidereal seconds on the same timeline as
/// [`SiderealClock::get_time`](crate::clock::SiderealClock::get_time).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationRequest {
    pub kind: ObservationKind,
    pub start_ra: f64,
    pub end_ra: f64,
    /// Data-communication rate (Hz).
    pub freq: f64,
    /// Survey sweep limit; `None` sweeps until `end_ra`.
    pub sweeps: Option<u32>,
}

impl ObservationRequest {
    /// Check the request against the current sidereal time and the
    /// fastest rate the loop can serve.
    pub fn validate(
        self,
        now: f64,
        max_freq: f64,
        timing: ProtocolSettings,
    ) -> Result<Observation> {
        if !(self.freq.is_finite() && self.freq > 0.0) {
            return Err(Error::InvalidObservationParameter("freq must be > 0"));
        }
        if self.freq > max_freq {
            return Err(Error::InvalidObservationParameter(
                "freq exceeds the base tick rate",
            ));
        }
        if !(self.start_ra.is_finite() && self.end_ra.is_finite()) {
            return Err(Error::InvalidObservationParameter("RA bounds must be finite"));
        }
        if self.end_ra <= self.start_ra {
            return Err(Error::InvalidObservationParameter(
                "end RA must be after start RA",
            ));
        }
        if self.end_ra <= now {
            return Err(Error::InvalidObservationParameter("end RA has already passed"));
        }
        match self.kind {
            ObservationKind::Survey { start_dec, end_dec } => {
                if !(start_dec.is_finite() && end_dec.is_finite()) || start_dec == end_dec {
                    return Err(Error::InvalidObservationParameter(
                        "survey needs two distinct declinations",
                    ));
                }
                if self.sweeps == Some(0) {
                    return Err(Error::InvalidObservationParameter(
                        "sweep limit must be at least 1",
                    ));
                }
            }
            ObservationKind::Scan { dec } if !dec.is_finite() => {
                return Err(Error::InvalidObservationParameter(
                    "scan declination must be finite",
                ));
            }
            _ if self.sweeps.is_some() => {
                return Err(Error::InvalidObservationParameter(
                    "only surveys take a sweep limit",
                ));
            }
            _ => {}
        }
        Ok(Observation::new(self, timing))
    }
}
