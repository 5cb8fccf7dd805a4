//! Sidereal clock.
//!
//! Maps monotonic civil time onto sidereal time.  Two references are kept:
//!
//! - the **sidereal reference** — the sidereal time of day that was valid
//!   at a known civil instant (set by the operator, or computed from UTC);
//!   [`SiderealClock::get_time`] extrapolates from it;
//! - the **anchor** — a civil instant that [`SiderealClock::get_sidereal_seconds`]
//!   counts from.  It is reset whenever a calibration or background phase
//!   starts, so data-point timestamps restart at zero for each phase.
//!
//! Sidereal time is not wrapped at 24 h internally; only the display
//! formatting reduces it to a time of day.

use chrono::{DateTime, Utc};

use crate::app::ports::TimeSource;

/// Sidereal seconds per civil second.
pub const SIDEREAL_RATE: f64 = 1.002_737_909_35;

/// Seconds in one (sidereal) day of sidereal time.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

pub struct SiderealClock {
    source: Box<dyn TimeSource>,
    reference_civil: f64,
    reference_sidereal: f64,
    anchor_civil: f64,
}

impl SiderealClock {
    /// Start a clock that reads `sidereal_time` (seconds of day) right now.
    pub fn new(source: Box<dyn TimeSource>, sidereal_time: f64) -> Self {
        let now = source.now_secs();
        Self {
            source,
            reference_civil: now,
            reference_sidereal: sidereal_time.rem_euclid(SECONDS_PER_DAY),
            anchor_civil: now,
        }
    }

    /// Re-synchronise to an operator-supplied sidereal time of day.
    /// Also re-anchors.
    pub fn set_sidereal_time(&mut self, sidereal_time: f64) {
        let now = self.source.now_secs();
        self.reference_civil = now;
        self.reference_sidereal = sidereal_time.rem_euclid(SECONDS_PER_DAY);
        self.anchor_civil = now;
        log::info!("Sidereal clock set to {}", format_hms(sidereal_time));
    }

    /// Current sidereal time in seconds, continuing past 24 h.
    pub fn get_time(&self) -> f64 {
        let elapsed = self.source.now_secs() - self.reference_civil;
        self.reference_sidereal + elapsed * SIDEREAL_RATE
    }

    /// Sidereal seconds elapsed since the anchor.
    pub fn get_sidereal_seconds(&self) -> f64 {
        (self.source.now_secs() - self.anchor_civil) * SIDEREAL_RATE
    }

    /// Move the anchor to now.
    pub fn reset_anchor_time(&mut self) {
        self.anchor_civil = self.source.now_secs();
    }

    /// Signed sidereal seconds until `target`; negative once it has passed.
    pub fn get_time_until(&self, target: f64) -> f64 {
        target - self.get_time()
    }

    /// `HH:MM:SS` sidereal time of day.
    pub fn get_formatted_sidereal_time(&self) -> String {
        format_hms(self.get_time())
    }

    /// The first absolute sidereal time, at or after now, whose time of day
    /// is `seconds_of_day`.
    pub fn next_occurrence(&self, seconds_of_day: f64) -> f64 {
        let now = self.get_time();
        let day_start = now - now.rem_euclid(SECONDS_PER_DAY);
        let candidate = day_start + seconds_of_day.rem_euclid(SECONDS_PER_DAY);
        if candidate < now {
            candidate + SECONDS_PER_DAY
        } else {
            candidate
        }
    }

    /// Civil milliseconds from the time source, for the timer multiplexer.
    pub fn civil_millis(&self) -> f64 {
        self.source.now_secs() * 1000.0
    }

    /// Civil seconds from the time source.
    pub fn civil_secs(&self) -> f64 {
        self.source.now_secs()
    }
}

/// Format seconds as a `HH:MM:SS` time of day.
pub fn format_hms(seconds: f64) -> String {
    let total = seconds.rem_euclid(SECONDS_PER_DAY).floor() as u32;
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Parse `HH:MM:SS` (or `HH:MM`) into seconds of day.
pub fn parse_hms(text: &str) -> Option<f64> {
    let mut parts = text.trim().split(':');
    let hours: u32 = parts.next()?.parse().ok()?;
    let minutes: u32 = parts.next()?.parse().ok()?;
    let seconds: f64 = match parts.next() {
        Some(s) => s.parse().ok()?,
        None => 0.0,
    };
    if parts.next().is_some() || hours >= 24 || minutes >= 60 || !(0.0..60.0).contains(&seconds) {
        return None;
    }
    Some(f64::from(hours * 3600 + minutes * 60) + seconds)
}

/// Local sidereal time (seconds of day) at `longitude_deg` for a UTC instant.
///
/// Uses the IAU 1982 GMST expression in days since J2000.0, accurate to
/// well under a second for dates near the present.
pub fn local_sidereal_time(utc: DateTime<Utc>, longitude_deg: f64) -> f64 {
    let unix = utc.timestamp() as f64 + f64::from(utc.timestamp_subsec_nanos()) * 1e-9;
    let julian_day = unix / SECONDS_PER_DAY + 2_440_587.5;
    let days = julian_day - 2_451_545.0;
    let gmst_hours = 18.697_374_558 + 24.065_709_824_419_08 * days;
    let lst_hours = (gmst_hours + longitude_deg / 15.0).rem_euclid(24.0);
    lst_hours * 3600.0
}
