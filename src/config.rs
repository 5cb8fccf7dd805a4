//! Rig configuration parameters
//!
//! All tunable parameters for the acquisition core.
//! Loaded from a JSON file; any field left out takes its default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Core rig configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    // --- Timing ---
    /// Base tick period of the acquisition loop (milliseconds)
    pub base_period_ms: u32,
    /// Display refresh period (milliseconds)
    pub gui_update_period_ms: u32,
    /// Initial data-communication period before an observation retunes it (milliseconds)
    pub data_period_ms: u32,

    // --- Subsystems ---
    pub calibration: CalibrationConfig,
    pub protocol: ProtocolSettings,
    pub site: SiteConfig,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            base_period_ms: 10,         // 100 Hz
            gui_update_period_ms: 1000, // 1 Hz
            data_period_ms: 1000,       // 1 Hz until an observation sets its rate
            calibration: CalibrationConfig::default(),
            protocol: ProtocolSettings::default(),
            site: SiteConfig::default(),
        }
    }
}

/// Declination calibration ladder and its backing files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Southernmost calibration declination (degrees)
    pub south_dec: i32,
    /// Northernmost calibration declination (degrees)
    pub north_dec: i32,
    /// Spacing between ladder rungs (degrees)
    pub step: u32,
    /// Calibration file, one raw value per line, south to north
    pub file: PathBuf,
    /// Full copy of the previous calibration file
    pub backup_file: PathBuf,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            south_dec: -25,
            north_dec: 95,
            step: 10,
            file: PathBuf::from("dec-cal.txt"),
            backup_file: PathBuf::from("dec-cal-backup.txt"),
        }
    }
}

impl CalibrationConfig {
    /// Every calibration declination from south to north inclusive.
    pub fn ladder(&self) -> Vec<f64> {
        (self.south_dec..=self.north_dec)
            .step_by(self.step.max(1) as usize)
            .map(f64::from)
            .collect()
    }
}

/// Observation protocol window lengths and cues.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolSettings {
    /// Length of each calibration window (sidereal seconds)
    pub calibration_secs: f64,
    /// Length of the background window (sidereal seconds)
    pub background_secs: f64,
    /// Gap between the end of background and the start of data (sidereal seconds)
    pub settle_secs: f64,
    /// Beep once per second during this many seconds before data starts
    pub countdown_beep_secs: f64,
    /// How close the declination must be to a target to count as "there" (degrees)
    pub slew_tolerance_deg: f64,
    /// Receiver frequency the operator tunes to before a spectrum (MHz)
    pub spectrum_tuning_mhz: f64,
}

impl Default for ProtocolSettings {
    fn default() -> Self {
        Self {
            calibration_secs: 60.0,
            background_secs: 60.0,
            settle_secs: 30.0,
            countdown_beep_secs: 5.0,
            slew_tolerance_deg: 0.5,
            spectrum_tuning_mhz: 1319.5,
        }
    }
}

/// Observatory site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Geodetic latitude (degrees north)
    pub latitude_deg: f64,
    /// Longitude (degrees east, negative west)
    pub longitude_deg: f64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        // Green Bank, WV
        Self {
            latitude_deg: 38.4331,
            longitude_deg: -79.8398,
        }
    }
}

impl RigConfig {
    /// Load a configuration file.  A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("Config {} not found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e.kind())),
        };
        let config: Self =
            serde_json::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        log::info!("Config loaded from {}", path.display());
        Ok(config)
    }

    /// Reject values that would make the loop or the protocol misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_period_ms == 0 {
            return Err(ConfigError::ValidationFailed("base_period_ms must be > 0"));
        }
        if self.gui_update_period_ms < self.base_period_ms
            || self.data_period_ms < self.base_period_ms
        {
            return Err(ConfigError::ValidationFailed(
                "timer periods must not be shorter than base_period_ms",
            ));
        }
        let cal = &self.calibration;
        if cal.step == 0 {
            return Err(ConfigError::ValidationFailed("calibration.step must be > 0"));
        }
        if cal.north_dec - cal.south_dec < cal.step as i32 {
            return Err(ConfigError::ValidationFailed(
                "calibration ladder needs at least two rungs",
            ));
        }
        let p = &self.protocol;
        let windows = [
            p.calibration_secs,
            p.background_secs,
            p.settle_secs,
            p.countdown_beep_secs,
        ];
        if windows.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ConfigError::ValidationFailed(
                "protocol windows must be finite and non-negative",
            ));
        }
        if !(p.slew_tolerance_deg.is_finite() && p.slew_tolerance_deg > 0.0) {
            return Err(ConfigError::ValidationFailed(
                "protocol.slew_tolerance_deg must be > 0",
            ));
        }
        if !(-90.0..=90.0).contains(&self.site.latitude_deg) {
            return Err(ConfigError::ValidationFailed("site.latitude_deg out of range"));
        }
        Ok(())
    }

    /// Highest data rate the base tick can serve (Hz).
    pub fn max_data_rate_hz(&self) -> f64 {
        1000.0 / f64::from(self.base_period_ms)
    }
}
