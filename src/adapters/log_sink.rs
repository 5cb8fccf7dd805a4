//! Log-based notice sink adapter.
//!
//! Implements [`NoticeSink`] by writing every outbound notice through the
//! `log` facade.  Used by the headless runner; a windowed front end would
//! implement the same trait.

use log::{debug, info, warn};

use crate::app::events::Notice;
use crate::app::ports::NoticeSink;

/// Adapter that logs every [`Notice`].
#[derive(Debug, Default)]
pub struct LogNoticeSink {
    alerts_shown: u32,
}

impl LogNoticeSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alerts rendered so far.
    pub fn alerts_shown(&self) -> u32 {
        self.alerts_shown
    }
}

impl NoticeSink for LogNoticeSink {
    fn emit(&mut self, notice: &Notice) {
        match notice {
            Notice::Message { text, silent } => {
                if *silent {
                    debug!("MSG | {}", text);
                } else {
                    info!("MSG | {}", text);
                }
            }
            Notice::Alert(alert) => {
                self.alerts_shown += 1;
                warn!("ALERT | {} [{}]", alert.message, alert.button);
            }
            Notice::Beep => debug!("BEEP"),
            Notice::Display(d) => {
                info!(
                    "DISPLAY | LST={} | dec={} | sweeps={} | {}% {} | {} | A={} B={}",
                    d.sidereal_time,
                    d.declination,
                    d.sweeps.as_deref().unwrap_or("-"),
                    d.progress_percent,
                    d.countdown,
                    d.tick_rate,
                    d.channel_a,
                    d.channel_b,
                );
            }
            Notice::ObservationStarted { kind } => info!("OBS | {} started", kind),
            Notice::ObservationEnded { kind, aborted } => {
                info!("OBS | {} {}", kind, if *aborted { "aborted" } else { "finished" });
            }
            Notice::CalibrationStep { target } => {
                info!("CAL | point the telescope at {:.0}°", target);
            }
            Notice::CalibrationSaved => info!("CAL | saved"),
        }
    }
}
