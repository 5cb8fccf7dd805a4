//! Simulated rig.
//!
//! Two capture threads standing in for the DAQ and the declinometer.  Each
//! publishes into a [`SlotPublisher`] at its own rate, independent of the
//! acquisition tick, the way the real readers do.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, info};

use super::slot::SlotPublisher;
use crate::config::CalibrationConfig;
use crate::data::{ChannelSample, DeclinometerSample};

/// Raw declinometer volts per degree in the simulated sensor.
const SIM_VOLTS_PER_DEG: f64 = 0.02;
/// Raw reading at 0° declination.
const SIM_ZERO_VOLTS: f64 = 1.0;

pub struct SimRig {
    stop: Arc<AtomicBool>,
    threads: Vec<JoinHandle<()>>,
}

impl SimRig {
    /// Start both capture threads.
    pub fn spawn(
        daq_hz: f64,
        declinometer_hz: f64,
        daq: SlotPublisher<ChannelSample>,
        declinometer: SlotPublisher<DeclinometerSample>,
    ) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let start = Instant::now();

        let daq_thread = spawn_reader("sim-daq", daq_hz, Arc::clone(&stop), move || {
            let t = start.elapsed().as_secs_f64();
            daq.publish(ChannelSample {
                a: 0.5 + 0.1 * (t / 30.0).sin(),
                b: 0.4 + 0.05 * (t / 45.0).cos(),
            });
        })?;
        let dec_thread = spawn_reader("sim-dec", declinometer_hz, Arc::clone(&stop), move || {
            let t = start.elapsed().as_secs_f64();
            // Slow nod between roughly -10° and +50°.
            let dec = 20.0 + 30.0 * (t / 120.0).sin();
            declinometer.publish(DeclinometerSample {
                raw: sim_raw_for(dec),
            });
        })?;

        info!(
            "Sim rig running: DAQ {:.0} Hz, declinometer {:.0} Hz",
            daq_hz, declinometer_hz
        );
        Ok(Self {
            stop,
            threads: vec![daq_thread, dec_thread],
        })
    }

    /// Stop and join both threads.
    pub fn shutdown(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                debug!("Sim reader thread panicked");
            }
        }
    }
}

impl Drop for SimRig {
    fn drop(&mut self) {
        self.halt();
    }
}

fn spawn_reader(
    name: &str,
    hz: f64,
    stop: Arc<AtomicBool>,
    mut capture: impl FnMut() + Send + 'static,
) -> std::io::Result<JoinHandle<()>> {
    let period = Duration::from_secs_f64(1.0 / hz.max(0.1));
    thread::Builder::new().name(name.to_owned()).spawn(move || {
        while !stop.load(Ordering::Relaxed) {
            capture();
            thread::sleep(period);
        }
    })
}

/// Raw reading the simulated declinometer reports at `dec` degrees.
pub fn sim_raw_for(dec: f64) -> f64 {
    SIM_ZERO_VOLTS + dec * SIM_VOLTS_PER_DEG
}

/// Calibration file contents matching the simulated sensor.
pub fn sim_calibration(config: &CalibrationConfig) -> String {
    config
        .ladder()
        .into_iter()
        .map(|dec| sim_raw_for(dec).to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
