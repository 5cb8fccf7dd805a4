//! Mock rig for integration tests.
//!
//! Scripted readers, a recording notice sink and a hand-cranked clock,
//! so tests can drive the acquisition loop tick by tick without threads
//! or real time.

use std::collections::VecDeque;

use radiodaq::adapters::calibration_file::MemoryCalibrationStore;
use radiodaq::adapters::time::ManualTime;
use radiodaq::app::commands::RigCommand;
use radiodaq::app::events::{Alert, DisplayUpdate, Notice};
use radiodaq::app::ports::{NoticeSink, SamplePort};
use radiodaq::app::service::AcquisitionLoop;
use radiodaq::calibration::CalibrationCurve;
use radiodaq::clock::SiderealClock;
use radiodaq::config::{ProtocolSettings, RigConfig};
use radiodaq::data::{ChannelSample, DeclinometerSample};
use radiodaq::Result;

// ── Scripted reader ───────────────────────────────────────────

/// Hands out one scripted entry per poll; `None` entries and an empty
/// script both read as "nothing new".
pub struct ScriptedReader<T> {
    script: VecDeque<Option<T>>,
}

impl<T> ScriptedReader<T> {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
        }
    }

    pub fn push(&mut self, sample: Option<T>) {
        self.script.push_back(sample);
    }
}

impl<T> SamplePort for ScriptedReader<T> {
    type Sample = T;

    fn read_latest(&mut self) -> Option<T> {
        self.script.pop_front().flatten()
    }
}

// ── Recording sink ────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub notices: Vec<Notice>,
}

#[allow(dead_code)]
impl RecordingSink {
    /// Non-silent message texts, in order.
    pub fn messages(&self) -> Vec<&str> {
        self.notices
            .iter()
            .filter_map(|n| match n {
                Notice::Message { text, silent: false } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn silent_messages(&self) -> Vec<&str> {
        self.notices
            .iter()
            .filter_map(|n| match n {
                Notice::Message { text, silent: true } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn alerts(&self) -> Vec<&Alert> {
        self.notices
            .iter()
            .filter_map(|n| match n {
                Notice::Alert(a) => Some(a),
                _ => None,
            })
            .collect()
    }

    /// Alert texts, in the order they were shown.
    pub fn alert_texts(&self) -> Vec<&str> {
        self.notices
            .iter()
            .filter_map(|n| match n {
                Notice::Alert(a) => Some(a.message.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn displays(&self) -> Vec<&DisplayUpdate> {
        self.notices
            .iter()
            .filter_map(|n| match n {
                Notice::Display(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    pub fn beeps(&self) -> usize {
        self.notices.iter().filter(|n| **n == Notice::Beep).count()
    }

    pub fn clear(&mut self) {
        self.notices.clear();
    }
}

impl NoticeSink for RecordingSink {
    fn emit(&mut self, notice: &Notice) {
        self.notices.push(notice.clone());
    }
}

// ── Rig harness ───────────────────────────────────────────────

/// Raw declinometer value the test curve maps to `dec` degrees.
///
/// The test calibration is raw `i` at rung `i`, so raw = (dec + 25) / 10.
pub fn raw_for(dec: f64) -> f64 {
    (dec + 25.0) / 10.0
}

/// Thirteen rungs, raw 0..=12.
pub fn linear_calibration() -> String {
    (0..13).map(|i| i.to_string()).collect::<Vec<_>>().join("\n")
}

/// Short protocol windows so a whole observation fits in a few minutes.
pub fn quick_protocol() -> ProtocolSettings {
    ProtocolSettings {
        calibration_secs: 20.0,
        background_secs: 20.0,
        settle_secs: 10.0,
        countdown_beep_secs: 3.0,
        ..ProtocolSettings::default()
    }
}

pub struct Rig {
    pub app: AcquisitionLoop,
    pub time: ManualTime,
    pub daq: ScriptedReader<ChannelSample>,
    pub declinometer: ScriptedReader<DeclinometerSample>,
    pub sink: RecordingSink,
    pub store: MemoryCalibrationStore,
    ticks: u64,
}

#[allow(dead_code)]
impl Rig {
    /// Loop at 100 Hz, sidereal time zero at civil time zero.
    pub fn new() -> Self {
        let config = RigConfig {
            protocol: quick_protocol(),
            ..RigConfig::default()
        };
        Self::with_config(&config)
    }

    pub fn with_config(config: &RigConfig) -> Self {
        let store = MemoryCalibrationStore::with_contents(&linear_calibration());
        let curve = CalibrationCurve::load(&store, &config.calibration).unwrap();
        Self::with_curve(config, curve, store)
    }

    pub fn with_curve(
        config: &RigConfig,
        curve: CalibrationCurve,
        store: MemoryCalibrationStore,
    ) -> Self {
        let time = ManualTime::new();
        let clock = SiderealClock::new(Box::new(time.clone()), 0.0);
        let app = AcquisitionLoop::new(config, clock, curve).unwrap();
        Self {
            app,
            time,
            daq: ScriptedReader::new(),
            declinometer: ScriptedReader::new(),
            sink: RecordingSink::default(),
            store,
            ticks: 0,
        }
    }

    /// Advance 10 ms and run one tick with the given samples.
    pub fn tick_with(&mut self, channels: Option<ChannelSample>, raw_dec: Option<f64>) {
        self.ticks += 1;
        self.time.set(self.ticks as f64 / 100.0);
        self.daq.push(channels);
        self.declinometer
            .push(raw_dec.map(|raw| DeclinometerSample { raw }));
        self.app
            .tick(&mut self.daq, &mut self.declinometer, &mut self.sink);
    }

    /// Run `secs` of ticks with both readers delivering every tick and
    /// the telescope held at `dec` degrees.
    pub fn run(&mut self, secs: f64, dec: f64) {
        let ticks = (secs * 100.0).round() as u64;
        for _ in 0..ticks {
            let v = self.ticks as f64 * 1e-3;
            self.tick_with(Some(ChannelSample { a: v, b: -v }), Some(raw_for(dec)));
        }
    }

    /// Like [`run`](Self::run), acknowledging every alert as it appears.
    pub fn run_acknowledging(&mut self, secs: f64, dec: f64) {
        let ticks = (secs * 100.0).round() as u64;
        for _ in 0..ticks {
            self.run(0.01, dec);
            while self.app.is_waiting_for_ack() {
                self.command(RigCommand::Acknowledge).unwrap();
            }
        }
    }

    pub fn command(&mut self, cmd: RigCommand) -> Result<()> {
        self.app
            .handle_command(cmd, &mut self.store, &mut self.sink)
    }

    /// Civil seconds elapsed.
    pub fn now(&self) -> f64 {
        self.time.get()
    }
}
