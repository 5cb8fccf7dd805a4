//! Integration tests for the tick → curve → history → protocol pipeline.
//!
//! These drive the acquisition loop with scripted readers and a manual
//! clock, and check what the operator would see.

use crate::mock_rig::{Rig, raw_for, quick_protocol};

use radiodaq::adapters::calibration_file::MemoryCalibrationStore;
use radiodaq::app::commands::RigCommand;
use radiodaq::app::events::Notice;
use radiodaq::calibration::CalibrationCurve;
use radiodaq::config::RigConfig;
use radiodaq::data::ChannelSample;
use radiodaq::observation::{ObservationKind, ObservationRequest, Phase};
use radiodaq::Error;

fn scan(start_ra: f64, end_ra: f64, freq: f64) -> ObservationRequest {
    ObservationRequest {
        kind: ObservationKind::Scan { dec: 20.0 },
        start_ra,
        end_ra,
        freq,
        sweeps: None,
    }
}

fn channels(v: f64) -> Option<ChannelSample> {
    Some(ChannelSample { a: v, b: v / 2.0 })
}

// ── Sampling ──────────────────────────────────────────────────

#[test]
fn missing_samples_never_duplicate_points() {
    let mut rig = Rig::new();
    for i in 0..400 {
        match i % 4 {
            0 => rig.tick_with(channels(0.1), Some(raw_for(10.0))),
            1 => rig.tick_with(channels(0.2), None),
            2 => rig.tick_with(None, Some(raw_for(12.0))),
            _ => rig.tick_with(None, None),
        }
    }

    let points = rig.app.history().as_slice();
    assert_eq!(points.len(), 100, "only ticks with both samples record");
    assert!(
        points
            .windows(2)
            .all(|w| w[1].sidereal_timestamp > w[0].sidereal_timestamp),
        "timestamps must be strictly increasing"
    );
    assert!(points.iter().all(|p| p.channel_a == 0.1));
}

#[test]
fn points_carry_calibrated_declination() {
    let mut rig = Rig::new();
    rig.run(0.05, 42.5);
    let last = rig.app.history().latest().copied().unwrap();
    assert!((last.declination - 42.5).abs() < 1e-9);
    assert!((rig.app.current_dec() - 42.5).abs() < 1e-9);
}

#[test]
fn degenerate_segment_skips_the_point() {
    let config = RigConfig::default();
    let mut values: Vec<String> = (0..12).map(|i| i.to_string()).collect();
    values.push("11".into());
    let store = MemoryCalibrationStore::with_contents(&values.join("\n"));
    let curve = CalibrationCurve::load(&store, &config.calibration).unwrap();
    let mut rig = Rig::with_curve(&config, curve, store);

    rig.tick_with(channels(0.3), Some(5.0));
    assert_eq!(rig.app.history().len(), 1);
    rig.tick_with(channels(0.3), Some(12.0));
    assert_eq!(rig.app.history().len(), 1, "no point from a zero-width segment");
    assert!((rig.app.current_dec() - 25.0).abs() < 1e-9);
}

// ── Display ───────────────────────────────────────────────────

#[test]
fn display_refreshes_once_per_second() {
    let mut rig = Rig::new();
    rig.run(3.0, 20.0);

    let displays = rig.sink.displays();
    assert_eq!(displays.len(), 3);
    let d = displays[0];
    assert_eq!(d.declination, "20.0000°");
    assert_eq!(d.countdown, "n/a");
    assert_eq!(d.sweeps, None);
    assert_eq!(d.progress_percent, 0);
    assert_eq!(d.tick_rate, "100.00Hz");
    assert!(d.channel_a.ends_with('V'));
    assert!((d.dish_angle_deg - (20.0 - 38.4331)).abs() < 1e-9);
    assert_eq!(d.console.last().map(|l| l.ends_with("Ready!!!")), Some(true));
}

#[test]
fn display_counts_down_to_start() {
    let mut rig = Rig::new();
    rig.command(RigCommand::StartObservation(scan(100.0, 130.0, 1.0)))
        .unwrap();
    rig.run(1.0, 20.0);

    let d = rig.sink.displays()[0];
    // 100 - 1.0027 sidereal seconds to go.
    assert_eq!(d.countdown, "T+01:38");
    assert_eq!(d.sweeps.as_deref(), Some("n/a"));
}

// ── Observation lifecycle ─────────────────────────────────────

#[test]
fn scan_runs_through_every_phase() {
    let mut rig = Rig::new();
    rig.command(RigCommand::StartObservation(scan(100.0, 130.0, 1.0)))
        .unwrap();
    rig.run_acknowledging(140.0, 20.0);

    assert_eq!(
        rig.sink.messages(),
        vec![
            "Ready!!!",
            "Taking calibration data!!!",
            "Taking background data!!!",
            "Waiting for scan to begin...",
            "Taking scan data!!!",
            "Scan complete!!!",
        ]
    );
    let alerts = rig.sink.alert_texts();
    assert_eq!(
        alerts,
        vec![
            "Turn the calibration switches ON",
            "Are the calibration switches ON?",
            "Turn the calibration switches OFF",
            "Are the calibration switches OFF?",
        ]
    );
    assert_eq!(rig.sink.beeps(), 3, "one countdown beep per second");
    assert!(rig.sink.notices.contains(&Notice::ObservationEnded {
        kind: "Scan",
        aborted: false
    }));
    assert!(rig.app.observation().is_none());

    // Calibration and background each re-anchor the timestamps.
    let resets = rig
        .app
        .history()
        .as_slice()
        .windows(2)
        .filter(|w| w[1].sidereal_timestamp < w[0].sidereal_timestamp)
        .count();
    assert_eq!(resets, 2);
}

#[test]
fn alerts_suspend_the_protocol_until_acknowledged() {
    let mut rig = Rig::new();
    rig.command(RigCommand::StartObservation(scan(100.0, 130.0, 1.0)))
        .unwrap();
    rig.run(60.0, 20.0);

    assert!(rig.app.is_waiting_for_ack());
    assert_eq!(
        rig.app.open_alert().map(|a| a.button.as_str()),
        Some("Okay")
    );
    let points_before = rig.app.history().len();
    rig.run(30.0, 20.0);
    assert!(rig.app.is_waiting_for_ack(), "time alone does not resume");
    assert_eq!(rig.app.history().len(), points_before + 3000, "sampling continues");
    assert_eq!(rig.sink.messages(), vec!["Ready!!!"]);

    rig.command(RigCommand::Acknowledge).unwrap();
    assert_eq!(
        rig.app.open_alert().map(|a| a.message.as_str()),
        Some("Are the calibration switches ON?")
    );
    rig.command(RigCommand::Acknowledge).unwrap();
    assert!(!rig.app.is_waiting_for_ack());
    assert_eq!(rig.sink.messages().last(), Some(&"Taking calibration data!!!"));
    assert_eq!(
        rig.app.observation().map(|o| o.phase()),
        Some(Phase::Calibration)
    );
}

#[test]
fn abort_drops_observation_and_open_alerts() {
    let mut rig = Rig::new();
    rig.command(RigCommand::StartObservation(scan(100.0, 130.0, 1.0)))
        .unwrap();
    rig.run(55.0, 20.0);
    assert!(rig.app.is_waiting_for_ack());

    rig.command(RigCommand::AbortObservation).unwrap();
    assert!(!rig.app.is_waiting_for_ack());
    assert!(rig.app.observation().is_none());
    assert_eq!(rig.sink.messages().last(), Some(&"Scan aborted"));
    assert!(rig.sink.notices.contains(&Notice::ObservationEnded {
        kind: "Scan",
        aborted: true
    }));
}

#[test]
fn data_timer_retunes_to_observation_rate() {
    let mut rig = Rig::new();
    assert_eq!(rig.app.data_period_ms(), Some(1000.0));
    rig.command(RigCommand::StartObservation(scan(100.0, 130.0, 4.0)))
        .unwrap();
    rig.run(1.0, 20.0);
    assert_eq!(rig.app.data_period_ms(), Some(250.0));
}

#[test]
fn observation_requests_are_validated() {
    let mut rig = Rig::new();
    assert!(matches!(
        rig.command(RigCommand::StartObservation(scan(100.0, 130.0, 0.0))),
        Err(Error::InvalidObservationParameter(_))
    ));
    assert!(matches!(
        rig.command(RigCommand::StartObservation(scan(100.0, 130.0, 500.0))),
        Err(Error::InvalidObservationParameter(_))
    ));
    rig.command(RigCommand::StartObservation(scan(100.0, 130.0, 1.0)))
        .unwrap();
    assert!(matches!(
        rig.command(RigCommand::StartObservation(scan(200.0, 230.0, 1.0))),
        Err(Error::Busy(_))
    ));
}

#[test]
fn survey_alerts_stop_before_closing_calibration() {
    let config = RigConfig {
        protocol: quick_protocol(),
        ..RigConfig::default()
    };
    let mut rig = Rig::with_config(&config);
    let request = ObservationRequest {
        kind: ObservationKind::Survey {
            start_dec: 10.0,
            end_dec: 30.0,
        },
        start_ra: 100.0,
        end_ra: 130.0,
        freq: 1.0,
        sweeps: None,
    };
    rig.command(RigCommand::StartObservation(request)).unwrap();
    rig.run_acknowledging(160.0, 10.0);

    let alerts = rig.sink.alert_texts();
    assert_eq!(alerts.iter().filter(|a| **a == "STOP the telescope").count(), 1);
    let stop = alerts.iter().position(|a| *a == "STOP the telescope").unwrap();
    assert_eq!(alerts[stop + 1], "Has the telescope been stopped?");
    assert_eq!(alerts[stop + 2], "Turn the calibration switches ON");
    assert_eq!(rig.sink.messages().last(), Some(&"Survey complete!!!"));
    assert!(rig
        .sink
        .silent_messages()
        .contains(&"Send telescope NORTH at max speed!!!"));
}

#[test]
fn set_sidereal_time_resyncs_the_clock() {
    let mut rig = Rig::new();
    rig.run(1.0, 0.0);
    rig.command(RigCommand::SetSiderealTime(3600.0)).unwrap();
    assert_eq!(rig.app.clock().get_formatted_sidereal_time(), "01:00:00");
    assert!(rig
        .command(RigCommand::SetSiderealTime(f64::INFINITY))
        .is_err());
}
