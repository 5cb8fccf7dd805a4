//! Integration tests for the declination calibration flow: operator
//! commands in, calibration file and reloaded curve out.

use std::io;

use crate::mock_rig::{Rig, RecordingSink, linear_calibration};

use radiodaq::adapters::calibration_file::MemoryCalibrationStore;
use radiodaq::app::commands::RigCommand;
use radiodaq::app::events::Notice;
use radiodaq::app::ports::CalibrationStore;
use radiodaq::calibration::{Direction, SessionState};
use radiodaq::error::{CalibrationLoadError, StorageError};
use radiodaq::observation::{ObservationKind, ObservationRequest};
use radiodaq::Error;

/// Sensor the walk is recorded with; deliberately unlike the test curve.
fn sensor_raw(dec: f64) -> f64 {
    1.0 + dec * 0.02
}

/// Point the telescope at `target` and record the reading.
fn record_at(rig: &mut Rig, target: f64) -> radiodaq::Result<()> {
    rig.tick_with(None, Some(sensor_raw(target)));
    rig.command(RigCommand::RecordCalibrationPoint)
}

fn step_targets(sink: &RecordingSink) -> Vec<f64> {
    sink.notices
        .iter()
        .filter_map(|n| match n {
            Notice::CalibrationStep { target } => Some(*target),
            _ => None,
        })
        .collect()
}

/// Memory store whose writes can be made to fail.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryCalibrationStore,
    fail_writes: bool,
}

impl CalibrationStore for FlakyStore {
    fn read(&self) -> Result<String, StorageError> {
        self.inner.read()
    }

    fn backup(&mut self) -> Result<(), StorageError> {
        self.inner.backup()
    }

    fn write(&mut self, contents: &str) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Io(io::ErrorKind::PermissionDenied));
        }
        self.inner.write(contents)
    }
}

#[test]
fn northward_session_saves_and_reloads() {
    let mut rig = Rig::new();
    rig.command(RigCommand::StartCalibration(Direction::North))
        .unwrap();

    let mut target = -25.0;
    for _ in 0..13 {
        record_at(&mut rig, target).unwrap();
        target += 10.0;
    }

    let expected_targets: Vec<f64> = (-25..=95).step_by(10).map(f64::from).collect();
    assert_eq!(step_targets(&rig.sink), expected_targets);
    assert!(rig.sink.notices.contains(&Notice::CalibrationSaved));
    assert!(rig.app.calibration().is_none());

    // Previous contents backed up whole, new values written south to north.
    assert_eq!(rig.store.backup_contents(), Some(linear_calibration().as_str()));
    let written: Vec<f64> = rig
        .store
        .current_contents()
        .unwrap()
        .lines()
        .map(|l| l.parse().unwrap())
        .collect();
    assert_eq!(written.len(), 13);
    assert!((written[0] - sensor_raw(-25.0)).abs() < 1e-12);
    assert!((written[12] - sensor_raw(95.0)).abs() < 1e-12);

    // The loop is now using the new curve.
    let dec = rig.app.curve().apply(sensor_raw(40.0)).unwrap();
    assert!((dec - 40.0).abs() < 1e-9);
}

#[test]
fn southward_session_writes_south_to_north() {
    let mut rig = Rig::new();
    rig.command(RigCommand::StartCalibration(Direction::South))
        .unwrap();

    let mut target = 95.0;
    for _ in 0..13 {
        record_at(&mut rig, target).unwrap();
        target -= 10.0;
    }

    assert!(rig.sink.notices.contains(&Notice::CalibrationSaved));
    let curve = rig.app.curve();
    assert!((curve.raw_values()[0] - sensor_raw(-25.0)).abs() < 1e-12);
    assert!((curve.raw_values()[12] - sensor_raw(95.0)).abs() < 1e-12);
}

#[test]
fn recording_without_a_reading_is_rejected() {
    let mut rig = Rig::new();
    rig.command(RigCommand::StartCalibration(Direction::North))
        .unwrap();
    assert!(matches!(
        rig.command(RigCommand::RecordCalibrationPoint),
        Err(Error::NoSample)
    ));
    assert_eq!(rig.app.calibration().map(|s| s.samples().len()), Some(0));
}

#[test]
fn recording_without_a_session_is_rejected() {
    let mut rig = Rig::new();
    rig.tick_with(None, Some(1.0));
    assert!(matches!(
        rig.command(RigCommand::RecordCalibrationPoint),
        Err(Error::CalibrationSession(_))
    ));
}

#[test]
fn second_session_is_busy() {
    let mut rig = Rig::new();
    rig.command(RigCommand::StartCalibration(Direction::North))
        .unwrap();
    assert!(matches!(
        rig.command(RigCommand::StartCalibration(Direction::South)),
        Err(Error::Busy(_))
    ));
}

fn scan_request() -> ObservationRequest {
    ObservationRequest {
        kind: ObservationKind::Scan { dec: 20.0 },
        start_ra: 100.0,
        end_ra: 130.0,
        freq: 1.0,
        sweeps: None,
    }
}

#[test]
fn calibration_cannot_start_during_an_observation() {
    let mut rig = Rig::new();
    rig.command(RigCommand::StartObservation(scan_request()))
        .unwrap();
    assert!(matches!(
        rig.command(RigCommand::StartCalibration(Direction::North)),
        Err(Error::Busy(_))
    ));
    assert!(rig.app.calibration().is_none());

    rig.command(RigCommand::AbortObservation).unwrap();
    rig.command(RigCommand::StartCalibration(Direction::North))
        .unwrap();
    assert!(rig.app.calibration().is_some());
}

#[test]
fn observation_cannot_start_during_a_calibration() {
    let mut rig = Rig::new();
    rig.command(RigCommand::StartCalibration(Direction::North))
        .unwrap();
    assert!(matches!(
        rig.command(RigCommand::StartObservation(scan_request())),
        Err(Error::Busy(_))
    ));
    assert!(rig.app.observation().is_none());

    rig.command(RigCommand::DiscardCalibration).unwrap();
    rig.command(RigCommand::StartObservation(scan_request()))
        .unwrap();
    assert!(rig.app.observation().is_some());
}

#[test]
fn discard_leaves_files_untouched() {
    let mut rig = Rig::new();
    rig.command(RigCommand::StartCalibration(Direction::North))
        .unwrap();
    record_at(&mut rig, -25.0).unwrap();
    record_at(&mut rig, -15.0).unwrap();

    rig.command(RigCommand::DiscardCalibration).unwrap();
    assert!(rig.app.calibration().is_none());
    assert_eq!(rig.store.current_contents(), Some(linear_calibration().as_str()));
    assert_eq!(rig.store.backup_contents(), None);

    // A fresh session can start straight away.
    rig.command(RigCommand::StartCalibration(Direction::South))
        .unwrap();
}

#[test]
fn failed_save_can_be_retried() {
    let mut rig = Rig::new();
    let mut store = FlakyStore {
        inner: MemoryCalibrationStore::with_contents(&linear_calibration()),
        fail_writes: true,
    };
    let mut sink = RecordingSink::default();

    rig.app
        .handle_command(
            RigCommand::StartCalibration(Direction::North),
            &mut store,
            &mut sink,
        )
        .unwrap();
    let mut last = Ok(());
    for i in 0..13 {
        rig.tick_with(None, Some(sensor_raw(-25.0 + 10.0 * f64::from(i))));
        last = rig
            .app
            .handle_command(RigCommand::RecordCalibrationPoint, &mut store, &mut sink);
    }
    assert!(matches!(last, Err(Error::Storage(StorageError::Io(_)))));
    assert_eq!(
        rig.app.calibration().map(|s| s.state()),
        Some(SessionState::Complete)
    );

    store.fail_writes = false;
    rig.app
        .handle_command(RigCommand::RecordCalibrationPoint, &mut store, &mut sink)
        .unwrap();
    assert!(rig.app.calibration().is_none());
    assert!(sink.notices.contains(&Notice::CalibrationSaved));
    assert_eq!(rig.app.curve().len(), 13);
}

#[test]
fn reload_failure_keeps_previous_curve() {
    let mut rig = Rig::new();
    let before = rig.app.curve().clone();

    rig.store.write("1\n2\n3").unwrap();
    assert!(matches!(
        rig.command(RigCommand::ReloadCalibration),
        Err(Error::CalibrationLoad(CalibrationLoadError::LengthMismatch {
            expected: 13,
            found: 3
        }))
    ));
    assert_eq!(rig.app.curve(), &before);

    rig.store.write("0\n1\n2\n3\n4\n5\n6\n7\n8\n9\n10\n11\nabc").unwrap();
    assert!(matches!(
        rig.command(RigCommand::ReloadCalibration),
        Err(Error::CalibrationLoad(CalibrationLoadError::Parse { line: 13 }))
    ));
    assert_eq!(rig.app.curve(), &before);
}

#[test]
fn reload_picks_up_an_edited_file() {
    let mut rig = Rig::new();
    let doubled: Vec<String> = (0..13).map(|i| (i * 2).to_string()).collect();
    rig.store.write(&doubled.join("\n")).unwrap();
    rig.command(RigCommand::ReloadCalibration).unwrap();
    assert_eq!(rig.app.curve().raw_values()[12], 24.0);
}
