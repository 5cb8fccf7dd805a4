//! radiodaq — headless acquisition runner.
//!
//! Hexagonal layout: the acquisition loop in the middle, adapters around
//! it.  This binary wires the simulated rig to the core and logs every
//! notice.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SimRig ──▶ LatestSlot ×2   LogNoticeSink   FileCalibration    │
//! │  (reader threads)           (NoticeSink)    Store              │
//! │  SystemTimeSource (TimeSource)                                 │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            AcquisitionLoop (pure logic)                │    │
//! │  │  SiderealClock · TimerMultiplexer · CalibrationCurve   │    │
//! │  │  Observation protocol                                  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use log::{info, warn};

use radiodaq::adapters::calibration_file::FileCalibrationStore;
use radiodaq::adapters::log_sink::LogNoticeSink;
use radiodaq::adapters::sim::{sim_calibration, SimRig};
use radiodaq::adapters::slot::latest_slot;
use radiodaq::adapters::time::SystemTimeSource;
use radiodaq::app::commands::RigCommand;
use radiodaq::app::ports::CalibrationStore;
use radiodaq::app::service::AcquisitionLoop;
use radiodaq::calibration::CalibrationCurve;
use radiodaq::clock::{self, SiderealClock};
use radiodaq::config::RigConfig;
use radiodaq::error::StorageError;
use radiodaq::observation::{ObservationKind, ObservationRequest};

#[derive(Parser, Debug)]
#[command(name = "radiodaq")]
#[command(about = "Radio telescope acquisition loop (simulated readers)", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the rig configuration (JSON)
    #[arg(short, long, value_name = "FILE", default_value = "radiodaq.json")]
    config: PathBuf,

    /// Current local sidereal time (HH:MM:SS); computed from UTC if omitted
    #[arg(long, value_name = "HH:MM:SS")]
    lst: Option<String>,

    /// How long to run (seconds)
    #[arg(long, default_value_t = 60)]
    seconds: u64,

    /// Write a calibration matching the simulated sensor if none exists
    #[arg(long)]
    init_calibration: bool,

    /// Run a short scan through every phase, acknowledging alerts automatically
    #[arg(long)]
    demo_scan: bool,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);
    info!("radiodaq v{}", env!("CARGO_PKG_VERSION"));

    let config = RigConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    let lst = match &args.lst {
        Some(text) => match clock::parse_hms(text) {
            Some(seconds) => seconds,
            None => bail!("--lst must be HH:MM:SS, got '{text}'"),
        },
        None => clock::local_sidereal_time(Utc::now(), config.site.longitude_deg),
    };
    let clock = SiderealClock::new(Box::new(SystemTimeSource::new()), lst);
    info!("LST {}", clock.get_formatted_sidereal_time());

    let mut store = FileCalibrationStore::from_config(&config.calibration);
    if args.init_calibration && store.read() == Err(StorageError::NotFound) {
        warn!("No calibration on disk, writing the simulated sensor's");
        store
            .write(&sim_calibration(&config.calibration))
            .context("writing initial calibration")?;
    }
    let curve = CalibrationCurve::load(&store, &config.calibration).with_context(|| {
        format!(
            "loading calibration from {}",
            config.calibration.file.display()
        )
    })?;

    let mut app = AcquisitionLoop::new(&config, clock, curve)?;
    let mut sink = LogNoticeSink::new();

    let (daq_tx, mut daq_rx) = latest_slot();
    let (dec_tx, mut dec_rx) = latest_slot();
    let rig = SimRig::spawn(50.0, 20.0, daq_tx, dec_tx).context("starting reader threads")?;

    if args.demo_scan {
        let now = app.clock().get_time();
        let p = config.protocol;
        let start_ra = now + p.calibration_secs + p.background_secs + p.settle_secs + 5.0;
        let request = ObservationRequest {
            kind: ObservationKind::Scan { dec: 20.0 },
            start_ra,
            end_ra: start_ra + 30.0,
            freq: 2.0,
            sweeps: None,
        };
        app.handle_command(RigCommand::StartObservation(request), &mut store, &mut sink)?;
    }

    let period = Duration::from_millis(u64::from(config.base_period_ms));
    let run_for = Duration::from_secs(args.seconds);
    let started = Instant::now();
    let mut next_tick = started;

    while started.elapsed() < run_for {
        app.tick(&mut daq_rx, &mut dec_rx, &mut sink);

        if args.demo_scan && app.is_waiting_for_ack() {
            app.handle_command(RigCommand::Acknowledge, &mut store, &mut sink)?;
        }

        next_tick += period;
        let now = Instant::now();
        if next_tick > now {
            thread::sleep(next_tick - now);
        } else {
            // Fell behind; resync rather than burst.
            next_tick = now;
        }
    }

    rig.shutdown();
    info!(
        "Done: {} ticks, {} data points",
        app.tick_count(),
        app.history().len()
    );
    Ok(())
}

/// Initialize logging based on verbosity level.  `RUST_LOG` overrides.
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
