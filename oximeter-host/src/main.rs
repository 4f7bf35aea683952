//! `oximeter-sim` - run the oximeter core on the host
//!
//! Two threads stand in for the two cores of the target: the producer
//! brings the synthetic sensor up and runs the acquisition scheduler, the
//! consumer prints one report line per second from the shared slot.
//!
//! # Usage
//!
//! ```bash
//! # Ten seconds of a 75 BPM pulse
//! cargo run --bin oximeter-sim
//!
//! # Faster pulse, lower saturation, a read fault every 300 samples
//! cargo run --bin oximeter-sim -- --bpm 100 --ratio 80 --fault-every 300
//!
//! # Configuration file, run until interrupted
//! cargo run --bin oximeter-sim -- --config sim.json --duration-secs 0
//! ```

mod config;
mod platform;
mod sim;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Barrier;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use clap::Parser;
use oximeter_core::{
    bring_up, AcquisitionConfig, ReportOutcome, SchedulerTimers, SharedVitalsStore, TickOutcome,
    VitalsReporter,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::HostConfig;
use crate::platform::{InstantTimer, StdoutSink, ThreadDelay};
use crate::sim::{SimulatedSensorConfig, SyntheticSensor};

/// Idle sleep between polls of a timer that has not fired
const POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Parser, Debug)]
#[command(
    name = "oximeter-sim",
    version,
    about = "Pulse oximeter core running against a synthetic PPG sensor",
    long_about = None,
)]
struct Args {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop after this many seconds (0 runs until interrupted)
    #[arg(long, default_value_t = 10)]
    duration_secs: u64,

    /// Simulated heart rate
    #[arg(long)]
    bpm: Option<u32>,

    /// Red/IR ratio of ratios, scaled x100
    #[arg(long)]
    ratio: Option<u32>,

    /// Noise amplitude in counts
    #[arg(long)]
    noise: Option<u32>,

    /// Fail every n-th sensor read
    #[arg(long)]
    fault_every: Option<u64>,

    /// Produce samples as fast as they are read
    #[arg(long, default_value_t = false)]
    no_realtime: bool,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn host_config(&self) -> Result<HostConfig> {
        let mut config = match &self.config {
            Some(path) => HostConfig::load(path)?,
            None => HostConfig::default(),
        };

        let sensor = &mut config.sensor;
        if let Some(bpm) = self.bpm {
            sensor.heart_rate_bpm = bpm;
        }
        if let Some(ratio) = self.ratio {
            sensor.target_ratio = ratio;
        }
        if let Some(noise) = self.noise {
            sensor.noise = noise;
        }
        if self.fault_every.is_some() {
            sensor.fault_every = self.fault_every;
        }
        if self.no_realtime {
            sensor.realtime = false;
        }

        config.sync_sampling_rate();
        Ok(config)
    }

    fn deadline(&self) -> Option<Instant> {
        (self.duration_secs > 0).then(|| Instant::now() + Duration::from_secs(self.duration_secs))
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // `init` also routes the core's `log` records into the subscriber
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}

fn expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|deadline| Instant::now() >= deadline)
}

/// Producer context: bring-up, then the acquisition loop
fn acquire(
    store: &SharedVitalsStore,
    acquisition: &AcquisitionConfig,
    sensor: SimulatedSensorConfig,
    started: &Barrier,
    running: &AtomicBool,
    deadline: Option<Instant>,
) -> Result<()> {
    let timers = SchedulerTimers {
        read: InstantTimer::new(),
        backoff: InstantTimer::new(),
    };
    let scheduler = bring_up(
        SyntheticSensor::new(sensor),
        &mut ThreadDelay,
        store,
        timers,
        acquisition,
    );

    // Release the consumer whether or not bring-up worked
    started.wait();
    let mut scheduler = scheduler.map_err(|error| {
        running.store(false, Ordering::Release);
        anyhow!("sensor bring-up failed: {error}")
    })?;

    while running.load(Ordering::Acquire) && !expired(deadline) {
        match scheduler.poll() {
            Ok(TickOutcome::Published(reading)) => {
                log::debug!("published {:?}", reading.snapshot());
            }
            Ok(TickOutcome::SaveSkipped(_)) => log::debug!("slot busy, reading dropped"),
            Ok(TickOutcome::SensorFault(error)) => log::warn!("sensor fault: {error}"),
            Ok(TickOutcome::Resumed) => log::info!("sensor reads resumed"),
            Err(nb::Error::WouldBlock) => thread::sleep(POLL_INTERVAL),
            Err(nb::Error::Other(never)) => match never {},
        }
    }

    log::info!(
        "acquisition stopped after {} sensor reads",
        scheduler.sensor_mut().reads()
    );
    running.store(false, Ordering::Release);
    Ok(())
}

/// Consumer context: one report line per report period
fn report(
    store: &SharedVitalsStore,
    acquisition: &AcquisitionConfig,
    started: &Barrier,
    running: &AtomicBool,
    deadline: Option<Instant>,
) {
    started.wait();

    let mut reporter = VitalsReporter::new(
        store,
        StdoutSink,
        InstantTimer::new(),
        acquisition.report_period(),
    );

    while running.load(Ordering::Acquire) && !expired(deadline) {
        match reporter.poll() {
            Ok(ReportOutcome::Sent(_)) => {}
            Ok(ReportOutcome::Busy(error)) => log::debug!("report skipped: {error}"),
            Ok(ReportOutcome::SinkFailed) => {
                log::error!("stdout closed, stopping");
                running.store(false, Ordering::Release);
            }
            Ok(ReportOutcome::Overflow) => log::warn!("report line overflowed"),
            Err(nb::Error::WouldBlock) => thread::sleep(POLL_INTERVAL),
            Err(nb::Error::Other(never)) => match never {},
        }
    }

    log::info!("reporter stopped at {}", reporter.uptime());
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = args.host_config()?;
    log::info!(
        "oximeter-sim {} (core {}): {:?}",
        env!("CARGO_PKG_VERSION"),
        oximeter_core::VERSION,
        config
    );

    let store = SharedVitalsStore::new();
    let started = Barrier::new(2);
    let running = AtomicBool::new(true);
    let deadline = args.deadline();

    let acquisition = thread::scope(|scope| {
        let producer = scope.spawn(|| {
            acquire(
                &store,
                &config.acquisition,
                config.sensor.clone(),
                &started,
                &running,
                deadline,
            )
        });

        report(&store, &config.acquisition, &started, &running, deadline);

        producer.join()
    });
    acquisition.map_err(|_| anyhow!("acquisition thread panicked"))??;

    let stats = store.stats();
    log::info!(
        "store: {} published, {} save conflicts, {} fetched, {} load conflicts",
        stats.published.load(Ordering::Relaxed),
        stats.save_conflicts.load(Ordering::Relaxed),
        stats.fetched.load(Ordering::Relaxed),
        stats.load_conflicts.load(Ordering::Relaxed),
    );
    Ok(())
}
