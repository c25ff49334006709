//! # Rain Gauge Application Entry Point
//!
//! This binary wires the sensor input, the pulse sampler and the periodic reporter
//! together and keeps them running until one of them fails.
//! It supports both production mode (GPIO relay input, values in /dev/shm) and
//! simulation mode (scripted rain shower, values logged through tracing).


#[cfg(all(target_os = "linux", feature = "hardware"))]
mod gpio_cdev;

use anyhow::Context;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rain_gauge_lib::classifier::PulseClassifier;
use rain_gauge_lib::clock::{Clock, SystemClock};
use rain_gauge_lib::config::Config;
use rain_gauge_lib::counter::SharedCounterState;
use rain_gauge_lib::edge_timer::EdgeTimer;
use rain_gauge_lib::input::{BinaryInputSource, Level, ScriptedSensor};
use rain_gauge_lib::publisher::{LogPublisher, ValuePublisher};
use rain_gauge_lib::reporter::ReportingTask;
use rain_gauge_lib::sampler::PulseSampler;

/// Report period used by `--simulate`, short enough to watch the history fill
const SIMULATED_REPORT_PERIOD: Duration = Duration::from_secs(5);

/// A light shower followed by a dry spell, in (level, microseconds)
fn simulated_shower() -> Vec<(Level, u64)> {
    vec![
        (Level::Low, 700_000),
        (Level::High, 380_000), // two drops
        (Level::Low, 1_200_000),
        (Level::High, 40_000), // relay bounce
        (Level::Low, 900_000),
        (Level::High, 150_000), // accepted, no whole drop
        (Level::Low, 800_000),
        (Level::High, 600_000), // three drops
        (Level::Low, 12_000_000),
    ]
}

/// Run the sampler on a blocking thread and the reporter on the runtime until
/// either of them returns. Both only ever return an error.
fn run_tasks<S, C>(
    rt: Runtime,
    sampler: PulseSampler<S, C>,
    reporter: ReportingTask,
    period: Duration,
) -> anyhow::Result<()>
where
    S: BinaryInputSource + Send + 'static,
    C: Clock + Send + 'static,
{
    let result: anyhow::Result<()> = rt.block_on(async move {
        let sampling = tokio::task::spawn_blocking(move || sampler.run());
        let reporting = tokio::spawn(reporter.run(period));

        tokio::select! {
            res = sampling => match res.context("pulse sampler task panicked")? {
                Ok(never) => match never {},
                Err(e) => Err(anyhow::Error::new(e).context("pulse sampler stopped")),
            },
            res = reporting => match res.context("reporting task panicked")? {
                Ok(never) => match never {},
                Err(e) => Err(anyhow::Error::new(e).context("reporting task stopped")),
            },
        }
    });

    // The sampler thread may still be blocked on the sensor; don't wait for it
    rt.shutdown_background();
    result
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse command line arguments
    // Simulation mode: scripted sensor for testing without hardware
    let args: Vec<String> = env::args().collect();
    let simulate = args.iter().any(|arg| arg == "--simulate");
    let config = match args.iter().position(|arg| arg == "--config") {
        Some(i) => Config::load_from_path(args.get(i + 1).context("--config needs a path")?),
        None => Config::load(),
    };
    config.validate()?;

    // Create Tokio runtime for the reporting timer and the sampler thread
    let rt = Runtime::new().context("create tokio runtime")?;

    let counters = SharedCounterState::new();
    let classifier = PulseClassifier::new(config.sensor.pulse_unit_micros);

    if simulate {
        info!("simulation mode: replaying a scripted rain shower");
        let publisher: Arc<dyn ValuePublisher> = Arc::new(LogPublisher);
        let sensor = ScriptedSensor::repeating(SystemClock, simulated_shower());
        let timer = EdgeTimer::new(sensor, SystemClock, config.poll_interval());
        let sampler = PulseSampler::new(timer, classifier, counters.clone(), publisher.clone());
        let reporter = ReportingTask::new(counters, classifier, publisher);
        return run_tasks(rt, sampler, reporter, SIMULATED_REPORT_PERIOD);
    }

    // Production mode: relay on a GPIO line, values in shared memory
    // This section requires GPIO permissions
    #[cfg(all(target_os = "linux", feature = "hardware"))]
    {
        use crate::gpio_cdev::CdevInput;
        use rain_gauge_lib::publisher::ShmPublisher;

        info!(
            chip = %config.sensor.gpio_chip,
            pin = config.sensor.pin,
            pulse_unit_micros = config.sensor.pulse_unit_micros,
            poll_interval_ms = config.sensor.poll_interval_ms,
            report_interval_secs = config.reporting.interval_secs,
            shm_dir = %config.publish.shm_dir,
            "starting rain sensor"
        );

        let input = CdevInput::new(&config.sensor.gpio_chip, config.sensor.pin)
            .context("open rain sensor line")?;
        let publisher: Arc<dyn ValuePublisher> =
            Arc::new(ShmPublisher::new(&config.publish.shm_dir));
        let timer = EdgeTimer::new(input, SystemClock, config.poll_interval());
        let sampler = PulseSampler::new(timer, classifier, counters.clone(), publisher.clone());
        let reporter = ReportingTask::new(counters, classifier, publisher);

        let result = run_tasks(rt, sampler, reporter, config.report_interval());
        if let Err(e) = &result {
            error!("{e:#}");
        }
        result
    }

    #[cfg(not(all(target_os = "linux", feature = "hardware")))]
    {
        drop(rt);
        error!("GPIO support not enabled. Rebuild with --features hardware on Linux, or use --simulate.");
        Err(anyhow::anyhow!(
            "Hardware mode not supported in this build"
        ))
    }
}
