use anyhow::Context;
use archive::ResultArchive;
use chrono::{DateTime, Utc};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use workflow::config::{SourceKind, WorkflowConfig};
use workflow::runner::Runner;

mod archive;
mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Hydrogen-line observation driver")]
struct Args {
    /// Load a workflow config from YAML; flags below override it
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Samples per FFT block are 2^resolution
    #[arg(short = 'r', long)]
    resolution: Option<u32>,
    /// Blocks averaged into each spectrum
    #[arg(short = 'n', long)]
    num_fft: Option<usize>,
    /// Tuner sample rate in Hz
    #[arg(short = 's', long)]
    sample_rate: Option<f64>,
    /// Forward moving-average length applied to the SNR spectrum (0 disables)
    #[arg(short = 'm', long)]
    moving_average: Option<usize>,
    /// Tuner offset for the blank capture in Hz
    #[arg(long)]
    blank_offset: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    height: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    alt: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    az: Option<f64>,
    /// Observation start (RFC 3339); defaults to now
    #[arg(long)]
    time: Option<DateTime<Utc>>,
    /// Repeat the observation at a fixed pointing for one sidereal day
    #[arg(long = "24h", default_value_t = false)]
    sky_drift: bool,
    /// Earth rotation between repeated observations, in degrees
    #[arg(long)]
    degree_interval: Option<f64>,
    /// Directory receiving the JSON datafiles
    #[arg(long)]
    datafile_dir: Option<PathBuf>,
    /// File the observation summaries are appended to
    #[arg(long)]
    run_log: Option<PathBuf>,
    #[arg(long, value_enum)]
    source: Option<SourceKind>,
    #[arg(long)]
    seed: Option<u64>,
}

fn apply_overrides(config: &mut WorkflowConfig, args: &Args) {
    let spectrometer = &mut config.receiver.spectrometer;
    if let Some(resolution) = args.resolution {
        spectrometer.resolution = resolution;
    }
    if let Some(num_fft) = args.num_fft {
        spectrometer.number_of_fft = num_fft;
    }
    if let Some(rate) = args.sample_rate {
        spectrometer.sample_rate_hz = rate;
    }
    if let Some(length) = args.moving_average {
        config.calibration.moving_average = length;
    }
    if let Some(offset) = args.blank_offset {
        config.receiver.blank_offset_hz = offset;
    }
    if let Some(lat) = args.lat {
        config.observer.latitude_deg = lat;
    }
    if let Some(lon) = args.lon {
        config.observer.longitude_deg = lon;
    }
    if let Some(height) = args.height {
        config.observer.height_m = height;
    }
    if let Some(alt) = args.alt {
        config.pointing.altitude_deg = alt;
    }
    if let Some(az) = args.az {
        config.pointing.azimuth_deg = az;
    }
    if args.time.is_some() {
        config.observation.time = args.time;
    }
    if args.sky_drift {
        config.observation.sky_drift = true;
    }
    if let Some(interval) = args.degree_interval {
        config.observation.degree_interval = interval;
    }
    if args.datafile_dir.is_some() {
        config.observation.datafile_dir = args.datafile_dir.clone();
    }
    if args.run_log.is_some() {
        config.observation.run_log = args.run_log.clone();
    }
    if let Some(source) = args.source {
        config.synthetic.source = source;
    }
    if let Some(seed) = args.seed {
        config.synthetic.seed = seed;
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut workflow_config = if let Some(path) = args.workflow.as_ref() {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::default()
    };
    apply_overrides(&mut workflow_config, &args);
    info!(
        "observer at {:.4}, {:.4} pointing alt {:.2} az {:.2}",
        workflow_config.observer.latitude_deg,
        workflow_config.observer.longitude_deg,
        workflow_config.pointing.altitude_deg,
        workflow_config.pointing.azimuth_deg
    );

    let archive = ResultArchive::new(
        workflow_config.observation.datafile_dir.clone(),
        workflow_config.observation.run_log.clone(),
    );
    let runner = Runner::new(workflow_config);
    let result = runner.execute(&archive)?;

    let metrics = serde_json::to_string(&result.metrics).context("serializing run metrics")?;
    archive.publish_status(&format!(
        "{} observation(s) completed, metrics {}",
        result.records.len(),
        metrics
    ));
    Ok(())
}
