use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use hlinecore::constants::{
    DEFAULT_BLANK_OFFSET_HZ, HYDROGEN_REST_FREQ_HZ, SUPPORTED_SAMPLE_RATES_HZ,
};
use hlinecore::prelude::{CalibrationConfig, PipelineConfig, SpectrometerConfig};
use hlinecore::{ObserverLocation, Pointing};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Receiver and spectrometer settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    pub rest_frequency_hz: f64,
    pub blank_offset_hz: f64,
    #[serde(flatten)]
    pub spectrometer: SpectrometerConfig,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            rest_frequency_hz: HYDROGEN_REST_FREQ_HZ,
            blank_offset_hz: DEFAULT_BLANK_OFFSET_HZ,
            spectrometer: SpectrometerConfig::default(),
        }
    }
}

/// When and how often to observe, and where results go.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservationPlan {
    /// Start of the first observation; the current time when absent.
    pub time: Option<DateTime<Utc>>,
    /// Repeat at a fixed pointing for one sidereal day.
    pub sky_drift: bool,
    /// Earth rotation between repeated observations, in degrees.
    pub degree_interval: f64,
    /// Directory receiving one JSON datafile per observation.
    pub datafile_dir: Option<PathBuf>,
    /// File the one-line summaries are appended to.
    pub run_log: Option<PathBuf>,
}

impl Default for ObservationPlan {
    fn default() -> Self {
        Self {
            time: None,
            sky_drift: false,
            degree_interval: 5.0,
            datafile_dir: None,
            run_log: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Noise plus a Gaussian hydrogen line.
    #[default]
    Synthetic,
    /// Constant blocks, one value on source and another on the blank.
    Constant,
}

/// Stand-in receiver used instead of hardware.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub source: SourceKind,
    pub seed: u64,
    /// Peak amplitude of the uniform noise on each quadrature component.
    pub noise_amplitude: f64,
    /// Total amplitude of the line components.
    pub line_amplitude: f64,
    /// Radial velocity of the simulated gas, in the mapper's sign convention.
    pub line_velocity_km_s: f64,
    /// Gaussian sigma of the line profile.
    pub line_width_km_s: f64,
    /// Tones used to draw the line profile.
    pub line_components: usize,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Synthetic,
            seed: 0,
            noise_amplitude: 0.1,
            line_amplitude: 0.05,
            line_velocity_km_s: -25.0,
            line_width_km_s: 8.0,
            line_components: 9,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub receiver: ReceiverConfig,
    pub calibration: CalibrationConfig,
    pub observer: ObserverLocation,
    pub pointing: Pointing,
    pub observation: ObservationPlan,
    pub synthetic: SyntheticConfig,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            receiver: ReceiverConfig::default(),
            calibration: CalibrationConfig::default(),
            observer: ObserverLocation::new(0.0, 0.0, 0.0),
            pointing: Pointing::new(90.0, 0.0),
            observation: ObservationPlan::default(),
            synthetic: SyntheticConfig::default(),
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn to_pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            rest_frequency_hz: self.receiver.rest_frequency_hz,
            blank_offset_hz: self.receiver.blank_offset_hz,
            spectrometer: self.receiver.spectrometer.clone(),
            calibration: self.calibration.clone(),
        }
    }

    /// Checks the driver-only settings; the pipeline validates the rest.
    pub fn validate(&self) -> anyhow::Result<()> {
        let interval = self.observation.degree_interval;
        if self.observation.sky_drift && !(interval > 0.0 && interval <= 360.0) {
            bail!("degree interval {} outside (0, 360]", interval);
        }
        if self.synthetic.line_components == 0 {
            bail!("synthetic line needs at least one component");
        }
        Ok(())
    }

    /// `true` when the sample rate is one a typical RTL tuner delivers cleanly.
    pub fn sample_rate_supported(&self) -> bool {
        let rate = self.receiver.spectrometer.sample_rate_hz;
        SUPPORTED_SAMPLE_RATES_HZ
            .iter()
            .any(|&supported| (supported - rate).abs() < 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hlinecore::prelude::PsdNormalization;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_build_a_valid_pipeline_config() {
        let cfg = WorkflowConfig::default();
        cfg.validate().unwrap();
        cfg.to_pipeline_config().validate().unwrap();
        assert!(cfg.sample_rate_supported());
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"receiver:\n  resolution: 10\n  number_of_fft: 5\n  normalization: sample_rate\n  blank_offset_hz: 3000000.0\n\
observer:\n  latitude_deg: 55.68\n  longitude_deg: 12.57\n  height_m: 10.0\n\
pointing:\n  altitude_deg: 45.0\n  azimuth_deg: 180.0\n\
observation:\n  sky_drift: true\n  degree_interval: 15.0\n\
synthetic:\n  source: constant\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.receiver.spectrometer.resolution, 10);
        assert_eq!(cfg.receiver.spectrometer.number_of_fft, 5);
        assert_eq!(
            cfg.receiver.spectrometer.normalization,
            PsdNormalization::SampleRate
        );
        assert_eq!(cfg.receiver.blank_offset_hz, 3_000_000.0);
        assert_eq!(cfg.observer.latitude_deg, 55.68);
        assert_eq!(cfg.pointing.azimuth_deg, 180.0);
        assert!(cfg.observation.sky_drift);
        assert_eq!(cfg.synthetic.source, SourceKind::Constant);
        // untouched sections keep their defaults
        assert_eq!(cfg.calibration, CalibrationConfig::default());
        assert_eq!(cfg.receiver.rest_frequency_hz, HYDROGEN_REST_FREQ_HZ);
    }

    #[test]
    fn malformed_yaml_reports_the_path() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"receiver: [not, a, map]\n").unwrap();
        let path = temp.into_temp_path();
        let err = WorkflowConfig::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("parsing workflow config"));
    }

    #[test]
    fn zero_degree_interval_is_rejected_for_sky_drift() {
        let mut cfg = WorkflowConfig::default();
        cfg.observation.sky_drift = true;
        cfg.observation.degree_interval = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unusual_sample_rate_is_flagged() {
        let mut cfg = WorkflowConfig::default();
        cfg.receiver.spectrometer.sample_rate_hz = 2_500_000.0;
        assert!(!cfg.sample_rate_supported());
    }
}
