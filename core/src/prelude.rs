use crate::constants::{
    DEFAULT_BLANK_OFFSET_HZ, DEFAULT_MOVING_AVERAGE, DEFAULT_NUMBER_OF_FFT, DEFAULT_RESOLUTION,
    DEFAULT_SAMPLE_RATE_HZ, DEFAULT_WINDOW_KM_S, HYDROGEN_REST_FREQ_HZ, MAX_RESOLUTION,
    SPEED_OF_LIGHT_KM_S,
};
use crate::interface::AcquisitionError;
use serde::{Deserialize, Serialize};

/// Taper applied to each block before the FFT.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowFunction {
    #[default]
    Rectangular,
    Hann,
}

/// Divisor applied to `|FFT|²` before conversion to dB.
///
/// Both variants appear in deployed revisions; they differ by a constant dB
/// offset that cancels in the on/off difference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PsdNormalization {
    /// `|FFT|² / FFT_SIZE²`
    #[default]
    FftSize,
    /// `|FFT|² / sample_rate²`
    SampleRate,
}

/// Parameters of the spectral estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrometerConfig {
    /// Samples per block are `2^resolution`.
    pub resolution: u32,
    /// Number of blocks averaged into one spectrum.
    pub number_of_fft: usize,
    pub sample_rate_hz: f64,
    pub window: WindowFunction,
    pub normalization: PsdNormalization,
}

impl Default for SpectrometerConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            number_of_fft: DEFAULT_NUMBER_OF_FFT,
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            window: WindowFunction::default(),
            normalization: PsdNormalization::default(),
        }
    }
}

impl SpectrometerConfig {
    pub fn fft_size(&self) -> usize {
        1usize << self.resolution
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.resolution == 0 || self.resolution > MAX_RESOLUTION {
            return Err(PipelineError::InvalidConfig(format!(
                "resolution {} outside 1..={} (FFT size must be a power of two)",
                self.resolution, MAX_RESOLUTION
            )));
        }
        if self.number_of_fft == 0 {
            return Err(PipelineError::InvalidConfig(
                "number_of_fft must be at least 1".into(),
            ));
        }
        if !self.sample_rate_hz.is_finite() || self.sample_rate_hz <= 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "sample rate {} Hz must be positive and finite",
                self.sample_rate_hz
            )));
        }
        Ok(())
    }
}

/// Parameters of the calibrator and of the peak search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Half-width of the signal window; bins outside it form the noise floor.
    pub window_km_s: f64,
    pub slant_correction: bool,
    /// Length of the forward moving average; 0 disables smoothing.
    pub moving_average: usize,
    pub remove_spikes: bool,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            window_km_s: DEFAULT_WINDOW_KM_S,
            slant_correction: true,
            moving_average: DEFAULT_MOVING_AVERAGE,
            remove_spikes: false,
        }
    }
}

impl CalibrationConfig {
    pub fn validate(&self) -> PipelineResult<()> {
        if !self.window_km_s.is_finite() || self.window_km_s <= 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "velocity window {} km/s must be positive and finite",
                self.window_km_s
            )));
        }
        Ok(())
    }
}

/// Complete configuration of one observation, validated once at pipeline entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub rest_frequency_hz: f64,
    /// Tuner offset used for the blank capture.
    pub blank_offset_hz: f64,
    pub spectrometer: SpectrometerConfig,
    pub calibration: CalibrationConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rest_frequency_hz: HYDROGEN_REST_FREQ_HZ,
            blank_offset_hz: DEFAULT_BLANK_OFFSET_HZ,
            spectrometer: SpectrometerConfig::default(),
            calibration: CalibrationConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> PipelineResult<()> {
        if !self.rest_frequency_hz.is_finite() || self.rest_frequency_hz <= 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "rest frequency {} Hz must be positive and finite",
                self.rest_frequency_hz
            )));
        }
        self.spectrometer.validate()?;
        self.calibration.validate()?;

        if !self.blank_offset_hz.is_finite() || self.blank_offset_hz == 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "blank offset {} Hz must be non-zero and finite",
                self.blank_offset_hz
            )));
        }
        let window_hz =
            self.calibration.window_km_s * self.rest_frequency_hz / SPEED_OF_LIGHT_KM_S;
        if self.blank_offset_hz.abs() <= window_hz {
            return Err(PipelineError::InvalidConfig(format!(
                "blank offset {} Hz keeps the line inside the ±{:.0} Hz signal window",
                self.blank_offset_hz, window_hz
            )));
        }
        Ok(())
    }
}

/// Frequency of every bin, strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyAxis {
    frequencies_hz: Vec<f64>,
}

impl FrequencyAxis {
    /// `bins` points linearly spaced from `center - span/2` to `center + span/2`,
    /// both ends included.
    pub fn linear(center_hz: f64, span_hz: f64, bins: usize) -> PipelineResult<Self> {
        if bins < 2 {
            return Err(PipelineError::InvalidConfig(format!(
                "frequency axis needs at least 2 bins, got {}",
                bins
            )));
        }
        if !span_hz.is_finite() || span_hz <= 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "frequency span {} Hz must be positive and finite",
                span_hz
            )));
        }
        let start = center_hz - span_hz / 2.0;
        let stop = center_hz + span_hz / 2.0;
        let step = (stop - start) / (bins - 1) as f64;
        let mut frequencies_hz: Vec<f64> = (0..bins).map(|i| start + i as f64 * step).collect();
        frequencies_hz[bins - 1] = stop;
        Ok(Self { frequencies_hz })
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.frequencies_hz
    }

    pub fn len(&self) -> usize {
        self.frequencies_hz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies_hz.is_empty()
    }
}

/// Averaged power spectrum in dB, lowest frequency first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerSpectrum {
    power_db: Vec<f64>,
    blocks_averaged: usize,
    repaired_bins: usize,
}

impl PowerSpectrum {
    pub fn new(power_db: Vec<f64>, blocks_averaged: usize, repaired_bins: usize) -> Self {
        Self {
            power_db,
            blocks_averaged,
            repaired_bins,
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.power_db
    }

    pub fn len(&self) -> usize {
        self.power_db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.power_db.is_empty()
    }

    pub fn blocks_averaged(&self) -> usize {
        self.blocks_averaged
    }

    /// Zero-power bins repaired across all averaged blocks.
    pub fn repaired_bins(&self) -> usize {
        self.repaired_bins
    }
}

/// SNR spectrum in dB relative to the estimated noise floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibratedSpectrum {
    snr_db: Vec<f64>,
    noise_floor_db: f64,
    spike_regions: usize,
}

impl CalibratedSpectrum {
    pub fn new(snr_db: Vec<f64>, noise_floor_db: f64, spike_regions: usize) -> Self {
        Self {
            snr_db,
            noise_floor_db,
            spike_regions,
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.snr_db
    }

    pub fn len(&self) -> usize {
        self.snr_db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snr_db.is_empty()
    }

    /// Mean on/off difference removed from every bin.
    pub fn noise_floor_db(&self) -> f64 {
        self.noise_floor_db
    }

    pub fn spike_regions(&self) -> usize {
        self.spike_regions
    }
}

/// Common error type for the observation pipeline.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("spectrum length mismatch: on-source {on_source} bins, off-source {off_source} bins")]
    LengthMismatch { on_source: usize, off_source: usize },
    #[error("frequency axis has {axis} bins but spectrum has {spectrum}")]
    AxisMismatch { axis: usize, spectrum: usize },
    #[error("±{window_km_s} km/s search window selects no bins between {low_hz:.0} Hz and {high_hz:.0} Hz")]
    EmptySearchWindow {
        window_km_s: f64,
        low_hz: f64,
        high_hz: f64,
    },
    #[error("±{window_km_s} km/s window leaves no noise-floor bins")]
    EmptyNoiseRegion { window_km_s: f64 },
    #[error("no finite values in {0}")]
    NonFiniteSpectrum(String),
    #[error("{spectrum} spectrum has non-finite value {value} at bin {bin}")]
    NonFiniteBin {
        spectrum: &'static str,
        bin: usize,
        value: f64,
    },
    #[error("acquisition failed: {0}")]
    Acquisition(#[from] AcquisitionError),
    #[error("ephemeris failure: {0}")]
    Ephemeris(String),
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::LEGACY_BLANK_OFFSET_HZ;

    #[test]
    fn default_config_is_valid() {
        PipelineConfig::default().validate().unwrap();
        assert_eq!(SpectrometerConfig::default().fft_size(), 2048);
    }

    #[test]
    fn zero_repeat_count_is_rejected() {
        let config = SpectrometerConfig {
            number_of_fft: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("number_of_fft"));
    }

    #[test]
    fn out_of_range_resolution_is_rejected() {
        for resolution in [0, MAX_RESOLUTION + 1] {
            let config = SpectrometerConfig {
                resolution,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(PipelineError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn blank_offset_inside_window_is_rejected() {
        let config = PipelineConfig {
            blank_offset_hz: 100_000.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn both_historical_blank_offsets_are_accepted() {
        for blank_offset_hz in [DEFAULT_BLANK_OFFSET_HZ, LEGACY_BLANK_OFFSET_HZ, -3_000_000.0] {
            let config = PipelineConfig {
                blank_offset_hz,
                ..Default::default()
            };
            config.validate().unwrap();
        }
    }

    #[test]
    fn linear_axis_spans_both_ends() {
        let axis = FrequencyAxis::linear(1000.0, 100.0, 5).unwrap();
        assert_eq!(axis.as_slice(), &[950.0, 975.0, 1000.0, 1025.0, 1050.0]);
        assert!(axis.as_slice().windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"blank_offset_hz": 3000000.0}"#).unwrap();
        assert_eq!(config.blank_offset_hz, 3_000_000.0);
        assert_eq!(config.spectrometer.resolution, DEFAULT_RESOLUTION);
        assert_eq!(config.calibration.window_km_s, DEFAULT_WINDOW_KM_S);
    }
}
