use crate::interface::{AcquisitionError, SampleSource};
use crate::math::{fft_shift, FftHelper};
use crate::prelude::{
    FrequencyAxis, PipelineResult, PowerSpectrum, PsdNormalization, SpectrometerConfig,
    WindowFunction,
};
use crate::telemetry::LogManager;
use num_complex::Complex64;
use std::f64::consts::PI;

/// Averages repeated power spectra of raw sample blocks into one spectrum in dB.
pub struct SpectralEstimator {
    config: SpectrometerConfig,
    fft: FftHelper,
    window: Option<Vec<f64>>,
    logger: LogManager,
}

impl SpectralEstimator {
    pub fn new(config: &SpectrometerConfig) -> PipelineResult<Self> {
        config.validate()?;
        let size = config.fft_size();
        let window = match config.window {
            WindowFunction::Rectangular => None,
            WindowFunction::Hann => Some(hann_window(size)),
        };
        Ok(Self {
            config: config.clone(),
            fft: FftHelper::new(size),
            window,
            logger: LogManager::new("spectrum"),
        })
    }

    pub fn fft_size(&self) -> usize {
        self.fft.size()
    }

    /// Frequency of every bin for a receiver centred on `center_hz`.
    ///
    /// Depends only on the configuration, never on captured data.
    pub fn frequency_axis(&self, center_hz: f64) -> PipelineResult<FrequencyAxis> {
        FrequencyAxis::linear(center_hz, self.config.sample_rate_hz, self.fft_size())
    }

    /// Reads `number_of_fft` blocks from `source` and averages their dB spectra.
    pub fn estimate<S: SampleSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> PipelineResult<PowerSpectrum> {
        let size = self.fft_size();
        let blocks = self.config.number_of_fft;
        let mut accumulated = vec![0.0; size];
        let mut repaired_total = 0;

        for block_index in 0..blocks {
            let block = source.read_block(size)?;
            let (power_db, repaired) = self.block_power_db(&block)?;
            if repaired == size {
                self.logger.warn(&format!(
                    "block {} carried no power in any bin; every bin was floored",
                    block_index
                ));
            } else if repaired > 0 {
                self.logger.warn(&format!(
                    "dropped samples recovered in block {}: {} bin(s) repaired",
                    block_index, repaired
                ));
            }
            repaired_total += repaired;
            for (acc, value) in accumulated.iter_mut().zip(power_db) {
                *acc += value;
            }
        }

        let divisor = blocks as f64;
        accumulated.iter_mut().for_each(|v| *v /= divisor);
        self.logger.record(&format!(
            "averaged {} blocks of {} samples at {:.0} Hz ({} repaired bins)",
            blocks,
            size,
            source.center_frequency(),
            repaired_total
        ));

        Ok(PowerSpectrum::new(accumulated, blocks, repaired_total))
    }

    /// Power spectrum of one block in dB, lowest frequency first.
    ///
    /// Returns the spectrum and the number of zero bins that were repaired.
    pub fn block_power_db(&mut self, block: &[Complex64]) -> PipelineResult<(Vec<f64>, usize)> {
        let size = self.fft_size();
        if block.len() != size {
            return Err(AcquisitionError::ShortRead {
                expected: size,
                actual: block.len(),
            }
            .into());
        }

        let buffer = match &self.window {
            Some(window) => {
                let mut windowed: Vec<Complex64> =
                    block.iter().zip(window).map(|(s, w)| *s * *w).collect();
                self.fft.forward_inplace(&mut windowed);
                windowed
            }
            None => self.fft.forward(block),
        };

        let divisor = match self.config.normalization {
            PsdNormalization::FftSize => size as f64,
            PsdNormalization::SampleRate => self.config.sample_rate_hz,
        };
        let mut psd: Vec<f64> = buffer
            .iter()
            .map(|c| c.norm_sqr() / (divisor * divisor))
            .collect();
        let repaired = repair_dropped_bins(&mut psd);

        let mut power_db: Vec<f64> = psd.iter().map(|&p| 10.0 * p.log10()).collect();
        fft_shift(&mut power_db);
        Ok((power_db, repaired))
    }
}

/// Symmetric Hann window, zero at both ends.
pub fn hann_window(size: usize) -> Vec<f64> {
    if size < 2 {
        return vec![1.0; size];
    }
    let denom = (size - 1) as f64;
    (0..size)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / denom).cos())
        .collect()
}

/// Replaces every exactly-zero bin with the mean of its circular neighbours.
///
/// Neighbours are taken from the unrepaired spectrum. A bin whose neighbours
/// are zero too falls back to the smallest positive power in the block, or to
/// `f64::MIN_POSITIVE` when the block carries no power at all, so the dB
/// conversion never yields `-inf`. Returns the number of repaired bins.
pub fn repair_dropped_bins(psd: &mut [f64]) -> usize {
    let n = psd.len();
    let zeros: Vec<usize> = (0..n).filter(|&i| psd[i] == 0.0).collect();
    if zeros.is_empty() {
        return 0;
    }

    let floor = psd
        .iter()
        .copied()
        .filter(|&p| p > 0.0)
        .fold(f64::INFINITY, f64::min);
    let floor = if floor.is_finite() {
        floor
    } else {
        f64::MIN_POSITIVE
    };

    let repaired: Vec<f64> = zeros
        .iter()
        .map(|&i| {
            let left = psd[(i + n - 1) % n];
            let right = psd[(i + 1) % n];
            let mean = (left + right) / 2.0;
            if mean > 0.0 {
                mean
            } else {
                floor
            }
        })
        .collect();
    for (&i, value) in zeros.iter().zip(repaired) {
        psd[i] = value;
    }
    zeros.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::RawSampleBlock;

    struct ReplaySource {
        blocks: Vec<RawSampleBlock>,
        next: usize,
        center: f64,
    }

    impl ReplaySource {
        fn new(blocks: Vec<RawSampleBlock>) -> Self {
            Self {
                blocks,
                next: 0,
                center: 0.0,
            }
        }
    }

    impl SampleSource for ReplaySource {
        fn read_block(&mut self, _size: usize) -> Result<RawSampleBlock, AcquisitionError> {
            let block = self.blocks[self.next % self.blocks.len()].clone();
            self.next += 1;
            Ok(block)
        }

        fn set_center_frequency(&mut self, frequency_hz: f64) -> Result<(), AcquisitionError> {
            self.center = frequency_hz;
            Ok(())
        }

        fn center_frequency(&self) -> f64 {
            self.center
        }
    }

    fn config(resolution: u32, number_of_fft: usize) -> SpectrometerConfig {
        SpectrometerConfig {
            resolution,
            number_of_fft,
            sample_rate_hz: 2_400_000.0,
            ..Default::default()
        }
    }

    fn tone(size: usize, bin: usize, amplitude: f64) -> RawSampleBlock {
        (0..size)
            .map(|n| Complex64::from_polar(amplitude, 2.0 * PI * (bin * n) as f64 / size as f64))
            .collect()
    }

    #[test]
    fn zero_bin_takes_mean_of_neighbours() {
        let mut psd = vec![4.0, 0.0, 2.0];
        assert_eq!(repair_dropped_bins(&mut psd), 1);
        assert_eq!(psd, vec![4.0, 3.0, 2.0]);
    }

    #[test]
    fn all_zero_block_is_floored_not_infinite() {
        let mut psd = vec![0.0; 8];
        assert_eq!(repair_dropped_bins(&mut psd), 8);
        assert!(psd.iter().all(|&p| p > 0.0));
        assert!(psd.iter().all(|&p| (10.0 * p.log10()).is_finite()));
    }

    #[test]
    fn repair_uses_unrepaired_neighbours() {
        let mut psd = vec![1.0, 0.0, 0.0, 5.0];
        repair_dropped_bins(&mut psd);
        // both zero bins see one zero neighbour
        assert_eq!(psd, vec![1.0, 0.5, 2.5, 5.0]);
    }

    #[test]
    fn zero_repeat_count_fails_fast() {
        assert!(SpectralEstimator::new(&config(4, 0)).is_err());
    }

    #[test]
    fn tone_lands_at_its_shifted_bin() {
        let size = 16;
        let block: RawSampleBlock = tone(size, 3, 1.0)
            .iter()
            .zip(tone(size, 5, 0.1))
            .map(|(a, b)| *a + b)
            .collect();
        let mut estimator = SpectralEstimator::new(&config(4, 1)).unwrap();
        let (power_db, repaired) = estimator.block_power_db(&block).unwrap();
        assert!(power_db.iter().all(|v| v.is_finite()));
        let peak = power_db
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
        // bin 3 moves to 3 + 8 after the shift; |N|²/N² = 1 -> 0 dB
        assert_eq!(peak.0, 11);
        assert!(peak.1.abs() < 1e-9);
        assert!(repaired <= size - 1);
    }

    #[test]
    fn sample_rate_normalisation_offsets_by_constant() {
        let block = tone(16, 2, 1.0);
        let mut by_size = SpectralEstimator::new(&config(4, 1)).unwrap();
        let mut by_rate = SpectralEstimator::new(&SpectrometerConfig {
            normalization: PsdNormalization::SampleRate,
            ..config(4, 1)
        })
        .unwrap();
        let (a, _) = by_size.block_power_db(&block).unwrap();
        let (b, _) = by_rate.block_power_db(&block).unwrap();
        let expected = 20.0 * (2_400_000.0_f64 / 16.0).log10();
        let peak = 10;
        assert!((a[peak] - b[peak] - expected).abs() < 1e-9);
    }

    #[test]
    fn averaging_divides_by_block_count() {
        let size = 16;
        let blocks = vec![tone(size, 1, 1.0), tone(size, 1, 2.0)];
        let mut estimator = SpectralEstimator::new(&config(4, 2)).unwrap();
        let spectrum = estimator.estimate(&mut ReplaySource::new(blocks)).unwrap();
        assert_eq!(spectrum.len(), size);
        assert_eq!(spectrum.blocks_averaged(), 2);
        // (0 dB + 6.02 dB) / 2
        let expected = (0.0 + 20.0 * 2.0_f64.log10()) / 2.0;
        assert!((spectrum.values()[9] - expected).abs() < 1e-9);
    }

    #[test]
    fn short_block_is_an_acquisition_error() {
        let mut estimator = SpectralEstimator::new(&config(4, 1)).unwrap();
        let err = estimator
            .estimate(&mut ReplaySource::new(vec![tone(8, 1, 1.0)]))
            .unwrap_err();
        assert!(err.to_string().contains("short read"));
    }

    #[test]
    fn hann_window_is_symmetric_and_zero_at_edges() {
        let window = hann_window(8);
        assert_eq!(window[0], 0.0);
        assert!(window[7].abs() < 1e-15);
        assert!((window[2] - window[5]).abs() < 1e-15);
    }

    #[test]
    fn hann_windowed_tone_keeps_its_bin() {
        let size = 64;
        let mut estimator = SpectralEstimator::new(&SpectrometerConfig {
            window: WindowFunction::Hann,
            ..config(6, 2)
        })
        .unwrap();
        let spectrum = estimator
            .estimate(&mut ReplaySource::new(vec![tone(size, 5, 1.0)]))
            .unwrap();
        let values = spectrum.values();
        assert!(values.iter().all(|v| v.is_finite()));
        let peak = values
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
        assert_eq!(peak.0, 5 + size / 2);
        // coherent gain of a Hann window is about one half
        assert!(peak.1 < -5.5 && peak.1 > -6.5, "peak {} dB", peak.1);
    }

    #[test]
    fn frequency_axis_centres_on_requested_frequency() {
        let estimator = SpectralEstimator::new(&config(10, 1)).unwrap();
        let axis = estimator.frequency_axis(1_420_405_750.0).unwrap();
        assert_eq!(axis.len(), 1024);
        assert_eq!(axis.as_slice()[0], 1_420_405_750.0 - 1_200_000.0);
        assert_eq!(axis.as_slice()[1023], 1_420_405_750.0 + 1_200_000.0);
    }
}
