use crate::math::StatsHelper;
use crate::prelude::{
    CalibratedSpectrum, CalibrationConfig, FrequencyAxis, PipelineError, PipelineResult,
    PowerSpectrum,
};
use crate::processing::velocity::DopplerMapper;
use crate::telemetry::LogManager;

/// Jumps beyond this many standard deviations of the first differences mark a spike edge.
const SPIKE_EDGE_SIGMA: f64 = 5.0;
/// Bins replaced on each side of a detected spike.
const SPIKE_PAD_BINS: usize = 10;

/// Turns an on-source and a blank spectrum into an SNR spectrum.
pub struct Calibrator {
    config: CalibrationConfig,
    mapper: DopplerMapper,
    logger: LogManager,
}

impl Calibrator {
    pub fn new(config: &CalibrationConfig, mapper: DopplerMapper) -> PipelineResult<Self> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
            mapper,
            logger: LogManager::new("calibration"),
        })
    }

    pub fn calibrate(
        &self,
        on_source: &PowerSpectrum,
        off_source: &PowerSpectrum,
        axis: &FrequencyAxis,
    ) -> PipelineResult<CalibratedSpectrum> {
        if on_source.len() != off_source.len() {
            return Err(PipelineError::LengthMismatch {
                on_source: on_source.len(),
                off_source: off_source.len(),
            });
        }
        if axis.len() != on_source.len() {
            return Err(PipelineError::AxisMismatch {
                axis: axis.len(),
                spectrum: on_source.len(),
            });
        }
        first_non_finite(on_source, "on-source")?;
        first_non_finite(off_source, "off-source")?;

        let diff: Vec<f64> = on_source
            .values()
            .iter()
            .zip(off_source.values())
            .map(|(on, off)| on - off)
            .collect();

        let signal = self.mapper.window_mask(axis, self.config.window_km_s);
        let noise_floor_db = self.noise_floor(&diff, &signal)?;
        let mut snr: Vec<f64> = diff.iter().map(|v| v - noise_floor_db).collect();

        let mut spike_regions = 0;
        if self.config.remove_spikes {
            let (cleaned, regions) = remove_spikes(&snr);
            if regions > 0 {
                self.logger
                    .warn(&format!("replaced {} spike region(s) by interpolation", regions));
            }
            snr = cleaned;
            spike_regions = regions;
        }
        if self.config.slant_correction {
            snr = remove_slant(&snr);
        }
        if self.config.moving_average > 0 {
            snr = moving_average(&snr, self.config.moving_average);
        }

        self.logger.record(&format!(
            "calibrated {} bins, noise floor {:.3} dB",
            snr.len(),
            noise_floor_db
        ));
        Ok(CalibratedSpectrum::new(snr, noise_floor_db, spike_regions))
    }

    /// Mean difference over the bins outside the signal window.
    fn noise_floor(&self, diff: &[f64], signal: &[bool]) -> PipelineResult<f64> {
        let outside: Vec<f64> = diff
            .iter()
            .zip(signal)
            .filter(|(_, &inside)| !inside)
            .map(|(&v, _)| v)
            .collect();
        StatsHelper::mean(&outside).ok_or(PipelineError::EmptyNoiseRegion {
            window_km_s: self.config.window_km_s,
        })
    }
}

/// Fails on the first NaN or infinite bin; slant removal and smoothing would
/// otherwise spread it over the whole spectrum.
fn first_non_finite(spectrum: &PowerSpectrum, name: &'static str) -> PipelineResult<()> {
    match spectrum
        .values()
        .iter()
        .enumerate()
        .find(|(_, v)| !v.is_finite())
    {
        Some((bin, &value)) => Err(PipelineError::NonFiniteBin {
            spectrum: name,
            bin,
            value,
        }),
        None => Ok(()),
    }
}

/// Subtracts the least-squares line fitted against bin index.
pub fn remove_slant(data: &[f64]) -> Vec<f64> {
    match StatsHelper::linear_fit(data) {
        Some((slope, intercept)) => data
            .iter()
            .enumerate()
            .map(|(i, &y)| y - (intercept + slope * i as f64))
            .collect(),
        None => data.to_vec(),
    }
}

/// Forward moving average: each bin becomes the mean of itself and the next
/// `length - 1` bins. Near the end the window shrinks to the bins that remain.
pub fn moving_average(data: &[f64], length: usize) -> Vec<f64> {
    if length <= 1 {
        return data.to_vec();
    }
    let n = data.len();
    (0..n)
        .map(|i| {
            let window = &data[i..(i + length).min(n)];
            window.iter().sum::<f64>() / window.len() as f64
        })
        .collect()
}

/// Replaces narrow interference spikes by linear interpolation.
///
/// A rising edge is a bin-to-bin jump above `5σ` of all first differences, a
/// falling edge a drop below `-5σ`. Each rising edge is paired with the next
/// falling edge; the bins between them, padded by 10 on each side, are redrawn
/// as a straight line between the flanking bins. Returns the cleaned data and
/// the number of regions replaced.
pub fn remove_spikes(data: &[f64]) -> (Vec<f64>, usize) {
    let n = data.len();
    let mut cleaned = data.to_vec();
    if n < 3 {
        return (cleaned, 0);
    }

    let steps: Vec<f64> = data.windows(2).map(|w| w[1] - w[0]).collect();
    let threshold = match StatsHelper::std_dev(&steps) {
        Some(sigma) if sigma > 0.0 && sigma.is_finite() => SPIKE_EDGE_SIGMA * sigma,
        _ => return (cleaned, 0),
    };

    let mut regions = 0;
    let mut i = 0;
    while i < steps.len() {
        if steps[i] <= threshold {
            i += 1;
            continue;
        }
        let Some(fall) = (i + 1..steps.len()).find(|&j| steps[j] < -threshold) else {
            break;
        };
        let lo = (i + 1).saturating_sub(SPIKE_PAD_BINS);
        let hi = (fall + SPIKE_PAD_BINS).min(n - 1);
        interpolate_region(&mut cleaned, lo, hi);
        regions += 1;
        i = fall + 1;
    }
    (cleaned, regions)
}

/// Redraws `data[lo..=hi]` between the bins just outside the region.
fn interpolate_region(data: &mut [f64], lo: usize, hi: usize) {
    let left = lo.checked_sub(1).map(|i| (i, data[i]));
    let right = (hi + 1 < data.len()).then(|| (hi + 1, data[hi + 1]));
    match (left, right) {
        (Some((li, lv)), Some((ri, rv))) => {
            let slope = (rv - lv) / (ri - li) as f64;
            for (k, value) in data[lo..=hi].iter_mut().enumerate() {
                *value = lv + slope * (lo + k - li) as f64;
            }
        }
        (Some((_, v)), None) | (None, Some((_, v))) => {
            data[lo..=hi].iter_mut().for_each(|value| *value = v);
        }
        (None, None) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::HYDROGEN_REST_FREQ_HZ;

    const BINS: usize = 256;

    fn axis() -> FrequencyAxis {
        FrequencyAxis::linear(HYDROGEN_REST_FREQ_HZ, 2_400_000.0, BINS).unwrap()
    }

    fn raw_config() -> CalibrationConfig {
        CalibrationConfig {
            slant_correction: false,
            moving_average: 0,
            ..Default::default()
        }
    }

    fn ripple(offset: f64) -> Vec<f64> {
        (0..BINS)
            .map(|i| offset + 0.3 * (i as f64 * 0.37).sin() + 0.01 * i as f64)
            .collect()
    }

    #[test]
    fn identical_spectra_calibrate_to_zero() {
        let calibrator = Calibrator::new(&raw_config(), DopplerMapper::hydrogen()).unwrap();
        let spectrum = PowerSpectrum::new(ripple(-40.0), 1, 0);
        let result = calibrator.calibrate(&spectrum, &spectrum, &axis()).unwrap();
        assert_eq!(result.noise_floor_db(), 0.0);
        assert!(result.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn noise_region_mean_is_zero_after_shift() {
        let calibrator = Calibrator::new(&raw_config(), DopplerMapper::hydrogen()).unwrap();
        let on = PowerSpectrum::new(ripple(-40.0), 1, 0);
        let off = PowerSpectrum::new(vec![-43.0; BINS], 1, 0);
        let result = calibrator.calibrate(&on, &off, &axis()).unwrap();

        let signal = DopplerMapper::hydrogen().window_mask(&axis(), 120.0);
        let outside: Vec<f64> = result
            .values()
            .iter()
            .zip(&signal)
            .filter(|(_, &inside)| !inside)
            .map(|(&v, _)| v)
            .collect();
        assert!(StatsHelper::mean(&outside).unwrap().abs() < 1e-12);
        assert!(result.noise_floor_db() > 2.0);
    }

    #[test]
    fn mismatched_lengths_fail_fast() {
        let calibrator = Calibrator::new(&raw_config(), DopplerMapper::hydrogen()).unwrap();
        let on = PowerSpectrum::new(vec![0.0; BINS], 1, 0);
        let off = PowerSpectrum::new(vec![0.0; BINS - 1], 1, 0);
        let err = calibrator.calibrate(&on, &off, &axis()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::LengthMismatch {
                on_source: 256,
                off_source: 255
            }
        ));
    }

    #[test]
    fn axis_length_must_match() {
        let calibrator = Calibrator::new(&raw_config(), DopplerMapper::hydrogen()).unwrap();
        let spectrum = PowerSpectrum::new(vec![0.0; 128], 1, 0);
        let err = calibrator.calibrate(&spectrum, &spectrum, &axis()).unwrap_err();
        assert!(matches!(err, PipelineError::AxisMismatch { .. }));
    }

    #[test]
    fn window_covering_the_band_leaves_no_noise() {
        let config = CalibrationConfig {
            window_km_s: 10_000.0,
            ..raw_config()
        };
        let calibrator = Calibrator::new(&config, DopplerMapper::hydrogen()).unwrap();
        let spectrum = PowerSpectrum::new(vec![0.0; BINS], 1, 0);
        let err = calibrator.calibrate(&spectrum, &spectrum, &axis()).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyNoiseRegion { .. }));
    }

    #[test]
    fn single_nan_bin_is_reported_by_position() {
        let calibrator =
            Calibrator::new(&CalibrationConfig::default(), DopplerMapper::hydrogen()).unwrap();
        let mut on = ripple(-40.0);
        on[5] = f64::NAN;
        let on = PowerSpectrum::new(on, 1, 0);
        let off = PowerSpectrum::new(vec![-43.0; BINS], 1, 0);
        let err = calibrator.calibrate(&on, &off, &axis()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::NonFiniteBin {
                spectrum: "on-source",
                bin: 5,
                ..
            }
        ));
        assert!(err.to_string().contains("bin 5"));
    }

    #[test]
    fn infinite_blank_bin_is_rejected() {
        let calibrator = Calibrator::new(&raw_config(), DopplerMapper::hydrogen()).unwrap();
        let on = PowerSpectrum::new(ripple(-40.0), 1, 0);
        let mut off = vec![-43.0; BINS];
        off[200] = f64::NEG_INFINITY;
        let off = PowerSpectrum::new(off, 1, 0);
        let err = calibrator.calibrate(&on, &off, &axis()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::NonFiniteBin {
                spectrum: "off-source",
                bin: 200,
                ..
            }
        ));
    }

    #[test]
    fn enabled_spike_removal_counts_regions() {
        let config = CalibrationConfig {
            remove_spikes: true,
            ..raw_config()
        };
        let calibrator = Calibrator::new(&config, DopplerMapper::hydrogen()).unwrap();
        let mut on: Vec<f64> = (0..BINS).map(|i| 0.05 * (i as f64 * 0.9).sin()).collect();
        // interference well outside the ±120 km/s window
        for value in &mut on[30..33] {
            *value += 20.0;
        }
        let on = PowerSpectrum::new(on, 1, 0);
        let off = PowerSpectrum::new(vec![0.0; BINS], 1, 0);
        let result = calibrator.calibrate(&on, &off, &axis()).unwrap();
        assert_eq!(result.spike_regions(), 1);
        let floor = result.noise_floor_db();
        assert!(result.values().iter().all(|v| (v + floor).abs() < 0.1));
    }

    #[test]
    fn slant_removal_is_idempotent() {
        let data = ripple(2.0);
        let once = remove_slant(&data);
        let twice = remove_slant(&once);
        for (a, b) in once.iter().zip(&twice) {
            assert!((a - b).abs() < 1e-9);
        }
        let (slope, intercept) = StatsHelper::linear_fit(&once).unwrap();
        assert!(slope.abs() < 1e-12 && intercept.abs() < 1e-9);
    }

    #[test]
    fn slant_removal_flattens_a_line() {
        let line: Vec<f64> = (0..50).map(|i| 3.0 - 0.25 * i as f64).collect();
        assert!(remove_slant(&line).iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn moving_average_looks_forward() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(moving_average(&data, 2), vec![1.5, 2.5, 3.5, 4.5, 5.0]);
        assert_eq!(moving_average(&data, 3), vec![2.0, 3.0, 4.0, 4.5, 5.0]);
        assert_eq!(moving_average(&data, 1), data.to_vec());
    }

    #[test]
    fn narrow_spike_is_interpolated_away() {
        let mut data: Vec<f64> = (0..200).map(|i| 0.05 * (i as f64 * 0.9).sin()).collect();
        for value in &mut data[100..103] {
            *value += 20.0;
        }
        let (cleaned, regions) = remove_spikes(&data);
        assert_eq!(regions, 1);
        assert!(cleaned.iter().all(|v| v.abs() < 0.1));
        // bins far from the spike are untouched
        assert_eq!(cleaned[..89], data[..89]);
        assert_eq!(cleaned[113..], data[113..]);
    }

    #[test]
    fn flat_data_has_no_spikes() {
        let (cleaned, regions) = remove_spikes(&[1.0; 64]);
        assert_eq!(regions, 0);
        assert_eq!(cleaned, vec![1.0; 64]);
    }
}
