use crate::constants::round2;
use crate::interface::AnalysisResult;
use crate::prelude::{CalibratedSpectrum, FrequencyAxis, PipelineError, PipelineResult};
use crate::processing::velocity::DopplerMapper;

/// Finds the strongest SNR bin inside the velocity search window.
#[derive(Debug, Clone, Copy)]
pub struct PeakExtractor {
    mapper: DopplerMapper,
    window_km_s: f64,
}

impl PeakExtractor {
    pub fn new(mapper: DopplerMapper, window_km_s: f64) -> Self {
        Self {
            mapper,
            window_km_s,
        }
    }

    /// The first bin holding the maximum wins ties, so lower frequencies are
    /// preferred. NaN bins are skipped.
    pub fn extract(
        &self,
        spectrum: &CalibratedSpectrum,
        axis: &FrequencyAxis,
    ) -> PipelineResult<AnalysisResult> {
        if axis.len() != spectrum.len() {
            return Err(PipelineError::AxisMismatch {
                axis: axis.len(),
                spectrum: spectrum.len(),
            });
        }

        let signal = self.mapper.window_mask(axis, self.window_km_s);
        if !signal.iter().any(|&inside| inside) {
            let frequencies = axis.as_slice();
            return Err(PipelineError::EmptySearchWindow {
                window_km_s: self.window_km_s,
                low_hz: frequencies.first().copied().unwrap_or(f64::NAN),
                high_hz: frequencies.last().copied().unwrap_or(f64::NAN),
            });
        }

        let mut best: Option<(usize, f64)> = None;
        for (bin, (&value, &inside)) in spectrum.values().iter().zip(&signal).enumerate() {
            if !inside || value.is_nan() {
                continue;
            }
            match best {
                Some((_, top)) if value <= top => {}
                _ => best = Some((bin, value)),
            }
        }
        let (peak_bin, peak_snr) = best.ok_or_else(|| {
            PipelineError::NonFiniteSpectrum("SNR spectrum inside the search window".into())
        })?;

        let peak_frequency_hz = axis.as_slice()[peak_bin];
        Ok(AnalysisResult {
            peak_snr_db: round2(peak_snr),
            radial_velocity_km_s: round2(self.mapper.velocity_from_frequency(peak_frequency_hz)),
            peak_bin,
            peak_frequency_hz,
        })
    }
}
