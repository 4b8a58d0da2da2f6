use crate::astrometry::ObservationGeometry;
use crate::prelude::{PipelineConfig, PipelineResult};
use serde::{Deserialize, Serialize};

/// Peak of the calibrated spectrum inside the search window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Rounded to 2 decimals.
    pub peak_snr_db: f64,
    /// Rounded to 2 decimals.
    pub radial_velocity_km_s: f64,
    pub peak_bin: usize,
    pub peak_frequency_hz: f64,
}

/// Barycentric and LSR corrections, each already rounded to 2 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VelocityCorrection {
    pub barycentric_km_s: f64,
    pub lsr_km_s: f64,
}

impl VelocityCorrection {
    /// `measured + barycentric + lsr`, summed in that order.
    pub fn apply(&self, measured_km_s: f64) -> f64 {
        measured_km_s + self.barycentric_km_s + self.lsr_km_s
    }
}

/// Spectra backing one observation, all sharing the frequency axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectraRecord {
    pub frequencies_hz: Vec<f64>,
    pub on_source_db: Vec<f64>,
    pub blank_db: Vec<f64>,
    pub snr_db: Vec<f64>,
}

/// Everything a result consumer needs from a completed observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub parameters: PipelineConfig,
    pub geometry: ObservationGeometry,
    pub analysis: AnalysisResult,
    pub correction: VelocityCorrection,
    pub corrected_velocity_km_s: f64,
    pub repaired_bins: usize,
    pub spectra: SpectraRecord,
}

impl ObservationRecord {
    pub fn to_json_pretty(&self) -> PipelineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        format!(
            "ra={:.2} dec={:.2} l={:.2} b={:.2} snr={:.2}dB measured={:.2}km/s bary={:.2} lsr={:.2} corrected={:.2}km/s",
            self.geometry.equatorial.ra_deg,
            self.geometry.equatorial.dec_deg,
            self.geometry.galactic.l_deg,
            self.geometry.galactic.b_deg,
            self.analysis.peak_snr_db,
            self.analysis.radial_velocity_km_s,
            self.correction.barycentric_km_s,
            self.correction.lsr_km_s,
            self.corrected_velocity_km_s
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correction_adds_in_order() {
        let correction = VelocityCorrection {
            barycentric_km_s: -12.34,
            lsr_km_s: 5.67,
        };
        assert_eq!(correction.apply(10.0), 10.0 + -12.34 + 5.67);
    }
}
