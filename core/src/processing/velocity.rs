use crate::constants::{HYDROGEN_REST_FREQ_HZ, SPEED_OF_LIGHT_KM_S};
use crate::prelude::FrequencyAxis;
use serde::{Deserialize, Serialize};

/// Non-relativistic conversion between frequency and radial velocity,
/// anchored to a rest frequency.
///
/// `v = c (f - f_rest) / f_rest`; the two directions are exact inverses up to
/// floating-point rounding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DopplerMapper {
    rest_frequency_hz: f64,
}

impl Default for DopplerMapper {
    fn default() -> Self {
        Self::hydrogen()
    }
}

impl DopplerMapper {
    pub fn new(rest_frequency_hz: f64) -> Self {
        Self { rest_frequency_hz }
    }

    pub fn hydrogen() -> Self {
        Self::new(HYDROGEN_REST_FREQ_HZ)
    }

    pub fn rest_frequency_hz(&self) -> f64 {
        self.rest_frequency_hz
    }

    pub fn velocity_from_frequency(&self, frequency_hz: f64) -> f64 {
        SPEED_OF_LIGHT_KM_S * (frequency_hz - self.rest_frequency_hz) / self.rest_frequency_hz
    }

    pub fn frequency_from_velocity(&self, velocity_km_s: f64) -> f64 {
        self.rest_frequency_hz + velocity_km_s * self.rest_frequency_hz / SPEED_OF_LIGHT_KM_S
    }

    /// `true` for every bin whose velocity lies within `±half_width_km_s`.
    ///
    /// The same mask splits signal from noise floor in the calibrator and
    /// bounds the peak search, so both agree on the signal region.
    pub fn window_mask(&self, axis: &FrequencyAxis, half_width_km_s: f64) -> Vec<bool> {
        axis.as_slice()
            .iter()
            .map(|&f| self.velocity_from_frequency(f).abs() <= half_width_km_s)
            .collect()
    }
}
