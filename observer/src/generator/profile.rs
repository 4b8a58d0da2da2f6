use crate::workflow::config::SyntheticConfig;
use hlinecore::interface::{AcquisitionError, RawSampleBlock, SampleSource};
use hlinecore::processing::DopplerMapper;
use num_complex::Complex64;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::f64::consts::PI;

/// One tone of the simulated line profile, in absolute frequency.
#[derive(Debug, Clone, Copy)]
struct LineComponent {
    frequency_hz: f64,
    amplitude: f64,
}

/// Receiver stand-in producing uniform noise plus a Gaussian hydrogen line.
///
/// The line is drawn as a comb of tones with Gaussian weights and a fresh
/// random phase per block, so it averages like an incoherent emission line.
/// It shows up only while the line frequency falls inside the tuned band.
pub struct SyntheticReceiver {
    rng: StdRng,
    sample_rate_hz: f64,
    center_hz: f64,
    noise_amplitude: f64,
    components: Vec<LineComponent>,
}

impl SyntheticReceiver {
    pub fn new(config: &SyntheticConfig, mapper: DopplerMapper, sample_rate_hz: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            sample_rate_hz,
            center_hz: mapper.rest_frequency_hz(),
            noise_amplitude: config.noise_amplitude,
            components: line_profile(config, mapper),
        }
    }
}

fn line_profile(config: &SyntheticConfig, mapper: DopplerMapper) -> Vec<LineComponent> {
    let count = config.line_components.max(1);
    let sigma = config.line_width_km_s.abs();
    let offsets: Vec<f64> = if count == 1 {
        vec![0.0]
    } else {
        // spread over ±2 sigma
        (0..count)
            .map(|k| -2.0 * sigma + 4.0 * sigma * k as f64 / (count - 1) as f64)
            .collect()
    };
    let weights: Vec<f64> = offsets
        .iter()
        .map(|dv| {
            if sigma > 0.0 {
                (-0.5 * (dv / sigma).powi(2)).exp()
            } else {
                1.0
            }
        })
        .collect();
    let total: f64 = weights.iter().sum();
    offsets
        .iter()
        .zip(weights)
        .map(|(dv, w)| LineComponent {
            frequency_hz: mapper.frequency_from_velocity(config.line_velocity_km_s + dv),
            amplitude: config.line_amplitude * w / total,
        })
        .collect()
}

impl SampleSource for SyntheticReceiver {
    fn read_block(&mut self, size: usize) -> Result<RawSampleBlock, AcquisitionError> {
        let half_band = self.sample_rate_hz / 2.0;
        let mut tones = Vec::with_capacity(self.components.len());
        for component in &self.components {
            let offset = component.frequency_hz - self.center_hz;
            if offset.abs() < half_band {
                let phase = self.rng.gen_range(0.0..2.0 * PI);
                let omega = 2.0 * PI * offset / self.sample_rate_hz;
                tones.push((omega, component.amplitude, phase));
            }
        }

        let amp = self.noise_amplitude;
        let mut block = Vec::with_capacity(size);
        for n in 0..size {
            let mut sample = if amp > 0.0 {
                Complex64::new(self.rng.gen_range(-amp..amp), self.rng.gen_range(-amp..amp))
            } else {
                Complex64::new(0.0, 0.0)
            };
            for &(omega, amplitude, phase) in &tones {
                sample += Complex64::from_polar(amplitude, omega * n as f64 + phase);
            }
            block.push(sample);
        }
        Ok(block)
    }

    fn set_center_frequency(&mut self, frequency_hz: f64) -> Result<(), AcquisitionError> {
        if !frequency_hz.is_finite() || frequency_hz <= 0.0 {
            return Err(AcquisitionError::Device(format!(
                "cannot tune to {} Hz",
                frequency_hz
            )));
        }
        self.center_hz = frequency_hz;
        Ok(())
    }

    fn center_frequency(&self) -> f64 {
        self.center_hz
    }
}
