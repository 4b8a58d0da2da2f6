use hlinecore::interface::{AcquisitionError, RawSampleBlock, SampleSource};
use num_complex::Complex64;

/// Receiver returning constant (DC) blocks: one value while tuned to the rest
/// frequency, another everywhere else. Useful to check that a featureless
/// capture calibrates to a flat spectrum.
pub struct ConstantReceiver {
    rest_hz: f64,
    on_source: Complex64,
    blank: Complex64,
    center_hz: f64,
}

impl ConstantReceiver {
    pub fn new(rest_hz: f64, on_source: Complex64, blank: Complex64) -> Self {
        Self {
            rest_hz,
            on_source,
            blank,
            center_hz: rest_hz,
        }
    }
}

impl SampleSource for ConstantReceiver {
    fn read_block(&mut self, size: usize) -> Result<RawSampleBlock, AcquisitionError> {
        let value = if self.center_hz == self.rest_hz {
            self.on_source
        } else {
            self.blank
        };
        Ok(vec![value; size])
    }

    fn set_center_frequency(&mut self, frequency_hz: f64) -> Result<(), AcquisitionError> {
        self.center_hz = frequency_hz;
        Ok(())
    }

    fn center_frequency(&self) -> f64 {
        self.center_hz
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_follows_tuning() {
        let on = Complex64::new(0.5, 0.25);
        let off = Complex64::new(0.25, 0.125);
        let mut receiver = ConstantReceiver::new(1.0e9, on, off);
        assert_eq!(receiver.read_block(4).unwrap(), vec![on; 4]);
        receiver.set_center_frequency(1.0032e9).unwrap();
        assert_eq!(receiver.read_block(4).unwrap(), vec![off; 4]);
    }
}
