use num_complex::Complex64;
use rustfft::{num_traits::Zero, Fft, FftPlanner};

/// Helper that wraps the `rustfft` planner for reuse across blocks.
pub struct FftHelper {
    fft: std::sync::Arc<dyn Fft<f64>>,
    scratch: Vec<Complex64>,
}

impl FftHelper {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let scratch = vec![Complex64::zero(); fft.get_inplace_scratch_len()];
        Self { fft, scratch }
    }

    /// Transform length in samples.
    pub fn size(&self) -> usize {
        self.fft.len()
    }

    /// Forward transform in place. `buffer` must hold exactly `size()` samples.
    pub fn forward_inplace(&mut self, buffer: &mut [Complex64]) {
        self.fft.process_with_scratch(buffer, &mut self.scratch);
    }

    /// Forward transform of a copy of `input`, zero-padded or truncated to `size()`.
    pub fn forward(&mut self, input: &[Complex64]) -> Vec<Complex64> {
        let mut buffer = input.to_vec();
        buffer.resize(self.size(), Complex64::zero());
        self.forward_inplace(&mut buffer);
        buffer
    }
}

/// Reorders FFT output so the most negative frequency comes first.
pub fn fft_shift<T: Copy>(values: &mut [T]) {
    let half = values.len() / 2;
    values.rotate_left(values.len() - half);
}
