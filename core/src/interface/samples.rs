use num_complex::Complex64;

/// One block of complex baseband samples, `2^resolution` long.
pub type RawSampleBlock = Vec<Complex64>;

/// Failure reported by a receiver. Never retried by the core.
#[derive(thiserror::Error, Debug)]
pub enum AcquisitionError {
    #[error("receiver I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("receiver device: {0}")]
    Device(String),
    #[error("short read: expected {expected} samples, got {actual}")]
    ShortRead { expected: usize, actual: usize },
}

/// Receiver delivering blocks of complex baseband samples.
///
/// Both calls block. After `set_center_frequency` returns, the implementation
/// guarantees the tuner has settled: the next `read_block` must already be
/// sampled at the new frequency. The core adds no settle delay of its own.
pub trait SampleSource {
    fn read_block(&mut self, size: usize) -> Result<RawSampleBlock, AcquisitionError>;

    fn set_center_frequency(&mut self, frequency_hz: f64) -> Result<(), AcquisitionError>;

    fn center_frequency(&self) -> f64;
}

impl<S: SampleSource + ?Sized> SampleSource for &mut S {
    fn read_block(&mut self, size: usize) -> Result<RawSampleBlock, AcquisitionError> {
        (**self).read_block(size)
    }

    fn set_center_frequency(&mut self, frequency_hz: f64) -> Result<(), AcquisitionError> {
        (**self).set_center_frequency(frequency_hz)
    }

    fn center_frequency(&self) -> f64 {
        (**self).center_frequency()
    }
}

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn read_block(&mut self, size: usize) -> Result<RawSampleBlock, AcquisitionError> {
        (**self).read_block(size)
    }

    fn set_center_frequency(&mut self, frequency_hz: f64) -> Result<(), AcquisitionError> {
        (**self).set_center_frequency(frequency_hz)
    }

    fn center_frequency(&self) -> f64 {
        (**self).center_frequency()
    }
}
