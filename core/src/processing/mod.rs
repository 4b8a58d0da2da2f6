pub mod calibration;
pub mod frame;
pub mod peak;
pub mod spectrum;
pub mod velocity;

pub use calibration::{moving_average, remove_slant, remove_spikes, Calibrator};
pub use frame::FrameCorrector;
pub use peak::PeakExtractor;
pub use spectrum::{repair_dropped_bins, SpectralEstimator};
pub use velocity::DopplerMapper;
