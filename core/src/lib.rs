//! Signal-processing and velocity-correction core for 21 cm hydrogen-line
//! observations.
//!
//! Raw baseband blocks go through the spectral estimator, the on/off
//! calibrator and the peak extractor; the measured velocity is then referred
//! to the barycenter and the Local Standard of Rest. Receivers and ephemeris
//! providers plug in through the `SampleSource` and `Ephemeris` traits.

pub mod astrometry;
pub mod constants;
pub mod interface;
pub mod math;
pub mod pipeline;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use astrometry::{Ephemeris, ObservationGeometry, ObserverLocation, Pointing, StandardEphemeris};
pub use interface::{ObservationRecord, SampleSource};
pub use pipeline::{Capture, ObservationPipeline};
pub use prelude::{PipelineConfig, PipelineError, PipelineResult};
