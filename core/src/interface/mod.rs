pub mod result;
pub mod samples;

pub use result::{AnalysisResult, ObservationRecord, SpectraRecord, VelocityCorrection};
pub use samples::{AcquisitionError, RawSampleBlock, SampleSource};
