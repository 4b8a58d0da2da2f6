//! One observation from raw samples to a corrected radial velocity.
//!
//! The pipeline owns one instance of each stage and runs them strictly in
//! order: tune to the rest frequency, capture the on-source spectrum, retune
//! by the blank offset, capture the blank spectrum, calibrate, extract the
//! peak, correct the velocity. Nothing is carried between observations except
//! the validated configuration.

use crate::astrometry::{Ephemeris, ObservationGeometry, ObserverLocation, Pointing};
use crate::interface::{AnalysisResult, ObservationRecord, SampleSource, SpectraRecord};
use crate::prelude::{
    CalibratedSpectrum, FrequencyAxis, PipelineConfig, PipelineResult, PowerSpectrum,
};
use crate::processing::{
    Calibrator, DopplerMapper, FrameCorrector, PeakExtractor, SpectralEstimator,
};
use crate::telemetry::LogManager;
use chrono::{DateTime, Utc};

/// On-source and blank spectra of one observation on a shared axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub axis: FrequencyAxis,
    pub on_source: PowerSpectrum,
    pub blank: PowerSpectrum,
}

impl Capture {
    pub fn repaired_bins(&self) -> usize {
        self.on_source.repaired_bins() + self.blank.repaired_bins()
    }
}

pub struct ObservationPipeline<E: Ephemeris> {
    config: PipelineConfig,
    estimator: SpectralEstimator,
    calibrator: Calibrator,
    extractor: PeakExtractor,
    corrector: FrameCorrector<E>,
    logger: LogManager,
}

impl<E: Ephemeris> ObservationPipeline<E> {
    /// Validates `config` once; every stage is built from the validated copy.
    pub fn new(config: PipelineConfig, ephemeris: E) -> PipelineResult<Self> {
        config.validate()?;
        let mapper = DopplerMapper::new(config.rest_frequency_hz);
        Ok(Self {
            estimator: SpectralEstimator::new(&config.spectrometer)?,
            calibrator: Calibrator::new(&config.calibration, mapper)?,
            extractor: PeakExtractor::new(mapper, config.calibration.window_km_s),
            corrector: FrameCorrector::new(ephemeris, mapper),
            logger: LogManager::new("pipeline"),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Captures the on-source spectrum at the rest frequency, then the blank
    /// spectrum after retuning by the blank offset.
    pub fn capture<S: SampleSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> PipelineResult<Capture> {
        let rest = self.config.rest_frequency_hz;
        let axis = self.estimator.frequency_axis(rest)?;

        source.set_center_frequency(rest)?;
        let on_source = self.estimator.estimate(source)?;

        let blank_center = rest + self.config.blank_offset_hz;
        source.set_center_frequency(blank_center)?;
        let blank = self.estimator.estimate(source)?;

        self.logger.detail(&format!(
            "captured on-source at {:.0} Hz and blank at {:.0} Hz",
            rest, blank_center
        ));
        Ok(Capture {
            axis,
            on_source,
            blank,
        })
    }

    /// Calibrates a capture and finds its peak.
    pub fn analyze(
        &self,
        capture: &Capture,
    ) -> PipelineResult<(CalibratedSpectrum, AnalysisResult)> {
        let calibrated = self
            .calibrator
            .calibrate(&capture.on_source, &capture.blank, &capture.axis)?;
        let analysis = self.extractor.extract(&calibrated, &capture.axis)?;
        self.logger.record(&format!(
            "peak {:.2} dB at {:.2} km/s (bin {})",
            analysis.peak_snr_db, analysis.radial_velocity_km_s, analysis.peak_bin
        ));
        Ok((calibrated, analysis))
    }

    /// Runs one complete observation.
    ///
    /// The geometry is resolved before the receiver is touched so that a bad
    /// pointing never costs a capture.
    pub fn observe<S: SampleSource + ?Sized>(
        &mut self,
        source: &mut S,
        instant: DateTime<Utc>,
        location: &ObserverLocation,
        pointing: &Pointing,
    ) -> PipelineResult<ObservationRecord> {
        let geometry = self
            .corrector
            .ephemeris()
            .resolve_geometry(instant, location, pointing)?;
        let capture = self.capture(source)?;
        let (calibrated, analysis) = self.analyze(&capture)?;
        self.finish(geometry, capture, calibrated, analysis)
    }

    fn finish(
        &self,
        geometry: ObservationGeometry,
        capture: Capture,
        calibrated: CalibratedSpectrum,
        analysis: AnalysisResult,
    ) -> PipelineResult<ObservationRecord> {
        let (correction, corrected_velocity_km_s) = self
            .corrector
            .correct(&geometry, analysis.radial_velocity_km_s)?;
        let repaired_bins = capture.repaired_bins();
        Ok(ObservationRecord {
            parameters: self.config.clone(),
            geometry,
            analysis,
            correction,
            corrected_velocity_km_s,
            repaired_bins,
            spectra: SpectraRecord {
                frequencies_hz: capture.axis.as_slice().to_vec(),
                on_source_db: capture.on_source.values().to_vec(),
                blank_db: capture.blank.values().to_vec(),
                snr_db: calibrated.values().to_vec(),
            },
        })
    }
}
