use crate::archive::ResultArchive;
use crate::generator::profile::SyntheticReceiver;
use crate::generator::template::ConstantReceiver;
use crate::workflow::config::{SourceKind, WorkflowConfig};
use crate::workflow::schedule::sky_drift_schedule;
use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use hlinecore::processing::DopplerMapper;
use hlinecore::telemetry::{LogManager, Metrics, MetricsRecorder};
use hlinecore::{ObservationPipeline, ObservationRecord, SampleSource, StandardEphemeris};
use num_complex::Complex64;

pub struct WorkflowResult {
    pub records: Vec<ObservationRecord>,
    pub metrics: Metrics,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    /// Receiver stand-in selected by the configuration.
    pub fn build_source(&self) -> Box<dyn SampleSource> {
        let receiver = &self.config.receiver;
        match self.config.synthetic.source {
            SourceKind::Synthetic => Box::new(SyntheticReceiver::new(
                &self.config.synthetic,
                DopplerMapper::new(receiver.rest_frequency_hz),
                receiver.spectrometer.sample_rate_hz,
            )),
            SourceKind::Constant => Box::new(ConstantReceiver::new(
                receiver.rest_frequency_hz,
                Complex64::new(0.5, 0.25),
                Complex64::new(0.25, 0.125),
            )),
        }
    }

    /// Instants to observe at: one, or one sidereal day of them in sky-drift mode.
    pub fn schedule(&self, start: DateTime<Utc>) -> anyhow::Result<Vec<DateTime<Utc>>> {
        if self.config.observation.sky_drift {
            sky_drift_schedule(start, self.config.observation.degree_interval)
        } else {
            Ok(vec![start])
        }
    }

    /// Runs every scheduled observation in turn.
    ///
    /// A failed observation is logged and counted; it leaves the records of
    /// earlier observations untouched. The run fails only when nothing
    /// completed.
    pub fn execute(&self, archive: &ResultArchive) -> anyhow::Result<WorkflowResult> {
        let logger = LogManager::new("runner");
        self.config.validate().context("validating workflow config")?;
        if !self.config.sample_rate_supported() {
            logger.warn(&format!(
                "sample rate {} Hz is not one the tuner is known to deliver without drops",
                self.config.receiver.spectrometer.sample_rate_hz
            ));
        }

        let mut pipeline =
            ObservationPipeline::new(self.config.to_pipeline_config(), StandardEphemeris::new())
                .context("building observation pipeline")?;
        let mut source = self.build_source();
        let start = self.config.observation.time.unwrap_or_else(Utc::now);
        let schedule = self.schedule(start).context("planning observations")?;

        let metrics = MetricsRecorder::new();
        let mut records = Vec::with_capacity(schedule.len());
        let mut last_error = None;
        for (index, instant) in schedule.iter().enumerate() {
            let outcome = pipeline
                .observe(
                    &mut source,
                    *instant,
                    &self.config.observer,
                    &self.config.pointing,
                )
                .with_context(|| format!("observation {} at {}", index + 1, instant));
            match outcome {
                Ok(record) => {
                    metrics.record_completed();
                    metrics.record_repaired_bins(record.repaired_bins);
                    if let Some(path) = archive.write_datafile(&record)? {
                        logger.detail(&format!("wrote {}", path.display()));
                    }
                    archive.append_summary(&record)?;
                    archive.publish_status(&record.summary());
                    records.push(record);
                }
                Err(err) => {
                    metrics.record_failed();
                    logger.warn(&format!("{:#}", err));
                    last_error = Some(err);
                }
            }
        }

        if records.is_empty() {
            if let Some(err) = last_error {
                return Err(err);
            }
            bail!("no observation was scheduled");
        }
        Ok(WorkflowResult {
            records,
            metrics: metrics.snapshot(),
        })
    }
}
