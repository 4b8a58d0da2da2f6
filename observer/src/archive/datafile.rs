use anyhow::Context;
use hlinecore::ObservationRecord;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// File name of an observation's datafile, keyed by its J2000 coordinates.
pub fn datafile_name(record: &ObservationRecord) -> String {
    format!(
        "data(ra={},dec={}).json",
        record.geometry.equatorial.ra_deg, record.geometry.equatorial.dec_deg
    )
}

/// Writes completed observations to disk: one pretty-printed JSON datafile
/// each, and a one-line summary appended to a run log.
#[derive(Debug, Clone, Default)]
pub struct ResultArchive {
    datafile_dir: Option<PathBuf>,
    run_log: Option<PathBuf>,
}

impl ResultArchive {
    pub fn new(datafile_dir: Option<PathBuf>, run_log: Option<PathBuf>) -> Self {
        Self {
            datafile_dir,
            run_log,
        }
    }

    /// Returns the path written, or `None` when no directory is configured.
    pub fn write_datafile(&self, record: &ObservationRecord) -> anyhow::Result<Option<PathBuf>> {
        let Some(dir) = self.datafile_dir.as_ref() else {
            return Ok(None);
        };
        fs::create_dir_all(dir)
            .with_context(|| format!("creating datafile directory {}", dir.display()))?;
        let path = dir.join(datafile_name(record));
        let json = record.to_json_pretty().context("serializing observation record")?;
        fs::write(&path, json).with_context(|| format!("writing datafile {}", path.display()))?;
        Ok(Some(path))
    }

    pub fn append_summary(&self, record: &ObservationRecord) -> anyhow::Result<()> {
        let Some(path) = self.run_log.as_ref() else {
            return Ok(());
        };
        append_line(
            path,
            &format!("{} {}", record.geometry.instant.to_rfc3339(), record.summary()),
        )
    }

    pub fn publish_status(&self, message: &str) {
        println!("[observer] {}", message);
    }
}

fn append_line(path: &Path, line: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating run log directory {}", parent.display()))?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening run log {}", path.display()))?;
    writeln!(file, "{}", line).with_context(|| format!("appending to {}", path.display()))?;
    Ok(())
}
