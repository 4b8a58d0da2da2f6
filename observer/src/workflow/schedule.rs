use anyhow::bail;
use chrono::{DateTime, Duration, Utc};
use hlinecore::constants::SIDEREAL_DAY_SECONDS;

/// Seconds the sky needs to turn by `degrees`.
pub fn sidereal_step_seconds(degrees: f64) -> f64 {
    degrees * SIDEREAL_DAY_SECONDS / 360.0
}

/// Observation instants covering one sidereal day from `start`, one every
/// `degree_interval` degrees of Earth rotation.
pub fn sky_drift_schedule(
    start: DateTime<Utc>,
    degree_interval: f64,
) -> anyhow::Result<Vec<DateTime<Utc>>> {
    if !(degree_interval > 0.0 && degree_interval <= 360.0) {
        bail!("degree interval {} outside (0, 360]", degree_interval);
    }
    let steps = (360.0 / degree_interval).floor() as i64;
    let step_ms = sidereal_step_seconds(degree_interval) * 1000.0;
    Ok((0..steps)
        .map(|k| start + Duration::milliseconds((k as f64 * step_ms).round() as i64))
        .collect())
}
