use crate::constants::TT_MINUS_UTC_SECONDS;
use chrono::{DateTime, Utc};

/// Julian day of the Unix epoch.
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

pub const J2000_JD: f64 = 2_451_545.0;

/// Julian day (UTC scale) of an instant.
pub fn julian_day(instant: DateTime<Utc>) -> f64 {
    let seconds = instant.timestamp() as f64 + instant.timestamp_subsec_nanos() as f64 * 1e-9;
    UNIX_EPOCH_JD + seconds / 86_400.0
}

/// Julian ephemeris day (TT scale), as required by the planetary theory.
pub fn julian_ephemeris_day(instant: DateTime<Utc>) -> f64 {
    julian_day(instant) + TT_MINUS_UTC_SECONDS / 86_400.0
}

/// Julian centuries since J2000.0.
pub fn centuries_since_j2000(jd: f64) -> f64 {
    (jd - J2000_JD) / 36_525.0
}

/// Greenwich mean sidereal time in radians, UT1 approximated by UTC.
pub fn greenwich_mean_sidereal_time(instant: DateTime<Utc>) -> f64 {
    astro::time::mn_sidr(julian_day(instant)).rem_euclid(std::f64::consts::TAU)
}

/// Local mean sidereal time in radians for an east-positive longitude.
pub fn local_sidereal_time(instant: DateTime<Utc>, longitude_deg: f64) -> f64 {
    (greenwich_mean_sidereal_time(instant) + longitude_deg.to_radians())
        .rem_euclid(std::f64::consts::TAU)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn j2000_epoch_maps_to_reference_day() {
        let instant = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        assert!((julian_day(instant) - J2000_JD).abs() < 1e-9);
        assert!(centuries_since_j2000(julian_day(instant)).abs() < 1e-12);
    }

    #[test]
    fn gmst_at_j2000_matches_almanac() {
        // 18h 41m 50.548s
        let instant = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        let expected = (18.0 + 41.0 / 60.0 + 50.548 / 3600.0) * 15.0;
        let gmst = greenwich_mean_sidereal_time(instant).to_degrees();
        assert!((gmst - expected).abs() < 1e-3, "gmst {gmst} deg");
    }

    #[test]
    fn sidereal_time_advances_faster_than_solar_time() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        let mut d = greenwich_mean_sidereal_time(t1) - greenwich_mean_sidereal_time(t0);
        if d < 0.0 {
            d += std::f64::consts::TAU;
        }
        // about 3m56s of sidereal gain per solar day
        assert!((d.to_degrees() - 0.9856).abs() < 1e-3, "delta {d}");
    }
}
