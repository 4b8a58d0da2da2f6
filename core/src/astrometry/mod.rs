//! Observation geometry and the barycentric velocity correction.

pub mod coords;
pub mod location;
pub mod motion;
pub mod time;

pub use coords::{EquatorialCoords, GalacticCoords};
pub use location::{ObserverLocation, Pointing};

use crate::math::MatrixHelper;
use crate::prelude::{PipelineError, PipelineResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pointing resolved once per observation. Coordinates are J2000 and rounded
/// to 2 decimals, as they are reported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationGeometry {
    pub instant: DateTime<Utc>,
    pub location: ObserverLocation,
    pub pointing: Pointing,
    pub equatorial: EquatorialCoords,
    pub galactic: GalacticCoords,
}

/// Astronomy provider consumed by the frame corrector.
pub trait Ephemeris {
    fn resolve_geometry(
        &self,
        instant: DateTime<Utc>,
        location: &ObserverLocation,
        pointing: &Pointing,
    ) -> PipelineResult<ObservationGeometry>;

    /// Correction in km/s that refers a measured velocity towards `target`
    /// (J2000) to the solar-system barycenter. Unrounded.
    fn barycentric_correction(
        &self,
        target: &EquatorialCoords,
        instant: DateTime<Utc>,
        location: &ObserverLocation,
    ) -> PipelineResult<f64>;
}

/// Built-in provider: VSOP87 Earth motion, IAU-1976 precession, mean sidereal
/// time. Accurate to a few m/s, below the 0.01 km/s reporting resolution in
/// most cases.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardEphemeris;

impl StandardEphemeris {
    pub fn new() -> Self {
        Self
    }
}

impl Ephemeris for StandardEphemeris {
    fn resolve_geometry(
        &self,
        instant: DateTime<Utc>,
        location: &ObserverLocation,
        pointing: &Pointing,
    ) -> PipelineResult<ObservationGeometry> {
        location.validate()?;
        pointing.validate()?;

        let lst = time::local_sidereal_time(instant, location.longitude_deg);
        let of_date = coords::pointing_direction_of_date(location, pointing, lst);
        let precession = coords::precession_matrix(time::julian_ephemeris_day(instant));
        let j2000 = MatrixHelper::apply(precession.t(), of_date);

        let equatorial = EquatorialCoords::from_unit_vector(j2000);
        let galactic = equatorial.to_galactic();
        if !(equatorial.ra_deg.is_finite() && equatorial.dec_deg.is_finite()) {
            return Err(PipelineError::Ephemeris(format!(
                "pointing {:?} did not resolve to finite coordinates",
                pointing
            )));
        }

        Ok(ObservationGeometry {
            instant,
            location: *location,
            pointing: *pointing,
            equatorial: equatorial.rounded(),
            galactic: galactic.rounded(),
        })
    }

    fn barycentric_correction(
        &self,
        target: &EquatorialCoords,
        instant: DateTime<Utc>,
        location: &ObserverLocation,
    ) -> PipelineResult<f64> {
        location.validate()?;
        let jde = time::julian_ephemeris_day(instant);
        let direction = MatrixHelper::apply(
            coords::precession_matrix(jde).view(),
            target.unit_vector(),
        );

        let orbital = motion::earth_barycentric_velocity(jde);
        let diurnal = motion::observer_rotation_velocity(
            location,
            time::greenwich_mean_sidereal_time(instant),
        );
        let observer = [
            orbital[0] + diurnal[0],
            orbital[1] + diurnal[1],
            orbital[2] + diurnal[2],
        ];

        // Motion towards the target raises the observed frequency, which the
        // mapper reads as a positive velocity; the correction removes it.
        let correction = -MatrixHelper::dot(observer, direction);
        if !correction.is_finite() {
            return Err(PipelineError::Ephemeris(format!(
                "barycentric correction for {:?} is not finite",
                target
            )));
        }
        Ok(correction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 20, 3, 6, 0).unwrap()
    }

    #[test]
    fn geometry_is_rounded_to_two_decimals() {
        let location = ObserverLocation::new(55.68, 12.57, 10.0);
        let geometry = StandardEphemeris
            .resolve_geometry(instant(), &location, &Pointing::new(45.0, 180.0))
            .unwrap();
        let ra = geometry.equatorial.ra_deg;
        assert_eq!(ra, (ra * 100.0).round() / 100.0);
        // meridian pointing: dec = lat - (90 - alt), give or take precession
        assert!((geometry.equatorial.dec_deg - 10.68).abs() < 0.2);
    }

    #[test]
    fn invalid_pointing_is_a_configuration_error() {
        let err = StandardEphemeris
            .resolve_geometry(
                instant(),
                &ObserverLocation::new(0.0, 0.0, 0.0),
                &Pointing::new(120.0, 0.0),
            )
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig(_)));
    }

    #[test]
    fn correction_is_bounded_by_orbital_plus_rotation_speed() {
        let location = ObserverLocation::new(55.68, 12.57, 0.0);
        for ra in [0.0, 90.0, 180.0, 270.0] {
            let corr = StandardEphemeris
                .barycentric_correction(&EquatorialCoords::new(ra, 0.0), instant(), &location)
                .unwrap();
            assert!(corr.abs() < 30.8, "ra {ra}: {corr}");
        }
    }

    #[test]
    fn correction_flips_sign_for_opposite_directions() {
        let location = ObserverLocation::new(0.0, 0.0, 0.0);
        let toward = StandardEphemeris
            .barycentric_correction(&EquatorialCoords::new(40.0, 10.0), instant(), &location)
            .unwrap();
        let away = StandardEphemeris
            .barycentric_correction(&EquatorialCoords::new(220.0, -10.0), instant(), &location)
            .unwrap();
        assert!((toward + away).abs() < 1e-9);
    }

    #[test]
    fn correction_near_equinox_peaks_towards_apex() {
        // Around the March equinox the Earth moves towards ecliptic longitude
        // ~270 deg, i.e. RA 270, Dec -23.4; the mapper convention makes the
        // correction negative there.
        let location = ObserverLocation::new(0.0, 0.0, 0.0);
        let corr = StandardEphemeris
            .barycentric_correction(&EquatorialCoords::new(270.0, -23.44), instant(), &location)
            .unwrap();
        assert!(corr < -29.0, "corr {corr}");
    }
}
