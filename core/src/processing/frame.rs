use crate::astrometry::{Ephemeris, ObservationGeometry};
use crate::constants::{round2, SOLAR_MOTION_UVW_KM_S, SPEED_OF_LIGHT_KM_S};
use crate::interface::VelocityCorrection;
use crate::math::MatrixHelper;
use crate::prelude::{PipelineError, PipelineResult};
use crate::processing::velocity::DopplerMapper;
use crate::telemetry::LogManager;

/// Refers a measured radial velocity to the barycenter and then to the LSR.
pub struct FrameCorrector<E: Ephemeris> {
    ephemeris: E,
    mapper: DopplerMapper,
    logger: LogManager,
}

impl<E: Ephemeris> FrameCorrector<E> {
    pub fn new(ephemeris: E, mapper: DopplerMapper) -> Self {
        Self {
            ephemeris,
            mapper,
            logger: LogManager::new("frame"),
        }
    }

    pub fn ephemeris(&self) -> &E {
        &self.ephemeris
    }

    /// Barycentric correction for the geometry's target, rounded to 2 decimals.
    pub fn barycentric_correction(&self, geometry: &ObservationGeometry) -> PipelineResult<f64> {
        let correction = self.ephemeris.barycentric_correction(
            &geometry.equatorial,
            geometry.instant,
            &geometry.location,
        )?;
        Ok(round2(correction))
    }

    /// Extra correction from the barycentric frame to the LSR, rounded to 2 decimals.
    ///
    /// The barycentric velocity is turned back into the frequency it implies,
    /// that frequency is Doppler-shifted into a frame moving with the LSR
    /// (relativistic observer shift), and the difference of the two velocities
    /// is returned.
    pub fn lsr_correction(
        &self,
        geometry: &ObservationGeometry,
        barycentric_velocity_km_s: f64,
    ) -> PipelineResult<f64> {
        let direction = geometry.equatorial.galactic_unit_vector();
        // the LSR moves against the solar motion as seen from the barycenter
        let lsr_velocity = SOLAR_MOTION_UVW_KM_S.map(|v| -v / SPEED_OF_LIGHT_KM_S);
        let beta_radial = MatrixHelper::dot(lsr_velocity, direction);
        let beta_sq = MatrixHelper::dot(lsr_velocity, lsr_velocity);

        let frequency = self.mapper.frequency_from_velocity(barycentric_velocity_km_s);
        let shifted = frequency * (1.0 + beta_radial) / (1.0 - beta_sq).sqrt();
        let correction = self.mapper.velocity_from_frequency(shifted) - barycentric_velocity_km_s;
        if !correction.is_finite() {
            return Err(PipelineError::Ephemeris(format!(
                "LSR correction towards {:?} is not finite",
                geometry.galactic
            )));
        }
        Ok(round2(correction))
    }

    /// Both corrections and the corrected velocity for a measured velocity.
    ///
    /// Each correction is rounded before it is added, so
    /// `corrected = measured + barycentric + lsr` holds exactly.
    pub fn correct(
        &self,
        geometry: &ObservationGeometry,
        measured_km_s: f64,
    ) -> PipelineResult<(VelocityCorrection, f64)> {
        let barycentric_km_s = self.barycentric_correction(geometry)?;
        let lsr_km_s = self.lsr_correction(geometry, measured_km_s + barycentric_km_s)?;
        let correction = VelocityCorrection {
            barycentric_km_s,
            lsr_km_s,
        };
        let corrected = correction.apply(measured_km_s);
        self.logger.record(&format!(
            "measured {:.2} km/s, barycentric {:+.2}, lsr {:+.2}, corrected {:.2} km/s",
            measured_km_s, barycentric_km_s, lsr_km_s, corrected
        ));
        Ok((correction, corrected))
    }
}
