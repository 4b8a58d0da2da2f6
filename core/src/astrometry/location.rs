use crate::constants::EARTH_ROTATION_RAD_S;
use crate::prelude::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};

/// Antenna position on the WGS-84 ellipsoid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ObserverLocation {
    /// North positive.
    pub latitude_deg: f64,
    /// East positive.
    pub longitude_deg: f64,
    /// Height above the ellipsoid.
    pub height_m: f64,
}

impl ObserverLocation {
    pub fn new(latitude_deg: f64, longitude_deg: f64, height_m: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            height_m,
        }
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if !(-90.0..=90.0).contains(&self.latitude_deg) {
            return Err(PipelineError::InvalidConfig(format!(
                "latitude {} outside [-90, 90] degrees",
                self.latitude_deg
            )));
        }
        if !(-180.0..=360.0).contains(&self.longitude_deg) {
            return Err(PipelineError::InvalidConfig(format!(
                "longitude {} outside [-180, 360] degrees",
                self.longitude_deg
            )));
        }
        if !self.height_m.is_finite() {
            return Err(PipelineError::InvalidConfig(
                "observer height must be finite".into(),
            ));
        }
        Ok(())
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }

    pub fn position_ecef_km(&self) -> [f64; 3] {
        // WGS-84 constants
        let a = 6378.137;
        let e2 = 0.006_694_379_990_14;
        let (sin_lat, cos_lat) = self.lat_rad().sin_cos();
        let (sin_lon, cos_lon) = self.lon_rad().sin_cos();
        let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let h_km = self.height_m / 1000.0;
        [
            (n + h_km) * cos_lat * cos_lon,
            (n + h_km) * cos_lat * sin_lon,
            (n * (1.0 - e2) + h_km) * sin_lat,
        ]
    }

    /// Inertial velocity due to Earth rotation, expressed in ECEF axes.
    pub fn rotation_velocity_ecef_km_s(&self) -> [f64; 3] {
        let pos = self.position_ecef_km();
        [
            -EARTH_ROTATION_RAD_S * pos[1],
            EARTH_ROTATION_RAD_S * pos[0],
            0.0,
        ]
    }
}

/// Antenna pointing in horizontal coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pointing {
    pub altitude_deg: f64,
    /// Measured from north towards east.
    pub azimuth_deg: f64,
}

impl Pointing {
    pub fn new(altitude_deg: f64, azimuth_deg: f64) -> Self {
        Self {
            altitude_deg,
            azimuth_deg,
        }
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if !(-90.0..=90.0).contains(&self.altitude_deg) {
            return Err(PipelineError::InvalidConfig(format!(
                "altitude {} outside [-90, 90] degrees",
                self.altitude_deg
            )));
        }
        if !self.azimuth_deg.is_finite() {
            return Err(PipelineError::InvalidConfig("azimuth must be finite".into()));
        }
        Ok(())
    }

    /// Unit vector in local (east, north, up) axes.
    pub fn enu_unit_vector(&self) -> [f64; 3] {
        let (sin_alt, cos_alt) = self.altitude_deg.to_radians().sin_cos();
        let (sin_az, cos_az) = self.azimuth_deg.to_radians().sin_cos();
        [cos_alt * sin_az, cos_alt * cos_az, sin_alt]
    }
}
