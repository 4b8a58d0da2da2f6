//! Horizontal, equatorial and galactic coordinate conversions.
//!
//! Pointing is resolved in the frame of date from local sidereal time, then
//! precessed to J2000 (IAU 1976) for reporting and for the galactic rotation.
//! Refraction, nutation and aberration are ignored; together they stay well
//! below the 0.01 degree at which coordinates are reported.

use super::location::{ObserverLocation, Pointing};
use super::time::centuries_since_j2000;
use crate::constants::round2;
use crate::math::MatrixHelper;
use ndarray::{arr2, Array2};
use serde::{Deserialize, Serialize};

const ARCSEC_TO_RAD: f64 = std::f64::consts::PI / (180.0 * 3600.0);

/// Rotation from J2000 equatorial to galactic axes (Hipparcos definition).
const EQUATORIAL_TO_GALACTIC: [[f64; 3]; 3] = [
    [-0.054_875_560_416_215_4, -0.873_437_090_234_885, -0.483_835_015_548_713_2],
    [0.494_109_427_875_583_7, -0.444_829_629_960_011_2, 0.746_982_244_497_218_9],
    [-0.867_666_149_019_004_7, -0.198_076_373_431_201_5, 0.455_983_776_175_066_9],
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquatorialCoords {
    pub ra_deg: f64,
    pub dec_deg: f64,
}

impl EquatorialCoords {
    pub fn new(ra_deg: f64, dec_deg: f64) -> Self {
        Self { ra_deg, dec_deg }
    }

    pub fn unit_vector(&self) -> [f64; 3] {
        spherical_to_unit(self.ra_deg, self.dec_deg)
    }

    pub fn from_unit_vector(v: [f64; 3]) -> Self {
        let (ra_deg, dec_deg) = unit_to_spherical(v);
        Self { ra_deg, dec_deg }
    }

    pub fn rounded(&self) -> Self {
        Self::new(round2(self.ra_deg), round2(self.dec_deg))
    }

    /// Galactic coordinates of a J2000 direction.
    pub fn to_galactic(&self) -> GalacticCoords {
        GalacticCoords::from_unit_vector(self.galactic_unit_vector())
    }

    /// J2000 direction expressed in galactic Cartesian axes.
    pub fn galactic_unit_vector(&self) -> [f64; 3] {
        MatrixHelper::apply(arr2(&EQUATORIAL_TO_GALACTIC).view(), self.unit_vector())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GalacticCoords {
    pub l_deg: f64,
    pub b_deg: f64,
}

impl GalacticCoords {
    pub fn from_unit_vector(v: [f64; 3]) -> Self {
        let (l_deg, b_deg) = unit_to_spherical(v);
        Self { l_deg, b_deg }
    }

    pub fn unit_vector(&self) -> [f64; 3] {
        spherical_to_unit(self.l_deg, self.b_deg)
    }

    /// J2000 equatorial coordinates of a galactic direction.
    pub fn to_equatorial(&self) -> EquatorialCoords {
        let rotation = arr2(&EQUATORIAL_TO_GALACTIC);
        EquatorialCoords::from_unit_vector(MatrixHelper::apply(rotation.t(), self.unit_vector()))
    }

    pub fn rounded(&self) -> Self {
        Self {
            l_deg: round2(self.l_deg),
            b_deg: round2(self.b_deg),
        }
    }
}

fn spherical_to_unit(lon_deg: f64, lat_deg: f64) -> [f64; 3] {
    let (sin_lon, cos_lon) = lon_deg.to_radians().sin_cos();
    let (sin_lat, cos_lat) = lat_deg.to_radians().sin_cos();
    [cos_lat * cos_lon, cos_lat * sin_lon, sin_lat]
}

fn unit_to_spherical(v: [f64; 3]) -> (f64, f64) {
    let lon = v[1].atan2(v[0]).to_degrees().rem_euclid(360.0);
    let lat = v[2].clamp(-1.0, 1.0).asin().to_degrees();
    (lon, lat)
}

/// Precession matrix taking J2000 vectors to the mean equator of date.
pub fn precession_matrix(jde: f64) -> Array2<f64> {
    let t = centuries_since_j2000(jde);
    let zeta = (2306.2181 * t + 0.30188 * t * t + 0.017998 * t * t * t) * ARCSEC_TO_RAD;
    let z = (2306.2181 * t + 1.09468 * t * t + 0.018203 * t * t * t) * ARCSEC_TO_RAD;
    let theta = (2004.3109 * t - 0.42665 * t * t - 0.041833 * t * t * t) * ARCSEC_TO_RAD;

    let inner = MatrixHelper::multiply(
        MatrixHelper::rotation_y(theta).view(),
        MatrixHelper::rotation_z(-zeta).view(),
    );
    MatrixHelper::multiply(MatrixHelper::rotation_z(-z).view(), inner.view())
}

/// Mean obliquity of the ecliptic of date in radians (IAU 1980).
pub fn mean_obliquity(jde: f64) -> f64 {
    let t = centuries_since_j2000(jde);
    let arcsec = 84_381.448 - 46.8150 * t - 0.00059 * t * t + 0.001813 * t * t * t;
    arcsec * ARCSEC_TO_RAD
}

/// Direction of the pointing in equatorial axes of date.
///
/// `lst` is the local sidereal time in radians.
pub fn pointing_direction_of_date(
    location: &ObserverLocation,
    pointing: &Pointing,
    lst: f64,
) -> [f64; 3] {
    let [east, north, up] = pointing.enu_unit_vector();
    let (sin_lat, cos_lat) = location.lat_rad().sin_cos();

    // hour-angle frame: x towards the meridian on the equator, z towards the pole
    let z = north * cos_lat + up * sin_lat;
    let x = -north * sin_lat + up * cos_lat;
    let hour_angle = (-east).atan2(x);
    let dec = z.clamp(-1.0, 1.0).asin();
    let ra = lst - hour_angle;

    let (sin_dec, cos_dec) = dec.sin_cos();
    let (sin_ra, cos_ra) = ra.sin_cos();
    [cos_dec * cos_ra, cos_dec * sin_ra, sin_dec]
}
