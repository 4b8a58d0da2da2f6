//! Velocity of the observer relative to the solar-system barycenter.
//!
//! Earth's heliocentric motion comes from VSOP87 through the `astro` crate and
//! is differentiated numerically. The Sun's reflex motion about the barycenter
//! is added from the four giant planets, and the diurnal rotation of the
//! observer from its geodetic position. All vectors are in equatorial axes of
//! date, in km/s.

use super::coords::mean_obliquity;
use super::location::ObserverLocation;
use crate::constants::AU_KM;
use crate::math::MatrixHelper;
use astro::planet::{heliocent_coords, Planet};

/// Half step of the central difference, in days.
const DIFF_STEP_DAYS: f64 = 0.05;

/// Planet-to-Sun mass ratios of the bodies that dominate the solar reflex.
const GIANT_PLANETS: [(Planet, f64); 4] = [
    (Planet::Jupiter, 1.0 / 1_047.348_6),
    (Planet::Saturn, 1.0 / 3_497.898),
    (Planet::Uranus, 1.0 / 22_902.98),
    (Planet::Neptune, 1.0 / 19_412.24),
];

/// Heliocentric position in ecliptic axes of date, AU.
fn heliocentric_ecliptic(planet: &Planet, jde: f64) -> [f64; 3] {
    let (longitude, latitude, radius) = heliocent_coords(planet, jde);
    let (sin_l, cos_l) = longitude.sin_cos();
    let (sin_b, cos_b) = latitude.sin_cos();
    [
        radius * cos_b * cos_l,
        radius * cos_b * sin_l,
        radius * sin_b,
    ]
}

/// Sun position relative to the barycenter in ecliptic axes of date, AU.
fn sun_barycentric_ecliptic(jde: f64) -> [f64; 3] {
    let mut weighted = [0.0; 3];
    let mut total = 1.0;
    for (planet, ratio) in GIANT_PLANETS.iter() {
        let pos = heliocentric_ecliptic(planet, jde);
        for axis in 0..3 {
            weighted[axis] += ratio * pos[axis];
        }
        total += ratio;
    }
    weighted.map(|w| -w / total)
}

fn earth_barycentric_ecliptic(jde: f64) -> [f64; 3] {
    let earth = heliocentric_ecliptic(&Planet::Earth, jde);
    let sun = sun_barycentric_ecliptic(jde);
    [earth[0] + sun[0], earth[1] + sun[1], earth[2] + sun[2]]
}

/// Earth's barycentric velocity in equatorial axes of date.
pub fn earth_barycentric_velocity(jde: f64) -> [f64; 3] {
    let ahead = earth_barycentric_ecliptic(jde + DIFF_STEP_DAYS);
    let behind = earth_barycentric_ecliptic(jde - DIFF_STEP_DAYS);
    let scale = AU_KM / (2.0 * DIFF_STEP_DAYS * 86_400.0);
    let ecliptic = [
        (ahead[0] - behind[0]) * scale,
        (ahead[1] - behind[1]) * scale,
        (ahead[2] - behind[2]) * scale,
    ];
    // ecliptic to equator is a frame rotation by minus the obliquity about x
    MatrixHelper::apply(
        MatrixHelper::rotation_x(-mean_obliquity(jde)).view(),
        ecliptic,
    )
}

/// Observer rotation velocity in equatorial axes of date.
///
/// `gmst` is the Greenwich sidereal angle in radians.
pub fn observer_rotation_velocity(location: &ObserverLocation, gmst: f64) -> [f64; 3] {
    MatrixHelper::apply(
        MatrixHelper::rotation_z(-gmst).view(),
        location.rotation_velocity_ecef_km_s(),
    )
}
