//! Physical constants and observing defaults shared by every stage.
//!
//! Historical revisions of the observing scripts disagreed on several of these
//! values. Each variant is kept as a named constant so that choosing one is an
//! explicit configuration decision.

/// Hydrogen hyperfine transition frequency, canonical value.
pub const HYDROGEN_REST_FREQ_HZ: f64 = 1_420_405_751.77;

/// Rest frequency used by the earliest receiver scripts.
pub const HYDROGEN_REST_FREQ_LEGACY_HZ: f64 = 1_420_405_000.0;

/// Rounded rest frequency used by later revisions as the tuning frequency.
pub const HYDROGEN_REST_FREQ_ROUNDED_HZ: f64 = 1_420_405_750.0;

/// Speed of light in km/s.
pub const SPEED_OF_LIGHT_KM_S: f64 = 299_792.458;

/// Offset applied to the tuner when capturing the blank (off-source) spectrum.
pub const DEFAULT_BLANK_OFFSET_HZ: f64 = 3_200_000.0;

/// Blank offset used by the earliest receiver scripts.
pub const LEGACY_BLANK_OFFSET_HZ: f64 = 3_000_000.0;

/// Half-width of the velocity window that separates signal from noise floor.
pub const DEFAULT_WINDOW_KM_S: f64 = 120.0;

pub const DEFAULT_SAMPLE_RATE_HZ: f64 = 2_400_000.0;
pub const DEFAULT_RESOLUTION: u32 = 11;
pub const DEFAULT_NUMBER_OF_FFT: usize = 1000;
pub const DEFAULT_MOVING_AVERAGE: usize = 5;

/// Largest accepted resolution exponent (2^24 samples per block).
pub const MAX_RESOLUTION: u32 = 24;

/// Sample rates an RTL-class tuner delivers without dropping samples.
pub const SUPPORTED_SAMPLE_RATES_HZ: [f64; 11] = [
    3_200_000.0,
    2_800_000.0,
    2_560_000.0,
    2_400_000.0,
    2_048_000.0,
    1_920_000.0,
    1_800_000.0,
    1_400_000.0,
    1_024_000.0,
    900_001.0,
    250_000.0,
];

/// Astronomical unit in km.
pub const AU_KM: f64 = 149_597_870.7;

/// Earth rotation rate in rad/s.
pub const EARTH_ROTATION_RAD_S: f64 = 7.292_115e-5;

/// Length of a sidereal day in seconds.
pub const SIDEREAL_DAY_SECONDS: f64 = 86_164.0905;

/// Terrestrial time minus UTC (32.184 s + 37 leap seconds).
pub const TT_MINUS_UTC_SECONDS: f64 = 69.184;

/// Solar motion relative to the LSR (U, V, W) in km/s, Schönrich et al. (2010).
pub const SOLAR_MOTION_UVW_KM_S: [f64; 3] = [11.1, 12.24, 7.25];

/// Rounds to 2 decimals with ties going to the even neighbour.
///
/// Every reported velocity and SNR goes through this helper so that values
/// agree bit-for-bit with reference reductions done in numpy.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
