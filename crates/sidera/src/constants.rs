//! Astrological and astronomical constants shared by the calculators.
//!
//! `YEAR_DAYS` and `SUN_MEAN_MOTION` match the values used by the common
//! reference software, so progressed positions line up with published tables.

/// Aspect angles in degrees.
pub const CONJUNCTION: f64 = 0.0;
pub const OPPOSITION: f64 = 180.0;
pub const SQUARE: f64 = 90.0;
pub const TRINE: f64 = 120.0;
pub const SEXTILE: f64 = 60.0;
pub const SEPTILE: f64 = 51.43;
pub const SEMISQUARE: f64 = 45.0;
pub const SESQUISQUARE: f64 = 135.0;
pub const SEMISEXTILE: f64 = 30.0;
pub const QUINCUNX: f64 = 150.0;
pub const QUINTILE: f64 = 72.0;
pub const BIQUINTILE: f64 = 144.0;

/// Deviation below which an aspect counts as exact.
pub const MAX_ERROR: f64 = 0.000001;
/// Daily motion below which a body counts as stationary (~1 arc-second).
pub const STATION_SPEED: f64 = 0.0003;
/// Average days in a solar year.
pub const YEAR_DAYS: f64 = 365.24219893;

/// Mean daily motions in degrees per day.
pub const SUN_MEAN_MOTION: f64 = 0.98564733;
pub const MOON_MEAN_MOTION: f64 = 13.176389;
pub const MERCURY_MEAN_MOTION: f64 = 1.383333;
pub const VENUS_MEAN_MOTION: f64 = 1.2;
pub const MARS_MEAN_MOTION: f64 = 0.524167;
pub const JUPITER_MEAN_MOTION: f64 = 0.083056;
pub const SATURN_MEAN_MOTION: f64 = 0.033611;
pub const URANUS_MEAN_MOTION: f64 = 0.011667;
pub const NEPTUNE_MEAN_MOTION: f64 = 0.006667;
pub const PLUTO_MEAN_MOTION: f64 = 0.004167;

/// Object ids the engine looks up by name.
pub const SUN: &str = "sun";
pub const MOON: &str = "moon";
pub const ASC: &str = "asc";
pub const MC: &str = "mc";

const MEAN_MOTIONS: &[(&str, f64)] = &[
    ("sun", SUN_MEAN_MOTION),
    ("moon", MOON_MEAN_MOTION),
    ("mercury", MERCURY_MEAN_MOTION),
    ("venus", VENUS_MEAN_MOTION),
    ("mars", MARS_MEAN_MOTION),
    ("jupiter", JUPITER_MEAN_MOTION),
    ("saturn", SATURN_MEAN_MOTION),
    ("uranus", URANUS_MEAN_MOTION),
    ("neptune", NEPTUNE_MEAN_MOTION),
    ("pluto", PLUTO_MEAN_MOTION),
];

/// Mean daily motion for a body, if the table has one.
pub fn mean_motion(object_id: &str) -> Option<f64> {
    let id = object_id.to_lowercase();
    MEAN_MOTIONS
        .iter()
        .find(|(name, _)| *name == id)
        .map(|(_, motion)| *motion)
}
