//! Zodiac signs and circular longitude arithmetic.
//!
//! Every calculator works on ecliptic longitudes in [0, 360). The helpers
//! here keep the wrap-around handling in one place.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

const SIGN_ORDER: [Sign; 12] = [
    Sign::Aries,
    Sign::Taurus,
    Sign::Gemini,
    Sign::Cancer,
    Sign::Leo,
    Sign::Virgo,
    Sign::Libra,
    Sign::Scorpio,
    Sign::Sagittarius,
    Sign::Capricorn,
    Sign::Aquarius,
    Sign::Pisces,
];

impl Sign {
    /// Sign from index 0 (Aries) to 11 (Pisces); wraps past 11.
    pub fn from_index(index: usize) -> Sign {
        SIGN_ORDER[index % 12]
    }

    pub fn from_longitude(longitude: f64) -> Sign {
        Self::from_index(sign_index(longitude))
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Sign::Aries => "aries",
            Sign::Taurus => "taurus",
            Sign::Gemini => "gemini",
            Sign::Cancer => "cancer",
            Sign::Leo => "leo",
            Sign::Virgo => "virgo",
            Sign::Libra => "libra",
            Sign::Scorpio => "scorpio",
            Sign::Sagittarius => "sagittarius",
            Sign::Capricorn => "capricorn",
            Sign::Aquarius => "aquarius",
            Sign::Pisces => "pisces",
        }
    }
}

/// Sign index (0-11) for a longitude; the longitude is normalized first.
pub fn sign_index(longitude: f64) -> usize {
    ((normalize_360(longitude) / 30.0).floor() as usize) % 12
}

/// Degrees into the sign, in [0, 30).
pub fn degree_in_sign(longitude: f64) -> f64 {
    let lon = normalize_360(longitude);
    lon - (sign_index(lon) as f64 * 30.0)
}

/// Normalize an angle to [0, 360).
pub fn normalize_360(deg: f64) -> f64 {
    let r = deg % 360.0;
    let r = if r < 0.0 { r + 360.0 } else { r };
    // -1e-20 % 360 + 360 rounds to 360.0
    if r >= 360.0 {
        0.0
    } else {
        r
    }
}

/// Signed difference `a - b` in (-180, 180].
pub fn signed_difference(a: f64, b: f64) -> f64 {
    let d = normalize_360(a - b);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// Unsigned angular separation between two longitudes, in [0, 180].
pub fn angular_separation(a: f64, b: f64) -> f64 {
    signed_difference(a, b).abs()
}

/// Midpoint on the shorter arc between two longitudes.
///
/// Returns `None` when the longitudes are exactly opposite (within
/// `tolerance`), where both arcs are equally short. The result does not
/// depend on argument order.
pub fn circular_midpoint(a: f64, b: f64, tolerance: f64) -> Option<f64> {
    let (lo, hi) = if normalize_360(a) <= normalize_360(b) {
        (normalize_360(a), normalize_360(b))
    } else {
        (normalize_360(b), normalize_360(a))
    };
    let arc = hi - lo;
    if (arc - 180.0).abs() <= tolerance {
        return None;
    }
    if arc < 180.0 {
        Some(normalize_360(lo + arc / 2.0))
    } else {
        Some(normalize_360(hi + (360.0 - arc) / 2.0))
    }
}
