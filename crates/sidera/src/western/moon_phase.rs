//! Eight-fold lunar phase from the Sun-Moon elongation.
//!
//! Each phase owns the half-open bin `[previous bound, bound)`, so an
//! elongation of exactly 90 is a First Quarter Moon and 45 is a Waxing
//! Crescent.

use serde::{Deserialize, Serialize};

use crate::ephemeris::types::check_longitude;
use crate::error::ChartError;
use crate::western::zodiac::normalize_360;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoonPhase {
    NewMoon,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    FullMoon,
    Disseminating,
    ThirdQuarter,
    Balsamic,
}

const PHASE_BOUNDS: [(f64, MoonPhase); 8] = [
    (45.0, MoonPhase::NewMoon),
    (90.0, MoonPhase::WaxingCrescent),
    (135.0, MoonPhase::FirstQuarter),
    (180.0, MoonPhase::WaxingGibbous),
    (225.0, MoonPhase::FullMoon),
    (270.0, MoonPhase::Disseminating),
    (315.0, MoonPhase::ThirdQuarter),
    (360.0, MoonPhase::Balsamic),
];

impl MoonPhase {
    /// Exclusive upper bound of this phase's elongation bin.
    pub fn upper_bound(self) -> f64 {
        PHASE_BOUNDS
            .iter()
            .find(|(_, phase)| *phase == self)
            .map(|(bound, _)| *bound)
            .unwrap_or(360.0)
    }

    /// Phase for an elongation (Moon minus Sun), normalized first.
    pub fn from_elongation(elongation: f64) -> MoonPhase {
        let separation = normalize_360(elongation);
        PHASE_BOUNDS
            .iter()
            .find(|(bound, _)| separation < *bound)
            .map(|(_, phase)| *phase)
            .unwrap_or(MoonPhase::Balsamic)
    }

    pub fn is_waxing(self) -> bool {
        self.upper_bound() <= 180.0
    }
}

/// Moon phase for a Sun and Moon longitude.
pub fn moon_phase(sun_longitude: f64, moon_longitude: f64) -> Result<MoonPhase, ChartError> {
    check_longitude("sun", sun_longitude)?;
    check_longitude("moon", moon_longitude)?;
    Ok(MoonPhase::from_elongation(moon_longitude - sun_longitude))
}
