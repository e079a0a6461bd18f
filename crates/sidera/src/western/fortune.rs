//! Part of Fortune.
//!
//! Day formula: Asc + Moon - Sun. Night formula: Asc + Sun - Moon. The
//! day/night formula picks between them by whether the Sun is above the
//! horizon.

use serde::{Deserialize, Serialize};

use crate::chart::composite::{midpoint_longitude, MidpointTieBreak};
use crate::ephemeris::types::{check_longitude, HouseCusps};
use crate::error::ChartError;
use crate::western::zodiac::normalize_360;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FortuneFormula {
    Day,
    Night,
    #[default]
    DayNight,
}

/// How a composite chart's Part of Fortune is found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeFortuneMethod {
    /// Midpoint of the two natal Parts of Fortune
    Midpoint,
    /// Formula applied to the composite Sun, Moon and Ascendant
    #[default]
    Composite,
}

/// Part of Fortune longitude in [0, 360).
///
/// `is_day` only matters for [`FortuneFormula::DayNight`].
pub fn part_of_fortune(
    sun: f64,
    moon: f64,
    asc: f64,
    is_day: bool,
    formula: FortuneFormula,
) -> Result<f64, ChartError> {
    check_longitude("sun", sun)?;
    check_longitude("moon", moon)?;
    check_longitude("asc", asc)?;

    let use_day = match formula {
        FortuneFormula::Day => true,
        FortuneFormula::Night => false,
        FortuneFormula::DayNight => is_day,
    };
    Ok(if use_day {
        normalize_360(asc + moon - sun)
    } else {
        normalize_360(asc + sun - moon)
    })
}

/// Sun above the horizon: in the half of the zodiac from the Descendant
/// forward to the Ascendant.
pub fn is_diurnal(sun: f64, asc: f64) -> bool {
    normalize_360(sun - asc) >= 180.0
}

/// Day/night from house cusps when available, else from the Ascendant.
pub fn is_diurnal_chart(sun: f64, asc: f64, houses: Option<&HouseCusps>) -> bool {
    match houses {
        Some(houses) => houses.is_diurnal(sun),
        None => is_diurnal(sun, asc),
    }
}

/// Composite Part of Fortune from already-computed parts.
///
/// The midpoint method reads `natal_parts` and settles opposite parts with
/// `tie_break`, the composite method reads `composite_part`. `None` when the
/// input the method needs is absent.
pub fn composite_part_of_fortune(
    method: CompositeFortuneMethod,
    natal_parts: Option<(f64, f64)>,
    composite_part: Option<f64>,
    tie_break: MidpointTieBreak,
) -> Result<Option<f64>, ChartError> {
    match method {
        CompositeFortuneMethod::Midpoint => {
            let Some((a, b)) = natal_parts else {
                return Ok(None);
            };
            check_longitude("part_of_fortune", a)?;
            check_longitude("part_of_fortune", b)?;
            midpoint_longitude("part_of_fortune", a, b, tie_break).map(Some)
        }
        CompositeFortuneMethod::Composite => composite_part
            .map(|part| check_longitude("part_of_fortune", part))
            .transpose(),
    }
}
