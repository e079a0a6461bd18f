//! Secondary progressions and directions.
//!
//! One solar year of real time maps to one day after birth. The
//! "progressed days" figure is the elapsed time in days divided by
//! [`YEAR_DAYS`]. The methods differ in how they turn that figure into new
//! positions:
//!
//! - `Naibod` moves every object by a mean rate times the progressed days.
//! - `SolarArc` moves every object by the Sun's arc.
//! - `DailyHouses` reads real ephemeris positions at the progressed moment.

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::constants::{mean_motion, SUN, SUN_MEAN_MOTION, YEAR_DAYS};
use crate::ephemeris::provider::{add_days, days_between, EphemerisProvider};
use crate::ephemeris::types::PositionSet;
use crate::error::ChartError;
use crate::western::zodiac::signed_difference;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressionMethod {
    #[default]
    Naibod,
    SolarArc,
    DailyHouses,
}

/// Rate table for the Naibod method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NaibodRate {
    /// The Sun's mean motion for every object
    #[default]
    Uniform,
    /// Each body's own mean motion; objects with no entry (angles, points)
    /// use the Sun's mean motion
    MeanMotion,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionSettings {
    pub method: ProgressionMethod,
    pub naibod_rate: NaibodRate,
    /// Refuse target dates before the natal moment
    pub forward_only: bool,
}

/// Natal positions carried forward to a target date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionResult {
    pub method: ProgressionMethod,
    pub natal_moment: DateTime<Utc>,
    pub target_moment: DateTime<Utc>,
    /// Real days from natal moment to target
    pub elapsed_days: f64,
    /// Elapsed days divided by the solar year
    pub progressed_days: f64,
    /// Natal moment plus the progressed days
    pub progressed_moment: DateTime<Utc>,
    /// Arc the Sun moved, in degrees (negative when converse)
    pub solar_arc: f64,
    /// Target precedes the natal moment
    pub converse: bool,
    pub natal: PositionSet,
    pub progressed: PositionSet,
}

impl ProgressionResult {
    /// Fail for converse results when only forward progression is acceptable.
    pub fn ensure_forward(&self) -> Result<(), ChartError> {
        if self.converse {
            return Err(ChartError::ConverseProgression {
                natal: self.natal_moment,
                target: self.target_moment,
            });
        }
        Ok(())
    }

    /// Signed arc an object moved between natal and progressed positions.
    pub fn arc_of(&self, id: &str) -> Option<f64> {
        let natal = self.natal.get(id)?;
        let progressed = self.progressed.get(id)?;
        Some(signed_difference(progressed.lon, natal.lon))
    }
}

/// Progressed days for a natal moment and a target date.
pub fn progressed_days(natal_moment: DateTime<Utc>, target: DateTime<Utc>) -> f64 {
    days_between(natal_moment, target) / YEAR_DAYS
}

pub struct ProgressionCalculator<'a> {
    settings: ProgressionSettings,
    ephemeris: Option<&'a dyn EphemerisProvider>,
}

impl<'a> ProgressionCalculator<'a> {
    pub fn new(settings: ProgressionSettings) -> Self {
        Self {
            settings,
            ephemeris: None,
        }
    }

    pub fn with_ephemeris(mut self, provider: &'a dyn EphemerisProvider) -> Self {
        self.ephemeris = Some(provider);
        self
    }

    pub fn progress(
        &self,
        natal: &PositionSet,
        natal_moment: DateTime<Utc>,
        target: DateTime<Utc>,
    ) -> Result<ProgressionResult, ChartError> {
        natal.validate()?;

        let converse = target < natal_moment;
        if converse && self.settings.forward_only {
            return Err(ChartError::ConverseProgression {
                natal: natal_moment,
                target,
            });
        }

        let elapsed_days = days_between(natal_moment, target);
        let progressed_days = elapsed_days / YEAR_DAYS;
        let progressed_moment = add_days(natal_moment, progressed_days);
        let mean_arc = progressed_days * SUN_MEAN_MOTION;

        let (progressed, solar_arc) = match self.settings.method {
            ProgressionMethod::Naibod => (
                self.naibod(natal, progressed_days)?,
                mean_arc,
            ),
            ProgressionMethod::SolarArc => {
                let arc = self.solar_arc(natal, progressed_moment, mean_arc)?;
                (shift_all(natal, |_| arc)?, arc)
            }
            ProgressionMethod::DailyHouses => {
                let provider = self.require_ephemeris("daily houses progression")?;
                let progressed = provider.positions_at(progressed_moment, &natal.ids())?;
                progressed.validate()?;
                let arc = match (natal.get(SUN), progressed.get(SUN)) {
                    (Some(n), Some(p)) => signed_difference(p.lon, n.lon),
                    _ => mean_arc,
                };
                (progressed, arc)
            }
        };

        debug!(
            "{:?} progression: {:.4} progressed days, solar arc {:.4}{}",
            self.settings.method,
            progressed_days,
            solar_arc,
            if converse { " (converse)" } else { "" }
        );

        Ok(ProgressionResult {
            method: self.settings.method,
            natal_moment,
            target_moment: target,
            elapsed_days,
            progressed_days,
            progressed_moment,
            solar_arc,
            converse,
            natal: natal.clone(),
            progressed,
        })
    }

    fn naibod(&self, natal: &PositionSet, progressed_days: f64) -> Result<PositionSet, ChartError> {
        match self.settings.naibod_rate {
            NaibodRate::Uniform => shift_all(natal, |_| progressed_days * SUN_MEAN_MOTION),
            NaibodRate::MeanMotion => shift_all(natal, |id| {
                progressed_days * mean_motion(id).unwrap_or(SUN_MEAN_MOTION)
            }),
        }
    }

    /// True solar arc from the ephemeris when one is plugged in, else the mean arc.
    fn solar_arc(
        &self,
        natal: &PositionSet,
        progressed_moment: DateTime<Utc>,
        mean_arc: f64,
    ) -> Result<f64, ChartError> {
        let Some(provider) = self.ephemeris else {
            return Ok(mean_arc);
        };
        let natal_sun = natal.require(SUN, "solar arc progression")?;
        let progressed = provider.positions_at(progressed_moment, &[SUN.to_string()])?;
        let progressed_sun = progressed.require(SUN, "solar arc progression")?;
        progressed_sun.validate()?;
        Ok(signed_difference(progressed_sun.lon, natal_sun.lon))
    }

    fn require_ephemeris(&self, operation: &str) -> Result<&'a dyn EphemerisProvider, ChartError> {
        self.ephemeris
            .ok_or_else(|| ChartError::EphemerisUnavailable {
                operation: operation.to_string(),
            })
    }
}

fn shift_all<F>(natal: &PositionSet, arc_for: F) -> Result<PositionSet, ChartError>
where
    F: Fn(&str) -> f64,
{
    PositionSet::from_positions(natal.iter().map(|p| p.shifted(arc_for(&p.id))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MOON_MEAN_MOTION;
    use crate::ephemeris::provider::LinearEphemeris;
    use crate::ephemeris::types::CelestialPosition;
    use crate::western::zodiac::normalize_360;
    use chrono::TimeZone;

    fn natal_set() -> PositionSet {
        PositionSet::from_positions(vec![
            CelestialPosition::new("sun", 280.0, 1.019).unwrap(),
            CelestialPosition::new("moon", 223.0, 12.0).unwrap(),
            CelestialPosition::new("asc", 190.0, 0.0).unwrap(),
        ])
        .unwrap()
    }

    fn moments() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_naibod_uniform_ten_years() {
        let (natal_moment, target) = moments();
        let result = ProgressionCalculator::new(ProgressionSettings::default())
            .progress(&natal_set(), natal_moment, target)
            .unwrap();

        let expected_days = 3653.0 / YEAR_DAYS;
        assert!((result.elapsed_days - 3653.0).abs() < 1e-9);
        assert!((result.progressed_days - expected_days).abs() < 1e-12);
        assert!(!result.converse);

        let sun = result.progressed.get("sun").unwrap();
        assert!((sun.lon - (280.0 + expected_days * SUN_MEAN_MOTION)).abs() < 1e-9);
        // Uniform rate: every object moves the same arc
        let moon_arc = result.arc_of("moon").unwrap();
        let asc_arc = result.arc_of("asc").unwrap();
        assert!((moon_arc - asc_arc).abs() < 1e-9);
        assert!((result.solar_arc - expected_days * SUN_MEAN_MOTION).abs() < 1e-12);
    }

    #[test]
    fn test_naibod_mean_motion_table() {
        let (natal_moment, target) = moments();
        let settings = ProgressionSettings {
            naibod_rate: NaibodRate::MeanMotion,
            ..ProgressionSettings::default()
        };
        let result = ProgressionCalculator::new(settings)
            .progress(&natal_set(), natal_moment, target)
            .unwrap();
        let days = result.progressed_days;

        let moon = result.progressed.get("moon").unwrap();
        assert!((moon.lon - normalize_360(223.0 + days * MOON_MEAN_MOTION)).abs() < 1e-9);
        // No table entry for the Ascendant: Naibod rate
        let asc = result.progressed.get("asc").unwrap();
        assert!((asc.lon - (190.0 + days * SUN_MEAN_MOTION)).abs() < 1e-9);
    }

    #[test]
    fn test_converse_is_flagged_not_rejected() {
        let (natal_moment, target) = moments();
        let result = ProgressionCalculator::new(ProgressionSettings::default())
            .progress(&natal_set(), target, natal_moment)
            .unwrap();
        assert!(result.converse);
        assert!(result.solar_arc < 0.0);
        assert!(matches!(
            result.ensure_forward(),
            Err(ChartError::ConverseProgression { .. })
        ));
    }

    #[test]
    fn test_forward_only_policy() {
        let (natal_moment, target) = moments();
        let settings = ProgressionSettings {
            forward_only: true,
            ..ProgressionSettings::default()
        };
        let err = ProgressionCalculator::new(settings)
            .progress(&natal_set(), target, natal_moment)
            .unwrap_err();
        assert!(matches!(err, ChartError::ConverseProgression { .. }));
    }

    #[test]
    fn test_solar_arc_uses_ephemeris_sun() {
        let (natal_moment, target) = moments();
        let natal = natal_set();
        let ephemeris = LinearEphemeris::new(natal_moment, natal.clone());
        let settings = ProgressionSettings {
            method: ProgressionMethod::SolarArc,
            ..ProgressionSettings::default()
        };

        let mean = ProgressionCalculator::new(settings.clone())
            .progress(&natal, natal_moment, target)
            .unwrap();
        assert!((mean.solar_arc - mean.progressed_days * SUN_MEAN_MOTION).abs() < 1e-12);

        let real = ProgressionCalculator::new(settings)
            .with_ephemeris(&ephemeris)
            .progress(&natal, natal_moment, target)
            .unwrap();
        // Linear ephemeris moves the Sun at its natal speed; the moment is rounded to the ms
        assert!((real.solar_arc - real.progressed_days * 1.019).abs() < 1e-6);
        assert!((real.arc_of("moon").unwrap() - real.solar_arc).abs() < 1e-9);
    }

    #[test]
    fn test_daily_houses_needs_ephemeris() {
        let (natal_moment, target) = moments();
        let settings = ProgressionSettings {
            method: ProgressionMethod::DailyHouses,
            ..ProgressionSettings::default()
        };
        let err = ProgressionCalculator::new(settings.clone())
            .progress(&natal_set(), natal_moment, target)
            .unwrap_err();
        assert!(matches!(err, ChartError::EphemerisUnavailable { .. }));

        let natal = natal_set();
        let ephemeris = LinearEphemeris::new(natal_moment, natal.clone());
        let result = ProgressionCalculator::new(settings)
            .with_ephemeris(&ephemeris)
            .progress(&natal, natal_moment, target)
            .unwrap();
        let moon = result.progressed.get("moon").unwrap();
        assert!((moon.lon - normalize_360(223.0 + 12.0 * result.progressed_days)).abs() < 1e-5);
        // Ascendant has no motion in the reference set
        assert!((result.progressed.get("asc").unwrap().lon - 190.0).abs() < 1e-12);
    }
}
