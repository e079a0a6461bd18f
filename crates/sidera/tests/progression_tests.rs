use chrono::{DateTime, TimeZone, Utc};
use sidera::chart::{
    progressed_days, NaibodRate, ProgressionCalculator, ProgressionMethod, ProgressionSettings,
};
use sidera::constants::{SUN_MEAN_MOTION, YEAR_DAYS};
use sidera::ephemeris::{CelestialPosition, EphemerisProvider, LinearEphemeris, PositionSet};
use sidera::ChartError;

fn natal() -> PositionSet {
    PositionSet::from_positions(vec![
        CelestialPosition::new("sun", 280.37, 1.0194).unwrap(),
        CelestialPosition::new("moon", 223.32, 12.04).unwrap(),
        CelestialPosition::new("saturn", 40.4, -0.02).unwrap(),
        CelestialPosition::new("mc", 290.0, 0.0).unwrap(),
    ])
    .unwrap()
}

fn birth() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap()
}

fn target() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap()
}

/// Provider that always fails, like an ephemeris missing its data files.
struct BrokenEphemeris;

impl EphemerisProvider for BrokenEphemeris {
    fn positions_at(
        &self,
        _moment: DateTime<Utc>,
        _objects: &[String],
    ) -> Result<PositionSet, ChartError> {
        Err(ChartError::Ephemeris {
            message: "data files not found".to_string(),
        })
    }
}

#[test]
fn test_ten_years_is_about_ten_progressed_days() {
    let days = progressed_days(birth(), target());
    // 2000-01-01 to 2010-01-01 spans 3653 days
    assert!((days - 3653.0 / YEAR_DAYS).abs() < 1e-9);
    assert!((days - 10.0016).abs() < 1e-4);
}

#[test]
fn test_naibod_moves_every_object_by_the_same_arc() {
    let result = ProgressionCalculator::new(ProgressionSettings::default())
        .progress(&natal(), birth(), target())
        .unwrap();
    let expected = 3653.0 / YEAR_DAYS * SUN_MEAN_MOTION;

    assert_eq!(result.method, ProgressionMethod::Naibod);
    assert!((result.solar_arc - expected).abs() < 1e-9);
    for id in ["sun", "moon", "saturn", "mc"] {
        assert!((result.arc_of(id).unwrap() - expected).abs() < 1e-9, "{}", id);
    }
    assert!(!result.converse);
    assert!(result.ensure_forward().is_ok());
}

#[test]
fn test_naibod_mean_motion_keeps_mc_on_the_solar_rate() {
    let settings = ProgressionSettings {
        naibod_rate: NaibodRate::MeanMotion,
        ..ProgressionSettings::default()
    };
    let result = ProgressionCalculator::new(settings)
        .progress(&natal(), birth(), target())
        .unwrap();
    let days = 3653.0 / YEAR_DAYS;

    assert!((result.arc_of("mc").unwrap() - days * SUN_MEAN_MOTION).abs() < 1e-9);
    assert!((result.arc_of("saturn").unwrap() - days * 0.033611).abs() < 1e-9);
}

#[test]
fn test_solar_arc_with_ephemeris_uses_true_sun() {
    let settings = ProgressionSettings {
        method: ProgressionMethod::SolarArc,
        ..ProgressionSettings::default()
    };
    let ephemeris = LinearEphemeris::new(birth(), natal());
    let result = ProgressionCalculator::new(settings)
        .with_ephemeris(&ephemeris)
        .progress(&natal(), birth(), target())
        .unwrap();

    let true_arc = 1.0194 * 3653.0 / YEAR_DAYS;
    assert!((result.solar_arc - true_arc).abs() < 1e-6);
    assert!((result.arc_of("moon").unwrap() - result.solar_arc).abs() < 1e-9);
}

#[test]
fn test_ephemeris_failure_propagates() {
    let settings = ProgressionSettings {
        method: ProgressionMethod::SolarArc,
        ..ProgressionSettings::default()
    };
    let err = ProgressionCalculator::new(settings)
        .with_ephemeris(&BrokenEphemeris)
        .progress(&natal(), birth(), target())
        .unwrap_err();
    assert!(matches!(err, ChartError::Ephemeris { .. }));
}

#[test]
fn test_daily_houses_needs_an_ephemeris() {
    let settings = ProgressionSettings {
        method: ProgressionMethod::DailyHouses,
        ..ProgressionSettings::default()
    };
    let err = ProgressionCalculator::new(settings)
        .progress(&natal(), birth(), target())
        .unwrap_err();
    assert!(matches!(err, ChartError::EphemerisUnavailable { .. }));
}

#[test]
fn test_converse_is_flagged_then_refused_when_forward_only() {
    let result = ProgressionCalculator::new(ProgressionSettings::default())
        .progress(&natal(), target(), birth())
        .unwrap();
    assert!(result.converse);
    assert!(result.solar_arc < 0.0);
    assert!(matches!(
        result.ensure_forward(),
        Err(ChartError::ConverseProgression { .. })
    ));

    let strict = ProgressionSettings {
        forward_only: true,
        ..ProgressionSettings::default()
    };
    let err = ProgressionCalculator::new(strict)
        .progress(&natal(), target(), birth())
        .unwrap_err();
    assert!(matches!(err, ChartError::ConverseProgression { .. }));
}

#[test]
fn test_same_moment_changes_nothing() {
    let result = ProgressionCalculator::new(ProgressionSettings::default())
        .progress(&natal(), birth(), birth())
        .unwrap();
    assert_eq!(result.progressed_days, 0.0);
    assert_eq!(result.progressed, result.natal);
    assert!(!result.converse);
}
