use chrono::{DateTime, Duration, Utc};

use crate::ephemeris::types::{CelestialPosition, PositionSet};
use crate::error::ChartError;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Source of real ephemeris positions.
///
/// Position computation lives outside this crate; callers plug in whatever
/// ephemeris they use. Only progressions that need actual positions at a
/// moment other than the natal one (daily houses, true solar arc) ask for it.
pub trait EphemerisProvider {
    /// Positions of the requested objects at `moment`.
    fn positions_at(
        &self,
        moment: DateTime<Utc>,
        objects: &[String],
    ) -> Result<PositionSet, ChartError>;
}

/// Provider that extrapolates a reference set along each object's daily motion.
///
/// Good enough for short spans and for tests; it has no notion of stations.
#[derive(Debug, Clone)]
pub struct LinearEphemeris {
    epoch: DateTime<Utc>,
    reference: PositionSet,
}

impl LinearEphemeris {
    pub fn new(epoch: DateTime<Utc>, reference: PositionSet) -> Self {
        Self { epoch, reference }
    }
}

impl EphemerisProvider for LinearEphemeris {
    fn positions_at(
        &self,
        moment: DateTime<Utc>,
        objects: &[String],
    ) -> Result<PositionSet, ChartError> {
        let days = days_between(self.epoch, moment);
        let mut out = PositionSet::new();
        for id in objects {
            let reference = self.reference.get(id).ok_or_else(|| ChartError::Ephemeris {
                message: format!("no reference position for {}", id),
            })?;
            let moved: CelestialPosition = reference.shifted(reference.speed_lon * days);
            out.insert(moved)?;
        }
        Ok(out)
    }
}

/// Fractional days from `from` to `to` (negative if `to` is earlier).
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / MILLIS_PER_DAY
}

/// Move a moment by a fractional number of days.
pub fn add_days(moment: DateTime<Utc>, days: f64) -> DateTime<Utc> {
    moment + Duration::milliseconds((days * MILLIS_PER_DAY).round() as i64)
}
