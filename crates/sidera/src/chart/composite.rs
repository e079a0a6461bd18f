//! Composite charts built from two subjects.
//!
//! Both methods place each shared object at the shorter-arc midpoint of its
//! two longitudes. `Composite` also derives a synthetic event (midpoint
//! moment and location, Davison style) that an external house computation
//! can use.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::constants::MAX_ERROR;
use crate::ephemeris::types::{CelestialPosition, GeoLocation, PositionSet};
use crate::error::ChartError;
use crate::western::fortune::CompositeFortuneMethod;
use crate::western::zodiac::{circular_midpoint, normalize_360};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeMethod {
    #[default]
    Midpoint,
    Composite,
}

/// What to do when two longitudes are exactly opposite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MidpointTieBreak {
    /// No tie-break: fail with `AmbiguousMidpoint`
    #[default]
    Reject,
    /// Average of the raw longitudes, mod 360; independent of subject order
    RawAverage,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeSettings {
    pub method: CompositeMethod,
    pub tie_break: MidpointTieBreak,
    pub fortune: CompositeFortuneMethod,
}

/// One subject's natal data as the composite needs it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSubject {
    pub moment: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<GeoLocation>,
    pub positions: PositionSet,
}

/// Synthetic moment and place standing for the relationship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeEvent {
    pub moment: DateTime<Utc>,
    pub location: Option<GeoLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeChart {
    pub method: CompositeMethod,
    pub positions: PositionSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<CompositeEvent>,
    /// Objects present in only one subject
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dropped: Vec<String>,
}

/// Midpoint of two longitudes under a tie-break rule.
pub fn midpoint_longitude(
    object: &str,
    lon_a: f64,
    lon_b: f64,
    tie_break: MidpointTieBreak,
) -> Result<f64, ChartError> {
    if let Some(mid) = circular_midpoint(lon_a, lon_b, MAX_ERROR) {
        return Ok(mid);
    }
    match tie_break {
        MidpointTieBreak::Reject => Err(ChartError::AmbiguousMidpoint {
            object: object.to_string(),
            lon_a,
            lon_b,
        }),
        MidpointTieBreak::RawAverage => Ok(normalize_360((lon_a + lon_b) / 2.0)),
    }
}

/// Midpoint moment and location of two subjects.
pub fn davison_event(
    moment_a: DateTime<Utc>,
    location_a: Option<GeoLocation>,
    moment_b: DateTime<Utc>,
    location_b: Option<GeoLocation>,
) -> CompositeEvent {
    let (earlier, later) = if moment_a <= moment_b {
        (moment_a, moment_b)
    } else {
        (moment_b, moment_a)
    };
    let moment = earlier + (later - earlier) / 2;

    let location = match (location_a, location_b) {
        (Some(a), Some(b)) => {
            let east_a = normalize_360(a.lon);
            let east_b = normalize_360(b.lon);
            let mid = circular_midpoint(east_a, east_b, MAX_ERROR)
                .unwrap_or_else(|| normalize_360((east_a + east_b) / 2.0));
            let lon = if mid >= 180.0 { mid - 360.0 } else { mid };
            Some(GeoLocation {
                lat: (a.lat + b.lat) / 2.0,
                lon,
            })
        }
        _ => None,
    };

    CompositeEvent { moment, location }
}

#[derive(Debug, Clone, Default)]
pub struct CompositeResolver {
    settings: CompositeSettings,
}

impl CompositeResolver {
    pub fn new(settings: CompositeSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CompositeSettings {
        &self.settings
    }

    /// Composite positions for the objects both sets share.
    pub fn composite(
        &self,
        positions_a: &PositionSet,
        positions_b: &PositionSet,
    ) -> Result<PositionSet, ChartError> {
        Ok(self.midpoints(positions_a, positions_b)?.0)
    }

    /// Full composite chart, with the synthetic event for the composite method.
    pub fn resolve(
        &self,
        subject_a: &ChartSubject,
        subject_b: &ChartSubject,
    ) -> Result<CompositeChart, ChartError> {
        let (positions, dropped) = self.midpoints(&subject_a.positions, &subject_b.positions)?;

        let event = match self.settings.method {
            CompositeMethod::Midpoint => None,
            CompositeMethod::Composite => Some(davison_event(
                subject_a.moment,
                subject_a.location,
                subject_b.moment,
                subject_b.location,
            )),
        };

        debug!(
            "{:?} composite with {} objects",
            self.settings.method,
            positions.len()
        );

        Ok(CompositeChart {
            method: self.settings.method,
            positions,
            event,
            dropped,
        })
    }

    fn midpoints(
        &self,
        positions_a: &PositionSet,
        positions_b: &PositionSet,
    ) -> Result<(PositionSet, Vec<String>), ChartError> {
        positions_a.validate()?;
        positions_b.validate()?;

        let mut out = PositionSet::new();
        let mut dropped = Vec::new();

        for a in positions_a.iter() {
            let Some(b) = positions_b.get(&a.id) else {
                dropped.push(a.id.clone());
                continue;
            };
            let lon = midpoint_longitude(&a.id, a.lon, b.lon, self.settings.tie_break)?;
            let lat = match (a.lat, b.lat) {
                (Some(la), Some(lb)) => Some((la + lb) / 2.0),
                _ => None,
            };
            out.insert(CelestialPosition {
                id: a.id.clone(),
                lon,
                speed_lon: (a.speed_lon + b.speed_lon) / 2.0,
                lat,
            })?;
        }
        dropped.extend(
            positions_b
                .iter()
                .filter(|b| positions_a.get(&b.id).is_none())
                .map(|b| b.id.clone()),
        );
        dropped.sort();

        if !dropped.is_empty() {
            warn!("composite dropped objects present in only one chart: {:?}", dropped);
        }
        Ok((out, dropped))
    }
}
