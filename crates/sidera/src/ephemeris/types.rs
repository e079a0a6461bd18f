use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ChartError;
use crate::western::zodiac::{normalize_360, Sign};

/// Geographic location coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lon: f64,
}

/// Reject longitudes outside [0, 360) or not finite.
pub fn check_longitude(object: &str, lon: f64) -> Result<f64, ChartError> {
    if !lon.is_finite() || !(0.0..360.0).contains(&lon) {
        return Err(ChartError::invalid_position(
            object,
            format!("longitude {} is outside [0, 360)", lon),
        ));
    }
    Ok(lon)
}

/// Position of a chart object at one moment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CelestialPosition {
    /// Object id: "sun", "moon", "asc", ...
    pub id: String,
    /// Ecliptic longitude in degrees [0, 360)
    pub lon: f64,
    /// Daily motion in longitude (degrees per day, negative = retrograde)
    pub speed_lon: f64,
    /// Ecliptic latitude in degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
}

impl CelestialPosition {
    /// Create a validated position.
    pub fn new(id: impl Into<String>, lon: f64, speed_lon: f64) -> Result<Self, ChartError> {
        let position = Self {
            id: id.into(),
            lon,
            speed_lon,
            lat: None,
        };
        position.validate()?;
        Ok(position)
    }

    pub fn with_latitude(mut self, lat: f64) -> Result<Self, ChartError> {
        self.lat = Some(lat);
        self.validate()?;
        Ok(self)
    }

    /// Check the longitude range and that every value is finite.
    pub fn validate(&self) -> Result<(), ChartError> {
        check_longitude(&self.id, self.lon)?;
        if !self.speed_lon.is_finite() {
            return Err(ChartError::invalid_position(
                &self.id,
                format!("daily motion {} is not finite", self.speed_lon),
            ));
        }
        if let Some(lat) = self.lat {
            if !lat.is_finite() {
                return Err(ChartError::invalid_position(
                    &self.id,
                    format!("latitude {} is not finite", lat),
                ));
            }
        }
        Ok(())
    }

    pub fn is_retrograde(&self) -> bool {
        self.speed_lon < 0.0
    }

    pub fn sign(&self) -> Sign {
        Sign::from_longitude(self.lon)
    }

    /// Same object moved by `arc` degrees, longitude wrapped into [0, 360).
    pub fn shifted(&self, arc: f64) -> Self {
        Self {
            id: self.id.clone(),
            lon: normalize_360(self.lon + arc),
            speed_lon: self.speed_lon,
            lat: self.lat,
        }
    }
}

/// Object id -> position, ordered by id so every pairwise walk is deterministic
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionSet {
    pub objects: BTreeMap<String, CelestialPosition>,
}

impl PositionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from positions, validating each one.
    pub fn from_positions(
        positions: impl IntoIterator<Item = CelestialPosition>,
    ) -> Result<Self, ChartError> {
        let mut set = Self::new();
        for position in positions {
            set.insert(position)?;
        }
        Ok(set)
    }

    pub fn insert(&mut self, position: CelestialPosition) -> Result<(), ChartError> {
        position.validate()?;
        self.objects.insert(position.id.clone(), position);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&CelestialPosition> {
        self.objects.get(id)
    }

    /// Look up an object that an operation cannot do without.
    pub fn require(&self, id: &str, operation: &str) -> Result<&CelestialPosition, ChartError> {
        self.get(id).ok_or_else(|| ChartError::missing(id, operation))
    }

    pub fn ids(&self) -> Vec<String> {
        self.objects.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CelestialPosition> {
        self.objects.values()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Validate every position and that each is stored under its own id.
    pub fn validate(&self) -> Result<(), ChartError> {
        for (key, position) in &self.objects {
            if key != &position.id {
                return Err(ChartError::invalid_position(
                    key,
                    format!("stored under {} but carries id {}", key, position.id),
                ));
            }
            position.validate()?;
        }
        Ok(())
    }

    /// Restrict to the listed ids; an empty list keeps everything.
    pub fn filtered(&self, include_objects: &[String]) -> Self {
        if include_objects.is_empty() {
            return self.clone();
        }
        let objects = self
            .objects
            .iter()
            .filter(|(id, _)| include_objects.iter().any(|inc| inc == *id))
            .map(|(id, pos)| (id.clone(), pos.clone()))
            .collect();
        Self { objects }
    }
}

/// House cusps from an external house system computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseCusps {
    /// House system name
    pub system: String,
    /// Cusps 1..12 in degrees; cusp 1 is the Ascendant, cusp 10 the MC
    pub cusps: [f64; 12],
}

impl HouseCusps {
    pub fn validate(&self) -> Result<(), ChartError> {
        for (i, cusp) in self.cusps.iter().enumerate() {
            if !cusp.is_finite() || *cusp < 0.0 || *cusp >= 360.0 {
                return Err(ChartError::invalid_position(
                    &format!("cusp_{}", i + 1),
                    format!("cusp {} is outside [0, 360)", cusp),
                ));
            }
        }
        Ok(())
    }

    pub fn ascendant(&self) -> f64 {
        self.cusps[0]
    }

    pub fn midheaven(&self) -> f64 {
        self.cusps[9]
    }

    /// House number (1-12) containing a longitude.
    pub fn house_of(&self, lon: f64) -> u8 {
        let lon = normalize_360(lon);
        for i in 0..12 {
            let start = self.cusps[i];
            let end = self.cusps[(i + 1) % 12];
            let width = normalize_360(end - start);
            if normalize_360(lon - start) < width {
                return (i + 1) as u8;
            }
        }
        // Degenerate cusps (all equal); everything falls in the first house
        1
    }

    /// Whether the Sun sits above the horizon (houses 7-12).
    pub fn is_diurnal(&self, sun_lon: f64) -> bool {
        self.house_of(sun_lon) >= 7
    }
}
