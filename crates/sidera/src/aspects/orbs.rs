//! Orb resolution for pairs of chart objects.
//!
//! Every object carries its own maximum orb per aspect. When two objects
//! with different orbs meet, the pair's orb is either their mean or the
//! larger of the two.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::aspects::types::AspectDefinition;
use crate::error::ChartError;

/// How two per-object orbs combine into one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrbMode {
    #[default]
    Mean,
    Max,
}

/// Maximum orb of one object for one aspect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartObjectOrb {
    pub object: String,
    pub aspect: String,
    pub orb: f64,
}

fn check_orb(object: &str, aspect: &str, value: f64) -> Result<f64, ChartError> {
    if value.is_nan() || value < 0.0 || value.is_infinite() {
        return Err(ChartError::InvalidOrb {
            object: object.to_string(),
            aspect: aspect.to_string(),
            value,
        });
    }
    Ok(value)
}

/// Combine two orbs. Fails if either is negative or not a number.
pub fn effective_orb(orb_a: f64, orb_b: f64, mode: OrbMode) -> Result<f64, ChartError> {
    let a = check_orb("first object", "any", orb_a)?;
    let b = check_orb("second object", "any", orb_b)?;
    Ok(match mode {
        OrbMode::Mean => (a + b) / 2.0,
        OrbMode::Max => a.max(b),
    })
}

/// Per-object orb overrides on top of each aspect's default orb
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrbTable {
    #[serde(default)]
    pub mode: OrbMode,
    /// object -> aspect name -> orb
    #[serde(default)]
    pub overrides: BTreeMap<String, BTreeMap<String, f64>>,
}

impl OrbTable {
    pub fn new(mode: OrbMode) -> Self {
        Self {
            mode,
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_override(mut self, orb: ChartObjectOrb) -> Self {
        self.set(orb);
        self
    }

    pub fn set(&mut self, orb: ChartObjectOrb) {
        self.overrides
            .entry(orb.object)
            .or_default()
            .insert(orb.aspect, orb.orb);
    }

    /// Orb an object allows for an aspect: its override, else the aspect default.
    pub fn object_orb(&self, object: &str, aspect: &AspectDefinition) -> Result<f64, ChartError> {
        let value = self
            .overrides
            .get(object)
            .and_then(|orbs| orbs.get(&aspect.name))
            .copied()
            .unwrap_or(aspect.default_orb);
        check_orb(object, &aspect.name, value)
    }

    /// Effective orb for a pair of objects under this table's mode.
    pub fn pair_orb(
        &self,
        object_a: &str,
        object_b: &str,
        aspect: &AspectDefinition,
    ) -> Result<f64, ChartError> {
        let a = self.object_orb(object_a, aspect)?;
        let b = self.object_orb(object_b, aspect)?;
        effective_orb(a, b, self.mode)
    }
}
