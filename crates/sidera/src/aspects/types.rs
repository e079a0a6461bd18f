use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants;

/// A named exact angle with the orb used when no object overrides it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectDefinition {
    /// Aspect name: "conjunction", "trine", etc.
    pub name: String,
    /// Exact angle in degrees, 0-180
    pub angle: f64,
    /// Default maximum orb in degrees
    pub default_orb: f64,
}

impl AspectDefinition {
    pub fn new(name: impl Into<String>, angle: f64, default_orb: f64) -> Self {
        Self {
            name: name.into(),
            angle,
            default_orb,
        }
    }
}

lazy_static::lazy_static! {
    static ref STANDARD_CATALOG: Vec<AspectDefinition> = vec![
        AspectDefinition::new("conjunction", constants::CONJUNCTION, 10.0),
        AspectDefinition::new("opposition", constants::OPPOSITION, 10.0),
        AspectDefinition::new("square", constants::SQUARE, 10.0),
        AspectDefinition::new("trine", constants::TRINE, 10.0),
        AspectDefinition::new("sextile", constants::SEXTILE, 6.0),
        AspectDefinition::new("septile", constants::SEPTILE, 3.0),
        AspectDefinition::new("semisquare", constants::SEMISQUARE, 3.0),
        AspectDefinition::new("sesquisquare", constants::SESQUISQUARE, 3.0),
        AspectDefinition::new("semisextile", constants::SEMISEXTILE, 3.0),
        AspectDefinition::new("quincunx", constants::QUINCUNX, 3.0),
        AspectDefinition::new("quintile", constants::QUINTILE, 2.0),
        AspectDefinition::new("biquintile", constants::BIQUINTILE, 2.0),
    ];
}

/// The twelve aspects with their customary default orbs.
pub fn standard_catalog() -> Vec<AspectDefinition> {
    STANDARD_CATALOG.clone()
}

/// Whether the aspect is closing on, at, or moving away from exact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectPhase {
    Applicative,
    Exact,
    Separative,
}

/// Whether the two bodies travel the same way around the zodiac
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectDirection {
    Associate,
    Dissociate,
}

/// Resolved aspect between two positions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aspect {
    /// Matched aspect
    pub aspect_type: String,
    /// Exact angle for this aspect
    pub exact_angle: f64,
    /// Current separation of the two bodies, 0-180
    pub separation: f64,
    /// Signed deviation from exact (separation - exact angle)
    pub deviation: f64,
    /// Effective orb the deviation was tested against
    pub orb: f64,
    pub phase: AspectPhase,
    pub direction: AspectDirection,
}

impl Aspect {
    pub fn is_exact(&self) -> bool {
        self.phase == AspectPhase::Exact
    }

    pub fn is_applying(&self) -> bool {
        self.phase == AspectPhase::Applicative
    }
}

/// Reference to an object in an aspect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectObjectRef {
    pub layer_id: String,
    pub object_id: String, // "sun", "moon", "asc", ...
}

/// An aspect pair between two objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectPair {
    pub from: AspectObjectRef,
    pub to: AspectObjectRef,
    pub aspect: Aspect,
}

impl AspectPair {
    /// Pair identifier, "from:to"
    pub fn key(&self) -> String {
        format!("{}:{}", self.from.object_id, self.to.object_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectSetKind {
    IntraLayer,
    InterLayer,
}

/// A set of aspects (within one position set or across two)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectSet {
    pub id: String,
    pub kind: AspectSetKind,
    pub layer_ids: Vec<String>,
    /// Pair identifier -> pair
    pub pairs: BTreeMap<String, AspectPair>,
}

impl AspectSet {
    /// Look up a pair. Within one layer the order of the ids does not matter;
    /// across layers `from` belongs to the first layer.
    pub fn get(&self, from: &str, to: &str) -> Option<&AspectPair> {
        let direct = self.pairs.get(&format!("{}:{}", from, to));
        match self.kind {
            AspectSetKind::IntraLayer => {
                direct.or_else(|| self.pairs.get(&format!("{}:{}", to, from)))
            }
            AspectSetKind::InterLayer => direct,
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_angles_in_range() {
        let catalog = standard_catalog();
        assert_eq!(catalog.len(), 12);
        assert!(catalog.iter().all(|a| (0.0..=180.0).contains(&a.angle)));
        assert!(catalog.iter().any(|a| a.name == "septile" && a.angle == 51.43));
    }
}
