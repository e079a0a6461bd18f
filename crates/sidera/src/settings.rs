use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::aspects::{standard_catalog, AspectCalculator, AspectDefinition, OrbMode, OrbTable};
use crate::chart::composite::{CompositeResolver, CompositeSettings};
use crate::chart::progression::ProgressionSettings;
use crate::error::ChartError;
use crate::western::fortune::FortuneFormula;
use crate::western::shape::{ShapeClassifier, ShapeThresholds};

/// Everything the engine can be configured with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub orb_mode: OrbMode,
    pub aspects: Vec<AspectDefinition>,
    /// object -> aspect name -> orb
    pub object_orbs: BTreeMap<String, BTreeMap<String, f64>>,
    /// Objects to keep from each input; empty keeps all
    pub include_objects: Vec<String>,
    pub fortune: FortuneFormula,
    pub progression: ProgressionSettings,
    pub composite: CompositeSettings,
    pub shape: ShapeThresholds,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            orb_mode: OrbMode::default(),
            aspects: standard_catalog(),
            object_orbs: BTreeMap::new(),
            include_objects: Vec::new(),
            fortune: FortuneFormula::default(),
            progression: ProgressionSettings::default(),
            composite: CompositeSettings::default(),
            shape: ShapeThresholds::default(),
        }
    }
}

impl EngineSettings {
    pub fn validate(&self) -> Result<(), ChartError> {
        for aspect in &self.aspects {
            if !aspect.angle.is_finite() || !(0.0..=180.0).contains(&aspect.angle) {
                return Err(ChartError::invalid_setting(
                    &format!("aspects.{}.angle", aspect.name),
                    format!("{} is outside [0, 180]", aspect.angle),
                ));
            }
            if !aspect.default_orb.is_finite() || aspect.default_orb < 0.0 {
                return Err(ChartError::InvalidOrb {
                    object: "catalog".to_string(),
                    aspect: aspect.name.clone(),
                    value: aspect.default_orb,
                });
            }
        }

        for (object, orbs) in &self.object_orbs {
            for (aspect, value) in orbs {
                if !value.is_finite() || *value < 0.0 {
                    return Err(ChartError::InvalidOrb {
                        object: object.clone(),
                        aspect: aspect.clone(),
                        value: *value,
                    });
                }
            }
        }

        self.shape.validate()
    }

    pub fn orb_table(&self) -> OrbTable {
        OrbTable {
            mode: self.orb_mode,
            overrides: self.object_orbs.clone(),
        }
    }

    pub fn aspect_calculator(&self) -> AspectCalculator {
        AspectCalculator::new(self.aspects.clone(), self.orb_table())
    }

    pub fn shape_classifier(&self) -> ShapeClassifier {
        ShapeClassifier::new(self.shape.clone())
    }

    pub fn composite_resolver(&self) -> CompositeResolver {
        CompositeResolver::new(self.composite.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = EngineSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.aspects.len(), 12);
        assert_eq!(settings.orb_mode, OrbMode::Mean);
    }

    #[test]
    fn test_negative_override_rejected() {
        let mut settings = EngineSettings::default();
        settings
            .object_orbs
            .entry("moon".to_string())
            .or_default()
            .insert("trine".to_string(), -1.0);
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, ChartError::InvalidOrb { ref object, .. } if object == "moon"));
    }

    #[test]
    fn test_angle_out_of_range_rejected() {
        let mut settings = EngineSettings::default();
        settings.aspects.push(AspectDefinition::new("bogus", 200.0, 1.0));
        let err = settings.validate().unwrap_err();
        assert!(
            matches!(err, ChartError::InvalidSettings { ref setting, .. } if setting == "aspects.bogus.angle")
        );
    }

    #[test]
    fn test_bad_shape_threshold_rejected() {
        let mut settings = EngineSettings::default();
        settings.shape.seesaw_gap_ratio = 0.0;
        let err = settings.validate().unwrap_err();
        assert!(
            matches!(err, ChartError::InvalidSettings { ref setting, .. } if setting == "shape.seesaw_gap_ratio")
        );
    }

    #[test]
    fn test_orb_table_carries_overrides() {
        let mut settings = EngineSettings::default();
        settings.orb_mode = OrbMode::Max;
        settings
            .object_orbs
            .entry("sun".to_string())
            .or_default()
            .insert("conjunction".to_string(), 12.0);
        let table = settings.orb_table();
        let conjunction = &settings.aspects[0];
        assert_eq!(table.pair_orb("sun", "mars", conjunction).unwrap(), 12.0);
    }
}
