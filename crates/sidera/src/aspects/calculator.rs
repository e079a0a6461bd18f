use log::debug;
use std::collections::BTreeMap;

use crate::aspects::orbs::OrbTable;
use crate::aspects::types::{
    standard_catalog, Aspect, AspectDefinition, AspectDirection, AspectObjectRef, AspectPair,
    AspectPhase, AspectSet, AspectSetKind,
};
use crate::constants::{MAX_ERROR, STATION_SPEED};
use crate::ephemeris::types::{CelestialPosition, PositionSet};
use crate::error::ChartError;
use crate::western::zodiac::{angular_separation, signed_difference};

/// Find the aspect, if any, between two positions.
///
/// `orb_fn` gives the effective orb for each candidate. When several
/// candidates fall within orb the smallest deviation wins, and on a tie the
/// lower angle.
pub fn match_aspect<F>(
    pos_a: &CelestialPosition,
    pos_b: &CelestialPosition,
    candidates: &[AspectDefinition],
    orb_fn: F,
) -> Result<Option<Aspect>, ChartError>
where
    F: Fn(&AspectDefinition) -> Result<f64, ChartError>,
{
    pos_a.validate()?;
    pos_b.validate()?;

    let separation = angular_separation(pos_a.lon, pos_b.lon);
    let mut best: Option<(&AspectDefinition, f64, f64)> = None;

    for candidate in candidates {
        let orb = orb_fn(candidate)?;
        let deviation = (separation - candidate.angle).abs();
        if deviation > orb {
            continue;
        }
        let better = match best {
            None => true,
            Some((current, current_dev, _)) => {
                deviation < current_dev
                    || (deviation == current_dev && candidate.angle < current.angle)
            }
        };
        if better {
            best = Some((candidate, deviation, orb));
        }
    }

    Ok(best.map(|(definition, _, orb)| Aspect {
        aspect_type: definition.name.clone(),
        exact_angle: definition.angle,
        separation,
        deviation: separation - definition.angle,
        orb,
        phase: classify_phase(pos_a, pos_b, definition.angle, separation),
        direction: classify_direction(pos_a.speed_lon, pos_b.speed_lon),
    }))
}

/// Applicative while the separation closes on the exact angle.
fn classify_phase(
    pos_a: &CelestialPosition,
    pos_b: &CelestialPosition,
    exact_angle: f64,
    separation: f64,
) -> AspectPhase {
    let deviation = separation - exact_angle;
    if deviation.abs() <= MAX_ERROR {
        return AspectPhase::Exact;
    }

    let relative_speed = pos_a.speed_lon - pos_b.speed_lon;
    let signed = signed_difference(pos_a.lon, pos_b.lon);

    // Rate of change of the unsigned separation. At 0 any relative motion
    // widens it, at 180 any relative motion narrows it.
    let separation_rate = if signed == 0.0 {
        relative_speed.abs()
    } else if signed == 180.0 {
        -relative_speed.abs()
    } else {
        signed.signum() * relative_speed
    };

    if deviation.signum() * separation_rate < 0.0 {
        AspectPhase::Applicative
    } else {
        AspectPhase::Separative
    }
}

/// Stationary bodies never count as moving against the other body.
fn classify_direction(speed_a: f64, speed_b: f64) -> AspectDirection {
    let stationary = speed_a.abs() < STATION_SPEED || speed_b.abs() < STATION_SPEED;
    if stationary || speed_a.signum() == speed_b.signum() {
        AspectDirection::Associate
    } else {
        AspectDirection::Dissociate
    }
}

/// Aspect calculator over a caller-supplied catalog and orb table
#[derive(Debug, Clone)]
pub struct AspectCalculator {
    catalog: Vec<AspectDefinition>,
    orbs: OrbTable,
}

impl AspectCalculator {
    pub fn new(catalog: Vec<AspectDefinition>, orbs: OrbTable) -> Self {
        Self { catalog, orbs }
    }

    pub fn catalog(&self) -> &[AspectDefinition] {
        &self.catalog
    }

    pub fn orbs(&self) -> &OrbTable {
        &self.orbs
    }

    /// Aspect between two positions using this calculator's orb table.
    pub fn calculate_aspect(
        &self,
        pos_a: &CelestialPosition,
        pos_b: &CelestialPosition,
    ) -> Result<Option<Aspect>, ChartError> {
        match_aspect(pos_a, pos_b, &self.catalog, |definition| {
            self.orbs.pair_orb(&pos_a.id, &pos_b.id, definition)
        })
    }

    /// Compute aspects within a single layer
    pub fn compute_intra_layer_aspects(
        &self,
        layer_id: &str,
        positions: &PositionSet,
    ) -> Result<AspectSet, ChartError> {
        let objects: Vec<&CelestialPosition> = positions.iter().collect();

        let mut pairs = BTreeMap::new();
        for i in 0..objects.len() {
            for j in (i + 1)..objects.len() {
                if let Some(aspect) = self.calculate_aspect(objects[i], objects[j])? {
                    let pair = make_pair(layer_id, objects[i], layer_id, objects[j], aspect);
                    pairs.insert(pair.key(), pair);
                }
            }
        }

        debug!(
            "{} aspects among {} objects in layer {}",
            pairs.len(),
            objects.len(),
            layer_id
        );

        Ok(AspectSet {
            id: layer_id.to_string(),
            kind: AspectSetKind::IntraLayer,
            layer_ids: vec![layer_id.to_string()],
            pairs,
        })
    }

    /// Compute aspects between two layers
    pub fn compute_inter_layer_aspects(
        &self,
        layer_id_a: &str,
        layer_id_b: &str,
        positions_a: &PositionSet,
        positions_b: &PositionSet,
    ) -> Result<AspectSet, ChartError> {
        let mut pairs = BTreeMap::new();
        for pos_a in positions_a.iter() {
            for pos_b in positions_b.iter() {
                if let Some(aspect) = self.calculate_aspect(pos_a, pos_b)? {
                    let pair = make_pair(layer_id_a, pos_a, layer_id_b, pos_b, aspect);
                    pairs.insert(pair.key(), pair);
                }
            }
        }

        debug!(
            "{} aspects between layers {} and {}",
            pairs.len(),
            layer_id_a,
            layer_id_b
        );

        Ok(AspectSet {
            id: format!("{}:{}", layer_id_a, layer_id_b),
            kind: AspectSetKind::InterLayer,
            layer_ids: vec![layer_id_a.to_string(), layer_id_b.to_string()],
            pairs,
        })
    }

    /// Compute all aspect sets for multiple layers
    pub fn compute_all_aspect_sets(
        &self,
        layers: &BTreeMap<String, PositionSet>,
    ) -> Result<BTreeMap<String, AspectSet>, ChartError> {
        let mut aspect_sets = BTreeMap::new();
        let layer_ids: Vec<&String> = layers.keys().collect();

        for (layer_id, positions) in layers {
            let set = self.compute_intra_layer_aspects(layer_id, positions)?;
            aspect_sets.insert(set.id.clone(), set);
        }

        for i in 0..layer_ids.len() {
            for j in (i + 1)..layer_ids.len() {
                let set = self.compute_inter_layer_aspects(
                    layer_ids[i],
                    layer_ids[j],
                    &layers[layer_ids[i]],
                    &layers[layer_ids[j]],
                )?;
                aspect_sets.insert(set.id.clone(), set);
            }
        }

        Ok(aspect_sets)
    }
}

impl Default for AspectCalculator {
    fn default() -> Self {
        Self::new(standard_catalog(), OrbTable::default())
    }
}

fn make_pair(
    layer_a: &str,
    pos_a: &CelestialPosition,
    layer_b: &str,
    pos_b: &CelestialPosition,
    aspect: Aspect,
) -> AspectPair {
    AspectPair {
        from: AspectObjectRef {
            layer_id: layer_a.to_string(),
            object_id: pos_a.id.clone(),
        },
        to: AspectObjectRef {
            layer_id: layer_b.to_string(),
            object_id: pos_b.id.clone(),
        },
        aspect,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aspects::orbs::OrbMode;

    fn pos(id: &str, lon: f64, speed: f64) -> CelestialPosition {
        CelestialPosition::new(id, lon, speed).unwrap()
    }

    fn fixed_orb(orb: f64) -> impl Fn(&AspectDefinition) -> Result<f64, ChartError> {
        move |_| Ok(orb)
    }

    #[test]
    fn test_square_found_across_aries_point() {
        let catalog = standard_catalog();
        let aspect = match_aspect(&pos("sun", 350.0, 1.0), &pos("mars", 82.0, 0.5), &catalog, fixed_orb(3.0))
            .unwrap()
            .unwrap();
        assert_eq!(aspect.aspect_type, "square");
        assert!((aspect.separation - 92.0).abs() < 1e-9);
        assert!((aspect.deviation - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_aspect_outside_orb() {
        let catalog = standard_catalog();
        let result = match_aspect(&pos("sun", 0.0, 1.0), &pos("moon", 100.0, 13.0), &catalog, fixed_orb(3.0)).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_smallest_deviation_wins() {
        // 47 degrees is 2 from semisquare and 4.43 from septile
        let catalog = standard_catalog();
        let aspect = match_aspect(&pos("a", 0.0, 1.0), &pos("b", 47.0, 1.0), &catalog, fixed_orb(5.0))
            .unwrap()
            .unwrap();
        assert_eq!(aspect.aspect_type, "semisquare");
    }

    #[test]
    fn test_tie_goes_to_lower_angle() {
        let catalog = vec![
            AspectDefinition::new("wide", 100.0, 5.0),
            AspectDefinition::new("narrow", 90.0, 5.0),
        ];
        let aspect = match_aspect(&pos("a", 0.0, 1.0), &pos("b", 95.0, 1.0), &catalog, fixed_orb(5.0))
            .unwrap()
            .unwrap();
        assert_eq!(aspect.aspect_type, "narrow");
    }

    #[test]
    fn test_applicative_when_faster_body_closes() {
        // Moon behind Sun by 5 degrees and faster: conjunction applying
        let catalog = standard_catalog();
        let aspect = match_aspect(&pos("moon", 95.0, 13.0), &pos("sun", 100.0, 1.0), &catalog, fixed_orb(8.0))
            .unwrap()
            .unwrap();
        assert_eq!(aspect.aspect_type, "conjunction");
        assert_eq!(aspect.phase, AspectPhase::Applicative);

        // Moon ahead of Sun: separating
        let aspect = match_aspect(&pos("moon", 105.0, 13.0), &pos("sun", 100.0, 1.0), &catalog, fixed_orb(8.0))
            .unwrap()
            .unwrap();
        assert_eq!(aspect.phase, AspectPhase::Separative);
    }

    #[test]
    fn test_applicative_trine_from_wide_side() {
        // Separation 124, shrinking because b is catching up on a from behind the trine
        let catalog = standard_catalog();
        let aspect = match_aspect(&pos("a", 124.0, 0.1), &pos("b", 0.0, 1.0), &catalog, fixed_orb(8.0))
            .unwrap()
            .unwrap();
        assert_eq!(aspect.aspect_type, "trine");
        assert_eq!(aspect.phase, AspectPhase::Applicative);
    }

    #[test]
    fn test_exact_within_max_error() {
        let catalog = standard_catalog();
        let aspect = match_aspect(&pos("a", 10.0, 1.0), &pos("b", 130.0000001, 0.5), &catalog, fixed_orb(8.0))
            .unwrap()
            .unwrap();
        assert_eq!(aspect.phase, AspectPhase::Exact);
        assert!(aspect.is_exact());
    }

    #[test]
    fn test_direction_classification() {
        assert_eq!(classify_direction(1.0, 0.5), AspectDirection::Associate);
        assert_eq!(classify_direction(-1.0, -0.5), AspectDirection::Associate);
        assert_eq!(classify_direction(1.0, -0.5), AspectDirection::Dissociate);
        // Station within STATION_SPEED counts as stationary, not retrograde
        assert_eq!(classify_direction(1.0, -0.0002), AspectDirection::Associate);
        assert_eq!(classify_direction(0.0, -1.0), AspectDirection::Associate);
    }

    #[test]
    fn test_increasing_orb_keeps_aspects() {
        let catalog = standard_catalog();
        let others = [3.0, 29.0, 47.0, 61.5, 88.0, 118.0, 137.0, 146.0, 152.0, 176.0];
        for &lon in &others {
            let a = pos("a", 0.0, 1.0);
            let b = pos("b", lon, 0.3);
            let mut found_before = false;
            for orb in [0.5, 1.0, 2.0, 4.0, 8.0] {
                let found = match_aspect(&a, &b, &catalog, fixed_orb(orb)).unwrap().is_some();
                assert!(!found_before || found, "aspect lost at lon {} orb {}", lon, orb);
                found_before = found;
            }
        }
    }

    #[test]
    fn test_intra_layer_uses_object_orbs() {
        let positions = PositionSet::from_positions(vec![
            pos("sun", 100.0, 1.0),
            pos("moon", 106.0, 13.0),
            pos("pluto", 220.0, 0.01),
        ])
        .unwrap();
        let calculator = AspectCalculator::new(standard_catalog(), OrbTable::new(OrbMode::Max));
        let set = calculator.compute_intra_layer_aspects("natal", &positions).unwrap();

        assert_eq!(set.kind, AspectSetKind::IntraLayer);
        assert!(set.get("moon", "sun").is_some());
        assert!(set.get("sun", "moon").is_some());
        // Sun-Pluto trine is exact at 120
        let trine = set.get("pluto", "sun").unwrap();
        assert_eq!(trine.aspect.aspect_type, "trine");
        assert_eq!(trine.aspect.phase, AspectPhase::Exact);
    }

    #[test]
    fn test_invalid_position_rejected() {
        let catalog = standard_catalog();
        let bad = CelestialPosition {
            id: "mars".to_string(),
            lon: 361.0,
            speed_lon: 0.5,
            lat: None,
        };
        let err = match_aspect(&pos("sun", 0.0, 1.0), &bad, &catalog, fixed_orb(3.0)).unwrap_err();
        assert!(matches!(err, ChartError::InvalidPosition { .. }));
    }
}
