//! Chart shape classification (Bundle, Bucket, Bowl, Locomotive, Seesaw,
//! Splay, Splash).
//!
//! The classifier builds a gap profile once (bodies sorted by longitude, the
//! circular gaps between neighbours, occupied signs) and then runs an
//! ordered list of rules over it. The first rule that matches decides the
//! shape. All thresholds live in [`ShapeThresholds`].

use log::debug;
use serde::{Deserialize, Serialize};

use crate::ephemeris::types::{CelestialPosition, PositionSet};
use crate::error::ChartError;
use crate::western::zodiac::{angular_separation, normalize_360, sign_index, Sign};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartShape {
    Bundle,
    Bucket,
    Bowl,
    Locomotive,
    Seesaw,
    Splay,
    Splash,
}

/// Angles (degrees) and ratios that drive the shape rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeThresholds {
    /// Widest occupied arc for a Bundle
    pub bundle_span: f64,
    /// Widest arc the non-handle bodies of a Bucket may occupy
    pub bucket_span: f64,
    /// How far the handle may sit from exact opposition to the cluster midpoint
    pub handle_orb: f64,
    /// A Bowl occupies an arc narrower than this
    pub bowl_span: f64,
    /// A Seesaw has exactly two empty sectors at least this wide
    pub seesaw_min_gap: f64,
    /// Smaller Seesaw gap / larger Seesaw gap must reach this
    pub seesaw_gap_ratio: f64,
    /// Empty sector of a Locomotive must be at least this wide
    pub locomotive_min_gap: f64,
    /// Locomotive gap / next largest gap must reach this
    pub locomotive_gap_ratio: f64,
    /// Largest gap at or above this is a Splay, below it a Splash
    pub splay_min_gap: f64,
}

impl Default for ShapeThresholds {
    fn default() -> Self {
        Self {
            bundle_span: 120.0,
            bucket_span: 120.0,
            handle_orb: 10.0,
            bowl_span: 180.0,
            seesaw_min_gap: 120.0,
            seesaw_gap_ratio: 0.5,
            locomotive_min_gap: 120.0,
            locomotive_gap_ratio: 2.0,
            splay_min_gap: 60.0,
        }
    }
}

impl ShapeThresholds {
    /// Arcs must lie in [0, 360], ratios must be positive.
    pub fn validate(&self) -> Result<(), ChartError> {
        let arcs = [
            ("bundle_span", self.bundle_span),
            ("bucket_span", self.bucket_span),
            ("handle_orb", self.handle_orb),
            ("bowl_span", self.bowl_span),
            ("seesaw_min_gap", self.seesaw_min_gap),
            ("locomotive_min_gap", self.locomotive_min_gap),
            ("splay_min_gap", self.splay_min_gap),
        ];
        for (name, value) in arcs {
            if !value.is_finite() || !(0.0..=360.0).contains(&value) {
                return Err(ChartError::invalid_setting(
                    &format!("shape.{}", name),
                    format!("{} is outside [0, 360]", value),
                ));
            }
        }
        let ratios = [
            ("seesaw_gap_ratio", self.seesaw_gap_ratio),
            ("locomotive_gap_ratio", self.locomotive_gap_ratio),
        ];
        for (name, value) in ratios {
            if !value.is_finite() || value <= 0.0 {
                return Err(ChartError::invalid_setting(
                    &format!("shape.{}", name),
                    format!("{} must be positive", value),
                ));
            }
        }
        Ok(())
    }
}

/// Circular distribution of bodies around the zodiac
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapProfile {
    /// Object ids sorted by longitude
    pub object_ids: Vec<String>,
    /// Longitudes in the same order
    pub longitudes: Vec<f64>,
    /// `gaps[i]` runs from body `i` to the next body zodiacally (wrapping)
    pub gaps: Vec<f64>,
    pub largest_gap: f64,
    pub largest_gap_index: usize,
    pub second_gap: f64,
    /// Arc the bodies occupy, 360 minus the largest gap
    pub span: f64,
    pub occupied_signs: usize,
    /// Runs of consecutive occupied signs
    pub sign_groups: Vec<Vec<Sign>>,
}

impl GapProfile {
    pub fn from_positions(positions: &PositionSet) -> Result<Self, ChartError> {
        if positions.is_empty() {
            return Err(ChartError::UnresolvableShape {
                reason: "no bodies to classify".to_string(),
            });
        }
        positions.validate()?;

        let mut bodies: Vec<&CelestialPosition> = positions.iter().collect();
        bodies.sort_by(|a, b| a.lon.total_cmp(&b.lon).then_with(|| a.id.cmp(&b.id)));

        let longitudes: Vec<f64> = bodies.iter().map(|p| p.lon).collect();
        let object_ids: Vec<String> = bodies.iter().map(|p| p.id.clone()).collect();
        let gaps = circular_gaps(&longitudes);

        let (largest_gap_index, largest_gap) = largest(&gaps);
        let second_gap = gaps
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != largest_gap_index)
            .map(|(_, g)| *g)
            .fold(0.0, f64::max);

        let mut occupied = [false; 12];
        for lon in &longitudes {
            occupied[sign_index(*lon)] = true;
        }

        Ok(Self {
            object_ids,
            span: 360.0 - largest_gap,
            longitudes,
            gaps,
            largest_gap,
            largest_gap_index,
            second_gap,
            occupied_signs: occupied.iter().filter(|o| **o).count(),
            sign_groups: sign_groups(&occupied),
        })
    }

    pub fn len(&self) -> usize {
        self.longitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.longitudes.is_empty()
    }
}

/// Result of shape classification with the details that decided it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeAnalysis {
    pub shape: ChartShape,
    /// Bucket handle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    /// Locomotive leading body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leading: Option<String>,
    pub profile: GapProfile,
}

struct ShapeMatch {
    shape: ChartShape,
    focal: Option<String>,
}

type ShapeRule = fn(&GapProfile, &ShapeThresholds) -> Option<ShapeMatch>;

const RULES: &[(&str, ShapeRule)] = &[
    ("bundle", bundle),
    ("bucket", bucket),
    ("bowl", bowl),
    ("seesaw", seesaw),
    ("locomotive", locomotive),
    ("splay", splay),
];

#[derive(Debug, Clone, Default)]
pub struct ShapeClassifier {
    thresholds: ShapeThresholds,
}

impl ShapeClassifier {
    pub fn new(thresholds: ShapeThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ShapeThresholds {
        &self.thresholds
    }

    pub fn classify(&self, positions: &PositionSet) -> Result<ChartShape, ChartError> {
        Ok(self.analyze(positions)?.shape)
    }

    pub fn analyze(&self, positions: &PositionSet) -> Result<ShapeAnalysis, ChartError> {
        let profile = GapProfile::from_positions(positions)?;

        let matched = RULES
            .iter()
            .find_map(|(name, rule)| {
                rule(&profile, &self.thresholds).map(|m| {
                    debug!(
                        "shape rule {} matched (span {:.2}, largest gap {:.2})",
                        name, profile.span, profile.largest_gap
                    );
                    m
                })
            })
            .unwrap_or(ShapeMatch {
                shape: ChartShape::Splash,
                focal: None,
            });

        let (handle, leading) = match matched.shape {
            ChartShape::Bucket => (matched.focal, None),
            ChartShape::Locomotive => (None, matched.focal),
            _ => (None, None),
        };

        Ok(ShapeAnalysis {
            shape: matched.shape,
            handle,
            leading,
            profile,
        })
    }
}

fn bundle(profile: &GapProfile, t: &ShapeThresholds) -> Option<ShapeMatch> {
    (profile.span <= t.bundle_span).then_some(ShapeMatch {
        shape: ChartShape::Bundle,
        focal: None,
    })
}

fn bucket(profile: &GapProfile, t: &ShapeThresholds) -> Option<ShapeMatch> {
    if profile.len() < 3 {
        return None;
    }
    for (k, handle_lon) in profile.longitudes.iter().enumerate() {
        let rest: Vec<f64> = profile
            .longitudes
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != k)
            .map(|(_, lon)| *lon)
            .collect();
        let (start, span) = occupied_arc(&rest);
        if span > t.bucket_span {
            continue;
        }
        let midpoint = normalize_360(start + span / 2.0);
        if angular_separation(*handle_lon, midpoint) >= 180.0 - t.handle_orb {
            return Some(ShapeMatch {
                shape: ChartShape::Bucket,
                focal: Some(profile.object_ids[k].clone()),
            });
        }
    }
    None
}

fn bowl(profile: &GapProfile, t: &ShapeThresholds) -> Option<ShapeMatch> {
    // At exactly bowl_span the end bodies would be opposite
    (profile.span < t.bowl_span).then_some(ShapeMatch {
        shape: ChartShape::Bowl,
        focal: None,
    })
}

fn seesaw(profile: &GapProfile, t: &ShapeThresholds) -> Option<ShapeMatch> {
    let wide = profile
        .gaps
        .iter()
        .filter(|gap| **gap >= t.seesaw_min_gap)
        .count();
    // Two wide sectors are the two largest gaps, so the ratio compares them
    let two_groups = wide == 2 && profile.second_gap >= t.seesaw_gap_ratio * profile.largest_gap;
    two_groups.then_some(ShapeMatch {
        shape: ChartShape::Seesaw,
        focal: None,
    })
}

fn locomotive(profile: &GapProfile, t: &ShapeThresholds) -> Option<ShapeMatch> {
    if profile.largest_gap < t.locomotive_min_gap
        || profile.largest_gap < t.locomotive_gap_ratio * profile.second_gap
    {
        return None;
    }
    // The body just past the empty sector leads the train
    let leading = (profile.largest_gap_index + 1) % profile.len();
    Some(ShapeMatch {
        shape: ChartShape::Locomotive,
        focal: Some(profile.object_ids[leading].clone()),
    })
}

fn splay(profile: &GapProfile, t: &ShapeThresholds) -> Option<ShapeMatch> {
    (profile.largest_gap >= t.splay_min_gap).then_some(ShapeMatch {
        shape: ChartShape::Splay,
        focal: None,
    })
}

fn circular_gaps(sorted: &[f64]) -> Vec<f64> {
    let n = sorted.len();
    (0..n)
        .map(|i| {
            if i + 1 < n {
                sorted[i + 1] - sorted[i]
            } else {
                sorted[0] + 360.0 - sorted[i]
            }
        })
        .collect()
}

/// Index and size of the largest gap; the first one wins a tie.
fn largest(gaps: &[f64]) -> (usize, f64) {
    gaps.iter()
        .copied()
        .enumerate()
        .fold((0, f64::MIN), |best, (i, g)| if g > best.1 { (i, g) } else { best })
}

/// Start longitude and width of the smallest arc holding every longitude.
fn occupied_arc(sorted: &[f64]) -> (f64, f64) {
    let gaps = circular_gaps(sorted);
    let (index, gap) = largest(&gaps);
    let start = sorted[(index + 1) % sorted.len()];
    (start, 360.0 - gap)
}

fn sign_groups(occupied: &[bool; 12]) -> Vec<Vec<Sign>> {
    let Some(empty) = occupied.iter().position(|o| !o) else {
        return vec![(0..12).map(Sign::from_index).collect()];
    };

    let mut groups = Vec::new();
    let mut current: Vec<Sign> = Vec::new();
    for step in 1..=12 {
        let index = (empty + step) % 12;
        if occupied[index] {
            current.push(Sign::from_index(index));
        } else if !current.is_empty() {
            groups.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}
