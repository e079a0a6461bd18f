//! One entry point that runs every relationship computation for a chart.

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::aspects::{AspectCalculator, AspectSet};
use crate::chart::composite::{ChartSubject, CompositeChart, CompositeResolver};
use crate::chart::progression::{ProgressionCalculator, ProgressionResult};
use crate::constants::{ASC, MC, MOON, SUN};
use crate::ephemeris::provider::EphemerisProvider;
use crate::ephemeris::types::{GeoLocation, HouseCusps, PositionSet};
use crate::error::ChartError;
use crate::settings::EngineSettings;
use crate::western::fortune::{
    composite_part_of_fortune, is_diurnal_chart, part_of_fortune, CompositeFortuneMethod,
};
use crate::western::moon_phase::{moon_phase, MoonPhase};
use crate::western::shape::{ShapeAnalysis, ShapeClassifier};
use crate::western::zodiac::normalize_360;

pub const NATAL_LAYER: &str = "natal";
pub const PROGRESSED_LAYER: &str = "progressed";
pub const COMPOSITE_LAYER: &str = "composite";

/// A chart as supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartInput {
    pub moment: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<GeoLocation>,
    pub positions: PositionSet,
    #[serde(default)]
    pub houses: Option<HouseCusps>,
    /// Overrides the day/night decision when set
    #[serde(default)]
    pub is_day: Option<bool>,
}

impl ChartInput {
    pub fn new(moment: DateTime<Utc>, positions: PositionSet) -> Self {
        Self {
            moment,
            location: None,
            positions,
            houses: None,
            is_day: None,
        }
    }

    fn subject(&self, positions: PositionSet) -> ChartSubject {
        ChartSubject {
            moment: self.moment,
            location: self.location,
            positions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartReport {
    pub aspects: AspectSet,
    pub shape: ShapeAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moon_phase: Option<MoonPhase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_day: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_of_fortune: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressedReport {
    pub progression: ProgressionResult,
    pub report: ChartReport,
    pub natal_to_progressed: AspectSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeReport {
    pub chart: CompositeChart,
    pub report: ChartReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_of_fortune: Option<f64>,
}

pub struct ChartEngine {
    settings: EngineSettings,
    calculator: AspectCalculator,
    classifier: ShapeClassifier,
    resolver: CompositeResolver,
}

impl ChartEngine {
    pub fn new(settings: EngineSettings) -> Result<Self, ChartError> {
        settings.validate()?;
        Ok(Self {
            calculator: settings.aspect_calculator(),
            classifier: settings.shape_classifier(),
            resolver: settings.composite_resolver(),
            settings,
        })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn natal(&self, input: &ChartInput) -> Result<ChartReport, ChartError> {
        let positions = self.included(&input.positions);
        self.report(NATAL_LAYER, &positions, input.houses.as_ref(), input.is_day)
    }

    /// Progress the natal chart to `target`. `ephemeris` is required for
    /// daily houses and refines the solar arc.
    pub fn progressed(
        &self,
        input: &ChartInput,
        target: DateTime<Utc>,
        ephemeris: Option<&dyn EphemerisProvider>,
    ) -> Result<ProgressedReport, ChartError> {
        let natal = self.included(&input.positions);

        let mut calculator = ProgressionCalculator::new(self.settings.progression.clone());
        if let Some(provider) = ephemeris {
            calculator = calculator.with_ephemeris(provider);
        }
        let progression = calculator.progress(&natal, input.moment, target)?;

        let report = self.report(PROGRESSED_LAYER, &progression.progressed, None, None)?;
        let natal_to_progressed = self.calculator.compute_inter_layer_aspects(
            NATAL_LAYER,
            PROGRESSED_LAYER,
            &natal,
            &progression.progressed,
        )?;

        Ok(ProgressedReport {
            progression,
            report,
            natal_to_progressed,
        })
    }

    pub fn composite(
        &self,
        input_a: &ChartInput,
        input_b: &ChartInput,
    ) -> Result<CompositeReport, ChartError> {
        let subject_a = input_a.subject(self.included(&input_a.positions));
        let subject_b = input_b.subject(self.included(&input_b.positions));

        let chart = self.resolver.resolve(&subject_a, &subject_b)?;
        let report = self.report(COMPOSITE_LAYER, &chart.positions, None, None)?;

        let method = self.resolver.settings().fortune;
        let tie_break = self.resolver.settings().tie_break;
        let natal_parts = match method {
            CompositeFortuneMethod::Midpoint => {
                let part_a = self.fortune_of(&subject_a.positions, input_a.houses.as_ref(), input_a.is_day)?;
                let part_b = self.fortune_of(&subject_b.positions, input_b.houses.as_ref(), input_b.is_day)?;
                part_a.zip(part_b).map(|((a, _), (b, _))| (a, b))
            }
            CompositeFortuneMethod::Composite => None,
        };
        let part_of_fortune =
            composite_part_of_fortune(method, natal_parts, report.part_of_fortune, tie_break)?;

        Ok(CompositeReport {
            chart,
            report,
            part_of_fortune,
        })
    }

    fn included(&self, positions: &PositionSet) -> PositionSet {
        positions.filtered(&self.settings.include_objects)
    }

    fn report(
        &self,
        layer_id: &str,
        positions: &PositionSet,
        houses: Option<&HouseCusps>,
        is_day: Option<bool>,
    ) -> Result<ChartReport, ChartError> {
        positions.validate()?;
        if let Some(houses) = houses {
            houses.validate()?;
        }

        let aspects = self.calculator.compute_intra_layer_aspects(layer_id, positions)?;
        let shape = self.classifier.analyze(&bodies_only(positions))?;

        let moon_phase = match (positions.get(SUN), positions.get(MOON)) {
            (Some(sun), Some(moon)) => Some(moon_phase(sun.lon, moon.lon)?),
            _ => None,
        };

        let fortune = self.fortune_of(positions, houses, is_day)?;

        debug!(
            "{} report: {} aspects, {:?}, phase {:?}",
            layer_id,
            aspects.len(),
            shape.shape,
            moon_phase
        );

        Ok(ChartReport {
            aspects,
            shape,
            moon_phase,
            is_day: fortune.map(|(_, day)| day),
            part_of_fortune: fortune.map(|(part, _)| part),
        })
    }

    /// Part of Fortune and the day flag used, when Sun, Moon and an
    /// Ascendant are all available.
    fn fortune_of(
        &self,
        positions: &PositionSet,
        houses: Option<&HouseCusps>,
        is_day: Option<bool>,
    ) -> Result<Option<(f64, bool)>, ChartError> {
        let asc = positions
            .get(ASC)
            .map(|p| p.lon)
            .or_else(|| houses.map(|h| normalize_360(h.ascendant())));
        let (Some(sun), Some(moon), Some(asc)) = (positions.get(SUN), positions.get(MOON), asc) else {
            return Ok(None);
        };
        let day = is_day.unwrap_or_else(|| is_diurnal_chart(sun.lon, asc, houses));
        let part = part_of_fortune(sun.lon, moon.lon, asc, day, self.settings.fortune)?;
        Ok(Some((part, day)))
    }
}

/// Chart angles are points on the horizon and meridian, not bodies.
fn bodies_only(positions: &PositionSet) -> PositionSet {
    let objects = positions
        .objects
        .iter()
        .filter(|(id, _)| id.as_str() != ASC && id.as_str() != MC)
        .map(|(id, pos)| (id.clone(), pos.clone()))
        .collect();
    PositionSet { objects }
}
