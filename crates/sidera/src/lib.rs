//! Relationship engine for astrological charts.
//!
//! Given ecliptic positions from an external ephemeris, sidera matches
//! aspects under a configurable orb policy, classifies the chart shape,
//! finds the lunar phase and Part of Fortune, progresses a natal chart to a
//! target date and merges two charts into a composite.

pub mod aspects;
pub mod chart;
pub mod constants;
pub mod ephemeris;
pub mod error;
pub mod settings;
pub mod western;

pub use aspects::{Aspect, AspectCalculator, AspectDefinition, AspectSet, OrbMode, OrbTable};
pub use chart::{
    ChartEngine, ChartInput, ChartReport, CompositeReport, CompositeResolver, ProgressedReport,
    ProgressionCalculator,
};
pub use ephemeris::{CelestialPosition, EphemerisProvider, GeoLocation, HouseCusps, PositionSet};
pub use error::ChartError;
pub use settings::EngineSettings;
pub use western::{ChartShape, MoonPhase, ShapeClassifier};
