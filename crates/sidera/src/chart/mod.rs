pub mod composite;
pub mod engine;
pub mod progression;

pub use composite::{
    davison_event, midpoint_longitude, ChartSubject, CompositeChart, CompositeEvent,
    CompositeMethod, CompositeResolver, CompositeSettings, MidpointTieBreak,
};
pub use engine::{
    ChartEngine, ChartInput, ChartReport, CompositeReport, ProgressedReport, COMPOSITE_LAYER,
    NATAL_LAYER, PROGRESSED_LAYER,
};
pub use progression::{
    progressed_days, NaibodRate, ProgressionCalculator, ProgressionMethod, ProgressionResult,
    ProgressionSettings,
};
