pub mod fortune;
pub mod moon_phase;
pub mod shape;
pub mod zodiac;

pub use fortune::{
    composite_part_of_fortune, is_diurnal, is_diurnal_chart, part_of_fortune,
    CompositeFortuneMethod, FortuneFormula,
};
pub use moon_phase::{moon_phase, MoonPhase};
pub use shape::{ChartShape, GapProfile, ShapeAnalysis, ShapeClassifier, ShapeThresholds};
pub use zodiac::Sign;
