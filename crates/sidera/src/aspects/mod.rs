pub mod calculator;
pub mod orbs;
pub mod types;

pub use calculator::{match_aspect, AspectCalculator};
pub use orbs::{effective_orb, ChartObjectOrb, OrbMode, OrbTable};
pub use types::{
    standard_catalog, Aspect, AspectDefinition, AspectDirection, AspectObjectRef, AspectPair,
    AspectPhase, AspectSet, AspectSetKind,
};
