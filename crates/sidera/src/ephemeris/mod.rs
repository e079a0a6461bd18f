pub mod provider;
pub mod types;

pub use provider::{add_days, days_between, EphemerisProvider, LinearEphemeris};
pub use types::{CelestialPosition, GeoLocation, HouseCusps, PositionSet};
