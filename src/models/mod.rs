pub mod geo;
pub mod stats;

pub use geo::GeoRecord;
pub use stats::{CityStat, CountryStat, Statistics};
