//! Statistics over geolocation records
//!
//! Groups looked-up addresses by country, ranks the countries, and breaks
//! the top country down by city.

pub mod aggregator;

pub use aggregator::{percentage, StatisticsAggregator};
