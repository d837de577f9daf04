//! Ranked statistics produced by one aggregation pass

use serde::Serialize;

/// Per-country share of all looked-up addresses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryStat {
    pub country_code: String,
    /// Same as `country_code`; no code-to-name translation is performed
    pub country_name: String,
    pub count: usize,
    /// `count / total_records * 100`
    pub percentage: f64,
}

/// Per-(city, region) share of the top country's addresses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityStat {
    pub city: String,
    pub region: Option<String>,
    pub country_code: String,
    pub count: usize,
    /// `count / total_country_records * 100`
    pub percentage: f64,
}

/// Read-only result of [`StatisticsAggregator::compute_statistics`]
///
/// [`StatisticsAggregator::compute_statistics`]: crate::analytics::StatisticsAggregator::compute_statistics
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Statistics {
    total_records: usize,
    countries: Vec<CountryStat>,
    top_country_records: usize,
    cities: Vec<CityStat>,
}

impl Statistics {
    pub(crate) fn new(
        total_records: usize,
        countries: Vec<CountryStat>,
        top_country_records: usize,
        cities: Vec<CityStat>,
    ) -> Self {
        Self {
            total_records,
            countries,
            top_country_records,
            cities,
        }
    }

    /// Number of records the statistics were computed from, including
    /// records without a country
    pub fn total_records(&self) -> usize {
        self.total_records
    }

    /// Countries ranked by descending count
    pub fn countries(&self) -> &[CountryStat] {
        &self.countries
    }

    /// Cities of the top country ranked by descending count
    pub fn cities(&self) -> &[CityStat] {
        &self.cities
    }

    /// Country with the highest record count, if any record had a country
    pub fn top_country(&self) -> Option<&CountryStat> {
        self.countries.first()
    }

    /// Number of records belonging to the top country, including records
    /// without a city
    pub fn top_country_records(&self) -> usize {
        self.top_country_records
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}
