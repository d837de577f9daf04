//! Country and city statistics over a list of geolocation records
//!
//! The aggregation is a single in-memory pass: records are grouped by
//! country, the groups are ranked by size, and the largest country is then
//! broken down by (city, region).
//!
//! Ranking is stable. Groups are created in order of first appearance in the
//! input, so groups with equal counts keep that order after sorting.

use std::collections::HashMap;
use std::hash::Hash;
use tracing::debug;

use crate::models::{CityStat, CountryStat, GeoRecord, Statistics};

/// Computes ranked statistics over a fixed set of records
#[derive(Debug, Clone)]
pub struct StatisticsAggregator {
    records: Vec<GeoRecord>,
}

impl StatisticsAggregator {
    pub fn new(records: Vec<GeoRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[GeoRecord] {
        &self.records
    }

    /// Run the aggregation pass
    ///
    /// Pure with respect to the stored records: calling it again yields the
    /// same result.
    pub fn compute_statistics(&self) -> Statistics {
        let total_records = self.records.len();
        let countries = self.country_statistics(total_records);

        let Some(top) = countries.first() else {
            debug!(total_records, "No record has a country, skipping city statistics");
            return Statistics::new(total_records, countries, 0, Vec::new());
        };

        let top_code = top.country_code.clone();
        let (top_country_records, cities) = self.city_statistics(&top_code);

        debug!(
            total_records,
            countries = countries.len(),
            top_country = %top_code,
            cities = cities.len(),
            "Computed statistics"
        );

        Statistics::new(total_records, countries, top_country_records, cities)
    }

    fn country_statistics(&self, total_records: usize) -> Vec<CountryStat> {
        let groups = group_in_order(self.records.iter().filter_map(GeoRecord::country_code));

        let mut stats: Vec<CountryStat> = groups
            .into_iter()
            .map(|(code, count)| CountryStat {
                country_code: code.to_string(),
                country_name: code.to_string(),
                count,
                percentage: percentage(count, total_records),
            })
            .collect();

        // sort_by is stable, ties keep first-appearance order
        stats.sort_by(|a, b| b.count.cmp(&a.count));
        stats
    }

    /// Returns the number of records of `country_code` and its ranked cities
    fn city_statistics(&self, country_code: &str) -> (usize, Vec<CityStat>) {
        let in_country: Vec<&GeoRecord> = self
            .records
            .iter()
            .filter(|r| r.country.as_deref() == Some(country_code))
            .collect();
        let total_country_records = in_country.len();

        let groups = group_in_order(
            in_country
                .iter()
                .filter_map(|r| r.city_name().map(|city| (city, r.region.as_deref()))),
        );

        let mut stats: Vec<CityStat> = groups
            .into_iter()
            .map(|((city, region), count)| CityStat {
                city: city.to_string(),
                region: region.map(str::to_string),
                country_code: country_code.to_string(),
                count,
                percentage: percentage(count, total_country_records),
            })
            .collect();

        stats.sort_by(|a, b| b.count.cmp(&a.count));
        (total_country_records, stats)
    }
}

/// Count equal keys, keeping groups in order of first appearance
fn group_in_order<K, I>(keys: I) -> Vec<(K, usize)>
where
    K: Eq + Hash + Copy,
    I: IntoIterator<Item = K>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, usize)> = Vec::new();

    for key in keys {
        match index.get(&key) {
            Some(&slot) => groups[slot].1 += 1,
            None => {
                index.insert(key, groups.len());
                groups.push((key, 1));
            }
        }
    }

    groups
}

/// `count / total * 100`, defined as 0.0 when `total` is zero
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64 * 100.0
}
