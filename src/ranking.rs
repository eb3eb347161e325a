use std::cmp::Ordering;

use crate::model::{CountryRecord, Metric};

/// Table order: descending by cases, unknown counts last, ties by name then isoCode.
pub fn rank(records: &[CountryRecord]) -> Vec<CountryRecord> {
    rank_by(records, Metric::Cases)
}

pub fn rank_by(records: &[CountryRecord], metric: Metric) -> Vec<CountryRecord> {
    let mut ranked = records.to_vec();
    ranked.sort_by(|a, b| compare_by(a, b, metric));
    ranked
}

fn compare_by(a: &CountryRecord, b: &CountryRecord, metric: Metric) -> Ordering {
    // Option orders None below Some, so reversing puts unknown counts at the bottom.
    b.count(metric)
        .cmp(&a.count(metric))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.iso_code.cmp(&b.iso_code))
}
