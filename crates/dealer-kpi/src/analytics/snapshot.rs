use crate::dataset::KpiRecord;
use std::collections::BTreeMap;

/// Picks each dealer's most recent record.
///
/// Records are stable-sorted ascending by date and the last row per dealer
/// wins, so two rows sharing the max date resolve to the later one in input
/// order. An empty input yields an empty map.
pub fn latest_per_dealer<'a, I>(records: I) -> BTreeMap<&'a str, &'a KpiRecord>
where
    I: IntoIterator<Item = &'a KpiRecord>,
{
    let mut sorted: Vec<&KpiRecord> = records.into_iter().collect();
    sorted.sort_by_key(|record| record.date);

    let mut latest = BTreeMap::new();
    for record in sorted {
        latest.insert(record.dealer_id.as_str(), record);
    }
    latest
}
