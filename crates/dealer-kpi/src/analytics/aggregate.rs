use super::KpiError;
use crate::dataset::{KpiMetric, KpiRecord, ShopKpiRecord, ShopMetric};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Number of leading and trailing dates compared by [`growth`].
pub const GROWTH_WINDOW: usize = 4;

/// Weights each dealer by its own latest express lane RO count.
pub fn latest_weights(latest: &BTreeMap<&str, &KpiRecord>) -> HashMap<String, f64> {
    latest
        .iter()
        .map(|(dealer_id, record)| (dealer_id.to_string(), record.weight()))
        .collect()
}

/// Activity-weighted mean of `metric` across the latest snapshot.
///
/// Only dealers present in both maps and carrying a value for `metric`
/// contribute. Fails when nothing contributes or the total weight is zero.
pub fn weighted_average(
    latest: &BTreeMap<&str, &KpiRecord>,
    metric: KpiMetric,
    weights: &HashMap<String, f64>,
) -> Result<f64, KpiError> {
    let contributions = latest.iter().filter_map(|(dealer_id, record)| {
        let weight = *weights.get(*dealer_id)?;
        let value = record.value(metric)?;
        Some((value, weight))
    });

    weighted_mean(contributions).ok_or(KpiError::DegenerateAggregation { metric })
}

/// One chart point: per-metric weighted averages for a single date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    /// Sum of express lane ROs across the dealers reporting on this date.
    pub total_weight: f64,
    /// `None` marks a date with no weighted data for that metric.
    pub values: BTreeMap<KpiMetric, Option<f64>>,
}

impl SeriesPoint {
    pub fn value(&self, metric: KpiMetric) -> Option<f64> {
        self.values.get(&metric).copied().flatten()
    }
}

/// Weighted averages per date using each date's own RO counts, ascending by date.
pub fn weighted_series_by_date<'a, I>(records: I, metrics: &[KpiMetric]) -> Vec<SeriesPoint>
where
    I: IntoIterator<Item = &'a KpiRecord>,
{
    let mut by_date: BTreeMap<NaiveDate, Vec<&KpiRecord>> = BTreeMap::new();
    for record in records {
        by_date.entry(record.date).or_default().push(record);
    }

    by_date
        .into_iter()
        .map(|(date, group)| {
            let total_weight: f64 = group.iter().map(|record| record.weight()).sum();
            let values = metrics
                .iter()
                .map(|&metric| {
                    let contributions = group
                        .iter()
                        .filter_map(|record| Some((record.value(metric)?, record.weight())));
                    (metric, weighted_mean(contributions))
                })
                .collect();

            SeriesPoint {
                date,
                total_weight,
                values,
            }
        })
        .collect()
}

/// Fixed-window trend of the date-ordered RO volume series.
///
/// With at least `2 * GROWTH_WINDOW` dates this is
/// `(sum(last 4) - sum(first 4)) / max(sum(first 4), 1)`; otherwise 0.
pub fn growth(weights_by_date: &[f64]) -> f64 {
    if weights_by_date.len() < GROWTH_WINDOW * 2 {
        return 0.0;
    }

    let first: f64 = weights_by_date[..GROWTH_WINDOW].iter().sum();
    let last: f64 = weights_by_date[weights_by_date.len() - GROWTH_WINDOW..]
        .iter()
        .sum();
    (last - first) / first.max(1.0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShopSeriesPoint {
    pub date: NaiveDate,
    pub dealers_reporting: usize,
    pub values: BTreeMap<ShopMetric, Option<f64>>,
}

/// Unweighted per-date mean of the shop KPIs, ascending by date.
pub fn shop_series_by_date<'a, I>(records: I) -> Vec<ShopSeriesPoint>
where
    I: IntoIterator<Item = &'a ShopKpiRecord>,
{
    let mut by_date: BTreeMap<NaiveDate, Vec<&ShopKpiRecord>> = BTreeMap::new();
    for record in records {
        by_date.entry(record.date).or_default().push(record);
    }

    by_date
        .into_iter()
        .map(|(date, group)| {
            let values = ShopMetric::ordered()
                .into_iter()
                .map(|metric| {
                    let contributions = group
                        .iter()
                        .filter_map(|record| Some((record.value(metric)?, 1.0)));
                    (metric, weighted_mean(contributions))
                })
                .collect();

            ShopSeriesPoint {
                date,
                dealers_reporting: group.len(),
                values,
            }
        })
        .collect()
}

fn weighted_mean<I>(contributions: I) -> Option<f64>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let (weighted_sum, total_weight) = contributions
        .into_iter()
        .fold((0.0_f64, 0.0_f64), |(sum, total), (value, weight)| {
            (sum + value * weight, total + weight)
        });

    if total_weight > 0.0 {
        Some(weighted_sum / total_weight)
    } else {
        None
    }
}
