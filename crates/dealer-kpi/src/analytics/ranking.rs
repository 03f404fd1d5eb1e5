use super::KpiError;
use crate::dataset::{Dataset, Dealer, KpiMetric, KpiRecord, Polarity};
use serde::Serialize;
use std::collections::BTreeMap;

/// Guards min-max scaling when every dealer ties on a metric.
pub const NORMALIZATION_EPSILON: f64 = 1e-9;

/// A ranking input and the direction in which it improves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricSpec {
    pub metric: KpiMetric,
    pub polarity: Polarity,
}

impl MetricSpec {
    pub const fn new(metric: KpiMetric, polarity: Polarity) -> Self {
        Self { metric, polarity }
    }
}

/// The nine KPIs that make up the composite dealer score.
pub const RANKING_METRICS: [MetricSpec; 9] = [
    MetricSpec::new(KpiMetric::PartsLoyalty, Polarity::HigherIsBetter),
    MetricSpec::new(KpiMetric::AutoReplenishment, Polarity::HigherIsBetter),
    MetricSpec::new(KpiMetric::MaintenancePenetration, Polarity::HigherIsBetter),
    MetricSpec::new(KpiMetric::BulkOilPenetration, Polarity::HigherIsBetter),
    MetricSpec::new(KpiMetric::ServiceLaneUtilization, Polarity::HigherIsBetter),
    MetricSpec::new(KpiMetric::TimeInBayMaintMin, Polarity::LowerIsBetter),
    MetricSpec::new(KpiMetric::TotalWaitMin, Polarity::LowerIsBetter),
    MetricSpec::new(KpiMetric::RetentionRate, Polarity::HigherIsBetter),
    MetricSpec::new(KpiMetric::ComplianceScore, Polarity::HigherIsBetter),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedDealer {
    pub rank: usize,
    pub dealer_id: String,
    pub dealer_name: String,
    pub region: String,
    pub journey_stage: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcludedDealer {
    pub dealer_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ranking {
    pub ranked: Vec<RankedDealer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded: Vec<ExcludedDealer>,
}

impl Ranking {
    pub fn leader(&self) -> Option<&RankedDealer> {
        self.ranked.first()
    }

    pub fn laggard(&self) -> Option<&RankedDealer> {
        self.ranked.last()
    }
}

/// Min-max scales `values` to [0, 1] after orienting them by `polarity`.
pub fn normalize(values: &[f64], polarity: Polarity) -> Vec<f64> {
    // Negating lower-is-better values keeps "larger is better" after scaling.
    let oriented: Vec<f64> = values
        .iter()
        .map(|&value| match polarity {
            Polarity::HigherIsBetter => value,
            Polarity::LowerIsBetter => -value,
        })
        .collect();
    let min = oriented.iter().copied().fold(f64::INFINITY, f64::min);
    let max = oriented.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    oriented
        .iter()
        .map(|v| (v - min) / (max - min + NORMALIZATION_EPSILON))
        .collect()
}

/// Ranks dealers by the equally weighted mean of their normalized KPIs.
///
/// Dealers missing any input, or whose metadata is absent, are reported in
/// `excluded` and do not take part in normalization. Equal scores keep the
/// order of `latest`.
pub fn rank(
    latest: &BTreeMap<&str, &KpiRecord>,
    dataset: &Dataset,
    specs: &[MetricSpec],
) -> Ranking {
    let mut scorable: Vec<(&Dealer, Vec<f64>)> = Vec::new();
    let mut excluded = Vec::new();

    for (dealer_id, record) in latest {
        let inputs = dataset
            .dealer(dealer_id)
            .and_then(|dealer| ranking_inputs(record, specs).map(|values| (dealer, values)));
        match inputs {
            Ok(entry) => scorable.push(entry),
            Err(err) => excluded.push(ExcludedDealer {
                dealer_id: dealer_id.to_string(),
                reason: err.to_string(),
            }),
        }
    }

    if scorable.is_empty() || specs.is_empty() {
        return Ranking {
            ranked: Vec::new(),
            excluded,
        };
    }

    let mut scores = vec![0.0; scorable.len()];
    for (column, spec) in specs.iter().enumerate() {
        let values: Vec<f64> = scorable.iter().map(|(_, inputs)| inputs[column]).collect();
        for (score, normalized) in scores.iter_mut().zip(normalize(&values, spec.polarity)) {
            *score += normalized;
        }
    }

    let mut ranked: Vec<RankedDealer> = scorable
        .iter()
        .zip(scores)
        .map(|((dealer, _), total)| RankedDealer {
            rank: 0,
            dealer_id: dealer.dealer_id.clone(),
            dealer_name: dealer.dealer_name.clone(),
            region: dealer.region.clone(),
            journey_stage: dealer.journey_stage.clone(),
            score: total / specs.len() as f64,
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    for (index, entry) in ranked.iter_mut().enumerate() {
        entry.rank = index + 1;
    }

    Ranking { ranked, excluded }
}

fn ranking_inputs(record: &KpiRecord, specs: &[MetricSpec]) -> Result<Vec<f64>, KpiError> {
    specs
        .iter()
        .map(|spec| {
            record
                .value(spec.metric)
                .ok_or_else(|| KpiError::MissingMetric {
                    dealer_id: record.dealer_id.clone(),
                    metric: spec.metric,
                })
        })
        .collect()
}
