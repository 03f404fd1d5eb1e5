use super::views::{DashboardInsights, DashboardSummary, KpiCardView, VolumePoint};
use crate::analytics::{
    classify, filter_dealers, growth, latest_compliance_by_dealer, latest_per_dealer,
    latest_weights, rank, shop_series_by_date, weighted_average, weighted_series_by_date,
    FilterCriteria, GoalSet, KpiError, RagStatus, Ranking, SeriesPoint, ShopSeriesPoint,
    RANKING_METRICS,
};
use crate::dataset::{Dataset, KpiMetric};
use chrono::NaiveDate;
use tracing::debug;

/// A KPI's network value judged against its goal.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiCard {
    pub metric: KpiMetric,
    pub value: f64,
    pub goal: f64,
    pub status: RagStatus,
    /// Difference between the two most recent weighted series points.
    pub change: Option<f64>,
}

impl KpiCard {
    pub fn gap(&self) -> f64 {
        self.value - self.goal
    }

    pub fn to_view(&self) -> KpiCardView {
        KpiCardView {
            metric: self.metric,
            label: self.metric.label(),
            unit: self.metric.unit(),
            polarity: self.metric.polarity(),
            value: self.value,
            display_value: self.metric.format_value(self.value),
            goal: self.goal,
            display_goal: self.metric.format_value(self.goal),
            gap: self.gap(),
            status: self.status,
            status_label: self.status.label(),
            change: self.change,
        }
    }
}

/// One full dashboard pass over a filtered dealer selection.
#[derive(Debug, Clone)]
pub struct DashboardReport {
    pub criteria: FilterCriteria,
    pub amber_tolerance: f64,
    pub as_of: NaiveDate,
    pub dealers_selected: usize,
    pub cards: Vec<KpiCard>,
    /// Metrics with no weighted data in the latest snapshot.
    pub unavailable: Vec<KpiMetric>,
    pub series: Vec<SeriesPoint>,
    pub ro_growth: f64,
    pub shop_series: Vec<ShopSeriesPoint>,
    pub ranking: Ranking,
}

impl DashboardReport {
    /// Recomputes filter, snapshot, cards, series, and ranking from scratch.
    ///
    /// Fails with [`KpiError::NoDataForFilter`] when the selection has no KPI
    /// history, and with [`KpiError::DegenerateAggregation`] when not a single
    /// card can be weighted.
    pub fn build(
        dataset: &Dataset,
        criteria: &FilterCriteria,
        goals: &GoalSet,
        amber_tolerance: f64,
    ) -> Result<Self, KpiError> {
        let compliance = latest_compliance_by_dealer(dataset.kpi_records());
        let selected = filter_dealers(dataset.dealers(), &compliance, criteria);
        let records = dataset.records_for(&selected);
        if records.is_empty() {
            return Err(KpiError::NoDataForFilter);
        }

        let latest = latest_per_dealer(records.iter().copied());
        let weights = latest_weights(&latest);
        let series = weighted_series_by_date(records.iter().copied(), &KpiMetric::ordered());
        let as_of = series
            .last()
            .map(|point| point.date)
            .ok_or(KpiError::NoDataForFilter)?;

        let mut cards = Vec::new();
        let mut unavailable = Vec::new();
        let mut first_failure = None;
        for metric in KpiMetric::ordered() {
            let Some(goal) = goals.goal(metric) else {
                continue;
            };
            match weighted_average(&latest, metric, &weights) {
                Ok(value) => cards.push(KpiCard {
                    metric,
                    value,
                    goal,
                    status: classify(value, goal, metric.polarity(), amber_tolerance),
                    change: change_since_previous(&series, metric),
                }),
                Err(err) => {
                    unavailable.push(metric);
                    first_failure.get_or_insert(err);
                }
            }
        }

        if cards.is_empty() {
            return Err(first_failure.unwrap_or(KpiError::NoDataForFilter));
        }

        let volumes: Vec<f64> = series.iter().map(|point| point.total_weight).collect();
        let ro_growth = growth(&volumes);
        let shop_series = shop_series_by_date(dataset.shop_records_for(&selected));
        let ranking = rank(&latest, dataset, &RANKING_METRICS);

        debug!(
            dealers = selected.len(),
            records = records.len(),
            dates = series.len(),
            unavailable = unavailable.len(),
            excluded = ranking.excluded.len(),
            "dashboard pass computed"
        );

        Ok(Self {
            criteria: criteria.clone(),
            amber_tolerance,
            as_of,
            dealers_selected: selected.len(),
            cards,
            unavailable,
            series,
            ro_growth,
            shop_series,
            ranking,
        })
    }

    pub fn card(&self, metric: KpiMetric) -> Option<&KpiCard> {
        self.cards.iter().find(|card| card.metric == metric)
    }

    pub fn summary(&self) -> DashboardSummary {
        let ro_volume = self
            .series
            .iter()
            .map(|point| VolumePoint {
                date: point.date,
                express_lane_ros: point.total_weight,
            })
            .collect();

        DashboardSummary {
            criteria: self.criteria.clone(),
            as_of: self.as_of,
            dealers_selected: self.dealers_selected,
            amber_tolerance: self.amber_tolerance,
            cards: self.cards.iter().map(KpiCard::to_view).collect(),
            unavailable_metrics: self.unavailable.clone(),
            series: self.series.clone(),
            ro_volume,
            ro_growth: self.ro_growth,
            shop_series: self.shop_series.clone(),
            ranking: self.ranking.clone(),
        }
    }
}

impl DashboardSummary {
    pub fn insights(&self) -> DashboardInsights {
        super::generate_insights(self)
    }
}

fn change_since_previous(series: &[SeriesPoint], metric: KpiMetric) -> Option<f64> {
    let mut values = series.iter().rev().filter_map(|point| point.value(metric));
    let latest = values.next()?;
    let previous = values.next()?;
    Some(latest - previous)
}
