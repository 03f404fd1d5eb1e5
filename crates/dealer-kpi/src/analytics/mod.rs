//! KPI aggregation, goal classification, and dealer ranking.
//!
//! Every function here is a pure computation over borrowed snapshot data; a
//! dashboard pass calls them afresh whenever filters or goals change.

pub mod aggregate;
pub mod filter;
pub mod rag;
pub mod ranking;
pub mod roi;
pub mod snapshot;

#[cfg(test)]
pub(crate) mod tests;

use crate::dataset::KpiMetric;

pub use aggregate::{
    growth, latest_weights, shop_series_by_date, weighted_average, weighted_series_by_date,
    SeriesPoint, ShopSeriesPoint, GROWTH_WINDOW,
};
pub use filter::{filter_dealers, latest_compliance_by_dealer, ComplianceBand, FilterCriteria};
pub use rag::{classify, GoalSet, RagStatus, DEFAULT_AMBER_TOLERANCE};
pub use ranking::{
    normalize, rank, ExcludedDealer, MetricSpec, RankedDealer, Ranking, NORMALIZATION_EPSILON,
    RANKING_METRICS,
};
pub use roi::{estimate_roi, RoiEstimate, RoiInputs};
pub use snapshot::latest_per_dealer;

/// Recoverable failures of a dashboard pass.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KpiError {
    #[error("no KPI data for the current filter")]
    NoDataForFilter,
    #[error("cannot weight {metric}: dealer set has zero total express lane ROs")]
    DegenerateAggregation { metric: KpiMetric },
    #[error("dealer {dealer_id} is missing {metric}")]
    MissingMetric { dealer_id: String, metric: KpiMetric },
    #[error("record references unknown dealer {dealer_id}")]
    UnknownDealerReference { dealer_id: String },
}

impl KpiError {
    /// True for errors the presentation layer shows as an empty state.
    pub fn is_no_data(&self) -> bool {
        matches!(
            self,
            KpiError::NoDataForFilter | KpiError::DegenerateAggregation { .. }
        )
    }
}
