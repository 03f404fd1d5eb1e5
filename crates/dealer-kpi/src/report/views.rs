use crate::analytics::{FilterCriteria, RagStatus, Ranking, SeriesPoint, ShopSeriesPoint};
use crate::dataset::{KpiMetric, MetricUnit, Polarity};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct KpiCardView {
    pub metric: KpiMetric,
    pub label: &'static str,
    pub unit: MetricUnit,
    pub polarity: Polarity,
    pub value: f64,
    pub display_value: String,
    pub goal: f64,
    pub display_goal: String,
    /// Signed distance from goal (`value - goal`).
    pub gap: f64,
    pub status: RagStatus,
    pub status_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VolumePoint {
    pub date: NaiveDate,
    pub express_lane_ros: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub criteria: FilterCriteria,
    pub as_of: NaiveDate,
    pub dealers_selected: usize,
    pub amber_tolerance: f64,
    pub cards: Vec<KpiCardView>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unavailable_metrics: Vec<KpiMetric>,
    pub series: Vec<SeriesPoint>,
    pub ro_volume: Vec<VolumePoint>,
    pub ro_growth: f64,
    pub shop_series: Vec<ShopSeriesPoint>,
    pub ranking: Ranking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkOutlook {
    Healthy,
    Watch,
    Critical,
}

impl NetworkOutlook {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Healthy => "Healthy",
            Self::Watch => "Watch",
            Self::Critical => "Critical",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardInsights {
    pub outlook: NetworkOutlook,
    pub green_cards: usize,
    pub amber_cards: usize,
    pub red_cards: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub focus_metrics: Vec<&'static str>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub observations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommended_actions: Vec<String>,
}
